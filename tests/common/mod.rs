//! A fixture `IoHost` for integration tests: an in-memory console input, a
//! captured console output buffer, and named read/write streams backed by
//! `Vec<String>` instead of real files or pipes. Mirrors the teacher's own
//! preference for driving the public API end-to-end in `tests/*.rs` rather
//! than unit-testing private internals.

use hawk::{Error, ErrorKind, IoHost, OpenMode, Position, StreamHandle, StreamKind};
use std::collections::HashMap;

enum Entry {
    Read(std::collections::VecDeque<String>),
    Write(String),
}

/// One input "file": a named sequence of lines `getline < name` can read,
/// distinct from the main console input fed to plain `getline`/the main
/// loop.
pub struct MemHost {
    console_lines: std::collections::VecDeque<String>,
    console_filename: Option<String>,
    pub console_out: String,
    named_inputs: HashMap<String, Vec<String>>,
    entries: HashMap<StreamHandle, Entry>,
    handle_names: HashMap<StreamHandle, String>,
    next_handle: StreamHandle,
}

impl MemHost {
    #[must_use]
    pub fn new(input: &str) -> Self {
        Self {
            console_lines: input.lines().map(str::to_string).collect(),
            console_filename: None,
            console_out: String::new(),
            named_inputs: HashMap::new(),
            entries: HashMap::new(),
            handle_names: HashMap::new(),
            next_handle: 0,
        }
    }

    /// Register `name` as a `getline < name` / `"cmd" | getline` source.
    pub fn seed(&mut self, name: &str, content: &str) {
        self.named_inputs.insert(name.to_string(), content.lines().map(str::to_string).collect());
    }

    /// The text written via `print ... > name` / `print ... | name`.
    #[must_use]
    pub fn written(&self, name: &str) -> Option<&str> {
        let handle = self.handle_names.iter().find(|(_, n)| n.as_str() == name).map(|(h, _)| *h)?;
        match self.entries.get(&handle) {
            Some(Entry::Write(s)) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl IoHost for MemHost {
    fn open(&mut self, name: &str, _kind: StreamKind, mode: OpenMode) -> Result<StreamHandle, Error> {
        let handle = self.next_handle;
        self.next_handle += 1;
        let entry = match mode {
            OpenMode::Read => {
                let lines = self.named_inputs.remove(name).ok_or_else(|| {
                    Error::with_detail(ErrorKind::Io, format!("no fixture input for '{}'", name), Position::NONE)
                })?;
                Entry::Read(lines.into_iter().collect())
            }
            OpenMode::Write | OpenMode::Append | OpenMode::ReadWrite => Entry::Write(String::new()),
        };
        self.entries.insert(handle, entry);
        self.handle_names.insert(handle, name.to_string());
        Ok(handle)
    }

    fn write(&mut self, handle: StreamHandle, data: &str) -> Result<(), Error> {
        match self.entries.get_mut(&handle) {
            Some(Entry::Write(buf)) => {
                buf.push_str(data);
                Ok(())
            }
            _ => Err(Error::with_detail(ErrorKind::Io, "stream not open for writing", Position::NONE)),
        }
    }

    fn flush(&mut self, _handle: StreamHandle) -> Result<(), Error> {
        Ok(())
    }

    fn read_line(&mut self, handle: StreamHandle) -> Result<Option<String>, Error> {
        match self.entries.get_mut(&handle) {
            Some(Entry::Read(lines)) => Ok(lines.pop_front()),
            _ => Err(Error::with_detail(ErrorKind::Io, "stream not open for reading", Position::NONE)),
        }
    }

    fn close(&mut self, handle: StreamHandle) -> Result<(), Error> {
        self.entries.remove(&handle);
        Ok(())
    }

    fn console_write(&mut self, data: &str) -> Result<(), Error> {
        self.console_out.push_str(data);
        Ok(())
    }

    fn console_read_line(&mut self) -> Result<Option<String>, Error> {
        Ok(self.console_lines.pop_front())
    }

    fn console_filename(&self) -> Option<String> {
        self.console_filename.clone()
    }

    fn console_advance(&mut self) -> Result<bool, Error> {
        Ok(false)
    }
}

/// Compiles and runs `src` against `input`, returning everything written to
/// the console (stdout-equivalent).
pub fn run(src: &str, input: &str) -> String {
    let program = hawk::compile(src).expect("script should compile");
    let mut host = MemHost::new(input);
    let mut interp = hawk::Interpreter::new(&program, &mut host);
    interp.run().expect("script should run without error");
    host.console_out
}
