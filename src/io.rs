//! The stream capability (spec.md §6): Hawk's core never touches a
//! filesystem or process table itself — concrete I/O backends are an
//! explicit Non-goal — so this module only defines the contract an
//! embedding host implements, plus the name-keyed table of currently open
//! streams that `getline`/`print > file`/`cmd | getline` address by name.

use crate::error::{Error, ErrorKind, Position};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    Write,
    Append,
    /// A bidirectional coprocess (`|&`).
    ReadWrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    File,
    Pipe,
    Coproc,
    /// The implicit main input (`getline` with no redirection) or stdout
    /// (`print` with no redirection); never named in the stream table.
    Console,
}

/// Opaque per-stream id a host assigns on open and hands back on every
/// later call; Hawk's core never interprets it.
pub type StreamHandle = u64;

/// The interpreter-facing capability a host implements to actually open
/// files, spawn pipes, or read/write the main input and output. Every
/// method is fallible since the host may be backed by a real filesystem,
/// an in-memory fixture, or a sandbox that refuses everything.
pub trait IoHost {
    fn open(&mut self, name: &str, kind: StreamKind, mode: OpenMode) -> Result<StreamHandle, Error>;
    fn write(&mut self, handle: StreamHandle, data: &str) -> Result<(), Error>;
    fn flush(&mut self, handle: StreamHandle) -> Result<(), Error>;
    /// Returns `None` at end of stream, `Some(line)` (without its
    /// terminator) otherwise.
    fn read_line(&mut self, handle: StreamHandle) -> Result<Option<String>, Error>;
    fn close(&mut self, handle: StreamHandle) -> Result<(), Error>;

    fn console_write(&mut self, data: &str) -> Result<(), Error>;
    fn console_read_line(&mut self) -> Result<Option<String>, Error>;
    /// The name of the input file the next `console_read_line` will read
    /// from (FILENAME), or `None` before the first record / for stdin.
    fn console_filename(&self) -> Option<String>;
    /// `nextfile`: close the current console input and advance to the next
    /// entry in the input sequence. Returns `false` if there isn't one.
    fn console_advance(&mut self) -> Result<bool, Error>;
}

struct Entry {
    #[allow(dead_code)]
    kind: StreamKind,
    mode: OpenMode,
    handle: StreamHandle,
    /// A line already pulled from the host while probing for immediate
    /// EOF at open time, to be handed back on the first real read instead
    /// of being lost.
    pending_line: Option<String>,
    at_eof: bool,
}

/// The name-keyed table of currently open (non-console) streams, plus
/// bookkeeping for the AWK `close(name)` and at-exit teardown contracts.
#[derive(Default)]
pub struct Streams {
    by_name: HashMap<String, Entry>,
    open_order: Vec<String>,
}

/// Matches `awk`'s `getline ... < "file"` / `print ... | "cmd"` open
/// contract: -1 means the open failed, 0 means it succeeded but the
/// stream was immediately at EOF (read mode only), and a positive value
/// means it succeeded with data available (or simply that a write/append
/// stream is ready).
pub enum OpenOutcome {
    Error,
    ImmediateEof,
    Ready,
}

impl Streams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(
        &mut self,
        host: &mut dyn IoHost,
        name: &str,
        kind: StreamKind,
        mode: OpenMode,
    ) -> Result<OpenOutcome, Error> {
        if let Some(e) = self.by_name.get(name) {
            if e.mode == mode {
                return Ok(OpenOutcome::Ready);
            }
        }
        let handle = host.open(name, kind, mode)?;
        let mut at_eof = false;
        let mut pending_line = None;
        if mode == OpenMode::Read {
            // Peek for immediate EOF so the 0/positive contract can be
            // reported without the caller needing a second round trip;
            // whatever the peek reads is kept for the first real read.
            match host.read_line(handle)? {
                None => at_eof = true,
                Some(line) => pending_line = Some(line),
            }
        }
        self.by_name.insert(
            name.to_string(),
            Entry {
                kind,
                mode,
                handle,
                pending_line,
                at_eof,
            },
        );
        self.open_order.push(name.to_string());
        Ok(if at_eof {
            OpenOutcome::ImmediateEof
        } else {
            OpenOutcome::Ready
        })
    }

    #[must_use]
    pub fn handle(&self, name: &str) -> Option<StreamHandle> {
        self.by_name.get(name).map(|e| e.handle)
    }

    /// Read the next line from the named stream, handing back the line
    /// buffered by `open`'s EOF probe before asking the host for another.
    pub fn read_line(&mut self, host: &mut dyn IoHost, name: &str) -> Result<Option<String>, Error> {
        let entry = self.by_name.get_mut(name).ok_or_else(|| {
            Error::with_detail(ErrorKind::Io, format!("stream '{}' is not open", name), Position::NONE)
        })?;
        if let Some(line) = entry.pending_line.take() {
            return Ok(Some(line));
        }
        if entry.at_eof {
            return Ok(None);
        }
        match host.read_line(entry.handle)? {
            None => {
                entry.at_eof = true;
                Ok(None)
            }
            some => Ok(some),
        }
    }

    /// Write to the named stream (must have been opened in a writable mode).
    pub fn write(&mut self, host: &mut dyn IoHost, name: &str, data: &str) -> Result<(), Error> {
        let entry = self.by_name.get(name).ok_or_else(|| {
            Error::with_detail(ErrorKind::Io, format!("stream '{}' is not open", name), Position::NONE)
        })?;
        host.write(entry.handle, data)
    }

    pub fn flush(&mut self, host: &mut dyn IoHost, name: &str) -> Result<(), Error> {
        let entry = self.by_name.get(name).ok_or_else(|| {
            Error::with_detail(ErrorKind::Io, format!("stream '{}' is not open", name), Position::NONE)
        })?;
        host.flush(entry.handle)
    }

    pub fn flush_all(&mut self, host: &mut dyn IoHost) -> Result<(), Error> {
        for name in self.open_order.clone() {
            if let Some(entry) = self.by_name.get(&name) {
                host.flush(entry.handle)?;
            }
        }
        Ok(())
    }

    /// `close(name)`: returns the exit status contract AWK expects (0 on a
    /// clean close, a nonzero/negative value translated from the host's
    /// error otherwise), or `None` if `name` was never open.
    pub fn close(&mut self, host: &mut dyn IoHost, name: &str) -> Option<Result<(), Error>> {
        let entry = self.by_name.remove(name)?;
        self.open_order.retain(|n| n != name);
        Some(host.close(entry.handle))
    }

    /// Close every stream still open, in reverse of the order they were
    /// opened (spec.md §6), swallowing individual close errors so a
    /// misbehaving stream can't stop its siblings from tearing down.
    pub fn close_all(&mut self, host: &mut dyn IoHost) {
        for name in self.open_order.clone().into_iter().rev() {
            if let Some(entry) = self.by_name.remove(&name) {
                let _ = host.close(entry.handle);
            }
        }
        self.open_order.clear();
    }

    #[must_use]
    pub fn is_open(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }
}
