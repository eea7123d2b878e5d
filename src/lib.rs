//! # Hawk — an embeddable reimplementation of the AWK programming language
//!
//! Hawk turns AWK source text into a [`Program`] through a lexer/parser/linker
//! pipeline, then runs that program with an [`Interpreter`] driven by a
//! host-supplied [`IoHost`]. The interpreter core never touches a real
//! filesystem or process table on its own — concrete I/O backends, the CLI
//! driver, module loading, and locale-aware collation/RNG utilities are all
//! left to the embedder, the same way the teacher leaves script-level I/O
//! and module resolution to a `Module`/`ModuleResolver` the host configures.
//!
//! # A quick example
//!
//! ```no_run
//! use hawk::{compile, Interpreter, IoHost};
//!
//! # struct MyHost;
//! # impl IoHost for MyHost {
//! #     fn open(&mut self, _: &str, _: hawk::StreamKind, _: hawk::OpenMode) -> Result<hawk::StreamHandle, hawk::Error> { unimplemented!() }
//! #     fn write(&mut self, _: hawk::StreamHandle, _: &str) -> Result<(), hawk::Error> { unimplemented!() }
//! #     fn flush(&mut self, _: hawk::StreamHandle) -> Result<(), hawk::Error> { unimplemented!() }
//! #     fn read_line(&mut self, _: hawk::StreamHandle) -> Result<Option<String>, hawk::Error> { unimplemented!() }
//! #     fn close(&mut self, _: hawk::StreamHandle) -> Result<(), hawk::Error> { unimplemented!() }
//! #     fn console_write(&mut self, _: &str) -> Result<(), hawk::Error> { unimplemented!() }
//! #     fn console_read_line(&mut self) -> Result<Option<String>, hawk::Error> { Ok(None) }
//! #     fn console_filename(&self) -> Option<String> { None }
//! #     fn console_advance(&mut self) -> Result<bool, hawk::Error> { Ok(false) }
//! # }
//! let program = compile("{ print NR, $0 }").unwrap();
//! let mut host = MyHost;
//! let mut interp = Interpreter::new(&program, &mut host);
//! interp.run().unwrap();
//! ```

mod ast;
mod compile;
mod error;
mod fields;
mod immutable_string;
mod intrinsics;
mod io;
mod lexer;
mod map;
mod parser;
mod regex;
mod runtime;
mod scope;
mod value;

pub use compile::Program;
pub use error::{Error, ErrorKind, Position};
pub use immutable_string::HawkStr;
pub use intrinsics::{IntrinsicDesc, IntrinsicKind, INTRINSICS};
pub use io::{IoHost, OpenMode, OpenOutcome, StreamHandle, StreamKind, Streams};
pub use map::Map;
pub use regex::{CompiledRegex, RegexError};
pub use runtime::{Interpreter, Settings};
pub use value::Value;

pub use ast::ParsedProgram;
pub use lexer::Lexer;
pub use parser::parse as parse_tokens;

/// Lex, parse, and link AWK source text into a ready-to-run [`Program`] in
/// one call — the library-level equivalent of the teacher's
/// `Engine::compile`.
pub fn compile(src: &str) -> Result<Program, Error> {
    let tokens = Lexer::tokenize(src)?;
    let parsed = parser::parse(tokens)?;
    compile::link(parsed)
}
