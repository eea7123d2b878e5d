//! Built-in function contracts (spec.md §6): names, arities, and which
//! positions need special call treatment (arrays passed by reference,
//! `sub`/`gsub`'s target argument assigned back into). The contract here
//! is deliberately call-convention-only — actual regex compilation and
//! field-table access need the runtime's live state, so `split`, `sub`,
//! and `gsub` are implemented as dedicated functions the runtime calls
//! directly rather than through the generic [`call`] dispatch.

pub mod pattern;
pub mod sprintf;
pub mod strings;

use crate::error::Error;
use crate::regex::RegexValue;
use crate::value::Value;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntrinsicKind {
    /// Pure value-in/value-out; handled by [`call`].
    Simple,
    /// `split(s, arr[, fs])` — arg 1 is an array, bound by the runtime.
    Split,
    /// `splita(s, arr[, fs])` — like `split`, but the runtime stores plain
    /// strings rather than running them back through NumericStr detection
    /// (spec.md §6's "split preserving separators"; see `DESIGN.md`).
    SplitA,
    /// `sub(ere, repl[, target])` — arg 2 is an lvalue, bound by the runtime.
    Sub,
    /// `gsub(ere, repl[, target])` — arg 2 is an lvalue, bound by the runtime.
    Gsub,
    /// `match(s, ere)` — sets RSTART/RLENGTH as a side effect.
    Match,
    /// `close(name)` — needs the runtime's open-stream table.
    Close,
    /// `fflush([name])` — flushes one named stream, or every open stream
    /// when called with no argument.
    Fflush,
}

pub struct IntrinsicDesc {
    pub name: &'static str,
    pub min_args: usize,
    pub max_args: usize,
    pub kind: IntrinsicKind,
}

pub static INTRINSICS: &[IntrinsicDesc] = &[
    IntrinsicDesc { name: "length", min_args: 0, max_args: 1, kind: IntrinsicKind::Simple },
    IntrinsicDesc { name: "index", min_args: 2, max_args: 2, kind: IntrinsicKind::Simple },
    IntrinsicDesc { name: "rindex", min_args: 2, max_args: 2, kind: IntrinsicKind::Simple },
    IntrinsicDesc { name: "substr", min_args: 2, max_args: 3, kind: IntrinsicKind::Simple },
    IntrinsicDesc { name: "sprintf", min_args: 1, max_args: usize::MAX, kind: IntrinsicKind::Simple },
    IntrinsicDesc { name: "tolower", min_args: 1, max_args: 1, kind: IntrinsicKind::Simple },
    IntrinsicDesc { name: "toupper", min_args: 1, max_args: 1, kind: IntrinsicKind::Simple },
    IntrinsicDesc { name: "split", min_args: 2, max_args: 3, kind: IntrinsicKind::Split },
    IntrinsicDesc { name: "splita", min_args: 2, max_args: 3, kind: IntrinsicKind::SplitA },
    IntrinsicDesc { name: "sub", min_args: 2, max_args: 3, kind: IntrinsicKind::Sub },
    IntrinsicDesc { name: "gsub", min_args: 2, max_args: 3, kind: IntrinsicKind::Gsub },
    IntrinsicDesc { name: "match", min_args: 2, max_args: 2, kind: IntrinsicKind::Match },
    IntrinsicDesc { name: "close", min_args: 1, max_args: 1, kind: IntrinsicKind::Close },
    IntrinsicDesc { name: "fflush", min_args: 0, max_args: 1, kind: IntrinsicKind::Fflush },
];

/// Context the `Simple`-kind built-ins need from the running interpreter:
/// the current CONVFMT (for stringifying numeric arguments) and a way to
/// compile a dynamic regex when an argument is a plain string rather than
/// an already-compiled `/regex/` literal.
pub trait Host {
    fn convfmt(&self) -> String;
    fn compile_dynamic_regex(&mut self, pattern: &str) -> Result<Rc<RegexValue>, Error>;
}

/// Dispatch a `Simple`-kind call. `idx` indexes [`INTRINSICS`].
pub fn call(idx: usize, args: &[Value], host: &mut dyn Host) -> Result<Value, Error> {
    let desc = &INTRINSICS[idx];
    match desc.name {
        "length" => Ok(Value::new_int(match args.first() {
            Some(v) => strings::length_of(v),
            None => 0,
        })),
        "index" => {
            let a = args[0].to_str_fmt(&host.convfmt());
            let b = args[1].to_str_fmt(&host.convfmt());
            Ok(Value::new_int(strings::index_of(a.as_str(), b.as_str())))
        }
        "rindex" => {
            let a = args[0].to_str_fmt(&host.convfmt());
            let b = args[1].to_str_fmt(&host.convfmt());
            Ok(Value::new_int(strings::rindex_of(a.as_str(), b.as_str())))
        }
        "substr" => {
            let s = args[0].to_str_fmt(&host.convfmt());
            let m = args[1].to_flt();
            let n = args.get(2).map(Value::to_flt);
            Ok(Value::new_str(strings::substr(s.as_str(), m, n)))
        }
        "sprintf" => {
            let fmt = args[0].to_str_fmt(&host.convfmt());
            Ok(Value::new_str(sprintf::format(fmt.as_str(), &args[1..])?))
        }
        "tolower" => {
            let s = args[0].to_str_fmt(&host.convfmt());
            Ok(Value::new_str(strings::tolower(s.as_str())))
        }
        "toupper" => {
            let s = args[0].to_str_fmt(&host.convfmt());
            Ok(Value::new_str(strings::toupper(s.as_str())))
        }
        other => unreachable!("{} is not a Simple-kind intrinsic", other),
    }
}
