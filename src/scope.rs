//! Symbol tables used while parsing and linking: the global-slot table and
//! the function table of spec.md §4.3/§4.4.
//!
//! Mirrors the shape of the teacher's own `Scope` (name lookup backed by a
//! flat, index-addressed `Vec` rather than a nested hash of scopes), but
//! split into a process-wide `GlobalTable`/`FuncTable` instead of a single
//! call-stack scope, since Hawk's locals are just per-function parameter
//! slots rather than scope-pushable variables.

use std::collections::HashMap;

/// Globals every Hawk script implicitly has per spec.md §6, pre-interned in
/// this fixed order so the runtime can address each one by a compile-time
/// slot constant instead of a name lookup. `IGNORECASE` is a gawk-style
/// extension beyond the spec's literal list (see `DESIGN.md`) — it exists
/// to give `RegexValue`'s case-insensitive twin field a consumer.
pub const SPECIAL_GLOBALS: &[&str] = &[
    "NR", "NF", "FNR", "FS", "OFS", "ORS", "RS", "FILENAME", "SUBSEP", "CONVFMT", "OFMT",
    "RLENGTH", "RSTART", "ENVIRON", "ARGC", "ARGV", "IGNORECASE",
];

/// Name → slot index for script globals (including any name first seen as
/// an implicit global use).
#[derive(Default)]
pub struct GlobalTable {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl GlobalTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A table with [`SPECIAL_GLOBALS`] pre-interned at fixed slots, used to
    /// seed the linker so the runtime's `slot` module constants line up.
    #[must_use]
    pub fn with_specials() -> Self {
        let mut t = Self::new();
        for name in SPECIAL_GLOBALS {
            t.intern(name);
        }
        t
    }

    /// Return the slot for `name`, allocating a new one if this is the
    /// first time it's been seen.
    pub fn intern(&mut self, name: &str) -> usize {
        if let Some(&i) = self.index.get(name) {
            return i;
        }
        let i = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), i);
        i
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Name → (index, arity) for user-defined functions. Forward references
/// within one parse unit are allowed, so functions are interned here during
/// the first parser pass over top-level items, before bodies are resolved.
#[derive(Default)]
pub struct FuncTable {
    names: Vec<String>,
    arities: Vec<usize>,
    index: HashMap<String, usize>,
}

impl FuncTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a function; returns `Err` if the name is already declared
    /// (spec.md §7 `FID`: function already defined).
    pub fn declare(&mut self, name: &str, arity: usize) -> Result<usize, ()> {
        if self.index.contains_key(name) {
            return Err(());
        }
        let i = self.names.len();
        self.names.push(name.to_string());
        self.arities.push(arity);
        self.index.insert(name.to_string(), i);
        Ok(i)
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    #[must_use]
    pub fn arity(&self, index: usize) -> usize {
        self.arities[index]
    }

    #[must_use]
    pub fn name(&self, index: usize) -> &str {
        &self.names[index]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }
}

/// Per-function table of parameter names, used only while parsing/linking
/// one function body; not retained afterwards (the compiled tree addresses
/// parameters by slot index).
#[derive(Default)]
pub struct ParamTable {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl ParamTable {
    #[must_use]
    pub fn new(params: &[String]) -> Self {
        let mut t = Self::default();
        for p in params {
            t.index.insert(p.clone(), t.names.len());
            t.names.push(p.clone());
        }
        t
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn globals_intern_once() {
        let mut g = GlobalTable::new();
        let a = g.intern("sum");
        let b = g.intern("sum");
        assert_eq!(a, b);
        assert_eq!(g.intern("count"), 1);
    }

    #[test]
    fn duplicate_function_rejected() {
        let mut f = FuncTable::new();
        assert!(f.declare("f", 1).is_ok());
        assert!(f.declare("f", 2).is_err());
    }
}
