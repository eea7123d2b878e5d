//! The current record's field table (spec.md §4.5): `$0`, the lazily
//! rebuilt `$1..$NF` slices, and FS-driven splitting in its four modes
//! (single character, `" "` whitespace-run trimming, literal multi-
//! character string, and ERE).

use crate::regex::{CompiledRegex, RegexValue};
use std::rc::Rc;

#[derive(Clone)]
pub enum FieldSep {
    /// `FS == " "` (the default): split on runs of whitespace, discarding
    /// leading/trailing runs entirely.
    Whitespace,
    /// A single-character literal FS.
    Char(char),
    /// A multi-character literal FS (not an ERE metachar string).
    Str(String),
    /// FS is (or looks like) an ERE.
    Regex(Rc<RegexValue>),
}

/// Classify a plain-string FS value: `" "` means whitespace-run mode,
/// any other single character is literal, and anything longer is a
/// literal multi-character separator (Hawk does not implicitly promote a
/// multi-character FS *string* to an ERE — only an actual `/regex/` value
/// assigned to `FS` switches to regex-splitting mode, see `DESIGN.md`).
#[must_use]
pub fn classify_fs_str(s: &str) -> FieldSep {
    if s == " " {
        FieldSep::Whitespace
    } else if s.chars().count() == 1 {
        FieldSep::Char(s.chars().next().unwrap())
    } else {
        FieldSep::Str(s.to_string())
    }
}

/// Build a [`FieldSep`] from an arbitrary `Value` (the current `FS` global,
/// or `split`'s optional third argument).
#[must_use]
pub fn fs_from_value(v: &crate::value::Value) -> FieldSep {
    match v {
        crate::value::Value::Regex(rv) => FieldSep::Regex(rv.clone()),
        other => classify_fs_str(other.to_str().as_str()),
    }
}

fn split_by_regex(line: &str, re: &CompiledRegex) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    let mut fields = Vec::new();
    let mut start = 0usize;
    let mut pos = 0usize;
    loop {
        if pos > chars.len() {
            break;
        }
        let remaining: String = chars[pos..].iter().collect();
        match re.find(&remaining) {
            Some((s, e)) if e > s => {
                let abs_s = pos + s;
                let abs_e = pos + e;
                fields.push(chars[start..abs_s].iter().collect());
                start = abs_e;
                pos = abs_e;
            }
            _ => break,
        }
    }
    fields.push(chars[start..].iter().collect());
    fields
}

/// Split `line` per `fs`. `icase` selects which half of a regex FS's
/// case-folded pair to use (mirrors `IGNORECASE` at the point the record
/// was read).
#[must_use]
pub fn split_fields(line: &str, fs: &FieldSep, icase: bool) -> Vec<String> {
    if line.is_empty() {
        return Vec::new();
    }
    match fs {
        FieldSep::Whitespace => line.split_whitespace().map(str::to_string).collect(),
        FieldSep::Char(c) => line.split(*c).map(str::to_string).collect(),
        FieldSep::Str(s) if s.is_empty() => line.chars().map(|c| c.to_string()).collect(),
        FieldSep::Str(s) => line.split(s.as_str()).map(str::to_string).collect(),
        FieldSep::Regex(rv) => {
            let re = if icase {
                rv.icase.as_ref().unwrap_or(&rv.primary)
            } else {
                &rv.primary
            };
            split_by_regex(line, re)
        }
    }
}

/// `$0` plus the cached `$1..$NF` slices. Index 0 of `fields` is always
/// `$0`; reassigning any `$i` (`i >= 1`) rebuilds `$0` by joining with OFS,
/// and reassigning `$0` resplits every field from scratch.
#[derive(Default)]
pub struct FieldTable {
    fields: Vec<String>,
}

impl FieldTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            fields: vec![String::new()],
        }
    }

    /// Reassign `$0` and resplit `$1..$NF` from it.
    pub fn set_record(&mut self, line: &str, fs: &FieldSep, icase: bool) {
        self.fields.clear();
        self.fields.push(line.to_string());
        self.fields.extend(split_fields(line, fs, icase));
    }

    #[must_use]
    pub fn nf(&self) -> usize {
        self.fields.len() - 1
    }

    #[must_use]
    pub fn get(&self, i: i64) -> &str {
        if i < 0 {
            return "";
        }
        self.fields.get(i as usize).map_or("", String::as_str)
    }

    /// Assign `$i` (`i >= 1`); extends `$0..$i-1` with empty fields if `i`
    /// is past the current `NF`, then rebuilds `$0` with `ofs`.
    pub fn set_field(&mut self, i: i64, val: String, ofs: &str) {
        debug_assert!(i >= 1);
        let idx = i as usize;
        if idx >= self.fields.len() {
            self.fields.resize(idx + 1, String::new());
        }
        self.fields[idx] = val;
        self.rebuild_record(ofs);
    }

    /// Assign `NF` directly: truncates or zero-pads the field list, then
    /// rebuilds `$0`.
    pub fn set_nf(&mut self, n: i64, ofs: &str) {
        let n = n.max(0) as usize;
        self.fields.resize(n + 1, String::new());
        self.rebuild_record(ofs);
    }

    fn rebuild_record(&mut self, ofs: &str) {
        let joined = self.fields[1..].join(ofs);
        self.fields[0] = joined;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_split_trims_runs() {
        let fields = split_fields("  a   b c  ", &FieldSep::Whitespace, false);
        assert_eq!(fields, vec!["a", "b", "c"]);
    }

    #[test]
    fn char_fs_keeps_empty_fields() {
        let fields = split_fields("a,,b", &FieldSep::Char(','), false);
        assert_eq!(fields, vec!["a", "", "b"]);
    }

    #[test]
    fn field_assignment_rebuilds_record() {
        let mut t = FieldTable::new();
        t.set_record("a b c", &FieldSep::Whitespace, false);
        t.set_field(2, "X".to_string(), " ");
        assert_eq!(t.get(0), "a X c");
        assert_eq!(t.nf(), 3);
    }

    #[test]
    fn nf_truncate_and_pad() {
        let mut t = FieldTable::new();
        t.set_record("a b c d", &FieldSep::Whitespace, false);
        t.set_nf(2, " ");
        assert_eq!(t.get(0), "a b");
        t.set_nf(4, " ");
        assert_eq!(t.get(0), "a b  ");
    }
}
