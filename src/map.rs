//! The associative array container backing `Value::Map` (spec.md §3/§4.1).
//!
//! Grounded on the teacher's hash-table discipline (capacity-doubling,
//! load-factor-driven rehash) as described for `hawk-map.h` in
//! `original_source/`: an `ahash`-keyed index over an append-only entry
//! list gives O(1) expected `get`/`put`/`in`, and iteration order is the
//! insertion order, stable between mutations except that a deleted entry
//! leaves a tombstone rather than shifting its neighbors — exactly the
//! "deletion during iteration invalidates only the deleted entry's cursor"
//! contract spec.md §4.1 asks for.

use crate::immutable_string::HawkStr;
use crate::value::Value;
use ahash::AHashMap;

struct Entry {
    key: HawkStr,
    value: Value,
    live: bool,
}

/// An AWK associative array: string keys, `Value` elements, stable
/// insertion-order iteration.
#[derive(Default)]
pub struct Map {
    entries: Vec<Entry>,
    index: AHashMap<HawkStr, usize>,
    live_count: usize,
}

impl Map {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: AHashMap::new(),
            live_count: 0,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.live_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live_count == 0
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.index
            .get(key)
            .map(|&i| &self.entries[i])
            .filter(|e| e.live)
            .map(|e| &e.value)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or overwrite `key`. Keys are duplicated on insert, as spec.md
    /// §4.1 requires ("keys are stored by value").
    pub fn put(&mut self, key: &str, value: Value) {
        if let Some(&i) = self.index.get(key) {
            let e = &mut self.entries[i];
            if !e.live {
                self.live_count += 1;
                e.live = true;
            }
            e.value = value;
        } else {
            let k = HawkStr::new(key);
            self.index.insert(k.clone(), self.entries.len());
            self.entries.push(Entry {
                key: k,
                value,
                live: true,
            });
            self.live_count += 1;
        }
    }

    /// Delete a single key; a no-op if absent (spec.md §4.5).
    pub fn delete(&mut self, key: &str) -> bool {
        if let Some(&i) = self.index.get(key) {
            let e = &mut self.entries[i];
            if e.live {
                e.live = false;
                self.live_count -= 1;
                return true;
            }
        }
        false
    }

    /// Clear the whole map (`delete a`).
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.live_count = 0;
    }

    /// Iterate live keys in stable insertion order. Mutations made through
    /// a fresh `Map::put`/`delete` call while an iterator from a *previous*
    /// snapshot is alive cannot invalidate anything but the touched
    /// entry, since entries are never moved or reused in place.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .iter()
            .filter(|e| e.live)
            .map(|e| (e.key.as_str(), &e.value))
    }

    pub fn keys(&self) -> Vec<HawkStr> {
        self.entries
            .iter()
            .filter(|e| e.live)
            .map(|e| e.key.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iteration_visits_each_live_key_once() {
        let mut m = Map::new();
        m.put("x", Value::new_int(1));
        m.put("y", Value::new_int(2));
        m.put("z", Value::new_int(3));
        m.delete("y");
        let mut seen: Vec<_> = m.iter().map(|(k, _)| k.to_string()).collect();
        seen.sort();
        assert_eq!(seen, vec!["x".to_string(), "z".to_string()]);
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn reinsert_after_delete_is_live_again() {
        let mut m = Map::new();
        m.put("a", Value::new_int(1));
        m.delete("a");
        assert!(!m.contains("a"));
        m.put("a", Value::new_int(2));
        assert!(m.contains("a"));
        assert_eq!(m.get("a").unwrap().to_int(), 2);
    }
}
