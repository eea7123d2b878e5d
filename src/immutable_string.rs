//! The `HawkStr` type: the shared, reference-counted string storage backing
//! `Value::Str` and `Value::NumericStr`.

use smartstring::{LazyCompact, SmartString};
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

type Backing = SmartString<LazyCompact>;

/// An immutable, reference-counted byte/char sequence.
///
/// A [`HawkStr`] wraps an [`Rc`]`<SmartString>` so that sharing a string
/// between values is a refcount bump, not a copy. Mutating a string (e.g.
/// building `$0` from fields) requires [`HawkStr::make_mut`], which clones
/// the backing storage only when the refcount is greater than one — the
/// same clone-on-write discipline the value system uses for every heap
/// variant (see spec.md §3's "duplicated on write when shared" invariant).
#[derive(Clone, Debug, Default)]
pub struct HawkStr(Rc<Backing>);

impl HawkStr {
    #[must_use]
    pub fn new(s: impl AsRef<str>) -> Self {
        Self(Rc::new(Backing::from(s.as_ref())))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn refcount(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    /// Obtain a mutable handle to the underlying buffer, cloning first if
    /// this string is shared with any other value.
    pub fn make_mut(&mut self) -> &mut Backing {
        Rc::make_mut(&mut self.0)
    }

    #[must_use]
    pub fn concat(&self, other: &str) -> Self {
        let mut s = Backing::from(self.as_str());
        s.push_str(other);
        Self(Rc::new(s))
    }
}

impl Deref for HawkStr {
    type Target = str;
    fn deref(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialEq for HawkStr {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0) || self.as_str() == other.as_str()
    }
}
impl Eq for HawkStr {}

impl PartialOrd for HawkStr {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.as_str().cmp(other.as_str()))
    }
}
impl Ord for HawkStr {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl std::hash::Hash for HawkStr {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_str().hash(state)
    }
}

impl fmt::Display for HawkStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for HawkStr {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
impl From<String> for HawkStr {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sharing_is_cheap_and_cow_on_write() {
        let a = HawkStr::new("hello");
        let mut b = a.clone();
        assert_eq!(a.refcount(), 2);
        b.make_mut().push_str(", world");
        assert_eq!(a.as_str(), "hello");
        assert_eq!(b.as_str(), "hello, world");
        assert_eq!(a.refcount(), 1);
    }
}
