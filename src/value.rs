use core::cmp::Ordering;
use core::fmt;
use std::rc::Rc;

use cid::Cid;

use crate::Kind;

/// A dynamic IPLD value: the tagged union over the nine [`Kind`]s.
///
/// Heap kinds (string, bytes, list, map, link) are shared: cloning a handle
/// bumps a reference count, dropping the last handle releases the payload and
/// the children with it. The value graph is a tree by construction; no public
/// API can introduce a cycle.
///
/// Mutating a shared list or map detaches it first (clone-on-write), so a
/// mutation is only ever observable through the handle it was performed on.
#[derive(Clone)]
pub enum Value {
    /// The null value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed 64-bit integer.
    Integer(i64),
    /// An IEEE-754 binary64 float. Encoders reject NaN and infinities.
    Float(f64),
    /// UTF-8 text.
    String(Rc<str>),
    /// An octet sequence.
    Bytes(Rc<[u8]>),
    /// An ordered sequence of values.
    List(List),
    /// An ordered, insertion-preserving mapping from strings to values.
    Map(Map),
    /// A link to another content-addressed block.
    Link(Rc<Cid>),
}

impl Value {
    /// Construct a string value, copying `s`.
    #[must_use]
    pub fn string(s: impl AsRef<str>) -> Self {
        Self::String(Rc::from(s.as_ref()))
    }

    /// Construct a bytes value, copying `b`.
    #[must_use]
    pub fn bytes(b: impl AsRef<[u8]>) -> Self {
        Self::Bytes(Rc::from(b.as_ref()))
    }

    /// Construct a list value, taking ownership of `items`.
    #[must_use]
    pub fn list(items: Vec<Self>) -> Self {
        Self::List(List::from_values(items))
    }

    /// Construct a map value from `(key, value)` pairs.
    ///
    /// Later duplicates of a key overwrite earlier ones.
    #[must_use]
    pub fn map<K: AsRef<str>>(entries: impl IntoIterator<Item = (K, Self)>) -> Self {
        Self::Map(Map::from_entries(entries))
    }

    /// Construct a link value.
    #[must_use]
    pub fn link(cid: Cid) -> Self {
        Self::Link(Rc::new(cid))
    }

    /// The kind of this value.
    #[must_use]
    pub const fn kind(&self) -> Kind {
        match self {
            Self::Null => Kind::Null,
            Self::Bool(_) => Kind::Bool,
            Self::Integer(_) => Kind::Integer,
            Self::Float(_) => Kind::Float,
            Self::String(_) => Kind::String,
            Self::Bytes(_) => Kind::Bytes,
            Self::List(_) => Kind::List,
            Self::Map(_) => Kind::Map,
            Self::Link(_) => Kind::Link,
        }
    }

    /// Returns `true` iff this is the null value.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The boolean payload, if this is a boolean.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer payload, if this is an integer.
    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// The float payload, if this is a float.
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// The text payload, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The octet payload, if this is a bytes value.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// The list payload, if this is a list.
    #[must_use]
    pub const fn as_list(&self) -> Option<&List> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    /// The map payload, if this is a map.
    #[must_use]
    pub const fn as_map(&self) -> Option<&Map> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// The link payload, if this is a link.
    #[must_use]
    pub fn as_link(&self) -> Option<&Cid> {
        match self {
            Self::Link(c) => Some(c),
            _ => None,
        }
    }

    /// Structural-equality assertion helper for tests.
    ///
    /// Returns a human-readable description of the first mismatch between
    /// `self` and `expected`, or `Ok(())` when the two are structurally equal.
    ///
    /// # Errors
    ///
    /// Returns the path and nature of the first mismatch.
    pub fn expect_eq(&self, expected: &Self) -> Result<(), String> {
        let mut path = String::from("$");
        mismatch(self, expected, &mut path)
    }
}

fn mismatch(actual: &Value, expected: &Value, path: &mut String) -> Result<(), String> {
    if actual.kind() != expected.kind() {
        return Err(format!(
            "at {path}: expected {}, found {}",
            expected.kind(),
            actual.kind()
        ));
    }
    match (actual, expected) {
        (Value::List(a), Value::List(b)) => {
            if a.len() != b.len() {
                return Err(format!(
                    "at {path}: list length {} != expected {}",
                    a.len(),
                    b.len()
                ));
            }
            for (i, (av, bv)) in a.iter().zip(b.iter()).enumerate() {
                let len = path.len();
                path.push_str(&format!("[{i}]"));
                mismatch(av, bv, path)?;
                path.truncate(len);
            }
            Ok(())
        }
        (Value::Map(a), Value::Map(b)) => {
            if a.len() != b.len() {
                return Err(format!(
                    "at {path}: map length {} != expected {}",
                    a.len(),
                    b.len()
                ));
            }
            for (k, bv) in b.iter() {
                let len = path.len();
                path.push_str(&format!(".{k}"));
                match a.get(k) {
                    Some(av) => mismatch(av, bv, path)?,
                    None => return Err(format!("at {path}: key missing")),
                }
                path.truncate(len);
            }
            Ok(())
        }
        _ => {
            if actual == expected {
                Ok(())
            } else {
                Err(format!("at {path}: {actual:?} != expected {expected:?}"))
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            // Bitwise: distinguishes -0.0 from 0.0 and stays reflexive.
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::String(a), Self::String(b)) => Rc::ptr_eq(a, b) || a == b,
            (Self::Bytes(a), Self::Bytes(b)) => Rc::ptr_eq(a, b) || a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Link(a), Self::Link(b)) => Rc::ptr_eq(a, b) || a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v:?}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Bytes(b) => {
                f.write_str("h'")?;
                for byte in b.iter() {
                    write!(f, "{byte:02x}")?;
                }
                f.write_str("'")
            }
            Self::List(l) => f.debug_list().entries(l.iter()).finish(),
            Self::Map(m) => f.debug_map().entries(m.iter()).finish(),
            Self::Link(c) => write!(f, "link({c})"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::string(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::list(v)
    }
}

impl From<Cid> for Value {
    fn from(v: Cid) -> Self {
        Self::link(v)
    }
}

/// An ordered sequence of [`Value`]s with shared ownership.
#[derive(Clone, Default, PartialEq)]
pub struct List {
    items: Rc<Vec<Value>>,
}

impl List {
    /// An empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from already-owned values without copying them.
    #[must_use]
    pub fn from_values(items: Vec<Value>) -> Self {
        Self {
            items: Rc::new(items),
        }
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` iff the list has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The element at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    /// Append a value.
    pub fn push(&mut self, v: Value) {
        Rc::make_mut(&mut self.items).push(v);
    }

    /// Insert a value at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, v: Value) {
        Rc::make_mut(&mut self.items).insert(index, v);
    }

    /// Remove and return the value at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn remove(&mut self, index: usize) -> Value {
        Rc::make_mut(&mut self.items).remove(index)
    }

    /// Remove and return the last value, if any.
    pub fn pop(&mut self) -> Option<Value> {
        Rc::make_mut(&mut self.items).pop()
    }

    /// Iterate over the elements.
    pub fn iter(&self) -> core::slice::Iter<'_, Value> {
        self.items.iter()
    }

    /// The elements as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Value] {
        &self.items
    }
}

impl<'a> IntoIterator for &'a List {
    type Item = &'a Value;
    type IntoIter = core::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Value> for List {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::from_values(iter.into_iter().collect())
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// An ordered, insertion-preserving string-keyed mapping with shared
/// ownership.
///
/// Iteration follows insertion order; the codecs emit keys through a sorted
/// projection and never reorder the map itself. Keys are unique: [`Map::set`]
/// overwrites the previous value for an existing key.
#[derive(Clone, Default)]
pub struct Map {
    entries: Rc<Vec<(Rc<str>, Value)>>,
}

impl Map {
    /// An empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from `(key, value)` pairs; later duplicates of a key
    /// overwrite earlier ones.
    #[must_use]
    pub fn from_entries<K: AsRef<str>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        let mut map = Self::new();
        for (k, v) in entries {
            map.set(k.as_ref(), v);
        }
        map
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` iff the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The value stored under `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_ref() == key)
            .map(|(_, v)| v)
    }

    /// Insert or overwrite the value under `key`. The key is copied.
    pub fn set(&mut self, key: &str, v: Value) {
        let entries = Rc::make_mut(&mut self.entries);
        if let Some(entry) = entries.iter_mut().find(|(k, _)| k.as_ref() == key) {
            entry.1 = v;
        } else {
            entries.push((Rc::from(key), v));
        }
    }

    /// Remove and return the value under `key`, if any.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let entries = Rc::make_mut(&mut self.entries);
        let idx = entries.iter().position(|(k, _)| k.as_ref() == key)?;
        Some(entries.remove(idx).1)
    }

    /// Iterate over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_ref(), v))
    }

    /// Reorder entries by a key comparator. Stability is not guaranteed.
    pub fn sort_by(&mut self, mut cmp: impl FnMut(&str, &str) -> Ordering) {
        Rc::make_mut(&mut self.entries).sort_unstable_by(|(a, _), (b, _)| cmp(a, b));
    }

    /// Build a map directly from decoded entries.
    ///
    /// The caller guarantees key uniqueness; wire order is preserved.
    pub(crate) fn from_raw_entries(entries: Vec<(Rc<str>, Value)>) -> Self {
        Self {
            entries: Rc::new(entries),
        }
    }

    pub(crate) fn raw_entries(&self) -> &[(Rc<str>, Value)] {
        &self.entries
    }
}

impl PartialEq for Map {
    fn eq(&self, other: &Self) -> bool {
        if Rc::ptr_eq(&self.entries, &other.entries) {
            return true;
        }
        if self.len() != other.len() {
            return false;
        }
        // Order-independent: same key set, pointwise-equal values.
        self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K: AsRef<str>> FromIterator<(K, Value)> for Map {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self::from_entries(iter)
    }
}

impl fmt::Debug for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
