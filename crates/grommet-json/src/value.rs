//! The JSON value model.
//!
//! [`JsonValue`] is a tagged tree of JSON data. Containers own their children:
//! inserting a value into a [`JsonObject`] or [`JsonArray`] moves it in, and
//! dropping a container releases everything below it.
//!
//! Lookups are fail-soft. Asking an object for a missing key, indexing past
//! the end of an array, or asking a number for a field all yield
//! [`JsonValue::Null`] instead of panicking, so chained lookups such as
//! `value["result"]["capabilities"]` are always safe.

use std::borrow::Cow;
use std::fmt;
use std::ops::Index;

/// Shared null returned by fail-soft lookups.
static NULL: JsonValue = JsonValue::Null;

/// A JSON value.
///
/// Strings are stored as `Cow<'static, str>`: text built at runtime is owned,
/// while constant text (method names, protocol literals) can be wrapped with
/// [`JsonValue::borrowed`] without allocating.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum JsonValue {
    /// `null`
    #[default]
    Null,

    /// `true` or `false`
    Bool(bool),

    /// A number written without a fraction or exponent.
    Integer(i64),

    /// A number written with a fraction or exponent.
    Float(f64),

    /// A string, owned or borrowed from static text.
    String(Cow<'static, str>),

    /// An ordered collection of key/value pairs.
    Object(JsonObject),

    /// An ordered list of values.
    Array(JsonArray),
}

impl JsonValue {
    /// Create an empty object value.
    #[must_use]
    pub fn object() -> Self {
        Self::Object(JsonObject::new())
    }

    /// Create an empty array value.
    #[must_use]
    pub fn array() -> Self {
        Self::Array(JsonArray::new())
    }

    /// Create an owned string value.
    #[must_use]
    pub fn string(text: impl Into<String>) -> Self {
        Self::String(Cow::Owned(text.into()))
    }

    /// Create a string value that borrows static text instead of allocating.
    #[must_use]
    pub const fn borrowed(text: &'static str) -> Self {
        Self::String(Cow::Borrowed(text))
    }

    /// Name of the variant, for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Object(_) => "object",
            Self::Array(_) => "array",
        }
    }

    /// Returns `true` for `null`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` for objects.
    #[must_use]
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// Returns `true` for arrays.
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    /// Returns `true` for objects and arrays.
    #[must_use]
    pub fn is_container(&self) -> bool {
        self.is_object() || self.is_array()
    }

    /// The boolean, if this is a boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer, if this is an integer.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// The number as a float. Integers are widened.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// The string contents, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The object, if this is an object.
    #[must_use]
    pub fn as_object(&self) -> Option<&JsonObject> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Mutable access to the object, if this is an object.
    pub fn as_object_mut(&mut self) -> Option<&mut JsonObject> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// The array, if this is an array.
    #[must_use]
    pub fn as_array(&self) -> Option<&JsonArray> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Mutable access to the array, if this is an array.
    pub fn as_array_mut(&mut self) -> Option<&mut JsonArray> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Look up `key` in an object.
    ///
    /// Returns `null` when the key is absent or when `self` is not an object.
    #[must_use]
    pub fn get(&self, key: &str) -> &JsonValue {
        self.as_object().and_then(|o| o.get(key)).unwrap_or(&NULL)
    }

    /// Mutable lookup of `key` in an object.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut JsonValue> {
        self.as_object_mut().and_then(|o| o.get_mut(key))
    }

    /// Look up the element at `index` in an array.
    ///
    /// Returns `null` when out of bounds or when `self` is not an array.
    #[must_use]
    pub fn at(&self, index: usize) -> &JsonValue {
        self.as_array().and_then(|a| a.get(index)).unwrap_or(&NULL)
    }

    /// Insert or replace `key` in an object, returning the previous value.
    ///
    /// Does nothing and returns `None` when `self` is not an object.
    pub fn set(
        &mut self,
        key: impl Into<Cow<'static, str>>,
        value: impl Into<JsonValue>,
    ) -> Option<JsonValue> {
        self.as_object_mut().and_then(|o| o.set(key, value))
    }

    /// Append `value` to an array. Does nothing when `self` is not an array.
    pub fn push(&mut self, value: impl Into<JsonValue>) {
        if let Some(a) = self.as_array_mut() {
            a.push(value);
        }
    }

    /// Number of pairs or elements in a container; zero for scalars.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Object(o) => o.len(),
            Self::Array(a) => a.len(),
            _ => 0,
        }
    }

    /// Returns `true` when [`len`](Self::len) is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Index<&str> for JsonValue {
    type Output = JsonValue;

    fn index(&self, key: &str) -> &JsonValue {
        self.get(key)
    }
}

impl Index<usize> for JsonValue {
    type Output = JsonValue;

    fn index(&self, index: usize) -> &JsonValue {
        self.at(index)
    }
}

impl fmt::Display for JsonValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::encode::encode(self))
    }
}

impl From<bool> for JsonValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for JsonValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for JsonValue {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<u32> for JsonValue {
    fn from(i: u32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<f64> for JsonValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<String> for JsonValue {
    fn from(s: String) -> Self {
        Self::String(Cow::Owned(s))
    }
}

impl From<&'static str> for JsonValue {
    fn from(s: &'static str) -> Self {
        Self::String(Cow::Borrowed(s))
    }
}

impl From<Cow<'static, str>> for JsonValue {
    fn from(s: Cow<'static, str>) -> Self {
        Self::String(s)
    }
}

impl From<JsonObject> for JsonValue {
    fn from(o: JsonObject) -> Self {
        Self::Object(o)
    }
}

impl From<JsonArray> for JsonValue {
    fn from(a: JsonArray) -> Self {
        Self::Array(a)
    }
}

impl From<Vec<JsonValue>> for JsonValue {
    fn from(values: Vec<JsonValue>) -> Self {
        Self::Array(JsonArray::from(values))
    }
}

impl<T: Into<JsonValue>> From<Option<T>> for JsonValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl FromIterator<JsonValue> for JsonValue {
    fn from_iter<I: IntoIterator<Item = JsonValue>>(iter: I) -> Self {
        Self::Array(iter.into_iter().collect())
    }
}

/// An ordered set of key/value pairs with unique keys.
///
/// Keys keep the position of their first insertion. Setting an existing key
/// replaces its value in place.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JsonObject {
    pairs: Vec<(Cow<'static, str>, JsonValue)>,
}

impl JsonObject {
    /// Create an empty object.
    #[must_use]
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Create an empty object with room for `capacity` pairs.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pairs: Vec::with_capacity(capacity),
        }
    }

    /// Number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns `true` if the object has no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The value stored under `key`, compared by exact string match.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.pairs
            .iter()
            .find(|(k, _)| k.as_ref() == key)
            .map(|(_, v)| v)
    }

    /// Mutable access to the value stored under `key`.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut JsonValue> {
        self.pairs
            .iter_mut()
            .find(|(k, _)| k.as_ref() == key)
            .map(|(_, v)| v)
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert `value` under `key`.
    ///
    /// If the key already exists its value is replaced in place and the old
    /// value is returned; otherwise the pair is appended and `None` returned.
    pub fn set(
        &mut self,
        key: impl Into<Cow<'static, str>>,
        value: impl Into<JsonValue>,
    ) -> Option<JsonValue> {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.get_mut(&key) {
            return Some(std::mem::replace(slot, value));
        }
        self.pairs.push((key, value));
        None
    }

    /// Remove `key`, preserving the order of the remaining pairs.
    pub fn remove(&mut self, key: &str) -> Option<JsonValue> {
        let index = self.pairs.iter().position(|(k, _)| k.as_ref() == key)?;
        Some(self.pairs.remove(index).1)
    }

    /// Iterate over pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
        self.pairs.iter().map(|(k, v)| (k.as_ref(), v))
    }

    /// Iterate over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(k, _)| k.as_ref())
    }
}

impl<K, V> FromIterator<(K, V)> for JsonObject
where
    K: Into<Cow<'static, str>>,
    V: Into<JsonValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut object = Self::new();
        for (k, v) in iter {
            object.set(k, v);
        }
        object
    }
}

impl IntoIterator for JsonObject {
    type Item = (Cow<'static, str>, JsonValue);
    type IntoIter = std::vec::IntoIter<(Cow<'static, str>, JsonValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.into_iter()
    }
}

/// An ordered, growable list of JSON values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JsonArray {
    items: Vec<JsonValue>,
}

impl JsonArray {
    /// Create an empty array.
    #[must_use]
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Create an empty array with room for `capacity` elements.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    /// Append a value.
    pub fn push(&mut self, value: impl Into<JsonValue>) {
        self.items.push(value.into());
    }

    /// The element at `index`, if in bounds.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&JsonValue> {
        self.items.get(index)
    }

    /// Mutable access to the element at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut JsonValue> {
        self.items.get_mut(index)
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the array has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over elements in order.
    pub fn iter(&self) -> std::slice::Iter<'_, JsonValue> {
        self.items.iter()
    }

    /// The elements as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[JsonValue] {
        &self.items
    }
}

impl From<Vec<JsonValue>> for JsonArray {
    fn from(items: Vec<JsonValue>) -> Self {
        Self { items }
    }
}

impl FromIterator<JsonValue> for JsonArray {
    fn from_iter<I: IntoIterator<Item = JsonValue>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for JsonArray {
    type Item = JsonValue;
    type IntoIter = std::vec::IntoIter<JsonValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a JsonArray {
    type Item = &'a JsonValue;
    type IntoIter = std::slice::Iter<'a, JsonValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
