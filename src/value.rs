//! Value: dynamic scope data and the two equality strategies
//!
//! Arrays and objects are shared handles, so a listener that pushes into an
//! array mutates the same storage the watcher last observed. That is what
//! makes the two strategies differ:
//!
//! | Strategy | Compound values | Leaves |
//! |----------|-----------------|--------|
//! | reference (`same`) | handle identity | by value, NaN == NaN |
//! | value (`deep_eq`) | element-wise / key-wise | reference strategy |

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Comparison and snapshot behavior the digest engine needs from a watched value.
pub trait WatchValue: Clone {
    /// Reference strategy: identity for compound values, NaN equals itself.
    fn same(&self, other: &Self) -> bool;

    /// Value strategy: structural equality falling back to [`WatchValue::same`] at leaves.
    fn deep_eq(&self, other: &Self) -> bool;

    /// Structural copy stored for value-equality watchers.
    fn snapshot(&self) -> Self {
        self.clone()
    }
}

pub type Array = Rc<RefCell<Vec<Value>>>;
pub type Object = Rc<RefCell<BTreeMap<String, Value>>>;

/// Dynamic scope value
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Array),
    Object(Object),
}

impl Value {
    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items.into_iter().collect())))
    }

    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Object(Rc::new(RefCell::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        )))
    }

    pub fn is_undefined(&self) -> bool { matches!(self, Value::Undefined) }

    pub fn as_f64(&self) -> Option<f64> {
        match self { Value::Number(n) => Some(*n), _ => None }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self { Value::Bool(b) => Some(*b), _ => None }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self { Value::String(s) => Some(s), _ => None }
    }

    /// Append in place. Returns false if this is not an array.
    pub fn push(&self, item: Value) -> bool {
        match self {
            Value::Array(a) => { a.borrow_mut().push(item); true }
            _ => false,
        }
    }

    /// Insert a key in place. Returns false if this is not an object.
    pub fn insert(&self, key: impl Into<String>, item: Value) -> bool {
        match self {
            Value::Object(o) => { o.borrow_mut().insert(key.into(), item); true }
            _ => false,
        }
    }

    /// Write one path segment in place: an object key, or an array index
    /// (`len` appends). Returns false when the segment does not fit.
    pub fn assign(&self, segment: &str, item: Value) -> bool {
        match self {
            Value::Object(_) => self.insert(segment, item),
            Value::Array(a) => {
                let Ok(index) = segment.parse::<usize>() else { return false };
                let mut items = a.borrow_mut();
                match index.cmp(&items.len()) {
                    std::cmp::Ordering::Less => { items[index] = item; true }
                    std::cmp::Ordering::Equal => { items.push(item); true }
                    std::cmp::Ordering::Greater => false,
                }
            }
            _ => false,
        }
    }

    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Array(a) => Some(a.borrow().len()),
            Value::Object(o) => Some(o.borrow().len()),
            Value::String(s) => Some(s.chars().count()),
            _ => None,
        }
    }

    /// Nested lookup with dot notation ("user.tags.0"). Missing segments yield `Undefined`.
    pub fn get_path(&self, path: &str) -> Value {
        let mut current = self.clone();
        for segment in path.split('.').filter(|s| !s.is_empty()) {
            let next = match &current {
                Value::Object(o) => o.borrow().get(segment).cloned(),
                Value::Array(a) => segment.parse::<usize>().ok().and_then(|i| a.borrow().get(i).cloned()),
                _ => None,
            };
            match next {
                Some(v) => current = v,
                None => return Value::Undefined,
            }
        }
        current
    }

    /// Lossy conversion: `Undefined` and non-finite numbers become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Undefined | Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(a) => serde_json::Value::Array(a.borrow().iter().map(Value::to_json).collect()),
            Value::Object(o) => serde_json::Value::Object(
                o.borrow().iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

impl WatchValue for Value {
    fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a.same(b),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    fn deep_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => {
                if Rc::ptr_eq(a, b) { return true; }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.deep_eq(y))
            }
            (Value::Object(a), Value::Object(b)) => {
                if Rc::ptr_eq(a, b) { return true; }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len()
                    && a.iter().all(|(k, x)| b.get(k).map(|y| x.deep_eq(y)).unwrap_or(false))
            }
            _ => self.same(other),
        }
    }

    fn snapshot(&self) -> Self {
        match self {
            Value::Array(a) => Value::array(a.borrow().iter().map(Value::snapshot)),
            Value::Object(o) => Value::object(o.borrow().iter().map(|(k, v)| (k.clone(), v.snapshot()))),
            other => other.clone(),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Array(a) => f.debug_list().entries(a.borrow().iter()).finish(),
            Value::Object(o) => f.debug_map().entries(o.borrow().iter()).finish(),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::array(items.into_iter().map(Value::from)),
            serde_json::Value::Object(map) => Value::object(map.into_iter().map(|(k, v)| (k, Value::from(v)))),
        }
    }
}

impl From<f64> for Value { fn from(n: f64) -> Self { Value::Number(n) } }
impl From<i32> for Value { fn from(n: i32) -> Self { Value::Number(n.into()) } }
impl From<bool> for Value { fn from(b: bool) -> Self { Value::Bool(b) } }
impl From<&str> for Value { fn from(s: &str) -> Self { Value::String(s.to_string()) } }
impl From<String> for Value { fn from(s: String) -> Self { Value::String(s) } }

// Primitive watch values: no handles, so both strategies agree.

impl WatchValue for f64 {
    fn same(&self, other: &Self) -> bool { self == other || (self.is_nan() && other.is_nan()) }
    fn deep_eq(&self, other: &Self) -> bool { self.same(other) }
}

macro_rules! watch_value_by_eq {
    ($($t:ty),*) => {$(
        impl WatchValue for $t {
            fn same(&self, other: &Self) -> bool { self == other }
            fn deep_eq(&self, other: &Self) -> bool { self == other }
        }
    )*};
}

watch_value_by_eq!(i64, bool, String);

/// JSON values are owned trees without identity; both strategies compare structurally.
impl WatchValue for serde_json::Value {
    fn same(&self, other: &Self) -> bool { self == other }
    fn deep_eq(&self, other: &Self) -> bool { self == other }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nan_is_same_as_nan() {
        assert!(Value::Number(f64::NAN).same(&Value::Number(f64::NAN)));
        assert!(f64::NAN.same(&f64::NAN));
        assert!(!Value::Number(0.0).same(&Value::Number(f64::NAN)));
    }

    #[test]
    fn reference_strategy_uses_handle_identity() {
        let a = Value::array([Value::from(1), Value::from(2)]);
        let b = Value::array([Value::from(1), Value::from(2)]);
        assert!(a.same(&a.clone()));
        assert!(!a.same(&b));
        assert!(a.deep_eq(&b));
    }

    #[test]
    fn deep_eq_recurses_into_objects() {
        let a = Value::from(json!({"user": {"tags": ["x", "y"]}, "n": 1}));
        let b = Value::from(json!({"user": {"tags": ["x", "y"]}, "n": 1}));
        let c = Value::from(json!({"user": {"tags": ["x"]}, "n": 1}));
        assert!(a.deep_eq(&b));
        assert!(!a.deep_eq(&c));
        assert!(!Value::Undefined.deep_eq(&Value::Null));
    }

    #[test]
    fn snapshot_detaches_from_source() {
        let list = Value::array([Value::from(1)]);
        let copy = list.snapshot();
        list.push(Value::from(2));
        assert_eq!(copy.len(), Some(1));
        assert_eq!(list.len(), Some(2));
        assert!(!list.deep_eq(&copy));
    }

    #[test]
    fn get_path_walks_objects_and_arrays() {
        let v = Value::from(json!({"user": {"tags": ["a", "b"]}}));
        assert_eq!(v.get_path("user.tags.1").as_str(), Some("b"));
        assert!(v.get_path("user.missing").is_undefined());
        assert!(v.get_path("user.tags.x").is_undefined());
    }

    #[test]
    fn assign_writes_keys_and_indices() {
        let v = Value::from(json!({"tags": ["a"]}));
        assert!(v.assign("name", Value::from("bee")));
        let tags = v.get_path("tags");
        assert!(tags.assign("0", Value::from("x")));
        assert!(tags.assign("1", Value::from("y")));
        assert!(!tags.assign("5", Value::from("z")));
        assert!(!tags.assign("first", Value::from("z")));
        assert!(!Value::from(1).assign("a", Value::Null));
        assert_eq!(v.to_json(), json!({"name": "bee", "tags": ["x", "y"]}));
    }

    #[test]
    fn json_round_trip_drops_undefined_and_nan() {
        let v = Value::object([("a", Value::Undefined), ("b", Value::Number(f64::NAN)), ("c", Value::from("x"))]);
        assert_eq!(v.to_json(), json!({"a": null, "b": null, "c": "x"}));
    }
}
