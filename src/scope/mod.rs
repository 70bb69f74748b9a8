//! Scope: observed data plus its watcher registry
//!
//! ```text
//! caller mutates fields ──► digest()
//!                              │
//!                              ▼
//!                   run_once() over watchers (registration order)
//!                              │ dirty? listener(new, old, scope)
//!                              ▼
//!                   repeat until clean or ttl exceeded
//! ```
//!
//! Listeners get `&mut Scope`: they may set fields and register watchers,
//! and both are seen by later passes of the same digest.

mod digest;
mod watcher;

pub use watcher::Watch;

use std::collections::BTreeMap;

use crate::config::DigestConfig;
use crate::error::DigestError;
use crate::value::{Value, WatchValue};
use watcher::Watcher;

pub struct Scope<V: WatchValue = Value> {
    fields: BTreeMap<String, V>,
    watchers: Vec<Watcher<V>>,
    /// Index of the most recently dirtied watcher in the running digest.
    last_dirty_watch: Option<usize>,
    config: DigestConfig,
    digesting: bool,
}

impl<V: WatchValue> Default for Scope<V> {
    fn default() -> Self { Self::new() }
}

impl<V: WatchValue> Scope<V> {
    pub fn new() -> Self { Self::with_config(DigestConfig::default()) }

    pub fn with_config(config: DigestConfig) -> Self {
        Self { fields: BTreeMap::new(), watchers: Vec::new(), last_dirty_watch: None, config, digesting: false }
    }

    pub fn config(&self) -> &DigestConfig { &self.config }

    // ---------------------------------------------------------------------
    // Data
    // ---------------------------------------------------------------------

    pub fn get(&self, key: &str) -> Option<&V> { self.fields.get(key) }
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<V>) -> Option<V> {
        self.fields.insert(key.into(), value.into())
    }
    pub fn remove(&mut self, key: &str) -> Option<V> { self.fields.remove(key) }
    pub fn contains(&self, key: &str) -> bool { self.fields.contains_key(key) }
    pub fn keys(&self) -> impl Iterator<Item = &str> { self.fields.keys().map(String::as_str) }

    // ---------------------------------------------------------------------
    // Watchers
    // ---------------------------------------------------------------------

    /// Register a watcher. It is evaluated on the next pass, including a pass
    /// already in progress when called from a listener.
    pub fn watch(&mut self, watch: Watch<V>) {
        self.watchers.push(watch.into());
        self.last_dirty_watch = None;
    }

    pub fn watcher_count(&self) -> usize { self.watchers.len() }

    pub fn is_digesting(&self) -> bool { self.digesting }

    /// Run `f` against the scope.
    pub fn eval<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R { f(self) }

    /// Run `f` against the scope, then digest.
    pub fn apply<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> Result<R, DigestError> {
        if self.digesting { return Err(DigestError::InProgress); }
        let result = f(self);
        self.digest()?;
        Ok(result)
    }
}

impl Scope<Value> {
    /// Field value, `Undefined` when absent. Dot paths reach into nested values.
    pub fn field(&self, path: &str) -> Value {
        let mut segments = path.splitn(2, '.');
        let head = segments.next().unwrap_or_default();
        let root = self.fields.get(head).cloned().unwrap_or_default();
        match segments.next() {
            Some(rest) => root.get_path(rest),
            None => root,
        }
    }

    /// Write through a dot path. The parent must already be an object or an
    /// array; returns false otherwise. A plain key sets a top-level field.
    pub fn set_path(&mut self, path: &str, value: impl Into<Value>) -> bool {
        match path.rsplit_once('.') {
            None => { self.fields.insert(path.to_string(), value.into()); true }
            Some((parent, last)) => self.field(parent).assign(last, value.into()),
        }
    }

    /// Load every key of a JSON object as a field. Non-objects are ignored.
    pub fn extend_from_json(&mut self, json: serde_json::Value) {
        if let serde_json::Value::Object(map) = json {
            for (k, v) in map { self.fields.insert(k, Value::from(v)); }
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(self.fields.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scope_is_a_key_value_container() {
        let mut scope: Scope = Scope::new();
        assert!(scope.field("missing").is_undefined());
        scope.set("name", "bee");
        assert!(scope.contains("name"));
        assert_eq!(scope.field("name").as_str(), Some("bee"));
        assert_eq!(scope.keys().collect::<Vec<_>>(), vec!["name"]);
        assert!(scope.remove("name").is_some());
        assert!(!scope.contains("name"));
    }

    #[test]
    fn field_follows_dot_paths() {
        let mut scope: Scope = Scope::new();
        scope.extend_from_json(json!({"user": {"tags": ["a", "b"]}}));
        assert_eq!(scope.field("user.tags.0").as_str(), Some("a"));
        assert!(scope.field("user.none").is_undefined());
        assert_eq!(scope.to_json(), json!({"user": {"tags": ["a", "b"]}}));
    }

    #[test]
    fn set_path_writes_into_nested_values() {
        let mut scope: Scope = Scope::new();
        scope.extend_from_json(json!({"user": {"name": "ada", "tags": ["a"]}}));
        assert!(scope.set_path("user.name", "bee"));
        assert!(scope.set_path("user.tags.1", "b"));
        assert!(scope.set_path("plain", 1));
        assert!(!scope.set_path("missing.name", "x"));
        assert!(!scope.set_path("user.name.first", "x"));
        assert_eq!(scope.field("user.name").as_str(), Some("bee"));
        assert_eq!(scope.keys().collect::<Vec<_>>(), vec!["plain", "user"]);
        assert_eq!(scope.to_json()["user"], json!({"name": "bee", "tags": ["a", "b"]}));
    }

    #[test]
    fn watch_clears_the_short_circuit_marker() {
        let mut scope: Scope = Scope::new();
        scope.last_dirty_watch = Some(0);
        scope.watch(Watch::new(|_: &mut Scope| Value::Null));
        assert_eq!(scope.last_dirty_watch, None);
        assert_eq!(scope.watcher_count(), 1);
    }

    #[test]
    fn eval_returns_closure_result() {
        let mut scope: Scope = Scope::new();
        scope.set("a", 2);
        let doubled = scope.eval(|s| s.field("a").as_f64().unwrap_or(0.0) * 2.0);
        assert_eq!(doubled, 4.0);
    }
}
