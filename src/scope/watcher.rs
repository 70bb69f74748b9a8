//! Watch: registration builder and the watcher record it becomes

use std::rc::Rc;

use super::Scope;
use crate::value::WatchValue;

pub(crate) type Evaluate<V> = Rc<dyn Fn(&mut Scope<V>) -> V>;
pub(crate) type Listener<V> = Rc<dyn Fn(&V, &V, &mut Scope<V>)>;

/// A watcher to register with [`Scope::watch`].
///
/// ```ignore
/// scope.watch(
///     Watch::new(|s: &mut Scope| s.field("items"))
///         .with_listener(|new, _old, s| { s.set("count", new.len().unwrap_or(0) as f64); })
///         .with_value_equality(),
/// );
/// ```
pub struct Watch<V: WatchValue> {
    pub(crate) evaluate: Evaluate<V>,
    pub(crate) listener: Option<Listener<V>>,
    pub(crate) value_equality: bool,
}

impl<V: WatchValue> Watch<V> {
    pub fn new(evaluate: impl Fn(&mut Scope<V>) -> V + 'static) -> Self {
        Self { evaluate: Rc::new(evaluate), listener: None, value_equality: false }
    }

    /// Called with `(new, old, scope)` whenever the derived value changes.
    pub fn with_listener(mut self, listener: impl Fn(&V, &V, &mut Scope<V>) + 'static) -> Self {
        self.listener = Some(Rc::new(listener));
        self
    }

    /// Compare structurally instead of by reference, catching in-place mutation.
    pub fn with_value_equality(mut self) -> Self { self.value_equality = true; self }
}

pub(crate) struct Watcher<V: WatchValue> {
    pub(crate) evaluate: Evaluate<V>,
    pub(crate) listener: Option<Listener<V>>,
    pub(crate) value_equality: bool,
    /// `None` until the first evaluation; never equal to any value.
    pub(crate) last: Option<V>,
}

impl<V: WatchValue> Watcher<V> {
    pub(crate) fn is_dirty(&self, value: &V) -> bool {
        match &self.last {
            None => true,
            Some(last) if self.value_equality => !value.deep_eq(last),
            Some(last) => !value.same(last),
        }
    }

    /// Store `value` as the new observation and return the previous one.
    /// On first observation the previous value is `value` itself.
    pub(crate) fn record(&mut self, value: &V) -> V {
        let stored = if self.value_equality { value.snapshot() } else { value.clone() };
        self.last.replace(stored).unwrap_or_else(|| value.clone())
    }
}

impl<V: WatchValue> From<Watch<V>> for Watcher<V> {
    fn from(watch: Watch<V>) -> Self {
        Self { evaluate: watch.evaluate, listener: watch.listener, value_equality: watch.value_equality, last: None }
    }
}
