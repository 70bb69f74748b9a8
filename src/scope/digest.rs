//! Digest: dirty-checking passes until the scope settles

use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use super::Scope;
use crate::error::DigestError;
use crate::value::WatchValue;

impl<V: WatchValue> Scope<V> {
    /// Re-evaluate watchers until a pass finds nothing dirty.
    ///
    /// Fails with [`DigestError::ConvergenceExceeded`] once more than `ttl`
    /// successive passes are dirty, and with [`DigestError::InProgress`] when
    /// called from inside a running digest.
    pub fn digest(&mut self) -> Result<(), DigestError> {
        if self.digesting { return Err(DigestError::InProgress); }
        DigestPhase::enter(self).digest_loop()
    }

    fn digest_loop(&mut self) -> Result<(), DigestError> {
        let ttl = self.config.ttl;
        self.last_dirty_watch = None;
        let mut passes = 0usize;
        loop {
            let dirty = self.run_once();
            passes += 1;
            if !dirty {
                tracing::debug!(passes, watchers = self.watchers.len(), "digest settled");
                return Ok(());
            }
            if passes > ttl {
                tracing::warn!(ttl, watchers = self.watchers.len(), "digest did not converge");
                return Err(DigestError::ConvergenceExceeded { ttl });
            }
        }
    }

    /// One pass over the registry. Returns whether any watcher was dirty.
    ///
    /// Indexed on purpose: listeners may append watchers mid-pass.
    pub(crate) fn run_once(&mut self) -> bool {
        let mut dirty = false;
        let mut index = 0;
        while index < self.watchers.len() {
            let evaluate = Rc::clone(&self.watchers[index].evaluate);
            let value = evaluate(self);

            let watcher = &mut self.watchers[index];
            if watcher.is_dirty(&value) {
                let old = watcher.record(&value);
                let listener = watcher.listener.clone();
                self.last_dirty_watch = Some(index);
                tracing::trace!(watcher = index, "dirty");
                if let Some(listener) = listener {
                    listener(&value, &old, self);
                }
                dirty = true;
            } else if self.last_dirty_watch == Some(index) {
                // Full rotation since the last change.
                return dirty;
            }
            index += 1;
        }
        dirty
    }
}

/// Marks the scope as digesting until dropped, including on unwind.
struct DigestPhase<'a, V: WatchValue>(&'a mut Scope<V>);

impl<'a, V: WatchValue> DigestPhase<'a, V> {
    fn enter(scope: &'a mut Scope<V>) -> Self {
        scope.digesting = true;
        Self(scope)
    }
}

impl<V: WatchValue> Deref for DigestPhase<'_, V> {
    type Target = Scope<V>;
    fn deref(&self) -> &Scope<V> { self.0 }
}

impl<V: WatchValue> DerefMut for DigestPhase<'_, V> {
    fn deref_mut(&mut self) -> &mut Scope<V> { self.0 }
}

impl<V: WatchValue> Drop for DigestPhase<'_, V> {
    fn drop(&mut self) { self.0.digesting = false; }
}
