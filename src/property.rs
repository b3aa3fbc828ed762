use std::sync::{Arc, RwLock};

use derive_ex::derive_ex;
use serde::{Deserialize, Serialize};

use crate::{ChangeEvent, Error, Listener, ObservableValue, Result, Subscription};

#[cfg(test)]
mod tests;

/// Writable [`ObservableValue`] that tracks a dirty flag against a remembered
/// clean baseline and enforces a read-only flag at mutation time.
///
/// Invariant: after any mutation settles, `is_dirty()` equals "current value
/// differs from the clean baseline".
#[derive_ex(Clone, bound())]
pub struct Property<T: 'static>(Arc<PropertyNode<T>>);

struct PropertyNode<T: 'static> {
    value: ObservableValue<T>,
    dirty: ObservableValue<bool>,
    read_only: ObservableValue<bool>,
    baseline: RwLock<Option<T>>,
}

impl<T: Clone + PartialEq + 'static> Property<T> {
    /// A clean property holding `value`.
    pub fn new(value: T) -> Self {
        Self::with_initial(Some(value))
    }

    /// A clean property holding no value.
    pub fn empty() -> Self {
        Self::with_initial(None)
    }

    fn with_initial(initial: Option<T>) -> Self {
        Self(Arc::new(PropertyNode {
            value: ObservableValue::new(initial.clone()),
            dirty: ObservableValue::new(Some(false)),
            read_only: ObservableValue::new(Some(false)),
            baseline: RwLock::new(initial),
        }))
    }

    pub fn get(&self) -> Option<T> {
        self.0.value.get()
    }

    pub fn is_empty(&self) -> bool {
        self.0.value.is_empty()
    }

    pub fn has_value(&self) -> bool {
        self.0.value.has_value()
    }

    /// Handle to the value observable, for wiring into computed values.
    pub fn observable(&self) -> ObservableValue<T> {
        self.0.value.clone()
    }

    /// Handle to the dirty flag observable.
    pub fn dirty(&self) -> ObservableValue<bool> {
        self.0.dirty.clone()
    }

    /// Handle to the read-only flag observable.
    pub fn read_only(&self) -> ObservableValue<bool> {
        self.0.read_only.clone()
    }

    pub fn subscribe(&self, f: impl Fn(&ChangeEvent<T>) + Send + Sync + 'static) -> Subscription {
        self.0.value.subscribe(f)
    }

    pub fn subscribe_weak<L: Listener<ChangeEvent<T>>>(&self, listener: &Arc<L>) {
        self.0.value.subscribe_weak(listener);
    }

    /// Sets the value. Fails without changing state while the property is
    /// read-only. The value change event fires before the dirty flag
    /// recomputes, and the dirty flag only notifies when it flips.
    pub fn set(&self, value: T) -> Result<()> {
        self.set_value(Some(value))
    }

    /// Sets the value to empty, under the same contract as [`set`](Self::set).
    pub fn clear(&self) -> Result<()> {
        self.set_value(None)
    }

    fn set_value(&self, value: Option<T>) -> Result<()> {
        if self.is_read_only() {
            return Err(Error::ReadOnly);
        }
        self.0.value.set(value);
        self.update_dirty();
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.0.dirty.get() == Some(true)
    }

    /// Remembers the current value as the clean baseline.
    pub fn reset_dirty_flag(&self) {
        *self.0.baseline.write().unwrap() = self.0.value.get();
        self.0.dirty.set(Some(false));
    }

    /// Sets the value and marks it clean. Used to load external data without
    /// flagging the field as user-modified; inherits the read-only failure
    /// from [`set`](Self::set).
    pub fn set_clean(&self, value: T) -> Result<()> {
        self.set(value)?;
        self.reset_dirty_flag();
        Ok(())
    }

    /// Restores the clean baseline, reverting any user modification.
    pub fn discard(&self) {
        let baseline = self.0.baseline.read().unwrap().clone();
        self.0.value.set(baseline);
        self.0.dirty.set(Some(false));
    }

    pub fn is_read_only(&self) -> bool {
        self.0.read_only.get() == Some(true)
    }

    /// Flips the read-only flag with notification. Does not touch the value.
    pub fn set_read_only(&self, read_only: bool) {
        self.0.read_only.set(Some(read_only));
    }

    fn update_dirty(&self) {
        let dirty = {
            let baseline = self.0.baseline.read().unwrap();
            *baseline != self.0.value.get()
        };
        self.0.dirty.set(Some(dirty));
    }
}

impl<T: Clone + PartialEq + 'static> Default for Property<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self.0.value, f)
    }
}

impl<T> Serialize for Property<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        self.0.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Property<T>
where
    T: Deserialize<'de> + Clone + PartialEq,
{
    fn deserialize<D>(deserializer: D) -> std::result::Result<Property<T>, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Property::with_initial)
    }
}
