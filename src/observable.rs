use std::sync::{Arc, RwLock};

use derive_ex::derive_ex;
use serde::{Deserialize, Serialize};

use crate::{Listener, ListenerRegistry, Subscription};

#[cfg(test)]
mod tests;

/// Event fired when an observable's value changes.
#[derive(Clone, Debug, PartialEq)]
pub struct ChangeEvent<T> {
    pub old_value: Option<T>,
    pub new_value: Option<T>,
}

/// Read-only box around an optional value with change notification.
///
/// Cloning returns another handle to the same underlying value. Emptiness is
/// represented as `None`. Mutation is crate-internal; external code writes
/// through [`Property`](crate::Property) or derives values with
/// [`ComputedValue`](crate::ComputedValue).
#[derive_ex(Clone, bound())]
pub struct ObservableValue<T: 'static>(Arc<ValueNode<T>>);

struct ValueNode<T> {
    value: RwLock<Option<T>>,
    listeners: ListenerRegistry<ChangeEvent<T>>,
}

impl<T: 'static> ObservableValue<T> {
    pub(crate) fn new(initial: Option<T>) -> Self {
        Self(Arc::new(ValueNode {
            value: RwLock::new(initial),
            listeners: ListenerRegistry::new(),
        }))
    }

    /// An observable that holds `value` and never changes.
    pub fn constant(value: T) -> Self {
        Self::new(Some(value))
    }

    /// An observable that is empty and never changes.
    pub fn empty() -> Self {
        Self::new(None)
    }

    /// Returns a clone of the current value, `None` when empty.
    pub fn get(&self) -> Option<T>
    where
        T: Clone,
    {
        self.0.value.read().unwrap().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.0.value.read().unwrap().is_none()
    }

    pub fn has_value(&self) -> bool {
        !self.is_empty()
    }

    /// Subscribes a strongly-held change listener.
    pub fn subscribe(&self, f: impl Fn(&ChangeEvent<T>) + Send + Sync + 'static) -> Subscription {
        self.0.listeners.subscribe(f)
    }

    /// Subscribes a listener that is dropped once the caller's last strong
    /// reference to it goes away.
    pub fn subscribe_weak<L: Listener<ChangeEvent<T>>>(&self, listener: &Arc<L>) {
        self.0.listeners.subscribe_weak(listener);
    }

    pub fn has_subscribers(&self) -> bool {
        self.0.listeners.has_subscribers()
    }

    /// Updates the value, firing a change event only if the new value differs
    /// from the current one. The value lock is released before listeners run,
    /// so re-entrant reads and writes from listeners are allowed.
    pub(crate) fn set(&self, new_value: Option<T>) -> bool
    where
        T: Clone + PartialEq,
    {
        let old_value = {
            let mut value = self.0.value.write().unwrap();
            if *value == new_value {
                return false;
            }
            std::mem::replace(&mut *value, new_value.clone())
        };
        self.0.listeners.fire_event(&ChangeEvent {
            old_value,
            new_value,
        });
        true
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ObservableValue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.value.try_read() {
            Ok(value) => std::fmt::Debug::fmt(&*value, f),
            Err(_) => write!(f, "<locked>"),
        }
    }
}

impl<T> Serialize for ObservableValue<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        match self.0.value.try_read() {
            Ok(value) => value.serialize(serializer),
            Err(_) => Err(serde::ser::Error::custom("locked")),
        }
    }
}

impl<'de, T> Deserialize<'de> for ObservableValue<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<ObservableValue<T>, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(ObservableValue::new)
    }
}
