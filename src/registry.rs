use std::sync::{Arc, RwLock, Weak};

use slabmap::SlabMap;

use crate::Subscription;

#[cfg(test)]
mod tests;

/// Receiver of events fired through a [`ListenerRegistry`].
pub trait Listener<E>: Send + Sync + 'static {
    fn handle(&self, event: &E);
}

/// Adapts a closure into a [`Listener`], so it can be held behind an `Arc`
/// and registered through [`ListenerRegistry::subscribe_weak`].
pub struct FnListener<F>(pub F);

impl<E, F> Listener<E> for FnListener<F>
where
    F: Fn(&E) + Send + Sync + 'static,
{
    fn handle(&self, event: &E) {
        (self.0)(event)
    }
}

/// Thread-safe pub/sub primitive holding strong and weak listeners.
///
/// This is the propagation substrate for every observable in the crate. The
/// registry itself is guarded by a read-write lock and may be used from
/// multiple threads; delivery happens synchronously on the firing thread.
pub struct ListenerRegistry<E> {
    listeners: Arc<RwLock<Listeners<E>>>,
}

struct Listeners<E> {
    strong: SlabMap<Arc<dyn Listener<E>>>,
    weak: Vec<Weak<dyn Listener<E>>>,
}

impl<E: 'static> ListenerRegistry<E> {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(RwLock::new(Listeners {
                strong: SlabMap::new(),
                weak: Vec::new(),
            })),
        }
    }

    /// Stores a strongly-held listener. The returned handle removes it when
    /// dropped. Safe to call concurrently with [`fire_event`](Self::fire_event).
    pub fn subscribe(&self, f: impl Fn(&E) + Send + Sync + 'static) -> Subscription {
        self.subscribe_listener(Arc::new(FnListener(f)))
    }

    pub fn subscribe_listener(&self, listener: Arc<dyn Listener<E>>) -> Subscription {
        let key = self.listeners.write().unwrap().strong.insert(listener);
        let listeners = Arc::downgrade(&self.listeners);
        Subscription::from_fn(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners.write().unwrap().strong.remove(key);
            }
        })
    }

    /// Stores a listener that lives only as long as the caller keeps a strong
    /// reference to it. No removal handle is returned; keep your own
    /// reference for as long as you need notifications.
    pub fn subscribe_weak<L: Listener<E>>(&self, listener: &Arc<L>) {
        let weak = Arc::downgrade(listener) as Weak<dyn Listener<E>>;
        let mut listeners = self.listeners.write().unwrap();
        listeners.weak.retain(|w| w.strong_count() > 0);
        listeners.weak.push(weak);
    }

    /// Fires `event` to every current listener.
    ///
    /// A consistent snapshot of the strong and live weak listeners is taken
    /// under the read lock, the lock is released, then each listener runs.
    /// Delivery order is unspecified. A panic in one listener aborts delivery
    /// to the listeners after it in iteration order.
    pub fn fire_event(&self, event: &E) {
        let mut dead = 0;
        let snapshot: Vec<Arc<dyn Listener<E>>> = {
            let listeners = self.listeners.read().unwrap();
            listeners
                .strong
                .values()
                .cloned()
                .chain(listeners.weak.iter().filter_map(|weak| {
                    let listener = weak.upgrade();
                    if listener.is_none() {
                        dead += 1;
                    }
                    listener
                }))
                .collect()
        };
        if dead > 0 {
            self.listeners
                .write()
                .unwrap()
                .weak
                .retain(|weak| weak.strong_count() > 0);
        }
        tracing::trace!(listeners = snapshot.len(), "fire_event");
        for listener in snapshot {
            listener.handle(event);
        }
    }

    /// True if at least one strong or still-alive weak listener remains.
    pub fn has_subscribers(&self) -> bool {
        let listeners = self.listeners.read().unwrap();
        !listeners.strong.is_empty() || listeners.weak.iter().any(|w| w.strong_count() > 0)
    }
}

impl<E: 'static> Default for ListenerRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}
