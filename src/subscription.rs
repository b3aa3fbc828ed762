use std::{any::Any, mem::take, sync::Arc};

#[cfg(test)]
mod tests;

/// Handle that releases a listener registration when dropped.
///
/// Also usable as an opaque keep-alive guard via [`Subscription::from_arc`].
#[derive(Default)]
#[must_use]
pub struct Subscription(RawSubscription);

impl Subscription {
    /// A subscription that does nothing when dropped.
    pub fn empty() -> Self {
        Subscription(RawSubscription::Empty)
    }

    /// Runs `f` when the subscription is dropped.
    pub fn from_fn(f: impl FnOnce() + Send + Sync + 'static) -> Self {
        Subscription(RawSubscription::Fn(Box::new(f)))
    }

    /// Keeps `arc` alive for as long as the subscription exists.
    pub fn from_arc(arc: Arc<dyn Any + Send + Sync>) -> Self {
        Subscription(RawSubscription::Arc(arc))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        match take(&mut self.0) {
            RawSubscription::Empty => {}
            RawSubscription::Fn(f) => f(),
            RawSubscription::Arc(_) => {}
        }
    }
}

#[derive(Default)]
enum RawSubscription {
    #[default]
    Empty,
    Fn(Box<dyn FnOnce() + Send + Sync>),
    Arc(#[allow(unused)] Arc<dyn Any + Send + Sync>),
}
