use std::sync::Arc;

use derive_ex::derive_ex;

use crate::{ChangeEvent, Error, Listener, ObservableValue, Result, Subscription};


/// An [`ObservableValue`] derived from one or more dependency observables.
///
/// The cached value is recomputed synchronously on the same call stack as the
/// triggering mutation, once per dependency event, and re-notifies only when
/// the recomputed value differs from the cache (equality-based glitch
/// suppression at the node level).
///
/// Dependencies hold the node only weakly: dropping the last handle makes the
/// computed value inert. Use [`keep`](Self::keep) to tie the node's lifetime
/// to a [`Subscription`] guard instead.
#[derive_ex(Clone, bound())]
pub struct ComputedValue<T: 'static>(Arc<ComputeNode<T>>);

/// Homogeneous [`ComputedValue`] whose compute function is a reduction over
/// the stream of dependency values. See [`ComputedValue::combine`].
pub type CombinedValue<T> = ComputedValue<T>;

struct ComputeNode<T: 'static> {
    out: ObservableValue<T>,
    compute: Box<dyn Fn() -> Option<T> + Send + Sync>,
}

impl<T: Clone + PartialEq + Send + Sync + 'static> ComputeNode<T> {
    fn recompute(&self) {
        self.out.set((self.compute)());
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static, E> Listener<E> for ComputeNode<T> {
    fn handle(&self, _event: &E) {
        self.recompute();
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> ComputedValue<T> {
    pub fn builder() -> ComputedBuilder<T> {
        ComputedBuilder { hooks: Vec::new() }
    }

    /// Homogeneous combination: `reduce` folds the stream of current
    /// dependency values into the combined result.
    ///
    /// Fails with [`Error::EmptyDependencies`] when `deps` is empty.
    pub fn combine<F>(deps: Vec<ObservableValue<T>>, reduce: F) -> Result<Self>
    where
        F: Fn(&mut dyn Iterator<Item = Option<T>>) -> Option<T> + Send + Sync + 'static,
    {
        let mut builder = Self::builder();
        for dep in &deps {
            builder = builder.depends_on(dep);
        }
        builder.compute(move || reduce(&mut deps.iter().map(|dep| dep.get())))
    }

    /// Returns a clone of the cached value, `None` when empty.
    pub fn get(&self) -> Option<T> {
        self.0.out.get()
    }

    pub fn is_empty(&self) -> bool {
        self.0.out.is_empty()
    }

    pub fn has_value(&self) -> bool {
        self.0.out.has_value()
    }

    /// Handle to the output observable, for wiring into further computed
    /// values. The handle does not keep recomputation alive by itself.
    pub fn observable(&self) -> ObservableValue<T> {
        self.0.out.clone()
    }

    pub fn subscribe(&self, f: impl Fn(&ChangeEvent<T>) + Send + Sync + 'static) -> Subscription {
        self.0.out.subscribe(f)
    }

    pub fn subscribe_weak<L: Listener<ChangeEvent<T>>>(&self, listener: &Arc<L>) {
        self.0.out.subscribe_weak(listener);
    }

    pub fn has_subscribers(&self) -> bool {
        self.0.out.has_subscribers()
    }

    /// Converts the handle into a guard that keeps recomputation alive until
    /// the guard is dropped.
    pub fn keep(self) -> Subscription {
        Subscription::from_arc(self.0)
    }
}

/// Builder collecting the dependency set before the compute function is
/// supplied. Dependencies are fixed at construction.
pub struct ComputedBuilder<T: 'static> {
    #[allow(clippy::type_complexity)]
    hooks: Vec<Box<dyn FnOnce(&Arc<ComputeNode<T>>)>>,
}

impl<T: Clone + PartialEq + Send + Sync + 'static> ComputedBuilder<T> {
    /// Registers a dependency. Dependencies of different element types may be
    /// mixed freely; the compute function reads them through its own handles.
    pub fn depends_on<D: 'static>(mut self, dep: &ObservableValue<D>) -> Self {
        let dep = dep.clone();
        self.hooks.push(Box::new(move |node| {
            dep.subscribe_weak(node);
        }));
        self
    }

    /// Finishes construction: subscribes the node weakly to every dependency
    /// and computes once to seed the cache, so `get()` is valid before any
    /// dependency changes.
    ///
    /// Fails with [`Error::EmptyDependencies`] when no dependency was
    /// registered.
    pub fn compute(
        self,
        f: impl Fn() -> Option<T> + Send + Sync + 'static,
    ) -> Result<ComputedValue<T>> {
        if self.hooks.is_empty() {
            return Err(Error::EmptyDependencies);
        }
        let node = Arc::new(ComputeNode {
            out: ObservableValue::new(None),
            compute: Box::new(f),
        });
        for hook in self.hooks {
            hook(&node);
        }
        node.recompute();
        Ok(ComputedValue(node))
    }
}

/// AND over boolean dependencies. An empty dependency value counts as `false`.
pub fn all_true(deps: Vec<ObservableValue<bool>>) -> Result<CombinedValue<bool>> {
    CombinedValue::combine(deps, |values| {
        Some(values.fold(true, |acc, v| acc && v == Some(true)))
    })
}

/// OR over boolean dependencies. An empty dependency value counts as `false`.
pub fn any_true(deps: Vec<ObservableValue<bool>>) -> Result<CombinedValue<bool>> {
    CombinedValue::combine(deps, |values| {
        Some(values.fold(false, |acc, v| acc || v == Some(true)))
    })
}

/// Joins string dependencies with `separator`, skipping empty values.
pub fn join(deps: Vec<ObservableValue<String>>, separator: &str) -> Result<CombinedValue<String>> {
    let separator = separator.to_owned();
    CombinedValue::combine(deps, move |values| {
        Some(values.flatten().collect::<Vec<_>>().join(&separator))
    })
}

impl<T: std::fmt::Debug> std::fmt::Debug for ComputedValue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self.0.out, f)
    }
}
