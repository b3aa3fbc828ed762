use std::sync::Arc;

use derive_ex::derive_ex;

use crate::{
    all_true, ChangeEvent, CombinedValue, Error, Listener, ListenerRegistry, ObservableValue,
    Result, Subscription,
};


/// Event fired after an action's operation ran, carrying the action and its
/// output.
pub struct PerformedEvent<O: 'static> {
    pub action: Action<O>,
    pub output: O,
}

/// Event fired when an action's performable flag changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StateChangedEvent {
    pub performable: bool,
}

/// A command gated by an observable performable predicate.
///
/// Performing while not performable is a programming error and fails with
/// [`Error::NotPerformable`] before any side effect.
#[derive_ex(Clone, bound())]
pub struct Action<O: 'static>(Arc<ActionNode<O>>);

struct ActionNode<O: 'static> {
    performable: ObservableValue<bool>,
    operation: Box<dyn Fn() -> O + Send + Sync>,
    performed: ListenerRegistry<PerformedEvent<O>>,
    state_changed: ListenerRegistry<StateChangedEvent>,
}

impl<O: 'static> Listener<ChangeEvent<bool>> for ActionNode<O> {
    fn handle(&self, event: &ChangeEvent<bool>) {
        self.state_changed.fire_event(&StateChangedEvent {
            performable: event.new_value == Some(true),
        });
    }
}

impl<O: 'static> Action<O> {
    /// An action that is always performable.
    pub fn new(operation: impl Fn() -> O + Send + Sync + 'static) -> Self {
        Self::with_performable(ObservableValue::constant(true), operation)
    }

    /// An action gated by `performable`. An empty flag counts as not
    /// performable.
    pub fn with_performable(
        performable: ObservableValue<bool>,
        operation: impl Fn() -> O + Send + Sync + 'static,
    ) -> Self {
        let node = Arc::new(ActionNode {
            performable,
            operation: Box::new(operation),
            performed: ListenerRegistry::new(),
            state_changed: ListenerRegistry::new(),
        });
        node.performable.subscribe_weak(&node);
        Action(node)
    }

    pub fn is_performable(&self) -> bool {
        self.0.performable.get() == Some(true)
    }

    /// Handle to the performable flag observable.
    pub fn performable(&self) -> ObservableValue<bool> {
        self.0.performable.clone()
    }

    /// Executes the wrapped operation, fires a performed event and returns
    /// the output.
    pub fn perform(&self) -> Result<O> {
        if !self.is_performable() {
            return Err(Error::NotPerformable);
        }
        tracing::trace!("perform");
        let output = (self.0.operation)();
        let event = PerformedEvent {
            action: self.clone(),
            output,
        };
        self.0.performed.fire_event(&event);
        Ok(event.output)
    }

    pub fn on_performed(
        &self,
        f: impl Fn(&PerformedEvent<O>) + Send + Sync + 'static,
    ) -> Subscription {
        self.0.performed.subscribe(f)
    }

    pub fn on_state_changed(
        &self,
        f: impl Fn(&StateChangedEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.0.state_changed.subscribe(f)
    }
}

/// Object-safe action surface, so actions with different output types can be
/// composed and stored together.
pub trait DynAction: Send + Sync + 'static {
    fn is_performable(&self) -> bool;
    fn performable(&self) -> ObservableValue<bool>;
    /// Performs the action, discarding its output.
    fn perform_dyn(&self) -> Result<()>;
}

impl<O: 'static> DynAction for Action<O> {
    fn is_performable(&self) -> bool {
        Action::is_performable(self)
    }

    fn performable(&self) -> ObservableValue<bool> {
        Action::performable(self)
    }

    fn perform_dyn(&self) -> Result<()> {
        self.perform().map(|_| ())
    }
}

/// Event fired after every child of a composite action ran.
#[derive(Clone)]
pub struct CompositePerformedEvent {
    pub action: CompositeAction,
}

/// An action whose performable flag is the AND of its children's flags and
/// whose execution runs each child strictly in list order.
///
/// A child failure aborts the sequence: later children do not run and no
/// rollback of earlier children is attempted.
#[derive(Clone)]
pub struct CompositeAction(Arc<CompositeNode>);

struct CompositeNode {
    children: Vec<Arc<dyn DynAction>>,
    performable: CombinedValue<bool>,
    performed: ListenerRegistry<CompositePerformedEvent>,
    state_changed: ListenerRegistry<StateChangedEvent>,
}

impl Listener<ChangeEvent<bool>> for CompositeNode {
    fn handle(&self, event: &ChangeEvent<bool>) {
        self.state_changed.fire_event(&StateChangedEvent {
            performable: event.new_value == Some(true),
        });
    }
}

impl CompositeAction {
    /// Fails with [`Error::EmptyChildren`] when `children` is empty.
    pub fn new(children: Vec<Arc<dyn DynAction>>) -> Result<Self> {
        if children.is_empty() {
            return Err(Error::EmptyChildren);
        }
        let flags = children.iter().map(|child| child.performable()).collect();
        let performable = all_true(flags)?;
        let node = Arc::new(CompositeNode {
            children,
            performable,
            performed: ListenerRegistry::new(),
            state_changed: ListenerRegistry::new(),
        });
        node.performable.observable().subscribe_weak(&node);
        Ok(CompositeAction(node))
    }

    pub fn is_performable(&self) -> bool {
        self.0.performable.get() == Some(true)
    }

    /// Handle to the derived performable flag observable.
    pub fn performable(&self) -> ObservableValue<bool> {
        self.0.performable.observable()
    }

    /// Runs every child in list order, then fires a performed event.
    /// Fail-fast: the first child error is returned, later children do not
    /// run, and no performed event fires.
    pub fn perform(&self) -> Result<()> {
        if !self.is_performable() {
            return Err(Error::NotPerformable);
        }
        tracing::trace!(children = self.0.children.len(), "perform composite");
        for child in &self.0.children {
            child.perform_dyn()?;
        }
        let event = CompositePerformedEvent {
            action: self.clone(),
        };
        self.0.performed.fire_event(&event);
        Ok(())
    }

    pub fn on_performed(
        &self,
        f: impl Fn(&CompositePerformedEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.0.performed.subscribe(f)
    }

    pub fn on_state_changed(
        &self,
        f: impl Fn(&StateChangedEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.0.state_changed.subscribe(f)
    }
}

impl DynAction for CompositeAction {
    fn is_performable(&self) -> bool {
        CompositeAction::is_performable(self)
    }

    fn performable(&self) -> ObservableValue<bool> {
        CompositeAction::performable(self)
    }

    fn perform_dyn(&self) -> Result<()> {
        self.perform()
    }
}
