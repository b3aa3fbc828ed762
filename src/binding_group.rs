use std::sync::{Arc, RwLock};

use parse_display::{Display, FromStr};
use slabmap::SlabMap;

use crate::{ChangeEvent, ObservableValue, Property, Subscription};


/// Optional-capability surface a binding exposes to a [`BindingGroup`].
///
/// Implement only the capabilities that apply; the defaults declare none.
/// The group subscribes to whichever flag observables a member returns and
/// forwards [`reset_dirty_flag`](Self::reset_dirty_flag) and
/// [`discard`](Self::discard) to it.
pub trait Binding: Send + Sync + 'static {
    fn dirty(&self) -> Option<ObservableValue<bool>> {
        None
    }

    fn presentation_valid(&self) -> Option<ObservableValue<bool>> {
        None
    }

    fn model_valid(&self) -> Option<ObservableValue<bool>> {
        None
    }

    fn reset_dirty_flag(&self) {}

    fn discard(&self) {}
}

impl<T: Clone + PartialEq + Send + Sync + 'static> Binding for Property<T> {
    fn dirty(&self) -> Option<ObservableValue<bool>> {
        Some(Property::dirty(self))
    }

    fn reset_dirty_flag(&self) {
        Property::reset_dirty_flag(self);
    }

    fn discard(&self) {
        Property::discard(self);
    }
}

/// Outcome of a member's value conversion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConversionResult {
    Converted,
    Failed(String),
}

/// Severity of a single validation message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display, FromStr)]
#[display(style = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A single message produced by external validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationResult {
    pub severity: Severity,
    pub message: String,
}

impl ValidationResult {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

/// Key identifying a member within its group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BindingKey(usize);

/// Structured result the group forwards to its handler. The group itself does
/// not interpret it; displaying errors is the external layer's concern.
#[derive(Clone)]
pub struct BindingResult {
    pub key: BindingKey,
    pub binding: Arc<dyn Binding>,
    pub conversion: ConversionResult,
    pub validations: Vec<ValidationResult>,
}

type ResultHandler = Arc<dyn Fn(&BindingResult) + Send + Sync>;

/// Aggregates many per-field dirty/valid signals into three group-level
/// observables: dirty is OR over the members, the validity flags are AND.
///
/// Any member flag change triggers a full recompute over all current members;
/// the aggregate observables deduplicate, so only real flips notify.
#[derive(Clone)]
pub struct BindingGroup(Arc<GroupNode>);

struct GroupNode {
    members: RwLock<SlabMap<Member>>,
    dirty: ObservableValue<bool>,
    presentation_valid: ObservableValue<bool>,
    model_valid: ObservableValue<bool>,
    handler: RwLock<Option<ResultHandler>>,
}

struct Member {
    binding: Arc<dyn Binding>,
    dirty: Option<ObservableValue<bool>>,
    presentation_valid: Option<ObservableValue<bool>>,
    model_valid: Option<ObservableValue<bool>>,
    // Dropped on removal, releasing the flag listeners.
    #[allow(unused)]
    subscriptions: Vec<Subscription>,
}

impl BindingGroup {
    pub fn new() -> Self {
        Self(Arc::new(GroupNode {
            members: RwLock::new(SlabMap::new()),
            dirty: ObservableValue::new(Some(false)),
            presentation_valid: ObservableValue::new(Some(true)),
            model_valid: ObservableValue::new(Some(true)),
            handler: RwLock::new(None),
        }))
    }

    /// Adds a member, subscribing to each capability flag it exposes, and
    /// immediately folds its current flags into the aggregates.
    pub fn add_binding(&self, binding: impl Binding) -> BindingKey {
        self.add_dyn_binding(Arc::new(binding))
    }

    pub fn add_dyn_binding(&self, binding: Arc<dyn Binding>) -> BindingKey {
        let dirty = binding.dirty();
        let presentation_valid = binding.presentation_valid();
        let model_valid = binding.model_valid();
        let mut subscriptions = Vec::new();
        for flag in [&dirty, &presentation_valid, &model_valid]
            .into_iter()
            .flatten()
        {
            let node = Arc::downgrade(&self.0);
            subscriptions.push(flag.subscribe(move |_: &ChangeEvent<bool>| {
                if let Some(node) = node.upgrade() {
                    node.recompute_aggregates();
                }
            }));
        }
        let member = Member {
            binding,
            dirty,
            presentation_valid,
            model_valid,
            subscriptions,
        };
        let key = self.0.members.write().unwrap().insert(member);
        self.0.recompute_aggregates();
        BindingKey(key)
    }

    /// Removes one member, releasing its flag subscriptions.
    pub fn remove_binding(&self, key: BindingKey) {
        let removed = self.0.members.write().unwrap().remove(key.0);
        drop(removed);
        self.0.recompute_aggregates();
    }

    /// Removes every member and resets the aggregates to their empty-group
    /// state (clean and valid).
    pub fn dispose(&self) {
        let removed = {
            let mut members = self.0.members.write().unwrap();
            std::mem::replace(&mut *members, SlabMap::new())
        };
        drop(removed);
        self.0.recompute_aggregates();
    }

    pub fn is_dirty(&self) -> bool {
        self.0.dirty.get() == Some(true)
    }

    pub fn is_presentation_valid(&self) -> bool {
        self.0.presentation_valid.get() == Some(true)
    }

    pub fn is_model_valid(&self) -> bool {
        self.0.model_valid.get() == Some(true)
    }

    /// Handle to the aggregate dirty observable.
    pub fn dirty(&self) -> ObservableValue<bool> {
        self.0.dirty.clone()
    }

    pub fn presentation_valid(&self) -> ObservableValue<bool> {
        self.0.presentation_valid.clone()
    }

    pub fn model_valid(&self) -> ObservableValue<bool> {
        self.0.model_valid.clone()
    }

    pub fn len(&self) -> usize {
        self.0.members.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forwards to every member.
    pub fn reset_dirty_flag(&self) {
        for binding in self.member_bindings() {
            binding.reset_dirty_flag();
        }
    }

    /// Forwards to every member.
    pub fn discard(&self) {
        for binding in self.member_bindings() {
            binding.discard();
        }
    }

    /// Installs the external result handler.
    pub fn set_result_handler(&self, handler: impl Fn(&BindingResult) + Send + Sync + 'static) {
        *self.0.handler.write().unwrap() = Some(Arc::new(handler));
    }

    pub fn clear_result_handler(&self) {
        *self.0.handler.write().unwrap() = None;
    }

    /// Forwards a member's conversion/validation outcome to the handler, if
    /// one is installed. Unknown keys are ignored.
    pub fn dispatch_result(
        &self,
        key: BindingKey,
        conversion: ConversionResult,
        validations: Vec<ValidationResult>,
    ) {
        let binding = {
            let members = self.0.members.read().unwrap();
            match members.get(key.0) {
                Some(member) => member.binding.clone(),
                None => return,
            }
        };
        let handler = self.0.handler.read().unwrap().clone();
        if let Some(handler) = handler {
            handler(&BindingResult {
                key,
                binding,
                conversion,
                validations,
            });
        }
    }

    fn member_bindings(&self) -> Vec<Arc<dyn Binding>> {
        self.0
            .members
            .read()
            .unwrap()
            .values()
            .map(|member| member.binding.clone())
            .collect()
    }
}

impl Default for BindingGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupNode {
    fn recompute_aggregates(&self) {
        let (dirty, presentation_valid, model_valid) = {
            let members = self.members.read().unwrap();
            let mut dirty = false;
            let mut presentation_valid = true;
            let mut model_valid = true;
            for member in members.values() {
                if let Some(flag) = &member.dirty {
                    dirty |= flag.get() == Some(true);
                }
                if let Some(flag) = &member.presentation_valid {
                    presentation_valid &= flag.get() != Some(false);
                }
                if let Some(flag) = &member.model_valid {
                    model_valid &= flag.get() != Some(false);
                }
            }
            (dirty, presentation_valid, model_valid)
        };
        tracing::trace!(dirty, presentation_valid, model_valid, "recompute aggregates");
        self.dirty.set(Some(dirty));
        self.presentation_valid.set(Some(presentation_valid));
        self.model_valid.set(Some(model_valid));
    }
}
