//! Observable values, computed values and gated actions, designed as a
//! foundation for UI data binding layers.

mod action;
mod binding_group;
mod computed;
mod error;
mod observable;
mod property;
mod registry;
mod subscription;

pub use action::*;
pub use binding_group::*;
pub use computed::*;
pub use error::*;
pub use observable::*;
pub use property::*;
pub use registry::*;
pub use subscription::*;
