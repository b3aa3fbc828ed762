use thiserror::Error;

/// Failures surfaced by this crate.
///
/// All of them are synchronous, locally raised and returned to the immediate
/// caller; nothing is retried or recovered internally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Error {
    /// A read-only property was mutated.
    #[error("property is read-only")]
    ReadOnly,
    /// An action was performed while its performable flag was not set.
    #[error("action is not performable")]
    NotPerformable,
    /// A computed value was constructed with an empty dependency set.
    #[error("computed value requires at least one dependency")]
    EmptyDependencies,
    /// A composite action was constructed without children.
    #[error("composite action requires at least one child")]
    EmptyChildren,
}

pub type Result<T> = std::result::Result<T, Error>;
