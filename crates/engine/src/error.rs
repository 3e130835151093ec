use thiserror::Error;

use crate::{bindings::BindingError, expression::EvalError, kubectl::DiscoveryError};

/// Errors surfaced by binding resolution and command construction.
///
/// Collaborator failures (evaluator, discovery) are wrapped transparently so callers see
/// the original message and can still match on the originating kind.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A resolved binding name is empty, contains whitespace, or still carries the sigil.
    #[error("invalid binding name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// An indirection expression produced something other than a string.
    #[error("expression '{expression}' must evaluate to a string, got {actual}")]
    TypeMismatch { expression: String, actual: &'static str },

    /// Mutually exclusive collector fields were both supplied.
    #[error("name cannot be provided when a selector is specified")]
    Conflict,

    /// A required input object was absent.
    #[error("{0} is null")]
    NullInput(&'static str),

    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error(transparent)]
    Evaluation(#[from] EvalError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}
