//! Expression evaluation seam.
//!
//! Modules:
//! - `template`: detects `(<expression>)` strings and evaluates them inside arbitrary values
//! - `path`: [`PathEvaluator`], a small built-in evaluator for binding references and paths
//!
//! The engine only ever talks to the [`Evaluator`] trait, so a full JMESPath engine can be
//! plugged in without touching the binding or command code.

mod path;
pub mod template;

pub use path::PathEvaluator;

use serde_json::Value;
use thiserror::Error;

use crate::bindings::{BindingError, BindingTable};

/// Trait defining the interface for expression evaluation.
pub trait Evaluator: Send + Sync {
    /// Evaluates a raw expression (without the surrounding parentheses) against the binding
    /// table and the input document.
    fn search(&self, expression: &str, table: &BindingTable, input: &Value) -> Result<Value, EvalError>;
}

/// Errors surfaced by expression evaluation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EvalError {
    /// A binding reference could not be resolved.
    #[error(transparent)]
    Binding(#[from] BindingError),

    /// The expression is not valid for the evaluator.
    #[error("invalid expression '{expression}': {reason}")]
    Syntax { expression: String, reason: String },

    /// A deferred binding value failed to compute.
    #[error("deferred binding failed: {0}")]
    Deferred(String),
}

impl EvalError {
    pub(crate) fn syntax(expression: &str, reason: impl Into<String>) -> Self {
        Self::Syntax {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }
}
