//! Persistent binding table.
//!
//! The table is an immutable singly linked list of `Arc` nodes. Registering a binding
//! allocates one node whose tail is the previous table, so every snapshot ever handed out
//! stays valid and cloning a table is a pointer copy. Lookups walk from the newest entry,
//! which makes later registrations shadow earlier ones with the same key.

use std::{
    collections::HashSet,
    fmt, iter,
    sync::{Arc, OnceLock},
};

use serde_json::Value;
use thiserror::Error;

use crate::expression::EvalError;

/// Prefix marking a string as a binding reference. Keys stored in a [`BindingTable`]
/// always start with it; author-supplied names never do.
pub const BINDING_SIGIL: char = '$';

/// Errors raised by table lookups and registrations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BindingError {
    #[error("binding key '{key}' must start with '$'")]
    MissingSigil { key: String },
    #[error("variable not defined: {key}")]
    Undefined { key: String },
}

type DeferredValue = Box<dyn Fn() -> Result<Value, EvalError> + Send + Sync>;

enum ValueSource {
    Literal(Value),
    Deferred {
        compute: DeferredValue,
        cell: OnceLock<Result<Value, EvalError>>,
    },
}

/// A lazily evaluable binding value.
///
/// Deferred values are computed on first access and the outcome (value or error) is
/// memoized. Clones share the memoized outcome, so a deferred computation runs at most
/// once no matter how many table snapshots reference it.
#[derive(Clone)]
pub struct BindingValue(Arc<ValueSource>);

impl BindingValue {
    pub fn literal(value: impl Into<Value>) -> Self {
        Self(Arc::new(ValueSource::Literal(value.into())))
    }

    pub fn deferred<F>(compute: F) -> Self
    where
        F: Fn() -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        Self(Arc::new(ValueSource::Deferred {
            compute: Box::new(compute),
            cell: OnceLock::new(),
        }))
    }

    /// Returns the value, computing it first if it is deferred and not yet evaluated.
    pub fn value(&self) -> Result<&Value, EvalError> {
        match self.0.as_ref() {
            ValueSource::Literal(value) => Ok(value),
            ValueSource::Deferred { compute, cell } => cell.get_or_init(|| compute()).as_ref().map_err(Clone::clone),
        }
    }

    /// `true` for literals and for deferred values that have already been computed.
    pub fn is_evaluated(&self) -> bool {
        match self.0.as_ref() {
            ValueSource::Literal(_) => true,
            ValueSource::Deferred { cell, .. } => cell.get().is_some(),
        }
    }
}

impl From<Value> for BindingValue {
    fn from(value: Value) -> Self {
        Self::literal(value)
    }
}

impl fmt::Debug for BindingValue {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_ref() {
            ValueSource::Literal(value) => formatter.debug_tuple("Literal").field(value).finish(),
            ValueSource::Deferred { cell, .. } => match cell.get() {
                Some(outcome) => formatter.debug_tuple("Deferred").field(outcome).finish(),
                None => formatter.write_str("Deferred(<pending>)"),
            },
        }
    }
}

struct Node {
    key: String,
    value: BindingValue,
    next: Option<Arc<Node>>,
}

impl Drop for Node {
    // Unlink iteratively so dropping a long, unshared chain cannot overflow the stack.
    fn drop(&mut self) {
        let mut next = self.next.take();
        while let Some(node) = next {
            match Arc::try_unwrap(node) {
                Ok(mut node) => next = node.next.take(),
                Err(_) => break,
            }
        }
    }
}

/// Immutable, append-only mapping from sigiled binding names to values.
///
/// ```rust
/// use kstep_engine::{BindingTable, BindingValue};
/// use serde_json::json;
///
/// let base = BindingTable::new().register("$app", json!("web"))?;
/// let next = base.register("$app", json!("api"))?;
///
/// assert_eq!(next.get("$app")?.value()?, &json!("api"));
/// // older snapshots are unaffected
/// assert_eq!(base.get("$app")?.value()?, &json!("web"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Default)]
pub struct BindingTable {
    head: Option<Arc<Node>>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new table with `key` bound to `value`. `key` must carry the sigil.
    pub fn register(&self, key: impl Into<String>, value: impl Into<BindingValue>) -> Result<Self, BindingError> {
        let key = key.into();
        check_sigil(&key)?;
        Ok(self.push(key, value.into()))
    }

    /// Returns a new table with `$name` bound to `value`.
    pub fn bind(&self, name: &str, value: impl Into<BindingValue>) -> Self {
        self.push(format!("{BINDING_SIGIL}{name}"), value.into())
    }

    /// Looks up the newest entry for `key`. `key` must carry the sigil.
    pub fn get(&self, key: &str) -> Result<&BindingValue, BindingError> {
        check_sigil(key)?;
        self.nodes()
            .find(|node| node.key == key)
            .map(|node| &node.value)
            .ok_or_else(|| BindingError::Undefined { key: key.to_string() })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_ok()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Visible (non-shadowed) entries in registration order.
    pub fn entries(&self) -> Vec<(&str, &BindingValue)> {
        let mut seen = HashSet::new();
        let mut entries: Vec<(&str, &BindingValue)> = self
            .nodes()
            .filter(|node| seen.insert(node.key.as_str()))
            .map(|node| (node.key.as_str(), &node.value))
            .collect();
        entries.reverse();
        entries
    }

    fn push(&self, key: String, value: BindingValue) -> Self {
        Self {
            head: Some(Arc::new(Node {
                key,
                value,
                next: self.head.clone(),
            })),
        }
    }

    fn nodes(&self) -> impl Iterator<Item = &Node> {
        iter::successors(self.head.as_deref(), |node| node.next.as_deref())
    }
}

impl fmt::Debug for BindingTable {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.entries()).finish()
    }
}

fn check_sigil(key: &str) -> Result<(), BindingError> {
    if key.starts_with(BINDING_SIGIL) {
        Ok(())
    } else {
        Err(BindingError::MissingSigil { key: key.to_string() })
    }
}
