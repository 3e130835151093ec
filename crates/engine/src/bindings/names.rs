use crate::{bindings::BINDING_SIGIL, error::EngineError};

/// Checks that an author-supplied binding name is well formed.
///
/// A name must be non-empty, contain no whitespace and must not start with the sigil;
/// the sigil is added when the binding is stored.
pub fn validate_binding_name(name: &str) -> Result<(), EngineError> {
    let reason = if name.is_empty() {
        "name cannot be empty"
    } else if name.contains(char::is_whitespace) {
        "name cannot contain whitespace"
    } else if name.starts_with(BINDING_SIGIL) {
        "name cannot start with '$'"
    } else {
        return Ok(());
    };
    Err(EngineError::InvalidName {
        name: name.to_string(),
        reason,
    })
}
