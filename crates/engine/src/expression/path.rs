//! Built-in evaluator covering the JMESPath subset used by test steps.
//!
//! Supports:
//! - `$name`, `$name.field[0].other` (binding references with an optional path)
//! - `@`, `@.field`, `field.other[1]` (paths into the input document)
//! - `` `{"json": true}` `` (JSON literals) and `'raw'` (raw string literals)
//!
//! Does NOT support functions, filters, projections, pipes or arithmetic.

use serde_json::Value;

use super::{EvalError, Evaluator};
use crate::bindings::{BINDING_SIGIL, BindingTable};

/// Minimal evaluator resolving binding references and simple paths.
///
/// Missing fields and out-of-range indices evaluate to `null`, matching JMESPath.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathEvaluator;

impl Evaluator for PathEvaluator {
    fn search(&self, expression: &str, table: &BindingTable, input: &Value) -> Result<Value, EvalError> {
        let trimmed = expression.trim();
        if trimmed.is_empty() {
            return Err(EvalError::syntax(expression, "expression cannot be empty"));
        }

        if let Some(literal) = enclosed(trimmed, '`') {
            return serde_json::from_str(literal).map_err(|error| EvalError::syntax(trimmed, error.to_string()));
        }
        if let Some(raw) = enclosed(trimmed, '\'') {
            return Ok(Value::String(raw.replace("\\'", "'")));
        }

        if let Some(reference) = trimmed.strip_prefix(BINDING_SIGIL) {
            let name_length = reference
                .find(|character: char| !is_identifier_character(character))
                .unwrap_or(reference.len());
            if name_length == 0 {
                return Err(EvalError::syntax(trimmed, "missing variable name after '$'"));
            }
            let (name, path) = reference.split_at(name_length);
            let segments = parse_path(trimmed, path)?;
            let bound = table.get(&format!("{BINDING_SIGIL}{name}"))?.value()?;
            return Ok(apply(bound, &segments));
        }

        if let Some(path) = trimmed.strip_prefix('@') {
            let segments = parse_path(trimmed, path)?;
            return Ok(apply(input, &segments));
        }

        if trimmed.starts_with(|character: char| character.is_ascii_alphabetic() || character == '_') {
            let dotted = format!(".{trimmed}");
            let segments = parse_path(trimmed, &dotted)?;
            return Ok(apply(input, &segments));
        }

        Err(EvalError::syntax(trimmed, "unsupported expression"))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment<'a> {
    Field(&'a str),
    Index(usize),
}

fn enclosed(text: &str, delimiter: char) -> Option<&str> {
    if text.len() < 2 {
        return None;
    }
    text.strip_prefix(delimiter)?.strip_suffix(delimiter)
}

fn is_identifier_character(character: char) -> bool {
    character.is_ascii_alphanumeric() || character == '_'
}

/// Parses `.field` and `[index]` segments. `expression` is only used for error reporting.
fn parse_path<'a>(expression: &str, path: &'a str) -> Result<Vec<Segment<'a>>, EvalError> {
    let mut segments = Vec::new();
    let mut remaining = path;

    while !remaining.is_empty() {
        if let Some(after_dot) = remaining.strip_prefix('.') {
            let end = after_dot.find(['.', '[']).unwrap_or(after_dot.len());
            let field = &after_dot[..end];
            if field.is_empty() || !field.chars().all(is_identifier_character) {
                return Err(EvalError::syntax(expression, format!("invalid field name '{field}'")));
            }
            segments.push(Segment::Field(field));
            remaining = &after_dot[end..];
        } else if let Some(after_bracket) = remaining.strip_prefix('[') {
            let end = after_bracket
                .find(']')
                .ok_or_else(|| EvalError::syntax(expression, "unclosed '['"))?;
            let index = after_bracket[..end]
                .trim()
                .parse::<usize>()
                .map_err(|_| EvalError::syntax(expression, format!("invalid index '{}'", &after_bracket[..end])))?;
            segments.push(Segment::Index(index));
            remaining = &after_bracket[end + 1..];
        } else {
            return Err(EvalError::syntax(expression, format!("unexpected '{remaining}'")));
        }
    }

    Ok(segments)
}

fn apply(value: &Value, segments: &[Segment<'_>]) -> Value {
    let mut current = value;
    for segment in segments {
        let next = match segment {
            Segment::Field(name) => current.as_object().and_then(|object_map| object_map.get(*name)),
            Segment::Index(index) => current.as_array().and_then(|items| items.get(*index)),
        };
        match next {
            Some(next) => current = next,
            None => return Value::Null,
        }
    }
    current.clone()
}
