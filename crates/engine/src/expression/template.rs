//! `(<expression>)` templates.
//!
//! A string that starts with `(`, ends with `)` and has a non-empty body is an
//! expression; any other string is a literal. Templates are evaluated recursively through arrays and
//! object values. Object keys are always literal.

use serde_json::Value;

use super::{EvalError, Evaluator};
use crate::bindings::BindingTable;

/// Returns the inner expression when `text` is wrapped as `(<expression>)`.
///
/// ```rust
/// use kstep_engine::expression::template::expression_of;
///
/// assert_eq!(expression_of("($foo)"), Some("$foo"));
/// assert_eq!(expression_of("( $foo.bar )"), Some("$foo.bar"));
/// assert_eq!(expression_of("foo"), None);
/// assert_eq!(expression_of("(foo"), None);
/// assert_eq!(expression_of("()"), None);
/// assert_eq!(expression_of("  ($foo)  "), None);
/// ```
pub fn expression_of(text: &str) -> Option<&str> {
    let inner = text.strip_prefix('(')?.strip_suffix(')')?;
    if inner.is_empty() {
        return None;
    }
    Some(inner.trim())
}

/// Evaluates every `(<expression>)` string inside `value`.
///
/// Each expression is evaluated exactly once; its result is used as-is and is not scanned
/// for further expressions.
pub fn evaluate(evaluator: &dyn Evaluator, value: &Value, table: &BindingTable, input: &Value) -> Result<Value, EvalError> {
    match value {
        Value::String(text) => match expression_of(text) {
            Some(expression) => evaluator.search(expression, table, input),
            None => Ok(value.clone()),
        },
        Value::Array(items) => items
            .iter()
            .map(|item| evaluate(evaluator, item, table, input))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(object_map) => {
            let mut evaluated_map = serde_json::Map::new();
            for (key, item) in object_map {
                evaluated_map.insert(key.clone(), evaluate(evaluator, item, table, input)?);
            }
            Ok(Value::Object(evaluated_map))
        }
        _ => Ok(value.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::PathEvaluator;
    use serde_json::json;

    #[test]
    fn literals_pass_through_untouched() {
        let table = BindingTable::new();
        let value = json!({"name": "web", "replicas": 2, "ports": [80, "443"], "enabled": true, "note": null});

        let result = evaluate(&PathEvaluator, &value, &table, &Value::Null).unwrap();
        assert_eq!(result, value);
    }

    #[test]
    fn nested_expressions_are_evaluated() {
        let table = BindingTable::new().bind("app", json!("web")).bind("port", json!(8080));
        let value = json!({
            "name": "($app)",
            "ports": ["($port)", 443],
            "labels": {"app": "($app)", "tier": "frontend"},
            "(key)": "literal key"
        });

        let result = evaluate(&PathEvaluator, &value, &table, &Value::Null).unwrap();
        assert_eq!(
            result,
            json!({
                "name": "web",
                "ports": [8080, 443],
                "labels": {"app": "web", "tier": "frontend"},
                "(key)": "literal key"
            })
        );
    }

    #[test]
    fn expressions_are_evaluated_only_once() {
        let table = BindingTable::new().bind("wrapped", json!("($other)"));

        let result = evaluate(&PathEvaluator, &json!("($wrapped)"), &table, &Value::Null).unwrap();
        assert_eq!(result, json!("($other)"));
    }

    #[test]
    fn empty_and_padded_wrappers_are_literals() {
        let table = BindingTable::new().bind("foo", json!("abc"));
        for text in ["()", "  ($foo)  ", " ($foo)"] {
            let result = evaluate(&PathEvaluator, &json!(text), &table, &Value::Null).unwrap();
            assert_eq!(result, json!(text));
        }
    }

    #[test]
    fn first_failure_aborts_evaluation() {
        let table = BindingTable::new();
        let error = evaluate(&PathEvaluator, &json!(["ok", "($missing)"]), &table, &Value::Null).unwrap_err();
        assert!(error.to_string().contains("$missing"));
    }
}
