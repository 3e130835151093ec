//! Binding resolution and registration.

use serde_json::Value;
use tracing::debug;

use kstep_types::Binding;

use super::{BindingTable, validate_binding_name};
use crate::{
    error::EngineError,
    expression::{Evaluator, template},
};

/// Resolves one level of `(<expression>)` indirection.
///
/// Wrapped text is evaluated once and must produce a string; anything else is returned
/// unchanged as a literal.
pub fn resolve_indirection(evaluator: &dyn Evaluator, text: &str, table: &BindingTable, input: &Value) -> Result<String, EngineError> {
    let Some(expression) = template::expression_of(text) else {
        return Ok(text.to_string());
    };
    match evaluator.search(expression, table, input)? {
        Value::String(resolved) => {
            debug!(expression = %expression, resolved = %resolved, "resolved indirection");
            Ok(resolved)
        }
        other => Err(EngineError::TypeMismatch {
            expression: expression.to_string(),
            actual: json_type_name(&other),
        }),
    }
}

/// Resolves a collector field: indirection evaluated against an empty input.
pub fn resolve_string(evaluator: &dyn Evaluator, text: &str, table: &BindingTable) -> Result<String, EngineError> {
    resolve_indirection(evaluator, text, table, &Value::Null)
}

/// Resolves a declared binding into its final name and value.
///
/// 1. The name goes through [`resolve_indirection`].
/// 2. The resolved name is validated, so a computed name that is invalid fails here.
/// 3. The value is evaluated as a template: every `(<expression>)` inside it is evaluated
///    against `table` and `input`, evaluator errors propagate unchanged.
///
/// The caller registers the result (see [`register_binding`]).
pub fn resolve_binding(
    evaluator: &dyn Evaluator,
    table: &BindingTable,
    input: &Value,
    declaration: &Binding,
) -> Result<(String, Value), EngineError> {
    let name = resolve_indirection(evaluator, &declaration.name, table, input)?;
    validate_binding_name(&name)?;
    let value = template::evaluate(evaluator, &declaration.value, table, input)?;
    debug!(declared = %declaration.name, name = %name, "resolved binding");
    Ok((name, value))
}

/// Stores `value` under `$name` and returns the new table; `table` itself is untouched.
pub fn register_binding(table: &BindingTable, name: &str, value: Value) -> BindingTable {
    debug!(name = %name, "registering binding");
    table.bind(name, value)
}

/// Resolves and registers declarations in order; each declaration sees the bindings
/// registered before it. Nothing is returned unless every declaration succeeds.
pub fn register_bindings<'a>(
    evaluator: &dyn Evaluator,
    table: &BindingTable,
    input: &Value,
    declarations: impl IntoIterator<Item = &'a Binding>,
) -> Result<BindingTable, EngineError> {
    let mut current = table.clone();
    for declaration in declarations {
        let (name, value) = resolve_binding(evaluator, &current, input, declaration)?;
        current = register_binding(&current, &name, value);
    }
    Ok(current)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bindings::BindingError, expression::EvalError, expression::PathEvaluator};
    use serde_json::json;

    fn resolve(table: &BindingTable, name: &str, value: Value) -> Result<(String, Value), EngineError> {
        resolve_binding(&PathEvaluator, table, &Value::Null, &Binding::new(name, value))
    }

    #[test]
    fn resolves_literal_name_and_value() {
        let (name, value) = resolve(&BindingTable::new(), "foo", json!("bar")).unwrap();
        assert_eq!(name, "foo");
        assert_eq!(value, json!("bar"));
    }

    #[test]
    fn rejects_sigiled_names() {
        let error = resolve(&BindingTable::new(), "$foo", json!("bar")).unwrap_err();
        assert!(matches!(error, EngineError::InvalidName { ref name, .. } if name == "$foo"));
    }

    #[test]
    fn unbound_value_reference_fails_with_evaluator_error() {
        let error = resolve(&BindingTable::new(), "foo", json!("($bar)")).unwrap_err();
        assert!(matches!(
            error,
            EngineError::Evaluation(EvalError::Binding(BindingError::Undefined { ref key })) if key == "$bar"
        ));
    }

    #[test]
    fn unbound_name_reference_fails() {
        let error = resolve(&BindingTable::new(), "($foo)", json!("bar")).unwrap_err();
        assert!(matches!(error, EngineError::Evaluation(_)));
    }

    #[test]
    fn resolves_name_and_value_through_indirection() {
        let table = BindingTable::new().bind("foo", json!("abc")).bind("bar", json!("def"));
        let (name, value) = resolve(&table, "($foo)", json!("($bar)")).unwrap();
        assert_eq!(name, "abc");
        assert_eq!(value, json!("def"));
    }

    #[test]
    fn computed_invalid_names_fail_validation() {
        let table = BindingTable::new()
            .bind("spaced", json!("two words"))
            .bind("sigiled", json!("$already"))
            .bind("blank", json!(""));

        for name in ["($spaced)", "($sigiled)", "($blank)"] {
            let error = resolve(&table, name, json!(1)).unwrap_err();
            assert!(matches!(error, EngineError::InvalidName { .. }), "expected invalid name for {name}");
        }
    }

    #[test]
    fn non_string_indirection_is_a_type_mismatch() {
        let table = BindingTable::new().bind("count", json!(3));
        let error = resolve(&table, "($count)", json!("value")).unwrap_err();
        assert!(matches!(error, EngineError::TypeMismatch { actual: "number", .. }));
        assert_eq!(error.to_string(), "expression '$count' must evaluate to a string, got number");
    }

    #[test]
    fn values_keep_their_json_shape() {
        let table = BindingTable::new().bind("replicas", json!(3));
        let (_, value) = resolve(&table, "spec", json!({"replicas": "($replicas)", "paused": false})).unwrap();
        assert_eq!(value, json!({"replicas": 3, "paused": false}));
    }

    #[test]
    fn values_can_read_the_input() {
        let input = json!({"metadata": {"name": "web"}});
        let (_, value) = resolve_binding(
            &PathEvaluator,
            &BindingTable::new(),
            &input,
            &Binding::new("name", "(metadata.name)"),
        )
        .unwrap();
        assert_eq!(value, json!("web"));
    }

    #[test]
    fn literal_text_is_not_indirected() {
        let table = BindingTable::new();
        assert_eq!(resolve_string(&PathEvaluator, "app=web", &table).unwrap(), "app=web");
        assert_eq!(resolve_string(&PathEvaluator, "", &table).unwrap(), "");
        assert_eq!(resolve_string(&PathEvaluator, "()", &table).unwrap(), "()");
    }

    #[test]
    fn register_binding_leaves_original_table_untouched() {
        let original = BindingTable::new();
        let registered = register_binding(&original, "foo", json!("bar"));

        assert!(original.is_empty());
        assert_eq!(registered.get("$foo").unwrap().value().unwrap(), &json!("bar"));
    }

    #[test]
    fn register_bindings_chains_declarations() {
        let declarations = vec![
            Binding::new("target", "web"),
            Binding::new("($target)", json!({"name": "($target)"})),
            Binding::new("name", "($web.name)"),
        ];

        let table = register_bindings(&PathEvaluator, &BindingTable::new(), &Value::Null, &declarations).unwrap();
        assert_eq!(table.get("$web").unwrap().value().unwrap(), &json!({"name": "web"}));
        assert_eq!(table.get("$name").unwrap().value().unwrap(), &json!("web"));
    }

    #[test]
    fn register_bindings_fails_atomically() {
        let base = BindingTable::new().bind("keep", json!(true));
        let declarations = vec![Binding::new("first", "ok"), Binding::new("second", "($missing)")];

        let error = register_bindings(&PathEvaluator, &base, &Value::Null, &declarations).unwrap_err();
        assert!(matches!(error, EngineError::Evaluation(_)));
        assert!(!base.contains("$first"));
    }
}
