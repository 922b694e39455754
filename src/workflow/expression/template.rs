use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::{GateflowError, Result, common::VariableScope};

/// Regex pattern for scope variables
/// Format: `{{#name#}}` or `{{#name.key.subkey#}}`
const VARIABLE_TEMPLATE_PATTERN: &str = r"\{\{#([^#]+)#\}\}";
/// Regex pattern for environment variables
/// Format: `{{$VAR_NAME$}}`
const ENV_TEMPLATE_PATTERN: &str = r"\{\{\$([^$]+)\$\}\}";

static VARIABLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(VARIABLE_TEMPLATE_PATTERN).unwrap());
static ENV_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(ENV_TEMPLATE_PATTERN).unwrap());

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        v => v.to_string(),
    }
}

/// Resolve template variables in the format `{{#name.path#}}` and `{{$VAR_NAME$}}`.
/// Returns error if any template variable cannot be resolved.
pub fn resolve_template(
    scope: &VariableScope,
    template: &str,
) -> Result<String> {
    let mut result = template.to_string();
    let mut errors: Vec<String> = Vec::new();

    for caps in ENV_RE.captures_iter(template) {
        match scope.env(&caps[1]) {
            Some(value) => result = result.replace(&caps[0], value),
            None => errors.push(format!("env variable '{}' not found", &caps[1])),
        }
    }

    for caps in VARIABLE_RE.captures_iter(template) {
        match scope.lookup(caps[1].trim()) {
            Some(value) => result = result.replace(&caps[0], &stringify(value)),
            None => errors.push(format!("variable '{}' not found", &caps[0])),
        }
    }

    if !errors.is_empty() {
        return Err(GateflowError::Evaluation(errors.join(", ")));
    }

    Ok(result)
}

/// Resolve a rule selector to the value it points at.
///
/// A selector is either a single template (`{{#order.total#}}`,
/// `{{$REGION$}}`) or a bare dotted path (`order.total`). Returns
/// `Ok(None)` when the variable does not exist.
pub fn resolve_selector(
    scope: &VariableScope,
    selector: &str,
) -> Result<Option<Value>> {
    let selector = selector.trim();
    if let Some(caps) = VARIABLE_RE.captures(selector) {
        if caps[0].len() != selector.len() {
            return Err(GateflowError::Evaluation(format!("selector '{}' must be a single variable", selector)));
        }
        return Ok(scope.lookup(caps[1].trim()).cloned());
    }
    if let Some(caps) = ENV_RE.captures(selector) {
        return Ok(scope.env(&caps[1]).map(|v| Value::String(v.clone())));
    }
    if selector.is_empty() || selector.contains(char::is_whitespace) {
        return Err(GateflowError::Evaluation(format!("malformed selector '{}'", selector)));
    }
    Ok(scope.lookup(selector).cloned())
}

/// Resolve template variables in a JSON Value recursively.
///
/// A string consisting of exactly one variable template keeps the variable's
/// JSON type; other strings are interpolated.
pub fn resolve_json_value(
    scope: &VariableScope,
    value: &Value,
) -> Result<Value> {
    match value {
        Value::String(s) => {
            if let Some(caps) = VARIABLE_RE.captures(s) {
                if caps[0].len() == s.len() {
                    return scope.lookup(caps[1].trim()).cloned().ok_or_else(|| GateflowError::Evaluation(format!("variable '{}' not found", s)));
                }
            }
            Ok(Value::String(resolve_template(scope, s)?))
        }
        Value::Array(arr) => {
            let resolved: Result<Vec<Value>> = arr.iter().map(|v| resolve_json_value(scope, v)).collect();
            Ok(Value::Array(resolved?))
        }
        Value::Object(obj) => {
            let resolved: Result<serde_json::Map<String, Value>> = obj.iter().map(|(k, v)| resolve_json_value(scope, v).map(|rv| (k.clone(), rv))).collect();
            Ok(Value::Object(resolved?))
        }
        _ => Ok(value.clone()),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;
    use crate::common::Vars;

    fn create_test_scope() -> VariableScope {
        let mut scope = VariableScope::with_variables(Vars::from(json!({
            "order": { "id": "o-1", "total": 120, "vip": true, "tags": ["a", "b"] },
            "message": "hello"
        })));
        scope.set_env(HashMap::from([("REGION".to_string(), "eu".to_string())]));
        scope
    }

    #[test]
    fn test_resolve_template_no_variables() {
        let scope = create_test_scope();
        assert_eq!(resolve_template(&scope, "hello world").unwrap(), "hello world");
    }

    #[test]
    fn test_resolve_template_mixed() {
        let scope = create_test_scope();
        let result = resolve_template(&scope, "{{#message#}} {{#order.id#}} from {{$REGION$}}, total {{#order.total#}}").unwrap();
        assert_eq!(result, "hello o-1 from eu, total 120");
    }

    #[test]
    fn test_resolve_template_missing() {
        let scope = create_test_scope();
        let err = resolve_template(&scope, "{{#nope#}} {{$NOPE$}}").unwrap_err();
        match err {
            GateflowError::Evaluation(msg) => {
                assert!(msg.contains("'{{#nope#}}'"));
                assert!(msg.contains("env variable 'NOPE'"));
            }
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn test_resolve_selector_forms() {
        let scope = create_test_scope();
        assert_eq!(resolve_selector(&scope, "order.total").unwrap(), Some(json!(120)));
        assert_eq!(resolve_selector(&scope, "{{#order.vip#}}").unwrap(), Some(json!(true)));
        assert_eq!(resolve_selector(&scope, "{{$REGION$}}").unwrap(), Some(json!("eu")));
        assert_eq!(resolve_selector(&scope, "order.missing").unwrap(), None);
        assert!(resolve_selector(&scope, "order total").is_err());
        assert!(resolve_selector(&scope, "x {{#order.total#}}").is_err());
    }

    #[test]
    fn test_resolve_json_value_keeps_types() {
        let scope = create_test_scope();
        let value = json!({
            "total": "{{#order.total#}}",
            "label": "order {{#order.id#}}",
            "nested": ["{{#order.tags#}}", 1]
        });
        let resolved = resolve_json_value(&scope, &value).unwrap();
        assert_eq!(
            resolved,
            json!({
                "total": 120,
                "label": "order o-1",
                "nested": [["a", "b"], 1]
            })
        );
    }
}
