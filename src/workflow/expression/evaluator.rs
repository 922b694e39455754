use serde_json::Value;

use crate::{
    GateflowError, Result,
    common::{VariableScope, Vars},
    model::OutputParameter,
    workflow::expression::{
        models::*,
        template::{resolve_json_value, resolve_selector},
    },
};

/// Contract consumed from the expression collaborator.
///
/// Both methods are pure with respect to the scope: they read it and
/// never write it. Output application into the scope is done by the
/// activity runtime.
pub trait Evaluator: Send + Sync {
    /// Evaluate a flow condition against the current variables.
    fn evaluate(
        &self,
        condition: &Condition,
        scope: &VariableScope,
    ) -> Result<bool>;

    /// Compute the output map of an activity from its parameter definitions.
    fn map_outputs(
        &self,
        params: &[OutputParameter],
        scope: &VariableScope,
    ) -> Result<Vars>;
}

/// Closures work as condition evaluators; outputs are resolved as templates.
impl<F> Evaluator for F
where
    F: Fn(&Condition, &VariableScope) -> Result<bool> + Send + Sync,
{
    fn evaluate(
        &self,
        condition: &Condition,
        scope: &VariableScope,
    ) -> Result<bool> {
        (self)(condition, scope)
    }

    fn map_outputs(
        &self,
        params: &[OutputParameter],
        scope: &VariableScope,
    ) -> Result<Vars> {
        TemplateEvaluator.map_outputs(params, scope)
    }
}

/// Default evaluator: rule sets over scope variables and template-based
/// output parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateEvaluator;

impl TemplateEvaluator {
    /// Evaluate a single comparison
    fn evaluate_comparison(
        &self,
        actual: &Option<Value>,
        operator: ComparisonOperator,
        expected: &Option<ConditionValue>,
    ) -> bool {
        match operator {
            ComparisonOperator::Null => actual.is_none() || matches!(actual, Some(Value::Null)),
            ComparisonOperator::NotNull => actual.is_some() && !matches!(actual, Some(Value::Null)),
            ComparisonOperator::Empty => match actual {
                None => true,
                Some(Value::Null) => true,
                Some(Value::String(s)) => s.is_empty(),
                Some(Value::Array(arr)) => arr.is_empty(),
                Some(Value::Object(obj)) => obj.is_empty(),
                _ => false,
            },
            ComparisonOperator::NotEmpty => match actual {
                None => false,
                Some(Value::Null) => false,
                Some(Value::String(s)) => !s.is_empty(),
                Some(Value::Array(arr)) => !arr.is_empty(),
                Some(Value::Object(obj)) => !obj.is_empty(),
                _ => true,
            },
            _ => {
                let Some(actual_val) = actual else {
                    return false;
                };
                self.evaluate_with_value(actual_val, operator, expected)
            }
        }
    }

    /// Evaluate comparison operators that require a value
    fn evaluate_with_value(
        &self,
        actual: &Value,
        operator: ComparisonOperator,
        expected: &Option<ConditionValue>,
    ) -> bool {
        let Some(expected) = expected else {
            return false;
        };

        match operator {
            ComparisonOperator::Contains => self.eval_contains(actual, expected),
            ComparisonOperator::NotContains => !self.eval_contains(actual, expected),
            ComparisonOperator::StartWith => self.eval_starts_with(actual, expected),
            ComparisonOperator::EndWith => self.eval_ends_with(actual, expected),
            ComparisonOperator::Is => self.eval_is(actual, expected),
            ComparisonOperator::IsNot => !self.eval_is(actual, expected),
            ComparisonOperator::In => self.eval_in(actual, expected),
            ComparisonOperator::NotIn => !self.eval_in(actual, expected),
            ComparisonOperator::AllOf => self.eval_all_of(actual, expected),
            ComparisonOperator::Eq => self.eval_eq(actual, expected),
            ComparisonOperator::Ne => !self.eval_eq(actual, expected),
            ComparisonOperator::Gt => self.eval_cmp(actual, expected, |a, b| a > b),
            ComparisonOperator::Lt => self.eval_cmp(actual, expected, |a, b| a < b),
            ComparisonOperator::Ge => self.eval_cmp(actual, expected, |a, b| a >= b),
            ComparisonOperator::Le => self.eval_cmp(actual, expected, |a, b| a <= b),
            _ => false,
        }
    }

    fn eval_contains(
        &self,
        actual: &Value,
        expected: &ConditionValue,
    ) -> bool {
        match (actual, expected) {
            (Value::String(s), ConditionValue::Str(e)) => s.contains(e),
            (Value::Array(arr), ConditionValue::Str(e)) => arr.iter().any(|v| v.as_str() == Some(e.as_str())),
            _ => false,
        }
    }

    fn eval_starts_with(
        &self,
        actual: &Value,
        expected: &ConditionValue,
    ) -> bool {
        match (actual, expected) {
            (Value::String(s), ConditionValue::Str(e)) => s.starts_with(e),
            _ => false,
        }
    }

    fn eval_ends_with(
        &self,
        actual: &Value,
        expected: &ConditionValue,
    ) -> bool {
        match (actual, expected) {
            (Value::String(s), ConditionValue::Str(e)) => s.ends_with(e),
            _ => false,
        }
    }

    fn eval_is(
        &self,
        actual: &Value,
        expected: &ConditionValue,
    ) -> bool {
        match (actual, expected) {
            (Value::String(s), ConditionValue::Str(e)) => s == e,
            (Value::Bool(b), ConditionValue::Bool(e)) => b == e,
            (Value::Bool(b), ConditionValue::Str(e)) => (*b && e == "true") || (!*b && e == "false"),
            _ => false,
        }
    }

    fn eval_in(
        &self,
        actual: &Value,
        expected: &ConditionValue,
    ) -> bool {
        match expected {
            ConditionValue::List(list) => match actual {
                Value::String(s) => list.contains(s),
                Value::Number(n) => list.contains(&n.to_string()),
                _ => false,
            },
            ConditionValue::Str(s) => match actual {
                Value::String(a) => s.contains(a.as_str()),
                _ => false,
            },
            _ => false,
        }
    }

    fn eval_all_of(
        &self,
        actual: &Value,
        expected: &ConditionValue,
    ) -> bool {
        match (actual, expected) {
            (Value::Array(arr), ConditionValue::List(list)) => list.iter().all(|e| arr.iter().any(|v| v.as_str() == Some(e.as_str()))),
            _ => false,
        }
    }

    fn eval_eq(
        &self,
        actual: &Value,
        expected: &ConditionValue,
    ) -> bool {
        match (actual, expected) {
            (Value::Number(n), ConditionValue::Number(e)) => n.as_f64() == Some(*e),
            (Value::Number(n), ConditionValue::Str(s)) => match s.parse::<f64>() {
                Ok(e) => n.as_f64() == Some(e),
                Err(_) => false,
            },
            (Value::String(a), ConditionValue::Str(e)) => a == e,
            (Value::Bool(a), ConditionValue::Bool(e)) => a == e,
            _ => false,
        }
    }

    fn eval_cmp<F>(
        &self,
        actual: &Value,
        expected: &ConditionValue,
        cmp: F,
    ) -> bool
    where
        F: Fn(f64, f64) -> bool,
    {
        let expected = match expected {
            ConditionValue::Number(e) => Some(*e),
            ConditionValue::Str(s) => s.parse::<f64>().ok(),
            _ => None,
        };
        match (actual.as_f64(), expected) {
            (Some(a), Some(e)) => cmp(a, e),
            _ => false,
        }
    }

    fn evaluate_rule(
        &self,
        rule: &Rule,
        scope: &VariableScope,
    ) -> Result<bool> {
        let actual = resolve_selector(scope, &rule.variable_selector)?;
        if actual.is_none() && !rule.comparison_operator.accepts_missing() {
            return Err(GateflowError::Evaluation(format!("variable '{}' not found", rule.variable_selector)));
        }
        Ok(self.evaluate_comparison(&actual, rule.comparison_operator, &rule.value))
    }
}

impl Evaluator for TemplateEvaluator {
    fn evaluate(
        &self,
        condition: &Condition,
        scope: &VariableScope,
    ) -> Result<bool> {
        let rule_set = match condition {
            Condition::Literal(value) => return Ok(*value),
            Condition::Rules(rule_set) => rule_set,
        };
        if rule_set.rules.is_empty() {
            return Err(GateflowError::Evaluation("condition has no rules".to_string()));
        }

        // Every rule is evaluated so that a broken selector surfaces even when
        // an earlier rule already decides the outcome.
        let mut results = Vec::with_capacity(rule_set.rules.len());
        for rule in rule_set.rules.iter() {
            results.push(self.evaluate_rule(rule, scope)?);
        }

        Ok(match rule_set.logical_operator {
            LogicalOperator::And => results.iter().all(|r| *r),
            LogicalOperator::Or => results.iter().any(|r| *r),
        })
    }

    fn map_outputs(
        &self,
        params: &[OutputParameter],
        scope: &VariableScope,
    ) -> Result<Vars> {
        let mut outputs = Vars::new();
        for param in params {
            outputs.set(&param.name, resolve_json_value(scope, &param.value)?);
        }
        Ok(outputs)
    }
}
