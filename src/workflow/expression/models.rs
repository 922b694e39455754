use serde::{Deserialize, Serialize};

/// Condition attached to a sequence flow.
///
/// A literal boolean is accepted so that models can pin a branch on or off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    Literal(bool),
    Rules(RuleSet),
}

impl Condition {
    pub fn rules(
        logical_operator: LogicalOperator,
        rules: Vec<Rule>,
    ) -> Self {
        Condition::Rules(RuleSet {
            logical_operator,
            rules,
        })
    }
}

/// Logical operator
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

/// Comparison operator
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ComparisonOperator {
    // for string or array
    Contains,
    NotContains,
    StartWith,
    EndWith,
    Is,
    IsNot,
    Empty,
    NotEmpty,
    In,
    NotIn,
    AllOf,
    // for number
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    Null,
    NotNull,
}

impl ComparisonOperator {
    /// Operators that are meaningful when the variable does not exist.
    pub fn accepts_missing(&self) -> bool {
        matches!(
            self,
            ComparisonOperator::Null | ComparisonOperator::NotNull | ComparisonOperator::Empty | ComparisonOperator::NotEmpty
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Bool(bool),
    Number(f64),
    Str(String),
    List(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// dotted variable path or template, e.g. `order.total` or `{{#order.total#}}`
    pub variable_selector: String,
    pub comparison_operator: ComparisonOperator,
    #[serde(default)]
    pub value: Option<ConditionValue>,
}

impl Rule {
    pub fn new(
        variable_selector: &str,
        comparison_operator: ComparisonOperator,
        value: Option<ConditionValue>,
    ) -> Self {
        Self {
            variable_selector: variable_selector.to_string(),
            comparison_operator,
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub logical_operator: LogicalOperator,
    pub rules: Vec<Rule>,
}
