use serde::{Deserialize, Serialize};

/// Kind of a node in the process graph.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActivityKind {
    StartEvent,
    #[default]
    Task,
    EndEvent,
    InclusiveGateway,
    ExclusiveGateway,
}

/// Output parameter applied when an activity ends.
///
/// String leaves of `value` may contain templates resolved against the
/// variable scope, e.g. `"{{#order.total#}}"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputParameter {
    pub name: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityModel {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub kind: ActivityKind,
    /// id of the outbound flow used as fallback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_flow: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<OutputParameter>,
}
