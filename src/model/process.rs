use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    GateflowError, Result,
    common::Vars,
    model::{ActivityModel, FlowModel},
};

/// Serializable process definition: activities, sequence flows, initial
/// variables and environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessModel {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub variables: Vars,
    pub activities: Vec<ActivityModel>,
    pub flows: Vec<FlowModel>,
}

impl ProcessModel {
    pub fn from_json(s: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(s).map_err(|e| GateflowError::Workflow(format!("{}", e)))?;
        jsonschema::validate(&Self::schema(), &value)?;
        serde_json::from_value::<ProcessModel>(value).map_err(|e| GateflowError::Workflow(format!("{}", e)))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn schema() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "id": { "type": "string", "minLength": 1 },
                "name": { "type": "string" },
                "desc": { "type": "string" },
                "env": { "type": "object", "additionalProperties": { "type": "string" } },
                "variables": { "type": "object" },
                "activities": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "minLength": 1 },
                            "name": { "type": "string" },
                            "kind": {
                                "type": "string",
                                "enum": ["start_event", "task", "end_event", "inclusive_gateway", "exclusive_gateway"]
                            },
                            "default_flow": { "type": "string" },
                            "outputs": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "properties": {
                                        "name": { "type": "string" },
                                        "value": {}
                                    },
                                    "required": ["name", "value"]
                                }
                            }
                        },
                        "required": ["id"]
                    }
                },
                "flows": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "minLength": 1 },
                            "source": { "type": "string" },
                            "target": { "type": "string" },
                            "condition": {}
                        },
                        "required": ["id", "source", "target"]
                    }
                }
            },
            "required": ["id", "activities", "flows"]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ActivityKind;

    #[test]
    fn test_from_json() {
        let text = r#"{
            "id": "p1",
            "activities": [
                { "id": "start", "kind": "start_event" },
                { "id": "gw", "kind": "inclusive_gateway", "default_flow": "f3" },
                { "id": "end" }
            ],
            "flows": [
                { "id": "f1", "source": "start", "target": "gw" },
                { "id": "f2", "source": "gw", "target": "end", "condition": true },
                { "id": "f3", "source": "gw", "target": "end" }
            ]
        }"#;
        let model = ProcessModel::from_json(text).unwrap();
        assert_eq!(model.activities.len(), 3);
        assert_eq!(model.activities[1].kind, ActivityKind::InclusiveGateway);
        assert_eq!(model.activities[1].default_flow.as_deref(), Some("f3"));
        assert_eq!(model.activities[2].kind, ActivityKind::Task);
        assert!(model.flows[1].condition.is_some());
    }

    #[test]
    fn test_from_json_rejects_unknown_kind() {
        let text = r#"{ "id": "p1", "activities": [{ "id": "a", "kind": "parallel" }], "flows": [] }"#;
        let err = ProcessModel::from_json(text).unwrap_err();
        assert!(matches!(err, GateflowError::Workflow(_)));
    }

    #[test]
    fn test_from_json_requires_flows() {
        let err = ProcessModel::from_json(r#"{ "id": "p1", "activities": [] }"#).unwrap_err();
        assert!(matches!(err, GateflowError::Workflow(_)));
    }
}
