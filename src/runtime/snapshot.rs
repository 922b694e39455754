//! Serializable capture of a whole process instance.

use serde::{Deserialize, Serialize};

use crate::{
    GateflowError, Result,
    common::{VariableScope, Vars},
    runtime::{ProcessId, ProcessStatus, process::Work},
    workflow::{ActivityId, ExecutionState, FlowId, FlowStatus, LifecycleState},
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSnapshot {
    pub id: ProcessId,
    pub workflow_id: String,
    pub status: ProcessStatus,
    pub scope: VariableScope,
    pub flows: Vec<FlowSnapshot>,
    /// activated activities only
    pub activities: Vec<ActivitySnapshot>,
    pub work: Vec<Work>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<ActivityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<GateflowError>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FlowSnapshot {
    pub id: FlowId,
    pub status: FlowStatus,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySnapshot {
    pub id: ActivityId,
    pub state: LifecycleState,
    #[serde(default)]
    pub output: Vars,
    /// resolution progress, present while the activity is started
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionState>,
}

impl ProcessSnapshot {
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn activity(
        &self,
        id: &str,
    ) -> Option<&ActivitySnapshot> {
        self.activities.iter().find(|a| a.id == id)
    }

    pub fn flow_status(
        &self,
        id: &str,
    ) -> Option<FlowStatus> {
        self.flows.iter().find(|f| f.id == id).map(|f| f.status)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::{
        model::ProcessModel,
        runtime::{Channel, Process},
        workflow::expression::TemplateEvaluator,
    };

    #[test]
    fn test_snapshot_json_layout() {
        let model: ProcessModel = serde_json::from_value(json!({
            "id": "w",
            "activities": [{ "id": "a" }, { "id": "b" }],
            "flows": [{ "id": "f", "source": "a", "target": "b" }]
        }))
        .unwrap();
        let mut process = Process::new(&model, Arc::new(Channel::default()), Arc::new(TemplateEvaluator)).unwrap();
        process.stop().unwrap();
        process.run().unwrap();

        let value: serde_json::Value = serde_json::from_str(&process.snapshot().unwrap().to_json().unwrap()).unwrap();
        assert_eq!(value["workflowId"], json!("w"));
        assert_eq!(value["status"], json!("stopped"));
        assert_eq!(value["flows"], json!([{ "id": "f", "status": "pending" }]));
        assert_eq!(value["work"], json!([{ "type": "activate", "activity": "a" }]));
        assert!(value.get("current").is_none());

        let back = ProcessSnapshot::from_json(&value.to_string()).unwrap();
        assert_eq!(back.flow_status("f"), Some(FlowStatus::Pending));
        assert!(back.activity("a").is_none());
    }
}
