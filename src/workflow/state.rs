//! Snapshot of an activity's in-flight resolution progress.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    GateflowError, Result,
    workflow::{ActivityId, FlowId},
};

/// Persisted resolution progress of one activity.
///
/// Field names are part of the persisted format:
/// `{"id", "pendingOutbound", "discardedOutbound", "takenOutbound"}`.
/// `pendingOutbound` is in declared order, the other two in decision order.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionState {
    pub id: ActivityId,
    #[serde(default)]
    pub pending_outbound: Vec<FlowId>,
    #[serde(default)]
    pub discarded_outbound: Vec<FlowId>,
    #[serde(default)]
    pub taken_outbound: Vec<FlowId>,
}

impl ExecutionState {
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Number of flows already decided.
    pub fn decided(&self) -> usize {
        self.discarded_outbound.len() + self.taken_outbound.len()
    }

    /// Check the snapshot partitions `outbound` exactly: every id appears in
    /// one of the three lists and nowhere else.
    ///
    /// The default flow must stay pending until every other flow is decided,
    /// and cannot be taken alongside a non-default flow.
    pub fn validate(
        &self,
        activity: &str,
        outbound: &[FlowId],
        default_flow: Option<&FlowId>,
    ) -> Result<()> {
        if self.id != activity {
            return Err(GateflowError::invariant(format!("snapshot of {} cannot restore activity {}", self.id, activity)));
        }

        let known: HashSet<&FlowId> = outbound.iter().collect();
        let mut seen: HashSet<&FlowId> = HashSet::new();
        for id in self.pending_outbound.iter().chain(self.discarded_outbound.iter()).chain(self.taken_outbound.iter()) {
            if !known.contains(id) {
                return Err(GateflowError::invariant(format!("snapshot of {} references unknown flow {}", activity, id)));
            }
            if !seen.insert(id) {
                return Err(GateflowError::invariant(format!("snapshot of {} lists flow {} twice", activity, id)));
            }
        }
        if seen.len() != known.len() {
            return Err(GateflowError::invariant(format!(
                "snapshot of {} covers {} of {} outbound flows",
                activity,
                seen.len(),
                known.len()
            )));
        }

        if let Some(default) = default_flow {
            let default_taken = self.taken_outbound.contains(default);
            if (default_taken || self.discarded_outbound.contains(default)) && !self.pending_outbound.is_empty() {
                return Err(GateflowError::invariant(format!(
                    "snapshot of {} decided default flow {} before {:?}",
                    activity, default, self.pending_outbound
                )));
            }
            if default_taken && self.taken_outbound.len() > 1 {
                return Err(GateflowError::invariant(format!(
                    "snapshot of {} took default flow {} together with another flow",
                    activity, default
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outbound() -> Vec<FlowId> {
        vec!["c1".to_string(), "c2".to_string(), "d".to_string()]
    }

    fn state(
        pending: &[&str],
        discarded: &[&str],
        taken: &[&str],
    ) -> ExecutionState {
        let ids = |v: &[&str]| v.iter().map(|s| s.to_string()).collect();
        ExecutionState {
            id: "gw".to_string(),
            pending_outbound: ids(pending),
            discarded_outbound: ids(discarded),
            taken_outbound: ids(taken),
        }
    }

    #[test]
    fn test_json_field_names() {
        let json = state(&["c2", "d"], &[], &["c1"]).to_json().unwrap();
        assert_eq!(json, r#"{"id":"gw","pendingOutbound":["c2","d"],"discardedOutbound":[],"takenOutbound":["c1"]}"#);
        let back = ExecutionState::from_json(&json).unwrap();
        assert_eq!(back.decided(), 1);
    }

    #[test]
    fn test_validate_partition() {
        assert!(state(&["c2", "d"], &[], &["c1"]).validate("gw", &outbound(), None).is_ok());
        assert!(state(&["c2", "d"], &["c1"], &["c1"]).validate("gw", &outbound(), None).is_err());
        assert!(state(&["c2"], &[], &["c1"]).validate("gw", &outbound(), None).is_err());
        assert!(state(&["c2", "d", "x"], &[], &["c1"]).validate("gw", &outbound(), None).is_err());
        assert!(state(&["c2", "d"], &[], &["c1"]).validate("other", &outbound(), None).is_err());
    }

    #[test]
    fn test_validate_default_decided_last() {
        let default = "d".to_string();
        let check = |s: ExecutionState| s.validate("gw", &outbound(), Some(&default));

        assert!(check(state(&["c2", "d"], &["c1"], &[])).is_ok());
        assert!(check(state(&[], &["c1", "c2"], &["d"])).is_ok());
        assert!(check(state(&[], &["c2", "d"], &["c1"])).is_ok());

        let err = check(state(&["c2"], &["c1"], &["d"])).unwrap_err();
        assert!(matches!(err, GateflowError::InvariantViolation(_)));
        assert!(check(state(&["c2"], &["c1", "d"], &[])).is_err());
        assert!(check(state(&[], &["c2"], &["c1", "d"])).is_err());
    }
}
