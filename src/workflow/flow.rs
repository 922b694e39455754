//! Sequence flows: the edges of a process graph.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    GateflowError, Result,
    events::{FlowEvent, FlowNotice, GraphEvent},
    model::FlowModel,
    runtime::Context,
    workflow::{ActivityId, expression::Condition},
};

/// Unique identifier for a flow within a process.
pub type FlowId = String;

/// Outcome status of a flow. A flow leaves `Pending` exactly once.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FlowStatus {
    #[default]
    Pending,
    Taken,
    Discarded,
}

impl FlowStatus {
    pub fn can_transition(
        &self,
        to: FlowStatus,
    ) -> bool {
        matches!((self, to), (FlowStatus::Pending, FlowStatus::Taken) | (FlowStatus::Pending, FlowStatus::Discarded))
    }

    pub fn is_decided(&self) -> bool {
        !matches!(self, FlowStatus::Pending)
    }
}

/// Kind of signal a flow delivers to its target.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SignalKind {
    Taken,
    /// Discard propagation marker: the target cancels without evaluating.
    Discarded,
}

/// Arrival of a flow outcome at the target activity.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    pub flow: FlowId,
    pub source: ActivityId,
    pub target: ActivityId,
    pub kind: SignalKind,
}

/// Runtime sequence flow connecting two activities.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SequenceFlow {
    pub id: FlowId,
    pub source: ActivityId,
    pub target: ActivityId,
    /// Opaque to the runtime; handed to the evaluator.
    pub condition: Option<Condition>,
    pub is_default: bool,
    #[serde(default)]
    status: FlowStatus,
}

impl SequenceFlow {
    pub fn new(
        model: &FlowModel,
        is_default: bool,
    ) -> Self {
        Self {
            id: model.id.clone(),
            source: model.source.clone(),
            target: model.target.clone(),
            condition: model.condition.clone(),
            is_default,
            status: FlowStatus::Pending,
        }
    }

    pub fn status(&self) -> FlowStatus {
        self.status
    }

    /// Mark the flow taken, notify observers and return the arrival signal
    /// for the target activity.
    pub fn take(
        &mut self,
        ctx: &Context,
    ) -> Result<Signal> {
        self.transition(FlowStatus::Taken)?;
        trace!(pid = ctx.pid(), flow = %self.id, "flow taken");
        ctx.emit(&self.id, GraphEvent::Flow(FlowEvent::Taken(self.notice())));
        Ok(self.signal(SignalKind::Taken))
    }

    /// Mark the flow discarded, notify observers and return the discard
    /// signal for the target activity.
    pub fn discard(
        &mut self,
        ctx: &Context,
    ) -> Result<Signal> {
        self.transition(FlowStatus::Discarded)?;
        trace!(pid = ctx.pid(), flow = %self.id, "flow discarded");
        ctx.emit(&self.id, GraphEvent::Flow(FlowEvent::Discarded(self.notice())));
        Ok(self.signal(SignalKind::Discarded))
    }

    /// Set the status from a snapshot. Nothing is emitted.
    pub(crate) fn restore_status(
        &mut self,
        status: FlowStatus,
    ) {
        self.status = status;
    }

    fn transition(
        &mut self,
        to: FlowStatus,
    ) -> Result<()> {
        if !self.status.can_transition(to) {
            return Err(GateflowError::invariant(format!(
                "flow {} cannot become {} once {}",
                self.id,
                to.as_ref(),
                self.status.as_ref()
            )));
        }
        self.status = to;
        Ok(())
    }

    fn notice(&self) -> FlowNotice {
        FlowNotice {
            source: self.source.clone(),
            target: self.target.clone(),
        }
    }

    fn signal(
        &self,
        kind: SignalKind,
    ) -> Signal {
        Signal {
            flow: self.id.clone(),
            source: self.source.clone(),
            target: self.target.clone(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::runtime::{ChannelEvent, ChannelOptions};

    fn flow() -> SequenceFlow {
        SequenceFlow::new(
            &FlowModel {
                id: "f1".to_string(),
                source: "a".to_string(),
                target: "b".to_string(),
                condition: None,
            },
            false,
        )
    }

    #[test]
    fn test_take_once() {
        let ctx = Context::standalone("p1");
        let taken = Arc::new(Mutex::new(0));
        let t = taken.clone();
        ChannelEvent::channel(ctx.channel(), ChannelOptions::default()).unwrap().on_taken(move |_| *t.lock().unwrap() += 1);

        let mut flow = flow();
        let signal = flow.take(&ctx).unwrap();
        assert_eq!(signal.kind, SignalKind::Taken);
        assert_eq!(signal.target, "b");
        assert_eq!(flow.status(), FlowStatus::Taken);

        let err = flow.take(&ctx).unwrap_err();
        assert!(matches!(err, GateflowError::InvariantViolation(_)));
        assert_eq!(*taken.lock().unwrap(), 1);
    }

    #[test]
    fn test_discard_after_take_fails() {
        let ctx = Context::standalone("p1");
        let mut flow = flow();
        flow.take(&ctx).unwrap();
        assert!(matches!(flow.discard(&ctx), Err(GateflowError::InvariantViolation(_))));
        assert_eq!(flow.status(), FlowStatus::Taken);
    }

    #[test]
    fn test_discard_once() {
        let ctx = Context::standalone("p1");
        let mut flow = flow();
        assert_eq!(flow.discard(&ctx).unwrap().kind, SignalKind::Discarded);
        assert!(flow.discard(&ctx).is_err());
        assert!(flow.take(&ctx).is_err());
        assert_eq!(flow.status(), FlowStatus::Discarded);
    }
}
