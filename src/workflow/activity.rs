//! Generic activity lifecycle shared by every node of the graph.
//!
//! ```text
//! idle -> entered -> started -> (resolving) -> ended -> left
//!             \-> discarded -> left
//! ```
//!
//! The runtime owns the pending/taken/discarded partition of its outbound
//! flows. It never touches the flows themselves: each decision is handed to
//! the caller, which takes or discards the flow in the graph.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    GateflowError, Result,
    common::{VariableScope, Vars},
    events::{ActivityEvent, GraphEvent},
    model::{ActivityKind, OutputParameter},
    runtime::Context,
    workflow::{
        FlowId,
        resolver::{Decision, GatewayResolver, OutboundFlow, Outcome},
        state::ExecutionState,
    },
};

/// activity id
pub type ActivityId = String;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LifecycleState {
    #[default]
    Idle,
    Entered,
    Started,
    Ended,
    Left,
    Discarded,
}

impl LifecycleState {
    pub fn can_transition(
        &self,
        to: LifecycleState,
    ) -> bool {
        use LifecycleState::*;
        matches!(
            (self, to),
            (Idle, Entered) | (Entered, Started) | (Entered, Discarded) | (Started, Ended) | (Ended, Left) | (Discarded, Left)
        )
    }
}

/// Static definition of an activity, built once per graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityDef {
    pub id: ActivityId,
    pub name: String,
    pub kind: ActivityKind,
    /// incoming flow ids in declared order
    pub inbound: Vec<FlowId>,
    /// outgoing flows in declared order
    pub outbound: Vec<OutboundFlow>,
    pub default_flow: Option<FlowId>,
    pub outputs: Vec<OutputParameter>,
}

impl ActivityDef {
    pub fn outbound_ids(&self) -> Vec<FlowId> {
        self.outbound.iter().map(|f| f.id.clone()).collect()
    }
}

/// Result of driving the resolution loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Every outbound flow is decided and the activity has left.
    Completed,
    /// Frozen at a decision boundary, waiting for `resume`.
    Stopped,
}

/// Lifecycle state machine and resolution progress of one activity.
#[derive(Debug, Clone)]
pub struct ActivityRuntime {
    def: ActivityDef,
    resolver: GatewayResolver,
    state: LifecycleState,
    pending: Vec<FlowId>,
    taken: Vec<FlowId>,
    discarded: Vec<FlowId>,
    stopped: bool,
    output: Vars,
}

impl ActivityRuntime {
    /// Build a runtime for `def`.
    ///
    /// Without a saved state every outbound flow is pending and the activity
    /// is idle. With one, the activity is primed as started and stopped at the
    /// saved decision boundary; decided flows are not re-evaluated and no
    /// notification is replayed. Call [`resume`](Self::resume) to continue.
    pub fn activate(
        def: &ActivityDef,
        saved: Option<&ExecutionState>,
    ) -> Result<Self> {
        let mut runtime = Self {
            def: def.clone(),
            resolver: GatewayResolver::new(def.kind.into()),
            state: LifecycleState::Idle,
            pending: def.outbound_ids(),
            taken: Vec::new(),
            discarded: Vec::new(),
            stopped: false,
            output: Vars::new(),
        };

        if let Some(state) = saved {
            if let Err(e) = state.validate(&def.id, &runtime.pending, def.default_flow.as_ref()) {
                warn!(activity = %def.id, error = %e, "rejected execution state");
                return Err(e);
            }
            // pending keeps declared order regardless of the order it was saved in
            runtime.pending.retain(|id| state.pending_outbound.contains(id));
            runtime.taken = state.taken_outbound.clone();
            runtime.discarded = state.discarded_outbound.clone();
            runtime.state = LifecycleState::Started;
            runtime.stopped = true;
            debug!(activity = %def.id, decided = state.decided(), "activity restored");
        }

        Ok(runtime)
    }

    /// Rebuild a runtime that is not resolving (idle, finished or cancelled),
    /// deriving the partition from the outcome of each outbound flow.
    pub(crate) fn settled(
        def: &ActivityDef,
        state: LifecycleState,
        output: Vars,
        outcome_of: impl Fn(&FlowId) -> Option<Outcome>,
    ) -> Result<Self> {
        if state == LifecycleState::Started {
            return Err(GateflowError::invariant(format!("activity {} is resolving and needs its execution state", def.id)));
        }
        let mut runtime = Self::activate(def, None)?;
        runtime.state = state;
        runtime.output = output;
        for id in def.outbound_ids() {
            match outcome_of(&id) {
                Some(Outcome::Take) => runtime.taken.push(id),
                Some(Outcome::Discard) => runtime.discarded.push(id),
                None => continue,
            }
        }
        runtime.pending.retain(|id| !runtime.taken.contains(id) && !runtime.discarded.contains(id));
        Ok(runtime)
    }

    pub fn id(&self) -> &str {
        &self.def.id
    }

    pub fn def(&self) -> &ActivityDef {
        &self.def
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn pending(&self) -> &[FlowId] {
        &self.pending
    }

    pub fn taken(&self) -> &[FlowId] {
        &self.taken
    }

    pub fn discarded(&self) -> &[FlowId] {
        &self.discarded
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Output variables produced at `end`.
    pub fn get_output(&self) -> &Vars {
        &self.output
    }

    /// Capture the resolution progress. Only valid between start and end.
    pub fn get_state(&self) -> Result<ExecutionState> {
        if self.state != LifecycleState::Started {
            return Err(GateflowError::invariant(format!(
                "cannot capture activity {} while {}",
                self.def.id,
                self.state.as_ref()
            )));
        }
        Ok(ExecutionState {
            id: self.def.id.clone(),
            pending_outbound: self.pending.clone(),
            discarded_outbound: self.discarded.clone(),
            taken_outbound: self.taken.clone(),
        })
    }

    pub fn enter(
        &mut self,
        ctx: &Context,
    ) -> Result<()> {
        self.transition(ctx, LifecycleState::Entered, ActivityEvent::Enter)
    }

    pub fn start(
        &mut self,
        ctx: &Context,
    ) -> Result<()> {
        self.transition(ctx, LifecycleState::Started, ActivityEvent::Start)
    }

    /// Decide exactly one pending flow. Returns `Ok(None)` when every flow is
    /// decided. A failed evaluation leaves the partition untouched.
    pub fn step(
        &mut self,
        ctx: &Context,
        scope: &VariableScope,
    ) -> Result<Option<Decision>> {
        if self.state != LifecycleState::Started {
            return Err(GateflowError::invariant(format!("activity {} cannot resolve while {}", self.def.id, self.state.as_ref())));
        }
        if self.stopped {
            return Err(GateflowError::invariant(format!("activity {} is stopped", self.def.id)));
        }

        let Some(decision) = self.resolver.next(&self.def.id, &self.def.outbound, &self.pending, &self.taken, scope, ctx.evaluator())? else {
            return Ok(None);
        };

        self.pending.retain(|id| *id != decision.flow);
        match decision.outcome {
            Outcome::Take => self.taken.push(decision.flow.clone()),
            Outcome::Discard => self.discarded.push(decision.flow.clone()),
        }
        Ok(Some(decision))
    }

    /// Run the resolution loop until every flow is decided or a stop is
    /// requested through the context. `apply` takes or discards the flow in
    /// the graph; it runs before the next decision is made.
    pub fn run(
        &mut self,
        ctx: &Context,
        scope: &mut VariableScope,
        mut apply: impl FnMut(&Decision) -> Result<()>,
    ) -> Result<RunState> {
        loop {
            if ctx.stop_requested() {
                self.stop(ctx)?;
                return Ok(RunState::Stopped);
            }
            match self.step(ctx, scope)? {
                Some(decision) => apply(&decision)?,
                None => {
                    self.finish(ctx, scope)?;
                    return Ok(RunState::Completed);
                }
            }
        }
    }

    /// Freeze the activity at the current decision boundary.
    pub fn stop(
        &mut self,
        ctx: &Context,
    ) -> Result<()> {
        if self.state != LifecycleState::Started {
            return Err(GateflowError::invariant(format!("activity {} cannot stop while {}", self.def.id, self.state.as_ref())));
        }
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;
        debug!(pid = ctx.pid(), activity = %self.def.id, pending = self.pending.len(), "activity stopped");
        ctx.emit(&self.def.id, GraphEvent::Activity(ActivityEvent::Stop));
        Ok(())
    }

    /// Continue resolving from where `pending` left off.
    pub fn resume(
        &mut self,
        ctx: &Context,
        scope: &mut VariableScope,
        apply: impl FnMut(&Decision) -> Result<()>,
    ) -> Result<RunState> {
        if self.state != LifecycleState::Started || !self.stopped {
            return Err(GateflowError::invariant(format!("activity {} is not stopped", self.def.id)));
        }
        self.stopped = false;
        ctx.emit(&self.def.id, GraphEvent::Activity(ActivityEvent::Resume));
        self.run(ctx, scope, apply)
    }

    /// Cancel the activity: every pending outbound flow is discarded in
    /// declared order without evaluating conditions, then the activity leaves.
    pub fn discard(
        &mut self,
        ctx: &Context,
        mut apply: impl FnMut(&Decision) -> Result<()>,
    ) -> Result<()> {
        self.transition(ctx, LifecycleState::Discarded, ActivityEvent::Discard)?;
        for id in std::mem::take(&mut self.pending) {
            let decision = Decision::discard(&id);
            self.discarded.push(id);
            apply(&decision)?;
        }
        self.transition(ctx, LifecycleState::Left, ActivityEvent::Leave)
    }

    fn finish(
        &mut self,
        ctx: &Context,
        scope: &mut VariableScope,
    ) -> Result<()> {
        let output = ctx.evaluator().map_outputs(&self.def.outputs, scope)?;
        scope.merge(&output);
        self.output = output.clone();
        self.transition(ctx, LifecycleState::Ended, ActivityEvent::End(output))?;
        self.transition(ctx, LifecycleState::Left, ActivityEvent::Leave)
    }

    fn transition(
        &mut self,
        ctx: &Context,
        to: LifecycleState,
        event: ActivityEvent,
    ) -> Result<()> {
        if !self.state.can_transition(to) {
            return Err(GateflowError::invariant(format!(
                "activity {} cannot go from {} to {}",
                self.def.id,
                self.state.as_ref(),
                to.as_ref()
            )));
        }
        debug!(pid = ctx.pid(), activity = %self.def.id, from = self.state.as_ref(), to = to.as_ref(), "activity transition");
        self.state = to;
        ctx.emit(&self.def.id, GraphEvent::Activity(event));
        Ok(())
    }
}
