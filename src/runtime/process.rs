//! Process instance driver.
//!
//! A process walks its graph on the caller's thread: start activities are
//! activated first, then flow outcomes are delivered to their targets in
//! FIFO order. At most one activity is resolving at a time. A stop request
//! is honored at the next decision boundary, after which the whole instance
//! can be snapshotted, cloned, or resumed.

use std::{
    collections::{BTreeMap, VecDeque},
    sync::Arc,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::{
    GateflowError, Result,
    common::{StopSignal, VariableScope, Vars},
    events::{GraphEvent, ProcessEvent, ProcessFailedEvent, ProcessStartEvent},
    model::ProcessModel,
    runtime::{
        Channel, Context,
        snapshot::{ActivitySnapshot, FlowSnapshot, ProcessSnapshot},
    },
    utils,
    workflow::{
        ActivityId, ActivityRuntime, Decision, ExecutionState, FlowStatus, LifecycleState, Outcome, ProcessGraph, RunState, Signal,
        expression::Evaluator,
    },
};

pub type ProcessId = String;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProcessStatus {
    #[default]
    Idle,
    Running,
    Stopped,
    Completed,
    Failed,
}

/// Unit of work waiting to be executed by a process.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Work {
    /// Activate an activity that has no inbound flows.
    Activate {
        activity: ActivityId,
    },
    /// Deliver a flow outcome to its target.
    Deliver {
        signal: Signal,
    },
}

pub struct Process {
    id: ProcessId,
    wid: String,
    graph: ProcessGraph,
    scope: VariableScope,
    runtimes: BTreeMap<ActivityId, ActivityRuntime>,
    work: VecDeque<Work>,
    /// activity whose outbound flows are being resolved
    current: Option<ActivityId>,
    status: ProcessStatus,
    error: Option<GateflowError>,
    ctx: Context,
}

impl std::fmt::Debug for Process {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Process")
            .field("id", &self.id)
            .field("wid", &self.wid)
            .field("status", &self.status)
            .field("current", &self.current)
            .field("work", &self.work)
            .field("error", &self.error)
            .finish()
    }
}

impl Clone for Process {
    /// Deep copy of the instance with its own stop signal.
    ///
    /// The copy keeps the process id and shares the channel, so observers
    /// receive its notifications under the same pid as the original. Use
    /// [`Process::fork`] for a copy observers can tell apart.
    fn clone(&self) -> Self {
        self.fork(self.id.clone())
    }
}

impl Process {
    pub fn new(
        model: &ProcessModel,
        channel: Arc<Channel>,
        evaluator: Arc<dyn Evaluator>,
    ) -> Result<Self> {
        Self::with_id(utils::longid(), model, channel, evaluator)
    }

    pub fn with_id(
        pid: ProcessId,
        model: &ProcessModel,
        channel: Arc<Channel>,
        evaluator: Arc<dyn Evaluator>,
    ) -> Result<Self> {
        let graph = ProcessGraph::try_from(model)?;

        let mut scope = VariableScope::with_variables(model.variables.clone());
        scope.set_env(model.env.clone());

        Ok(Self {
            ctx: Context::new(pid.clone(), channel, evaluator),
            id: pid,
            wid: model.id.clone(),
            graph,
            scope,
            runtimes: BTreeMap::new(),
            work: VecDeque::new(),
            current: None,
            status: ProcessStatus::Idle,
            error: None,
        })
    }

    /// Rebuild a process from a snapshot of an instance of `model`.
    ///
    /// Flow statuses and decided outbound flows are restored as they were;
    /// nothing is re-evaluated and no notification is emitted.
    pub fn restore(
        model: &ProcessModel,
        snapshot: &ProcessSnapshot,
        channel: Arc<Channel>,
        evaluator: Arc<dyn Evaluator>,
    ) -> Result<Self> {
        if snapshot.workflow_id != model.id {
            return Err(GateflowError::Process(format!(
                "snapshot of process {} belongs to workflow {}, not {}",
                snapshot.id, snapshot.workflow_id, model.id
            )));
        }

        let mut process = Self::with_id(snapshot.id.clone(), model, channel, evaluator)?;

        for flow in snapshot.flows.iter() {
            process.graph.flow_mut(&flow.id)?.restore_status(flow.status);
        }

        for activity in snapshot.activities.iter() {
            let def = process.graph.activity(&activity.id).ok_or_else(|| GateflowError::Activity(format!("activity {} not found", activity.id)))?;
            let runtime = match &activity.execution {
                Some(execution) => {
                    if activity.state != LifecycleState::Started {
                        return Err(GateflowError::invariant(format!(
                            "activity {} carries an execution state while {}",
                            activity.id,
                            activity.state.as_ref()
                        )));
                    }
                    check_execution_matches_flows(&process.graph, execution)?;
                    ActivityRuntime::activate(def, Some(execution))?
                }
                None => {
                    let graph = &process.graph;
                    ActivityRuntime::settled(def, activity.state, activity.output.clone(), |id| match graph.flow_status(id) {
                        Some(FlowStatus::Taken) => Some(Outcome::Take),
                        Some(FlowStatus::Discarded) => Some(Outcome::Discard),
                        _ => None,
                    })?
                }
            };
            process.runtimes.insert(activity.id.clone(), runtime);
        }

        // only the current activity may be resolving
        let started: Vec<&ActivityId> = process.runtimes.iter().filter(|(_, r)| r.state() == LifecycleState::Started).map(|(id, _)| id).collect();
        match &snapshot.current {
            Some(current) if started.len() != 1 || started[0] != current => {
                return Err(GateflowError::invariant(format!("current activity {} does not match resolving activities {:?}", current, started)));
            }
            None if !started.is_empty() => {
                return Err(GateflowError::invariant(format!("activities {:?} are resolving without a current activity", started)));
            }
            _ => {}
        }

        process.scope = snapshot.scope.clone();
        process.work = snapshot.work.iter().cloned().collect();
        process.current = snapshot.current.clone();
        process.error = snapshot.error.clone();
        process.status = match snapshot.status {
            ProcessStatus::Running => ProcessStatus::Stopped,
            status => status,
        };

        debug!(pid = %process.id, status = process.status.as_ref(), "process restored");
        Ok(process)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn wid(&self) -> &str {
        &self.wid
    }

    pub fn status(&self) -> ProcessStatus {
        self.status
    }

    pub fn error(&self) -> Option<&GateflowError> {
        self.error.as_ref()
    }

    pub fn graph(&self) -> &ProcessGraph {
        &self.graph
    }

    pub fn scope(&self) -> &VariableScope {
        &self.scope
    }

    pub fn scope_mut(&mut self) -> &mut VariableScope {
        &mut self.scope
    }

    pub fn variables(&self) -> &Vars {
        self.scope.variables()
    }

    pub fn activity(
        &self,
        id: &str,
    ) -> Option<&ActivityRuntime> {
        self.runtimes.get(id)
    }

    /// The activity currently resolving its outbound flows, if any.
    pub fn current(&self) -> Option<&ActivityRuntime> {
        self.current.as_ref().and_then(|id| self.runtimes.get(id))
    }

    pub fn flow_status(
        &self,
        id: &str,
    ) -> Option<FlowStatus> {
        self.graph.flow_status(id)
    }

    /// Handle that can request a stop from anywhere, including observers.
    pub fn stop_signal(&self) -> StopSignal {
        self.ctx.stop_signal()
    }

    pub fn is_complete(&self) -> bool {
        self.status == ProcessStatus::Completed
    }

    /// Deep copy of the instance under another id.
    pub fn fork(
        &self,
        pid: ProcessId,
    ) -> Self {
        Self {
            ctx: self.ctx.fork(pid.clone()),
            id: pid,
            wid: self.wid.clone(),
            graph: self.graph.clone(),
            scope: self.scope.clone(),
            runtimes: self.runtimes.clone(),
            work: self.work.clone(),
            current: self.current.clone(),
            status: self.status,
            error: self.error.clone(),
        }
    }

    /// Start the process and run until it completes, stops or fails.
    pub fn run(&mut self) -> Result<ProcessStatus> {
        if self.status != ProcessStatus::Idle {
            return Err(GateflowError::Process(format!("process {} cannot start while {}", self.id, self.status.as_ref())));
        }

        let activity_ids = self.graph.activity_ids();
        self.ctx.emit(
            "",
            GraphEvent::Process(ProcessEvent::Start(ProcessStartEvent {
                activity_ids,
            })),
        );
        for activity in self.graph.start_activities() {
            self.work.push_back(Work::Activate {
                activity,
            });
        }

        self.drive()
    }

    /// Request a stop at the next decision boundary.
    pub fn stop(&self) -> Result<()> {
        if matches!(self.status, ProcessStatus::Completed | ProcessStatus::Failed) {
            return Err(GateflowError::Process(format!("process {} is already {}", self.id, self.status.as_ref())));
        }
        self.ctx.stop_signal().stop();
        Ok(())
    }

    /// Continue a stopped process.
    pub fn resume(&mut self) -> Result<ProcessStatus> {
        if self.status != ProcessStatus::Stopped {
            return Err(GateflowError::Process(format!("process {} cannot resume while {}", self.id, self.status.as_ref())));
        }
        self.ctx.stop_signal().clear();
        self.ctx.emit("", GraphEvent::Process(ProcessEvent::Resumed));
        self.drive()
    }

    /// Capture the whole instance. Not available while running.
    pub fn snapshot(&self) -> Result<ProcessSnapshot> {
        if self.status == ProcessStatus::Running {
            return Err(GateflowError::Process(format!("process {} is running", self.id)));
        }

        let mut activities = Vec::with_capacity(self.runtimes.len());
        for runtime in self.runtimes.values() {
            let execution = match runtime.state() {
                LifecycleState::Started => Some(runtime.get_state()?),
                _ => None,
            };
            activities.push(ActivitySnapshot {
                id: runtime.id().to_string(),
                state: runtime.state(),
                output: runtime.get_output().clone(),
                execution,
            });
        }

        Ok(ProcessSnapshot {
            id: self.id.clone(),
            workflow_id: self.wid.clone(),
            status: self.status,
            scope: self.scope.clone(),
            flows: self
                .graph
                .flows()
                .map(|f| FlowSnapshot {
                    id: f.id.clone(),
                    status: f.status(),
                })
                .collect(),
            activities,
            work: self.work.iter().cloned().collect(),
            current: self.current.clone(),
            error: self.error.clone(),
        })
    }

    fn drive(&mut self) -> Result<ProcessStatus> {
        self.status = ProcessStatus::Running;

        loop {
            if let Some(id) = self.current.clone() {
                match self.resolve(&id) {
                    Ok(RunState::Completed) => self.current = None,
                    Ok(RunState::Stopped) => return Ok(self.suspend()),
                    Err(e) => return Err(self.fail(Some(id), e)),
                }
                continue;
            }

            if self.ctx.stop_requested() {
                return Ok(self.suspend());
            }

            let Some(work) = self.work.pop_front() else {
                return Ok(self.complete());
            };
            let activity = match &work {
                Work::Activate {
                    activity,
                } => activity.clone(),
                Work::Deliver {
                    signal,
                } => signal.target.clone(),
            };
            if let Err(e) = self.execute(work) {
                return Err(self.fail(Some(activity), e));
            }
        }
    }

    fn execute(
        &mut self,
        work: Work,
    ) -> Result<()> {
        let (id, taken) = match work {
            Work::Activate {
                activity,
            } => (activity, true),
            Work::Deliver {
                signal,
            } => {
                debug!(pid = %self.id, flow = %signal.flow, target = %signal.target, kind = signal.kind.as_ref(), "signal delivered");
                // an activity with several inbound flows waits for all of them
                if !self.graph.inbound_settled(&signal.target)? {
                    return Ok(());
                }
                let taken = self.graph.inbound_taken(&signal.target)?;
                (signal.target, taken)
            }
        };

        // a join is activated by whichever inbound signal is delivered first
        // once all of them are decided; later signals find it activated
        if self.runtimes.get(&id).is_some_and(|r| r.state() != LifecycleState::Idle) {
            debug!(pid = %self.id, activity = %id, "activity already activated");
            return Ok(());
        }
        let def = self.graph.activity(&id).ok_or_else(|| GateflowError::Activity(format!("activity {} not found", id)))?;
        let mut runtime = ActivityRuntime::activate(def, None)?;
        runtime.enter(&self.ctx)?;

        if taken {
            runtime.start(&self.ctx)?;
            self.runtimes.insert(id.clone(), runtime);
            self.current = Some(id);
        } else {
            let Self {
                graph,
                work,
                ctx,
                ..
            } = &mut *self;
            let ctx = &*ctx;
            let result = runtime.discard(ctx, |d| apply_decision(graph, work, ctx, d));
            self.runtimes.insert(id, runtime);
            result?;
        }
        Ok(())
    }

    fn resolve(
        &mut self,
        id: &str,
    ) -> Result<RunState> {
        let Self {
            graph,
            work,
            ctx,
            scope,
            runtimes,
            ..
        } = &mut *self;
        let ctx = &*ctx;
        let runtime = runtimes.get_mut(id).ok_or_else(|| GateflowError::Activity(format!("activity {} not found", id)))?;
        let apply = |d: &Decision| apply_decision(graph, work, ctx, d);

        if runtime.is_stopped() { runtime.resume(ctx, scope, apply) } else { runtime.run(ctx, scope, apply) }
    }

    fn suspend(&mut self) -> ProcessStatus {
        self.status = ProcessStatus::Stopped;
        debug!(pid = %self.id, current = ?self.current, queued = self.work.len(), "process stopped");
        self.ctx.emit("", GraphEvent::Process(ProcessEvent::Stopped));
        self.status
    }

    fn complete(&mut self) -> ProcessStatus {
        self.status = ProcessStatus::Completed;
        debug!(pid = %self.id, "process completed");
        self.ctx.emit("", GraphEvent::Process(ProcessEvent::Completed(self.scope.variables().clone())));
        self.status
    }

    fn fail(
        &mut self,
        activity: Option<ActivityId>,
        e: GateflowError,
    ) -> GateflowError {
        self.status = ProcessStatus::Failed;
        self.error = Some(e.clone());
        error!(pid = %self.id, activity = ?activity, error = %e, "process failed");
        self.ctx.emit(
            "",
            GraphEvent::Process(ProcessEvent::Failed(ProcessFailedEvent {
                activity,
                error: e.clone(),
            })),
        );
        e
    }
}

/// Take or discard a flow in the graph and queue its signal.
fn apply_decision(
    graph: &mut ProcessGraph,
    work: &mut VecDeque<Work>,
    ctx: &Context,
    decision: &Decision,
) -> Result<()> {
    let flow = graph.flow_mut(&decision.flow)?;
    let signal = match decision.outcome {
        Outcome::Take => flow.take(ctx)?,
        Outcome::Discard => flow.discard(ctx)?,
    };
    work.push_back(Work::Deliver {
        signal,
    });
    Ok(())
}

/// A restored execution state must agree with the flow statuses it sits on.
fn check_execution_matches_flows(
    graph: &ProcessGraph,
    execution: &ExecutionState,
) -> Result<()> {
    let check = |ids: &[String], status: FlowStatus| -> Result<()> {
        for id in ids {
            let actual = graph.flow_status(id);
            if actual != Some(status) {
                return Err(GateflowError::invariant(format!(
                    "flow {} is {:?} in the snapshot but listed as {} by activity {}",
                    id,
                    actual,
                    status.as_ref(),
                    execution.id
                )));
            }
        }
        Ok(())
    };
    check(&execution.pending_outbound, FlowStatus::Pending)?;
    check(&execution.taken_outbound, FlowStatus::Taken)?;
    check(&execution.discarded_outbound, FlowStatus::Discarded)
}
