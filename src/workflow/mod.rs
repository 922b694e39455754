//! Process graph elements and the flow-resolution core.

pub mod activity;
pub mod expression;
pub mod flow;
pub mod graph;
pub mod resolver;
pub mod state;

pub use activity::{ActivityDef, ActivityId, ActivityRuntime, LifecycleState, RunState};
pub use flow::{FlowId, FlowStatus, SequenceFlow, Signal, SignalKind};
pub use graph::ProcessGraph;
pub use resolver::{Decision, GatewayResolver, OutboundFlow, Outcome, ResolveMode};
pub use state::ExecutionState;
