//! Notifications emitted while a process instance executes.
//!
//! Every notification is a [`Message`] published on the process channel.
//! Flow notifications are emitted exactly once per flow and in decision order.

mod activity;
mod flow;
mod process;

pub use activity::*;
pub use flow::*;
pub use process::*;

use crate::runtime::ProcessId;

/// Generic event wrapper.
#[derive(Debug, Clone)]
pub struct Event<T> {
    inner: T,
}

/// Top-level event type.
#[derive(Debug, Clone)]
pub enum GraphEvent {
    /// Process-level events (start, completed, failed, ...).
    Process(ProcessEvent),
    /// Activity lifecycle events (enter, start, end, leave, ...).
    Activity(ActivityEvent),
    /// Sequence flow outcomes.
    Flow(FlowEvent),
}

/// Event message carrying the process and element it belongs to.
#[derive(Debug, Clone)]
pub struct Message {
    /// Process ID that generated this event.
    pub pid: ProcessId,
    /// Activity or flow ID (empty for process events).
    pub id: String,
    /// The actual event data.
    pub event: GraphEvent,
    /// Timestamp in milliseconds.
    pub timestamp: i64,
}

impl<T> std::ops::Deref for Event<T>
where
    T: std::fmt::Debug + Clone,
{
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T> Event<T>
where
    T: std::fmt::Debug + Clone,
{
    pub fn new(inner: &T) -> Self {
        Self {
            inner: inner.clone(),
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl GraphEvent {
    pub fn is_complete(&self) -> bool {
        matches!(self, GraphEvent::Process(ProcessEvent::Completed(_)))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, GraphEvent::Process(ProcessEvent::Failed(_)))
    }

    pub fn is_taken(&self) -> bool {
        matches!(self, GraphEvent::Flow(FlowEvent::Taken(_)))
    }

    pub fn is_discarded(&self) -> bool {
        matches!(self, GraphEvent::Flow(FlowEvent::Discarded(_)))
    }

    pub fn name(&self) -> String {
        match self {
            GraphEvent::Process(e) => format!("process.{}", e.str()),
            GraphEvent::Activity(e) => format!("activity.{}", e.str()),
            GraphEvent::Flow(e) => format!("flow.{}", e.str()),
        }
    }
}
