use crate::{GateflowError, common::Vars, workflow::ActivityId};

#[derive(Debug, Clone)]
pub enum ProcessEvent {
    Start(ProcessStartEvent),
    /// Carries the final process variables.
    Completed(Vars),
    Failed(ProcessFailedEvent),
    Stopped,
    Resumed,
}

impl ProcessEvent {
    pub fn str(&self) -> &str {
        match self {
            ProcessEvent::Start(_) => "start",
            ProcessEvent::Completed(_) => "completed",
            ProcessEvent::Failed(_) => "failed",
            ProcessEvent::Stopped => "stopped",
            ProcessEvent::Resumed => "resumed",
        }
    }
}

/// Event emitted when a process starts
#[derive(Debug, Clone)]
pub struct ProcessStartEvent {
    /// All activity IDs in the process graph
    pub activity_ids: Vec<ActivityId>,
}

#[derive(Debug, Clone)]
pub struct ProcessFailedEvent {
    /// Activity that raised the error, if any.
    pub activity: Option<ActivityId>,
    pub error: GateflowError,
}
