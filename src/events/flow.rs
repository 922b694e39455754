use crate::workflow::ActivityId;

/// Execution context of a flow outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowNotice {
    pub source: ActivityId,
    pub target: ActivityId,
}

#[derive(Debug, Clone)]
pub enum FlowEvent {
    Taken(FlowNotice),
    Discarded(FlowNotice),
}

impl FlowEvent {
    pub fn str(&self) -> &str {
        match self {
            FlowEvent::Taken(_) => "taken",
            FlowEvent::Discarded(_) => "discarded",
        }
    }

    pub fn notice(&self) -> &FlowNotice {
        match self {
            FlowEvent::Taken(n) | FlowEvent::Discarded(n) => n,
        }
    }
}
