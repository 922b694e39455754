mod snapshot;
mod workflow;

pub use snapshot::Snapshot;
pub use workflow::Workflow;
