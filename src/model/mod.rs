mod activity;
mod flow;
mod process;

pub use activity::{ActivityKind, ActivityModel, OutputParameter};
pub use flow::FlowModel;
pub use process::ProcessModel;
