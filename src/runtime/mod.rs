mod channel;
mod context;
mod process;
mod snapshot;

pub use channel::{Channel, ChannelEvent, ChannelOptions};
pub use context::Context;
pub use process::{Process, ProcessId, ProcessStatus, Work};
pub use snapshot::{ActivitySnapshot, FlowSnapshot, ProcessSnapshot};
