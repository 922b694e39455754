mod cache;
mod queue;
mod scope;
mod stop;
mod vars;

pub use cache::MemCache;
pub use queue::BroadcastQueue;
pub use scope::VariableScope;
pub use stop::StopSignal;
pub use vars::Vars;
