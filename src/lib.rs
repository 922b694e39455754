//! # Gateflow
//!
//! Gateflow is an embeddable process engine focused on gateway semantics.
//! A process is a graph of activities joined by sequence flows; when an
//! activity completes, its outbound flows are resolved one by one and each
//! is either taken or discarded.
//!
//! ## Core Features
//!
//! - **Inclusive and exclusive gateways**: default flows are deferred until
//!   every conditional flow is decided
//! - **Resumable resolution**: an activity can be stopped between two
//!   decisions, snapshotted and continued in a fresh instance
//! - **Discard propagation**: a discarded inbound flow cancels the target and
//!   discards its outbound flows without evaluating them
//! - **Observers**: every notification is published on a channel, to
//!   synchronous listeners and to async subscribers
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gateflow::{EngineBuilder, ProcessModel};
//!
//! let engine = EngineBuilder::new().build()?;
//!
//! let model = ProcessModel::from_json(json_str)?;
//! engine.deploy(&model)?;
//! let pid = engine.build_process(&model.id)?;
//! engine.run_process(&pid)?;
//! ```

mod builder;
pub mod common;
mod config;
mod engine;
mod error;
pub mod events;
mod model;
pub mod runtime;
pub mod store;
mod utils;
pub mod workflow;

use std::sync::{Arc, RwLock};

pub use builder::EngineBuilder;
pub use config::{ChannelConfig, Config, EngineConfig, StoreConfig, StoreType};
pub use engine::{Engine, ProcessHandle};
pub use error::GateflowError;
pub use model::*;
pub use runtime::{ChannelEvent, ChannelOptions, Process, ProcessSnapshot, ProcessStatus};

/// Result type alias for Gateflow operations.
pub type Result<T> = std::result::Result<T, GateflowError>;

/// Thread-safe shared lock wrapper using Arc<RwLock<T>>.
pub(crate) type ShareLock<T> = Arc<RwLock<T>>;
