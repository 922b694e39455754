use std::sync::Arc;

use crate::{
    common::StopSignal,
    events::{GraphEvent, Message},
    runtime::{Channel, ProcessId},
    utils,
    workflow::expression::{Evaluator, TemplateEvaluator},
};

/// Execution context handed to activities and flows of one process.
///
/// It carries no process state of its own: the variable scope is passed
/// separately so that ownership stays with the process.
#[derive(Clone)]
pub struct Context {
    pid: ProcessId,
    channel: Arc<Channel>,
    evaluator: Arc<dyn Evaluator>,
    stop: StopSignal,
}

impl Context {
    pub fn new(
        pid: ProcessId,
        channel: Arc<Channel>,
        evaluator: Arc<dyn Evaluator>,
    ) -> Self {
        Self {
            pid,
            channel,
            evaluator,
            stop: StopSignal::new(),
        }
    }

    /// Context with its own channel and the default evaluator, for driving
    /// activities outside of a process.
    pub fn standalone(pid: &str) -> Self {
        Self::new(pid.to_string(), Arc::new(Channel::default()), Arc::new(TemplateEvaluator))
    }

    pub fn pid(&self) -> &str {
        &self.pid
    }

    pub fn channel(&self) -> Arc<Channel> {
        self.channel.clone()
    }

    pub fn evaluator(&self) -> &dyn Evaluator {
        self.evaluator.as_ref()
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.is_requested()
    }

    pub fn emit(
        &self,
        id: &str,
        event: GraphEvent,
    ) {
        self.channel.emit(Message {
            pid: self.pid.clone(),
            id: id.to_string(),
            event,
            timestamp: utils::time::time_millis(),
        });
    }

    /// Copy for a cloned process: same observers and evaluator, independent
    /// stop signal.
    pub(crate) fn fork(
        &self,
        pid: ProcessId,
    ) -> Self {
        Self {
            pid,
            channel: self.channel.clone(),
            evaluator: self.evaluator.clone(),
            stop: self.stop.detached(),
        }
    }
}
