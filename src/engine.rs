//! Process engine - the main entry point for Gateflow.
//!
//! The engine keeps deployed models in the store and live process instances
//! in a bounded cache. Every process is driven on the calling thread; the
//! engine only coordinates who holds it.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError};

use tracing::{debug, info};

use crate::{
    Config, GateflowError, Result, ShareLock, StoreType,
    common::{MemCache, StopSignal},
    model::ProcessModel,
    runtime::{Channel, Process, ProcessId, ProcessSnapshot, ProcessStatus},
    store::{DbStore, MemStore, Store},
    utils,
    workflow::expression::Evaluator,
};

/// A live process and its lock-free stop handle.
///
/// The stop signal is kept outside the lock so that a process can be
/// stopped while another thread is driving it.
#[derive(Clone)]
pub struct ProcessHandle {
    process: ShareLock<Process>,
    stop: StopSignal,
}

impl ProcessHandle {
    fn new(process: Process) -> Self {
        let stop = process.stop_signal();
        Self {
            process: Arc::new(RwLock::new(process)),
            stop,
        }
    }

    pub fn read(&self) -> Result<RwLockReadGuard<'_, Process>> {
        Ok(self.process.read()?)
    }

    pub fn write(&self) -> Result<RwLockWriteGuard<'_, Process>> {
        Ok(self.process.write()?)
    }

    pub fn status(&self) -> Result<ProcessStatus> {
        Ok(self.read()?.status())
    }

    /// Request a stop without waiting for the process lock.
    ///
    /// A process being driven holds its lock and is running, so the status
    /// is only checked when the lock is free. A completed or failed process
    /// cannot be stopped.
    pub fn stop(&self) -> Result<()> {
        match self.process.try_read() {
            Ok(process) => process.stop(),
            Err(TryLockError::WouldBlock) => {
                self.stop.stop();
                Ok(())
            }
            Err(TryLockError::Poisoned(e)) => Err(e.into()),
        }
    }
}

/// The main process engine.
///
/// # Example
///
/// ```rust,ignore
/// let engine = EngineBuilder::new().build()?;
///
/// engine.deploy(&model)?;
/// let pid = engine.build_process(&model.id)?;
/// engine.run_process(&pid)?;
/// ```
pub struct Engine {
    config: Config,
    /// Notification channel shared by every process of the engine.
    channel: Arc<Channel>,
    /// Deployed models and persisted snapshots.
    store: Arc<Store>,
    /// Live process instances.
    procs: Arc<MemCache<ProcessId, ProcessHandle>>,
    evaluator: Arc<dyn Evaluator>,
}

impl Engine {
    pub fn new(
        config: Config,
        evaluator: Arc<dyn Evaluator>,
    ) -> Result<Self> {
        let store = Store::new();
        let db: Box<dyn DbStore> = match config.store.store_type {
            StoreType::Mem => Box::new(MemStore::new()),
        };
        db.init(&store)?;

        info!(
            event_queue_size = config.channel.event_queue_size,
            process_cache_size = config.engine.process_cache_size,
            "engine created"
        );
        Ok(Self {
            channel: Arc::new(Channel::new(config.channel.event_queue_size)),
            store: Arc::new(store),
            procs: Arc::new(MemCache::new(config.engine.process_cache_size)),
            evaluator,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns a reference to the notification channel.
    pub fn channel(&self) -> Arc<Channel> {
        self.channel.clone()
    }

    pub fn store(&self) -> Arc<Store> {
        self.store.clone()
    }

    /// Deploys a process model to the store.
    ///
    /// The model is checked by building its graph before it is stored.
    pub fn deploy(
        &self,
        model: &ProcessModel,
    ) -> Result<bool> {
        crate::workflow::ProcessGraph::try_from(model)?;
        self.store.deploy(model)
    }

    /// Build an idle process from a deployed model and return its id.
    pub fn build_process(
        &self,
        wid: &str,
    ) -> Result<ProcessId> {
        let model = self.store.model(wid)?;
        let process = Process::new(&model, self.channel.clone(), self.evaluator.clone())?;
        let pid = process.id().to_string();
        if self.procs.get(&pid).is_some() {
            return Err(GateflowError::Process(format!("process {} already exists in cache", pid)));
        }

        debug!(pid = %pid, wid, "process built");
        self.procs.set(pid.clone(), ProcessHandle::new(process));
        Ok(pid)
    }

    /// Run a process until it completes, stops or fails.
    pub fn run_process(
        &self,
        pid: &str,
    ) -> Result<ProcessStatus> {
        self.handle(pid)?.write()?.run()
    }

    /// Request a stop at the next decision boundary.
    pub fn stop(
        &self,
        pid: &str,
    ) -> Result<()> {
        self.handle(pid)?.stop()
    }

    pub fn resume(
        &self,
        pid: &str,
    ) -> Result<ProcessStatus> {
        self.handle(pid)?.write()?.resume()
    }

    pub fn snapshot(
        &self,
        pid: &str,
    ) -> Result<ProcessSnapshot> {
        self.handle(pid)?.read()?.snapshot()
    }

    /// Snapshot a process and save it to the store.
    pub fn persist(
        &self,
        pid: &str,
    ) -> Result<ProcessSnapshot> {
        let snapshot = self.snapshot(pid)?;
        self.store.save_snapshot(&snapshot)?;
        debug!(pid, status = snapshot.status.as_ref(), "process persisted");
        Ok(snapshot)
    }

    /// Rebuild a process from its persisted snapshot, replacing any live
    /// instance with the same id.
    pub fn restore(
        &self,
        pid: &str,
    ) -> Result<ProcessId> {
        let snapshot = self.store.load_snapshot(pid)?;
        let model = self.store.model(&snapshot.workflow_id)?;
        let process = Process::restore(&model, &snapshot, self.channel.clone(), self.evaluator.clone())?;

        debug!(pid, status = process.status().as_ref(), "process restored");
        self.procs.set(pid.to_string(), ProcessHandle::new(process));
        Ok(pid.to_string())
    }

    /// Deep copy a process under a new id.
    pub fn fork(
        &self,
        pid: &str,
    ) -> Result<ProcessId> {
        let fork = self.handle(pid)?.read()?.fork(utils::longid());
        let fid = fork.id().to_string();

        debug!(pid, fork = %fid, "process forked");
        self.procs.set(fid.clone(), ProcessHandle::new(fork));
        Ok(fid)
    }

    /// Gets a process by its ID from the cache.
    pub fn get_process(
        &self,
        pid: &str,
    ) -> Option<ProcessHandle> {
        self.procs.get(&pid.to_string())
    }

    pub fn remove(
        &self,
        pid: &str,
    ) {
        self.procs.remove(&pid.to_string());
    }

    fn handle(
        &self,
        pid: &str,
    ) -> Result<ProcessHandle> {
        self.get_process(pid).ok_or_else(|| GateflowError::Process(format!("process {} not found", pid)))
    }
}
