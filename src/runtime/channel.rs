use std::sync::{Arc, RwLock};

use tokio::sync::broadcast;

use crate::{
    GateflowError, Result, ShareLock,
    common::BroadcastQueue,
    events::{Event, GraphEvent, Message},
    runtime::ProcessId,
};

const EVENT_QUEUE_SIZE: usize = 2048;

pub type EventHandle = Arc<dyn Fn(&Event<Message>) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct ChannelOptions {
    /// use the glob pattern to match the process id
    /// eg. pid1*
    pub pid: String,

    /// use the glob pattern to match the activity or flow id
    /// eg. gateway*
    pub id: String,
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self {
            pid: "*".to_string(),
            id: "*".to_string(),
        }
    }
}

impl ChannelOptions {
    pub fn new(
        pid: String,
        id: String,
    ) -> Self {
        Self {
            pid,
            id,
        }
    }

    pub fn with_pid(pid: String) -> Self {
        Self {
            pid,
            id: "*".to_string(),
        }
    }

    pub fn with_id(id: String) -> Self {
        Self {
            pid: "*".to_string(),
            id,
        }
    }
}

/// Notification channel shared by the processes of an engine.
///
/// Observers registered through [`ChannelEvent`] are called synchronously,
/// in registration order, on the thread that executes the process. They
/// therefore see decisions exactly in the order they are made. Async
/// consumers can [`subscribe`](Channel::subscribe) to a broadcast copy.
#[derive(Clone)]
pub struct Channel {
    event_queue: Arc<BroadcastQueue<Event<Message>>>,
    events: ShareLock<Vec<EventHandle>>,
}

impl Default for Channel {
    fn default() -> Self {
        Self::new(EVENT_QUEUE_SIZE)
    }
}

impl Channel {
    pub fn new(event_queue_size: usize) -> Self {
        Self {
            event_queue: BroadcastQueue::new(event_queue_size),
            events: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Subscribe to every message published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event<Message>> {
        self.event_queue.subscribe()
    }

    pub(crate) fn emit(
        &self,
        msg: Message,
    ) {
        let event = Event::new(&msg);

        // Handlers run without holding the lock so they may register more handlers.
        let handlers = match self.events.read() {
            Ok(handlers) => handlers.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        for handle in handlers.iter() {
            (handle)(&event);
        }

        if self.event_queue.receiver_count() > 0 {
            let _ = self.event_queue.send(event);
        }
    }

    fn register(
        &self,
        handle: EventHandle,
    ) {
        match self.events.write() {
            Ok(mut handlers) => handlers.push(handle),
            Err(poisoned) => poisoned.into_inner().push(handle),
        }
    }
}

/// Filtered view on a [`Channel`] used to register observers.
#[derive(Clone)]
pub struct ChannelEvent {
    channel: Arc<Channel>,

    glob: (globset::GlobMatcher, globset::GlobMatcher),
}

impl ChannelEvent {
    pub fn channel(
        channel: Arc<Channel>,
        options: ChannelOptions,
    ) -> Result<Self> {
        let compile = |pattern: &str| {
            globset::Glob::new(pattern).map(|g| g.compile_matcher()).map_err(|e| GateflowError::Config(format!("invalid channel pattern '{}': {}", pattern, e)))
        };

        Ok(Self {
            glob: (compile(&options.pid)?, compile(&options.id)?),
            channel,
        })
    }

    pub fn on_complete(
        &self,
        f: impl Fn(ProcessId) + Send + Sync + 'static,
    ) {
        let glob = self.glob.clone();

        self.channel.register(Arc::new(move |e| {
            if e.event.is_complete() && is_match(&glob, e) {
                f(e.pid.clone());
            }
        }));
    }

    pub fn on_error(
        &self,
        f: impl Fn(&Event<Message>) + Send + Sync + 'static,
    ) {
        let glob = self.glob.clone();

        self.channel.register(Arc::new(move |e| {
            if e.event.is_error() && is_match(&glob, e) {
                f(e);
            }
        }));
    }

    /// Called with the flow id each time a matching flow is taken.
    pub fn on_taken(
        &self,
        f: impl Fn(&str) + Send + Sync + 'static,
    ) {
        let glob = self.glob.clone();

        self.channel.register(Arc::new(move |e| {
            if e.event.is_taken() && is_match(&glob, e) {
                f(&e.id);
            }
        }));
    }

    /// Called with the flow id each time a matching flow is discarded.
    pub fn on_discarded(
        &self,
        f: impl Fn(&str) + Send + Sync + 'static,
    ) {
        let glob = self.glob.clone();

        self.channel.register(Arc::new(move |e| {
            if e.event.is_discarded() && is_match(&glob, e) {
                f(&e.id);
            }
        }));
    }

    pub fn on_activity(
        &self,
        f: impl Fn(&Event<Message>) + Send + Sync + 'static,
    ) {
        let glob = self.glob.clone();

        self.channel.register(Arc::new(move |e| {
            if matches!(e.event, GraphEvent::Activity(_)) && is_match(&glob, e) {
                f(e);
            }
        }));
    }

    pub fn on_event(
        &self,
        f: impl Fn(&Event<Message>) + Send + Sync + 'static,
    ) {
        let glob = self.glob.clone();

        self.channel.register(Arc::new(move |e| {
            if is_match(&glob, e) {
                f(e);
            }
        }));
    }
}

fn is_match(
    glob: &(globset::GlobMatcher, globset::GlobMatcher),
    e: &Event<Message>,
) -> bool {
    let (pat_pid, pat_id) = glob;
    // Process-level events carry an empty id and only filter on pid.
    pat_pid.is_match(&e.pid) && (e.id.is_empty() || pat_id.is_match(&e.id))
}
