use crate::common::Vars;

#[derive(Debug, Clone)]
pub enum ActivityEvent {
    Enter,
    Start,
    /// Carries the output parameter map.
    End(Vars),
    Leave,
    /// The activity was reached by a discard and is cancelling its outbound flows.
    Discard,
    Stop,
    Resume,
}

impl ActivityEvent {
    pub fn str(&self) -> &str {
        match self {
            ActivityEvent::Enter => "enter",
            ActivityEvent::Start => "start",
            ActivityEvent::End(_) => "end",
            ActivityEvent::Leave => "leave",
            ActivityEvent::Discard => "discard",
            ActivityEvent::Stop => "stop",
            ActivityEvent::Resume => "resume",
        }
    }
}
