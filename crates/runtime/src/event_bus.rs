use crate::tick::Tick;

/// Structured diagnostic event.
///
/// Kinds are short static strings ("coordinate_dropped", "stale_response",
/// "fetch_failed", ...) so tests can count occurrences without string
/// parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub at: Tick,
    pub kind: &'static str,
    pub message: String,
}

/// Drainable diagnostics sink shared by engine components.
///
/// This complements `tracing`: logs go to the subscriber, while events that
/// tests and UIs assert on are recorded here deterministically.
#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, at: Tick, kind: &'static str, message: impl Into<String>) {
        self.events.push(Event {
            at,
            kind,
            message: message.into(),
        });
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn count_kind(&self, kind: &str) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
