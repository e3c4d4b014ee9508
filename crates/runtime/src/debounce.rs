use crate::tick::Tick;

/// Temporal coalescing primitive: fires once after a quiet window.
///
/// Every component that needs "do X once input stops" (viewport settle,
/// filter-change refetch) shares this type instead of rolling its own
/// timer.
///
/// Contract:
/// - `kick(now)` records activity and (re)arms the deadline at
///   `now + window`.
/// - `poll(now)` returns `true` exactly once, the first time it is called
///   at or past the armed deadline; it then disarms.
/// - `cancel()` disarms without firing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Debouncer {
    window_ms: u64,
    deadline: Option<Tick>,
}

impl Debouncer {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            deadline: None,
        }
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn kick(&mut self, now: Tick) {
        self.deadline = Some(now.plus_ms(self.window_ms));
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn poll(&mut self, now: Tick) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
