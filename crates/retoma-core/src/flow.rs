use std::sync::atomic::{AtomicBool, Ordering};

/// Snapshot of the admission-control state at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Open,
    Blocked,
}

/// Admission-control signal bridged from the broker kernel into the restore
/// loop's cooperative check point.
///
/// The kernel's resource-monitor thread writes via `block`/`unblock` at
/// arbitrary times; the restore loop reads via `snapshot` once per iteration.
/// Single writer, single reader: Relaxed ordering is sufficient because the
/// check is stale-tolerant: a slightly outdated value only delays the stop,
/// it never corrupts state.
#[derive(Debug, Default)]
pub struct FlowControlChannel {
    blocked: AtomicBool,
}

impl FlowControlChannel {
    pub fn new() -> Self {
        Self {
            blocked: AtomicBool::new(false),
        }
    }

    /// Stop admitting new messages. Infallible, callable from any thread.
    pub fn block(&self) {
        self.blocked.store(true, Ordering::Relaxed);
    }

    /// Resume admitting new messages. Same calling contract as `block`.
    pub fn unblock(&self) {
        self.blocked.store(false, Ordering::Relaxed);
    }

    /// Reserved hook for channel teardown signaling. Currently unused by the
    /// restore path.
    pub fn on_disconnect(&self) {}

    /// Non-blocking read of the current state. Used once per restore-loop
    /// iteration; never waits.
    pub fn snapshot(&self) -> FlowState {
        if self.blocked.load(Ordering::Relaxed) {
            FlowState::Blocked
        } else {
            FlowState::Open
        }
    }
}
