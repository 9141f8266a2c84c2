/// Monotonic time source for the network stack.
///
/// A platform clock must report milliseconds from a fixed origin and never
/// go backwards. The stack only needs it for ARP entry timestamps and for
/// the ping helper's wait budget.
use core::cell::Cell;

pub trait Clock {
    /// Milliseconds since an arbitrary, fixed origin. Never goes backwards.
    fn now_ms(&self) -> u64;
}

/// Test clock that advances by a fixed step every time it is read, so that
/// busy-wait loops measured against it always terminate.
pub struct StepClock {
    now: Cell<u64>,
    step: u64,
}

impl StepClock {
    pub fn new(start: u64, step: u64) -> Self {
        Self { now: Cell::new(start), step }
    }

    /// Jump forward without reading.
    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for StepClock {
    fn now_ms(&self) -> u64 {
        let t = self.now.get();
        self.now.set(t + self.step);
        t
    }
}
