use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Identifies one issued fetch. Only the latest generation may touch state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Hands out monotonically increasing generations and answers whether a
/// completed fetch is still the most recent one.
#[derive(Debug, Default)]
pub struct RequestArbiter {
    current: AtomicU64,
    closed: AtomicBool,
}

impl RequestArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> Generation {
        Generation(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        !self.closed.load(Ordering::SeqCst) && self.current.load(Ordering::SeqCst) == generation.0
    }

    pub fn current(&self) -> Generation {
        Generation(self.current.load(Ordering::SeqCst))
    }

    /// Makes every generation handed out so far stale.
    pub fn invalidate(&self) {
        self.current.fetch_add(1, Ordering::SeqCst);
    }

    /// Permanently rejects all generations, past and future.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.invalidate();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
