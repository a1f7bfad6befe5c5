//! Usage accounting port.

use std::sync::atomic::{AtomicU64, Ordering};

/// Running total of characters spoken by the cloud engine.
///
/// Only normal completions are recorded; cancelled or failed sessions are
/// not billed here.
#[cfg_attr(test, mockall::automock)]
pub trait UsageLedger: Send + Sync {
    fn record(&self, chars: u64);

    fn total(&self) -> u64;
}

/// Process-local ledger.
#[derive(Debug, Default)]
pub struct InMemoryUsageLedger {
    total: AtomicU64,
}

impl InMemoryUsageLedger {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            total: AtomicU64::new(0),
        }
    }
}

impl UsageLedger for InMemoryUsageLedger {
    fn record(&self, chars: u64) {
        let total = self.total.fetch_add(chars, Ordering::Relaxed) + chars;
        tracing::debug!(chars, total, "Recorded cloud usage");
    }

    fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}
