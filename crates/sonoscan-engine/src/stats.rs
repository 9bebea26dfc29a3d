//! Render counters, readable from any thread.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of the engine counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Analysis blocks rendered since construction.
    pub blocks_rendered: u64,
    /// Resonator outputs that went non-finite and were cleared.
    pub instabilities_healed: u64,
    /// Render calls answered with silence because the engine was stopped.
    pub silent_calls: u64,
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    blocks_rendered: AtomicU64,
    instabilities_healed: AtomicU64,
    silent_calls: AtomicU64,
}

impl StatsCounters {
    #[inline]
    pub(crate) fn block_rendered(&self) {
        self.blocks_rendered.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn instability_healed(&self) {
        self.instabilities_healed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn silent_call(&self) {
        self.silent_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> EngineStats {
        EngineStats {
            blocks_rendered: self.blocks_rendered.load(Ordering::Relaxed),
            instabilities_healed: self.instabilities_healed.load(Ordering::Relaxed),
            silent_calls: self.silent_calls.load(Ordering::Relaxed),
        }
    }
}
