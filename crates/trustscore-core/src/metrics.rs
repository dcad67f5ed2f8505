//! Atomic probe counters.
//!
//! Counters are incremented silently at the call site. Call
//! [`ProbeMetrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. once the input file is exhausted). One
//! instance is shared through an `Arc` by everything that scores.

use std::sync::atomic::{AtomicU64, Ordering};

/// Lightweight atomic counters; no allocations, no locking.
#[derive(Debug)]
pub struct ProbeMetrics {
    probes_started: AtomicU64,
    probes_succeeded: AtomicU64,
    probes_failed: AtomicU64,
    probes_timed_out: AtomicU64,
    probes_not_applicable: AtomicU64,
    records_emitted: AtomicU64,
}

impl Default for ProbeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ProbeMetrics {
    pub const fn new() -> Self {
        Self {
            probes_started: AtomicU64::new(0),
            probes_succeeded: AtomicU64::new(0),
            probes_failed: AtomicU64::new(0),
            probes_timed_out: AtomicU64::new(0),
            probes_not_applicable: AtomicU64::new(0),
            records_emitted: AtomicU64::new(0),
        }
    }

    pub fn inc_started(&self) {
        self.probes_started.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "probes_started", "counter incremented");
    }

    pub fn inc_succeeded(&self) {
        self.probes_succeeded.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "probes_succeeded", "counter incremented");
    }

    /// Failed for any reason, timeouts included.
    pub fn inc_failed(&self) {
        self.probes_failed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "probes_failed", "counter incremented");
    }

    pub fn inc_timed_out(&self) {
        self.probes_timed_out.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "probes_timed_out", "counter incremented");
    }

    pub fn inc_not_applicable(&self) {
        self.probes_not_applicable.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "probes_not_applicable", "counter incremented");
    }

    pub fn inc_records(&self) {
        self.records_emitted.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "records_emitted", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            probes_started = self.probes_started(),
            probes_succeeded = self.probes_succeeded(),
            probes_failed = self.probes_failed(),
            probes_timed_out = self.probes_timed_out(),
            probes_not_applicable = self.probes_not_applicable(),
            records_emitted = self.records_emitted(),
        );
    }

    pub fn probes_started(&self) -> u64 {
        self.probes_started.load(Ordering::Relaxed)
    }

    pub fn probes_succeeded(&self) -> u64 {
        self.probes_succeeded.load(Ordering::Relaxed)
    }

    pub fn probes_failed(&self) -> u64 {
        self.probes_failed.load(Ordering::Relaxed)
    }

    pub fn probes_timed_out(&self) -> u64 {
        self.probes_timed_out.load(Ordering::Relaxed)
    }

    pub fn probes_not_applicable(&self) -> u64 {
        self.probes_not_applicable.load(Ordering::Relaxed)
    }

    pub fn records_emitted(&self) -> u64 {
        self.records_emitted.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        for counter in [
            &self.probes_started,
            &self.probes_succeeded,
            &self.probes_failed,
            &self.probes_timed_out,
            &self.probes_not_applicable,
            &self.records_emitted,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        let m = ProbeMetrics::new();
        assert_eq!(m.probes_started(), 0);
        m.inc_started();
        m.inc_started();
        assert_eq!(m.probes_started(), 2);

        m.inc_failed();
        m.inc_timed_out();
        assert_eq!(m.probes_failed(), 1);
        assert_eq!(m.probes_timed_out(), 1);

        m.inc_succeeded();
        m.inc_not_applicable();
        m.inc_records();
        assert_eq!(m.probes_succeeded(), 1);
        assert_eq!(m.probes_not_applicable(), 1);
        assert_eq!(m.records_emitted(), 1);
        m.flush();
    }

    #[test]
    fn reset_zeroes_all() {
        let m = ProbeMetrics::new();
        m.inc_started();
        m.inc_succeeded();
        m.inc_failed();
        m.inc_timed_out();
        m.inc_not_applicable();
        m.inc_records();
        m.reset();
        assert_eq!(m.probes_started(), 0);
        assert_eq!(m.probes_succeeded(), 0);
        assert_eq!(m.probes_failed(), 0);
        assert_eq!(m.probes_timed_out(), 0);
        assert_eq!(m.probes_not_applicable(), 0);
        assert_eq!(m.records_emitted(), 0);
    }
}
