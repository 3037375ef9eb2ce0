// Run metrics module
//
// Lightweight counters for one booking run, logged when the run ends

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Booking run metrics
///
/// Uses atomic operations so the retry handler and sequencer can record
/// through a shared `Arc<Metrics>` without locks.
#[derive(Debug)]
pub struct Metrics {
    /// Registration attempts started (including ones whose session failed to open)
    pub attempts_started: AtomicUsize,

    /// Sessions that could not be opened
    pub session_faults: AtomicUsize,

    /// Classes booked (or already registered)
    pub targets_succeeded: AtomicUsize,

    /// Classes that ended in failure
    pub targets_failed: AtomicUsize,

    /// Time spent inside attempts, in milliseconds
    pub total_attempt_time_ms: AtomicU64,

    /// Run start time
    start_time: Instant,
}

impl Metrics {
    /// Create a new Metrics instance
    pub fn new() -> Self {
        Self {
            attempts_started: AtomicUsize::new(0),
            session_faults: AtomicUsize::new(0),
            targets_succeeded: AtomicUsize::new(0),
            targets_failed: AtomicUsize::new(0),
            total_attempt_time_ms: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_attempt(&self) {
        self.attempts_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_session_fault(&self) {
        self.session_faults.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_attempt_time(&self, duration: Duration) {
        self.total_attempt_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    /// Record the final result of one class
    pub fn record_target(&self, success: bool) {
        if success {
            self.targets_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.targets_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get total uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average attempt duration in milliseconds
    pub fn avg_attempt_time_ms(&self) -> f64 {
        let total = self.total_attempt_time_ms.load(Ordering::Relaxed);
        let count = self.attempts_started.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Run Metrics ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Classes: {} booked, {} failed",
            self.targets_succeeded.load(Ordering::Relaxed),
            self.targets_failed.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Attempts: {} (session faults: {}, avg: {:.0}ms)",
            self.attempts_started.load(Ordering::Relaxed),
            self.session_faults.load(Ordering::Relaxed),
            self.avg_attempt_time_ms()
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
