use crate::models::TargetConfig;

/// Result of a single registration attempt
///
/// Built only through the constructors below, which keep a successful outcome
/// from ever being marked retryable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptOutcome {
    success: bool,
    message: String,
    is_retryable: bool,
    detail: Option<String>,
}

impl AttemptOutcome {
    /// Booked, or already holding a seat
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            is_retryable: false,
            detail: None,
        }
    }

    /// Failure that another attempt cannot fix (class full, explicit error)
    pub fn failed_terminal(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            is_retryable: false,
            detail: None,
        }
    }

    /// Failure that may be transient
    pub fn failed_retryable(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            is_retryable: true,
            detail: None,
        }
    }

    /// Failure whose retryability was decided elsewhere
    pub fn failed(message: impl Into<String>, is_retryable: bool) -> Self {
        if is_retryable {
            Self::failed_retryable(message)
        } else {
            Self::failed_terminal(message)
        }
    }

    /// Attach captured failure detail (error chain, page text excerpt)
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn is_retryable(&self) -> bool {
        self.is_retryable
    }

    /// Success or a failure that must not be retried
    pub fn is_final(&self) -> bool {
        self.success || !self.is_retryable
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

/// Final result for one class after the retry loop stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetResult {
    pub target: TargetConfig,
    pub outcome: AttemptOutcome,
    pub attempts_used: u32,
    pub attempts_allowed: u32,
}

impl TargetResult {
    pub fn new(
        target: TargetConfig,
        outcome: AttemptOutcome,
        attempts_used: u32,
        attempts_allowed: u32,
    ) -> Self {
        debug_assert!(attempts_used <= attempts_allowed);
        Self {
            target,
            outcome,
            attempts_used,
            attempts_allowed,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// True when the loop ran out of attempts on retryable failures
    pub fn exhausted(&self) -> bool {
        !self.outcome.is_final() && self.attempts_used == self.attempts_allowed
    }
}

/// Ordered results of one run, one entry per processed class
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    results: Vec<TargetResult>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: TargetResult) {
        self.results.push(result);
    }

    pub fn results(&self) -> &[TargetResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    /// An empty run counts as successful
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(TargetResult::is_success)
    }

    /// Log one line per class followed by the totals
    pub fn log_report(&self) {
        tracing::info!("=== Booking Summary ===");
        for result in &self.results {
            let mark = if result.is_success() { "✓" } else { "✗" };
            tracing::info!(
                "{} {} ({} {}) - {} [attempt {}/{}]",
                mark,
                result.target.name,
                result.target.day_name,
                result.target.time_slot,
                result.outcome.message(),
                result.attempts_used,
                result.attempts_allowed
            );
        }
        tracing::info!(
            "Total: {} booked, {} failed",
            self.succeeded(),
            self.failed()
        );
    }
}
