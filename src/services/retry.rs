use crate::driver::{Page, SessionFactory};
use crate::metrics::Metrics;
use crate::models::{AttemptOutcome, TargetConfig, TargetResult};
use crate::services::booking::Registrar;
use std::sync::Arc;
use std::time::Instant;

/// An open automation session that is closed when the attempt ends.
///
/// [`SessionGuard::release`] closes the session and waits for it. A guard that
/// is dropped without being released (the attempt future was cancelled) hands
/// the close off to the runtime instead.
pub struct SessionGuard {
    page: Arc<dyn Page>,
    released: bool,
}

impl SessionGuard {
    pub fn new(page: Box<dyn Page>) -> Self {
        Self {
            page: Arc::from(page),
            released: false,
        }
    }

    pub fn page(&self) -> &dyn Page {
        &*self.page
    }

    /// Close the session. Close failures are logged and swallowed.
    pub async fn release(mut self) {
        self.released = true;
        if let Err(e) = self.page.close().await {
            tracing::warn!("Error closing browser: {}", e);
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let page = Arc::clone(&self.page);
                handle.spawn(async move {
                    if let Err(e) = page.close().await {
                        tracing::warn!("Error closing abandoned browser: {}", e);
                    }
                });
            }
            Err(_) => tracing::warn!("Session dropped outside the runtime and was not closed"),
        }
    }
}

/// Retry Orchestrator.
///
/// Runs up to `maxRetries + 1` attempts of the registration procedure for one
/// target. Every attempt gets a brand-new session from the factory, and that
/// session is closed before the attempt is over, whatever the outcome. The
/// loop stops early on success or on a failure that is not retryable; between
/// attempts it waits the target's fixed retry delay.
pub struct RetryHandler<F, R> {
    sessions: F,
    registrar: R,
    metrics: Arc<Metrics>,
}

impl<F: SessionFactory, R: Registrar> RetryHandler<F, R> {
    pub fn new(sessions: F, registrar: R) -> Self {
        Self::with_metrics(sessions, registrar, Arc::new(Metrics::new()))
    }

    pub fn with_metrics(sessions: F, registrar: R, metrics: Arc<Metrics>) -> Self {
        Self {
            sessions,
            registrar,
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Book one target, retrying transient failures
    pub async fn run_with_retry(&self, target: &TargetConfig) -> TargetResult {
        let policy = target.retry_policy;
        let allowed = policy.max_attempts();

        let mut last = AttemptOutcome::failed_retryable("No attempt was made");
        let mut used = 0;

        for attempt in 1..=allowed {
            used = attempt;
            tracing::info!("{}", "=".repeat(60));
            tracing::info!(
                "Attempt {}/{} for {} ({})",
                attempt,
                allowed,
                target.name,
                target.id
            );
            tracing::info!("{}", "=".repeat(60));

            let outcome = self.attempt(target).await;

            if outcome.is_success() {
                tracing::info!("✓ Success on attempt {}: {}", attempt, outcome.message());
                return TargetResult::new(target.clone(), outcome, used, allowed);
            }

            if !outcome.is_retryable() {
                tracing::warn!("✗ Non-retryable failure: {}", outcome.message());
                return TargetResult::new(target.clone(), outcome, used, allowed);
            }

            if attempt < allowed {
                tracing::info!(
                    "⟳ Attempt {} failed: {}. Retrying in {}ms...",
                    attempt,
                    outcome.message(),
                    policy.retry_delay_ms
                );
                tokio::time::sleep(policy.retry_delay()).await;
            } else {
                tracing::warn!(
                    "✗ Failed after {} attempts: {}",
                    allowed,
                    outcome.message()
                );
            }

            last = outcome;
        }

        TargetResult::new(target.clone(), last, used, allowed)
    }

    /// One attempt in its own session
    async fn attempt(&self, target: &TargetConfig) -> AttemptOutcome {
        self.metrics.record_attempt();
        let started = Instant::now();

        let session = match self.sessions.open().await {
            Ok(page) => SessionGuard::new(page),
            Err(e) => {
                self.metrics.record_session_fault();
                tracing::error!("Failed to open browser session: {}", e);
                return AttemptOutcome::failed_retryable(format!("Session error: {}", e))
                    .with_detail(format!("{:?}", e));
            }
        };

        let outcome = self.registrar.register(session.page(), target).await;
        session.release().await;

        self.metrics.record_attempt_time(started.elapsed());
        outcome
    }
}
