use crate::driver::SessionFactory;
use crate::metrics::Metrics;
use crate::models::{RunSummary, TargetConfig};
use crate::services::booking::Registrar;
use crate::services::retry::RetryHandler;
use std::sync::Arc;
use std::time::Duration;

/// Books targets one after another.
///
/// Targets run strictly in the order given, each through the retry handler,
/// with a fixed pause between consecutive targets. A failed target never
/// stops the run.
pub struct Sequencer<F, R> {
    handler: RetryHandler<F, R>,
    between_targets: Duration,
}

impl<F: SessionFactory, R: Registrar> Sequencer<F, R> {
    pub fn new(handler: RetryHandler<F, R>, between_targets: Duration) -> Self {
        Self {
            handler,
            between_targets,
        }
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        self.handler.metrics()
    }

    /// Run every target and collect the results in order
    pub async fn run_all(&self, targets: &[TargetConfig]) -> RunSummary {
        let mut summary = RunSummary::new();

        if targets.is_empty() {
            tracing::info!("No classes to book");
            return summary;
        }

        tracing::info!("Booking {} class(es)", targets.len());

        for (index, target) in targets.iter().enumerate() {
            tracing::info!(
                "[{}/{}] {} - {} {}",
                index + 1,
                targets.len(),
                target.name,
                target.day_name,
                target.time_slot
            );

            let result = self.handler.run_with_retry(target).await;
            self.metrics().record_target(result.is_success());
            summary.push(result);

            if index + 1 < targets.len() && !self.between_targets.is_zero() {
                tracing::debug!(
                    "Waiting {}ms before next class",
                    self.between_targets.as_millis()
                );
                tokio::time::sleep(self.between_targets).await;
            }
        }

        summary
    }
}
