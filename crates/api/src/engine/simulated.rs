//! Development stand-in for the real generation backends.
//!
//! Walks each claimed job through the standard progress phases with a
//! short delay between steps and resolves with a payload echo. Bound to
//! the queues by the binary so the full pipeline (submit → progress
//! events → terminal status) is observable without any external
//! generation service; production deployments bind their own
//! [`Processor`] implementations instead.

use std::time::Duration;

use async_trait::async_trait;

use pulsefit_core::JobRecord;
use pulsefit_queue::{Processor, ProgressReporter};

/// Milestones reported while "generating", matching the phase message
/// thresholds clients display.
const PROGRESS_STEPS: [u8; 4] = [10, 50, 90, 100];

pub struct SimulatedProcessor {
    step_delay: Duration,
}

impl SimulatedProcessor {
    pub fn new() -> Self {
        Self {
            step_delay: Duration::from_millis(500),
        }
    }

    pub fn with_step_delay(step_delay: Duration) -> Self {
        Self { step_delay }
    }
}

impl Default for SimulatedProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Processor for SimulatedProcessor {
    async fn process(
        &self,
        record: &JobRecord,
        reporter: &dyn ProgressReporter,
    ) -> Result<serde_json::Value, String> {
        for step in PROGRESS_STEPS {
            tokio::time::sleep(self.step_delay).await;
            reporter.report(step).await;
        }

        Ok(serde_json::json!({
            "capability": record.capability,
            "owner_id": record.owner_id,
            "input": record.payload,
            "simulated": true,
        }))
    }
}
