use crate::error::TaskError;
use crate::model::{RunConfig, TaskEvent};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

/// How the step loop ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepsOutcome {
    Finished,
    Cancelled,
}

pub(super) struct Worker {
    pub cfg: RunConfig,
    pub cancel: CancellationToken,
    pub event_tx: UnboundedSender<TaskEvent>,
    /// Step whose body panics instead of ticking.
    #[cfg(test)]
    pub panic_at: Option<u32>,
}

impl Worker {
    /// Run the countdown and always finish with exactly one terminal event.
    pub async fn run(self) {
        tracing::info!(steps = self.cfg.steps, "task worker started");

        let outcome = AssertUnwindSafe(self.run_steps())
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(TaskError::from_panic(payload)));

        let terminal = match outcome {
            Ok(StepsOutcome::Finished) => {
                tracing::info!("task worker completed");
                TaskEvent::Completed
            }
            Ok(StepsOutcome::Cancelled) => {
                tracing::info!("task worker observed cancellation");
                TaskEvent::Cancelled
            }
            Err(e) => {
                tracing::warn!(error = %e, "task worker failed");
                TaskEvent::Failed {
                    message: e.to_status(),
                }
            }
        };
        // The controller may already have dropped the receiver after a user cancel.
        let _ = self.event_tx.send(terminal);
    }

    async fn run_steps(&self) -> Result<StepsOutcome, TaskError> {
        let cfg = &self.cfg;
        for second in 1..=cfg.steps {
            if self.cancel.is_cancelled() {
                return Ok(StepsOutcome::Cancelled);
            }
            if cfg.fail_at == Some(second) {
                return Err(TaskError::Execution(format!(
                    "simulated failure at step {second}"
                )));
            }
            #[cfg(test)]
            if self.panic_at == Some(second) {
                panic!("step {second} blew up");
            }

            let _ = self.event_tx.send(TaskEvent::Tick {
                elapsed: second,
                total: cfg.steps,
            });
            tracing::debug!(elapsed = second, total = cfg.steps, "tick");

            // A stop wakes the sleep early; the flag is still only honoured at the step boundary.
            tokio::select! {
                _ = tokio::time::sleep(cfg.step_interval) => {}
                _ = self.cancel.cancelled() => {}
            }
        }
        Ok(StepsOutcome::Finished)
    }
}
