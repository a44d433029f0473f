//! Background task execution.
//!
//! The runner owns no UI state. Everything it has to say goes through the
//! event channel handed to [`TaskRunner::start`].

mod worker;

use crate::model::{RunConfig, TaskEvent};
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct TaskRunner {
    cfg: RunConfig,
    runtime: Handle,
}

impl TaskRunner {
    pub fn new(cfg: RunConfig, runtime: Handle) -> Self {
        Self { cfg, runtime }
    }

    pub fn config(&self) -> &RunConfig {
        &self.cfg
    }

    /// Spawn a worker on the runtime and return its handle.
    pub fn start(&self, event_tx: UnboundedSender<TaskEvent>) -> TaskHandle {
        let cancel = CancellationToken::new();
        let worker = worker::Worker {
            cfg: self.cfg.clone(),
            cancel: cancel.clone(),
            event_tx,
            #[cfg(test)]
            panic_at: None,
        };
        let join = self.runtime.spawn(worker.run());
        TaskHandle {
            cancel,
            join,
            runtime: self.runtime.clone(),
        }
    }

    pub fn stop(handle: &TaskHandle) {
        handle.stop();
    }
}

/// Handle to a running worker: cancellation signal plus liveness.
#[derive(Debug)]
pub struct TaskHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
    runtime: Handle,
}

impl TaskHandle {
    /// Wrap an already-spawned task that is not driven by a `Worker`.
    #[cfg(test)]
    pub(crate) fn from_join(join: JoinHandle<()>, runtime: Handle) -> Self {
        Self {
            cancel: CancellationToken::new(),
            join,
            runtime,
        }
    }

    /// Request cooperative cancellation. Never blocks; repeated calls are harmless.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stop_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_alive(&self) -> bool {
        !self.join.is_finished()
    }

    /// Block the calling thread until the worker has exited.
    ///
    /// Must be called from outside the runtime's async context (the UI thread
    /// or a `spawn_blocking` closure).
    pub fn join(self) {
        if let Err(e) = self.runtime.block_on(self.join) {
            tracing::warn!(error = %e, "task worker join failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;

    async fn join(handle: TaskHandle) {
        tokio::task::spawn_blocking(move || handle.join())
            .await
            .unwrap();
    }

    fn runner(steps: u32, step_ms: u64) -> TaskRunner {
        TaskRunner::new(
            RunConfig {
                steps,
                step_interval: Duration::from_millis(step_ms),
                fail_at: None,
            },
            Handle::current(),
        )
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stop_is_idempotent() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = runner(10, 50).start(tx);
        TaskRunner::stop(&handle);
        TaskRunner::stop(&handle);
        assert!(handle.is_stop_requested());
        join(handle).await;

        let mut terminals = 0;
        while let Ok(ev) = rx.try_recv() {
            if !matches!(ev, TaskEvent::Tick { .. }) {
                assert_eq!(ev, TaskEvent::Cancelled);
                terminals += 1;
            }
        }
        assert_eq!(terminals, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stop_wakes_a_sleeping_worker() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = runner(10, 10_000).start(tx);
        let first = rx.recv().await;
        assert_eq!(
            first,
            Some(TaskEvent::Tick {
                elapsed: 1,
                total: 10
            })
        );
        handle.stop();
        tokio::time::timeout(Duration::from_secs(2), join(handle))
            .await
            .expect("worker should exit promptly after stop");
        assert_eq!(rx.recv().await, Some(TaskEvent::Cancelled));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn liveness_tracks_worker_exit() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = runner(1, 1).start(tx);
        while let Some(ev) = rx.recv().await {
            if ev == TaskEvent::Completed {
                break;
            }
        }
        for _ in 0..100 {
            if !handle.is_alive() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(!handle.is_alive());
    }
}
