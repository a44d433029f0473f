//! Run lifecycle controller.
//!
//! Owns the UI-facing state, turns start/cancel actions into runner calls, and
//! drains runner events once per refresh.

use super::state::{self, apply_event, Transition, UiState};
use crate::model::{TaskEvent, TaskPhase};
use crate::runner::{TaskHandle, TaskRunner};
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver};
use tokio::time::Duration;

/// What the caller should do after a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The worker is still running; poll again after the delay.
    Reschedule(Duration),
    Settled,
}

/// Why the controller asked for a redraw.
#[derive(Debug, Clone, Copy)]
pub enum Redraw<'a> {
    Applied(&'a TaskEvent),
    /// The worker exited and was joined during reconciliation.
    Reconciled,
}

pub struct ProgressController {
    state: UiState,
    runner: TaskRunner,
    events: Option<UnboundedReceiver<TaskEvent>>,
    poll_interval: Duration,
}

impl ProgressController {
    pub fn new(runner: TaskRunner, poll_interval: Duration) -> Self {
        Self {
            state: UiState::default(),
            runner,
            events: None,
            poll_interval,
        }
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    /// Launch a run on a fresh channel. Returns false (and does nothing) if one is active.
    pub fn start(&mut self) -> bool {
        if self.state.has_active_task() {
            tracing::debug!("start ignored: a task is already running");
            return false;
        }
        let (event_tx, event_rx) = mpsc::unbounded_channel::<TaskEvent>();
        let handle = self.runner.start(event_tx);
        self.events = Some(event_rx);
        self.state.begin(handle);
        tracing::info!(steps = self.runner.config().steps, "task started");
        true
    }

    /// Stop the active run and wait for the worker to exit. No-op when idle.
    pub fn cancel(&mut self) -> bool {
        let Some(handle) = self.state.active_handle.take() else {
            tracing::debug!("cancel ignored: no active task");
            return false;
        };
        if handle.is_stop_requested() {
            tracing::debug!("stop was already requested");
        }
        TaskRunner::stop(&handle);
        handle.join();
        // Anything the worker sent after the stop belongs to a finished run.
        self.events = None;
        self.state
            .settle(TaskPhase::Cancelled, state::STATUS_CANCELLED.into());
        tracing::info!("task cancelled by user");
        true
    }

    /// Drain pending events, calling `render` after each one that changed state.
    pub fn poll<F>(&mut self, mut render: F) -> PollOutcome
    where
        F: FnMut(Redraw<'_>, &UiState),
    {
        self.drain(&mut render);

        let alive = self.state.active_handle.as_ref().map(TaskHandle::is_alive);
        match alive {
            Some(true) => PollOutcome::Reschedule(self.poll_interval),
            Some(false) => {
                self.reconcile(&mut render);
                PollOutcome::Settled
            }
            None => PollOutcome::Settled,
        }
    }

    /// Cancel and reap any active run before the UI goes away.
    pub fn shutdown(&mut self) {
        if self.cancel() {
            tracing::info!("active task stopped on shutdown");
        }
    }

    /// Returns true if a terminal event was applied (and rendered).
    fn drain<F>(&mut self, render: &mut F) -> bool
    where
        F: FnMut(Redraw<'_>, &UiState),
    {
        let Some(rx) = self.events.as_mut() else {
            return false;
        };
        let mut finished = false;
        let mut settled = false;
        loop {
            let ev = match rx.try_recv() {
                Ok(ev) => ev,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    finished = true;
                    break;
                }
            };
            match apply_event(&mut self.state, &ev) {
                Transition::Ignored => continue,
                Transition::Updated => {}
                Transition::Settled(released) => {
                    if let Some(handle) = released {
                        reap(handle);
                    }
                    tracing::info!(status = %self.state.status, "task finished");
                    finished = true;
                    settled = true;
                }
            }
            render(Redraw::Applied(&ev), &self.state);
            if finished {
                break;
            }
        }
        if finished {
            self.events = None;
        }
        settled
    }

    /// The worker is gone but its handle was never released by a terminal event.
    fn reconcile<F>(&mut self, render: &mut F)
    where
        F: FnMut(Redraw<'_>, &UiState),
    {
        if let Some(handle) = self.state.active_handle.take() {
            reap(handle);
        }
        // Joining guarantees every send the worker made is now buffered.
        let settled = self.drain(render);
        self.events = None;
        if settled {
            // The terminal event's own redraw was the final one.
            return;
        }
        if self.state.phase == TaskPhase::Running {
            tracing::warn!("task worker exited without a terminal event");
            self.state
                .settle(TaskPhase::Failed, state::STATUS_WORKER_VANISHED.into());
        }
        render(Redraw::Reconciled, &self.state);
    }
}

fn reap(handle: TaskHandle) {
    handle.join();
}
