use crate::model::{TaskEvent, TaskPhase};
use crate::runner::TaskHandle;

pub const STATUS_READY: &str = "Ready";
pub const STATUS_WORKING: &str = "Working...";
pub const STATUS_DONE: &str = "Done";
pub const STATUS_CANCELLED: &str = "Cancelled";
pub const STATUS_WORKER_VANISHED: &str = "Error: worker exited without reporting";

/// Ticks never fill the bar; only `Completed` does.
const TICK_PROGRESS_CEILING: f64 = 0.99;

/// Display state for one UI session. Only the controller writes to it.
#[derive(Debug)]
pub struct UiState {
    pub status: String,
    pub progress: f64,
    pub start_enabled: bool,
    pub cancel_enabled: bool,
    pub phase: TaskPhase,
    pub active_handle: Option<TaskHandle>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            status: STATUS_READY.into(),
            progress: 0.0,
            start_enabled: true,
            cancel_enabled: false,
            phase: TaskPhase::Idle,
            active_handle: None,
        }
    }
}

/// What applying one event did to the state.
#[derive(Debug)]
pub enum Transition {
    /// Event arrived while no run was in progress.
    Ignored,
    Updated,
    /// The run ended; the released handle still has to be joined.
    Settled(Option<TaskHandle>),
}

impl UiState {
    pub fn has_active_task(&self) -> bool {
        self.active_handle.is_some()
    }

    pub(crate) fn begin(&mut self, handle: TaskHandle) {
        self.phase = TaskPhase::Running;
        self.status = STATUS_WORKING.into();
        self.progress = 0.0;
        self.start_enabled = false;
        self.cancel_enabled = true;
        self.active_handle = Some(handle);
    }

    /// Enter a terminal phase and hand back the handle for reaping.
    pub(crate) fn settle(&mut self, phase: TaskPhase, status: String) -> Option<TaskHandle> {
        debug_assert!(phase.is_terminal());
        self.phase = phase;
        self.status = status;
        self.start_enabled = true;
        self.cancel_enabled = false;
        if phase == TaskPhase::Cancelled {
            self.progress = 0.0;
        }
        self.active_handle.take()
    }
}

pub fn tick_progress(elapsed: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (f64::from(elapsed) / f64::from(total)).clamp(0.0, TICK_PROGRESS_CEILING)
}

pub fn tick_status(elapsed: u32, total: u32) -> String {
    format!("{STATUS_WORKING} {elapsed}/{total}s")
}

/// Apply a drained runner event. Events outside `Running` are late and dropped.
pub fn apply_event(state: &mut UiState, ev: &TaskEvent) -> Transition {
    if state.phase != TaskPhase::Running {
        return Transition::Ignored;
    }
    match ev {
        TaskEvent::Tick { elapsed, total } => {
            state.progress = tick_progress(*elapsed, *total);
            state.status = tick_status(*elapsed, *total);
            Transition::Updated
        }
        TaskEvent::Completed => {
            state.progress = 1.0;
            Transition::Settled(state.settle(TaskPhase::Completed, STATUS_DONE.into()))
        }
        TaskEvent::Cancelled => {
            Transition::Settled(state.settle(TaskPhase::Cancelled, STATUS_CANCELLED.into()))
        }
        TaskEvent::Failed { message } => {
            Transition::Settled(state.settle(TaskPhase::Failed, message.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running() -> UiState {
        UiState {
            phase: TaskPhase::Running,
            status: STATUS_WORKING.into(),
            start_enabled: false,
            cancel_enabled: true,
            ..Default::default()
        }
    }

    #[test]
    fn defaults_match_a_fresh_session() {
        let s = UiState::default();
        assert_eq!(s.status, "Ready");
        assert_eq!(s.progress, 0.0);
        assert!(s.start_enabled);
        assert!(!s.cancel_enabled);
        assert_eq!(s.phase, TaskPhase::Idle);
        assert!(!s.has_active_task());
    }

    #[test]
    fn ticks_update_progress_and_status() {
        let mut s = running();
        let t = apply_event(
            &mut s,
            &TaskEvent::Tick {
                elapsed: 3,
                total: 10,
            },
        );
        assert!(matches!(t, Transition::Updated));
        assert!((s.progress - 0.3).abs() < 1e-9);
        assert_eq!(s.status, "Working... 3/10s");
        assert_eq!(s.phase, TaskPhase::Running);
    }

    #[test]
    fn last_tick_stays_below_full() {
        assert!(tick_progress(10, 10) < 1.0);
        assert_eq!(tick_progress(0, 0), 0.0);
    }

    #[test]
    fn completed_fills_the_bar_and_reenables_start() {
        let mut s = running();
        s.progress = 0.9;
        let t = apply_event(&mut s, &TaskEvent::Completed);
        assert!(matches!(t, Transition::Settled(None)));
        assert_eq!(s.progress, 1.0);
        assert_eq!(s.status, "Done");
        assert!(s.start_enabled);
        assert!(!s.cancel_enabled);
        assert_eq!(s.phase, TaskPhase::Completed);
    }

    #[test]
    fn self_reported_cancel_resets_progress() {
        let mut s = running();
        s.progress = 0.4;
        apply_event(&mut s, &TaskEvent::Cancelled);
        assert_eq!(s.progress, 0.0);
        assert_eq!(s.status, "Cancelled");
        assert_eq!(s.phase, TaskPhase::Cancelled);
    }

    #[test]
    fn failure_shows_message() {
        let mut s = running();
        s.progress = 0.4;
        apply_event(
            &mut s,
            &TaskEvent::Failed {
                message: "Error: boom".into(),
            },
        );
        assert_eq!(s.status, "Error: boom");
        assert_eq!(s.progress, 0.4);
        assert!(s.start_enabled);
        assert!(!s.cancel_enabled);
        assert_eq!(s.phase, TaskPhase::Failed);
    }

    #[test]
    fn late_events_after_terminal_are_ignored() {
        let mut s = running();
        apply_event(&mut s, &TaskEvent::Cancelled);
        let t = apply_event(
            &mut s,
            &TaskEvent::Tick {
                elapsed: 4,
                total: 10,
            },
        );
        assert!(matches!(t, Transition::Ignored));
        assert!(matches!(
            apply_event(&mut s, &TaskEvent::Completed),
            Transition::Ignored
        ));
        assert_eq!(s.status, "Cancelled");
        assert_eq!(s.progress, 0.0);
    }

    #[test]
    fn idle_state_ignores_events() {
        let mut s = UiState::default();
        assert!(matches!(
            apply_event(&mut s, &TaskEvent::Completed),
            Transition::Ignored
        ));
        assert_eq!(s.status, "Ready");
    }
}
