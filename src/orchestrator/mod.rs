//! Task lifecycle orchestration.
//!
//! This module owns the progress controller (start/cancel/poll), the UI state
//! it writes, and the refresh schedule that drives polling. Presentation layers
//! only read `UiState` and forward button actions.

mod controller;
mod schedule;
mod state;

pub(crate) use controller::{PollOutcome, ProgressController, Redraw};
pub(crate) use schedule::PollSchedule;
pub(crate) use state::UiState;
