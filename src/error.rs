//! Failures raised inside a running task.
//!
//! None of these cross into the UI thread: the runner converts every one of
//! them into a `TaskEvent::Failed` carrying the rendered message.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("{0}")]
    Execution(String),

    #[error("worker panicked: {0}")]
    Panicked(String),
}

impl TaskError {
    /// Message shown to the user when the run fails.
    pub fn to_status(&self) -> String {
        format!("Error: {self}")
    }

    /// Build a `Panicked` error from a payload caught by `catch_unwind`.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let msg = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        TaskError::Panicked(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_prefixes_error() {
        let e = TaskError::Execution("disk on fire".into());
        assert_eq!(e.to_status(), "Error: disk on fire");
    }

    #[test]
    fn panic_payloads_are_rendered() {
        let e = TaskError::from_panic(Box::new("boom"));
        assert_eq!(e.to_status(), "Error: worker panicked: boom");
        let e = TaskError::from_panic(Box::new(String::from("owned")));
        assert_eq!(e.to_string(), "worker panicked: owned");
        let e = TaskError::from_panic(Box::new(42u8));
        assert_eq!(e.to_string(), "worker panicked: unknown panic payload");
    }
}
