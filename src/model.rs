use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of one-interval steps the task counts through.
    pub steps: u32,
    #[serde(with = "humantime_duration")]
    pub step_interval: Duration,
    /// Step at which the simulated work fails, if any.
    #[serde(default)]
    pub fail_at: Option<u32>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            steps: 10,
            step_interval: Duration::from_secs(1),
            fail_at: None,
        }
    }
}

/// Events emitted by the task runner and drained by the progress controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TaskEvent {
    Tick { elapsed: u32, total: u32 },
    Completed,
    Cancelled,
    Failed { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskPhase {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl TaskPhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskPhase::Completed | TaskPhase::Cancelled | TaskPhase::Failed
        )
    }
}

mod humantime_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&humantime::format_duration(*d).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(d)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}
