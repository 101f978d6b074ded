//! Job slot identifiers, phases, and the polling snapshot.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier for one admitted run of the pipeline.
///
/// Generated when a submission is admitted, not when it completes, so
/// every slot mutation can be checked against the run that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    /// Generate a new random run ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque token binding a delivery request to one completed run's output.
///
/// Regenerated on every successful completion; download requests must
/// present the current value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultId(pub String);

impl ResultId {
    /// Generate a new random result ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ResultId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Phase of the single job slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    /// No run has been admitted yet
    #[default]
    Idle,
    /// A run is in flight
    Running,
    /// The last run completed and its result is available
    Completed,
    /// The last run failed; no result is available
    Failed,
}

impl JobPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobPhase::Idle => "idle",
            JobPhase::Running => "running",
            JobPhase::Completed => "completed",
            JobPhase::Failed => "failed",
        }
    }

    /// Whether a runner is currently executing against the slot.
    pub fn is_running(&self) -> bool {
        matches!(self, JobPhase::Running)
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobPhase::Completed | JobPhase::Failed)
    }
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of the slot for progress polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSnapshot {
    /// Progress percentage (0-100)
    pub progress: u8,
    /// Whether a run is in flight
    pub processing: bool,
    /// Error message from the last run, if it failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Options accepted with a swap submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapOptions {
    /// Requested number of target faces to receive the swapped source
    /// face. Clamped to the number of faces actually detected; zero means
    /// "enhance only".
    #[serde(default = "default_num_faces")]
    pub num_faces: u32,
}

fn default_num_faces() -> u32 {
    1
}

impl Default for SwapOptions {
    fn default() -> Self {
        Self {
            num_faces: default_num_faces(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(RunId::new(), RunId::new());
        assert_ne!(ResultId::new(), ResultId::new());
    }

    #[test]
    fn test_result_id_serde_transparent() {
        let id = ResultId::from_string("abc-123");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"abc-123\"");
    }

    #[test]
    fn test_phase_predicates() {
        assert!(JobPhase::Running.is_running());
        assert!(!JobPhase::Idle.is_running());
        assert!(JobPhase::Completed.is_terminal());
        assert!(JobPhase::Failed.is_terminal());
        assert!(!JobPhase::Running.is_terminal());
    }

    #[test]
    fn test_swap_options_default() {
        let opts: SwapOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts.num_faces, 1);
    }

    #[test]
    fn test_snapshot_skips_absent_error() {
        let snap = JobSnapshot {
            progress: 45,
            processing: true,
            error: None,
        };
        let json = serde_json::to_string(&snap).unwrap();
        assert_eq!(json, "{\"progress\":45,\"processing\":true}");
    }
}
