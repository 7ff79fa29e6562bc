//! Job lifecycle phases and typed pipeline events.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::options::{Container, EditOptions};

/// Lifecycle phase of a transcode job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    /// No job running
    Idle,
    /// Preparing the engine and staging the input
    Loading,
    /// Constant-quality pass
    EncodingPrimary,
    /// Comparing produced size against the byte budget
    SizeCheck,
    /// Bitrate-targeted corrective pass
    EncodingCorrective,
    /// Collecting the output artifact
    Finalizing,
    /// Output ready
    Done,
    /// Job cancelled by the caller
    Cancelled,
    /// Job failed
    Failed,
}

impl JobPhase {
    /// Terminal phases accept no further events for the job.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobPhase::Done | JobPhase::Cancelled | JobPhase::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobPhase::Idle => "idle",
            JobPhase::Loading => "loading",
            JobPhase::EncodingPrimary => "encoding_primary",
            JobPhase::SizeCheck => "size_check",
            JobPhase::EncodingCorrective => "encoding_corrective",
            JobPhase::Finalizing => "finalizing",
            JobPhase::Done => "done",
            JobPhase::Cancelled => "cancelled",
            JobPhase::Failed => "failed",
        }
    }
}

/// Event envelope emitted by a running job.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEvent {
    /// Log line with timestamp
    Log {
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Overall progress (0.0 to 1.0), monotone within a job
    Progress { value: f64 },

    /// Phase transition
    Phase { phase: JobPhase },

    /// Error description
    Error {
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Output ready
    Done {
        #[serde(rename = "sizeBytes")]
        size_bytes: u64,
        container: Container,
        passes: u32,
    },
}

impl JobEvent {
    /// Create a log event.
    pub fn log(message: impl Into<String>) -> Self {
        JobEvent::Log {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a progress event, clamped into the unit interval.
    pub fn progress(value: f64) -> Self {
        JobEvent::Progress {
            value: value.max(0.0).min(1.0),
        }
    }

    /// Create a phase transition event.
    pub fn phase(phase: JobPhase) -> Self {
        JobEvent::Phase { phase }
    }

    /// Create an error event.
    pub fn error(message: impl Into<String>) -> Self {
        JobEvent::Error {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a done event.
    pub fn done(size_bytes: u64, options: &EditOptions, passes: u32) -> Self {
        JobEvent::Done {
            size_bytes,
            container: options.container,
            passes,
        }
    }
}
