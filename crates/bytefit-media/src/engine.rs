//! Encoder engine port.
//!
//! The pipeline drives the encoder through this trait so orchestrator
//! tests can substitute a scripted engine for the real FFmpeg process.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::EncodeResult;

/// Event emitted by the engine while a pass runs.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Encoded output position, in milliseconds of output time.
    Progress { out_time_ms: i64 },
    /// Raw encoder log line.
    Log { line: String },
}

/// Callback type for engine events.
pub type EngineEventSink = Box<dyn Fn(EngineEvent) + Send + Sync>;

/// A single-job encoder with a private artifact workspace.
///
/// Artifacts are addressed by name, not path; the engine decides
/// where they live. Only one `execute` may be in flight at a time.
#[async_trait]
pub trait EncoderEngine: Send + Sync {
    /// Stage input bytes under the given artifact name.
    async fn write_input(&self, name: &str, bytes: &[u8]) -> EncodeResult<()>;

    /// Run one encoder pass. Flipping `cancel` to `true` terminates
    /// the pass and surfaces [`EncodeError::Cancelled`].
    ///
    /// [`EncodeError::Cancelled`]: crate::error::EncodeError::Cancelled
    async fn execute(
        &self,
        argv: &[String],
        cancel: watch::Receiver<bool>,
        events: EngineEventSink,
    ) -> EncodeResult<()>;

    /// Read a produced artifact.
    async fn read_output(&self, name: &str) -> EncodeResult<Vec<u8>>;

    /// Delete an artifact. Missing artifacts are not an error.
    async fn remove(&self, name: &str) -> EncodeResult<()>;

    /// Release the engine workspace.
    async fn shutdown(&self) -> EncodeResult<()>;
}
