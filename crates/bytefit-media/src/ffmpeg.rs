//! FFmpeg-backed encoder engine.
//!
//! Each engine owns a private temp directory serving as the artifact
//! workspace; every `execute` spawns a fresh `ffmpeg` process inside
//! it, so a killed pass never poisons the engine for the next job.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::engine::{EncoderEngine, EngineEvent, EngineEventSink};
use crate::error::{EncodeError, EncodeResult};

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Explicit ffmpeg binary; discovered on PATH when absent.
    pub ffmpeg_path: Option<PathBuf>,
    /// Parent directory for the engine workspace; system temp dir
    /// when absent.
    pub work_dir: Option<PathBuf>,
    /// FFmpeg `-v` log level.
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            work_dir: None,
            log_level: "error".to_string(),
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            ffmpeg_path: std::env::var("BYTEFIT_FFMPEG").ok().map(PathBuf::from),
            work_dir: std::env::var("BYTEFIT_WORK_DIR").ok().map(PathBuf::from),
            log_level: std::env::var("BYTEFIT_FFMPEG_LOG_LEVEL")
                .unwrap_or_else(|_| "error".to_string()),
        }
    }
}

/// Encoder engine backed by the ffmpeg CLI.
pub struct FfmpegEngine {
    ffmpeg: PathBuf,
    workspace: TempDir,
    log_level: String,
}

impl FfmpegEngine {
    /// Locate ffmpeg and create the artifact workspace.
    pub fn init(config: EngineConfig) -> EncodeResult<Self> {
        let ffmpeg = match config.ffmpeg_path {
            Some(path) => path,
            None => which::which("ffmpeg").map_err(|_| EncodeError::FfmpegNotFound)?,
        };

        let workspace = match &config.work_dir {
            Some(dir) => TempDir::new_in(dir),
            None => TempDir::new(),
        }
        .map_err(|e| EncodeError::engine_init(format!("workspace creation failed: {e}")))?;

        info!(ffmpeg = %ffmpeg.display(), workspace = %workspace.path().display(), "engine ready");

        Ok(Self {
            ffmpeg,
            workspace,
            log_level: config.log_level,
        })
    }

    fn artifact_path(&self, name: &str) -> PathBuf {
        self.workspace.path().join(name)
    }
}

#[async_trait]
impl EncoderEngine for FfmpegEngine {
    async fn write_input(&self, name: &str, bytes: &[u8]) -> EncodeResult<()> {
        tokio::fs::write(self.artifact_path(name), bytes).await?;
        Ok(())
    }

    async fn execute(
        &self,
        argv: &[String],
        mut cancel: watch::Receiver<bool>,
        events: EngineEventSink,
    ) -> EncodeResult<()> {
        if *cancel.borrow() {
            return Err(EncodeError::Cancelled);
        }

        let mut args: Vec<String> = vec![
            "-v".to_string(),
            self.log_level.clone(),
            "-progress".to_string(),
            "pipe:2".to_string(),
        ];
        args.extend_from_slice(argv);

        debug!("running ffmpeg {}", args.join(" "));

        let mut child = Command::new(&self.ffmpeg)
            .args(&args)
            .current_dir(self.workspace.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let stderr = child.stderr.take().ok_or_else(|| {
            EncodeError::pass_failed("stderr not captured", None, None)
        })?;
        let mut reader = BufReader::new(stderr).lines();

        // Parse progress key/value records; collect everything else as
        // encoder log output for error reporting.
        let stderr_handle = tokio::spawn(async move {
            let mut log_lines: Vec<String> = Vec::new();
            let mut out_time_ms: i64 = 0;

            while let Ok(Some(line)) = reader.next_line().await {
                match parse_progress_line(&line, &mut out_time_ms) {
                    ParsedLine::Record => {
                        events(EngineEvent::Progress { out_time_ms });
                    }
                    ParsedLine::Field => {}
                    ParsedLine::Log => {
                        events(EngineEvent::Log { line: line.clone() });
                        log_lines.push(line);
                    }
                }
            }

            log_lines
        });

        let status = loop {
            tokio::select! {
                status = child.wait() => break status?,
                changed = cancel.changed() => match changed {
                    Ok(()) if *cancel.borrow() => {
                        info!("cancellation requested, killing ffmpeg");
                        let _ = child.kill().await;
                        let _ = stderr_handle.await;
                        return Err(EncodeError::Cancelled);
                    }
                    Ok(()) => {}
                    // Sender gone; nobody can cancel any more.
                    Err(_) => break child.wait().await?,
                },
            }
        };

        let log_lines = stderr_handle.await.unwrap_or_default();

        if status.success() {
            Ok(())
        } else {
            let stderr_tail = if log_lines.is_empty() {
                None
            } else {
                Some(log_lines.join("\n"))
            };
            Err(EncodeError::pass_failed(
                "ffmpeg exited with non-zero status",
                stderr_tail,
                status.code(),
            ))
        }
    }

    async fn read_output(&self, name: &str) -> EncodeResult<Vec<u8>> {
        match tokio::fs::read(self.artifact_path(name)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(EncodeError::ArtifactMissing(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, name: &str) -> EncodeResult<()> {
        match tokio::fs::remove_file(self.artifact_path(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn shutdown(&self) -> EncodeResult<()> {
        if let Err(e) = tokio::fs::remove_dir_all(self.workspace.path()).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("workspace cleanup failed: {e}");
            }
        }
        Ok(())
    }
}

enum ParsedLine {
    /// End of one progress record (`progress=continue|end`).
    Record,
    /// A progress field that updated parser state.
    Field,
    /// Anything else: encoder log output.
    Log,
}

/// Parse one line of FFmpeg's `-progress pipe:2` output.
fn parse_progress_line(line: &str, out_time_ms: &mut i64) -> ParsedLine {
    let line = line.trim();

    if let Some((key, value)) = line.split_once('=') {
        match key {
            "out_time_ms" | "out_time_us" => {
                // Both keys carry microseconds in practice.
                if let Ok(us) = value.parse::<i64>() {
                    *out_time_ms = us / 1000;
                }
                ParsedLine::Field
            }
            "out_time" | "frame" | "fps" | "bitrate" | "total_size" | "speed" | "dup_frames"
            | "drop_frames" | "stream_0_0_q" => ParsedLine::Field,
            "progress" => ParsedLine::Record,
            _ => ParsedLine::Log,
        }
    } else {
        ParsedLine::Log
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_parsing() {
        let mut out_time_ms = 0;

        assert!(matches!(
            parse_progress_line("out_time_ms=5000000", &mut out_time_ms),
            ParsedLine::Field
        ));
        assert_eq!(out_time_ms, 5000);

        assert!(matches!(
            parse_progress_line("progress=continue", &mut out_time_ms),
            ParsedLine::Record
        ));
        assert!(matches!(
            parse_progress_line("progress=end", &mut out_time_ms),
            ParsedLine::Record
        ));
    }

    #[test]
    fn test_non_progress_lines_are_log() {
        let mut out_time_ms = 0;
        assert!(matches!(
            parse_progress_line("input.dat: Invalid data found", &mut out_time_ms),
            ParsedLine::Log
        ));
    }

    #[test]
    fn test_config_defaults() {
        let config = EngineConfig::default();
        assert!(config.ffmpeg_path.is_none());
        assert!(config.work_dir.is_none());
        assert_eq!(config.log_level, "error");
    }
}
