#![deny(unreachable_patterns)]
//! Size-constrained FFmpeg transcoding pipeline.
//!
//! This crate provides:
//! - An encoder engine trait with an FFmpeg CLI implementation
//! - Bitrate planning from a byte budget
//! - Audio tempo decomposition into bounded `atempo` stages
//! - Per-pass argument construction
//! - A two-pass orchestrator with progress, cancellation and cleanup

pub mod args;
pub mod engine;
pub mod error;
pub mod ffmpeg;
pub mod pipeline;
pub mod plan;
pub mod tempo;

pub use args::{EncodeArgs, Pass};
pub use engine::{EncoderEngine, EngineEvent, EngineEventSink};
pub use error::{EncodeError, EncodeResult};
pub use ffmpeg::{EngineConfig, FfmpegEngine};
pub use pipeline::Transcoder;
pub use plan::{ceiling_bitrate_kbps, corrective_bitrate_kbps, target_bitrate_kbps};
pub use tempo::atempo_chain;
