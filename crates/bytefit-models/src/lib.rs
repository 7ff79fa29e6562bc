//! Shared data models for the bytefit backend.
//!
//! This crate provides Serde-serializable types for:
//! - Crop rectangles (fractional and pixel)
//! - Per-job edit options, containers and quality tiers
//! - Job phases and typed progress/log events
//! - Byte formatting for user-facing log lines

pub mod crop;
pub mod events;
pub mod format;
pub mod options;
pub mod timing;

// Re-export common types
pub use crop::{CropRect, PixelRect};
pub use events::{JobEvent, JobPhase};
pub use format::pretty_bytes;
pub use options::{Container, EditOptions, QualityTier, AUDIO_BITRATE_KBPS};
