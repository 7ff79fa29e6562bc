//! Per-job edit options and encoding targets.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::crop::CropRect;

/// Audio bitrate applied whenever the audio track is kept.
pub const AUDIO_BITRATE_KBPS: u32 = 128;

/// Default x264 preset. Interactive latency beats compression
/// efficiency for this pipeline.
pub const DEFAULT_PRESET: &str = "ultrafast";

/// Output container, which fixes the codec pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Container {
    /// MP4: libx264 video + AAC audio
    Mp4,
    /// WebM: libvpx video + Vorbis audio
    Webm,
}

impl Container {
    pub fn video_codec(&self) -> &'static str {
        match self {
            Container::Mp4 => "libx264",
            Container::Webm => "libvpx",
        }
    }

    pub fn audio_codec(&self) -> &'static str {
        match self {
            Container::Mp4 => "aac",
            Container::Webm => "libvorbis",
        }
    }

    /// Name of the engine's output artifact.
    pub fn output_name(&self) -> &'static str {
        match self {
            Container::Mp4 => "output.mp4",
            Container::Webm => "output.webm",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Container::Mp4 => "video/mp4",
            Container::Webm => "video/webm",
        }
    }
}

/// Quality tier for the constant-quality pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Low,
    Medium,
    High,
}

impl QualityTier {
    /// Constant-quality parameter for the container's codec family.
    ///
    /// Lower tier means a larger CRF, which implies a smaller file at
    /// equal bitrate; both mappings are monotonic.
    pub fn crf(&self, container: Container) -> u8 {
        match container {
            Container::Mp4 => match self {
                QualityTier::Low => 32,
                QualityTier::Medium => 26,
                QualityTier::High => 20,
            },
            Container::Webm => match self {
                QualityTier::Low => 36,
                QualityTier::Medium => 24,
                QualityTier::High => 14,
            },
        }
    }
}

/// Immutable description of one transcode job, captured at job start.
///
/// Later UI edits never reach an in-flight job; the pipeline reads
/// this value and nothing else.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EditOptions {
    /// Maximum acceptable output size in bytes.
    pub budget_bytes: u64,
    /// Target container (implies the codec pairing).
    pub container: Container,
    /// Source frame width in pixels.
    pub source_width: u32,
    /// Source frame height in pixels.
    pub source_height: u32,
    /// Source duration in seconds.
    pub source_duration_secs: f64,
    /// Fractional crop rectangle; normalized by the pipeline.
    #[serde(default)]
    pub crop: CropRect,
    /// Trim window start in seconds (absent = 0).
    #[serde(default)]
    pub trim_start: Option<f64>,
    /// Trim window end in seconds (absent = full source duration).
    #[serde(default)]
    pub trim_end: Option<f64>,
    /// Playback speed multiplier (1.0 = unchanged).
    #[serde(default = "default_speed")]
    pub speed: f64,
    /// Number of times the trimmed clip plays (1 = no looping).
    #[serde(default = "default_loop_count")]
    pub loop_count: u32,
    /// Frame-rate cap (0 = unconstrained).
    #[serde(default)]
    pub fps_cap: u32,
    /// Quality tier for the constant-quality pass.
    pub quality: QualityTier,
    /// Whether to keep the audio track.
    #[serde(default = "default_audio")]
    pub audio: bool,
}

fn default_speed() -> f64 {
    1.0
}
fn default_loop_count() -> u32 {
    1
}
fn default_audio() -> bool {
    true
}

impl EditOptions {
    /// Create options for a full-frame, untrimmed job at medium quality.
    pub fn new(
        budget_bytes: u64,
        container: Container,
        source_width: u32,
        source_height: u32,
        source_duration_secs: f64,
    ) -> Self {
        Self {
            budget_bytes,
            container,
            source_width,
            source_height,
            source_duration_secs,
            crop: CropRect::full_frame(),
            trim_start: None,
            trim_end: None,
            speed: default_speed(),
            loop_count: default_loop_count(),
            fps_cap: 0,
            quality: QualityTier::Medium,
            audio: default_audio(),
        }
    }

    pub fn with_crop(mut self, crop: CropRect) -> Self {
        self.crop = crop;
        self
    }

    pub fn with_trim(mut self, start: f64, end: f64) -> Self {
        self.trim_start = Some(start);
        self.trim_end = Some(end);
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_loop_count(mut self, loop_count: u32) -> Self {
        self.loop_count = loop_count;
        self
    }

    pub fn with_fps_cap(mut self, fps_cap: u32) -> Self {
        self.fps_cap = fps_cap;
        self
    }

    pub fn with_quality(mut self, quality: QualityTier) -> Self {
        self.quality = quality;
        self
    }

    pub fn without_audio(mut self) -> Self {
        self.audio = false;
        self
    }

    /// Audio overhead subtracted from the byte budget before the
    /// video stream gets its share.
    pub fn audio_bitrate_kbps(&self) -> u32 {
        if self.audio {
            AUDIO_BITRATE_KBPS
        } else {
            0
        }
    }
}
