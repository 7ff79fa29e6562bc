//! Per-pass FFmpeg argument construction.
//!
//! Arguments are rebuilt for every pass because the rate-control flags
//! differ: the quality pass carries a CRF plus a soft ceiling, the
//! corrective pass an explicit average bitrate and no CRF.

use bytefit_models::{EditOptions, PixelRect, Container, options::DEFAULT_PRESET};

use crate::tempo::atempo_chain;

/// Rate-control parameters for one encoder invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Constant-quality pass with a soft bitrate ceiling.
    Quality { crf: u8, ceiling_kbps: u32 },
    /// Bitrate-targeted corrective pass.
    Corrective { bitrate_kbps: u32 },
}

/// Builder for one job's encoder argument lists.
///
/// Everything except the rate control is fixed across passes, so the
/// builder is constructed once per job and queried once per pass.
#[derive(Debug, Clone)]
pub struct EncodeArgs {
    input: String,
    output: String,
    container: Container,
    crop: PixelRect,
    trim_start: f64,
    trim_duration: Option<f64>,
    speed: f64,
    loop_count: u32,
    fps_cap: u32,
    audio: bool,
    audio_kbps: u32,
}

impl EncodeArgs {
    pub fn new(options: &EditOptions, input: impl Into<String>) -> Self {
        let (start, end) = options.trim_window();
        // -t only when the trim actually shortens the clip.
        let trim_duration = match options.trim_end {
            Some(end_secs) if end_secs > 0.0 && end_secs < options.source_duration_secs => {
                let dur = end - start;
                (dur > 0.0).then_some(dur)
            }
            _ => None,
        };

        Self {
            input: input.into(),
            output: options.container.output_name().to_string(),
            container: options.container,
            crop: options
                .crop
                .normalize()
                .to_pixels(options.source_width, options.source_height),
            trim_start: start,
            trim_duration,
            speed: options.speed,
            loop_count: options.loop_count,
            fps_cap: options.fps_cap,
            audio: options.audio,
            audio_kbps: options.audio_bitrate_kbps(),
        }
    }

    /// Name of the output artifact in the engine workspace.
    pub fn output_name(&self) -> &str {
        &self.output
    }

    /// Comma-joined video filter chain: crop, then time scale, then
    /// frame-rate cap.
    fn video_filter(&self) -> String {
        let mut filters = vec![self.crop.to_crop_filter()];
        if self.speed != 1.0 {
            filters.push(format!("setpts={:.4}*PTS", 1.0 / self.speed));
        }
        if self.fps_cap > 0 {
            filters.push(format!("fps={}", self.fps_cap));
        }
        filters.join(",")
    }

    /// Build the argument list for one pass.
    pub fn build(&self, pass: Pass) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();

        if self.loop_count > 1 {
            args.push("-stream_loop".into());
            args.push((self.loop_count - 1).to_string());
        }
        if self.trim_start > 0.0 {
            args.push("-ss".into());
            args.push(format!("{:.3}", self.trim_start));
        }
        args.push("-i".into());
        args.push(self.input.clone());
        if let Some(dur) = self.trim_duration {
            args.push("-t".into());
            args.push(format!("{:.3}", dur));
        }

        args.push("-vf".into());
        args.push(self.video_filter());

        args.push("-c:v".into());
        args.push(self.container.video_codec().into());
        if self.container == Container::Mp4 {
            args.push("-preset".into());
            args.push(DEFAULT_PRESET.into());
        }

        match pass {
            Pass::Quality { crf, ceiling_kbps } => {
                args.push("-crf".into());
                args.push(crf.to_string());
                match self.container {
                    // x264 honors CRF with a soft ceiling.
                    Container::Mp4 => {
                        args.push("-maxrate".into());
                        args.push(format!("{}k", ceiling_kbps));
                        args.push("-bufsize".into());
                        args.push(format!("{}k", ceiling_kbps * 2));
                    }
                    // libvpx treats -crf + -b:v as constrained quality.
                    Container::Webm => {
                        args.push("-b:v".into());
                        args.push(format!("{}k", ceiling_kbps));
                    }
                }
            }
            Pass::Corrective { bitrate_kbps } => {
                args.push("-b:v".into());
                args.push(format!("{}k", bitrate_kbps));
                if self.container == Container::Mp4 {
                    args.push("-maxrate".into());
                    args.push(format!("{}k", (bitrate_kbps as f64 * 1.1).round() as u32));
                    args.push("-bufsize".into());
                    args.push(format!("{}k", bitrate_kbps * 2));
                }
            }
        }

        if self.audio {
            let tempo = atempo_chain(self.speed);
            if !tempo.is_empty() {
                args.push("-af".into());
                args.push(tempo.join(","));
            }
            args.push("-c:a".into());
            args.push(self.container.audio_codec().into());
            args.push("-b:a".into());
            args.push(format!("{}k", self.audio_kbps));
        } else {
            args.push("-an".into());
        }

        if self.container == Container::Mp4 {
            args.push("-movflags".into());
            args.push("+faststart".into());
        }

        args.push("-y".into());
        args.push(self.output.clone());

        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytefit_models::{CropRect, QualityTier};

    fn options() -> EditOptions {
        EditOptions::new(513_802, Container::Mp4, 320, 240, 3.0)
    }

    fn index_of(args: &[String], flag: &str) -> usize {
        args.iter().position(|a| a == flag).unwrap_or_else(|| panic!("{flag} missing"))
    }

    #[test]
    fn test_quality_pass_mp4() {
        let args = EncodeArgs::new(&options(), "input.dat").build(Pass::Quality {
            crf: QualityTier::Medium.crf(Container::Mp4),
            ceiling_kbps: 500,
        });

        let crf = index_of(&args, "-crf");
        assert_eq!(args[crf + 1], "26");
        assert_eq!(args[index_of(&args, "-maxrate") + 1], "500k");
        assert_eq!(args[index_of(&args, "-bufsize") + 1], "1000k");
        assert_eq!(args[index_of(&args, "-preset") + 1], "ultrafast");
        assert_eq!(args[index_of(&args, "-vf") + 1], "crop=320:240:0:0");
        assert!(args.contains(&"+faststart".to_string()));
        assert_eq!(args.last().unwrap(), "output.mp4");
    }

    #[test]
    fn test_quality_pass_webm() {
        let opts = EditOptions::new(513_802, Container::Webm, 320, 240, 3.0);
        let args = EncodeArgs::new(&opts, "input.dat").build(Pass::Quality {
            crf: QualityTier::Medium.crf(Container::Webm),
            ceiling_kbps: 500,
        });

        assert_eq!(args[index_of(&args, "-c:v") + 1], "libvpx");
        assert_eq!(args[index_of(&args, "-crf") + 1], "24");
        assert_eq!(args[index_of(&args, "-b:v") + 1], "500k");
        assert_eq!(args[index_of(&args, "-c:a") + 1], "libvorbis");
        assert!(!args.contains(&"-preset".to_string()));
        assert!(!args.contains(&"-movflags".to_string()));
        assert_eq!(args.last().unwrap(), "output.webm");
    }

    #[test]
    fn test_corrective_pass_drops_crf() {
        let args = EncodeArgs::new(&options(), "input.dat")
            .build(Pass::Corrective { bitrate_kbps: 233 });

        assert!(!args.contains(&"-crf".to_string()));
        assert_eq!(args[index_of(&args, "-b:v") + 1], "233k");
        assert_eq!(args[index_of(&args, "-maxrate") + 1], "256k"); // 233 * 1.1 rounded
        assert_eq!(args[index_of(&args, "-bufsize") + 1], "466k");
    }

    #[test]
    fn test_no_audio_emits_an() {
        let args = EncodeArgs::new(&options().without_audio(), "input.dat")
            .build(Pass::Quality { crf: 26, ceiling_kbps: 500 });

        assert!(args.contains(&"-an".to_string()));
        assert!(!args.contains(&"-c:a".to_string()));
        assert!(!args.contains(&"-b:a".to_string()));
    }

    #[test]
    fn test_trim_args() {
        let args = EncodeArgs::new(&options().with_trim(1.0, 2.0), "input.dat")
            .build(Pass::Quality { crf: 26, ceiling_kbps: 500 });

        let ss = index_of(&args, "-ss");
        assert_eq!(args[ss + 1], "1.000");
        assert!(ss < index_of(&args, "-i"));
        let t = index_of(&args, "-t");
        assert_eq!(args[t + 1], "1.000");
        assert!(t > index_of(&args, "-i"));
    }

    #[test]
    fn test_full_range_trim_adds_nothing() {
        let args = EncodeArgs::new(&options().with_trim(0.0, 3.0), "input.dat")
            .build(Pass::Quality { crf: 26, ceiling_kbps: 500 });

        assert!(!args.contains(&"-ss".to_string()));
        assert!(!args.contains(&"-t".to_string()));
    }

    #[test]
    fn test_loop_args_precede_input() {
        let args = EncodeArgs::new(&options().with_loop_count(2), "input.dat")
            .build(Pass::Quality { crf: 26, ceiling_kbps: 500 });

        assert_eq!(args[0], "-stream_loop");
        assert_eq!(args[1], "1");

        let single = EncodeArgs::new(&options(), "input.dat")
            .build(Pass::Quality { crf: 26, ceiling_kbps: 500 });
        assert!(!single.contains(&"-stream_loop".to_string()));
    }

    #[test]
    fn test_filter_chain_order() {
        let opts = options()
            .with_crop(CropRect::new(0.25, 0.25, 0.5, 0.5))
            .with_speed(2.0)
            .with_fps_cap(24);
        let args = EncodeArgs::new(&opts, "input.dat")
            .build(Pass::Quality { crf: 26, ceiling_kbps: 500 });

        assert_eq!(
            args[index_of(&args, "-vf") + 1],
            "crop=160:120:80:60,setpts=0.5000*PTS,fps=24"
        );
    }

    #[test]
    fn test_speed_adds_atempo_chain() {
        let args = EncodeArgs::new(&options().with_speed(4.0), "input.dat")
            .build(Pass::Quality { crf: 26, ceiling_kbps: 500 });

        assert_eq!(args[index_of(&args, "-af") + 1], "atempo=2.0,atempo=2.0000");
    }

    #[test]
    fn test_no_atempo_without_audio() {
        let args = EncodeArgs::new(&options().with_speed(2.0).without_audio(), "input.dat")
            .build(Pass::Quality { crf: 26, ceiling_kbps: 500 });

        assert!(!args.contains(&"-af".to_string()));
    }
}
