//! Two-pass transcode orchestrator.
//!
//! Drives the encoder through a quality pass with a soft bitrate
//! ceiling, checks the produced size against the byte budget, and
//! runs at most one bitrate-targeted corrective pass on overshoot.
//! Exactly one corrective pass is ever attempted: approximate budget
//! adherence is traded for a bounded worst-case latency.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use bytefit_models::{pretty_bytes, EditOptions, JobEvent, JobPhase};

use crate::args::{EncodeArgs, Pass};
use crate::engine::{EncoderEngine, EngineEvent, EngineEventSink};
use crate::error::{EncodeError, EncodeResult};
use crate::plan::{ceiling_bitrate_kbps, corrective_bitrate_kbps, corrective_ratio};

/// Artifact name the source bytes are staged under. The container is
/// probed from content, so the name carries no extension.
const INPUT_NAME: &str = "input.dat";

/// Per-job event reporter with monotone progress.
#[derive(Clone)]
struct JobReporter {
    events: mpsc::UnboundedSender<JobEvent>,
    // f64 bits of the last reported progress value.
    last_progress: Arc<AtomicU64>,
}

impl JobReporter {
    fn new(events: mpsc::UnboundedSender<JobEvent>) -> Self {
        Self {
            events,
            last_progress: Arc::new(AtomicU64::new(0.0_f64.to_bits())),
        }
    }

    fn send(&self, event: JobEvent) {
        // A dropped receiver just means nobody is listening.
        let _ = self.events.send(event);
    }

    fn log(&self, message: impl Into<String>) {
        let message = message.into();
        debug!("{message}");
        self.send(JobEvent::log(message));
    }

    fn phase(&self, phase: JobPhase) {
        info!(phase = phase.as_str(), "phase transition");
        self.send(JobEvent::phase(phase));
    }

    /// Report progress, clamped so the stream never goes backwards.
    fn progress(&self, value: f64) {
        let value = value.min(1.0);
        let mut reported = value;
        let updated = self
            .last_progress
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                let last = f64::from_bits(bits);
                if value > last {
                    reported = value;
                    Some(value.to_bits())
                } else {
                    reported = last;
                    None
                }
            });
        if updated.is_ok() {
            self.send(JobEvent::progress(reported));
        }
    }
}

/// Size-constrained transcoder over an encoder engine.
///
/// Owns the engine handle and a cancellation channel. One job at a
/// time; `cancel` may be called from any task and is a no-op when
/// nothing is running.
pub struct Transcoder<E: EncoderEngine> {
    engine: E,
    cancel_tx: watch::Sender<bool>,
}

impl<E: EncoderEngine> Transcoder<E> {
    pub fn new(engine: E) -> Self {
        let (cancel_tx, _) = watch::channel(false);
        Self { engine, cancel_tx }
    }

    /// Request cancellation of the in-flight job.
    ///
    /// The running pass is terminated outright; there is no graceful
    /// mid-pass abort. Safe to call when no job is running.
    pub fn cancel(&self) {
        self.cancel_tx.send_replace(true);
    }

    /// Release the engine workspace.
    pub async fn shutdown(self) -> EncodeResult<()> {
        self.engine.shutdown().await
    }

    /// Run one transcode job: stage the source, encode, size-check,
    /// optionally correct, and return the output bytes.
    ///
    /// Progress, log lines and phase transitions are pushed to
    /// `events` while the call is suspended.
    pub async fn transcode(
        &self,
        source: &[u8],
        options: &EditOptions,
        events: mpsc::UnboundedSender<JobEvent>,
    ) -> EncodeResult<Vec<u8>> {
        // A cancel from a previous job must not kill this one.
        self.cancel_tx.send_replace(false);

        let job = JobReporter::new(events);

        let result = match validate(options) {
            Ok(()) => self.run_job(source, options, &job).await,
            Err(e) => Err(e),
        };

        match &result {
            Ok(bytes) => {
                info!(size = bytes.len(), "job done");
                job.phase(JobPhase::Done);
                job.progress(1.0);
            }
            Err(e) if e.is_cancelled() => {
                info!("job stopped");
                job.log("[cancel] stopped");
                job.phase(JobPhase::Cancelled);
            }
            Err(e) => {
                warn!("job failed: {e}");
                job.send(JobEvent::error(e.to_string()));
                job.phase(JobPhase::Failed);
            }
        }

        result
    }

    async fn run_job(
        &self,
        source: &[u8],
        options: &EditOptions,
        job: &JobReporter,
    ) -> EncodeResult<Vec<u8>> {
        job.phase(JobPhase::Loading);
        job.log("[init] engine ready");
        job.progress(0.05);

        let args = EncodeArgs::new(options, INPUT_NAME);
        let result = self.stage_and_encode(source, options, &args, job).await;

        // Artifact release runs on every exit path and never masks
        // the job's own result.
        self.release(INPUT_NAME).await;
        self.release(args.output_name()).await;

        result
    }

    async fn stage_and_encode(
        &self,
        source: &[u8],
        options: &EditOptions,
        args: &EncodeArgs,
        job: &JobReporter,
    ) -> EncodeResult<Vec<u8>> {
        self.engine.write_input(INPUT_NAME, source).await?;
        job.log(format!("[input] loaded {}", pretty_bytes(source.len() as u64)));
        job.progress(0.10);

        let px = options
            .crop
            .normalize()
            .to_pixels(options.source_width, options.source_height);
        job.log(format!(
            "[crop] {} (from {}x{})",
            px.to_crop_filter(),
            options.source_width,
            options.source_height
        ));

        let duration = options.effective_duration();
        let audio_kbps = options.audio_bitrate_kbps();
        let budget = options.budget_bytes;
        let ceiling = ceiling_bitrate_kbps(budget, duration, audio_kbps);
        let crf = options.quality.crf(options.container);

        job.phase(JobPhase::EncodingPrimary);
        job.log(format!(
            "[encode] pass 1: target video={ceiling}k audio={audio_kbps}k"
        ));
        let argv = args.build(Pass::Quality {
            crf,
            ceiling_kbps: ceiling,
        });
        job.log(format!("[run] ffmpeg {}", argv.join(" ")));
        self.run_pass(&argv, duration, (0.10, 0.55), job).await?;

        job.phase(JobPhase::SizeCheck);
        job.progress(0.55);
        let produced = self.engine.read_output(args.output_name()).await?;
        job.log(format!(
            "[size] pass 1 result: {} (target: {})",
            pretty_bytes(produced.len() as u64),
            pretty_bytes(budget)
        ));

        let mut passes = 1;
        let output = if produced.len() as u64 > budget && !produced.is_empty() {
            let corrected = corrective_bitrate_kbps(ceiling, produced.len() as u64, budget);
            let ratio = corrective_ratio(produced.len() as u64, budget);

            job.phase(JobPhase::EncodingCorrective);
            job.log(format!(
                "[encode] pass 2: adjusted video={corrected}k (ratio {ratio:.2})"
            ));
            let argv = args.build(Pass::Corrective {
                bitrate_kbps: corrected,
            });
            job.log(format!("[run] ffmpeg {}", argv.join(" ")));
            self.run_pass(&argv, duration, (0.55, 0.90), job).await?;

            passes = 2;
            self.engine.read_output(args.output_name()).await?
        } else {
            produced
        };

        job.phase(JobPhase::Finalizing);
        job.progress(0.92);
        job.log(format!(
            "[done] output {} / target {}",
            pretty_bytes(output.len() as u64),
            pretty_bytes(budget)
        ));
        job.send(JobEvent::done(output.len() as u64, options, passes));

        Ok(output)
    }

    /// Run one encoder pass, mapping the engine's output-time progress
    /// into the job's `(lo, hi)` progress band.
    async fn run_pass(
        &self,
        argv: &[String],
        duration_secs: f64,
        band: (f64, f64),
        job: &JobReporter,
    ) -> EncodeResult<()> {
        let (lo, hi) = band;
        let total_ms = (duration_secs * 1000.0).max(1.0);
        let reporter = job.clone();

        let sink: EngineEventSink = Box::new(move |event| match event {
            EngineEvent::Progress { out_time_ms } => {
                let fraction = (out_time_ms as f64 / total_ms).clamp(0.0, 1.0);
                reporter.progress(lo + fraction * (hi - lo));
            }
            EngineEvent::Log { line } => {
                reporter.log(format!("[ffmpeg] {line}"));
            }
        });

        self.engine
            .execute(argv, self.cancel_tx.subscribe(), sink)
            .await
    }

    /// Best-effort artifact deletion; failures are logged, never
    /// escalated.
    async fn release(&self, name: &str) {
        if let Err(e) = self.engine.remove(name).await {
            warn!("failed to release artifact {name}: {e}");
        }
    }
}

fn validate(options: &EditOptions) -> EncodeResult<()> {
    if options.budget_bytes == 0 {
        return Err(EncodeError::invalid_options("byte budget must be positive"));
    }
    if !(options.speed > 0.0) {
        return Err(EncodeError::invalid_options(format!(
            "speed must be positive, got {}",
            options.speed
        )));
    }
    if options.loop_count == 0 {
        return Err(EncodeError::invalid_options("loop count must be at least 1"));
    }
    Ok(())
}
