//! Bitrate planning from a byte budget.
//!
//! The quality pass gets a soft ceiling derived from the budget minus
//! the audio share; the corrective pass (run only on overshoot) scales
//! that ceiling by the measured size ratio.

/// Minimum video bitrate in kbps. Anything lower produces an
/// unusable stream.
pub const MIN_VIDEO_BITRATE_KBPS: u32 = 50;

/// Fraction of the byte budget handed to the quality pass, leaving
/// slack for container overhead.
pub const CEILING_OVERHEAD: f64 = 0.92;

/// Floor on the corrective scale factor. A wildly overshooting first
/// pass must not collapse the second into the bitrate floor.
pub const MIN_CORRECTIVE_RATIO: f64 = 0.3;

/// Safety margin applied to the measured size ratio so the corrective
/// pass lands under the budget rather than on it.
pub const CORRECTIVE_MARGIN: f64 = 0.95;

/// Video bitrate in kbps that fills `budget_bytes` over
/// `duration_secs`, after subtracting the audio share.
///
/// Duration is floored at one second and the result at
/// [`MIN_VIDEO_BITRATE_KBPS`].
pub fn target_bitrate_kbps(budget_bytes: u64, duration_secs: f64, audio_kbps: u32) -> u32 {
    let kbps = (budget_bytes as f64 * 8.0 / 1000.0) / duration_secs.max(1.0) - audio_kbps as f64;
    (kbps.floor() as i64).max(MIN_VIDEO_BITRATE_KBPS as i64) as u32
}

/// Soft bitrate ceiling for the quality pass.
pub fn ceiling_bitrate_kbps(budget_bytes: u64, duration_secs: f64, audio_kbps: u32) -> u32 {
    let scaled = (budget_bytes as f64 * CEILING_OVERHEAD) as u64;
    target_bitrate_kbps(scaled, duration_secs, audio_kbps)
}

/// Scale factor applied to the ceiling for the corrective pass,
/// with margin and floor applied.
pub fn corrective_ratio(produced_bytes: u64, budget_bytes: u64) -> f64 {
    let ratio = budget_bytes as f64 / produced_bytes as f64;
    (ratio * CORRECTIVE_MARGIN).max(MIN_CORRECTIVE_RATIO)
}

/// Bitrate for the corrective pass after the quality pass produced
/// `produced_bytes` against a budget of `budget_bytes`.
pub fn corrective_bitrate_kbps(ceiling_kbps: u32, produced_bytes: u64, budget_bytes: u64) -> u32 {
    let safe_ratio = corrective_ratio(produced_bytes, budget_bytes);
    let corrected = (ceiling_kbps as f64 * safe_ratio).round() as i64;
    corrected.max(MIN_VIDEO_BITRATE_KBPS as i64) as u32
}
