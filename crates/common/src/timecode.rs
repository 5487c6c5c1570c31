//! Timecode helpers for the shared render timeline.
//!
//! All Strata timeline positions are `f64` seconds on one absolute clock
//! starting at zero. Plans arrive from JSON with values that were rounded
//! elsewhere, so comparisons go through a fixed epsilon instead of `==`.

/// Tolerance for comparing timeline instants (1 ms).
pub const TIME_EPSILON_SECS: f64 = 0.001;

/// Whether two instants are the same within [`TIME_EPSILON_SECS`].
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= TIME_EPSILON_SECS
}

/// Format seconds for an ffmpeg `-ss` / `-t` argument.
pub fn ffmpeg_secs(secs: f64) -> String {
    format!("{:.6}", secs.max(0.0))
}

/// Round seconds to a fixed number of decimal places.
pub fn round_secs(secs: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (secs * factor).round() / factor
}

/// Index of the frame boundary nearest to `secs` on an `fps` grid.
pub fn frame_at(secs: f64, fps: u32) -> u64 {
    (secs.max(0.0) * fps.max(1) as f64).round() as u64
}

/// Length of `frames` frames at `fps`, in seconds.
pub fn frames_to_secs(frames: u64, fps: u32) -> f64 {
    frames as f64 / fps.max(1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approx_eq_within_one_millisecond() {
        assert!(approx_eq(3.0, 3.0004));
        assert!(approx_eq(3.0, 2.9991));
        assert!(!approx_eq(3.0, 3.002));
    }

    #[test]
    fn test_ffmpeg_secs_format() {
        assert_eq!(ffmpeg_secs(1.5), "1.500000");
        assert_eq!(ffmpeg_secs(-0.2), "0.000000");
    }

    #[test]
    fn test_round_secs() {
        assert!((round_secs(1.234_56, 4) - 1.2346).abs() < 1e-12);
        assert!((round_secs(2.0, 4) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_frame_grid() {
        assert_eq!(frame_at(1.0, 30), 30);
        assert_eq!(frame_at(0.04, 30), 1);
        assert_eq!(frame_at(0.01, 30), 0);
        assert_eq!(frame_at(-1.0, 30), 0);
        assert_eq!(frame_at(2.0, 0), 2);
        assert!((frames_to_secs(45, 30) - 1.5).abs() < 1e-12);
    }
}
