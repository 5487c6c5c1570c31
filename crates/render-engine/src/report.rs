//! Render outcome reporting.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A recoverable problem encountered while rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderWarning {
    /// A layer's source did not resolve; the interval rendered without it.
    LayerDropped {
        interval: usize,
        layer_index: usize,
        source: Option<String>,
    },

    /// Every active layer of the interval was dropped; it rendered black.
    IntervalDegraded { interval: usize, start: f64, end: f64 },

    /// An audio segment was left out of the audio track.
    AudioSkipped {
        segment_index: usize,
        source: Option<String>,
        reason: String,
    },
}

impl fmt::Display for RenderWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LayerDropped {
                interval,
                layer_index,
                source,
            } => write!(
                f,
                "interval {interval}: dropped layer {layer_index} (unresolved source {})",
                source.as_deref().unwrap_or("<none>")
            ),
            Self::IntervalDegraded {
                interval,
                start,
                end,
            } => write!(
                f,
                "interval {interval} [{start:.3}s, {end:.3}s): no resolvable layers, rendered as filler"
            ),
            Self::AudioSkipped {
                segment_index,
                source,
                reason,
            } => write!(
                f,
                "audio segment {segment_index} ({}): skipped, {reason}",
                source.as_deref().unwrap_or("<none>")
            ),
        }
    }
}

/// Summary of a finished render, printed by the CLI as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderReport {
    pub output: PathBuf,
    pub render_id: Uuid,
    pub engine: String,
    pub intervals: usize,
    pub filler_intervals: usize,
    /// Video frames written, `round(total_duration * fps)`.
    pub frames: u64,
    pub audio_segments: usize,
    pub has_audio: bool,
    pub warnings: Vec<RenderWarning>,
    pub elapsed_secs: f64,
    pub completed_at: DateTime<Utc>,
}

impl RenderReport {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_names_the_source() {
        let warning = RenderWarning::AudioSkipped {
            segment_index: 2,
            source: Some("media://voice.wav".to_string()),
            reason: "unresolved asset".to_string(),
        };
        let text = warning.to_string();
        assert!(text.contains("media://voice.wav"));
        assert!(text.contains("segment 2"));
    }

    #[test]
    fn test_warning_serializes_tagged() {
        let warning = RenderWarning::LayerDropped {
            interval: 1,
            layer_index: 3,
            source: None,
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["kind"], "layer_dropped");
        assert_eq!(json["layer_index"], 3);
        assert!(json["source"].is_null());
    }
}
