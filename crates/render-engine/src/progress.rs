//! Render progress reporting.

use serde::Serialize;

/// Progress callback for rendering.
pub type ProgressCallback = Box<dyn Fn(RenderProgress) + Send + Sync>;

/// Render progress report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderProgress {
    pub stage: RenderStage,

    /// Interval clips finished so far.
    pub completed_intervals: usize,

    pub total_intervals: usize,

    /// Overall progress [0.0, 1.0].
    pub progress: f64,
}

/// Stages of a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderStage {
    Preparing,
    Compositing,
    Assembling,
    Audio,
    Muxing,
    Complete,
}

impl RenderStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Preparing => "preparing",
            Self::Compositing => "compositing",
            Self::Assembling => "assembling",
            Self::Audio => "audio",
            Self::Muxing => "muxing",
            Self::Complete => "complete",
        }
    }
}

/// Share of the bar covered by compositing.
const COMPOSITING_SHARE: f64 = 0.8;

impl RenderProgress {
    pub fn new(stage: RenderStage, completed_intervals: usize, total_intervals: usize) -> Self {
        let done = if total_intervals == 0 {
            1.0
        } else {
            completed_intervals as f64 / total_intervals as f64
        };
        let progress = match stage {
            RenderStage::Preparing => 0.0,
            RenderStage::Compositing => done * COMPOSITING_SHARE,
            RenderStage::Assembling => COMPOSITING_SHARE,
            RenderStage::Audio => 0.9,
            RenderStage::Muxing => 0.95,
            RenderStage::Complete => 1.0,
        };

        Self {
            stage,
            completed_intervals,
            total_intervals,
            progress: progress.clamp(0.0, 1.0),
        }
    }
}

pub(crate) fn emit(
    progress: Option<&ProgressCallback>,
    stage: RenderStage,
    done: usize,
    total: usize,
) {
    if let Some(cb) = progress {
        cb(RenderProgress::new(stage, done, total));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_is_monotonic_across_stages() {
        let stages = [
            RenderProgress::new(RenderStage::Preparing, 0, 4),
            RenderProgress::new(RenderStage::Compositing, 1, 4),
            RenderProgress::new(RenderStage::Compositing, 4, 4),
            RenderProgress::new(RenderStage::Assembling, 4, 4),
            RenderProgress::new(RenderStage::Audio, 4, 4),
            RenderProgress::new(RenderStage::Muxing, 4, 4),
            RenderProgress::new(RenderStage::Complete, 4, 4),
        ];
        for pair in stages.windows(2) {
            assert!(pair[0].progress <= pair[1].progress);
        }
        assert_eq!(stages[1].progress, 0.2);
        assert_eq!(stages[6].progress, 1.0);
    }
}
