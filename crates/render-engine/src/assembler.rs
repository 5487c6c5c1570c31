//! Segment assembler: interval clips back into one video track.

use std::path::Path;

use strata_common::error::{StrataError, StrataResult};
use strata_common::timecode::{frames_to_secs, TIME_EPSILON_SECS};
use strata_processing_core::SegmentPlan;

use crate::engine::{Artifact, EncodingEngine};

/// A rendered interval clip, tagged with the interval it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalClip {
    pub index: usize,
    pub artifact: Artifact,
}

/// Indices of the intervals that span at least one frame at `fps`. Only
/// these are composited; the rest fall between two frames.
pub fn rendered_intervals(segments: &SegmentPlan, fps: u32) -> Vec<usize> {
    segments
        .intervals()
        .filter(|interval| interval.frame_count(fps) > 0)
        .map(|interval| interval.index)
        .collect()
}

/// Put clips into interval order and check they cover the plan exactly.
///
/// Clips may arrive in any order. Fails with `AssemblyMismatch` when an
/// interval is missing or duplicated, or when the summed clip durations
/// drift from the plan's whole-frame length by more than one epsilon per
/// clip.
pub fn order_clips(
    segments: &SegmentPlan,
    fps: u32,
    mut clips: Vec<IntervalClip>,
) -> StrataResult<Vec<Artifact>> {
    let expected = rendered_intervals(segments, fps);
    if clips.len() != expected.len() {
        return Err(StrataError::assembly(format!(
            "expected {} interval clips, got {}",
            expected.len(),
            clips.len()
        )));
    }

    clips.sort_by_key(|clip| clip.index);
    if let Some((clip, wanted)) = clips
        .iter()
        .zip(&expected)
        .find(|(clip, wanted)| clip.index != **wanted)
    {
        return Err(StrataError::assembly(format!(
            "clip for interval {} found where interval {wanted} belongs",
            clip.index
        )));
    }

    let covered: f64 = clips.iter().map(|clip| clip.artifact.duration).sum();
    let planned = frames_to_secs(segments.total_frames(fps), fps);
    let tolerance = TIME_EPSILON_SECS * clips.len().max(1) as f64;
    if (covered - planned).abs() > tolerance {
        return Err(StrataError::assembly(format!(
            "clips cover {covered:.6}s, plan is {planned:.6}s ({} frames at {fps} fps)",
            segments.total_frames(fps)
        )));
    }

    Ok(clips.into_iter().map(|clip| clip.artifact).collect())
}

/// Concatenate interval clips into `output`. A single clip is returned as is.
pub async fn assemble(
    engine: &dyn EncodingEngine,
    segments: &SegmentPlan,
    fps: u32,
    clips: Vec<IntervalClip>,
    output: &Path,
) -> StrataResult<Artifact> {
    let mut ordered = order_clips(segments, fps, clips)?;

    if ordered.len() == 1 {
        if let Some(only) = ordered.pop() {
            tracing::debug!(clip = %only.path.display(), "Single interval, skipping concat");
            return Ok(only);
        }
    }

    tracing::info!(clips = ordered.len(), "Assembling video track");
    engine.concat(&ordered, output).await
}
