//! Segmentation plan: the full sequence of intervals and their activations.
//!
//! The plan is a pure function of the render plan. Building it twice from the
//! same input yields equal values, which is what makes renders reproducible
//! up to the encoder.

use serde::{Deserialize, Serialize};
use strata_common::timecode::frame_at;
use strata_project_model::plan::RenderPlan;

use crate::activation::{activate, Activation};
use crate::boundaries::{extract_boundaries, intervals_from_boundaries, Interval};

/// Ordered rendering steps for one render plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentPlan {
    pub total_duration: f64,
    pub boundaries: Vec<f64>,
    pub activations: Vec<Activation>,
}

impl SegmentPlan {
    /// Segment a render plan.
    pub fn build(plan: &RenderPlan) -> Self {
        let boundaries = extract_boundaries(&plan.layers, plan.total_duration);
        let activations: Vec<Activation> = intervals_from_boundaries(&boundaries)
            .into_iter()
            .map(|interval| activate(&plan.layers, interval))
            .collect();

        let segment_plan = Self {
            total_duration: plan.total_duration,
            boundaries,
            activations,
        };

        tracing::debug!(
            layers = plan.layers.len(),
            intervals = segment_plan.len(),
            filler = segment_plan.filler_count(),
            "Segment plan built"
        );

        segment_plan
    }

    pub fn len(&self) -> usize {
        self.activations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activations.is_empty()
    }

    pub fn intervals(&self) -> impl Iterator<Item = &Interval> + '_ {
        self.activations.iter().map(|a| &a.interval)
    }

    /// Intervals with no active layer.
    pub fn filler_count(&self) -> usize {
        self.activations.iter().filter(|a| a.is_filler()).count()
    }

    /// Frames in the whole timeline at `fps`.
    pub fn total_frames(&self, fps: u32) -> u64 {
        frame_at(self.total_duration, fps)
    }

    /// Sum of interval durations; equals `total_duration` up to float rounding.
    pub fn covered_duration(&self) -> f64 {
        self.intervals().map(Interval::duration).sum()
    }
}
