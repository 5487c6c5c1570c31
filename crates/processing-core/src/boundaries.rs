//! Timeline cut points.
//!
//! The output timeline is cut at every layer start and end so that no layer
//! appears or disappears inside an interval. Points are clipped to
//! `[0, total_duration]`; points closer than [`TIME_EPSILON_SECS`] merge.

use serde::{Deserialize, Serialize};
use strata_common::timecode::{approx_eq, frame_at, TIME_EPSILON_SECS};
use strata_project_model::plan::Layer;

/// A half-open span `[start, end)` between two consecutive boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    /// Position in time order, starting at zero.
    pub index: usize,
    pub start: f64,
    pub end: f64,
}

impl Interval {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn midpoint(&self) -> f64 {
        self.start + self.duration() / 2.0
    }

    /// Frames this interval occupies once both ends are snapped to the
    /// nearest frame boundary. Consecutive intervals tile the grid exactly,
    /// so the counts of a whole plan sum to its total frame count.
    pub fn frame_count(&self, fps: u32) -> u64 {
        frame_at(self.end, fps).saturating_sub(frame_at(self.start, fps))
    }
}

/// Sorted, distinct cut points. Always starts with `0` and ends with
/// `total_duration`; an empty layer list yields exactly those two.
pub fn extract_boundaries(layers: &[Layer], total_duration: f64) -> Vec<f64> {
    let total = total_duration.max(0.0);

    let mut interior: Vec<f64> = layers
        .iter()
        .flat_map(|layer| [layer.time, layer.end()])
        .filter(|t| t.is_finite() && *t > TIME_EPSILON_SECS && *t < total - TIME_EPSILON_SECS)
        .collect();

    interior.sort_by(f64::total_cmp);
    interior.dedup_by(|later, kept| approx_eq(*later, *kept));

    let mut boundaries = Vec::with_capacity(interior.len() + 2);
    boundaries.push(0.0);
    boundaries.extend(interior);
    if total > 0.0 {
        boundaries.push(total);
    }
    boundaries
}

/// Consecutive boundary pairs as indexed intervals.
pub fn intervals_from_boundaries(boundaries: &[f64]) -> Vec<Interval> {
    boundaries
        .windows(2)
        .enumerate()
        .map(|(index, pair)| Interval {
            index,
            start: pair[0],
            end: pair[1],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_project_model::plan::LayerKind;

    fn layer(time: f64, duration: f64) -> Layer {
        Layer::new(LayerKind::Video, "src", time, duration, 100, 100)
    }

    #[test]
    fn test_empty_layers_yield_whole_timeline() {
        assert_eq!(extract_boundaries(&[], 8.0), vec![0.0, 8.0]);
    }

    #[test]
    fn test_overlapping_layers() {
        let layers = [layer(0.0, 10.0), layer(3.0, 4.0)];
        assert_eq!(extract_boundaries(&layers, 10.0), vec![0.0, 3.0, 7.0, 10.0]);
    }

    #[test]
    fn test_duplicate_points_appear_once() {
        let layers = [layer(2.0, 3.0), layer(2.0, 3.0), layer(5.0, 1.0)];
        assert_eq!(
            extract_boundaries(&layers, 10.0),
            vec![0.0, 2.0, 5.0, 6.0, 10.0]
        );
    }

    #[test]
    fn test_points_outside_timeline_are_clipped() {
        let layers = [layer(8.0, 5.0), layer(12.0, 1.0)];
        assert_eq!(extract_boundaries(&layers, 10.0), vec![0.0, 8.0, 10.0]);
    }

    #[test]
    fn test_near_points_merge_within_epsilon() {
        let layers = [layer(3.0, 1.0), layer(3.0004, 1.0), layer(0.0002, 9.9995)];
        assert_eq!(extract_boundaries(&layers, 10.0), vec![0.0, 3.0, 4.0, 10.0]);
    }

    #[test]
    fn test_gap_between_layers_produces_its_own_interval() {
        let layers = [layer(0.0, 2.0), layer(5.0, 5.0)];
        let intervals = intervals_from_boundaries(&extract_boundaries(&layers, 10.0));
        assert_eq!(intervals.len(), 3);
        assert_eq!(intervals[1].start, 2.0);
        assert_eq!(intervals[1].end, 5.0);
        assert_eq!(intervals[1].index, 1);
    }

    #[test]
    fn test_interval_midpoint() {
        let interval = Interval {
            index: 0,
            start: 3.0,
            end: 7.0,
        };
        assert_eq!(interval.duration(), 4.0);
        assert_eq!(interval.midpoint(), 5.0);
    }
}
