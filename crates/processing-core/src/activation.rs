//! Per-interval layer activation.
//!
//! A layer is active in an interval only if it covers the whole interval.
//! Because boundaries are cut at every layer start and end, "covers the
//! interval" and "overlaps the interval" agree for every layer, and the
//! active set is constant across the interval.

use serde::{Deserialize, Serialize};
use strata_common::timecode::TIME_EPSILON_SECS;
use strata_project_model::plan::Layer;

use crate::boundaries::Interval;

/// A layer bound to one interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveLayer {
    /// Index into the plan's `layers`; also the z-order.
    pub layer_index: usize,

    /// Read position in the layer's source at the interval start.
    pub local_offset: f64,
}

/// The active layers for one interval, bottom-to-top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activation {
    pub interval: Interval,
    pub layers: Vec<ActiveLayer>,
}

impl Activation {
    /// No layer is active: the interval renders as black filler.
    pub fn is_filler(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layer_indices(&self) -> Vec<usize> {
        self.layers.iter().map(|l| l.layer_index).collect()
    }
}

/// Whether `layer` covers all of `interval`.
pub fn is_active(layer: &Layer, interval: &Interval) -> bool {
    layer.time <= interval.start + TIME_EPSILON_SECS
        && layer.end() >= interval.end - TIME_EPSILON_SECS
}

/// Source read position for `layer` at the start of `interval`.
pub fn local_offset(layer: &Layer, interval: &Interval) -> f64 {
    (layer.trim_start + (interval.start - layer.time)).max(0.0)
}

/// Activate layers for one interval, preserving plan order.
pub fn activate(layers: &[Layer], interval: Interval) -> Activation {
    let active = layers
        .iter()
        .enumerate()
        .filter(|(_, layer)| is_active(layer, &interval))
        .map(|(layer_index, layer)| ActiveLayer {
            layer_index,
            local_offset: local_offset(layer, &interval),
        })
        .collect();

    Activation {
        interval,
        layers: active,
    }
}

/// Indices of layers visible at instant `t` (start inclusive, end exclusive).
pub fn layers_at(layers: &[Layer], t: f64) -> Vec<usize> {
    layers
        .iter()
        .enumerate()
        .filter(|(_, layer)| layer.time <= t && t < layer.end())
        .map(|(index, _)| index)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_project_model::plan::LayerKind;

    fn layer(time: f64, duration: f64) -> Layer {
        Layer::new(LayerKind::Video, "src", time, duration, 100, 100)
    }

    fn interval(start: f64, end: f64) -> Interval {
        Interval {
            index: 0,
            start,
            end,
        }
    }

    #[test]
    fn test_layer_active_only_when_covering_interval() {
        let l = layer(3.0, 4.0);
        assert!(is_active(&l, &interval(3.0, 7.0)));
        assert!(is_active(&l, &interval(4.0, 5.0)));
        assert!(!is_active(&l, &interval(0.0, 3.0)));
        assert!(!is_active(&l, &interval(7.0, 10.0)));
        assert!(!is_active(&l, &interval(2.0, 4.0)));
    }

    #[test]
    fn test_epsilon_absorbs_boundary_noise() {
        let l = layer(3.0004, 3.9992);
        assert!(is_active(&l, &interval(3.0, 7.0)));
    }

    #[test]
    fn test_local_offset_includes_trim_and_elapsed() {
        let l = layer(3.0, 4.0).with_trim_start(10.0);
        assert!((local_offset(&l, &interval(3.0, 5.0)) - 10.0).abs() < 1e-12);
        assert!((local_offset(&l, &interval(5.0, 7.0)) - 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_local_offset_never_negative() {
        let l = layer(3.0005, 4.0);
        assert_eq!(local_offset(&l, &interval(3.0, 7.0)), 0.0);
    }

    #[test]
    fn test_activation_keeps_plan_order() {
        let layers = [layer(0.0, 10.0), layer(3.0, 4.0), layer(2.0, 6.0)];
        let activation = activate(&layers, interval(3.0, 7.0));
        assert_eq!(activation.layer_indices(), vec![0, 1, 2]);
        assert!(!activation.is_filler());
    }

    #[test]
    fn test_no_active_layer_is_filler() {
        let layers = [layer(0.0, 2.0)];
        let activation = activate(&layers, interval(2.0, 5.0));
        assert!(activation.is_filler());
    }

    #[test]
    fn test_layers_at_is_half_open() {
        let layers = [layer(0.0, 3.0), layer(3.0, 4.0)];
        assert_eq!(layers_at(&layers, 0.0), vec![0]);
        assert_eq!(layers_at(&layers, 3.0), vec![1]);
        assert_eq!(layers_at(&layers, 6.999), vec![1]);
        assert!(layers_at(&layers, 7.0).is_empty());
    }
}
