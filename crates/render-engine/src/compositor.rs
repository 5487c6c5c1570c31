//! Segment compositor: one interval's overlay description.
//!
//! For each interval the active layers are resolved against the asset store
//! and turned into a [`CompositeRequest`]. [`filter_complex`] renders that
//! request as an ffmpeg filter graph: a black base canvas, then each input
//! re-based to local time zero, scaled to its box, faded to its opacity and
//! overlaid in plan order.

use std::fmt::Write as _;
use std::path::PathBuf;

use strata_common::error::StrataResult;
use strata_common::timecode::frames_to_secs;
use strata_processing_core::Activation;
use strata_project_model::asset::AssetStore;
use strata_project_model::plan::{FitMode, Layer, RenderPlan};

use crate::engine::{CompositeInput, CompositeRequest, Placement};
use crate::report::RenderWarning;

/// Label of the final video stream in the filter graph.
pub const OUTPUT_LABEL: &str = "vout";

/// Round up to the nearest even number, minimum 2. Chroma subsampled
/// encoders reject odd frame sizes.
pub fn even_ceil(n: u32) -> u32 {
    let n = n.max(2);
    match n.checked_add(n % 2) {
        Some(even) => even,
        None => n - 1,
    }
}

/// Canvas placement for a layer.
pub fn placement_for(layer: &Layer) -> Placement {
    Placement {
        x: layer.x,
        y: layer.y,
        width: even_ceil(layer.width),
        height: even_ceil(layer.height),
        fit: layer.fit,
        opacity: layer.opacity.clamp(0.0, 1.0),
    }
}

/// Build the composite request for one interval.
///
/// Layers whose source is missing or unresolvable are dropped with a
/// warning. If every active layer is dropped the interval becomes filler.
/// Any asset store error other than an unresolved asset is returned.
pub fn compose_interval(
    plan: &RenderPlan,
    activation: &Activation,
    assets: &dyn AssetStore,
    output: PathBuf,
) -> StrataResult<(CompositeRequest, Vec<RenderWarning>)> {
    let interval = activation.interval;
    let mut warnings = Vec::new();
    let mut inputs = Vec::with_capacity(activation.layers.len());

    for active in &activation.layers {
        let Some(layer) = plan.layers.get(active.layer_index) else {
            continue;
        };

        let resolved = match layer.source_ref() {
            Some(source_ref) => match assets.resolve(source_ref) {
                Ok(path) => Some(path),
                Err(err) if err.is_recoverable() => None,
                Err(err) => return Err(err),
            },
            None => None,
        };

        match resolved {
            Some(path) => inputs.push(CompositeInput {
                layer_index: active.layer_index,
                kind: layer.kind,
                path,
                offset: active.local_offset,
                placement: placement_for(layer),
            }),
            None => {
                tracing::warn!(
                    interval = interval.index,
                    layer = active.layer_index,
                    source = layer.source.as_deref().unwrap_or(""),
                    "Dropping layer with unresolved source"
                );
                warnings.push(RenderWarning::LayerDropped {
                    interval: interval.index,
                    layer_index: active.layer_index,
                    source: layer.source.clone(),
                });
            }
        }
    }

    if inputs.is_empty() && !activation.is_filler() {
        warnings.push(RenderWarning::IntervalDegraded {
            interval: interval.index,
            start: interval.start,
            end: interval.end,
        });
    }

    let frames = interval.frame_count(plan.fps);
    let request = CompositeRequest {
        interval_index: interval.index,
        width: plan.width,
        height: plan.height,
        fps: plan.fps,
        frames,
        duration: frames_to_secs(frames, plan.fps),
        inputs,
        output,
    };

    Ok((request, warnings))
}

/// Render the request as an ffmpeg `-filter_complex` graph.
///
/// Input `0` is the base canvas; input `i + 1` is `request.inputs[i]`.
pub fn filter_complex(request: &CompositeRequest) -> String {
    let mut graph = String::from("[0:v]setpts=PTS-STARTPTS[base]");
    let mut below = String::from("base");

    for (i, input) in request.inputs.iter().enumerate() {
        let p = &input.placement;
        let _ = write!(
            graph,
            ";[{src}:v]fps={fps},setpts=PTS-STARTPTS,{scale}",
            src = i + 1,
            fps = request.fps,
            scale = scale_chain(p),
        );
        if p.opacity < 1.0 {
            let _ = write!(
                graph,
                ",format=rgba,colorchannelmixer=aa={:.4}",
                p.opacity
            );
        }
        let _ = write!(graph, "[l{i}]");

        let (x, y) = overlay_position(p);
        let _ = write!(graph, ";[{below}][l{i}]overlay=x={x}:y={y}[s{i}]");
        below = format!("s{i}");
    }

    let _ = write!(graph, ";[{below}]format=yuv420p[{OUTPUT_LABEL}]");
    graph
}

fn scale_chain(p: &Placement) -> String {
    match p.fit {
        FitMode::Cover => format!(
            "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h}",
            w = p.width,
            h = p.height
        ),
        FitMode::Contain => format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease:force_divisible_by=2",
            w = p.width,
            h = p.height
        ),
    }
}

/// Overlay coordinates. Contained sources are centred inside their box, using
/// the overlay input's own scaled size (`w`, `h`).
fn overlay_position(p: &Placement) -> (String, String) {
    match p.fit {
        FitMode::Cover => (p.x.to_string(), p.y.to_string()),
        FitMode::Contain => (
            format!("{}+({}-w)/2", p.x, p.width),
            format!("{}+({}-h)/2", p.y, p.height),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::Path;

    use strata_common::error::StrataError;
    use strata_processing_core::SegmentPlan;
    use strata_project_model::plan::LayerKind;

    struct MapStore(HashMap<String, PathBuf>);

    impl AssetStore for MapStore {
        fn resolve(&self, source_ref: &str) -> StrataResult<PathBuf> {
            self.0
                .get(source_ref)
                .cloned()
                .ok_or_else(|| StrataError::unresolved(source_ref))
        }
    }

    fn store(keys: &[&str]) -> MapStore {
        MapStore(
            keys.iter()
                .map(|k| (k.to_string(), Path::new("/media").join(k)))
                .collect(),
        )
    }

    fn request(inputs: Vec<CompositeInput>) -> CompositeRequest {
        CompositeRequest {
            interval_index: 0,
            width: 1280,
            height: 720,
            fps: 30,
            frames: 60,
            duration: 2.0,
            inputs,
            output: PathBuf::from("/tmp/out.mp4"),
        }
    }

    fn input(fit: FitMode, opacity: f64) -> CompositeInput {
        CompositeInput {
            layer_index: 0,
            kind: LayerKind::Video,
            path: PathBuf::from("/media/a.mp4"),
            offset: 0.0,
            placement: Placement {
                x: 100,
                y: 50,
                width: 640,
                height: 360,
                fit,
                opacity,
            },
        }
    }

    #[test]
    fn test_even_ceil() {
        assert_eq!(even_ceil(0), 2);
        assert_eq!(even_ceil(1), 2);
        assert_eq!(even_ceil(2), 2);
        assert_eq!(even_ceil(641), 642);
        assert_eq!(even_ceil(1080), 1080);
    }

    #[test]
    fn test_even_ceil_saturates_at_largest_even() {
        assert_eq!(even_ceil(u32::MAX), u32::MAX - 1);
        assert_eq!(even_ceil(u32::MAX - 1), u32::MAX - 1);

        let layer = Layer::new(LayerKind::Video, "wide", 0.0, 1.0, u32::MAX, 2);
        let p = placement_for(&layer);
        assert_eq!((p.width, p.height), (u32::MAX - 1, 2));
    }

    #[test]
    fn test_placement_rounds_box_up() {
        let layer = Layer::new(LayerKind::Image, "logo", 0.0, 1.0, 101, 33).with_position(-5, 7);
        let p = placement_for(&layer);
        assert_eq!((p.x, p.y, p.width, p.height), (-5, 7, 102, 34));
        assert_eq!(p.fit, FitMode::Cover);
    }

    #[test]
    fn test_filler_graph_is_base_only() {
        let graph = filter_complex(&request(vec![]));
        assert_eq!(
            graph,
            "[0:v]setpts=PTS-STARTPTS[base];[base]format=yuv420p[vout]"
        );
    }

    #[test]
    fn test_cover_scales_up_and_crops() {
        let graph = filter_complex(&request(vec![input(FitMode::Cover, 1.0)]));
        assert!(graph.contains(
            "[1:v]fps=30,setpts=PTS-STARTPTS,scale=640:360:force_original_aspect_ratio=increase,crop=640:360[l0]"
        ));
        assert!(graph.contains("[base][l0]overlay=x=100:y=50[s0]"));
        assert!(graph.ends_with("[s0]format=yuv420p[vout]"));
        assert!(!graph.contains("colorchannelmixer"));
    }

    #[test]
    fn test_contain_centres_inside_box() {
        let graph = filter_complex(&request(vec![input(FitMode::Contain, 1.0)]));
        assert!(graph.contains("force_original_aspect_ratio=decrease:force_divisible_by=2"));
        assert!(!graph.contains("crop="));
        assert!(graph.contains("overlay=x=100+(640-w)/2:y=50+(360-h)/2"));
    }

    #[test]
    fn test_partial_opacity_multiplies_alpha() {
        let graph = filter_complex(&request(vec![input(FitMode::Cover, 0.5)]));
        assert!(graph.contains(",format=rgba,colorchannelmixer=aa=0.5000[l0]"));
    }

    #[test]
    fn test_inputs_stack_in_order() {
        let graph = filter_complex(&request(vec![
            input(FitMode::Cover, 1.0),
            input(FitMode::Contain, 1.0),
        ]));
        let first = graph.find("[base][l0]overlay").unwrap();
        let second = graph.find("[s0][l1]overlay").unwrap();
        assert!(first < second);
        assert!(graph.contains("[2:v]fps=30"));
        assert!(graph.ends_with("[s1]format=yuv420p[vout]"));
    }

    fn overlap_plan() -> RenderPlan {
        let mut plan = RenderPlan::new(1280, 720, 30, 10.0);
        plan.layers
            .push(Layer::new(LayerKind::Video, "a", 0.0, 10.0, 1280, 720).with_trim_start(2.0));
        plan.layers.push(
            Layer::new(LayerKind::Image, "b", 3.0, 4.0, 200, 200)
                .with_position(40, 40)
                .with_fit(FitMode::Contain),
        );
        plan
    }

    #[test]
    fn test_compose_interval_binds_offsets_and_order() {
        let plan = overlap_plan();
        let segments = SegmentPlan::build(&plan);
        let (req, warnings) = compose_interval(
            &plan,
            &segments.activations[1],
            &store(&["a", "b"]),
            PathBuf::from("/scratch/interval_00001.mp4"),
        )
        .unwrap();

        assert!(warnings.is_empty());
        assert_eq!(req.interval_index, 1);
        assert_eq!(req.frames, 120);
        assert_eq!(req.duration, 4.0);
        assert_eq!(req.inputs.len(), 2);
        assert_eq!(req.inputs[0].path, PathBuf::from("/media/a"));
        assert!((req.inputs[0].offset - 5.0).abs() < 1e-9);
        assert_eq!(req.inputs[1].kind, LayerKind::Image);
        assert_eq!(req.inputs[1].offset, 0.0);
    }

    #[test]
    fn test_unresolved_layer_is_dropped_with_warning() {
        let plan = overlap_plan();
        let segments = SegmentPlan::build(&plan);
        let (req, warnings) = compose_interval(
            &plan,
            &segments.activations[1],
            &store(&["a"]),
            PathBuf::from("/scratch/interval_00001.mp4"),
        )
        .unwrap();

        assert_eq!(req.inputs.len(), 1);
        assert_eq!(
            warnings,
            vec![RenderWarning::LayerDropped {
                interval: 1,
                layer_index: 1,
                source: Some("b".to_string()),
            }]
        );
    }

    #[test]
    fn test_all_layers_dropped_degrades_to_filler() {
        let plan = overlap_plan();
        let segments = SegmentPlan::build(&plan);
        let (req, warnings) = compose_interval(
            &plan,
            &segments.activations[0],
            &store(&[]),
            PathBuf::from("/scratch/interval_00000.mp4"),
        )
        .unwrap();

        assert!(req.is_filler());
        assert_eq!(warnings.len(), 2);
        assert!(matches!(
            warnings[1],
            RenderWarning::IntervalDegraded { interval: 0, .. }
        ));
    }
}
