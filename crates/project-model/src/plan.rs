//! Render plan types and validation.
//!
//! A render plan is the flat, already-resolved description of one output:
//! visual layers drawn bottom-to-top in array order, an independent list of
//! audio segments, and the output canvas. Every time value is in seconds on
//! the shared output timeline.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strata_common::error::StrataError;

/// Top-level render plan (`plan.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderPlan {
    /// Visual layers. Later entries draw on top of earlier ones.
    pub layers: Vec<Layer>,

    /// Audio segments, concatenated in this order.
    #[serde(default)]
    pub audio: Vec<AudioSegment>,

    /// Distinct sources referenced by the plan (informational).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media_sources: Vec<String>,

    /// Output canvas width in pixels.
    pub width: u32,

    /// Output canvas height in pixels.
    pub height: u32,

    /// Output frame rate.
    pub fps: u32,

    /// Length of the output timeline in seconds.
    pub total_duration: f64,
}

/// What a layer's source decodes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    /// A video excerpt read from `trim_start` onward.
    Video,
    /// A still image held for the layer's whole duration.
    Image,
}

/// How a layer's native aspect ratio is reconciled with its target box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Fill the box and crop the excess. Never letterboxes.
    #[default]
    Cover,
    /// Fit inside the box without cropping. May leave transparent margins.
    Contain,
}

/// A time-bounded visual element with its own spatial transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    #[serde(rename = "type")]
    pub kind: LayerKind,

    /// Lookup key into the asset table. `None` or empty never resolves.
    #[serde(default)]
    pub source: Option<String>,

    /// Absolute start on the output timeline.
    pub time: f64,

    /// Length on the output timeline.
    pub duration: f64,

    /// Offset into the source at which the layer starts reading.
    #[serde(default)]
    pub trim_start: f64,

    /// Top-left corner of the layer box in canvas pixels.
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,

    /// Layer box size in canvas pixels.
    pub width: u32,
    pub height: u32,

    /// Uniform alpha multiplier in `[0.0, 1.0]`.
    #[serde(default = "default_opacity")]
    pub opacity: f64,

    #[serde(default)]
    pub fit: FitMode,
}

/// One excerpt of the audio track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSegment {
    #[serde(default)]
    pub source: Option<String>,

    /// Position on the output timeline (informational; segments are
    /// concatenated in plan order).
    #[serde(default)]
    pub time: f64,

    pub duration: f64,

    #[serde(default)]
    pub trim_start: f64,

    /// Linear gain applied while extracting.
    #[serde(default = "default_volume")]
    pub volume: f64,
}

fn default_opacity() -> f64 {
    1.0
}

fn default_volume() -> f64 {
    1.0
}

impl Layer {
    /// A full-opacity cover-fit layer at the canvas origin.
    pub fn new(
        kind: LayerKind,
        source: impl Into<String>,
        time: f64,
        duration: f64,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            kind,
            source: Some(source.into()),
            time,
            duration,
            trim_start: 0.0,
            x: 0,
            y: 0,
            width,
            height,
            opacity: 1.0,
            fit: FitMode::Cover,
        }
    }

    pub fn with_trim_start(mut self, trim_start: f64) -> Self {
        self.trim_start = trim_start;
        self
    }

    pub fn with_position(mut self, x: i32, y: i32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_fit(mut self, fit: FitMode) -> Self {
        self.fit = fit;
        self
    }

    /// Absolute end on the output timeline (exclusive).
    pub fn end(&self) -> f64 {
        self.time + self.duration
    }

    /// The source key, if it is present and non-empty.
    pub fn source_ref(&self) -> Option<&str> {
        non_empty(self.source.as_deref())
    }
}

impl AudioSegment {
    pub fn new(source: impl Into<String>, time: f64, duration: f64) -> Self {
        Self {
            source: Some(source.into()),
            time,
            duration,
            trim_start: 0.0,
            volume: 1.0,
        }
    }

    pub fn with_trim_start(mut self, trim_start: f64) -> Self {
        self.trim_start = trim_start;
        self
    }

    pub fn source_ref(&self) -> Option<&str> {
        non_empty(self.source.as_deref())
    }
}

fn non_empty(source: Option<&str>) -> Option<&str> {
    source.map(str::trim).filter(|s| !s.is_empty())
}

impl RenderPlan {
    /// An empty plan over a canvas.
    pub fn new(width: u32, height: u32, fps: u32, total_duration: f64) -> Self {
        Self {
            layers: vec![],
            audio: vec![],
            media_sources: vec![],
            width,
            height,
            fps,
            total_duration,
        }
    }

    /// Parse and validate a plan from JSON text.
    pub fn from_json(json: &str) -> Result<Self, PlanError> {
        let plan: RenderPlan = serde_json::from_str(json).map_err(|e| PlanError::ParseError {
            path: PathBuf::from("<inline>"),
            source: e,
        })?;
        plan.validate()?;
        Ok(plan)
    }

    /// Load and validate a plan from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PlanError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| PlanError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let plan: RenderPlan = serde_json::from_str(&json).map_err(|e| PlanError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        plan.validate()?;
        Ok(plan)
    }

    /// Write the plan as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PlanError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|e| PlanError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        std::fs::write(path, json).map_err(|e| PlanError::IoError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Check structural invariants. A plan that passes may still reference
    /// missing assets; those are handled per layer during rendering.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.width == 0 || self.height == 0 {
            return Err(PlanError::invalid(format!(
                "canvas must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        if self.fps == 0 {
            return Err(PlanError::invalid("fps must be positive"));
        }
        if !self.total_duration.is_finite() || self.total_duration <= 0.0 {
            return Err(PlanError::invalid(format!(
                "total_duration must be positive, got {}",
                self.total_duration
            )));
        }

        for (index, layer) in self.layers.iter().enumerate() {
            if !layer.duration.is_finite() || layer.duration <= 0.0 {
                return Err(PlanError::invalid(format!(
                    "layer {index}: duration must be positive, got {}",
                    layer.duration
                )));
            }
            if !layer.time.is_finite() || layer.time < 0.0 {
                return Err(PlanError::invalid(format!(
                    "layer {index}: time must be non-negative, got {}",
                    layer.time
                )));
            }
            if !layer.trim_start.is_finite() || layer.trim_start < 0.0 {
                return Err(PlanError::invalid(format!(
                    "layer {index}: trim_start must be non-negative, got {}",
                    layer.trim_start
                )));
            }
            if layer.width == 0 || layer.height == 0 {
                return Err(PlanError::invalid(format!(
                    "layer {index}: box must be non-empty, got {}x{}",
                    layer.width, layer.height
                )));
            }
            if !(0.0..=1.0).contains(&layer.opacity) {
                return Err(PlanError::invalid(format!(
                    "layer {index}: opacity must be within [0, 1], got {}",
                    layer.opacity
                )));
            }
        }

        for (index, segment) in self.audio.iter().enumerate() {
            // Zero or negative durations are skipped at render time, not rejected.
            if !segment.duration.is_finite() {
                return Err(PlanError::invalid(format!(
                    "audio segment {index}: duration must be finite"
                )));
            }
            if !segment.trim_start.is_finite() || segment.trim_start < 0.0 {
                return Err(PlanError::invalid(format!(
                    "audio segment {index}: trim_start must be non-negative, got {}",
                    segment.trim_start
                )));
            }
            if !segment.volume.is_finite() || segment.volume < 0.0 {
                return Err(PlanError::invalid(format!(
                    "audio segment {index}: volume must be non-negative, got {}",
                    segment.volume
                )));
            }
        }

        Ok(())
    }

    /// Distinct non-empty sources referenced by layers and audio, in first-use order.
    pub fn distinct_sources(&self) -> Vec<String> {
        let mut sources: Vec<String> = vec![];
        let refs = self
            .layers
            .iter()
            .filter_map(Layer::source_ref)
            .chain(self.audio.iter().filter_map(AudioSegment::source_ref));
        for source in refs {
            if !sources.iter().any(|s| s == source) {
                sources.push(source.to_string());
            }
        }
        sources
    }
}

/// Errors that can occur when loading or validating plans.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid plan: {message}")]
    ValidationError { message: String },
}

impl PlanError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::ValidationError {
            message: msg.into(),
        }
    }
}

impl From<PlanError> for StrataError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::IoError { path, source } if source.kind() == std::io::ErrorKind::NotFound => {
                StrataError::FileNotFound { path }
            }
            PlanError::IoError { source, .. } => StrataError::Io(source),
            other => StrataError::invalid_plan(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plan() -> RenderPlan {
        let mut plan = RenderPlan::new(1080, 1920, 30, 10.0);
        plan.layers
            .push(Layer::new(LayerKind::Video, "media://main.mp4", 0.0, 10.0, 1080, 1920));
        plan.layers.push(
            Layer::new(LayerKind::Image, "media://logo.png", 3.0, 4.0, 200, 200)
                .with_position(40, 40)
                .with_opacity(0.5)
                .with_fit(FitMode::Contain),
        );
        plan.audio.push(AudioSegment::new("media://main.mp4", 0.0, 10.0));
        plan
    }

    #[test]
    fn test_plan_json_uses_snake_case_and_type_tag() {
        let json = serde_json::to_string(&sample_plan()).unwrap();
        assert!(json.contains("\"type\":\"video\""));
        assert!(json.contains("\"type\":\"image\""));
        assert!(json.contains("\"total_duration\":10.0"));
        assert!(json.contains("\"trim_start\":0.0"));
        assert!(json.contains("\"fit\":\"contain\""));
    }

    #[test]
    fn test_layer_defaults_when_optional_keys_missing() {
        let json = r#"{
            "layers": [{"type":"image","source":"a.png","time":1,"duration":2,"width":10,"height":10}],
            "width": 640, "height": 360, "fps": 25, "total_duration": 5
        }"#;
        let plan = RenderPlan::from_json(json).unwrap();
        let layer = &plan.layers[0];
        assert_eq!(layer.kind, LayerKind::Image);
        assert_eq!(layer.fit, FitMode::Cover);
        assert!((layer.opacity - 1.0).abs() < 1e-12);
        assert_eq!((layer.x, layer.y), (0, 0));
        assert!(plan.audio.is_empty());
    }

    #[test]
    fn test_missing_required_key_is_rejected() {
        let json = r#"{
            "layers": [{"type":"video","source":"a.mp4","time":0,"width":10,"height":10}],
            "width": 640, "height": 360, "fps": 25, "total_duration": 5
        }"#;
        assert!(matches!(
            RenderPlan::from_json(json),
            Err(PlanError::ParseError { .. })
        ));
    }

    #[test]
    fn test_unknown_layer_type_is_rejected() {
        let json = r#"{
            "layers": [{"type":"text","time":0,"duration":1,"width":10,"height":10}],
            "width": 640, "height": 360, "fps": 25, "total_duration": 5
        }"#;
        assert!(RenderPlan::from_json(json).is_err());
    }

    #[test]
    fn test_validate_rejects_non_positive_layer_duration() {
        let mut plan = sample_plan();
        plan.layers[1].duration = 0.0;
        let err = plan.validate().unwrap_err();
        assert!(err.to_string().contains("layer 1"));

        plan.layers[1].duration = -2.0;
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_canvas_and_timeline() {
        let mut plan = sample_plan();
        plan.total_duration = 0.0;
        assert!(plan.validate().is_err());

        let mut plan = sample_plan();
        plan.fps = 0;
        assert!(plan.validate().is_err());

        let mut plan = sample_plan();
        plan.width = 0;
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_opacity_out_of_range() {
        let mut plan = sample_plan();
        plan.layers[0].opacity = 1.5;
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_validate_allows_layer_past_timeline_end() {
        let mut plan = sample_plan();
        plan.layers[1].duration = 60.0;
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_validate_allows_zero_duration_audio() {
        let mut plan = sample_plan();
        plan.audio[0].duration = 0.0;
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_source_ref_treats_blank_as_missing() {
        let mut layer = Layer::new(LayerKind::Video, "  ", 0.0, 1.0, 2, 2);
        assert_eq!(layer.source_ref(), None);
        layer.source = None;
        assert_eq!(layer.source_ref(), None);
        layer.source = Some("clip.mp4".to_string());
        assert_eq!(layer.source_ref(), Some("clip.mp4"));
    }

    #[test]
    fn test_distinct_sources_in_first_use_order() {
        let plan = sample_plan();
        assert_eq!(
            plan.distinct_sources(),
            vec!["media://main.mp4".to_string(), "media://logo.png".to_string()]
        );
    }

    #[test]
    fn test_plan_error_maps_to_invalid_plan() {
        let err: StrataError = PlanError::invalid("nope").into();
        assert!(matches!(err, StrataError::InvalidPlan { .. }));
    }

    #[test]
    fn test_save_and_load_plan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        let plan = sample_plan();
        plan.save(&path).unwrap();

        let loaded = RenderPlan::load(&path).unwrap();
        assert_eq!(loaded, plan);
    }

    #[test]
    fn test_load_missing_file_maps_to_file_not_found() {
        let err: StrataError = RenderPlan::load("/nonexistent/strata/plan.json")
            .unwrap_err()
            .into();
        assert!(matches!(err, StrataError::FileNotFound { .. }));
    }
}
