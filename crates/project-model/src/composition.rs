//! Editor composition documents.
//!
//! The editor stores a multi-track composition whose element positions are
//! centre points and whose sizes may be percentages of the canvas. This
//! module validates that document and flattens it into a [`RenderPlan`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use strata_common::timecode::round_secs;

use crate::edl::{Edl, EdlClip, EdlTrack};
use crate::plan::{AudioSegment, FitMode, Layer, LayerKind, PlanError, RenderPlan};

/// Decimal places kept for times copied into a render plan.
const PLAN_TIME_DECIMALS: u32 = 4;

/// Smallest layer box edge, in pixels.
const MIN_LAYER_EDGE: u32 = 2;

/// Top-level composition document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    /// Schema version.
    pub version: u32,

    /// Canvas size; portrait 1080x1920 when absent.
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,

    #[serde(default = "default_fps")]
    pub fps: u32,

    #[serde(default)]
    pub background_color: Option<String>,

    /// Tracks in editor order: index 0 is drawn on top.
    pub tracks: Vec<Track>,
}

/// Track category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackType {
    Video,
    Audio,
    Overlay,
}

/// One editor track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(rename = "type")]
    pub kind: TrackType,

    #[serde(default)]
    pub muted: bool,

    #[serde(default)]
    pub locked: bool,

    #[serde(default = "default_true")]
    pub visible: bool,

    pub elements: Vec<Element>,
}

/// Element category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Video,
    Image,
    Audio,
    Text,
    Shape,
}

/// A pixel value or a canvas-relative expression such as `"50%"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dimension {
    Pixels(f64),
    Expr(String),
}

/// One element on a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: ElementType,

    #[serde(default)]
    pub name: String,

    pub time: f64,
    pub duration: f64,

    #[serde(default)]
    pub source: Option<String>,

    #[serde(default)]
    pub trim_start: f64,

    #[serde(default)]
    pub trim_end: f64,

    /// Centre X. Defaults to `50%`.
    #[serde(default)]
    pub x: Option<Dimension>,

    /// Centre Y. Defaults to `50%`.
    #[serde(default)]
    pub y: Option<Dimension>,

    /// Box width. Defaults to `100%`.
    #[serde(default)]
    pub width: Option<Dimension>,

    /// Box height. Defaults to `100%`.
    #[serde(default)]
    pub height: Option<Dimension>,

    #[serde(default = "default_unit")]
    pub opacity: f64,

    #[serde(default)]
    pub fit: FitMode,

    #[serde(default = "default_unit")]
    pub volume: f64,
}

fn default_width() -> u32 {
    1080
}

fn default_height() -> u32 {
    1920
}

fn default_fps() -> u32 {
    30
}

fn default_true() -> bool {
    true
}

fn default_unit() -> f64 {
    1.0
}

impl Dimension {
    /// Resolve a position against a canvas edge of `total` pixels.
    pub fn resolve_position(&self, total: u32) -> f64 {
        match self {
            Dimension::Pixels(v) => *v,
            Dimension::Expr(s) => match percent(s) {
                Some(pct) => pct / 100.0 * total as f64,
                None => leading_number(s),
            },
        }
    }

    /// Resolve a size against a canvas edge; zero or unparseable means the
    /// full edge.
    pub fn resolve_size(&self, total: u32) -> f64 {
        let value = match self {
            Dimension::Pixels(v) => *v,
            Dimension::Expr(s) => match percent(s) {
                Some(pct) => return pct / 100.0 * total as f64,
                None => leading_number(s),
            },
        };
        if value == 0.0 {
            total as f64
        } else {
            value
        }
    }
}

fn percent(s: &str) -> Option<f64> {
    s.trim()
        .strip_suffix('%')
        .map(|n| n.trim().parse::<f64>().unwrap_or(0.0))
}

fn leading_number(s: &str) -> f64 {
    let s = s.trim();
    let end = s
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || *c == '.' || (*i == 0 && (*c == '-' || *c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    s[..end].parse::<f64>().unwrap_or(0.0)
}

impl Composition {
    /// Parse and validate a composition from JSON text.
    pub fn from_json(json: &str) -> Result<Self, PlanError> {
        let composition: Composition =
            serde_json::from_str(json).map_err(|e| PlanError::invalid(e.to_string()))?;
        composition.validate()?;
        Ok(composition)
    }

    /// Load and validate a composition file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PlanError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| PlanError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let composition: Composition =
            serde_json::from_str(&json).map_err(|e| PlanError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;
        composition.validate()?;
        Ok(composition)
    }

    /// Structural checks beyond what deserialization enforces.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.width == 0 || self.height == 0 {
            return Err(PlanError::invalid("composition canvas must be non-empty"));
        }
        for track in &self.tracks {
            for element in &track.elements {
                if !element.time.is_finite() || !element.duration.is_finite() {
                    return Err(PlanError::invalid(format!(
                        "element {} on track {} has a non-finite time",
                        element.id, track.id
                    )));
                }
            }
        }
        Ok(())
    }

    /// Latest element end across all tracks.
    pub fn calculate_duration(&self) -> f64 {
        self.tracks
            .iter()
            .flat_map(|t| t.elements.iter())
            .map(|e| e.time + e.duration)
            .fold(0.0, f64::max)
    }

    /// Flatten into a render plan.
    ///
    /// Tracks are walked last-to-first so the bottom editor track becomes the
    /// first (lowest) layer. Hidden tracks are skipped, as are audio elements
    /// on muted or non-audio tracks. Text and shape elements are not rendered.
    pub fn build_render_plan(&self) -> RenderPlan {
        let width = self.width;
        let height = self.height;

        let mut plan = RenderPlan::new(
            width,
            height,
            self.fps,
            round_secs(self.calculate_duration(), PLAN_TIME_DECIMALS),
        );

        for track in self.tracks.iter().rev() {
            if !track.visible {
                continue;
            }

            for element in &track.elements {
                let kind = match element.kind {
                    ElementType::Video => Some(LayerKind::Video),
                    ElementType::Image => Some(LayerKind::Image),
                    _ => None,
                };

                if let Some(kind) = kind {
                    let center_x = resolve_position(element.x.as_ref(), width);
                    let center_y = resolve_position(element.y.as_ref(), height);
                    let box_w = resolve_size(element.width.as_ref(), width);
                    let box_h = resolve_size(element.height.as_ref(), height);

                    plan.layers.push(Layer {
                        kind,
                        source: element.source.clone(),
                        time: round_secs(element.time, PLAN_TIME_DECIMALS),
                        duration: round_secs(element.duration, PLAN_TIME_DECIMALS),
                        trim_start: round_secs(element.trim_start, PLAN_TIME_DECIMALS),
                        x: (center_x - box_w / 2.0).round() as i32,
                        y: (center_y - box_h / 2.0).round() as i32,
                        width: (box_w.round().max(0.0) as u32).max(MIN_LAYER_EDGE),
                        height: (box_h.round().max(0.0) as u32).max(MIN_LAYER_EDGE),
                        opacity: element.opacity,
                        fit: element.fit,
                    });
                    push_source(&mut plan.media_sources, element.source.as_deref());
                } else if element.kind == ElementType::Audio
                    && track.kind == TrackType::Audio
                    && !track.muted
                {
                    plan.audio.push(AudioSegment {
                        source: element.source.clone(),
                        time: round_secs(element.time, PLAN_TIME_DECIMALS),
                        duration: round_secs(element.duration, PLAN_TIME_DECIMALS),
                        trim_start: round_secs(element.trim_start, PLAN_TIME_DECIMALS),
                        volume: element.volume,
                    });
                }
            }
        }

        plan
    }

    /// Single-source edit decision list from the video elements on video
    /// tracks, ordered by timeline position.
    pub fn to_edl(&self) -> Edl {
        let mut clips: Vec<(f64, EdlClip)> = self
            .tracks
            .iter()
            .filter(|t| t.kind == TrackType::Video)
            .flat_map(|t| t.elements.iter())
            .filter(|e| e.kind == ElementType::Video)
            .map(|e| {
                (
                    e.time,
                    EdlClip {
                        start: e.trim_start,
                        end: e.trim_start + e.duration,
                        trim_start: 0.0,
                        trim_end: 0.0,
                    },
                )
            })
            .collect();
        clips.sort_by(|a, b| a.0.total_cmp(&b.0));

        Edl {
            tracks: vec![EdlTrack {
                id: None,
                kind: TrackType::Video,
                muted: false,
                clips: clips.into_iter().map(|(_, clip)| clip).collect(),
            }],
        }
    }
}

fn resolve_position(value: Option<&Dimension>, total: u32) -> f64 {
    value.map_or(total as f64 / 2.0, |d| d.resolve_position(total))
}

fn resolve_size(value: Option<&Dimension>, total: u32) -> f64 {
    value.map_or(total as f64, |d| d.resolve_size(total))
}

fn push_source(sources: &mut Vec<String>, source: Option<&str>) {
    if let Some(source) = source.filter(|s| !s.is_empty()) {
        if !sources.iter().any(|s| s == source) {
            sources.push(source.to_string());
        }
    }
}
