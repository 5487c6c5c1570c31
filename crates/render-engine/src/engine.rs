//! Encoding engine contract.
//!
//! Everything that touches pixels or samples goes through [`EncodingEngine`].
//! The pipeline only ever hands it fully-resolved, declarative requests and
//! receives finished files back.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use strata_common::error::StrataResult;
use strata_project_model::plan::{FitMode, LayerKind};

/// A file produced by the engine, with the duration it was asked to cover.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub path: PathBuf,
    pub duration: f64,
}

impl Artifact {
    pub fn new(path: impl Into<PathBuf>, duration: f64) -> Self {
        Self {
            path: path.into(),
            duration,
        }
    }
}

/// Where and how one input lands on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Top-left corner of the layer box, canvas pixels. May be off-canvas.
    pub x: i32,
    pub y: i32,
    /// Box size, already rounded up to even.
    pub width: u32,
    pub height: u32,
    pub fit: FitMode,
    pub opacity: f64,
}

/// One decoded source feeding a composite.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeInput {
    /// Index of the layer in the render plan.
    pub layer_index: usize,
    pub kind: LayerKind,
    pub path: PathBuf,
    /// Source read position for local time zero.
    pub offset: f64,
    pub placement: Placement,
}

/// Composite `inputs` over a black canvas into one clip of exactly `frames`
/// frames at `fps`.
///
/// Inputs are drawn in order; later inputs land on top. An empty input list
/// renders a filler clip.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeRequest {
    pub interval_index: usize,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub frames: u64,
    /// `frames / fps`, the clip length on the output timeline.
    pub duration: f64,
    pub inputs: Vec<CompositeInput>,
    pub output: PathBuf,
}

impl CompositeRequest {
    pub fn is_filler(&self) -> bool {
        self.inputs.is_empty()
    }
}

/// Cut `[trim_start, trim_start + duration)` from an audio source into the
/// normalised PCM format, scaled by `volume`.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioExtractRequest {
    pub segment_index: usize,
    pub source: PathBuf,
    pub trim_start: f64,
    pub duration: f64,
    pub volume: f64,
    pub output: PathBuf,
}

/// Re-encode `[start, end)` of a source, audio included.
#[derive(Debug, Clone, PartialEq)]
pub struct ExcerptRequest {
    pub source: PathBuf,
    pub start: f64,
    pub end: f64,
    pub output: PathBuf,
}

impl ExcerptRequest {
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

/// Trait for encoding engines (ffmpeg, or a fake in tests).
#[async_trait]
pub trait EncodingEngine: Send + Sync {
    /// Render one interval clip.
    async fn composite(&self, request: &CompositeRequest) -> StrataResult<Artifact>;

    /// Join clips end to end, in the order given.
    async fn concat(&self, clips: &[Artifact], output: &Path) -> StrataResult<Artifact>;

    /// Combine a video track with an optional audio track.
    async fn mux(
        &self,
        video: &Artifact,
        audio: Option<&Artifact>,
        output: &Path,
    ) -> StrataResult<Artifact>;

    async fn extract_audio(&self, request: &AudioExtractRequest) -> StrataResult<Artifact>;

    async fn cut_excerpt(&self, request: &ExcerptRequest) -> StrataResult<Artifact>;

    /// Check if this engine can run on the system.
    fn is_available(&self) -> bool;

    /// Engine name.
    fn name(&self) -> &str;
}
