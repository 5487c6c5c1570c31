//! Strata Render Engine
//!
//! Turns a validated render plan into one output file. Segmentation comes
//! from `strata-processing-core`; everything that decodes or encodes media is
//! delegated to an [`EncodingEngine`] (ffmpeg in production).
//!
//! # Pipeline Architecture
//!
//! ```text
//! plan.json ──► SegmentPlan ──┬── interval 0 ──► composite ──┐
//!                             ├── interval 1 ──► composite ──┤  (bounded, concurrent)
//! assets.json ─── resolve ────┤        ...                   │
//!                             └── interval n ──► composite ──┘
//!                                                            │ ordered by index
//!                                                            ▼
//!                                                     concat (copy)
//!                                                            │
//! audio segments ──► extract + volume ──► concat ──► mux (AAC, +faststart)
//!                                                            │
//!                                                            ▼
//!                                                       output.mp4
//! ```

pub mod assembler;
pub mod audio;
pub mod compositor;
pub mod edl;
pub mod engine;
pub mod ffmpeg;
pub mod mux;
pub mod pipeline;
pub mod probe;
pub mod progress;
pub mod report;
pub mod scratch;

pub use edl::{export_edl, EdlExport};
pub use engine::{
    Artifact, AudioExtractRequest, CompositeInput, CompositeRequest, EncodingEngine,
    ExcerptRequest, Placement,
};
pub use ffmpeg::{command_exists, FfmpegEngine};
pub use pipeline::Renderer;
pub use probe::{parse_fps, probe_media, MediaInfo};
pub use progress::{ProgressCallback, RenderProgress, RenderStage};
pub use report::{RenderReport, RenderWarning};
pub use scratch::ScratchSpace;
