//! Strata Processing Core — timeline segmentation
//!
//! Turns a render plan's overlapping, gapped, independently-timed layers into
//! an ordered list of intervals with a constant set of active layers:
//! - **Boundaries:** Cut points at every layer start and end
//! - **Activation:** Which layers cover each interval, and from what source offset
//! - **Segment plan:** The complete, reproducible sequence of rendering steps
//!
//! This crate is pure computation — no I/O, no subprocesses.
//! All inputs are data; all outputs are data.

pub mod activation;
pub mod boundaries;
pub mod segment;

pub use activation::{activate, layers_at, ActiveLayer, Activation};
pub use boundaries::{extract_boundaries, intervals_from_boundaries, Interval};
pub use segment::SegmentPlan;
