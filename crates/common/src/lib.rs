//! Strata Common Utilities
//!
//! Shared infrastructure for all Strata crates:
//! - Error types and result aliases
//! - Timeline timecode helpers (epsilon comparisons, rounding, frame grid, ffmpeg formatting)
//! - Tracing/logging initialization
//! - Configuration loading

pub mod config;
pub mod error;
pub mod logging;
pub mod timecode;

pub use config::*;
pub use error::*;
pub use timecode::*;
