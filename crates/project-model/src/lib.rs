//! Strata Project Model
//!
//! Defines the data contracts for Strata renders:
//! - **Plan:** Flat render plan of z-ordered visual layers and audio segments
//! - **Assets:** Lookup from plan source keys to media files
//! - **Composition:** Multi-track editor documents that flatten into plans
//! - **EDL:** Edit decision lists for single-source cut exports
//!
//! All times are seconds on the shared output timeline; all geometry is in
//! output canvas pixels.

pub mod asset;
pub mod composition;
pub mod edl;
pub mod plan;

pub use asset::*;
pub use composition::*;
pub use edl::*;
pub use plan::*;
