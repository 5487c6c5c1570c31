//! Edit decision list export.
//!
//! A single source is cut into the kept ranges of the EDL's first video
//! track, each re-encoded, and the excerpts are joined in clip order.

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use strata_common::error::{StrataError, StrataResult};
use strata_project_model::edl::Edl;
use uuid::Uuid;

use crate::engine::{EncodingEngine, ExcerptRequest};
use crate::mux::persist;
use crate::scratch::ScratchSpace;

/// Summary of an EDL export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdlExport {
    pub output: PathBuf,
    pub render_id: Uuid,
    pub segments: usize,
    pub duration: f64,
    pub elapsed_secs: f64,
}

/// Cut requests for `source`, one per kept range, in clip order.
pub fn excerpt_requests(
    edl: &Edl,
    source: &Path,
    scratch: &ScratchSpace,
) -> StrataResult<Vec<ExcerptRequest>> {
    let ranges = edl.cut_list()?;
    Ok(ranges
        .into_iter()
        .enumerate()
        .map(|(i, (start, end))| ExcerptRequest {
            source: source.to_path_buf(),
            start,
            end,
            output: scratch.file(&format!("edl_{i:05}.mp4")),
        })
        .collect())
}

/// Render `edl` against `source` into `output`.
pub async fn export_edl(
    engine: &dyn EncodingEngine,
    edl: &Edl,
    source: &Path,
    scratch_root: &Path,
    output: &Path,
) -> StrataResult<EdlExport> {
    let started = Instant::now();
    if !source.is_file() {
        return Err(StrataError::FileNotFound {
            path: source.to_path_buf(),
        });
    }

    let scratch = ScratchSpace::create(scratch_root)?;
    let requests = excerpt_requests(edl, source, &scratch)?;
    tracing::info!(
        render_id = %scratch.render_id(),
        source = %source.display(),
        segments = requests.len(),
        "Exporting EDL"
    );

    let mut excerpts = Vec::with_capacity(requests.len());
    for request in &requests {
        excerpts.push(engine.cut_excerpt(request).await?);
    }

    let joined = if excerpts.len() == 1 {
        excerpts.remove(0)
    } else {
        engine.concat(&excerpts, &scratch.file("edl_joined.mp4")).await?
    };
    persist(&joined.path, output).await?;

    tracing::info!(
        output = %output.display(),
        segments = requests.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "EDL export finished"
    );

    Ok(EdlExport {
        output: output.to_path_buf(),
        render_id: scratch.render_id(),
        segments: requests.len(),
        duration: joined.duration,
        elapsed_secs: started.elapsed().as_secs_f64(),
    })
}
