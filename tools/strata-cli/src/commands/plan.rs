//! Print the segmentation plan for a render plan.

use std::path::PathBuf;

use strata_processing_core::SegmentPlan;
use strata_project_model::plan::RenderPlan;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let plan =
        RenderPlan::load(&path).map_err(|e| anyhow::anyhow!("Failed to load plan: {e}"))?;

    let segments = SegmentPlan::build(&plan);
    tracing::debug!(
        intervals = segments.len(),
        filler = segments.filler_count(),
        "Segmented {}",
        path.display()
    );

    println!("{}", serde_json::to_string_pretty(&segments)?);
    Ok(())
}
