//! Validate a render plan and, optionally, its asset table.

use std::path::PathBuf;

use strata_processing_core::SegmentPlan;
use strata_project_model::asset::{AssetStore, AssetTable};
use strata_project_model::plan::RenderPlan;

pub fn run(path: PathBuf, assets: Option<PathBuf>) -> anyhow::Result<()> {
    println!("Validating plan at: {}", path.display());

    let plan =
        RenderPlan::load(&path).map_err(|e| anyhow::anyhow!("Failed to load plan: {e}"))?;

    let segments = SegmentPlan::build(&plan);
    println!("  Canvas: {}x{} @ {} fps", plan.width, plan.height, plan.fps);
    println!("  Duration: {:.3}s", plan.total_duration);
    println!("  Layers: {}", plan.layers.len());
    println!("  Audio segments: {}", plan.audio.len());
    println!(
        "  Intervals: {} ({} filler)",
        segments.len(),
        segments.filler_count()
    );

    let Some(assets_path) = assets else {
        println!("\nPlan is valid.");
        return Ok(());
    };

    let table = AssetTable::load(&assets_path)
        .map_err(|e| anyhow::anyhow!("Failed to load asset table: {e}"))?;

    let mut issues: Vec<String> = plan
        .distinct_sources()
        .into_iter()
        .filter(|source| table.resolve(source).is_err())
        .map(|source| format!("{source} (unresolved)"))
        .collect();
    issues.extend(table.missing_files());

    if issues.is_empty() {
        println!("  Sources: All resolved");
        println!("\nPlan is valid.");
    } else {
        println!("\nValidation issues:");
        for issue in &issues {
            println!("  - {issue}");
        }
        println!(
            "\n{} issue(s) found. Affected layers will render as filler.",
            issues.len()
        );
    }

    Ok(())
}
