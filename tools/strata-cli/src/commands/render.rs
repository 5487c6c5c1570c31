//! Render a plan to a single video file.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use strata_common::config::AppConfig;
use strata_project_model::asset::AssetTable;
use strata_project_model::plan::RenderPlan;
use strata_render_engine::{FfmpegEngine, ProgressCallback, RenderProgress, Renderer};

pub async fn run(
    config: &AppConfig,
    plan_path: PathBuf,
    assets_path: PathBuf,
    output: PathBuf,
    concurrency: Option<usize>,
) -> anyhow::Result<()> {
    let plan = RenderPlan::load(&plan_path)
        .map_err(|e| anyhow::anyhow!("Failed to load plan: {e}"))?;
    let assets = AssetTable::load(&assets_path)
        .map_err(|e| anyhow::anyhow!("Failed to load asset table: {e}"))?;

    let engine = Arc::new(FfmpegEngine::new(config.engine.clone()));
    let mut renderer = Renderer::new(engine, Arc::new(assets), config);
    if let Some(n) = concurrency {
        renderer = renderer.with_concurrency(n);
    }

    // Progress goes to stderr so stdout carries only the JSON report.
    eprintln!("Rendering plan: {}", plan_path.display());
    eprintln!("  Canvas: {}x{} @ {} fps", plan.width, plan.height, plan.fps);
    eprintln!("  Duration: {:.3}s", plan.total_duration);
    eprintln!("  Layers: {}", plan.layers.len());
    eprintln!("  Concurrency: {}", renderer.concurrency());

    let progress_cb: ProgressCallback = Box::new(|p: RenderProgress| {
        eprint!(
            "\r  Progress: {:>5.1}% [{:<11}] ({}/{} intervals)  ",
            p.progress * 100.0,
            p.stage.as_str(),
            p.completed_intervals,
            p.total_intervals,
        );
        std::io::stderr().flush().ok();
    });

    let report = match renderer.render(&plan, &output, Some(progress_cb)).await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("\nRender failed: {e}");
            return Err(e.into());
        }
    };

    eprintln!("\nRender complete: {}", report.output.display());
    for warning in &report.warnings {
        eprintln!("  [WARN] {warning}");
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
