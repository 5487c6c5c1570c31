//! Cut one source file by an edit decision list.

use std::path::PathBuf;

use strata_common::config::AppConfig;
use strata_project_model::edl::Edl;
use strata_render_engine::{export_edl, EncodingEngine, FfmpegEngine};

pub async fn run(
    config: &AppConfig,
    source: PathBuf,
    edl_path: PathBuf,
    output: PathBuf,
) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(&edl_path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", edl_path.display()))?;
    let edl = Edl::from_json(&json).map_err(|e| anyhow::anyhow!("Failed to load EDL: {e}"))?;

    let engine = FfmpegEngine::new(config.engine.clone());
    if !engine.is_available() {
        anyhow::bail!(
            "{} not found; install ffmpeg or set engine.ffmpeg_bin",
            config.engine.ffmpeg_bin
        );
    }

    eprintln!("Exporting {} by {}", source.display(), edl_path.display());
    let export = export_edl(&engine, &edl, &source, &config.scratch_dir, &output).await?;
    eprintln!(
        "Export complete: {} ({} segment(s), {:.3}s)",
        export.output.display(),
        export.segments,
        export.duration
    );

    println!("{}", serde_json::to_string_pretty(&export)?);
    Ok(())
}
