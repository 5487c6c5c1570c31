//! Show media information for one file.

use std::path::PathBuf;

use strata_common::config::AppConfig;
use strata_render_engine::probe_media;

pub async fn run(config: &AppConfig, file: PathBuf) -> anyhow::Result<()> {
    let info = probe_media(&config.engine, &file).await?;
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}
