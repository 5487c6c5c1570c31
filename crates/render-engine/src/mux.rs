//! Muxer: the final container.
//!
//! The container is written inside the scratch directory first and only
//! moved to the requested output path once the engine has succeeded, so a
//! failed render never leaves a partial file behind.

use std::path::{Path, PathBuf};

use strata_common::error::StrataResult;

use crate::engine::{Artifact, EncodingEngine};
use crate::scratch::ScratchSpace;

/// Mux `video` and optional `audio`, then move the result to `output`.
pub async fn mux_to_output(
    engine: &dyn EncodingEngine,
    video: &Artifact,
    audio: Option<&Artifact>,
    scratch: &ScratchSpace,
    output: &Path,
) -> StrataResult<PathBuf> {
    let staged = scratch.file(&staged_name(output));
    let muxed = engine.mux(video, audio, &staged).await?;
    persist(&muxed.path, output).await?;

    tracing::info!(
        output = %output.display(),
        with_audio = audio.is_some(),
        "Output written"
    );
    Ok(output.to_path_buf())
}

/// Scratch file name keeping the output's extension so the engine picks the
/// same container.
fn staged_name(output: &Path) -> String {
    let ext = output
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .unwrap_or("mp4");
    format!("output.{ext}")
}

/// Move `from` to `to`, falling back to copy when they sit on different
/// filesystems.
pub async fn persist(from: &Path, to: &Path) -> StrataResult<()> {
    if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    copy_into_place(from, to).await
}

/// Copy `from` beside `to` under a hidden name, then rename it over `to`.
/// On failure the partial copy is removed and `to` is left as it was.
async fn copy_into_place(from: &Path, to: &Path) -> StrataResult<()> {
    let partial = partial_path(to);
    let copied = match tokio::fs::copy(from, &partial).await {
        Ok(_) => tokio::fs::rename(&partial, to).await,
        Err(err) => Err(err),
    };
    if let Err(err) = copied {
        tokio::fs::remove_file(&partial).await.ok();
        tracing::warn!(output = %to.display(), error = %err, "Failed to copy output into place");
        return Err(err.into());
    }
    Ok(())
}

fn partial_path(to: &Path) -> PathBuf {
    let name = to
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    to.with_file_name(format!(".{name}.partial"))
}
