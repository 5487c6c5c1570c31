//! Per-render scratch space.
//!
//! Every render gets its own directory under the configured scratch root,
//! named after a fresh render id. The directory and everything in it is
//! removed when the [`ScratchSpace`] is dropped, whether the render
//! succeeded or not.

use std::path::{Path, PathBuf};

use strata_common::error::{StrataError, StrataResult};
use tempfile::TempDir;
use uuid::Uuid;

#[derive(Debug)]
pub struct ScratchSpace {
    render_id: Uuid,
    dir: TempDir,
}

impl ScratchSpace {
    /// Create a fresh scratch directory under `root`, creating `root` if needed.
    pub fn create(root: &Path) -> StrataResult<Self> {
        std::fs::create_dir_all(root).map_err(|e| {
            StrataError::config(format!(
                "Cannot create scratch root {}: {e}",
                root.display()
            ))
        })?;

        let render_id = Uuid::new_v4();
        let dir = tempfile::Builder::new()
            .prefix(&format!("render-{render_id}-"))
            .tempdir_in(root)?;

        tracing::debug!(%render_id, dir = %dir.path().display(), "Scratch space created");
        Ok(Self { render_id, dir })
    }

    pub fn render_id(&self) -> Uuid {
        self.render_id
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// A path inside the scratch directory.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn interval_clip(&self, index: usize) -> PathBuf {
        self.file(&format!("interval_{index:05}.mp4"))
    }

    pub fn audio_part(&self, index: usize) -> PathBuf {
        self.file(&format!("audio_{index:05}.wav"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scratch_is_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let path = {
            let scratch = ScratchSpace::create(&root.path().join("nested")).unwrap();
            std::fs::write(scratch.interval_clip(0), b"clip").unwrap();
            assert!(scratch.path().is_dir());
            scratch.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_scratch_dir_is_named_after_render_id() {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchSpace::create(root.path()).unwrap();
        let name = scratch.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(&format!("render-{}-", scratch.render_id())));
        assert!(scratch
            .interval_clip(12)
            .ends_with("interval_00012.mp4"));
        assert!(scratch.audio_part(3).ends_with("audio_00003.wav"));
    }
}
