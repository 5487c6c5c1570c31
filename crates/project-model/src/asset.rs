//! Asset lookup for plan sources.
//!
//! Layers and audio segments refer to media by key, never by ownership.
//! The table maps keys to files on disk; a key that is absent or points at a
//! missing file is reported as [`StrataError::UnresolvedAsset`], which the
//! render pipeline treats as recoverable.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strata_common::error::{StrataError, StrataResult};

use crate::plan::PlanError;

/// Resolves a plan source key to a readable file.
pub trait AssetStore: Send + Sync {
    fn resolve(&self, source_ref: &str) -> StrataResult<PathBuf>;
}

/// Asset table loaded from JSON (`assets.json`).
///
/// ```json
/// { "root": "/srv/media", "assets": { "media://intro.mp4": "intro.mp4" } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetTable {
    /// Base directory for relative asset paths.
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Source key → file path.
    #[serde(default)]
    pub assets: BTreeMap<String, PathBuf>,
}

impl AssetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table whose relative paths resolve against `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            assets: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, source_ref: impl Into<String>, path: impl Into<PathBuf>) {
        self.assets.insert(source_ref.into(), path.into());
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Load a table from a JSON file. Relative paths resolve against the
    /// table's `root`, or the file's own directory when `root` is absent.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PlanError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| PlanError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut table: AssetTable =
            serde_json::from_str(&json).map_err(|e| PlanError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;
        if table.root.is_none() {
            table.root = path.parent().map(Path::to_path_buf);
        }
        Ok(table)
    }

    fn full_path(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Report every key whose file is missing, as human-readable lines.
    pub fn missing_files(&self) -> Vec<String> {
        self.assets
            .iter()
            .filter(|(_, path)| !self.full_path(path).is_file())
            .map(|(key, path)| format!("{key} -> {} (missing)", self.full_path(path).display()))
            .collect()
    }
}

impl AssetStore for AssetTable {
    fn resolve(&self, source_ref: &str) -> StrataResult<PathBuf> {
        let path = self
            .assets
            .get(source_ref)
            .map(|p| self.full_path(p))
            .ok_or_else(|| StrataError::unresolved(source_ref))?;
        if !path.is_file() {
            return Err(StrataError::unresolved(source_ref));
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("clip.mp4"), b"x").unwrap();

        let mut table = AssetTable::with_root(dir.path());
        table.insert("media://clip.mp4", "clip.mp4");

        let path = table.resolve("media://clip.mp4").unwrap();
        assert_eq!(path, dir.path().join("clip.mp4"));
    }

    #[test]
    fn test_unknown_key_is_unresolved() {
        let table = AssetTable::new();
        let err = table.resolve("media://nope.mp4").unwrap_err();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("media://nope.mp4"));
    }

    #[test]
    fn test_key_pointing_at_missing_file_is_unresolved() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = AssetTable::with_root(dir.path());
        table.insert("a", "gone.png");

        assert!(matches!(
            table.resolve("a"),
            Err(StrataError::UnresolvedAsset { .. })
        ));
        assert_eq!(table.missing_files().len(), 1);
    }

    #[test]
    fn test_load_defaults_root_to_table_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bg.png"), b"x").unwrap();
        let table_path = dir.path().join("assets.json");
        std::fs::write(&table_path, r#"{"assets":{"bg":"bg.png"}}"#).unwrap();

        let table = AssetTable::load(&table_path).unwrap();
        assert_eq!(table.root.as_deref(), Some(dir.path()));
        assert!(table.resolve("bg").is_ok());
        assert!(table.missing_files().is_empty());
    }
}
