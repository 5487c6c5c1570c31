//! Error types shared across Strata crates.

use std::path::PathBuf;

/// Top-level error type for Strata operations.
///
/// `UnresolvedAsset` is the only recoverable kind: callers drop the affected
/// layer or audio segment and record a warning. Every other kind aborts the
/// render it occurs in.
#[derive(Debug, thiserror::Error)]
pub enum StrataError {
    #[error("Invalid render plan: {message}")]
    InvalidPlan { message: String },

    #[error("Unresolved asset: {source_ref}")]
    UnresolvedAsset { source_ref: String },

    #[error("Encode failure during {step}: {message}")]
    EncodeFailure {
        step: String,
        message: String,
        /// Engine diagnostic output. Never used for control flow.
        stderr: String,
    },

    #[error("Assembly mismatch: {message}")]
    AssemblyMismatch { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using StrataError.
pub type StrataResult<T> = Result<T, StrataError>;

impl StrataError {
    pub fn invalid_plan(msg: impl Into<String>) -> Self {
        Self::InvalidPlan {
            message: msg.into(),
        }
    }

    pub fn unresolved(source_ref: impl Into<String>) -> Self {
        Self::UnresolvedAsset {
            source_ref: source_ref.into(),
        }
    }

    pub fn encode(step: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::EncodeFailure {
            step: step.into(),
            message: msg.into(),
            stderr: String::new(),
        }
    }

    pub fn encode_with_stderr(
        step: impl Into<String>,
        msg: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::EncodeFailure {
            step: step.into(),
            message: msg.into(),
            stderr: stderr.into(),
        }
    }

    pub fn assembly(msg: impl Into<String>) -> Self {
        Self::AssemblyMismatch {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    /// Whether the pipeline may continue after this error by dropping the
    /// element that produced it.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::UnresolvedAsset { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unresolved_asset_is_recoverable() {
        assert!(StrataError::unresolved("media://a.mp4").is_recoverable());
        assert!(!StrataError::invalid_plan("bad").is_recoverable());
        assert!(!StrataError::encode("concat", "exit 1").is_recoverable());
        assert!(!StrataError::assembly("count").is_recoverable());
    }

    #[test]
    fn test_encode_failure_message_omits_stderr() {
        let err = StrataError::encode_with_stderr("segment 3", "exit status 1", "long log");
        assert_eq!(
            err.to_string(),
            "Encode failure during segment 3: exit status 1"
        );
        match err {
            StrataError::EncodeFailure { stderr, .. } => assert_eq!(stderr, "long log"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
