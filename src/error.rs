use crate::asset::MediaKind;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while compressing a single asset
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompressError {
    #[error("Failed to probe media: {0}")]
    ProbeFailed(String),

    #[error(
        "Unsupported type '{mime}'{}",
        .expected.map(|k| format!(", expected {} media", k)).unwrap_or_default()
    )]
    UnsupportedType {
        mime: String,
        expected: Option<MediaKind>,
    },

    #[error("Target of {target_bytes} bytes is not meaningfully smaller than the {original_bytes} byte source")]
    ObjectiveUnreachable {
        target_bytes: u64,
        original_bytes: u64,
    },

    #[error("Target of {target_bytes} bytes is below the {minimum_bytes} byte minimum")]
    ObjectiveTooSmall {
        target_bytes: u64,
        minimum_bytes: u64,
    },

    #[error("Media duration is unknown, cannot derive a bitrate for the size target")]
    MissingDuration,

    #[error("Encoding failed: {reason}")]
    EncodeFailed { reason: String },

    #[error("Encoding did not finish within {}s", after.as_secs())]
    EncodeTimedOut { after: Duration },

    #[error("Encoding was cancelled")]
    Cancelled,
}

impl CompressError {
    pub fn encode_failed(reason: impl Into<String>) -> Self {
        CompressError::EncodeFailed {
            reason: reason.into(),
        }
    }

    /// Whether a user retry with different parameters can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CompressError::ObjectiveUnreachable { .. }
                | CompressError::ObjectiveTooSmall { .. }
                | CompressError::MissingDuration
                | CompressError::EncodeTimedOut { .. }
        )
    }
}

/// Reduction ratio of an empty input. Reported, never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Reduction is undefined for an empty input")]
pub struct ReductionUndefined;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Failed to serialize TOML: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not enough disk space: {required} bytes required")]
    InsufficientSpace { required: u64 },

    #[error(transparent)]
    Compress(#[from] CompressError),
}
