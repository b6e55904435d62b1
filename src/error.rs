//! Error types for flower generation

use thiserror::Error;

/// Errors surfaced by a single build or load call.
///
/// A failed build leaves no partial state behind; other parts built
/// from the same parameters are unaffected.
#[derive(Debug, Error)]
pub enum FlowerError {
    #[error("not enough control points: need at least {required}, got {actual}")]
    InsufficientControlPoints { required: usize, actual: usize },

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("config error: {0}")]
    Config(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, FlowerError>;

impl FlowerError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
