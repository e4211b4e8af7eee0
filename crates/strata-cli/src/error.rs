use std::path::PathBuf;

use strata_layout::{ConfigError, TierMutationError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("tier edit rejected: {0}")]
    Tier(#[from] TierMutationError),

    #[error("required path does not exist: {path}")]
    MissingPath { path: PathBuf },

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl CliError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::InvalidArgument { .. } => 2,
            Self::Tier(_) => 3,
            Self::MissingPath { .. } => 4,
            Self::Io(_) | Self::Json(_) => 1,
        }
    }

    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CliError;
    use strata_layout::TierMutationError;

    #[test]
    fn exit_codes_distinguish_failure_kinds() {
        assert_eq!(CliError::invalid("x").exit_code(), 2);
        assert_eq!(CliError::from(TierMutationError::NoRemovableTier).exit_code(), 3);
        let missing = CliError::MissingPath {
            path: "/nope".into(),
        };
        assert_eq!(missing.exit_code(), 4);
        assert_eq!(missing.to_string(), "required path does not exist: /nope");
    }

    #[test]
    fn tier_error_message_is_wrapped() {
        let error = CliError::from(TierMutationError::NoRemovableTier);
        assert!(error.to_string().starts_with("tier edit rejected: "));
    }
}
