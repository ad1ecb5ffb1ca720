//! Error taxonomy
//!
//! Configuration errors reach the operator through [`ErrorBody`]. Resolution
//! and render errors never leave the page: the hover engine logs them and
//! shows no preview.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("hover trailers are disabled")]
    Disabled,

    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to read settings from {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings in {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }

    /// HTTP status the script-delivery surface answers with
    pub fn status(&self) -> u16 {
        match self {
            Self::Disabled => 404,
            Self::Invalid { .. } => 400,
            Self::Read { .. } | Self::Parse { .. } => 500,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Disabled => "FEATURE_DISABLED",
            Self::Invalid { .. } => "INVALID_CONFIGURATION",
            Self::Read { .. } | Self::Parse { .. } => "INTERNAL_ERROR",
        }
    }
}

/// Failure to obtain trailer info for a hovered item
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("no trailer for item {0}")]
    NotFound(String),

    #[error("trailer lookup failed with status {0}")]
    Status(u16),

    #[error("trailer lookup failed: {0}")]
    Transport(String),

    #[error("malformed trailer payload: {0}")]
    Payload(String),
}

/// Failure to build a preview for a resolved trailer
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("unrecognised remote video url: {0}")]
    InvalidRemoteSource(String),
}

/// JSON error body returned to operators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub request_id: String,
}

impl ErrorBody {
    pub fn new(code: impl Into<String>, message: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            detail,
            request_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message, None)
    }
}

impl From<&ConfigError> for ErrorBody {
    fn from(err: &ConfigError) -> Self {
        let detail = std::error::Error::source(err).map(|source| source.to_string());
        Self::new(err.code(), err.to_string(), detail)
    }
}
