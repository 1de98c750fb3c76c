use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Transport,
    Status,
    Validation,
    Cancelled,
}

/// Failure of the whole munro load. Individual bad records are reported as
/// [`RecordRejection`] instead and never fail the load.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    #[error("network failure while fetching munros: {0}")]
    Transport(String),
    #[error("munro provider returned HTTP {0}")]
    Status(u16),
    #[error("malformed munro response body: {0}")]
    Body(String),
    #[error("munro load cancelled before it resolved")]
    Cancelled,
}

impl LoadError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Transport(_) => ErrorCode::Transport,
            Self::Status(_) => ErrorCode::Status,
            Self::Body(_) => ErrorCode::Validation,
            Self::Cancelled => ErrorCode::Cancelled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordRejection {
    #[error("record {index} is malformed: {reason}")]
    Malformed { index: usize, reason: String },
    #[error("record {index} ({name}) has an invalid coordinate ({lat}, {lng})")]
    InvalidCoordinate {
        index: usize,
        name: String,
        lat: f64,
        lng: f64,
    },
    #[error("record {index} ({name}) has a non-finite height")]
    InvalidHeight { index: usize, name: String },
}

impl RecordRejection {
    pub fn index(&self) -> usize {
        match self {
            Self::Malformed { index, .. }
            | Self::InvalidCoordinate { index, .. }
            | Self::InvalidHeight { index, .. } => *index,
        }
    }
}
