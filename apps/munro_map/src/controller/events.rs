//! UI/backend events and error modeling for the map controller.

use client_core::{
    tiles::{TileError, TileId},
    LoadReport,
};
use shared::error::LoadError;

use crate::ui::tile_cache::TileImage;

pub enum UiEvent {
    Info(String),
    MunrosLoaded(LoadReport),
    Error(UiError),
    Tile(TileEvent),
}

pub enum TileEvent {
    Loaded { tile: TileId, image: TileImage },
    Failed { tile: TileId, reason: String },
}

impl TileEvent {
    pub fn failed(err: &TileError, tile: TileId) -> Self {
        Self::Failed {
            tile,
            reason: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    LoadMunros,
}

impl UiErrorContext {
    pub fn label(self) -> &'static str {
        match self {
            Self::BackendStartup => "starting the backend",
            Self::LoadMunros => "loading munros",
        }
    }
}

pub fn classify_load_failure(err: &LoadError) -> String {
    match err {
        LoadError::Transport(_) => {
            "Munro provider unreachable; showing the map without markers.".to_string()
        }
        LoadError::Status(status) if *status >= 500 => format!(
            "Munro provider failed (HTTP {status}); showing the map without markers."
        ),
        LoadError::Status(status) => format!(
            "Munro provider rejected the request (HTTP {status}); showing the map without markers."
        ),
        LoadError::Body(_) => {
            "Munro provider sent data in an unexpected shape; showing the map without markers."
                .to_string()
        }
        LoadError::Cancelled => "Munro load cancelled.".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("invalid")
            || message_lower.contains("missing")
            || message_lower.contains("malformed")
            || message_lower.contains("unexpected shape")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("timeout")
            || message_lower.contains("timed out")
            || message_lower.contains("connection")
            || message_lower.contains("network")
            || message_lower.contains("unreachable")
            || message_lower.contains("dns")
            || message_lower.contains("http 5")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn from_load_error(err: &LoadError) -> Self {
        let category = match err {
            LoadError::Transport(_) | LoadError::Status(_) => UiErrorCategory::Transport,
            LoadError::Body(_) => UiErrorCategory::Validation,
            LoadError::Cancelled => UiErrorCategory::Unknown,
        };
        Self {
            category,
            context: UiErrorContext::LoadMunros,
            message: classify_load_failure(err),
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Transport => "Network",
        UiErrorCategory::Validation => "Data",
        UiErrorCategory::Unknown => "Unexpected",
    }
}
