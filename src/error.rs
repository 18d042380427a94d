//! Error types for mounting the widget and loading its data.

use thiserror::Error;

/// Coarse classification of a load failure, as shown to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Required configuration (the data URL) is missing.
    Configuration,
    /// The request failed or the response was unusable.
    Transport,
    /// The backend answered but reported its own error.
    Upstream,
}

/// Failure of the single coordinate fetch. Always terminal for the page view.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("map data URL is not configured")]
    MissingDataUrl,

    #[error("request failed: {0}")]
    Request(String),

    #[error("HTTP {status}{}", status_detail(.detail))]
    Status { status: u16, detail: Option<String> },

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("API Error: {0}")]
    Upstream(String),
}

fn status_detail(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(" ({d})")).unwrap_or_default()
}

impl LoadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LoadError::MissingDataUrl => ErrorKind::Configuration,
            LoadError::Request(_) | LoadError::Status { .. } | LoadError::Decode(_) => {
                ErrorKind::Transport
            }
            LoadError::Upstream(_) => ErrorKind::Upstream,
        }
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(e: serde_json::Error) -> Self {
        LoadError::Decode(e.to_string())
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for LoadError {
    fn from(e: reqwest::Error) -> Self {
        LoadError::Request(e.to_string())
    }
}

/// Failure to construct a rendering artifact. Never fatal once mounted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("invalid heatmap options: {0}")]
    InvalidHeatmapOptions(String),

    #[error("rendering backend error: {0}")]
    Backend(String),
}

/// Failure while bootstrapping the widget. Nothing can render after this.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MountError {
    #[error("map container element #{0} not found")]
    MissingContainer(String),

    #[error("map initialization failed: {0}")]
    MapInit(#[from] RenderError),
}

/// Invalid page-provided configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid map configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unknown view mode: {0}")]
    UnknownViewMode(String),
}
