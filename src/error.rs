//! Error type shared by the navigation core and the JNI bridge.

use thiserror::Error;

/// Errors surfaced by the navigation core.
#[derive(Debug, Error)]
pub enum NavError {
    #[error("no active navigation session")]
    NotNavigating,
    #[error("current position is unknown")]
    MissingPosition,
    #[error("routing failed: {0}")]
    Routing(String),
    #[error("position unavailable: {0}")]
    PositionUnavailable(String),
    #[error("GPX parse error: {0}")]
    Gpx(String),
    #[error("GPX data contains no usable path")]
    EmptyPath,
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
