//! Renderer errors.

use thiserror::Error;

/// Errors that can occur before rendering starts.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Scene has no objects to render")]
    EmptyScene,

    #[error("Invalid camera: {0}")]
    InvalidCamera(String),

    #[error("Invalid render config: {0}")]
    InvalidConfig(String),
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;
