//! Structured error types for the boundaries named in the error-handling
//! design: configuration and asset errors abort construction; in-render
//! numerical degeneracies never reach this type (they are handled locally,
//! per material and integrator fallback paths).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("asset error: {0}")]
    Asset(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type RenderResult<T> = Result<T, RenderError>;
