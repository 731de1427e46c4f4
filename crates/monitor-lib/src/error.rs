//! Error types for container runtime access

use thiserror::Error;

/// Errors raised by a [`ContainerRuntime`](crate::runtime::ContainerRuntime)
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The runtime endpoint could not be reached
    #[error("Container runtime unavailable: {message}")]
    Connection { message: String },

    /// The container disappeared or never existed
    #[error("Container not found: {id}")]
    NotFound { id: String },

    /// The runtime answered with an error
    #[error("Container runtime error: {message}")]
    Api { message: String },

    /// A field the core depends on was absent from the runtime's answer
    #[error("Runtime response missing field '{field}'")]
    MissingField { field: &'static str },

    /// A one-shot stats stream ended without a sample
    #[error("No stats sample returned for container {id}")]
    EmptyStats { id: String },
}

pub type RuntimeResult<T> = std::result::Result<T, RuntimeError>;
