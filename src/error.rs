//! Error types for pybox

use thiserror::Error;

/// Result type alias using pybox's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for pybox
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invocation payload error (missing or unparseable input file)
    #[error("Payload error: {0}")]
    Payload(String),

    /// Program composition error
    #[error("Template error: {0}")]
    Template(String),

    /// Interpreter sandbox error
    #[error("Interpreter error: {0}")]
    Interpreter(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<handlebars::RenderError> for Error {
    fn from(err: handlebars::RenderError) -> Self {
        Error::Template(err.to_string())
    }
}

impl From<wasmtime::Error> for Error {
    fn from(err: wasmtime::Error) -> Self {
        Error::Interpreter(err.to_string())
    }
}
