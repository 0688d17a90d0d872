//! Error types for the simulation.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown entity kind: {0}")]
    UnknownKind(String),

    #[error("Position ({x}, {y}) out of bounds [0, {max}]")]
    OutOfBounds { x: i32, y: i32, max: i32 },

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
