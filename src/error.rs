// Error types for the boundary operations that are allowed to fail
// outright. The engine's row/format pipeline never returns `Result` —
// see `engine.rs` — this is reserved for the codec's file-level parse
// failure.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("CSV error: {0}")]
    Csv(String),

    #[error("invalid user format: {0}")]
    InvalidUserFormat(String),
}

impl From<csv::Error> for EngineError {
    fn from(e: csv::Error) -> Self {
        EngineError::Csv(e.to_string())
    }
}
