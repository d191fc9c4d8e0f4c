use thiserror::Error;

#[derive(Error, Debug)]
pub enum GateError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Session '{session_id}' not initialized")]
    SessionNotInitialized { session_id: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type GateResult<T> = Result<T, GateError>;
