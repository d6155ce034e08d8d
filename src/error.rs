use thiserror::Error;

#[derive(Error, Debug)]
pub enum RescueError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RPC unavailable: {0}")]
    RpcUnavailable(String),

    #[error("Top donors unavailable: ranking call failed ({rpc}); fallback query failed ({fallback})")]
    TopDonors { rpc: String, fallback: String },

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, RescueError>;
