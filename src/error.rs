use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("storage actor has shut down")]
    StoreClosed,

    #[error("invalid service `{name}`: {reason}")]
    InvalidService { name: String, reason: String },

    #[error("cannot read catalog {path}: {source}")]
    CatalogIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse catalog: {0}")]
    CatalogParse(#[from] serde_json::Error),

    #[error("cannot create data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot build http client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
