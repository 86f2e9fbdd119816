use game_core::{CatalogError, SessionError, StatsError};
use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Db(#[from] DbErr),
    #[error("user '{0}' already exists")]
    UserExists(String),
    #[error("user '{0}' not found")]
    UserNotFound(String),
    #[error("no game found for '{0}'")]
    GameNotFound(String),
    #[error("stats for '{0}' not found")]
    StatsNotFound(String),
    #[error("game for '{0}' was modified concurrently")]
    ConcurrentUpdate(String),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Stats(#[from] StatsError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("stored record is malformed: {0}")]
    Corrupt(String),
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Corrupt(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
