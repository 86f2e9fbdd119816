use game_core::{CatalogError, SessionError};
use game_persistence::RepositoryError;
use thiserror::Error;
use warp::http::StatusCode;

use crate::auth::AuthError;
use crate::username_policy::PolicyError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Missing required parameters: {0}")]
    MissingParameters(&'static str),
    #[error("User not found")]
    UserNotFound(String),
    #[error("Wrong auth")]
    WrongAuth,
    #[error("User already exists")]
    UserExists(String),
    #[error(transparent)]
    Policy(#[from] PolicyError),
    #[error("New {0} cannot be the same")]
    Unchanged(&'static str),
    #[error("Language invalid")]
    UnknownLanguage(String),
    #[error("The game doesn't exist")]
    GameNotFound(String),
    #[error("Game has not ended")]
    GameInProgress,
    #[error("Game ended")]
    GameEnded,
    #[error("Guess invalid: {0}")]
    InvalidGuess(SessionError),
    #[error("Another guess for this game is being processed")]
    Conflict,
    #[error("Stats not found")]
    StatsNotFound(String),
    #[error("Language sync failed: {0}")]
    Sync(String),
    #[error("Internal error")]
    Internal(String),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::MissingParameters(_)
            | ServiceError::UserExists(_)
            | ServiceError::Policy(PolicyError::Unallowed(_))
            | ServiceError::Unchanged(_)
            | ServiceError::UnknownLanguage(_)
            | ServiceError::GameEnded
            | ServiceError::InvalidGuess(_) => StatusCode::BAD_REQUEST,
            ServiceError::UserNotFound(_) => StatusCode::UNAUTHORIZED,
            ServiceError::WrongAuth
            | ServiceError::Policy(PolicyError::Blocklisted(_))
            | ServiceError::GameInProgress => StatusCode::FORBIDDEN,
            ServiceError::GameNotFound(_) | ServiceError::StatsNotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict => StatusCode::CONFLICT,
            ServiceError::Sync(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::WrongAuth => ServiceError::WrongAuth,
            AuthError::MalformedHash | AuthError::Hashing(_) => {
                ServiceError::Internal(err.to_string())
            }
        }
    }
}

impl From<SessionError> for ServiceError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::GameEnded => ServiceError::GameEnded,
            other => ServiceError::InvalidGuess(other),
        }
    }
}

impl From<CatalogError> for ServiceError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::UnknownLanguage(code) => ServiceError::UnknownLanguage(code),
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::UserExists(name) => ServiceError::UserExists(name),
            RepositoryError::UserNotFound(name) => ServiceError::UserNotFound(name),
            RepositoryError::GameNotFound(name) => ServiceError::GameNotFound(name),
            RepositoryError::StatsNotFound(name) => ServiceError::StatsNotFound(name),
            RepositoryError::ConcurrentUpdate(_) => ServiceError::Conflict,
            RepositoryError::Session(err) => err.into(),
            RepositoryError::Catalog(err) => err.into(),
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_core::ValidationError;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ServiceError::MissingParameters("user and auth").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::UserNotFound("x".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ServiceError::WrongAuth.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ServiceError::from(PolicyError::Blocklisted("x".into())).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ServiceError::from(PolicyError::Unallowed("x".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ServiceError::GameInProgress.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_repository_mapping() {
        let err: ServiceError = RepositoryError::Session(SessionError::GameEnded).into();
        assert!(matches!(err, ServiceError::GameEnded));

        let err: ServiceError = RepositoryError::Session(SessionError::Validation(
            ValidationError::NotInWordlist("zzzzz".into()),
        ))
        .into();
        assert!(matches!(err, ServiceError::InvalidGuess(_)));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: ServiceError = RepositoryError::ConcurrentUpdate("alice".into()).into();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err: ServiceError =
            RepositoryError::Catalog(CatalogError::UnknownLanguage("xx".into())).into();
        assert!(matches!(err, ServiceError::UnknownLanguage(code) if code == "xx"));
    }
}
