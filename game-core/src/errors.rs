use std::path::PathBuf;
use thiserror::Error;

/// Raised by the evaluator when the caller skipped length validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    #[error("guess has {guess} letters but the secret has {secret}")]
    LengthMismatch { secret: usize, guess: usize },
}

/// A guess that was refused before it could count as an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("guess must be {expected} letters long, got {actual}")]
    WrongLength { expected: usize, actual: usize },
    #[error("guess '{0}' may only contain lowercase letters")]
    InvalidCharacters(String),
    #[error("'{0}' is not in the word list")]
    NotInWordlist(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("invalid guess: {0}")]
    Validation(#[from] ValidationError),
    #[error("game ended")]
    GameEnded,
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    #[error("session for '{0}' has not finished")]
    SessionNotFinished(String),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse language data for '{language}': {source}")]
    Parse {
        language: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("language '{0}' is not available")]
    UnknownLanguage(String),
    #[error("language '{language}' has no {length}-letter solutions")]
    NoSolutions { language: String, length: usize },
    #[error("solution '{word}' for '{language}' is missing from the word list")]
    SolutionNotInWordlist { language: String, word: String },
    #[error("checksum mismatch for '{language}': expected {expected}, got {actual}")]
    ChecksumMismatch {
        language: String,
        expected: String,
        actual: String,
    },
}
