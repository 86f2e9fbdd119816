use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

/// Raw wire value that does not map onto a known code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownCode(pub u8);

impl fmt::Display for UnknownCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown code {}", self.0)
    }
}

impl std::error::Error for UnknownCode {}

/// Result for a single letter of a guess. Serialized as its numeric code so
/// clients can map it straight onto a colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum FeedbackCode {
    Absent = 0,  // letter not in word
    Present = 1, // letter in word, other position
    Correct = 2, // letter in this position
}

impl From<FeedbackCode> for u8 {
    fn from(code: FeedbackCode) -> Self {
        code as u8
    }
}

impl TryFrom<u8> for FeedbackCode {
    type Error = UnknownCode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FeedbackCode::Absent),
            1 => Ok(FeedbackCode::Present),
            2 => Ok(FeedbackCode::Correct),
            other => Err(UnknownCode(other)),
        }
    }
}

/// Feedback for one guess, one code per character position.
pub type Feedback = Vec<FeedbackCode>;

/// Lifecycle of a game session. The numeric values are part of the wire
/// format and of the persisted `games.status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum GameStatus {
    Lost = 0,
    InProgress = 1,
    Won = 2,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, GameStatus::InProgress)
    }
}

impl From<GameStatus> for u8 {
    fn from(status: GameStatus) -> Self {
        status as u8
    }
}

impl TryFrom<u8> for GameStatus {
    type Error = UnknownCode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(GameStatus::Lost),
            1 => Ok(GameStatus::InProgress),
            2 => Ok(GameStatus::Won),
            other => Err(UnknownCode(other)),
        }
    }
}

/// State of the caller's current game after an accepted guess.
/// The secret word is never part of this payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GuessResponse {
    #[ts(type = "number")]
    pub game_status: GameStatus,
    pub letters: Vec<char>,
    pub guesses: Vec<String>,
    #[ts(type = "Array<Array<number>>")]
    pub formatted_guesses: Vec<Feedback>,
    pub guess_number: u32,
    pub time: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feedback_serializes_as_numbers() {
        let feedback = vec![
            FeedbackCode::Correct,
            FeedbackCode::Present,
            FeedbackCode::Absent,
        ];
        let json = serde_json::to_string(&feedback).unwrap();
        assert_eq!(json, "[2,1,0]");
    }

    #[test]
    fn test_unknown_code_rejected() {
        let result: Result<FeedbackCode, _> = serde_json::from_str("3");
        assert!(result.is_err());

        let status: Result<GameStatus, _> = serde_json::from_str("7");
        assert!(status.is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(GameStatus::Won.is_terminal());
        assert!(GameStatus::Lost.is_terminal());
        assert!(!GameStatus::InProgress.is_terminal());
        assert_eq!(u8::from(GameStatus::InProgress), 1);
    }
}
