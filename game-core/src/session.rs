use crate::{GuessEvaluator, LanguageCatalog, SessionError, ValidationError};
use chrono::{DateTime, Utc};
use game_types::{Feedback, GameStatus, GuessResponse};
use std::collections::BTreeSet;

/// Persisted form of a session, used to rebuild it from storage.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub username: String,
    pub language: String,
    pub secret_word: String,
    pub guesses: Vec<String>,
    pub feedback: Vec<Feedback>,
    pub remaining_letters: BTreeSet<char>,
    pub guess_count: u32,
    pub elapsed_seconds: f64,
    pub status: GameStatus,
    pub started_at: DateTime<Utc>,
    pub max_tries: u32,
}

/// What an accepted guess did to the session.
#[derive(Debug, Clone, PartialEq)]
pub struct GuessOutcome {
    pub feedback: Feedback,
    pub status: GameStatus,
    /// True only for the guess that moved the session out of `InProgress`.
    pub finished: bool,
}

/// One player's attempt at a secret word.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSession {
    username: String,
    language: String,
    secret_word: String, // Hidden from clients until the game ends
    guesses: Vec<String>,
    feedback: Vec<Feedback>,
    remaining_letters: BTreeSet<char>,
    guess_count: u32,
    elapsed_seconds: f64,
    status: GameStatus,
    started_at: DateTime<Utc>,
    max_tries: u32,
}

impl GameSession {
    pub fn new(
        username: impl Into<String>,
        catalog: &LanguageCatalog,
        secret_word: impl Into<String>,
        max_tries: u32,
    ) -> Self {
        Self::new_at(username, catalog, secret_word, max_tries, Utc::now())
    }

    pub fn new_at(
        username: impl Into<String>,
        catalog: &LanguageCatalog,
        secret_word: impl Into<String>,
        max_tries: u32,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            username: username.into(),
            language: catalog.code().to_string(),
            secret_word: secret_word.into(),
            guesses: Vec::new(),
            feedback: Vec::new(),
            remaining_letters: catalog.letters().clone(),
            guess_count: 0,
            elapsed_seconds: 0.0,
            status: GameStatus::InProgress,
            started_at,
            max_tries,
        }
    }

    pub fn from_record(record: SessionRecord) -> Self {
        Self {
            username: record.username,
            language: record.language,
            secret_word: record.secret_word,
            guesses: record.guesses,
            feedback: record.feedback,
            remaining_letters: record.remaining_letters,
            guess_count: record.guess_count,
            elapsed_seconds: record.elapsed_seconds,
            status: record.status,
            started_at: record.started_at,
            max_tries: record.max_tries,
        }
    }

    pub fn to_record(&self) -> SessionRecord {
        SessionRecord {
            username: self.username.clone(),
            language: self.language.clone(),
            secret_word: self.secret_word.clone(),
            guesses: self.guesses.clone(),
            feedback: self.feedback.clone(),
            remaining_letters: self.remaining_letters.clone(),
            guess_count: self.guess_count,
            elapsed_seconds: self.elapsed_seconds,
            status: self.status,
            started_at: self.started_at,
            max_tries: self.max_tries,
        }
    }

    /// Check a raw guess without touching the session.
    pub fn validate(raw: &str, catalog: &LanguageCatalog) -> Result<(), ValidationError> {
        let length = raw.chars().count();
        if length != catalog.word_length() {
            return Err(ValidationError::WrongLength {
                expected: catalog.word_length(),
                actual: length,
            });
        }

        if !raw.chars().all(|c| c.is_alphabetic() && c.is_lowercase()) {
            return Err(ValidationError::InvalidCharacters(raw.to_string()));
        }

        if !catalog.contains(raw) {
            return Err(ValidationError::NotInWordlist(raw.to_string()));
        }

        Ok(())
    }

    pub fn submit_guess(
        &mut self,
        raw: &str,
        catalog: &LanguageCatalog,
    ) -> Result<GuessOutcome, SessionError> {
        self.submit_guess_at(raw, catalog, Utc::now())
    }

    /// Apply one guess. Rejected guesses leave the session untouched and do
    /// not consume a try.
    pub fn submit_guess_at(
        &mut self,
        raw: &str,
        catalog: &LanguageCatalog,
        now: DateTime<Utc>,
    ) -> Result<GuessOutcome, SessionError> {
        if self.status.is_terminal() {
            return Err(SessionError::GameEnded);
        }

        Self::validate(raw, catalog)?;
        let feedback = GuessEvaluator::evaluate(&self.secret_word, raw)?;

        // Only letters conclusively absent from the secret are struck off.
        for ch in raw.chars() {
            if !self.secret_word.contains(ch) {
                self.remaining_letters.remove(&ch);
            }
        }

        self.guesses.push(raw.to_string());
        self.feedback.push(feedback.clone());
        self.guess_count += 1;

        let elapsed = (now - self.started_at).num_milliseconds() as f64 / 1000.0;
        self.elapsed_seconds = self.elapsed_seconds.max(elapsed);

        self.status = if raw == self.secret_word {
            GameStatus::Won
        } else if self.guess_count >= self.max_tries {
            GameStatus::Lost
        } else {
            GameStatus::InProgress
        };

        Ok(GuessOutcome {
            feedback,
            status: self.status,
            finished: self.status.is_terminal(),
        })
    }

    /// The secret word, once the game is over.
    pub fn reveal(&self) -> Option<&str> {
        self.status
            .is_terminal()
            .then_some(self.secret_word.as_str())
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn guesses(&self) -> &[String] {
        &self.guesses
    }

    pub fn feedback(&self) -> &[Feedback] {
        &self.feedback
    }

    pub fn remaining_letters(&self) -> &BTreeSet<char> {
        &self.remaining_letters
    }

    pub fn guess_count(&self) -> u32 {
        self.guess_count
    }

    pub fn tries_left(&self) -> u32 {
        self.max_tries.saturating_sub(self.guess_count)
    }

    pub fn max_tries(&self) -> u32 {
        self.max_tries
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn is_won(&self) -> bool {
        self.status == GameStatus::Won
    }

    /// Client view of the session; never includes the secret word.
    pub fn to_response(&self) -> GuessResponse {
        GuessResponse {
            game_status: self.status,
            letters: self.remaining_letters.iter().copied().collect(),
            guesses: self.guesses.clone(),
            formatted_guesses: self.feedback.clone(),
            guess_number: self.guess_count,
            time: self.elapsed_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use game_types::FeedbackCode;

    fn catalog() -> LanguageCatalog {
        LanguageCatalog::from_word_lists(
            "en",
            "apple\ncrane\nslate\nhello\nworld\nplane\nbrick\nfjord",
            "apple\ncrane",
            "a b c d e f g h i j k l m n o p q r s t u v w x y z",
            5,
        )
        .unwrap()
    }

    #[test]
    fn test_new_session() {
        let catalog = catalog();
        let session = GameSession::new("alice", &catalog, "crane", 6);

        assert_eq!(session.status(), GameStatus::InProgress);
        assert_eq!(session.guess_count(), 0);
        assert!(session.guesses().is_empty());
        assert_eq!(session.remaining_letters().len(), 26);
        assert_eq!(session.language(), "en");
        assert_eq!(session.reveal(), None);
    }

    #[test]
    fn test_remaining_letters_keep_present_ones() {
        let catalog = catalog();
        let mut session = GameSession::new("alice", &catalog, "crane", 6);

        // s, l, t are absent; a and e are in the secret
        session.submit_guess("slate", &catalog).unwrap();
        let letters = session.remaining_letters();
        assert!(!letters.contains(&'s'));
        assert!(!letters.contains(&'l'));
        assert!(!letters.contains(&'t'));
        assert!(letters.contains(&'a'));
        assert!(letters.contains(&'e'));
        assert_eq!(letters.len(), 23);
    }

    #[test]
    fn test_rejected_guess_does_not_consume_try() {
        let catalog = catalog();
        let mut session = GameSession::new("alice", &catalog, "crane", 6);
        let before = session.clone();

        let cases = [
            ("", ValidationError::WrongLength { expected: 5, actual: 0 }),
            ("cranes", ValidationError::WrongLength { expected: 5, actual: 6 }),
            ("CRANE", ValidationError::InvalidCharacters("CRANE".into())),
            ("cr4ne", ValidationError::InvalidCharacters("cr4ne".into())),
            ("zzzzz", ValidationError::NotInWordlist("zzzzz".into())),
        ];

        for (raw, expected) in cases {
            let result = session.submit_guess(raw, &catalog);
            assert_eq!(result, Err(SessionError::Validation(expected)));
        }
        assert_eq!(session, before);
    }

    #[test]
    fn test_win_on_try_k() {
        let catalog = catalog();
        for k in 1..=6u32 {
            let mut session = GameSession::new("alice", &catalog, "crane", 6);
            for _ in 1..k {
                let outcome = session.submit_guess("hello", &catalog).unwrap();
                assert!(!outcome.finished);
            }
            let outcome = session.submit_guess("crane", &catalog).unwrap();

            assert!(outcome.finished);
            assert_eq!(outcome.status, GameStatus::Won);
            assert!(outcome.feedback.iter().all(|c| *c == FeedbackCode::Correct));
            assert_eq!(session.guess_count(), k);
            assert_eq!(session.guesses().len() as u32, session.guess_count());
            assert_eq!(session.reveal(), Some("crane"));
        }
    }

    #[test]
    fn test_loss_after_max_tries() {
        let catalog = catalog();
        let mut session = GameSession::new("alice", &catalog, "crane", 6);
        let guesses = ["hello", "world", "plane", "brick", "fjord", "apple"];

        for (i, guess) in guesses.iter().enumerate() {
            let outcome = session.submit_guess(guess, &catalog).unwrap();
            assert_eq!(outcome.finished, i == guesses.len() - 1);
        }

        assert_eq!(session.status(), GameStatus::Lost);
        assert_eq!(session.guess_count(), 6);
        assert_eq!(session.guesses().len(), 6);
        assert_eq!(session.feedback().len(), 6);
        assert_eq!(session.reveal(), Some("crane"));
    }

    #[test]
    fn test_terminal_session_rejects_guesses() {
        let catalog = catalog();
        let mut session = GameSession::new("alice", &catalog, "crane", 6);
        session.submit_guess("crane", &catalog).unwrap();
        let before = session.clone();

        assert_eq!(
            session.submit_guess("hello", &catalog),
            Err(SessionError::GameEnded)
        );
        // Even an invalid guess reports the ended game first
        assert_eq!(
            session.submit_guess("xx", &catalog),
            Err(SessionError::GameEnded)
        );
        assert_eq!(session, before);
    }

    #[test]
    fn test_last_try_can_still_win() {
        let catalog = catalog();
        let mut session = GameSession::new("alice", &catalog, "crane", 2);
        session.submit_guess("hello", &catalog).unwrap();
        let outcome = session.submit_guess("crane", &catalog).unwrap();

        assert_eq!(outcome.status, GameStatus::Won);
        assert_eq!(session.tries_left(), 0);
    }

    #[test]
    fn test_elapsed_time_is_monotonic() {
        let catalog = catalog();
        let start = Utc::now();
        let mut session = GameSession::new_at("alice", &catalog, "crane", 6, start);

        session
            .submit_guess_at("hello", &catalog, start + Duration::seconds(10))
            .unwrap();
        assert_eq!(session.elapsed_seconds(), 10.0);

        // A clock that steps backwards never shrinks the elapsed time
        session
            .submit_guess_at("world", &catalog, start + Duration::seconds(4))
            .unwrap();
        assert_eq!(session.elapsed_seconds(), 10.0);

        session
            .submit_guess_at("crane", &catalog, start + Duration::milliseconds(30_500))
            .unwrap();
        assert_eq!(session.elapsed_seconds(), 30.5);
    }

    #[test]
    fn test_record_round_trip_preserves_state() {
        let catalog = catalog();
        let mut session = GameSession::new("alice", &catalog, "crane", 6);
        session.submit_guess("slate", &catalog).unwrap();

        let mut restored = GameSession::from_record(session.to_record());
        assert_eq!(restored, session);

        let outcome = restored.submit_guess("crane", &catalog).unwrap();
        assert!(outcome.finished);
        assert_eq!(restored.guess_count(), 2);
    }

    #[test]
    fn test_response_hides_secret() {
        let catalog = catalog();
        let mut session = GameSession::new("alice", &catalog, "crane", 6);
        session.submit_guess("slate", &catalog).unwrap();

        let response = session.to_response();
        assert_eq!(response.game_status, GameStatus::InProgress);
        assert_eq!(response.guesses, vec!["slate".to_string()]);
        assert_eq!(response.guess_number, 1);
        assert_eq!(response.formatted_guesses.len(), 1);
        assert!(response.letters.windows(2).all(|w| w[0] < w[1]));
    }
}
