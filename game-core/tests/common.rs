#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use game_core::{GameEvent, GameEventHandler, GameSession, LanguageCatalog};
use std::sync::{Arc, Mutex};

pub const ALPHABET: &str = "a b c d e f g h i j k l m n o p q r s t u v w x y z";

/// Creates a test catalog with a known set of words
pub fn create_test_catalog() -> LanguageCatalog {
    let wordlist = "apple\ncrane\nslate\nhello\nworld\nhouse\nmouse\ntrain\nplane\nwater\nstone\nbread\ncream\nllama\nabbey";
    let solutions = "apple\ncrane\nhouse\nwater";
    LanguageCatalog::from_word_lists("en", wordlist, solutions, ALPHABET, 5).unwrap()
}

/// Creates a session with a fixed start time
pub fn create_session(secret: &str, max_tries: u32) -> (GameSession, DateTime<Utc>) {
    let start = Utc::now();
    let catalog = create_test_catalog();
    (
        GameSession::new_at("tester", &catalog, secret, max_tries, start),
        start,
    )
}

/// Plays every guess, one second apart
pub fn play(session: &mut GameSession, start: DateTime<Utc>, guesses: &[&str]) {
    let catalog = create_test_catalog();
    for (i, guess) in guesses.iter().enumerate() {
        session
            .submit_guess_at(guess, &catalog, start + Duration::seconds(i as i64 + 1))
            .unwrap();
    }
}

/// Event collector for testing event emissions
#[derive(Clone, Default)]
pub struct EventCollector {
    events: Arc<Mutex<Vec<GameEvent>>>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_events(&self) -> Vec<GameEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn has_event_type(&self, check_fn: impl Fn(&GameEvent) -> bool) -> bool {
        self.events.lock().unwrap().iter().any(check_fn)
    }
}

impl GameEventHandler for EventCollector {
    fn handle_event(&self, event: &GameEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
