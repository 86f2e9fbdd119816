use game_types::{Feedback, GameStatus};

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    GameStarted {
        username: String,
        language: String,
        max_tries: u32,
    },
    GuessAccepted {
        username: String,
        guess: String,
        feedback: Feedback,
        guess_count: u32,
    },
    GuessRejected {
        username: String,
        reason: String,
    },
    GameFinished {
        username: String,
        status: GameStatus,
        guess_count: u32,
        elapsed_seconds: f64,
    },
    StatsApplied {
        username: String,
        rating: i32,
        matches: u32,
        wins: u32,
    },
    LanguageRefreshed {
        language: String,
        checksum: String,
    },
}

impl GameEvent {
    /// Account the event concerns, if any.
    pub fn username(&self) -> Option<&str> {
        match self {
            GameEvent::GameStarted { username, .. }
            | GameEvent::GuessAccepted { username, .. }
            | GameEvent::GuessRejected { username, .. }
            | GameEvent::GameFinished { username, .. }
            | GameEvent::StatsApplied { username, .. } => Some(username.as_str()),
            GameEvent::LanguageRefreshed { .. } => None,
        }
    }
}

/// Event handler trait for processing game events
pub trait GameEventHandler: Send + Sync {
    fn handle_event(&self, event: &GameEvent);
}

/// Simple event bus for distributing game events
#[derive(Default)]
pub struct GameEventBus {
    handlers: Vec<Box<dyn GameEventHandler>>,
}

impl GameEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_handler(&mut self, handler: Box<dyn GameEventHandler>) {
        self.handlers.push(handler);
    }

    pub fn publish(&self, event: GameEvent) {
        for handler in &self.handlers {
            handler.handle_event(&event);
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}
