use serde::{Deserialize, Serialize};

/// Tunables for the rating update. Passed explicitly into every rating and
/// stats call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingConfig {
    /// Rating of the fixed "opponent" and the starting rating of new accounts.
    pub base_rating: i32,
    pub k_win: f64,
    pub k_loss: f64,
    pub win_bonus: i32,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            base_rating: 1200,
            k_win: 20.0,
            k_loss: 20.0,
            win_bonus: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub word_length: usize,
    pub max_tries: u32,
    pub rating: RatingConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            word_length: 5,
            max_tries: 6,
            rating: RatingConfig::default(),
        }
    }
}
