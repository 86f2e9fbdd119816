use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

/// Aggregate statistics for one account, as returned by `/online/stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StatsSummary {
    pub username: String,
    pub points: i32,
    pub matches: u32,
    pub wins: u32,
    pub avg_time: f64,
    pub word_freq: BTreeMap<String, u32>,
    pub registered_on: String, // ISO 8601 string
}

impl StatsSummary {
    pub fn losses(&self) -> u32 {
        self.matches.saturating_sub(self.wins)
    }

    pub fn win_rate(&self) -> f64 {
        if self.matches == 0 {
            0.0
        } else {
            f64::from(self.wins) / f64::from(self.matches)
        }
    }
}
