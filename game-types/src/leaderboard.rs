use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PointsEntry {
    pub username: String,
    pub points: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MatchesEntry {
    pub username: String,
    pub matches: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AvgTimeEntry {
    pub username: String,
    pub avg_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WinrateEntry {
    pub username: String,
    pub winrate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WinsEntry {
    pub username: String,
    pub wins: u32,
}

/// 1-based rank of a user on each board; `None` when the user does not
/// qualify for that board.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserPositions {
    pub points: Option<u32>,
    pub matches: Option<u32>,
    pub avg_time: Option<u32>,
    pub winrate: Option<u32>,
    pub wins: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Leaderboard {
    pub top_points: Vec<PointsEntry>,
    pub top_matches: Vec<MatchesEntry>,
    pub top_avg_time: Vec<AvgTimeEntry>,
    pub top_winrate: Vec<WinrateEntry>,
    pub top_wins: Vec<WinsEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_position: Option<UserPositions>,
}
