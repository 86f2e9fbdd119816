pub mod game_repository;
pub mod stats_repository;
pub mod user_repository;

pub use game_repository::{GameRepository, GuessApplied};
pub use stats_repository::StatsRepository;
pub use user_repository::{UserAccount, UserRepository};

/// Stored counters are signed columns; negative values never occur in practice.
pub(crate) fn to_count(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

pub(crate) fn from_count(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
