use crate::{GameSession, RatingConfig, RatingEngine, StatsError};
use chrono::{DateTime, Utc};
use game_types::{GameStatus, StatsSummary};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Occurrence count per guessed word. Unseen words count as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WordFrequency(BTreeMap<String, u32>);

impl WordFrequency {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, word: &str) {
        *self.0.entry(word.to_string()).or_insert(0) += 1;
    }

    pub fn count(&self, word: &str) -> u32 {
        self.0.get(word).copied().unwrap_or(0)
    }

    /// Add every count from `other` into `self`.
    pub fn merge(&mut self, other: &WordFrequency) {
        for (word, count) in &other.0 {
            *self.0.entry(word.clone()).or_insert(0) += count;
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.0.values().map(|&count| u64::from(count)).sum()
    }

    /// Words ordered by count, highest first; ties broken alphabetically.
    pub fn most_common(&self, limit: usize) -> Vec<(&str, u32)> {
        let mut entries: Vec<(&str, u32)> =
            self.0.iter().map(|(word, &count)| (word.as_str(), count)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries.truncate(limit);
        entries
    }

    pub fn as_map(&self) -> &BTreeMap<String, u32> {
        &self.0
    }
}

impl From<BTreeMap<String, u32>> for WordFrequency {
    fn from(map: BTreeMap<String, u32>) -> Self {
        Self(map)
    }
}

impl<'a> FromIterator<&'a str> for WordFrequency {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut frequency = Self::new();
        for word in iter {
            frequency.increment(word);
        }
        frequency
    }
}

/// Aggregate results for one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsRecord {
    pub username: String,
    pub rating: i32,
    pub matches: u32,
    pub wins: u32,
    /// Mean elapsed time over won sessions only.
    pub avg_time_seconds: f64,
    pub word_frequency: WordFrequency,
    pub registered_at: DateTime<Utc>,
}

impl StatsRecord {
    pub fn new(username: impl Into<String>, config: &RatingConfig, registered_at: DateTime<Utc>) -> Self {
        Self {
            username: username.into(),
            rating: config.base_rating,
            matches: 0,
            wins: 0,
            avg_time_seconds: 0.0,
            word_frequency: WordFrequency::new(),
            registered_at,
        }
    }

    pub fn losses(&self) -> u32 {
        self.matches.saturating_sub(self.wins)
    }

    pub fn to_summary(&self) -> StatsSummary {
        StatsSummary {
            username: self.username.clone(),
            points: self.rating,
            matches: self.matches,
            wins: self.wins,
            avg_time: self.avg_time_seconds,
            word_freq: self.word_frequency.as_map().clone(),
            registered_on: self.registered_at.to_rfc3339(),
        }
    }
}

pub struct StatsAggregator;

impl StatsAggregator {
    /// Fold a finished session into the owner's stats.
    ///
    /// This is not idempotent: folding the same session twice counts it
    /// twice. Callers must apply it exactly once, when the session leaves
    /// `InProgress`.
    pub fn apply_finished_session(
        mut stats: StatsRecord,
        session: &GameSession,
        config: &RatingConfig,
    ) -> Result<StatsRecord, StatsError> {
        let won = match session.status() {
            GameStatus::Won => true,
            GameStatus::Lost => false,
            GameStatus::InProgress => {
                return Err(StatsError::SessionNotFinished(session.username().to_string()));
            }
        };

        let previous_rating = stats.rating;
        stats.rating = RatingEngine::update_rating(stats.rating, won, config);
        stats.matches += 1;

        if won {
            stats.wins += 1;
            let previous_wins = f64::from(stats.wins - 1);
            stats.avg_time_seconds = (stats.avg_time_seconds * previous_wins
                + session.elapsed_seconds())
                / f64::from(stats.wins);
        }

        for guess in session.guesses() {
            stats.word_frequency.increment(guess);
        }

        debug!(
            "Applied session for {}: rating {} -> {}, {} wins / {} matches",
            stats.username, previous_rating, stats.rating, stats.wins, stats.matches
        );

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LanguageCatalog;
    use chrono::Duration;

    fn catalog() -> LanguageCatalog {
        LanguageCatalog::from_word_lists(
            "en",
            "apple\ncrane\nslate\nhello",
            "crane",
            "a b c d e f g h i j k l m n o p q r s t u v w x y z",
            5,
        )
        .unwrap()
    }

    fn finished_session(guesses: &[&str], seconds: i64) -> GameSession {
        let catalog = catalog();
        let start = Utc::now();
        let mut session = GameSession::new_at("alice", &catalog, "crane", guesses.len() as u32, start);
        for guess in guesses {
            session
                .submit_guess_at(guess, &catalog, start + Duration::seconds(seconds))
                .unwrap();
        }
        session
    }

    fn fresh_stats() -> StatsRecord {
        StatsRecord::new("alice", &RatingConfig::default(), Utc::now())
    }

    #[test]
    fn test_incremental_average_over_wins() {
        let config = RatingConfig::default();

        let stats = StatsAggregator::apply_finished_session(
            fresh_stats(),
            &finished_session(&["crane"], 30),
            &config,
        )
        .unwrap();
        assert_eq!(stats.wins, 1);
        assert_eq!(stats.avg_time_seconds, 30.0);

        let stats = StatsAggregator::apply_finished_session(
            stats,
            &finished_session(&["hello", "crane"], 60),
            &config,
        )
        .unwrap();
        assert_eq!(stats.wins, 2);
        assert_eq!(stats.matches, 2);
        assert_eq!(stats.avg_time_seconds, 45.0);
    }

    #[test]
    fn test_loss_leaves_average_alone() {
        let config = RatingConfig::default();
        let stats = StatsAggregator::apply_finished_session(
            fresh_stats(),
            &finished_session(&["crane"], 20),
            &config,
        )
        .unwrap();

        let stats = StatsAggregator::apply_finished_session(
            stats,
            &finished_session(&["hello", "apple"], 500),
            &config,
        )
        .unwrap();

        assert_eq!(stats.matches, 2);
        assert_eq!(stats.wins, 1);
        assert_eq!(stats.losses(), 1);
        assert_eq!(stats.avg_time_seconds, 20.0);
    }

    #[test]
    fn test_rating_updated_once_per_session() {
        let config = RatingConfig::default();
        let stats = StatsAggregator::apply_finished_session(
            fresh_stats(),
            &finished_session(&["crane"], 5),
            &config,
        )
        .unwrap();
        assert_eq!(stats.rating, 1215);

        let stats = StatsAggregator::apply_finished_session(
            fresh_stats(),
            &finished_session(&["hello"], 5),
            &config,
        )
        .unwrap();
        assert_eq!(stats.rating, 1190);
    }

    #[test]
    fn test_word_frequency_counts_every_guess() {
        let config = RatingConfig::default();
        let stats = StatsAggregator::apply_finished_session(
            fresh_stats(),
            &finished_session(&["hello", "hello", "apple"], 5),
            &config,
        )
        .unwrap();
        let stats = StatsAggregator::apply_finished_session(
            stats,
            &finished_session(&["hello", "crane"], 5),
            &config,
        )
        .unwrap();

        assert_eq!(stats.word_frequency.count("hello"), 3);
        assert_eq!(stats.word_frequency.count("apple"), 1);
        assert_eq!(stats.word_frequency.count("crane"), 1);
        assert_eq!(stats.word_frequency.count("slate"), 0);
        assert_eq!(stats.word_frequency.total(), 5);
    }

    #[test]
    fn test_unfinished_session_rejected() {
        let catalog = catalog();
        let session = GameSession::new("alice", &catalog, "crane", 6);
        let result =
            StatsAggregator::apply_finished_session(fresh_stats(), &session, &RatingConfig::default());
        assert_eq!(result, Err(StatsError::SessionNotFinished("alice".to_string())));
    }

    #[test]
    fn test_word_frequency_merge() {
        let mut a: WordFrequency = ["crane", "slate", "crane"].into_iter().collect();
        let b: WordFrequency = ["slate", "hello"].into_iter().collect();
        a.merge(&b);

        assert_eq!(a.count("crane"), 2);
        assert_eq!(a.count("slate"), 2);
        assert_eq!(a.count("hello"), 1);
        assert_eq!(a.most_common(2), vec![("crane", 2), ("slate", 2)]);
    }

    #[test]
    fn test_summary_fields() {
        let mut stats = fresh_stats();
        stats.word_frequency.increment("crane");
        let summary = stats.to_summary();

        assert_eq!(summary.points, 1200);
        assert_eq!(summary.word_freq.get("crane"), Some(&1));
        assert!(summary.registered_on.contains('T'));
    }
}
