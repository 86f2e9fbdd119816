use chrono::Utc;
use game_core::{StatsRecord, WordFrequency};
use game_types::{
    AvgTimeEntry, Leaderboard, MatchesEntry, PointsEntry, UserPositions, WinrateEntry, WinsEntry,
};
use sea_orm::{
    ActiveValue, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

use super::{from_count, to_count};
use crate::entities::{prelude::*, stats};
use crate::errors::{RepositoryError, Result};

/// Boards based on averages only rank players with at least this many matches.
pub const LEADERBOARD_MIN_MATCHES: i32 = 10;

pub(crate) fn model_to_record(model: stats::Model) -> Result<StatsRecord> {
    let word_frequency: WordFrequency = serde_json::from_value(model.word_freq)?;
    Ok(StatsRecord {
        username: model.username,
        rating: model.points,
        matches: to_count(model.matches),
        wins: to_count(model.wins),
        avg_time_seconds: model.avg_time,
        word_frequency,
        registered_at: model.registered_on.with_timezone(&Utc),
    })
}

pub(crate) fn new_stats_model(record: &StatsRecord) -> Result<stats::ActiveModel> {
    Ok(stats::ActiveModel {
        id: ActiveValue::NotSet,
        username: ActiveValue::Set(record.username.clone()),
        points: ActiveValue::Set(record.rating),
        matches: ActiveValue::Set(from_count(record.matches)),
        wins: ActiveValue::Set(from_count(record.wins)),
        avg_time: ActiveValue::Set(record.avg_time_seconds),
        word_freq: ActiveValue::Set(serde_json::to_value(&record.word_frequency)?),
        registered_on: ActiveValue::Set(record.registered_at.into()),
    })
}

/// Overwrite the aggregate columns of an existing stats row.
pub(crate) async fn save_stats<C: ConnectionTrait>(
    conn: &C,
    stats_id: i32,
    record: &StatsRecord,
) -> Result<()> {
    let updated = stats::ActiveModel {
        id: ActiveValue::Unchanged(stats_id),
        points: ActiveValue::Set(record.rating),
        matches: ActiveValue::Set(from_count(record.matches)),
        wins: ActiveValue::Set(from_count(record.wins)),
        avg_time: ActiveValue::Set(record.avg_time_seconds),
        word_freq: ActiveValue::Set(serde_json::to_value(&record.word_frequency)?),
        ..Default::default()
    };

    Stats::update(updated).exec(conn).await?;
    Ok(())
}

pub struct StatsRepository {
    db: DatabaseConnection,
}

impl StatsRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get_stats(&self, username: &str) -> Result<Option<StatsRecord>> {
        let model = Stats::find()
            .filter(stats::Column::Username.eq(username))
            .one(&self.db)
            .await?;

        model.map(model_to_record).transpose()
    }

    /// Top `limit` players on every board, plus the caller's positions when
    /// a username is given.
    pub async fn leaderboard(&self, username: Option<&str>, limit: u64) -> Result<Leaderboard> {
        let top_points = Stats::find()
            .filter(stats::Column::Matches.gt(0))
            .order_by_desc(stats::Column::Points)
            .limit(limit)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|s| PointsEntry {
                username: s.username,
                points: s.points,
            })
            .collect();

        let top_matches = Stats::find()
            .filter(stats::Column::Matches.gt(0))
            .order_by_desc(stats::Column::Matches)
            .limit(limit)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|s| MatchesEntry {
                username: s.username,
                matches: to_count(s.matches),
            })
            .collect();

        let top_avg_time = Stats::find()
            .filter(stats::Column::AvgTime.gt(0.0))
            .filter(stats::Column::Matches.gte(LEADERBOARD_MIN_MATCHES))
            .order_by_asc(stats::Column::AvgTime)
            .limit(limit)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|s| AvgTimeEntry {
                username: s.username,
                avg_time: s.avg_time,
            })
            .collect();

        let top_wins = Stats::find()
            .filter(stats::Column::Wins.gt(0))
            .order_by_desc(stats::Column::Wins)
            .limit(limit)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|s| WinsEntry {
                username: s.username,
                wins: to_count(s.wins),
            })
            .collect();

        let mut top_winrate: Vec<WinrateEntry> = self
            .winrate_candidates()
            .await?
            .into_iter()
            .map(|(username, winrate)| WinrateEntry { username, winrate })
            .collect();
        top_winrate.sort_by(|a, b| {
            b.winrate
                .total_cmp(&a.winrate)
                .then_with(|| a.username.cmp(&b.username))
        });
        top_winrate.truncate(usize::try_from(limit).unwrap_or(usize::MAX));

        let user_position = match username {
            Some(username) => Some(self.user_positions(username).await?),
            None => None,
        };

        Ok(Leaderboard {
            top_points,
            top_matches,
            top_avg_time,
            top_winrate,
            top_wins,
            user_position,
        })
    }

    /// 1-based rank of `username` on every board it qualifies for.
    pub async fn user_positions(&self, username: &str) -> Result<UserPositions> {
        let user = Stats::find()
            .filter(stats::Column::Username.eq(username))
            .one(&self.db)
            .await?
            .ok_or_else(|| RepositoryError::StatsNotFound(username.to_string()))?;

        let rank = |ahead: u64| Some(u32::try_from(ahead).unwrap_or(u32::MAX).saturating_add(1));

        let points = if user.matches > 0 {
            let ahead = Stats::find()
                .filter(stats::Column::Points.gt(user.points))
                .filter(stats::Column::Matches.gt(0))
                .count(&self.db)
                .await?;
            rank(ahead)
        } else {
            None
        };

        let matches = if user.matches > 0 {
            let ahead = Stats::find()
                .filter(stats::Column::Matches.gt(user.matches))
                .count(&self.db)
                .await?;
            rank(ahead)
        } else {
            None
        };

        let wins = if user.wins > 0 {
            let ahead = Stats::find()
                .filter(stats::Column::Wins.gt(user.wins))
                .count(&self.db)
                .await?;
            rank(ahead)
        } else {
            None
        };

        let qualifies_for_averages = user.matches >= LEADERBOARD_MIN_MATCHES;

        let avg_time = if qualifies_for_averages && user.avg_time > 0.0 {
            let ahead = Stats::find()
                .filter(stats::Column::AvgTime.gt(0.0))
                .filter(stats::Column::AvgTime.lt(user.avg_time))
                .filter(stats::Column::Matches.gte(LEADERBOARD_MIN_MATCHES))
                .count(&self.db)
                .await?;
            rank(ahead)
        } else {
            None
        };

        let winrate = if qualifies_for_averages {
            let user_rate = f64::from(user.wins) / f64::from(user.matches);
            let ahead = self
                .winrate_candidates()
                .await?
                .into_iter()
                .filter(|(_, rate)| *rate > user_rate)
                .count();
            rank(ahead as u64)
        } else {
            None
        };

        Ok(UserPositions {
            points,
            matches,
            avg_time,
            winrate,
            wins,
        })
    }

    async fn winrate_candidates(&self) -> Result<Vec<(String, f64)>> {
        let rows = Stats::find()
            .filter(stats::Column::Matches.gte(LEADERBOARD_MIN_MATCHES))
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|s| {
                let rate = f64::from(s.wins) / f64::from(s.matches);
                (s.username, rate)
            })
            .collect())
    }
}
