use chrono::Utc;
use game_core::{
    GameSession, GuessOutcome, RatingConfig, SessionRecord, StatsAggregator, StatsRecord,
    WordCatalog,
};
use game_types::{Feedback, GameStatus};
use sea_orm::{
    ActiveValue, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use std::collections::BTreeSet;
use tracing::{debug, info};

use super::stats_repository::{model_to_record, save_stats};
use super::{from_count, to_count};
use crate::entities::{games, prelude::*, stats};
use crate::errors::{RepositoryError, Result};

/// Result of a guess that was accepted and committed.
#[derive(Debug, Clone)]
pub struct GuessApplied {
    pub session: GameSession,
    pub outcome: GuessOutcome,
    /// Updated stats when this guess finished the game.
    pub stats: Option<StatsRecord>,
}

fn status_code(status: GameStatus) -> i32 {
    i32::from(u8::from(status))
}

fn model_to_session(model: games::Model) -> Result<GameSession> {
    let guesses: Vec<String> = serde_json::from_value(model.guesses)?;
    let feedback: Vec<Feedback> = serde_json::from_value(model.formatted_guesses)?;
    let remaining_letters: BTreeSet<char> = serde_json::from_value(model.letters)?;
    let status = u8::try_from(model.status)
        .ok()
        .and_then(|code| GameStatus::try_from(code).ok())
        .ok_or_else(|| {
            RepositoryError::Corrupt(format!(
                "game {} has unknown status {}",
                model.game_id, model.status
            ))
        })?;

    Ok(GameSession::from_record(SessionRecord {
        username: model.username,
        language: model.language,
        secret_word: model.word,
        guesses,
        feedback,
        remaining_letters,
        guess_count: to_count(model.guess_number),
        elapsed_seconds: model.time,
        status,
        started_at: model.start_time.with_timezone(&Utc),
        max_tries: to_count(model.max_tries),
    }))
}

fn session_to_model(session: &GameSession) -> Result<games::ActiveModel> {
    let record = session.to_record();
    Ok(games::ActiveModel {
        game_id: ActiveValue::NotSet,
        username: ActiveValue::Set(record.username),
        language: ActiveValue::Set(record.language),
        start_time: ActiveValue::Set(record.started_at.into()),
        word: ActiveValue::Set(record.secret_word),
        guesses: ActiveValue::Set(serde_json::to_value(&record.guesses)?),
        formatted_guesses: ActiveValue::Set(serde_json::to_value(&record.feedback)?),
        letters: ActiveValue::Set(serde_json::to_value(&record.remaining_letters)?),
        guess_number: ActiveValue::Set(from_count(record.guess_count)),
        max_tries: ActiveValue::Set(from_count(record.max_tries)),
        time: ActiveValue::Set(record.elapsed_seconds),
        status: ActiveValue::Set(status_code(record.status)),
    })
}

/// The user's most recent game. With `lock` set the row is selected
/// `FOR UPDATE` on backends that support it.
async fn latest_game<C: ConnectionTrait>(
    conn: &C,
    username: &str,
    lock: bool,
) -> Result<Option<games::Model>> {
    let mut query = Games::find()
        .filter(games::Column::Username.eq(username))
        .order_by_desc(games::Column::GameId);
    if lock {
        query = query.lock_exclusive();
    }
    Ok(query.one(conn).await?)
}

pub struct GameRepository {
    db: DatabaseConnection,
}

impl GameRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Store a freshly started session and return its id.
    pub async fn create_game(&self, session: &GameSession) -> Result<i32> {
        let result = Games::insert(session_to_model(session)?)
            .exec(&self.db)
            .await?;

        info!(
            "Created game {} for {} in language {}",
            result.last_insert_id,
            session.username(),
            session.language()
        );
        Ok(result.last_insert_id)
    }

    pub async fn current_game(&self, username: &str) -> Result<Option<(i32, GameSession)>> {
        match latest_game(&self.db, username, false).await? {
            Some(model) => {
                let game_id = model.game_id;
                Ok(Some((game_id, model_to_session(model)?)))
            }
            None => Ok(None),
        }
    }

    /// Apply one guess to the user's current game.
    ///
    /// The game row and, when the guess ends the game, the stats row are
    /// written in one transaction. The game update only matches while the
    /// stored guess count and status are the ones this guess was evaluated
    /// against, so two racing guesses can never both be applied and stats
    /// are folded exactly once.
    pub async fn submit_guess(
        &self,
        username: &str,
        guess: &str,
        catalog: &WordCatalog,
        rating: &RatingConfig,
    ) -> Result<GuessApplied> {
        let txn = self.db.begin().await?;

        let model = latest_game(&txn, username, true)
            .await?
            .ok_or_else(|| RepositoryError::GameNotFound(username.to_string()))?;
        let game_id = model.game_id;
        let previous_count = model.guess_number;

        let mut session = model_to_session(model)?;
        let language = catalog.get(session.language())?;
        let outcome = session.submit_guess(guess, &language)?;

        let updated = games::ActiveModel {
            game_id: ActiveValue::Unchanged(game_id),
            guesses: ActiveValue::Set(serde_json::to_value(session.guesses())?),
            formatted_guesses: ActiveValue::Set(serde_json::to_value(session.feedback())?),
            letters: ActiveValue::Set(serde_json::to_value(session.remaining_letters())?),
            guess_number: ActiveValue::Set(from_count(session.guess_count())),
            time: ActiveValue::Set(session.elapsed_seconds()),
            status: ActiveValue::Set(status_code(session.status())),
            ..Default::default()
        };

        match Games::update(updated)
            .filter(games::Column::GuessNumber.eq(previous_count))
            .filter(games::Column::Status.eq(status_code(GameStatus::InProgress)))
            .exec(&txn)
            .await
        {
            Ok(_) => {}
            Err(DbErr::RecordNotUpdated) => {
                return Err(RepositoryError::ConcurrentUpdate(username.to_string()));
            }
            Err(err) => return Err(err.into()),
        }

        let stats = if outcome.finished {
            let stats_model = Stats::find()
                .filter(stats::Column::Username.eq(username))
                .lock_exclusive()
                .one(&txn)
                .await?
                .ok_or_else(|| RepositoryError::StatsNotFound(username.to_string()))?;
            let stats_id = stats_model.id;

            let record = StatsAggregator::apply_finished_session(
                model_to_record(stats_model)?,
                &session,
                rating,
            )?;
            save_stats(&txn, stats_id, &record).await?;
            Some(record)
        } else {
            None
        };

        txn.commit().await?;

        debug!(
            "Game {} for {}: guess {} of {}, status {:?}",
            game_id,
            username,
            session.guess_count(),
            session.max_tries(),
            session.status()
        );

        Ok(GuessApplied {
            session,
            outcome,
            stats,
        })
    }

    /// The secret of the user's current game, once that game has ended.
    pub async fn reveal_word(&self, username: &str) -> Result<Option<String>> {
        let (_, session) = self
            .current_game(username)
            .await?
            .ok_or_else(|| RepositoryError::GameNotFound(username.to_string()))?;

        Ok(session.reveal().map(str::to_string))
    }

    pub async fn count_games(&self, username: &str) -> Result<u64> {
        Ok(Games::find()
            .filter(games::Column::Username.eq(username))
            .count(&self.db)
            .await?)
    }
}
