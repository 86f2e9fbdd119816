use dashmap::DashMap;
use sea_orm::DatabaseConnection;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::auth::{Argon2Hasher, CredentialHasher};
use crate::errors::ServiceError;
use crate::username_policy::UsernamePolicy;
use game_core::{
    GameConfig, GameEvent, GameEventBus, GameEventHandler, GameSession, LanguageCatalog,
    SessionError, WordCatalog,
};
use game_persistence::RepositoryError;
use game_persistence::repositories::{
    GameRepository, StatsRepository, UserAccount, UserRepository,
};
use game_types::{GuessResponse, Leaderboard, StatsSummary};

pub const LEADERBOARD_SIZE: u64 = 10;

type Result<T> = std::result::Result<T, ServiceError>;

/// Forwards game events to the log.
pub struct TracingEventHandler;

impl GameEventHandler for TracingEventHandler {
    fn handle_event(&self, event: &GameEvent) {
        match event {
            GameEvent::GameStarted {
                username,
                language,
                max_tries,
            } => info!(
                "{} started a game in '{}' with {} tries",
                username, language, max_tries
            ),
            GameEvent::GuessAccepted {
                username,
                guess,
                guess_count,
                ..
            } => debug!("{} guessed {} (guess {})", username, guess, guess_count),
            GameEvent::GuessRejected { username, reason } => {
                debug!("Rejected guess from {}: {}", username, reason)
            }
            GameEvent::GameFinished {
                username,
                status,
                guess_count,
                elapsed_seconds,
            } => info!(
                "{} finished a game: {:?} after {} guesses in {:.1}s",
                username, status, guess_count, elapsed_seconds
            ),
            GameEvent::StatsApplied {
                username,
                rating,
                matches,
                wins,
            } => info!(
                "{} now rated {} ({} wins / {} matches)",
                username, rating, wins, matches
            ),
            GameEvent::LanguageRefreshed { language, checksum } => {
                info!("Language '{}' refreshed, checksum {}", language, checksum)
            }
        }
    }
}

pub struct GameManager {
    users: UserRepository,
    games: GameRepository,
    stats: StatsRepository,
    catalog: RwLock<WordCatalog>,
    data_directory: PathBuf,
    config: GameConfig,
    hasher: Arc<dyn CredentialHasher>,
    policy: UsernamePolicy,
    events: GameEventBus,
    user_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl GameManager {
    pub fn new(
        db: DatabaseConnection,
        catalog: WordCatalog,
        data_directory: impl Into<PathBuf>,
        config: GameConfig,
        policy: UsernamePolicy,
    ) -> Self {
        let mut events = GameEventBus::new();
        events.add_handler(Box::new(TracingEventHandler));

        Self {
            users: UserRepository::new(db.clone()),
            games: GameRepository::new(db.clone()),
            stats: StatsRepository::new(db),
            catalog: RwLock::new(catalog),
            data_directory: data_directory.into(),
            config,
            hasher: Arc::new(Argon2Hasher::new()),
            policy,
            events,
            user_locks: DashMap::new(),
        }
    }

    pub fn with_hasher(mut self, hasher: Arc<dyn CredentialHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn add_event_handler(&mut self, handler: Box<dyn GameEventHandler>) {
        self.events.add_handler(handler);
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Run `f` while holding the per-user lock, so requests for the same
    /// account are applied one at a time.
    async fn with_user_lock<T, F, Fut>(&self, username: &str, f: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let lock = self
            .user_locks
            .entry(username.to_string())
            .or_default()
            .clone();

        let result = {
            let _guard = lock.lock().await;
            f().await
        };

        drop(lock);
        self.user_locks
            .remove_if(username, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    // Accounts

    pub async fn create_user(&self, username: &str, secret: &str) -> Result<UserAccount> {
        self.policy.check(username)?;
        if self.users.exists(username).await? {
            return Err(ServiceError::UserExists(username.to_string()));
        }

        let hash = self.hasher.hash(secret)?;
        Ok(self
            .users
            .create_user(username, &hash, &self.config.rating)
            .await?)
    }

    pub async fn user_exists(&self, username: &str) -> Result<bool> {
        Ok(self.users.exists(username).await?)
    }

    pub async fn authenticate(&self, username: &str, secret: &str) -> Result<UserAccount> {
        let account = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| ServiceError::UserNotFound(username.to_string()))?;

        self.hasher.verify(secret, &account.auth_hash)?;
        Ok(account)
    }

    pub async fn delete_account(&self, username: &str, secret: &str) -> Result<()> {
        self.authenticate(username, secret).await?;
        self.with_user_lock(username, || async move {
            Ok(self.users.delete_user(username).await?)
        })
        .await
    }

    pub async fn change_username(
        &self,
        username: &str,
        secret: &str,
        new_username: &str,
    ) -> Result<()> {
        self.authenticate(username, secret).await?;
        if new_username == username {
            return Err(ServiceError::Unchanged("username"));
        }
        self.policy.check(new_username)?;

        self.with_user_lock(username, || async move {
            Ok(self.users.change_username(username, new_username).await?)
        })
        .await
    }

    pub async fn change_auth(&self, username: &str, secret: &str, new_secret: &str) -> Result<()> {
        self.authenticate(username, secret).await?;
        if new_secret == secret {
            return Err(ServiceError::Unchanged("password"));
        }

        let hash = self.hasher.hash(new_secret)?;
        Ok(self.users.change_auth(username, &hash).await?)
    }

    // Games

    /// Start a new game in `language`. Unknown usernames are registered on
    /// the fly with the given secret.
    pub async fn start_game(
        &self,
        username: &str,
        secret: &str,
        language: &str,
    ) -> Result<GuessResponse> {
        if self.users.exists(username).await? {
            self.authenticate(username, secret).await?;
        } else {
            match self.create_user(username, secret).await {
                Ok(_) => info!("Auto-registered {} on game start", username),
                // Registered by a concurrent request in the meantime
                Err(ServiceError::UserExists(_)) => {
                    self.authenticate(username, secret).await?;
                }
                Err(e) => return Err(e),
            }
        }

        let language = self.catalog.read().await.get(language)?;
        let secret_word = language.random_solution()?;
        let session = GameSession::new(username, &language, secret_word, self.config.max_tries);

        let pending = &session;
        self.with_user_lock(username, || async move {
            self.games.create_game(pending).await?;
            Ok(())
        })
        .await?;

        self.events.publish(GameEvent::GameStarted {
            username: username.to_string(),
            language: language.code().to_string(),
            max_tries: session.max_tries(),
        });

        Ok(session.to_response())
    }

    pub async fn submit_guess(
        &self,
        username: &str,
        secret: &str,
        guess: &str,
    ) -> Result<GuessResponse> {
        self.authenticate(username, secret).await?;

        let applied = self
            .with_user_lock(username, || async move {
                let catalog = self.catalog.read().await;
                match self
                    .games
                    .submit_guess(username, guess, &catalog, &self.config.rating)
                    .await
                {
                    Err(RepositoryError::Session(SessionError::Validation(reason))) => {
                        self.events.publish(GameEvent::GuessRejected {
                            username: username.to_string(),
                            reason: reason.to_string(),
                        });
                        Err(SessionError::Validation(reason).into())
                    }
                    other => Ok(other?),
                }
            })
            .await?;

        let session = &applied.session;
        self.events.publish(GameEvent::GuessAccepted {
            username: username.to_string(),
            guess: guess.to_string(),
            feedback: applied.outcome.feedback.clone(),
            guess_count: session.guess_count(),
        });

        if applied.outcome.finished {
            self.events.publish(GameEvent::GameFinished {
                username: username.to_string(),
                status: session.status(),
                guess_count: session.guess_count(),
                elapsed_seconds: session.elapsed_seconds(),
            });
        }
        if let Some(stats) = &applied.stats {
            self.events.publish(GameEvent::StatsApplied {
                username: username.to_string(),
                rating: stats.rating,
                matches: stats.matches,
                wins: stats.wins,
            });
        }

        Ok(session.to_response())
    }

    /// The secret word of the user's current game, once it has ended.
    pub async fn reveal_word(&self, username: &str, secret: &str) -> Result<String> {
        self.authenticate(username, secret).await?;
        self.games
            .reveal_word(username)
            .await?
            .ok_or(ServiceError::GameInProgress)
    }

    // Read side

    pub async fn stats(&self, username: &str, secret: &str) -> Result<StatsSummary> {
        self.authenticate(username, secret).await?;
        let stats = self
            .stats
            .get_stats(username)
            .await?
            .ok_or_else(|| ServiceError::StatsNotFound(username.to_string()))?;
        Ok(stats.to_summary())
    }

    /// Top players, plus the requester's own positions when credentials are
    /// supplied.
    pub async fn leaderboard(&self, requester: Option<(&str, &str)>) -> Result<Leaderboard> {
        let username = match requester {
            Some((username, secret)) => {
                self.authenticate(username, secret).await?;
                Some(username)
            }
            None => None,
        };

        Ok(self.stats.leaderboard(username, LEADERBOARD_SIZE).await?)
    }

    // Languages

    pub async fn languages(&self) -> Vec<String> {
        self.catalog.read().await.languages()
    }

    pub async fn language_checksum(&self, code: &str) -> Result<String> {
        Ok(self.catalog.read().await.checksum(code)?)
    }

    /// Raw language document as served to other instances.
    pub async fn language_document(&self, code: &str) -> Result<Vec<u8>> {
        if !self.catalog.read().await.contains_language(code) {
            return Err(ServiceError::UnknownLanguage(code.to_string()));
        }

        let path = language_path(&self.data_directory, code);
        tokio::fs::read(&path).await.map_err(|e| {
            warn!("Failed to read language file {}: {}", path.display(), e);
            ServiceError::Internal(format!("failed to read language '{}'", code))
        })
    }

    /// Validate a downloaded language document, write it to the data
    /// directory and make it live. Returns the new checksum.
    pub async fn install_language(&self, code: &str, bytes: &[u8]) -> Result<String> {
        if !is_valid_language_code(code) {
            return Err(ServiceError::UnknownLanguage(code.to_string()));
        }

        let language = LanguageCatalog::from_json(code, bytes, self.config.word_length)?;
        let checksum = language.checksum().to_string();

        let path = language_path(&self.data_directory, code);
        tokio::fs::write(&path, bytes).await.map_err(|e| {
            ServiceError::Internal(format!("failed to write {}: {}", path.display(), e))
        })?;

        self.catalog.write().await.insert(language);
        self.events.publish(GameEvent::LanguageRefreshed {
            language: code.to_string(),
            checksum: checksum.clone(),
        });

        Ok(checksum)
    }
}

fn language_path(data_directory: &Path, code: &str) -> PathBuf {
    data_directory.join(format!("{}.json", code))
}

fn is_valid_language_code(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= 16
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_codes() {
        assert!(is_valid_language_code("en"));
        assert!(is_valid_language_code("pt-BR"));
        assert!(!is_valid_language_code(""));
        assert!(!is_valid_language_code("../etc/passwd"));
        assert!(!is_valid_language_code("en.json"));
    }

    #[test]
    fn test_language_path() {
        assert_eq!(
            language_path(Path::new("/data"), "en"),
            PathBuf::from("/data/en.json")
        );
    }
}
