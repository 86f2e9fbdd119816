use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use game_core::{GameConfig, RatingConfig};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_directory: PathBuf,
    pub game: GameConfig,
    pub rate_limit_per_minute: u32,
    pub username_filter_file: PathBuf,
    pub username_blocklist_file: PathBuf,
    pub upstream_language_url: Option<String>,
    pub version: String,
}

impl Config {
    /// Read the configuration from the environment, falling back to defaults
    /// for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let rating = RatingConfig {
            base_rating: parse_or(&lookup, "BASE_ELO", defaults.game.rating.base_rating)?,
            k_win: parse_or(&lookup, "K_WIN", defaults.game.rating.k_win)?,
            k_loss: parse_or(&lookup, "K_LOSS", defaults.game.rating.k_loss)?,
            win_bonus: parse_or(&lookup, "WIN_BONUS", defaults.game.rating.win_bonus)?,
        };

        let word_length = parse_or(&lookup, "WORD_LENGTH", defaults.game.word_length)?;
        if word_length == 0 {
            return Err(ConfigError::Invalid {
                key: "WORD_LENGTH",
                value: word_length.to_string(),
            });
        }
        let max_tries = parse_or(&lookup, "MAX_TRIES", defaults.game.max_tries)?;
        if max_tries == 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_TRIES",
                value: max_tries.to_string(),
            });
        }

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port)?,
            data_directory: lookup("DATA_DIRECTORY")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_directory),
            game: GameConfig {
                word_length,
                max_tries,
                rating,
            },
            rate_limit_per_minute: parse_or(
                &lookup,
                "RATE_LIMIT_PER_MINUTE",
                defaults.rate_limit_per_minute,
            )?,
            username_filter_file: lookup("USERNAME_FILTER_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.username_filter_file),
            username_blocklist_file: lookup("USERNAME_BLOCKLIST_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.username_blocklist_file),
            upstream_language_url: lookup("UPSTREAM_LANGUAGE_URL").filter(|url| !url.is_empty()),
            version: lookup("VERSION").unwrap_or(defaults.version),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_directory: PathBuf::from("./data"),
            game: GameConfig::default(),
            rate_limit_per_minute: 60,
            username_filter_file: PathBuf::from("./data/filter.json"),
            username_blocklist_file: PathBuf::from("./data/blocklist.json"),
            upstream_language_url: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.game, GameConfig::default());
        assert_eq!(config.upstream_language_url, None);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "9000"),
            ("MAX_TRIES", "8"),
            ("BASE_ELO", "1000"),
            ("K_WIN", "32"),
            ("UPSTREAM_LANGUAGE_URL", "https://example.org"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.game.max_tries, 8);
        assert_eq!(config.game.rating.base_rating, 1000);
        assert_eq!(config.game.rating.k_win, 32.0);
        assert_eq!(config.game.rating.k_loss, 20.0);
        assert_eq!(
            config.upstream_language_url.as_deref(),
            Some("https://example.org")
        );
    }

    #[test]
    fn test_invalid_values() {
        let err = Config::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "PORT",
                value: "eighty".to_string()
            }
        );

        assert!(Config::from_lookup(lookup(&[("MAX_TRIES", "0")])).is_err());
        assert!(Config::from_lookup(lookup(&[("WORD_LENGTH", "-1")])).is_err());
    }
}
