use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

const USERNAME_PATTERN: &str = r"^[A-Za-z0-9_.-]{1,80}$";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Unallowed username")]
    Unallowed(String),
    #[error("User blacklisted")]
    Blocklisted(String),
}

#[derive(Deserialize)]
struct FilterFile {
    #[serde(default)]
    data: Vec<String>,
}

#[derive(Deserialize)]
struct BlocklistFile {
    #[serde(default)]
    usernames: Vec<String>,
}

/// Decides which usernames may be registered.
#[derive(Debug, Clone)]
pub struct UsernamePolicy {
    pattern: Regex,
    filtered: HashSet<String>,
    blocked: HashSet<String>,
}

impl UsernamePolicy {
    pub fn new(
        filtered: impl IntoIterator<Item = String>,
        blocked: impl IntoIterator<Item = String>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(USERNAME_PATTERN)?,
            filtered: filtered.into_iter().collect(),
            blocked: blocked.into_iter().collect(),
        })
    }

    pub fn permissive() -> Result<Self, regex::Error> {
        Self::new(Vec::new(), Vec::new())
    }

    /// Load both lists. A missing or unreadable file counts as an empty list.
    pub fn load(filter_file: &Path, blocklist_file: &Path) -> Result<Self, regex::Error> {
        let filtered = read_list(filter_file, |bytes| {
            serde_json::from_slice::<FilterFile>(bytes).map(|f| f.data)
        });
        let blocked = read_list(blocklist_file, |bytes| {
            serde_json::from_slice::<BlocklistFile>(bytes).map(|f| f.usernames)
        });
        debug!(
            "Username policy: {} filtered, {} blocked",
            filtered.len(),
            blocked.len()
        );
        Self::new(filtered, blocked)
    }

    pub fn check(&self, username: &str) -> Result<(), PolicyError> {
        if !self.pattern.is_match(username) || self.filtered.contains(username) {
            return Err(PolicyError::Unallowed(username.to_string()));
        }
        if self.blocked.contains(username) {
            return Err(PolicyError::Blocklisted(username.to_string()));
        }
        Ok(())
    }
}

fn read_list<F>(path: &Path, parse: F) -> Vec<String>
where
    F: Fn(&[u8]) -> Result<Vec<String>, serde_json::Error>,
{
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(_) => return Vec::new(),
    };
    match parse(&bytes) {
        Ok(list) => list,
        Err(e) => {
            warn!("Ignoring malformed list {}: {}", path.display(), e);
            Vec::new()
        }
    }
}
