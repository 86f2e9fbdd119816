use reqwest::Client;
use tracing::{info, warn};

use crate::errors::ServiceError;
use crate::game_manager::GameManager;

/// Pulls language documents from an upstream server whenever its checksum
/// differs from the local copy.
pub struct LanguageSync {
    client: Client,
    base_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    UpToDate,
    Updated { checksum: String },
}

impl LanguageSync {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/online/languages{}", self.base_url, path)
    }

    pub async fn remote_languages(&self) -> Result<Vec<String>, ServiceError> {
        let response = self
            .client
            .get(self.url(""))
            .send()
            .await
            .map_err(|e| ServiceError::Sync(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ServiceError::Sync(format!(
                "language list returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ServiceError::Sync(e.to_string()))
    }

    pub async fn remote_checksum(&self, language: &str) -> Result<String, ServiceError> {
        let response = self
            .client
            .get(self.url("/checksum"))
            .query(&[("language", language)])
            .send()
            .await
            .map_err(|e| ServiceError::Sync(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ServiceError::Sync(format!(
                "checksum for '{}' returned {}",
                language,
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::Sync(e.to_string()))?;
        Ok(body.trim().to_string())
    }

    pub async fn download(&self, language: &str) -> Result<Vec<u8>, ServiceError> {
        let response = self
            .client
            .get(self.url("/download"))
            .query(&[("language", language)])
            .send()
            .await
            .map_err(|e| ServiceError::Sync(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ServiceError::Sync(format!(
                "download of '{}' returned {}",
                language,
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ServiceError::Sync(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    /// Bring one language in line with upstream. The downloaded document is
    /// checked against the advertised checksum and parsed before it replaces
    /// the local file.
    pub async fn sync_language(
        &self,
        manager: &GameManager,
        language: &str,
    ) -> Result<SyncOutcome, ServiceError> {
        let remote = self.remote_checksum(language).await?;
        if let Ok(local) = manager.language_checksum(language).await {
            if local == remote {
                return Ok(SyncOutcome::UpToDate);
            }
        }

        let bytes = self.download(language).await?;
        let actual = game_core::checksum(&bytes);
        if actual != remote {
            return Err(ServiceError::Sync(format!(
                "checksum mismatch for '{}': expected {}, got {}",
                language, remote, actual
            )));
        }

        let checksum = manager.install_language(language, &bytes).await?;
        Ok(SyncOutcome::Updated { checksum })
    }

    /// Sync every language upstream offers. Failures are logged and skipped.
    pub async fn sync_all(&self, manager: &GameManager) -> Result<usize, ServiceError> {
        let mut updated = 0;
        for language in self.remote_languages().await? {
            match self.sync_language(manager, &language).await {
                Ok(SyncOutcome::Updated { checksum }) => {
                    info!("Updated language '{}' to {}", language, checksum);
                    updated += 1;
                }
                Ok(SyncOutcome::UpToDate) => {}
                Err(e) => warn!("Failed to sync language '{}': {}", language, e),
            }
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let sync = LanguageSync::new("https://words.example.org/");
        assert_eq!(
            sync.url("/checksum"),
            "https://words.example.org/online/languages/checksum"
        );
        assert_eq!(sync.url(""), "https://words.example.org/online/languages");
    }
}
