//! Credential resolution.
//!
//! A user key stored locally always wins over the system key from the
//! environment. The resolver is the only component that reads or writes the
//! credential keys of the [`KeyValueStore`].

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::GeminiConfig;
use crate::error::{AnalysisError, AppResult, StorageResult};
use crate::store::{KeyValueStore, USER_API_KEY, USER_MODEL};

/// Where a resolved key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    User,
    System,
}

/// Key and model to use for one request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub api_key: String,
    pub model_id: String,
    pub source: CredentialSource,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("api_key", &"<redacted>")
            .field("model_id", &self.model_id)
            .field("source", &self.source)
            .finish()
    }
}

/// Resolves credentials from the local store with a system fallback.
#[derive(Clone)]
pub struct CredentialResolver {
    store: Arc<dyn KeyValueStore>,
    system_api_key: Option<String>,
    default_model: String,
}

impl CredentialResolver {
    /// Create a resolver over `store` using the system settings in `config`.
    pub fn new(store: Arc<dyn KeyValueStore>, config: &GeminiConfig) -> Self {
        Self {
            store,
            system_api_key: config.system_api_key.clone(),
            default_model: config.default_model.clone(),
        }
    }

    /// Resolve the credential for a request.
    ///
    /// Fails with [`AnalysisError::CredentialMissing`] when neither a user
    /// key nor a system key exists.
    pub async fn resolve(&self) -> AppResult<Credential> {
        if let Some(api_key) = self.user_key().await? {
            let model_id = self
                .store
                .get(USER_MODEL)
                .await?
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| self.default_model.clone());
            debug!(model = %model_id, "Using user API key");
            return Ok(Credential {
                api_key,
                model_id,
                source: CredentialSource::User,
            });
        }

        match &self.system_api_key {
            Some(api_key) => {
                debug!(model = %self.default_model, "Using system API key");
                Ok(Credential {
                    api_key: api_key.clone(),
                    model_id: self.default_model.clone(),
                    source: CredentialSource::System,
                })
            }
            None => Err(AnalysisError::CredentialMissing.into()),
        }
    }

    /// Whether the user has stored their own key.
    pub async fn has_user_key(&self) -> StorageResult<bool> {
        Ok(self.user_key().await?.is_some())
    }

    /// Store a user key. A blank key clears the stored credentials instead.
    pub async fn set_user_key(&self, api_key: &str) -> StorageResult<()> {
        let trimmed = api_key.trim();
        if trimmed.is_empty() {
            return self.clear().await;
        }
        self.store.set(USER_API_KEY, trimmed).await?;
        info!("User API key saved");
        Ok(())
    }

    /// Store the user's model preference. A blank value removes it.
    pub async fn set_user_model(&self, model_id: &str) -> StorageResult<()> {
        let trimmed = model_id.trim();
        if trimmed.is_empty() {
            return self.store.remove(USER_MODEL).await;
        }
        self.store.set(USER_MODEL, trimmed).await
    }

    /// Remove the user key and model preference together.
    pub async fn clear(&self) -> StorageResult<()> {
        self.store.remove_all(&[USER_API_KEY, USER_MODEL]).await?;
        info!("User API key cleared");
        Ok(())
    }

    async fn user_key(&self) -> StorageResult<Option<String>> {
        Ok(self
            .store
            .get(USER_API_KEY)
            .await?
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty()))
    }
}
