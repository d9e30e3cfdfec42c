//! The content analysis pipeline.
//!
//! `(input, kind)` → credential → prompt → model call → normalization →
//! history. Any failure before the result is recorded ends the request and
//! leaves history and credential state as they were. A failed history write
//! is logged and the analysis is still returned, without an entry id.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::{AnalysisConfig, Config};
use crate::credentials::CredentialResolver;
use crate::error::{AnalysisError, AppError, AppResult};
use crate::gemini::{GeminiClient, InvocationConfig, ModelBackend};
use crate::history::HistoryCache;
use crate::normalize::normalize;
use crate::prompts;
use crate::store::KeyValueStore;
use crate::types::{AnalysisRequest, AnalysisResult, GroundingSource};

/// Outcome of a successful analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// Id of the history entry the result was stored under, if the write
    /// succeeded.
    pub entry_id: Option<String>,
    pub result: AnalysisResult,
    pub grounding_chunks: Vec<GroundingSource>,
}

/// Runs analyses and owns the history they are recorded in.
pub struct Analyzer {
    credentials: CredentialResolver,
    backend: Arc<dyn ModelBackend>,
    history: HistoryCache,
    output_language: String,
}

impl Analyzer {
    /// Assemble an analyzer from its parts.
    pub fn new(
        credentials: CredentialResolver,
        backend: Arc<dyn ModelBackend>,
        history: HistoryCache,
        config: &AnalysisConfig,
    ) -> Self {
        Self {
            credentials,
            backend,
            history,
            output_language: config.output_language.clone(),
        }
    }

    /// Build an analyzer talking to Gemini, with state kept in `store`.
    pub async fn from_config(config: &Config, store: Arc<dyn KeyValueStore>) -> AppResult<Self> {
        let credentials = CredentialResolver::new(store.clone(), &config.gemini);
        let backend = GeminiClient::new(&config.gemini, config.request.clone()).map_err(|e| {
            AppError::Internal {
                message: format!("Failed to create Gemini client: {}", e),
            }
        })?;
        let history =
            HistoryCache::load_with_capacity(store, config.analysis.history_capacity).await?;

        Ok(Self::new(
            credentials,
            Arc::new(backend),
            history,
            &config.analysis,
        ))
    }

    /// Credential management.
    pub fn credentials(&self) -> &CredentialResolver {
        &self.credentials
    }

    /// Past analyses.
    pub fn history(&self) -> &HistoryCache {
        &self.history
    }

    /// Past analyses, for delete and clear.
    pub fn history_mut(&mut self) -> &mut HistoryCache {
        &mut self.history
    }

    /// Analyze `request` and record the result in history.
    pub async fn analyze(&mut self, request: &AnalysisRequest) -> AppResult<Analysis> {
        let start = Instant::now();

        if request.input.trim().is_empty() {
            return Err(AnalysisError::InvalidInput {
                reason: "input cannot be empty".to_string(),
            }
            .into());
        }

        let credential = self.credentials.resolve().await?;
        let prompt = prompts::compile(request, &self.output_language);
        let config = InvocationConfig::for_kind(request.kind);

        debug!(
            kind = %request.kind,
            source = ?credential.source,
            "Processing analysis request"
        );

        let raw = self
            .backend
            .invoke(&prompt, &credential, config)
            .await
            .map_err(AnalysisError::from)?;

        let result = normalize(&raw).map_err(|e| {
            warn!(kind = %request.kind, error = %e, "Model response rejected");
            e
        })?;

        let entry_id = match self
            .history
            .insert(
                result.clone(),
                raw.grounding_chunks.clone(),
                &request.input,
                request.kind,
            )
            .await
        {
            Ok(entry) => Some(entry.id.clone()),
            Err(e) => {
                warn!(kind = %request.kind, error = %e, "Analysis not saved to history");
                None
            }
        };

        info!(
            entry_id = entry_id.as_deref().unwrap_or("-"),
            kind = %request.kind,
            grounding_chunks = raw.grounding_chunks.len(),
            latency_ms = start.elapsed().as_millis(),
            "Analysis completed"
        );

        Ok(Analysis {
            entry_id,
            result,
            grounding_chunks: raw.grounding_chunks,
        })
    }
}
