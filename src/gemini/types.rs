use serde::{Deserialize, Serialize};

use crate::prompts::PromptSpec;
use crate::types::{GroundingSource, InputKind};

/// How the model is invoked.
///
/// The service rejects search grounding combined with a JSON response MIME
/// type, so the two capabilities are separate variants rather than flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationConfig {
    /// Live search enabled, free-form output.
    SearchGrounded,
    /// JSON output enforced by the service, no retrieval.
    StrictSchema,
}

impl InvocationConfig {
    /// Select the invocation mode for an input kind.
    pub fn for_kind(kind: InputKind) -> Self {
        match kind {
            InputKind::Link => InvocationConfig::SearchGrounded,
            InputKind::Text => InvocationConfig::StrictSchema,
        }
    }

    /// Whether the model may issue retrieval queries.
    pub fn uses_search_grounding(self) -> bool {
        matches!(self, InvocationConfig::SearchGrounded)
    }

    /// Whether the service enforces structured output.
    pub fn enforces_strict_schema(self) -> bool {
        matches!(self, InvocationConfig::StrictSchema)
    }
}

/// Response text and citations from one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawModelResponse {
    pub text: String,
    pub grounding_chunks: Vec<GroundingSource>,
}

impl RawModelResponse {
    /// Response without citations.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            grounding_chunks: Vec::new(),
        }
    }
}

/// Body of a `generateContent` call
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// A conversation turn
#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

/// Text part of a turn
#[derive(Debug, Clone, Serialize)]
pub struct Part {
    pub text: String,
}

/// Tool declaration
#[derive(Debug, Clone, Default, Serialize)]
pub struct Tool {
    #[serde(rename = "google_search")]
    pub google_search: GoogleSearch,
}

/// Empty marker enabling the search tool
#[derive(Debug, Clone, Default, Serialize)]
pub struct GoogleSearch {}

/// Generation settings
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
}

impl GenerateContentRequest {
    /// Build the request body for a compiled prompt.
    pub fn new(prompt: &PromptSpec, config: InvocationConfig) -> Self {
        let contents = vec![Content {
            role: "user".to_string(),
            parts: vec![Part {
                text: prompt.text.clone(),
            }],
        }];

        match config {
            InvocationConfig::SearchGrounded => Self {
                contents,
                tools: vec![Tool::default()],
                generation_config: None,
            },
            InvocationConfig::StrictSchema => Self {
                contents,
                tools: Vec::new(),
                generation_config: Some(GenerationConfig {
                    response_mime_type: "application/json".to_string(),
                }),
            },
        }
    }
}

/// Response of a `generateContent` call
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

/// Set when the prompt itself was blocked
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

/// One generated candidate
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub grounding_metadata: Option<GroundingMetadata>,
    pub finish_reason: Option<String>,
}

/// Content of a candidate
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

/// One part of the candidate content
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
    /// Set on reasoning summaries, which are not part of the answer
    #[serde(default)]
    pub thought: bool,
}

/// Search grounding details
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

/// A single citation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroundingChunk {
    pub web: Option<WebChunk>,
}

/// Web citation details
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebChunk {
    pub uri: Option<String>,
    pub title: Option<String>,
}

impl GenerateContentResponse {
    /// Answer text of the first candidate, excluding thought parts.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter(|p| !p.thought)
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    /// Web citations of the first candidate, in the order given.
    ///
    /// Chunks without a URI are skipped; a missing title falls back to the URI.
    pub fn grounding_sources(&self) -> Vec<GroundingSource> {
        let Some(metadata) = self
            .candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
        else {
            return Vec::new();
        };

        metadata
            .grounding_chunks
            .iter()
            .filter_map(|chunk| chunk.web.as_ref())
            .filter_map(|web| {
                let uri = web.uri.as_ref().filter(|u| !u.is_empty())?;
                let title = web
                    .title
                    .clone()
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| uri.clone());
                Some(GroundingSource {
                    uri: uri.clone(),
                    title,
                })
            })
            .collect()
    }

    /// Why generation stopped: the first candidate's finish reason, or the
    /// prompt block reason when there are no candidates.
    pub fn stop_reason(&self) -> Option<&str> {
        match self.candidates.first() {
            Some(candidate) => candidate.finish_reason.as_deref(),
            None => self
                .prompt_feedback
                .as_ref()
                .and_then(|f| f.block_reason.as_deref()),
        }
    }

    /// Split into the pipeline's transient response.
    pub fn into_raw(self) -> RawModelResponse {
        RawModelResponse {
            text: self.text(),
            grounding_chunks: self.grounding_sources(),
        }
    }
}

/// Error envelope returned by Google APIs
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

/// Error details
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub code: Option<u16>,
    pub message: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub details: Vec<ApiErrorDetail>,
}

/// One entry of `error.details`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    pub reason: Option<String>,
}

impl ApiErrorBody {
    /// First `reason` found in the details, if any.
    pub fn reason(&self) -> Option<&str> {
        self.details.iter().find_map(|d| d.reason.as_deref())
    }
}
