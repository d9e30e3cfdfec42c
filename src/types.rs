//! Domain types shared by the analysis pipeline and its consumers.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// What kind of input the user submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    /// A document reference the model should resolve (or search for).
    #[serde(alias = "url")]
    Link,
    /// Literal text to analyze as-is.
    Text,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputKind::Link => write!(f, "link"),
            InputKind::Text => write!(f, "text"),
        }
    }
}

/// A single user request for analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub input: String,
    pub kind: InputKind,
}

impl AnalysisRequest {
    /// Create a request for a link.
    pub fn link(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            kind: InputKind::Link,
        }
    }

    /// Create a request for raw text.
    pub fn text(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            kind: InputKind::Text,
        }
    }
}

/// A source the model cited while search grounding was enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub uri: String,
    pub title: String,
}

/// Structured critical-reading analysis.
///
/// Only produced by [`crate::normalize::normalize`] (or read back from
/// history, which only ever stores normalized results). `title` and
/// `summary` are required; every collection defaults to empty.
///
/// Fields below the top level are read leniently: scalars become strings,
/// nulls become empty, and array items that are not objects are skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub title: String,
    pub summary: String,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub key_insights: Vec<String>,
    #[serde(default, deserialize_with = "lenient_records")]
    pub logical_flow: Vec<FlowStep>,
    #[serde(default, deserialize_with = "lenient_records")]
    pub counter_arguments: Vec<CounterArgument>,
    #[serde(default, deserialize_with = "lenient_records")]
    pub similar_views: Vec<SimilarView>,
    #[serde(default)]
    pub writing_analysis: WritingAnalysis,
}

/// One stage of the argument's progression.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowStep {
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub label: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
}

/// A point from the source paired with a critical rebuttal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CounterArgument {
    #[serde(default, deserialize_with = "lenient_string")]
    pub point: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub rebuttal: String,
}

/// A related thinker or school and how their view connects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarView {
    #[serde(default, deserialize_with = "lenient_string")]
    pub thinker: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub perspective: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub context: String,
}

/// Stylistic breakdown of the source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WritingAnalysis {
    #[serde(default, deserialize_with = "lenient_string")]
    pub tone: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub audience: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub structure: String,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub viral_factors: Vec<String>,
}

/// Text of a model-supplied scalar; `None` for null.
fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?))
}

fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items.into_iter().filter_map(scalar_text).collect()),
        _ => Ok(Vec::new()),
    }
}

fn lenient_records<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect()),
        _ => Ok(Vec::new()),
    }
}
