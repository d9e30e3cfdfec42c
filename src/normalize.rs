//! Extraction of an [`AnalysisResult`] from untrusted model text.
//!
//! The chain runs in a fixed order:
//!
//! 1. reject empty or whitespace-only text ([`AnalysisError::EmptyResponse`])
//! 2. trim and strip a leading/trailing code fence ([`strip_code_fence`])
//! 3. slice from the first `{` to the last `}` ([`slice_json_object`])
//! 4. parse the span as a JSON object ([`parse_object`])
//! 5. check required fields and default missing collections ([`validate`])
//!
//! Failures in steps 3-5 are [`AnalysisError::MalformedResponse`]. Validation
//! stops at `title`/`summary` presence and collection types; a partial
//! analysis is returned rather than rejected.

use serde_json::{Map, Value};

use crate::error::AnalysisError;
use crate::gemini::RawModelResponse;
use crate::types::AnalysisResult;

const ARRAY_FIELDS: [&str; 4] = [
    "keyInsights",
    "logicalFlow",
    "counterArguments",
    "similarViews",
];

/// Run the full extraction chain over a raw model response.
pub fn normalize(raw: &RawModelResponse) -> Result<AnalysisResult, AnalysisError> {
    let text = raw.text.trim();
    if text.is_empty() {
        return Err(AnalysisError::EmptyResponse);
    }

    let unfenced = strip_code_fence(text);
    let span = slice_json_object(unfenced).ok_or_else(|| malformed("no JSON object found"))?;
    let object = parse_object(span)?;
    validate(object)
}

/// Remove a leading ```` ``` ```` / ```` ```json ```` marker and a trailing
/// ```` ``` ````, if present. Text in between is returned trimmed.
pub fn strip_code_fence(text: &str) -> &str {
    let mut s = text.trim();

    if let Some(rest) = s.strip_prefix("```") {
        let rest = match rest.get(..4) {
            Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
            _ => rest,
        };
        s = rest.trim_start();
    }

    if let Some(rest) = s.strip_suffix("```") {
        s = rest.trim_end();
    }

    s
}

/// Slice from the first `{` to the last `}` inclusive.
pub fn slice_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Parse `span`, requiring a JSON object at the top level.
pub fn parse_object(span: &str) -> Result<Map<String, Value>, AnalysisError> {
    match serde_json::from_str::<Value>(span) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(malformed("top-level value is not an object")),
        Err(e) => Err(malformed(format!("invalid JSON: {}", e))),
    }
}

/// Check required fields and fill absent collections with empty ones.
pub fn validate(mut object: Map<String, Value>) -> Result<AnalysisResult, AnalysisError> {
    for field in ["title", "summary"] {
        match object.get(field) {
            Some(Value::String(s)) if !s.trim().is_empty() => {}
            Some(Value::String(_)) => {
                return Err(malformed(format!("field '{}' is empty", field)))
            }
            Some(_) => return Err(malformed(format!("field '{}' is not a string", field))),
            None => return Err(malformed(format!("missing field '{}'", field))),
        }
    }

    for field in ARRAY_FIELDS {
        default_array(&mut object, field)?;
    }

    let writing = object
        .entry("writingAnalysis")
        .or_insert(Value::Null);
    if writing.is_null() {
        *writing = Value::Object(Map::new());
    }
    match writing {
        Value::Object(writing) => default_array(writing, "viralFactors")?,
        _ => return Err(malformed("field 'writingAnalysis' is not an object")),
    }

    serde_json::from_value(Value::Object(object))
        .map_err(|e| malformed(format!("unexpected field shape: {}", e)))
}

fn default_array(object: &mut Map<String, Value>, field: &str) -> Result<(), AnalysisError> {
    match object.get(field) {
        Some(Value::Array(_)) => Ok(()),
        None | Some(Value::Null) => {
            object.insert(field.to_string(), Value::Array(Vec::new()));
            Ok(())
        }
        Some(_) => Err(malformed(format!("field '{}' is not an array", field))),
    }
}

fn malformed(message: impl Into<String>) -> AnalysisError {
    AnalysisError::MalformedResponse {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BARE: &str = r#"{"title":"T","summary":"S","keyInsights":["a"],"logicalFlow":[],"counterArguments":[],"similarViews":[],"writingAnalysis":{"tone":"x","audience":"y","structure":"z","viralFactors":[]}}"#;

    fn run(text: &str) -> Result<AnalysisResult, AnalysisError> {
        normalize(&RawModelResponse::from_text(text))
    }

    #[test]
    fn test_bare_json() {
        let result = run(BARE).unwrap();
        assert_eq!(result.title, "T");
        assert_eq!(result.summary, "S");
        assert_eq!(result.key_insights, vec!["a".to_string()]);
        assert_eq!(result.writing_analysis.tone, "x");
    }

    #[test]
    fn test_wrappings_extract_same_result() {
        let expected = run(BARE).unwrap();
        let wrapped = [
            format!("```json\n{}\n```", BARE),
            format!("```JSON\n{}\n```", BARE),
            format!("```\n{}\n```", BARE),
            format!("  \n```json {}```  \n", BARE),
            format!("Here is the analysis:\n```json\n{}\n```\nHope this helps!", BARE),
            format!("Sure! {} Let me know if you need more.", BARE),
        ];
        for text in wrapped {
            assert_eq!(run(&text).unwrap(), expected, "input: {}", text);
        }
    }

    #[test]
    fn test_empty_and_whitespace_are_empty_response() {
        assert!(matches!(run(""), Err(AnalysisError::EmptyResponse)));
        assert!(matches!(run(" \n\t "), Err(AnalysisError::EmptyResponse)));
    }

    #[test]
    fn test_refusal_without_braces_is_malformed() {
        assert!(matches!(
            run("Sorry, I cannot access this."),
            Err(AnalysisError::MalformedResponse { .. })
        ));
        assert!(matches!(
            run("```json\n```"),
            Err(AnalysisError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_broken_json_is_malformed() {
        assert!(matches!(
            run(r#"{"title": "T", "summary": }"#),
            Err(AnalysisError::MalformedResponse { .. })
        ));
        assert!(matches!(
            run("} backwards {"),
            Err(AnalysisError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_missing_collections_default_to_empty() {
        let result = run(r#"{"title":"T","summary":"S"}"#).unwrap();
        assert!(result.key_insights.is_empty());
        assert!(result.logical_flow.is_empty());
        assert!(result.counter_arguments.is_empty());
        assert!(result.similar_views.is_empty());
        assert!(result.writing_analysis.viral_factors.is_empty());
        assert_eq!(result.writing_analysis.tone, "");
    }

    #[test]
    fn test_null_collections_default_to_empty() {
        let result = run(
            r#"{"title":"T","summary":"S","keyInsights":null,"writingAnalysis":{"tone":"calm","viralFactors":null}}"#,
        )
        .unwrap();
        assert!(result.key_insights.is_empty());
        assert_eq!(result.writing_analysis.tone, "calm");
    }

    #[test]
    fn test_required_fields() {
        for text in [
            r#"{"summary":"S"}"#,
            r#"{"title":"T"}"#,
            r#"{"title":"  ","summary":"S"}"#,
            r#"{"title":42,"summary":"S"}"#,
        ] {
            assert!(
                matches!(run(text), Err(AnalysisError::MalformedResponse { .. })),
                "input: {}",
                text
            );
        }
    }

    #[test]
    fn test_wrong_collection_type_is_malformed() {
        assert!(matches!(
            run(r#"{"title":"T","summary":"S","keyInsights":"one insight"}"#),
            Err(AnalysisError::MalformedResponse { .. })
        ));
        assert!(matches!(
            run(r#"{"title":"T","summary":"S","writingAnalysis":"plain"}"#),
            Err(AnalysisError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_partial_nested_entries_are_kept() {
        let result = run(
            r#"{"title":"T","summary":"S","logicalFlow":[{"id":"1","label":"Intro"}],"similarViews":[{"thinker":"Hume"}]}"#,
        )
        .unwrap();
        assert_eq!(result.logical_flow[0].id.as_deref(), Some("1"));
        assert_eq!(result.logical_flow[0].label, "Intro");
        assert_eq!(result.logical_flow[0].description, "");
        assert_eq!(result.similar_views[0].thinker, "Hume");
    }

    #[test]
    fn test_loose_nested_values_are_accepted() {
        let result = run(
            r#"{"title":"T","summary":"S","logicalFlow":[{"id":1,"label":"a","description":"b"}]}"#,
        )
        .unwrap();
        assert_eq!(result.logical_flow[0].id.as_deref(), Some("1"));

        let result = run(r#"{"title":"T","summary":"S","writingAnalysis":{"tone":null}}"#).unwrap();
        assert_eq!(result.writing_analysis.tone, "");

        let result = run(
            r#"{"title":"T","summary":"S","counterArguments":[null,{"point":"p","rebuttal":"r"}]}"#,
        )
        .unwrap();
        assert_eq!(result.counter_arguments.len(), 1);
        assert_eq!(result.counter_arguments[0].point, "p");
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("{}"), "{}");
        assert_eq!(strip_code_fence("prose ```json {} ```"), "prose ```json {}");
    }

    #[test]
    fn test_slice_json_object() {
        assert_eq!(slice_json_object("a {\"k\": {}} b"), Some("{\"k\": {}}"));
        assert_eq!(slice_json_object("no braces"), None);
        assert_eq!(slice_json_object("only {"), None);
        assert_eq!(slice_json_object("} {"), None);
    }

    #[test]
    fn test_parse_object_rejects_non_objects() {
        assert!(parse_object("{}").is_ok());
        assert!(parse_object("[1]").is_err());
        assert!(parse_object("{oops}").is_err());
    }
}
