//! Prompt compilation for content analysis.
//!
//! Each request gets mode-specific guidance followed by the shared output
//! contract. Compilation is pure: the same request and language always
//! produce the same prompt text.

use crate::types::{AnalysisRequest, InputKind};

/// Persona line opening every prompt.
pub const ANALYST_PREAMBLE: &str = "You are an expert Content Analyst AI.";

/// Guidance for link inputs. The model may not refuse; it has to fall back to
/// searching when the page itself is unreachable.
pub const LINK_GUIDANCE: &str = r#"**CRITICAL INSTRUCTIONS FOR LINKS:**
1. **Access & Search**: First, try to access the link directly. If it cannot be accessed (e.g. 403 Forbidden, login required, app-only content), you MUST use the search tool to look up the link string itself, or the title and keywords of the article it points to.
2. **Synthesize**: Build your analysis from the search snippets, summaries and any available metadata.
3. **Force Output**: Do NOT reply that you cannot access the content. Always return the best possible analysis JSON based on what you found."#;

/// Guidance for literal text inputs.
pub const TEXT_GUIDANCE: &str = "Analyze only the text provided above. Do not look anything up; base every field on the text itself.";

/// Output contract appended to every prompt.
pub const OUTPUT_CONTRACT: &str = r#"**OUTPUT FORMAT**:
Return a SINGLE, valid JSON object matching this schema exactly.
Do not include conversational text before or after it.
A ```json fenced block is tolerated, but raw JSON is preferred.

{
  "title": "title of the piece",
  "summary": "the essence of the piece in at most 3 sentences",
  "keyInsights": ["core insight 1", "core insight 2", "core insight 3", "core insight 4"],
  "logicalFlow": [
    { "id": "1", "label": "stage 1 heading", "description": "short description" },
    { "id": "2", "label": "stage 2 heading", "description": "short description" }
  ],
  "counterArguments": [
    { "point": "a claim made by the author", "rebuttal": "an opposing or critical perspective" }
  ],
  "similarViews": [
    { "thinker": "related person or school", "perspective": "their similar view", "context": "how it connects" }
  ],
  "writingAnalysis": {
    "tone": "tone of the piece (e.g. rational, emotional, satirical)",
    "audience": "target audience",
    "structure": "writing framework (e.g. SCQA, pyramid principle, general-specific-general)",
    "viralFactors": ["why it spreads 1", "why it spreads 2"]
  }
}

Field meanings:
- title: the title of the analyzed piece
- summary: a concise digest of the main message
- keyInsights: the most important takeaways, as short strings
- logicalFlow: the ordered stages of the argument
- counterArguments: claims from the piece paired with critical rebuttals
- similarViews: thinkers or schools holding related views
- writingAnalysis: tone, intended audience, structural framework and virality factors"#;

/// A compiled prompt, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSpec {
    pub kind: InputKind,
    pub text: String,
}

/// Compile the prompt for `request`, asking for output in `language`.
pub fn compile(request: &AnalysisRequest, language: &str) -> PromptSpec {
    let language_line = format!("**Language**: Output strictly in **{}**.", language);

    let body = match request.kind {
        InputKind::Link => format!(
            "{}\n\nTask: Analyze the content associated with this link: {}\n\n{}\n\n{}",
            ANALYST_PREAMBLE, request.input, LINK_GUIDANCE, language_line
        ),
        InputKind::Text => format!(
            "{}\n\nAnalyze the following text:\n\n\"\"\"\n{}\n\"\"\"\n\n{}\n\n{}",
            ANALYST_PREAMBLE, request.input, TEXT_GUIDANCE, language_line
        ),
    };

    PromptSpec {
        kind: request.kind,
        text: format!("{}\n\n{}", body, OUTPUT_CONTRACT),
    }
}
