//! Command-line interface.
//!
//! Thin layer over [`Analyzer`]: parses commands, runs them and turns the
//! outcome into text plus an exit code.

use std::fmt::Write as _;

use clap::{Parser, Subcommand};

use crate::error::{AppError, AppResult};
use crate::history::HistoryEntry;
use crate::pipeline::Analyzer;
use crate::types::{AnalysisRequest, AnalysisResult, GroundingSource};

/// Critical-reading analysis of links and text.
#[derive(Parser, Debug)]
#[command(name = "deepread", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Analyze a link (default) or a piece of text
    Analyze {
        /// The link or text to analyze
        input: String,

        /// Treat the input as raw text instead of a link
        #[arg(long)]
        text: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage the locally stored API key
    Key {
        #[command(subcommand)]
        command: KeyCommands,
    },

    /// Browse past analyses
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },
}

/// API key subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum KeyCommands {
    /// Save your own API key (a blank key clears it)
    Set {
        key: String,

        /// Model to use with this key
        #[arg(long)]
        model: Option<String>,
    },

    /// Remove the stored key and model preference
    Clear,

    /// Show whether a user key is stored
    Status,
}

/// History subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum HistoryCommands {
    /// List stored analyses, most recent first
    List,

    /// Show a stored analysis
    Show {
        id: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a stored analysis
    Delete { id: String },

    /// Delete all stored analyses
    Clear,
}

/// Result of CLI command execution.
pub struct CliResult {
    /// Exit code (0 = success)
    pub exit_code: i32,
    /// Output message
    pub message: String,
}

impl CliResult {
    /// Create a success result with the given message.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            message: message.into(),
        }
    }

    /// Create an error result with the given message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            exit_code: 1,
            message: message.into(),
        }
    }
}

impl From<AppError> for CliResult {
    fn from(err: AppError) -> Self {
        CliResult::error(err.user_message())
    }
}

/// Execute a CLI command.
pub async fn execute_command(command: Commands, analyzer: &mut Analyzer) -> CliResult {
    match command {
        Commands::Analyze { input, text, json } => {
            let request = if text {
                AnalysisRequest::text(input)
            } else {
                AnalysisRequest::link(input)
            };
            match analyzer.analyze(&request).await {
                Ok(analysis) => {
                    render_result(&analysis.result, &analysis.grounding_chunks, json)
                }
                Err(e) => e.into(),
            }
        }
        Commands::Key { command } => execute_key(command, analyzer).await,
        Commands::History { command } => execute_history(command, analyzer).await,
    }
}

async fn execute_key(command: KeyCommands, analyzer: &Analyzer) -> CliResult {
    let outcome = match command {
        KeyCommands::Set { key, model } => set_key(analyzer, &key, model.as_deref()).await,
        KeyCommands::Clear => analyzer
            .credentials()
            .clear()
            .await
            .map(|_| "API key cleared.".to_string())
            .map_err(AppError::from),
        KeyCommands::Status => analyzer
            .credentials()
            .has_user_key()
            .await
            .map(|has_key| {
                if has_key {
                    "Using your own API key.".to_string()
                } else {
                    "No user API key stored; the system key is used if configured.".to_string()
                }
            })
            .map_err(AppError::from),
    };

    match outcome {
        Ok(message) => CliResult::success(message),
        Err(e) => e.into(),
    }
}

async fn set_key(analyzer: &Analyzer, key: &str, model: Option<&str>) -> AppResult<String> {
    let credentials = analyzer.credentials();
    credentials.set_user_key(key).await?;
    if key.trim().is_empty() {
        return Ok("API key cleared.".to_string());
    }
    if let Some(model) = model {
        credentials.set_user_model(model).await?;
    }
    Ok("API key saved.".to_string())
}

async fn execute_history(command: HistoryCommands, analyzer: &mut Analyzer) -> CliResult {
    match command {
        HistoryCommands::List => {
            let entries = analyzer.history().entries();
            if entries.is_empty() {
                return CliResult::success("No history yet.");
            }
            let mut out = String::new();
            for entry in entries {
                let _ = writeln!(out, "{}", list_line(entry));
            }
            CliResult::success(out.trim_end())
        }
        HistoryCommands::Show { id, json } => match analyzer.history().select(&id) {
            Some(entry) => render_result(&entry.result, &entry.grounding_chunks, json),
            None => CliResult::error(format!("No history entry with id {}", id)),
        },
        HistoryCommands::Delete { id } => match analyzer.history_mut().delete(&id).await {
            Ok(true) => CliResult::success("Entry deleted."),
            Ok(false) => CliResult::error(format!("No history entry with id {}", id)),
            Err(e) => AppError::from(e).into(),
        },
        HistoryCommands::Clear => match analyzer.history_mut().clear().await {
            Ok(()) => CliResult::success("History cleared."),
            Err(e) => AppError::from(e).into(),
        },
    }
}

fn list_line(entry: &HistoryEntry) -> String {
    format!(
        "{}  {}  [{}]  {}  ({})",
        entry.id,
        entry.timestamp.format("%Y-%m-%d %H:%M"),
        entry.kind,
        entry.result.title,
        truncate(&entry.input, 60)
    )
}

fn truncate(s: &str, max_chars: usize) -> String {
    let single_line = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= max_chars {
        single_line
    } else {
        let cut: String = single_line.chars().take(max_chars).collect();
        format!("{}…", cut)
    }
}

fn render_result(result: &AnalysisResult, sources: &[GroundingSource], json: bool) -> CliResult {
    if json {
        let payload = serde_json::json!({
            "result": result,
            "groundingChunks": sources,
        });
        return match serde_json::to_string_pretty(&payload) {
            Ok(s) => CliResult::success(s),
            Err(e) => CliResult::error(format!("Failed to serialize result: {}", e)),
        };
    }
    CliResult::success(render_text(result, sources))
}

/// Plain-text rendering of an analysis.
pub fn render_text(result: &AnalysisResult, sources: &[GroundingSource]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", result.title);
    let _ = writeln!(out, "{}\n", result.summary);

    if !result.key_insights.is_empty() {
        let _ = writeln!(out, "## Key insights");
        for insight in &result.key_insights {
            let _ = writeln!(out, "- {}", insight);
        }
        out.push('\n');
    }

    if !result.logical_flow.is_empty() {
        let _ = writeln!(out, "## Logical flow");
        for (i, step) in result.logical_flow.iter().enumerate() {
            let _ = writeln!(out, "{}. {}: {}", i + 1, step.label, step.description);
        }
        out.push('\n');
    }

    if !result.counter_arguments.is_empty() {
        let _ = writeln!(out, "## Counter-arguments");
        for arg in &result.counter_arguments {
            let _ = writeln!(out, "- {}\n  ↳ {}", arg.point, arg.rebuttal);
        }
        out.push('\n');
    }

    if !result.similar_views.is_empty() {
        let _ = writeln!(out, "## Similar views");
        for view in &result.similar_views {
            let _ = writeln!(out, "- {}: {} ({})", view.thinker, view.perspective, view.context);
        }
        out.push('\n');
    }

    let writing = &result.writing_analysis;
    let _ = writeln!(out, "## Writing");
    let _ = writeln!(out, "Tone: {}", writing.tone);
    let _ = writeln!(out, "Audience: {}", writing.audience);
    let _ = writeln!(out, "Structure: {}", writing.structure);
    if !writing.viral_factors.is_empty() {
        let _ = writeln!(out, "Viral factors: {}", writing.viral_factors.join(", "));
    }

    if !sources.is_empty() {
        let _ = writeln!(out, "\n## Sources");
        for source in sources {
            let _ = writeln!(out, "- {} <{}>", source.title, source.uri);
        }
    }

    out.trim_end().to_string()
}
