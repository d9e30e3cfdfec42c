//! # DeepRead
//!
//! Critical-reading analysis of a link or a piece of text, produced by a
//! Gemini model and kept in a local history.
//!
//! ## Pipeline
//!
//! ```text
//! (input, kind) → CredentialResolver → prompts::compile → GeminiClient (HTTP)
//!                                                              ↓
//!                     HistoryCache (SQLite kv) ← normalize ← raw text + citations
//! ```
//!
//! - **Link** inputs run with search grounding so the model can look up
//!   pages it cannot open directly.
//! - **Text** inputs run with a JSON response type enforced by the service.
//! - The two modes never combine; see [`gemini::InvocationConfig`].
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use deepread::{AnalysisRequest, Analyzer, Config};
//! use deepread::store::SqliteStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let store = SqliteStore::new(&config.database).await?;
//!     let mut analyzer = Analyzer::from_config(&config, Arc::new(store)).await?;
//!     let analysis = analyzer
//!         .analyze(&AnalysisRequest::link("https://example.com/article"))
//!         .await?;
//!     println!("{}", analysis.result.title);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Command-line interface.
pub mod cli;
/// Configuration management.
#[allow(missing_docs)]
pub mod config;
/// Credential resolution and management.
pub mod credentials;
/// Error types and result aliases for the application.
#[allow(missing_docs)]
pub mod error;
/// Gemini API client and wire types.
#[allow(missing_docs)]
pub mod gemini;
/// Bounded history of successful analyses.
pub mod history;
/// Extraction of structured results from model text.
pub mod normalize;
/// The end-to-end analysis pipeline.
pub mod pipeline;
/// Prompt compilation.
pub mod prompts;
/// Persistence port and its implementations.
pub mod store;
/// Domain types.
#[allow(missing_docs)]
pub mod types;

pub use config::Config;
pub use error::{AnalysisError, AppError, AppResult};
pub use pipeline::{Analysis, Analyzer};
pub use types::{AnalysisRequest, AnalysisResult, GroundingSource, InputKind};
