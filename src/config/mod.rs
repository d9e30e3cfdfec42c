use std::env;
use std::path::PathBuf;

use crate::error::AppError;

/// Default endpoint root for the Generative Language API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
/// Model used when the user has not stored a preference.
pub const DEFAULT_MODEL: &str = "gemini-2.0-pro-exp-02-05";
/// Locale every analysis is written in, whatever the input language.
pub const DEFAULT_OUTPUT_LANGUAGE: &str = "Simplified Chinese (简体中文)";
/// Number of analyses kept in local history.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini: GeminiConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub request: RequestConfig,
    pub analysis: AnalysisConfig,
}

/// Gemini API configuration
#[derive(Clone)]
pub struct GeminiConfig {
    /// System-provided key, used only when no user key is stored.
    pub system_api_key: Option<String>,
    pub base_url: String,
    pub default_model: String,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// HTTP request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub timeout_ms: u64,
}

/// Prompt and history settings
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub output_language: String,
    pub history_capacity: usize,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field(
                "system_api_key",
                &self.system_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let gemini = GeminiConfig {
            system_api_key: env::var("GEMINI_API_KEY")
                .ok()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            base_url: env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            default_model: env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
        };

        if gemini.base_url.trim().is_empty() {
            return Err(AppError::Config {
                message: "GEMINI_BASE_URL cannot be empty".to_string(),
            });
        }

        let database = DatabaseConfig {
            path: PathBuf::from(
                env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/deepread.db".to_string()),
            ),
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let request = RequestConfig {
            timeout_ms: env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(120_000),
        };

        let analysis = AnalysisConfig {
            output_language: env::var("OUTPUT_LANGUAGE")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_OUTPUT_LANGUAGE.to_string()),
            history_capacity: env::var("HISTORY_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(DEFAULT_HISTORY_CAPACITY),
        };

        Ok(Config {
            gemini,
            database,
            logging,
            request,
            analysis,
        })
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            system_api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self { timeout_ms: 120_000 }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            output_language: DEFAULT_OUTPUT_LANGUAGE.to_string(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}
