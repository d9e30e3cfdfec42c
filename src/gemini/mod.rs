//! Gemini API client and wire types.

mod client;
mod types;


#[cfg(test)]
pub use client::MockModelBackend;
pub use client::{GeminiClient, ModelBackend};
pub use types::*;
