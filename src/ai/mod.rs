//! LLM-backed generative text
//!
//! Supports the GenAI gateway (OpenAI-compatible), OpenAI, Anthropic and a
//! local Ollama. BYOK: keys come from the user config or the environment.
//!
//! # Environment Variables
//!
//! - `GENAI_API_KEY`: GenAI gateway (default backend)
//! - `OPENAI_API_KEY`: OpenAI backend
//! - `ANTHROPIC_API_KEY`: Anthropic backend
//!
//! # Example
//!
//! ```rust,ignore
//! use trustcard::ai::{AiClient, LlmBackend, LlmText};
//!
//! let client = AiClient::from_env(LlmBackend::GenAi)?;
//! let text = LlmText::new(client);
//! let clarity = text.get_readme_clarity(&readme).await;
//! ```

mod client;
mod prompts;
mod text;

pub use client::{AiClient, AiConfig, LlmBackend, Message, Role};
pub use prompts::{sanitize_readme, PromptTemplate};
pub use text::{parse_clarity, parse_extracted_code, parse_performance_claims, LlmText};

use thiserror::Error;

/// Errors that can occur in the AI module
#[derive(Error, Debug)]
pub enum AiError {
    #[error("Missing API key: {env_var} not set. Get your key at {signup_url}")]
    MissingApiKey { env_var: String, signup_url: String },

    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

pub type AiResult<T> = Result<T, AiError>;
