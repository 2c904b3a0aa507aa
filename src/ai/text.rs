//! [`GenerativeText`] over an [`AiClient`]
//!
//! LLM replies are free text, so each call goes through a lenient parser.
//! Anything unparseable or any request failure yields the neutral default
//! (empty snippet list, all-zero claims, clarity 0.5).

use super::{AiClient, AiError, AiResult, Message, PromptTemplate};
use crate::collaborators::{ExtractedCode, GenerativeText, PerformanceClaims, DEFAULT_CLARITY};
use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

pub struct LlmText {
    client: Arc<AiClient>,
}

impl LlmText {
    pub fn new(client: AiClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    async fn chat(&self, prompt: String) -> AiResult<String> {
        let client = Arc::clone(&self.client);
        tokio::task::spawn_blocking(move || {
            client.generate(vec![Message::user(prompt)], Some(PromptTemplate::system_prompt()))
        })
        .await
        .map_err(|e| AiError::RequestFailed(e.to_string()))?
    }
}

#[async_trait]
impl GenerativeText for LlmText {
    async fn extract_code_from_text(&self, text: &str) -> Vec<ExtractedCode> {
        match self.chat(PromptTemplate::code_extraction(text)).await {
            Ok(reply) => parse_extracted_code(&reply),
            Err(e) => {
                warn!("Code extraction failed, assuming no snippets: {}", e);
                Vec::new()
            }
        }
    }

    async fn get_performance_claims(&self, readme_text: &str) -> PerformanceClaims {
        let extracted = match self.chat(PromptTemplate::performance_extraction(readme_text)).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Falling back to default performance claims: {}", e);
                return PerformanceClaims::default();
            }
        };
        match self.chat(PromptTemplate::performance_conversion(&extracted)).await {
            Ok(reply) => parse_performance_claims(&reply).unwrap_or_else(|| {
                warn!("Unparseable performance claims reply, using defaults");
                PerformanceClaims::default()
            }),
            Err(e) => {
                warn!("Falling back to default performance claims: {}", e);
                PerformanceClaims::default()
            }
        }
    }

    async fn get_readme_clarity(&self, readme_text: &str) -> f64 {
        match self.chat(PromptTemplate::readme_clarity(readme_text)).await {
            Ok(reply) => parse_clarity(&reply).unwrap_or_else(|| {
                let preview: String = reply.chars().take(200).collect();
                warn!("Could not parse clarity from reply: {}", preview);
                DEFAULT_CLARITY
            }),
            Err(e) => {
                warn!("Falling back to default clarity score: {}", e);
                DEFAULT_CLARITY
            }
        }
    }
}

fn json_object_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{[^{}]*\}").expect("valid regex"))
}

fn json_array_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\[.*\]").expect("valid regex"))
}

fn fenced_block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```([A-Za-z0-9_+-]*)[^\n]*\n(.*?)```").expect("valid regex"))
}

fn unit_number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(?:0?\.\d+|1\.0+|0\.0+|1|0)\b").expect("valid regex"))
}

fn any_number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d*\.?\d+").expect("valid regex"))
}

/// First JSON object in the reply (markdown fences tolerated), else the
/// whole reply as JSON
pub fn parse_performance_claims(reply: &str) -> Option<PerformanceClaims> {
    if let Some(m) = json_object_regex().find(reply) {
        if let Ok(claims) = serde_json::from_str::<PerformanceClaims>(m.as_str()) {
            return Some(claims);
        }
        debug!("Embedded JSON object did not parse as performance claims");
    }
    serde_json::from_str(reply.trim()).ok()
}

/// Clarity in [0, 1]: the whole reply as a number, else the first number in it
pub fn parse_clarity(reply: &str) -> Option<f64> {
    let value = reply
        .trim()
        .parse::<f64>()
        .ok()
        .or_else(|| {
            unit_number_regex()
                .find(reply)
                .and_then(|m| m.as_str().parse().ok())
        })
        .or_else(|| {
            any_number_regex()
                .find(reply)
                .and_then(|m| m.as_str().parse().ok())
        })?;
    value.is_finite().then(|| value.clamp(0.0, 1.0))
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum SnippetItem {
    Structured(ExtractedCode),
    Bare(String),
}

/// Snippets from a JSON array reply, else from fenced code blocks
pub fn parse_extracted_code(reply: &str) -> Vec<ExtractedCode> {
    let from_json = json_array_regex()
        .find(reply)
        .and_then(|m| serde_json::from_str::<Vec<SnippetItem>>(m.as_str()).ok())
        .map(|items| {
            items
                .into_iter()
                .map(|item| match item {
                    SnippetItem::Structured(code) => code,
                    SnippetItem::Bare(code) => ExtractedCode {
                        code,
                        language: "python".to_string(),
                    },
                })
                .collect::<Vec<_>>()
        });

    let snippets = from_json.unwrap_or_else(|| {
        fenced_block_regex()
            .captures_iter(reply)
            .map(|c| {
                let language = match c.get(1).map(|l| l.as_str()).unwrap_or("") {
                    "" | "py" => "python".to_string(),
                    other => other.to_ascii_lowercase(),
                };
                ExtractedCode {
                    code: c[2].to_string(),
                    language,
                }
            })
            .collect()
    });

    snippets
        .into_iter()
        .filter(|s| !s.code.trim().is_empty())
        .collect()
}
