//! Answer Generator - grounded answers from the compressed context
//!
//! Provides:
//! - The `AnswerGenerator` capability consumed by the query pipeline
//! - An HTTP client for Gemini and OpenAI-compatible chat endpoints
//!
//! Failures are surfaced as-is; the core never retries generation.

use crate::config::GenerationConfig;
use crate::errors::{AppError, Result};
use crate::metrics;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Turns context plus question into a free-text answer
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, context: &str, query: &str) -> Result<String>;

    /// Provider label used in logs and metrics
    fn provider(&self) -> &str;
}

/// Supported LLM backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationProvider {
    Gemini,
    OpenAI,
}

impl GenerationProvider {
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAI),
            other => Err(AppError::configuration(format!(
                "Unknown generation provider '{}' (expected 'gemini' or 'openai')",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAI => "openai",
        }
    }

    /// Environment variable consulted when no key is configured
    pub fn key_env_var(&self) -> &'static str {
        match self {
            Self::Gemini => "GOOGLE_API_KEY",
            Self::OpenAI => "OPENAI_API_KEY",
        }
    }

    fn default_base_url(&self) -> &'static str {
        match self {
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            Self::OpenAI => "https://api.openai.com/v1",
        }
    }
}

/// Grounding prompt: answer only from the context, refuse otherwise
pub fn build_prompt(context: &str, query: &str) -> String {
    format!(
        "Answer the question using ONLY the provided context.\n\
         If insufficient information, say you cannot answer.\n\n\
         Context:\n{}\n\nQuestion: {}",
        context, query
    )
}

/// LLM-backed answer generator
pub struct LlmAnswerGenerator {
    provider: GenerationProvider,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

impl LlmAnswerGenerator {
    /// Build from configuration.
    ///
    /// Fails with a configuration error when neither `generation.api_key`
    /// nor the provider's key variable is set.
    pub fn from_config(config: &GenerationConfig) -> Result<Self> {
        let provider = GenerationProvider::parse(&config.provider)?;

        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| {
                std::env::var(provider.key_env_var())
                    .ok()
                    .filter(|k| !k.is_empty())
            })
            .ok_or_else(|| {
                AppError::configuration(format!(
                    "{} environment variable not set",
                    provider.key_env_var()
                ))
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            provider,
            api_key,
            base_url: config
                .api_base
                .clone()
                .unwrap_or_else(|| provider.default_base_url().to_string())
                .trim_end_matches('/')
                .to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn call_gemini(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: self.temperature,
            },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::GenerationError {
                message: format!("Gemini request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::GenerationError {
                message: format!("Gemini API error {}: {}", status, body),
            });
        }

        let body: GeminiResponse = response.json().await.map_err(|e| AppError::GenerationError {
            message: format!("Failed to parse Gemini response: {}", e),
        })?;

        gemini_answer(body)
    }

    async fn call_openai(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::GenerationError {
                message: format!("LLM API request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::GenerationError {
                message: format!("LLM API error {}: {}", status, body),
            });
        }

        let body: ChatResponse = response.json().await.map_err(|e| AppError::GenerationError {
            message: format!("Failed to parse LLM response: {}", e),
        })?;

        chat_answer(body)
    }
}

#[async_trait]
impl AnswerGenerator for LlmAnswerGenerator {
    async fn generate(&self, context: &str, query: &str) -> Result<String> {
        let prompt = build_prompt(context, query);
        let start = Instant::now();

        let result = match self.provider {
            GenerationProvider::Gemini => self.call_gemini(&prompt).await,
            GenerationProvider::OpenAI => self.call_openai(&prompt).await,
        };

        metrics::record_generation(
            start.elapsed().as_secs_f64(),
            self.provider.as_str(),
            result.is_ok(),
        );
        if let Err(e) = &result {
            tracing::warn!(provider = self.provider.as_str(), error = %e, "Answer generation failed");
        }
        result
    }

    fn provider(&self) -> &str {
        self.provider.as_str()
    }
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize, Deserialize, Default)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: GeminiContent,
}

fn gemini_answer(body: GeminiResponse) -> Result<String> {
    let candidate = body
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| AppError::GenerationError {
            message: "Empty response from Gemini".to_string(),
        })?;

    Ok(candidate
        .content
        .parts
        .into_iter()
        .map(|p| p.text)
        .collect::<String>())
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

fn chat_answer(body: ChatResponse) -> Result<String> {
    body.choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| AppError::GenerationError {
            message: "Empty response from LLM".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_layout() {
        let prompt = build_prompt("Accuracy was 91%.", "What accuracy?");
        assert!(prompt.starts_with("Answer the question using ONLY the provided context.\n"));
        assert!(prompt.contains("say you cannot answer.\n\nContext:\nAccuracy was 91%.\n\n"));
        assert!(prompt.ends_with("Question: What accuracy?"));
    }

    #[test]
    fn test_provider_parsing() {
        assert_eq!(GenerationProvider::parse("Gemini").unwrap(), GenerationProvider::Gemini);
        assert_eq!(GenerationProvider::parse("openai").unwrap(), GenerationProvider::OpenAI);
        assert!(matches!(
            GenerationProvider::parse("cohere"),
            Err(AppError::Configuration { .. })
        ));
    }

    #[test]
    fn test_missing_credential_is_configuration_error() {
        if std::env::var("GOOGLE_API_KEY").is_ok() {
            return;
        }
        let config = GenerationConfig::default();
        let err = LlmAnswerGenerator::from_config(&config).err().unwrap();
        assert!(matches!(err, AppError::Configuration { .. }));
        assert!(err.to_string().contains("GOOGLE_API_KEY"));
    }

    #[test]
    fn test_explicit_key_builds_generator() {
        let config = GenerationConfig {
            provider: "openai".into(),
            api_key: Some("sk-test".into()),
            api_base: Some("http://localhost:9999/v1/".into()),
            model: "gpt-4o-mini".into(),
            ..GenerationConfig::default()
        };
        let generator = LlmAnswerGenerator::from_config(&config).unwrap();
        assert_eq!(generator.provider(), "openai");
        assert_eq!(generator.model(), "gpt-4o-mini");
        assert_eq!(generator.base_url, "http://localhost:9999/v1");
    }

    #[test]
    fn test_gemini_answer_concatenates_parts() {
        let body: GeminiResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"91% "},{"text":"on SQuAD."}]}}]}"#,
        )
        .unwrap();
        assert_eq!(gemini_answer(body).unwrap(), "91% on SQuAD.");
    }

    #[test]
    fn test_gemini_without_candidates_is_generation_error() {
        let body: GeminiResponse = serde_json::from_str(r#"{"promptFeedback":{}}"#).unwrap();
        assert!(matches!(gemini_answer(body), Err(AppError::GenerationError { .. })));
    }

    #[test]
    fn test_chat_answer() {
        let body: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"It is 91%."}}]}"#,
        )
        .unwrap();
        assert_eq!(chat_answer(body).unwrap(), "It is 91%.");
    }
}
