//! Stateless client for the Google generative-language API.
//!
//! One call, one POST: a system/user prompt pair goes out as a
//! `generateContent` request, the reply text and token usage come back as a
//! [`GenerateReply`]. Response parsing is strict: a reply that does not
//! carry the expected shape fails with a typed error instead of panicking
//! on a missing index.

use crate::config::{GEMINI_API_KEY_ENV, GeminiConfig};
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::env;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl GenerateRequest {
    /// Request carrying the config's model and generation limits.
    pub fn from_config(config: &GeminiConfig, system_prompt: String, user_prompt: String) -> Self {
        Self {
            model: config.model.clone(),
            system_prompt,
            user_prompt,
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateReply {
    pub text: String,
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
}

pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    /// Builds a client, resolving the API key from config or environment.
    pub fn from_config(config: &GeminiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| env::var(GEMINI_API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                AppError::Config(format!(
                    "No Gemini API key available. Set [gemini].api_key in the config file or the {} environment variable.",
                    GEMINI_API_KEY_ENV
                ))
            })?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub async fn generate(&self, request: &GenerateRequest) -> Result<GenerateReply> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, request.model
        );
        let body = build_request_body(request);
        log::debug!(
            "Sending generateContent request to model '{}' ({} system / {} user chars)",
            request.model,
            request.system_prompt.chars().count(),
            request.user_prompt.chars().count()
        );

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = response.status().as_u16();
        let payload = response.text().await?;
        log::debug!("generateContent responded with HTTP {}", status);
        parse_reply(status, &payload)
    }
}

// --- Wire types (camelCase per the API) ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestBody<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseBody {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Debug, Deserialize)]
struct ReplyPart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

fn build_request_body(request: &GenerateRequest) -> RequestBody<'_> {
    RequestBody {
        system_instruction: Content {
            role: None,
            parts: vec![TextPart {
                text: &request.system_prompt,
            }],
        },
        contents: vec![Content {
            role: Some("user"),
            parts: vec![TextPart {
                text: &request.user_prompt,
            }],
        }],
        generation_config: GenerationConfig {
            temperature: request.temperature,
            max_output_tokens: request.max_output_tokens,
        },
    }
}

fn parse_reply(status: u16, payload: &str) -> Result<GenerateReply> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<ErrorEnvelope>(payload)
            .map(|envelope| envelope.error.message)
            .unwrap_or_else(|_| payload.trim().to_string());
        return Err(AppError::GeminiApi { status, message });
    }

    let parsed: ResponseBody = serde_json::from_str(payload).map_err(|e| {
        AppError::GeminiResponse(format!("Malformed generateContent response: {}", e))
    })?;

    let candidate = parsed.candidates.into_iter().next().ok_or_else(|| {
        AppError::GeminiResponse("Response contained no candidates".to_string())
    })?;
    let parts = candidate.content.map(|c| c.parts).unwrap_or_default();
    let text: String = parts.into_iter().filter_map(|part| part.text).collect();
    if text.is_empty() {
        return Err(AppError::GeminiResponse(
            "Candidate contained no text parts".to_string(),
        ));
    }

    let (prompt_tokens, completion_tokens) = match parsed.usage_metadata {
        Some(usage) => (usage.prompt_token_count, usage.candidates_token_count),
        None => (None, None),
    };
    Ok(GenerateReply {
        text,
        prompt_tokens,
        completion_tokens,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn request_body_serializes_with_camel_case_wire_names() {
        let request = GenerateRequest {
            model: "gemini-2.5-flash".to_string(),
            system_prompt: "be brief".to_string(),
            user_prompt: "hello".to_string(),
            temperature: 0.2,
            max_output_tokens: 64,
        };
        let body = serde_json::to_value(build_request_body(&request)).unwrap();
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be brief");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 64);
        // the system instruction carries no role field
        assert!(body["systemInstruction"].get("role").is_none());
    }

    #[test]
    fn successful_reply_extracts_text_and_usage() {
        let payload = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "Hello "}, {"text": "world"}]}}
            ],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 3}
        }"#;
        let reply = parse_reply(200, payload).unwrap();
        assert_eq!(reply.text, "Hello world");
        assert_eq!(reply.prompt_tokens, Some(12));
        assert_eq!(reply.completion_tokens, Some(3));
    }

    #[test]
    fn missing_usage_metadata_is_tolerated() {
        let payload = r#"{"candidates": [{"content": {"parts": [{"text": "ok"}]}}]}"#;
        let reply = parse_reply(200, payload).unwrap();
        assert_eq!(reply.text, "ok");
        assert_eq!(reply.prompt_tokens, None);
    }

    #[test]
    fn empty_candidates_fail_with_typed_error() {
        let result = parse_reply(200, r#"{"candidates": []}"#);
        assert!(matches!(result, Err(AppError::GeminiResponse(_))));
    }

    #[test]
    fn candidate_without_text_parts_fails_with_typed_error() {
        let payload = r#"{"candidates": [{"content": {"parts": []}}]}"#;
        assert!(matches!(
            parse_reply(200, payload),
            Err(AppError::GeminiResponse(_))
        ));
        let payload = r#"{"candidates": [{}]}"#;
        assert!(matches!(
            parse_reply(200, payload),
            Err(AppError::GeminiResponse(_))
        ));
    }

    #[test]
    fn malformed_json_fails_with_typed_error_not_panic() {
        assert!(matches!(
            parse_reply(200, "not json"),
            Err(AppError::GeminiResponse(_))
        ));
    }

    #[test]
    fn api_error_envelope_surfaces_status_and_message() {
        let payload = r#"{"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#;
        match parse_reply(400, payload) {
            Err(AppError::GeminiApi { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("expected GeminiApi error, got {:?}", other),
        }
    }

    #[test]
    fn non_json_error_body_falls_back_to_raw_text() {
        match parse_reply(503, "Service Unavailable\n") {
            Err(AppError::GeminiApi { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "Service Unavailable");
            }
            other => panic!("expected GeminiApi error, got {:?}", other),
        }
    }

    #[test]
    fn client_requires_an_api_key() {
        let mut config = GeminiConfig::default();
        config.api_key = Some("  ".to_string());
        // a blank configured key does not count; the env fallback is not
        // exercised here to keep the test hermetic
        if env::var(GEMINI_API_KEY_ENV).is_err() {
            assert!(matches!(
                GeminiClient::from_config(&config),
                Err(AppError::Config(_))
            ));
        }
        config.api_key = Some("test-key".to_string());
        assert!(GeminiClient::from_config(&config).is_ok());
    }
}
