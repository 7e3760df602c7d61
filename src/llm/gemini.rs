//! Gemini backend implementation.
//!
//! Calls the `generateContent` method of the Generative Language REST API.

use crate::error::AiqError;
use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Environment variables checked for the API key, in order.
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// Gemini backend for the Generative Language API.
pub struct GeminiBackend {
    pub model: String,
    base_url: String,
    api_key: String,
    client: Client,
}

impl GeminiBackend {
    /// Create a new Gemini backend.
    pub fn new(model: String, base_url: String, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("failed to create client")?;

        Ok(Self {
            model,
            base_url,
            api_key,
            client,
        })
    }

    /// URL of the `generateContent` method for this backend's model.
    ///
    /// Bare names get the `models/` prefix; full resource names such as
    /// `models/...` or `tunedModels/...` are used as given.
    pub fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if self.model.contains('/') {
            format!("{}/{}:generateContent", base, self.model)
        } else {
            format!("{}/models/{}:generateContent", base, self.model)
        }
    }

    /// Send one generation request and return the text fragments in order.
    pub async fn generate(
        &self,
        system_instruction: Option<&str>,
        prompt: &str,
    ) -> Result<Vec<String>> {
        let request = GenerateRequest::new(system_instruction, prompt);
        let url = self.endpoint();
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .context("failed to connect to Gemini API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiqError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            }
            .into());
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .context("failed to parse Gemini response")?;

        let fragments = generated.into_fragments();
        debug!("Received {} text fragment(s)", fragments.len());
        Ok(fragments)
    }
}

/// Resolve the API key from the process environment.
pub fn api_key() -> Result<String, AiqError> {
    api_key_from(|name| std::env::var(name).ok())
}

/// First non-empty value among [`API_KEY_VARS`].
pub fn api_key_from(lookup: impl Fn(&str) -> Option<String>) -> Result<String, AiqError> {
    API_KEY_VARS
        .iter()
        .filter_map(|&name| lookup(name))
        .find(|value| !value.is_empty())
        .ok_or(AiqError::MissingCredential)
}

/// Pull `error.message` out of an API error body, falling back to the raw body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<GeminiError>(body) {
        Ok(e) => e.error.message,
        Err(_) if body.trim().is_empty() => "Unknown error".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
}

impl GenerateRequest {
    fn new(system_instruction: Option<&str>, prompt: &str) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part::text(prompt)],
            }],
            system_instruction: system_instruction.map(|text| Content {
                role: None,
                parts: vec![Part::text(text)],
            }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

/// One content part. Only text parts are printed; others deserialize with `text: None`.
#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

impl Part {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateResponse {
    fn into_fragments(self) -> Vec<String> {
        self.candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|content| content.parts)
            .filter_map(|part| part.text)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_gemini_key_wins() {
        let vars = env(&[("GEMINI_API_KEY", "gem"), ("GOOGLE_API_KEY", "goog")]);
        let key = api_key_from(|name| vars.get(name).cloned()).unwrap();
        assert_eq!(key, "gem");
    }

    #[test]
    fn test_google_key_fallback() {
        let vars = env(&[("GEMINI_API_KEY", ""), ("GOOGLE_API_KEY", "goog")]);
        let key = api_key_from(|name| vars.get(name).cloned()).unwrap();
        assert_eq!(key, "goog");
    }

    #[test]
    fn test_missing_key() {
        let vars = env(&[]);
        let err = api_key_from(|name| vars.get(name).cloned()).unwrap_err();
        assert!(matches!(err, AiqError::MissingCredential));
    }

    #[test]
    fn test_endpoint() {
        let backend = GeminiBackend::new(
            "gemini-2.5-flash".to_string(),
            "http://localhost:8080/v1beta/".to_string(),
            "key".to_string(),
        )
        .unwrap();
        assert_eq!(
            backend.endpoint(),
            "http://localhost:8080/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_endpoint_with_resource_name() {
        let backend = |model: &str| {
            GeminiBackend::new(
                model.to_string(),
                "http://localhost:8080/v1beta".to_string(),
                "key".to_string(),
            )
            .unwrap()
        };
        assert_eq!(
            backend("models/gemini-2.5-flash").endpoint(),
            "http://localhost:8080/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(
            backend("tunedModels/my-model-42").endpoint(),
            "http://localhost:8080/v1beta/tunedModels/my-model-42:generateContent"
        );
    }

    #[test]
    fn test_request_without_system_instruction() {
        let json = serde_json::to_value(GenerateRequest::new(None, "hi")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "contents": [{ "role": "user", "parts": [{ "text": "hi" }] }]
            })
        );
    }

    #[test]
    fn test_request_with_system_instruction() {
        let json = serde_json::to_value(GenerateRequest::new(Some("Be terse."), "hi")).unwrap();
        assert_eq!(
            json["systemInstruction"],
            serde_json::json!({ "parts": [{ "text": "Be terse." }] })
        );
    }

    #[test]
    fn test_fragments_in_order() {
        let body = r#"{
            "candidates": [
                { "content": { "role": "model", "parts": [{ "text": "ls " }, { "text": "-la" }] } },
                { "finishReason": "SAFETY" },
                { "content": { "parts": [{ "functionCall": { "name": "f" } }, { "text": "!" }] } }
            ]
        }"#;
        let response: GenerateResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.into_fragments(), vec!["ls ", "-la", "!"]);
    }

    #[test]
    fn test_empty_response() {
        let response: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(response.into_fragments().is_empty());
    }

    #[test]
    fn test_error_message_from_api_body() {
        let body = r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(error_message(body), "API key not valid.");
    }

    #[test]
    fn test_error_message_raw_body() {
        assert_eq!(error_message("bad gateway\n"), "bad gateway");
        assert_eq!(error_message(""), "Unknown error");
    }
}
