//! The external-model accessor: turns a grounding prompt into a candidate
//! [`RawIntent`] by calling a language model with an enforced JSON response
//! schema.
//!
//! Transport failures (network, non-success status) and response failures
//! (unparseable or schema-violating output) are distinguished error
//! variants; neither is recovered here.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::error::{BibliographError, Result};
use crate::intent::RawIntent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

/// Everything a provider needs for one structured-output call.
#[derive(Debug, Clone)]
pub struct IntentRequest {
    pub model: String,
    pub messages: Vec<PromptMessage>,
    pub response_schema: Value,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

#[derive(Debug)]
pub struct IntentResponse {
    pub intent: RawIntent,
    pub usage: Option<Usage>,
}

/// A model that can produce candidate intents. The orchestrator is generic
/// over this, so tests substitute a scripted source.
#[async_trait]
pub trait IntentSource: Send + Sync {
    async fn generate_intent(&self, request: IntentRequest) -> Result<IntentResponse>;
}

/// The response schema the model is constrained to. Filter values are
/// declared as strings; the validator coerces numeric filter types.
pub fn intent_response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "query_type": {
                "type": "string",
                "enum": ["search_books", "find_authors", "get_reviews",
                         "search_publishers", "find_genres"]
            },
            "filters": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "type": {
                            "type": "string",
                            "enum": ["theme", "author", "genre", "publisher",
                                     "publication_year", "page_count", "rating",
                                     "setting", "language", "isbn"]
                        },
                        "value": {"type": "string"},
                        "operator": {
                            "type": "string",
                            "enum": ["=", "contains", ">", "<", ">=", "<=", "!="]
                        }
                    },
                    "required": ["type", "value"]
                }
            },
            "sort_by": {
                "type": "string",
                "enum": ["title", "publication_year", "page_count", "rating",
                         "author_name", "none"]
            },
            "sort_order": {"type": "string", "enum": ["asc", "desc"]},
            "limit": {"type": "integer"}
        },
        "required": ["query_type", "filters"]
    })
}

// ------------- Gemini -------------
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
}
#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}
#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}
#[derive(Debug, Deserialize)]
struct Part {
    text: String,
}
#[derive(Debug, Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: u64,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: u64,
}

/// Client for the Google generative-language REST API.
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    client: Client,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_owned(),
            client: Client::new(),
        }
    }

    /// Point the client somewhere else, e.g. a local stub in tests.
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Strip markdown code fences some models wrap JSON output in.
    fn strip_markdown(text: &str) -> &str {
        let text = text.trim();
        if let Some(stripped) = text.strip_prefix("```") {
            let start = stripped.find('\n').map(|i| i + 1).unwrap_or(0);
            let end = stripped.rfind("```").unwrap_or(stripped.len());
            return stripped[start..end].trim();
        }
        text
    }
}

#[async_trait]
impl IntentSource for GeminiClient {
    async fn generate_intent(&self, request: IntentRequest) -> Result<IntentResponse> {
        let system: Vec<&str> = request
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();
        let contents: Vec<Value> = request
            .messages
            .iter()
            .filter(|m| m.role == Role::User)
            .map(|m| json!({"role": "user", "parts": [{"text": m.content}]}))
            .collect();

        let mut body = json!({
            "contents": contents,
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": request.response_schema,
                "temperature": request.temperature,
                "maxOutputTokens": request.max_output_tokens
            }
        });
        if !system.is_empty() {
            body["systemInstruction"] = json!({"parts": [{"text": system.join("\n\n")}]});
        }

        let url = format!("{}/models/{}:generateContent", self.base_url, request.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| BibliographError::ModelTransport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| BibliographError::ModelTransport(e.to_string()))?;
        if !status.is_success() {
            return Err(BibliographError::ModelTransport(format!(
                "model API returned {}: {}",
                status, text
            )));
        }

        let parsed: GenerateResponse = serde_json::from_str(&text)
            .map_err(|e| BibliographError::ModelResponse(format!("unreadable response: {}", e)))?;
        let usage = parsed.usage_metadata.map(|u| Usage {
            input_tokens: u.prompt_token_count,
            output_tokens: u.candidates_token_count,
            total_tokens: u.prompt_token_count + u.candidates_token_count,
        });
        let candidate = parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .ok_or_else(|| BibliographError::ModelResponse("response held no candidates".into()))?;

        let payload = Self::strip_markdown(&candidate.text);
        let intent: RawIntent = serde_json::from_str(payload).map_err(|e| {
            BibliographError::ModelResponse(format!("output does not match intent schema: {}", e))
        })?;
        if let Some(u) = usage {
            info!(input = u.input_tokens, output = u.output_tokens, "model call complete");
        }
        Ok(IntentResponse { intent, usage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_fences_are_stripped() {
        let fenced = "```json\n{\"a\": 1}\n```";
        assert_eq!(GeminiClient::strip_markdown(fenced), "{\"a\": 1}");
        assert_eq!(GeminiClient::strip_markdown(" {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn schema_names_every_query_type() {
        let schema = intent_response_schema();
        let kinds = schema["properties"]["query_type"]["enum"].as_array().unwrap();
        assert_eq!(kinds.len(), 5);
    }
}
