//! Google Gemini API Client Implementation
//!
//! Binds both collaborators to the `generateContent` endpoint: grounded news
//! search with a JSON array schema, and image-based ID verification with a
//! verdict schema.

use super::news::{NewsBatch, NewsQuery, RawNewsRecord};
use super::utils::extract_json_payload;
use super::verification::{EncodedDocument, Verdict};
use super::{AiConfig, AiError, AiResult, DocumentVerifier, NewsQueryService};
use crate::domain::GroundingSource;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, info, warn};

const API_KEY_HEADER: &str = "x-goog-api-key";

const VERIFICATION_PROMPT: &str = r#"Act as an identity verification assistant.

Task: Check the provided image to see if it is a valid government identity document from India (like an Aadhaar Card, PAN Card, Voter ID, Passport, or Driving Licence).

Rules:
- It must be a real Indian ID.
- Reject blurry or unrelated images.
- Reject images that are clearly not government documents.

Return results in JSON:
- isValid: boolean
- reason: A short explanation (e.g., "Valid Aadhaar Card found", "Image is too blurry to read")."#;

/// Gemini API client
#[derive(Debug, Clone)]
pub struct GeminiClient {
    config: AiConfig,
    client: Client,
}

/// Gemini API request format
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

/// Gemini content structure
#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

/// Gemini content part, either text or inline binary data
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<GeminiBlob>,
}

impl GeminiPart {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    fn inline(document: &EncodedDocument) -> Self {
        Self {
            text: None,
            inline_data: Some(GeminiBlob {
                mime_type: document.media_type.clone(),
                data: document.data.clone(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiBlob {
    mime_type: String,
    data: String,
}

/// Gemini generation configuration
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    response_mime_type: &'static str,
    response_schema: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<GeminiThinkingConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiThinkingConfig {
    thinking_budget: u32,
}

/// Gemini API response format
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsageMetadata>,
}

/// Gemini candidate response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiResponseContent>,
    #[serde(default)]
    finish_reason: Option<String>,
    #[serde(default)]
    grounding_metadata: Option<GeminiGroundingMetadata>,
}

/// Gemini response content
#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

/// Gemini response part
#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GeminiGroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GeminiGroundingChunk {
    #[serde(default)]
    web: Option<GeminiWebChunk>,
}

#[derive(Debug, Deserialize)]
struct GeminiWebChunk {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    uri: Option<String>,
}

/// Gemini usage metadata
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    #[serde(default)]
    prompt_token_count: Option<u32>,
    #[serde(default)]
    candidates_token_count: Option<u32>,
    #[serde(default)]
    total_token_count: Option<u32>,
}

impl GeminiResponse {
    /// Concatenated answer text of the first candidate, skipping thought parts.
    fn text(&self) -> AiResult<String> {
        let candidate = self
            .candidates
            .first()
            .ok_or_else(|| AiError::InvalidResponse("No candidates in response".to_string()))?;

        let text: String = candidate
            .content
            .iter()
            .flat_map(|c| c.parts.iter())
            .filter(|p| !p.thought.unwrap_or(false))
            .filter_map(|p| p.text.as_deref())
            .collect();

        if text.trim().is_empty() {
            return Err(AiError::InvalidResponse(format!(
                "Empty candidate (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }
        Ok(text)
    }

    /// Web citations of the first candidate. Entries without a parseable URL
    /// are dropped.
    fn grounding_sources(&self) -> Vec<GroundingSource> {
        self.candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
            .map(|meta| {
                meta.grounding_chunks
                    .iter()
                    .filter_map(|chunk| chunk.web.as_ref())
                    .filter_map(|web| {
                        let uri = web.uri.as_deref()?;
                        url::Url::parse(uri).ok()?;
                        Some(GroundingSource {
                            title: web.title.clone().unwrap_or_else(|| uri.to_string()),
                            uri: uri.to_string(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(config: AiConfig) -> AiResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(AiError::AuthenticationError);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(AiError::HttpError)?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    /// Build the news research prompt
    fn build_news_prompt(&self, query: &NewsQuery) -> String {
        format!(
            r#"Act as a professional news researcher.

Objective: Find the 10 most important and recent news stories from the last 24 hours.

Context:
- Topic: {}
- Location: {}

Required JSON Structure:
- title: A clear and engaging headline.
- description: 2-3 sentences explaining the news story clearly.
- imageUrl: A link to a high-quality relevant image.
- tag: Choose one [CRITICAL | LATEST | GROWTH | POLICY | TREND].

Return only a JSON array of objects."#,
            query.field.label(),
            query.target_context()
        )
    }

    fn news_schema() -> Value {
        json!({
            "type": "ARRAY",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "title": { "type": "STRING" },
                    "description": { "type": "STRING" },
                    "imageUrl": { "type": "STRING" },
                    "tag": { "type": "STRING" }
                },
                "required": ["title", "description", "imageUrl", "tag"]
            }
        })
    }

    fn verdict_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "isValid": { "type": "BOOLEAN" },
                "reason": { "type": "STRING" }
            },
            "required": ["isValid", "reason"]
        })
    }

    fn news_request(&self, query: &NewsQuery) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart::text(self.build_news_prompt(query))],
            }],
            tools: vec![json!({ "googleSearch": {} })],
            generation_config: Some(GeminiGenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_tokens,
                response_mime_type: "application/json",
                response_schema: Self::news_schema(),
                thinking_config: self
                    .config
                    .thinking_budget
                    .map(|thinking_budget| GeminiThinkingConfig { thinking_budget }),
            }),
        }
    }

    fn verification_request(&self, document: &EncodedDocument) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![
                    GeminiPart::inline(document),
                    GeminiPart::text(VERIFICATION_PROMPT),
                ],
            }],
            tools: Vec::new(),
            generation_config: Some(GeminiGenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_tokens,
                response_mime_type: "application/json",
                response_schema: Self::verdict_schema(),
                thinking_config: None,
            }),
        }
    }

    /// Send request to Gemini API
    async fn send_request(&self, request_body: &GeminiRequest) -> AiResult<GeminiResponse> {
        let url = format!(
            "{}/{}:generateContent",
            self.config.base_url, self.config.model
        );

        debug!("Sending request to Gemini API: {}", url);

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(request_body)
            .send()
            .await
            .map_err(|e| AiError::HttpError(e.without_url()))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| AiError::HttpError(e.without_url()))?;

        debug!("Gemini API response status: {}", status);

        if !status.is_success() {
            error!("Gemini API error: {} - {}", status, response_text);
            return Err(AiError::ApiError(format!(
                "HTTP {}: {}",
                status, response_text
            )));
        }

        let gemini_response: GeminiResponse =
            serde_json::from_str(&response_text).map_err(|e| {
                error!("Failed to parse Gemini response: {}", e);
                AiError::JsonError(e)
            })?;

        if let Some(usage) = &gemini_response.usage_metadata {
            info!(
                "Gemini API usage - Prompt: {:?} tokens, Response: {:?} tokens, Total: {:?} tokens",
                usage.prompt_token_count, usage.candidates_token_count, usage.total_token_count
            );
        }

        Ok(gemini_response)
    }

    fn parse_news_response(response: &GeminiResponse) -> AiResult<NewsBatch> {
        let text = response.text()?;
        let records: Vec<RawNewsRecord> = serde_json::from_str(extract_json_payload(&text)?)?;
        Ok(NewsBatch {
            records,
            sources: response.grounding_sources(),
        })
    }

    fn parse_verdict(response: &GeminiResponse) -> AiResult<Verdict> {
        let text = response.text()?;
        Ok(serde_json::from_str(extract_json_payload(&text)?)?)
    }
}

#[async_trait]
impl NewsQueryService for GeminiClient {
    async fn query_news(&self, query: &NewsQuery) -> AiResult<NewsBatch> {
        info!(
            "Querying news: topic={} location={}",
            query.field,
            query.target_context()
        );

        let response = self.send_request(&self.news_request(query)).await?;
        let batch = Self::parse_news_response(&response)?;

        if batch.sources.is_empty() {
            warn!("Gemini returned no grounding sources for news query");
        }
        Ok(batch)
    }

    fn provider_name(&self) -> &str {
        "Gemini"
    }
}

#[async_trait]
impl DocumentVerifier for GeminiClient {
    async fn verify_document(&self, document: &EncodedDocument) -> AiResult<Verdict> {
        info!(
            "Verifying identity document {} ({})",
            document.file_name, document.media_type
        );

        let response = self
            .send_request(&self.verification_request(document))
            .await?;
        let verdict = Self::parse_verdict(&response)?;

        info!("Verification verdict: valid={}", verdict.is_valid);
        Ok(verdict)
    }

    fn provider_name(&self) -> &str {
        "Gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewsField, NewsRegion, NewsTag};

    fn create_test_config() -> AiConfig {
        AiConfig {
            api_key: "test-key".to_string(),
            ..AiConfig::default()
        }
    }

    fn client() -> GeminiClient {
        GeminiClient::new(create_test_config()).unwrap()
    }

    #[test]
    fn test_gemini_client_creation() {
        let client = GeminiClient::new(create_test_config());
        assert!(client.is_ok());
        assert_eq!(client.unwrap().config().model, super::super::DEFAULT_MODEL);
    }

    #[tokio::test]
    async fn test_transport_error_does_not_expose_api_key() {
        let client = GeminiClient::new(AiConfig {
            api_key: "SECRETKEY123".to_string(),
            base_url: "http://127.0.0.1:9/v1beta/models".to_string(),
            timeout_seconds: 5,
            ..AiConfig::default()
        })
        .unwrap();
        let query = NewsQuery::new(NewsField::Jobs, NewsRegion::National, Some("India".into()));

        let err = client.query_news(&query).await.unwrap_err();

        assert!(matches!(err, AiError::HttpError(_)));
        assert!(!err.to_string().contains("SECRETKEY123"));
        assert!(!format!("{:?}", err).contains("SECRETKEY123"));
    }

    #[test]
    fn test_gemini_client_empty_api_key() {
        let mut config = create_test_config();
        config.api_key = "  ".to_string();
        let client = GeminiClient::new(config);
        assert!(matches!(client.err(), Some(AiError::AuthenticationError)));
    }

    #[test]
    fn test_build_news_prompt() {
        let query = NewsQuery::new(NewsField::TechAi, NewsRegion::State, Some("Kerala".into()));
        let prompt = client().build_news_prompt(&query);
        assert!(prompt.contains("Topic: Technology / AI"));
        assert!(prompt.contains("Location: the state of Kerala, India"));
        assert!(prompt.contains("CRITICAL | LATEST | GROWTH | POLICY | TREND"));
    }

    #[test]
    fn test_news_request_shape() {
        let query = NewsQuery::new(NewsField::Jobs, NewsRegion::International, None);
        let body = serde_json::to_value(client().news_request(&query)).unwrap();

        assert_eq!(body["tools"][0], json!({ "googleSearch": {} }));
        let config = &body["generationConfig"];
        assert_eq!(config["responseMimeType"], "application/json");
        assert_eq!(config["responseSchema"]["type"], "ARRAY");
        assert_eq!(config["thinkingConfig"]["thinkingBudget"], 1024);
        assert!(body["contents"][0]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("International-wise"));
    }

    #[test]
    fn test_verification_request_shape() {
        let doc = EncodedDocument::from_bytes("id.png", "image/png", b"img");
        let body = serde_json::to_value(client().verification_request(&doc)).unwrap();

        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[0]["inlineData"]["data"], "aW1n");
        assert!(parts[0].get("text").is_none());
        assert!(parts[1]["text"].as_str().unwrap().contains("Indian ID"));
        assert!(body.get("tools").is_none());
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn test_parse_news_response_with_grounding() {
        let raw = json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "planning the search", "thought": true },
                    { "text": "```json\n[{\"title\":\"Chip fab opens\",\"description\":\"A new fab.\",\"imageUrl\":\"https://img.test/1.jpg\",\"tag\":\"GROWTH\"}]\n```" }
                ]},
                "finishReason": "STOP",
                "groundingMetadata": { "groundingChunks": [
                    { "web": { "title": "example.com", "uri": "https://example.com/story" } },
                    { "web": { "title": "broken", "uri": "not a url" } },
                    { "retrievedContext": {} }
                ]}
            }],
            "usageMetadata": { "promptTokenCount": 10, "totalTokenCount": 20 }
        });
        let response: GeminiResponse = serde_json::from_value(raw).unwrap();

        let batch = GeminiClient::parse_news_response(&response).unwrap();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].title, "Chip fab opens");
        assert_eq!(batch.records[0].tag, NewsTag::Growth);
        assert_eq!(
            batch.sources,
            vec![GroundingSource {
                title: "example.com".into(),
                uri: "https://example.com/story".into()
            }]
        );
    }

    #[test]
    fn test_parse_verdict() {
        let raw = json!({
            "candidates": [{ "content": { "parts": [
                { "text": "{\"isValid\": true, \"reason\": \"Valid PAN Card found\"}" }
            ]}}]
        });
        let response: GeminiResponse = serde_json::from_value(raw).unwrap();
        let verdict = GeminiClient::parse_verdict(&response).unwrap();
        assert!(verdict.is_valid);
        assert_eq!(verdict.reason, "Valid PAN Card found");
    }

    #[test]
    fn test_empty_candidates_is_invalid_response() {
        let response: GeminiResponse = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(
            GeminiClient::parse_verdict(&response),
            Err(AiError::InvalidResponse(_))
        ));

        let blocked: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{ "finishReason": "SAFETY" }]
        }))
        .unwrap();
        let err = GeminiClient::parse_news_response(&blocked).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    // Integration test - requires API key
    #[tokio::test]
    #[ignore = "Requires GEMINI_API_KEY environment variable"]
    async fn test_gemini_news_integration() {
        let config = AiConfig::from_env();
        if config.api_key.is_empty() {
            panic!("GEMINI_API_KEY environment variable required for integration test");
        }

        let client = GeminiClient::new(config).unwrap();
        let query = NewsQuery::new(NewsField::TechAi, NewsRegion::National, Some("India".into()));

        let batch = client.query_news(&query).await.unwrap();
        assert!(!batch.records.is_empty());
        println!("Fetched {} stories", batch.records.len());
    }
}
