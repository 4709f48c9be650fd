use crate::config::Config;
use crate::http_client::{HttpClient, ReqwestHttpClient};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// The model's reserved answer for "no equivalent command exists".
const NO_EQUIVALENT_SENTINEL: &str = "0";

const FENCE: &str = "```";

/// Language tags a model may put on the opening fence. A tag only counts
/// when the line ends right after it.
const FENCE_TAGS: [&str; 3] = ["batch", "bat", "cmd"];

/// Outcome of a successful translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    /// A single-line command ready for the interpreter.
    Command(String),
    /// The model reported that no equivalent command exists.
    NoEquivalent,
}

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("AI translation is not configured: set API_KEY in .env or run `shellhit --set-api-key <key>`")]
    NotConfigured,

    #[error("failed to create AI client: {0}")]
    Client(String),

    #[error("API request failed: {0}")]
    Request(String),

    #[error("AI request timed out after {}s", .0.as_secs_f32())]
    Timeout(Duration),

    #[error("unexpected response format from AI: {0}")]
    MalformedResponse(String),
}

/// Converts a natural-language request into a shell command.
#[async_trait]
pub trait CommandTranslator: Send + Sync {
    async fn translate(&self, request: &str) -> Result<Translation, TranslateError>;
}

/// Builds the translator the configuration asks for.
///
/// Without an API key (and outside mock mode) the shell still starts; every
/// AI request then reports [`TranslateError::NotConfigured`].
pub fn from_config(config: &Config) -> Box<dyn CommandTranslator> {
    if config.is_mock_mode() {
        info!("Using mock translator ({} set)", crate::config::MOCK_VAR);
        return Box::new(MockTranslator::new());
    }

    match config.get_api_key() {
        Some(api_key) => Box::new(GeminiTranslator::new(
            api_key,
            &config.model,
            config.request_timeout(),
        )),
        None => {
            warn!("No API key configured, AI translation disabled");
            Box::new(DisabledTranslator)
        }
    }
}

pub fn build_prompt(request: &str) -> String {
    format!(
        "Convert this user request into a Windows command. Give only the command and no other text. If such a Windows command doesn't exist just give 0: {}",
        request
    )
}

/// Strips markdown formatting from a model answer.
///
/// Trims, removes one leading code fence (optionally tagged) and a trailing
/// fence, drops any remaining backticks, and trims again.
pub fn clean_command(raw: &str) -> String {
    let mut command = strip_fence_opener(raw.trim());
    if let Some(rest) = command.strip_suffix(FENCE) {
        command = rest;
    }

    command.replace('`', "").trim().to_string()
}

fn strip_fence_opener(command: &str) -> &str {
    let Some(rest) = command.strip_prefix(FENCE) else {
        return command;
    };

    FENCE_TAGS
        .iter()
        .filter_map(|tag| rest.strip_prefix(*tag))
        .find(|after| {
            let after = after.trim_start_matches([' ', '\t']);
            after.is_empty() || after.starts_with(['\n', '\r'])
        })
        .unwrap_or(rest)
}

/// Cleans a raw answer and maps it onto a [`Translation`].
pub fn interpret_response(raw: &str) -> Result<Translation, TranslateError> {
    let cleaned = clean_command(raw);
    let mut lines = cleaned.lines().map(str::trim).filter(|l| !l.is_empty());

    let Some(first) = lines.next() else {
        return Err(TranslateError::MalformedResponse("empty command".to_string()));
    };

    let dropped = lines.count();
    if dropped > 0 {
        warn!("AI returned {} extra line(s); keeping only the first", dropped);
    }

    if first == NO_EQUIVALENT_SENTINEL {
        Ok(Translation::NoEquivalent)
    } else {
        Ok(Translation::Command(first.to_string()))
    }
}

// =============================================================================
// Gemini
// =============================================================================

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Translator backed by the Gemini `generateContent` API.
pub struct GeminiTranslator {
    api_key: String,
    model: String,
    timeout: Duration,
    base_url: String,
}

impl GeminiTranslator {
    pub fn new(api_key: &str, model: &str, timeout: Duration) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            timeout,
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    /// Points the translator at a different API root (proxies, tests).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.base_url, self.model)
    }

    /// Translates using an injected HTTP client, bounded by the configured deadline.
    pub async fn translate_with_client(
        &self,
        client: &dyn HttpClient,
        request: &str,
    ) -> Result<Translation, TranslateError> {
        match tokio::time::timeout(self.timeout, self.request_command(client, request)).await {
            Ok(result) => result,
            Err(_) => Err(TranslateError::Timeout(self.timeout)),
        }
    }

    async fn request_command(
        &self,
        client: &dyn HttpClient,
        request: &str,
    ) -> Result<Translation, TranslateError> {
        let body = json!({
            "contents": [
                {
                    "parts": [
                        { "text": build_prompt(request) }
                    ]
                }
            ]
        });

        info!("Requesting command translation from {}", self.model);
        let response = client
            .post_json(
                &self.endpoint(),
                &[
                    ("x-goog-api-key", self.api_key.as_str()),
                    ("content-type", "application/json"),
                ],
                &body,
            )
            .await
            .map_err(|e| TranslateError::Request(format!("{:#}", e)))?;

        if !response.is_success() {
            let message = serde_json::from_str::<ApiErrorResponse>(&response.body)
                .map(|r| r.error.message)
                .unwrap_or_else(|_| response.body.clone());
            return Err(TranslateError::Request(format!(
                "status {}: {}",
                response.status, message
            )));
        }

        let text = extract_text(&response.body)?;
        info!("AI response: {:?}", text);
        interpret_response(&text)
    }
}

/// Pulls the first text part of the first candidate out of a response body.
fn extract_text(body: &str) -> Result<String, TranslateError> {
    let parsed: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| TranslateError::MalformedResponse(format!("invalid JSON: {}", e)))?;

    let part = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .ok_or_else(|| {
            TranslateError::MalformedResponse("no valid command found in AI response".to_string())
        })?;

    part.text
        .ok_or_else(|| TranslateError::MalformedResponse("first part is not text".to_string()))
}

#[async_trait]
impl CommandTranslator for GeminiTranslator {
    async fn translate(&self, request: &str) -> Result<Translation, TranslateError> {
        // One client per request; it is dropped when this call returns.
        let client = ReqwestHttpClient::new(self.timeout)
            .map_err(|e| TranslateError::Client(e.to_string()))?;
        self.translate_with_client(&client, request).await
    }
}

// =============================================================================
// Offline translators
// =============================================================================

/// Stand-in used when no API key is available.
pub struct DisabledTranslator;

#[async_trait]
impl CommandTranslator for DisabledTranslator {
    async fn translate(&self, _request: &str) -> Result<Translation, TranslateError> {
        Err(TranslateError::NotConfigured)
    }
}

/// Keyword-driven translator for offline use and tests.
///
/// Produces raw, markdown-formatted answers the way a model would and runs
/// them through the same cleanup as real responses.
pub struct MockTranslator;

impl MockTranslator {
    pub fn new() -> Self {
        Self
    }

    pub fn mock_response(&self, request: &str) -> String {
        let lowered = request.to_lowercase();

        if let Some(text) = request.strip_prefix("say ") {
            format!("```batch\necho {}\n```", text.trim())
        } else if lowered.contains("parent") {
            "`cd ..`".to_string()
        } else if let Some(dir) = request.strip_prefix("go to ") {
            format!("cd {}", dir.trim())
        } else if lowered.contains("list") && lowered.contains("file") {
            let listing = if cfg!(windows) { "```cmd\ndir /b\n```" } else { "```\nls\n```" };
            listing.to_string()
        } else if lowered.contains("fail") {
            "exit 3".to_string()
        } else {
            NO_EQUIVALENT_SENTINEL.to_string()
        }
    }
}

impl Default for MockTranslator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandTranslator for MockTranslator {
    async fn translate(&self, request: &str) -> Result<Translation, TranslateError> {
        interpret_response(&self.mock_response(request))
    }
}
