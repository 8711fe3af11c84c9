//! Google Gemini `generateContent` adapter.

use std::{fmt, num::FpCategory, sync::Arc, time::Duration};

use bytes::Bytes;
use hyper::body::to_bytes;
use hyper::header::CONTENT_TYPE;
use hyper::{Body, Request, StatusCode, Uri};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tokio::time::timeout;
use tracing::{debug, error, warn};

use crate::http_client::HyperTransport;
use crate::traits::{AdapterError, AdapterMetadata, AdapterResult, HttpTransport};

/// Model used when the configuration does not name one.
pub const DEFAULT_MODEL: &str = "gemini-pro";

/// Public endpoint root of the generative language API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/";

/// API version segment placed in front of `models/`.
pub const DEFAULT_API_VERSION: &str = "v1beta";

/// Configuration for the Gemini adapter.
///
/// Deserialises from JSON with every field optional:
///
/// ```json
/// { "model": "gemini-pro", "baseUrl": "https://generativelanguage.googleapis.com/",
///   "apiVersion": "v1beta", "timeoutMs": 30000 }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeminiConfig {
    model: String,
    base_url: String,
    api_version: String,
    #[serde(rename = "timeoutMs", deserialize_with = "millis")]
    timeout: Option<Duration>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}

impl GeminiConfig {
    /// Creates a configuration using the supplied model identifier.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_version: DEFAULT_API_VERSION.to_owned(),
            timeout: None,
        }
    }

    /// Parses a JSON configuration document, filling in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] if the document is not valid
    /// JSON of the expected shape or names an invalid base URL.
    pub fn from_json(input: &str) -> AdapterResult<Self> {
        let mut cfg: Self = serde_json::from_str(input).map_err(|err| {
            AdapterError::configuration(format!("invalid Gemini configuration: {err}"))
        })?;
        cfg.base_url = sanitize_base_url(&cfg.base_url)?;
        if cfg.model.trim().is_empty() {
            return Err(AdapterError::configuration("Gemini model cannot be empty"));
        }
        Ok(cfg)
    }

    /// Overrides the base URL used for API calls.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] if the supplied URL is invalid.
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> AdapterResult<Self> {
        let sanitized = sanitize_base_url(base_url.as_ref())?;
        self.base_url = sanitized;
        Ok(self)
    }

    /// Overrides the model identifier.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Overrides the API version path segment.
    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Bounds each request (send plus body read) by the given duration.
    ///
    /// Without a timeout the adapter waits as long as the HTTP stack does.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the model identifier.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the normalised base URL (always ends with `/`).
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the configured request timeout, if any.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Returns the `generateContent` endpoint without the key parameter.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!(
            "{}{}/models/{}:generateContent",
            self.base_url, self.api_version, self.model
        )
    }
}

/// Gemini adapter that sends one prompt per call.
pub struct GeminiAdapter {
    transport: Arc<dyn HttpTransport>,
    base_endpoint: String,
    metadata: AdapterMetadata,
    timeout: Option<Duration>,
}

impl fmt::Debug for GeminiAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiAdapter")
            .field("model", &self.metadata.model())
            .field("base_endpoint", &self.base_endpoint)
            .finish_non_exhaustive()
    }
}

impl GeminiAdapter {
    /// Constructs an adapter that talks to the network through [`HyperTransport`].
    #[must_use]
    pub fn new(config: GeminiConfig) -> Self {
        Self::with_transport(config, Arc::new(HyperTransport::new()))
    }

    /// Constructs an adapter over an arbitrary transport.
    #[must_use]
    pub fn with_transport(config: GeminiConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            base_endpoint: config.endpoint(),
            metadata: AdapterMetadata::new("gemini", config.model),
            timeout: config.timeout,
        }
    }

    /// Returns metadata describing this adapter.
    #[must_use]
    pub fn metadata(&self) -> &AdapterMetadata {
        &self.metadata
    }

    /// Returns the endpoint requests are posted to, without the key.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.base_endpoint
    }

    /// Sends `prompt` authenticated with `api_key` and returns the generated text.
    ///
    /// Callers are expected to have rejected empty prompts and unusable keys.
    ///
    /// # Errors
    ///
    /// * [`AdapterError::Request`] for non-success HTTP statuses.
    /// * [`AdapterError::ContentBlocked`] when the prompt was refused.
    /// * [`AdapterError::MalformedResponse`] when no text can be located.
    /// * [`AdapterError::Transport`] for network, timeout, and decoding failures.
    pub async fn generate(&self, api_key: &str, prompt: &str) -> AdapterResult<String> {
        let payload = GenerateContentRequest::from_prompt(prompt);
        let body = serde_json::to_vec(&payload).map_err(|err| {
            AdapterError::transport(format!("failed to encode Gemini request: {err}"))
        })?;

        let req = Request::post(self.build_uri(api_key)?)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .map_err(|err| {
                AdapterError::transport(format!("failed to build Gemini request: {err}"))
            })?;

        debug!(
            model = self.metadata.model(),
            prompt_chars = prompt.chars().count(),
            "sending Gemini request"
        );

        let (status, bytes) = match self.timeout {
            Some(limit) => timeout(limit, self.exchange(req))
                .await
                .map_err(|_| AdapterError::transport("Gemini request timed out"))??,
            None => self.exchange(req).await?,
        };

        interpret_reply(status, &bytes)
    }

    async fn exchange(&self, req: Request<Body>) -> AdapterResult<(StatusCode, Bytes)> {
        let response = self.transport.send(req).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.map_err(|err| {
            AdapterError::transport(format!("failed to read Gemini response: {err}"))
        })?;
        Ok((status, bytes))
    }

    /// Trailing whitespace is dropped from the key and the rest is
    /// percent-encoded into the query string.
    fn build_uri(&self, api_key: &str) -> AdapterResult<Uri> {
        let key = urlencoding::encode(api_key.trim_end());
        format!("{}?key={key}", self.base_endpoint)
            .parse::<Uri>()
            .map_err(|err| AdapterError::transport(format!("invalid Gemini endpoint: {err}")))
    }
}

/// Folds a raw reply into generated text or a classified error.
fn interpret_reply(status: StatusCode, body: &[u8]) -> AdapterResult<String> {
    let payload: Value = serde_json::from_slice(body).map_err(|err| {
        AdapterError::transport(format!("failed to decode Gemini response: {err}"))
    })?;

    if !status.is_success() {
        error!(status = status.as_u16(), payload = %payload, "Gemini API error");
        let message = payload
            .pointer("/error/message")
            .and_then(Value::as_str)
            .filter(|message| !message.is_empty())
            .map_or_else(
                || format!("HTTP error! status: {}", status.as_u16()),
                str::to_owned,
            );
        return Err(AdapterError::request(message));
    }

    if let Some(part) = first_part(&payload) {
        return Ok(match part.get("text") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
        });
    }

    if let Some(reason) = block_reason(&payload) {
        warn!(reason = %reason, "Gemini blocked the prompt");
        return Err(AdapterError::content_blocked(reason));
    }

    warn!(payload = %payload, "Gemini response has an unexpected structure");
    Err(AdapterError::MalformedResponse)
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

impl<'a> GenerateContentRequest<'a> {
    fn from_prompt(prompt: &'a str) -> Self {
        Self {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        }
    }
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

/// First part of the first candidate. Later candidates are never consulted.
fn first_part(payload: &Value) -> Option<&Value> {
    payload
        .get("candidates")?
        .as_array()?
        .first()?
        .get("content")?
        .get("parts")?
        .as_array()?
        .first()
}

/// Block reason from the prompt feedback. Empty strings, zero, `false` and
/// `null` count as absent.
fn block_reason(payload: &Value) -> Option<String> {
    match payload.pointer("/promptFeedback/blockReason")? {
        Value::String(reason) if !reason.is_empty() => Some(reason.clone()),
        Value::Number(code)
            if code.as_f64().is_some_and(|v| v.classify() != FpCategory::Zero) =>
        {
            Some(code.to_string())
        }
        Value::Bool(true) => Some("true".to_owned()),
        _ => None,
    }
}

/// Reads an optional millisecond count into a [`Duration`].
fn millis<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
}

fn sanitize_base_url(input: &str) -> AdapterResult<String> {
    let mut base = input.trim().to_owned();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(AdapterError::configuration(
            "Gemini base URL must start with http:// or https://",
        ));
    }
    if !base.ends_with('/') {
        base.push('/');
    }
    base.parse::<Uri>()
        .map_err(|err| AdapterError::configuration(format!("invalid Gemini base URL: {err}")))?;
    Ok(base)
}
