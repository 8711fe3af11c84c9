//! Shared adapter error taxonomy and transport seam.

use async_trait::async_trait;
use hyper::{Body, Request, Response};
use thiserror::Error;

/// Result alias used by the adapter.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Prefix the block runtime shows in front of every failure message.
pub const BLOCK_ERROR_PREFIX: &str = "Error: ";

/// Every way a prompt can fail to produce text.
///
/// The `Display` output of each variant is exactly what the block runtime
/// shows after the [`BLOCK_ERROR_PREFIX`], so changing these strings changes
/// what users see on stage.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// No usable API key has been set.
    #[error("API Key not set.")]
    CredentialMissing,

    /// The prompt was empty.
    #[error("Prompt is empty.")]
    EmptyPrompt,

    /// The service answered with a non-success HTTP status.
    #[error("{message}")]
    Request {
        /// Message taken from the error payload, or synthesised from the status.
        message: String,
    },

    /// The service declined to generate for policy reasons.
    #[error("Prompt blocked ({reason})")]
    ContentBlocked {
        /// Block reason reported by the service (e.g. `SAFETY`).
        reason: String,
    },

    /// A success reply did not match any recognised shape.
    #[error("Could not parse response from Gemini.")]
    MalformedResponse,

    /// Network, protocol, or body decoding failures.
    #[error("{reason}")]
    Transport {
        /// Additional context about the error.
        reason: String,
    },

    /// Adapter configuration was rejected.
    #[error("adapter not configured: {reason}")]
    Configuration {
        /// Additional context for the failure.
        reason: String,
    },
}

impl AdapterError {
    /// Convenience constructor for HTTP-level failures.
    #[must_use]
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request {
            message: message.into(),
        }
    }

    /// Convenience constructor for blocked prompts.
    #[must_use]
    pub fn content_blocked(reason: impl Into<String>) -> Self {
        Self::ContentBlocked {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for transport failures.
    #[must_use]
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for configuration issues.
    #[must_use]
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Renders the error the way the block runtime displays it.
    #[must_use]
    pub fn to_block_text(&self) -> String {
        format!("{BLOCK_ERROR_PREFIX}{self}")
    }
}

/// Minimal metadata describing an adapter instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdapterMetadata {
    provider: &'static str,
    model: String,
}

impl AdapterMetadata {
    /// Creates metadata for the supplied provider and model identifier.
    #[must_use]
    pub fn new(provider: &'static str, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Returns the provider identifier (e.g., "gemini").
    #[must_use]
    pub const fn provider(&self) -> &'static str {
        self.provider
    }

    /// Returns the configured model name.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Sends a fully built HTTP request and hands back the raw response.
///
/// Implementations map their own failures to [`AdapterError::Transport`].
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Executes the request.
    async fn send(&self, request: Request<Body>) -> AdapterResult<Response<Body>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_text_matches_runtime_strings() {
        assert_eq!(
            AdapterError::CredentialMissing.to_block_text(),
            "Error: API Key not set."
        );
        assert_eq!(
            AdapterError::EmptyPrompt.to_block_text(),
            "Error: Prompt is empty."
        );
        assert_eq!(
            AdapterError::request("Invalid API key").to_block_text(),
            "Error: Invalid API key"
        );
        assert_eq!(
            AdapterError::content_blocked("SAFETY").to_block_text(),
            "Error: Prompt blocked (SAFETY)"
        );
        assert_eq!(
            AdapterError::MalformedResponse.to_block_text(),
            "Error: Could not parse response from Gemini."
        );
        assert_eq!(
            AdapterError::transport("connection refused").to_block_text(),
            "Error: connection refused"
        );
    }

    #[test]
    fn metadata_accessors() {
        let metadata = AdapterMetadata::new("gemini", "gemini-pro");
        assert_eq!(metadata.provider(), "gemini");
        assert_eq!(metadata.model(), "gemini-pro");
    }
}
