//! Prompt client: holds the API key and turns prompts into answers.

use std::sync::{PoisonError, RwLock};

use gemini_adapter::{AdapterError, AdapterResult, GeminiAdapter, GeminiConfig};
use tracing::{error, info, warn};

use crate::credential::Credential;

/// Keeps the current API key in memory and asks Gemini on behalf of blocks.
///
/// All methods take `&self`; share the client behind an `Arc` to serve
/// concurrent block invocations. Each ask snapshots the key before any I/O,
/// so replacing the key never affects requests already in flight.
#[derive(Debug)]
pub struct PromptClient {
    adapter: GeminiAdapter,
    credential: RwLock<Option<Credential>>,
}

impl PromptClient {
    /// Creates a client that talks to Gemini over HTTPS. The key starts unset.
    #[must_use]
    pub fn new(config: GeminiConfig) -> Self {
        Self::with_adapter(GeminiAdapter::new(config))
    }

    /// Creates a client over a pre-built adapter. The key starts unset.
    #[must_use]
    pub fn with_adapter(adapter: GeminiAdapter) -> Self {
        Self {
            adapter,
            credential: RwLock::new(None),
        }
    }

    /// Replaces the stored API key. Never fails.
    ///
    /// Blank keys and the palette placeholder are stored as given but logged
    /// as a warning, since asks will be refused until a real key arrives.
    pub fn set_credential(&self, key: impl Into<String>) {
        let credential = Credential::new(key);
        if credential.is_usable() {
            info!("Gemini API key set");
        } else {
            warn!("Gemini API key not set or is the placeholder; set a valid API key");
        }
        *self
            .credential
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(credential);
    }

    /// Forgets the stored API key.
    pub fn clear_credential(&self) {
        *self
            .credential
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Whether a usable key is currently stored.
    #[must_use]
    pub fn has_credential(&self) -> bool {
        self.usable_credential().is_some()
    }

    /// Sends `prompt` and returns the generated text.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::CredentialMissing`] or
    /// [`AdapterError::EmptyPrompt`] without touching the network, and
    /// otherwise whatever [`GeminiAdapter::generate`] reports.
    pub async fn try_ask(&self, prompt: &str) -> AdapterResult<String> {
        let Some(credential) = self.usable_credential() else {
            error!("Gemini API key is not set; use the 'Set Gemini API Key' block");
            return Err(AdapterError::CredentialMissing);
        };

        if prompt.is_empty() {
            return Err(AdapterError::EmptyPrompt);
        }

        self.adapter.generate(credential.expose(), prompt).await
    }

    /// Sends `prompt` and always answers with a string for the block runtime:
    /// the generated text, or `"Error: ..."` describing what went wrong.
    pub async fn ask(&self, prompt: &str) -> String {
        match self.try_ask(prompt).await {
            Ok(text) => text,
            Err(err) => {
                error!(error = %err, "Gemini block failed");
                err.to_block_text()
            }
        }
    }

    fn usable_credential(&self) -> Option<Credential> {
        self.credential
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|credential| credential.is_usable())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use gemini_adapter::HttpTransport;
    use hyper::{Body, Request, Response};

    use super::*;
    use crate::credential::PLACEHOLDER_API_KEY;

    #[derive(Default)]
    struct CountingTransport {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl HttpTransport for CountingTransport {
        async fn send(&self, _request: Request<Body>) -> AdapterResult<Response<Body>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Response::new(Body::from(
                r#"{"candidates":[{"content":{"parts":[{"text":"ok"}]}}]}"#,
            )))
        }
    }

    fn client() -> (PromptClient, Arc<CountingTransport>) {
        let transport = Arc::new(CountingTransport::default());
        let adapter = GeminiAdapter::with_transport(
            GeminiConfig::default(),
            Arc::clone(&transport) as Arc<dyn HttpTransport>,
        );
        (PromptClient::with_adapter(adapter), transport)
    }

    #[tokio::test]
    async fn starts_without_credential() {
        let (client, transport) = client();
        assert!(!client.has_credential());
        assert_eq!(client.ask("hi").await, "Error: API Key not set.");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unusable_credentials_short_circuit() {
        let (client, transport) = client();
        for key in ["", "  ", PLACEHOLDER_API_KEY] {
            client.set_credential(key);
            let err = client.try_ask("hi").await.unwrap_err();
            assert_eq!(err, AdapterError::CredentialMissing);
        }
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_prompt_short_circuits() {
        let (client, transport) = client();
        client.set_credential("key");
        assert_eq!(client.ask("").await, "Error: Prompt is empty.");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn credential_check_precedes_prompt_check() {
        let (client, _) = client();
        assert_eq!(
            client.try_ask("").await.unwrap_err(),
            AdapterError::CredentialMissing
        );
    }

    #[tokio::test]
    async fn usable_credential_reaches_transport() {
        let (client, transport) = client();
        client.set_credential("key");
        client.set_credential("key");
        assert!(client.has_credential());
        assert_eq!(client.ask("   ").await, "ok");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn clearing_credential_disables_asks() {
        let (client, _) = client();
        client.set_credential("key");
        client.clear_credential();
        assert_eq!(client.ask("hi").await, "Error: API Key not set.");
    }
}
