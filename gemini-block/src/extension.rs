//! The "Gemini AI" extension as seen by the block runtime.

use std::sync::Arc;

use async_trait::async_trait;
use block_host::{
    ArgumentDescriptor, BlockDescriptor, BlockDescriptorBuilder, BlockType, ConcurrencyMode,
    Extension, ExtensionDescriptor, HostAdapter, HostError, HostResult, ThemeColors,
    truthy_text_argument,
};
use gemini_adapter::GeminiConfig;
use serde_json::Value;

use crate::client::PromptClient;
use crate::credential::PLACEHOLDER_API_KEY;

/// Extension id the runtime knows the blocks under.
pub const EXTENSION_ID: &str = "geminiAI";

/// Opcode of the command block that stores the API key.
pub const SET_API_KEY_OPCODE: &str = "setApiKey";

/// Opcode of the reporter block that asks Gemini.
pub const ASK_GEMINI_OPCODE: &str = "askGemini";

const KEY_ARG: &str = "KEY";
const PROMPT_ARG: &str = "PROMPT";
const DEFAULT_PROMPT: &str = "What is the capital of France?";

/// Block extension exposing `Set Gemini API Key [KEY]` and `Ask Gemini [PROMPT]`.
#[derive(Debug)]
pub struct GeminiExtension {
    client: PromptClient,
    descriptor: ExtensionDescriptor,
}

impl GeminiExtension {
    /// Builds the extension with an HTTPS-backed client.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::InvalidDescriptor`] if the block metadata fails
    /// validation.
    pub fn new(config: GeminiConfig) -> HostResult<Self> {
        Self::with_client(PromptClient::new(config))
    }

    /// Builds the extension around an existing client.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::InvalidDescriptor`] if the block metadata fails
    /// validation.
    pub fn with_client(client: PromptClient) -> HostResult<Self> {
        Ok(Self {
            client,
            descriptor: gemini_descriptor()?,
        })
    }

    /// Returns the prompt client behind the blocks.
    #[must_use]
    pub fn client(&self) -> &PromptClient {
        &self.client
    }
}

#[async_trait]
impl Extension for GeminiExtension {
    fn descriptor(&self) -> &ExtensionDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, opcode: &str, args: &Value) -> HostResult<Value> {
        match opcode {
            SET_API_KEY_OPCODE => {
                self.client.set_credential(truthy_text_argument(args, KEY_ARG));
                Ok(Value::Null)
            }
            ASK_GEMINI_OPCODE => {
                let prompt = truthy_text_argument(args, PROMPT_ARG);
                Ok(Value::String(self.client.ask(&prompt).await))
            }
            other => Err(HostError::UnknownOpcode {
                extension: EXTENSION_ID.to_owned(),
                opcode: other.to_owned(),
            }),
        }
    }
}

/// Registers `extension` with whichever host the caller supplies.
///
/// # Errors
///
/// Propagates the host's rejection, e.g. [`HostError::DuplicateExtension`].
pub fn register(host: &dyn HostAdapter, extension: Arc<GeminiExtension>) -> HostResult<()> {
    host.register(extension)
}

fn gemini_descriptor() -> HostResult<ExtensionDescriptor> {
    let set_key = BlockDescriptor::builder(SET_API_KEY_OPCODE, BlockType::Command)
        .text("Set Gemini API Key [KEY]")?
        .argument(KEY_ARG, ArgumentDescriptor::string(PLACEHOLDER_API_KEY))?
        .func("setApiKeyBlock")
        .build()?;

    let ask = BlockDescriptor::builder(ASK_GEMINI_OPCODE, BlockType::Reporter)
        .text("Ask Gemini [PROMPT]")
        .and_then(|b| b.argument(PROMPT_ARG, ArgumentDescriptor::string(DEFAULT_PROMPT)))
        .map(|b| b.func("askGeminiBlock"))
        .and_then(BlockDescriptorBuilder::build)?;

    ExtensionDescriptor::builder(EXTENSION_ID)
        .name("Gemini AI")?
        .colors(ThemeColors::new("#4A90E2", "#4285F4", "#357ABD")?)
        .concurrency_mode(ConcurrencyMode::Restart)
        .block(set_key)?
        .block(ask)?
        .build()
}

#[cfg(test)]
mod tests {
    use block_host::NoopHost;
    use serde_json::json;

    use super::*;

    #[test]
    fn descriptor_matches_palette() {
        let descriptor = gemini_descriptor().unwrap();
        assert_eq!(descriptor.id(), "geminiAI");
        assert_eq!(descriptor.name(), "Gemini AI");
        assert_eq!(descriptor.concurrency_mode(), Some(ConcurrencyMode::Restart));
        assert_eq!(
            descriptor.colors().map(ThemeColors::as_array),
            Some(["#4A90E2", "#4285F4", "#357ABD"])
        );

        let set_key = descriptor.block(SET_API_KEY_OPCODE).unwrap();
        assert_eq!(set_key.block_type(), BlockType::Command);
        assert_eq!(set_key.func(), "setApiKeyBlock");
        assert_eq!(
            set_key.arguments()[KEY_ARG].default_value(),
            "YOUR_API_KEY_HERE"
        );

        let ask = descriptor.block(ASK_GEMINI_OPCODE).unwrap();
        assert_eq!(ask.block_type(), BlockType::Reporter);
        assert_eq!(ask.text(), "Ask Gemini [PROMPT]");
        assert_eq!(
            ask.arguments()[PROMPT_ARG].default_value(),
            "What is the capital of France?"
        );
    }

    #[tokio::test]
    async fn set_key_block_returns_null() {
        let extension = GeminiExtension::new(GeminiConfig::default()).unwrap();
        let output = extension
            .invoke(SET_API_KEY_OPCODE, &json!({ "KEY": "abc" }))
            .await
            .unwrap();
        assert_eq!(output, Value::Null);
        assert!(extension.client().has_credential());
    }

    #[tokio::test]
    async fn set_key_block_tolerates_missing_argument() {
        let extension = GeminiExtension::new(GeminiConfig::default()).unwrap();
        extension
            .invoke(SET_API_KEY_OPCODE, &json!({}))
            .await
            .unwrap();
        assert!(!extension.client().has_credential());
    }

    #[tokio::test]
    async fn ask_block_without_key_reports_error_string() {
        let extension = GeminiExtension::new(GeminiConfig::default()).unwrap();
        let output = extension
            .invoke(ASK_GEMINI_OPCODE, &json!({ "PROMPT": "hi" }))
            .await
            .unwrap();
        assert_eq!(output, json!("Error: API Key not set."));
    }

    #[tokio::test]
    async fn zero_and_false_arguments_count_as_missing() {
        let extension = GeminiExtension::new(GeminiConfig::default()).unwrap();
        extension
            .invoke(SET_API_KEY_OPCODE, &json!({ "KEY": 0 }))
            .await
            .unwrap();
        assert!(!extension.client().has_credential());

        extension
            .invoke(SET_API_KEY_OPCODE, &json!({ "KEY": "abc" }))
            .await
            .unwrap();
        for prompt in [json!(0), json!(false), Value::Null] {
            let output = extension
                .invoke(ASK_GEMINI_OPCODE, &json!({ "PROMPT": prompt }))
                .await
                .unwrap();
            assert_eq!(output, json!("Error: Prompt is empty."), "prompt: {prompt}");
        }
    }

    #[tokio::test]
    async fn unknown_opcode_errors() {
        let extension = GeminiExtension::new(GeminiConfig::default()).unwrap();
        let err = extension
            .invoke("draw", &Value::Null)
            .await
            .expect_err("unknown opcode");
        assert!(matches!(err, HostError::UnknownOpcode { .. }));
    }

    #[test]
    fn registers_with_injected_host() {
        let host = NoopHost::new();
        let extension = Arc::new(GeminiExtension::new(GeminiConfig::default()).unwrap());
        register(&host, extension).unwrap();
        assert_eq!(host.registered_ids(), ["geminiAI"]);
    }
}
