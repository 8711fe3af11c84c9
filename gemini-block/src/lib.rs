//! Gemini AI blocks for Scratch-compatible runtimes.
//!
//! Two blocks are exposed: `Set Gemini API Key [KEY]` stores a key in memory
//! and `Ask Gemini [PROMPT]` reports the model's answer, or an `Error: ...`
//! string when anything goes wrong. Reporters never fail from the runtime's
//! point of view; callers that want the structured failure use
//! [`PromptClient::try_ask`].
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use gemini_block::host::RuntimeHost;
//! use gemini_block::{GeminiConfig, GeminiExtension, register};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let host = RuntimeHost::new();
//! let extension = Arc::new(GeminiExtension::new(GeminiConfig::default())?);
//! register(&host, Arc::clone(&extension))?;
//!
//! extension.client().set_credential("my-api-key");
//! let answer = extension.client().ask("What is the capital of France?").await;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs, clippy::pedantic)]

pub mod client;
pub mod credential;
pub mod extension;

/// Re-export of the Gemini wire adapter.
pub use gemini_adapter as adapter;

/// Re-export of the host registration interface.
pub use block_host as host;

pub use client::PromptClient;
pub use credential::{Credential, PLACEHOLDER_API_KEY};
pub use extension::{
    ASK_GEMINI_OPCODE, EXTENSION_ID, GeminiExtension, SET_API_KEY_OPCODE, register,
};
pub use gemini_adapter::{AdapterError, AdapterResult, GeminiConfig};
