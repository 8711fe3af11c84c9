//! Google Gemini `generateContent` client used by the Gemini block.
//!
//! The adapter turns a single text prompt into one HTTPS request and folds the
//! reply (or any failure) into either the generated text or a typed
//! [`traits::AdapterError`]. Transport is pluggable through
//! [`traits::HttpTransport`] so tests can script replies without a network.

#![warn(missing_docs, clippy::pedantic)]

pub mod gemini;
pub mod http_client;
pub mod traits;

pub use gemini::{DEFAULT_MODEL, GeminiAdapter, GeminiConfig};
pub use http_client::HyperTransport;
pub use traits::{AdapterError, AdapterMetadata, AdapterResult, HttpTransport};
