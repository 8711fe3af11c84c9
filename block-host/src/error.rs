//! Errors raised while registering or dispatching extensions.

use thiserror::Error;

/// Result alias for host operations.
pub type HostResult<T> = Result<T, HostError>;

/// Errors produced by extension registration and block dispatch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    /// Extension or block metadata failed validation.
    #[error("invalid extension descriptor: {reason}")]
    InvalidDescriptor {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// An extension with the same id is already registered.
    #[error("extension `{id}` is already registered")]
    DuplicateExtension {
        /// Id of the offending extension.
        id: String,
    },

    /// No extension is registered under the requested id.
    #[error("extension `{id}` is not registered")]
    UnknownExtension {
        /// Id of the missing extension.
        id: String,
    },

    /// The extension does not declare the requested opcode.
    #[error("extension `{extension}` has no block `{opcode}`")]
    UnknownOpcode {
        /// Id of the extension that was asked.
        extension: String,
        /// Opcode that was not found.
        opcode: String,
    },
}

impl HostError {
    /// Creates a descriptor validation error.
    #[must_use]
    pub fn invalid_descriptor(reason: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            reason: reason.into(),
        }
    }
}
