//! Host-side plumbing for block extensions.
//!
//! An extension describes its blocks with an [`ExtensionDescriptor`] and
//! answers opcode invocations through the [`Extension`] trait. Hosts implement
//! [`HostAdapter`]; [`RuntimeHost`] dispatches for real while [`NoopHost`]
//! only records what was registered, which keeps tests free of a runtime.

#![warn(missing_docs, clippy::pedantic)]

pub mod descriptor;
pub mod error;
pub mod registry;

pub use descriptor::{
    ArgumentDescriptor, ArgumentType, BlockDescriptor, BlockDescriptorBuilder, BlockType,
    ConcurrencyMode, ExtensionDescriptor, ExtensionDescriptorBuilder, ThemeColors,
};
pub use error::{HostError, HostResult};
pub use registry::{
    Extension, HostAdapter, NoopHost, RuntimeHost, text_argument, truthy_text_argument,
};
