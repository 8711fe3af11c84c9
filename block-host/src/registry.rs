//! Extension registration and block dispatch.

use std::collections::HashMap;
use std::num::FpCategory;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::descriptor::ExtensionDescriptor;
use crate::error::{HostError, HostResult};

/// Behaviour behind an extension's blocks.
#[async_trait]
pub trait Extension: Send + Sync {
    /// Returns the metadata the palette is built from.
    fn descriptor(&self) -> &ExtensionDescriptor;

    /// Runs the block identified by `opcode`.
    ///
    /// `args` is a JSON object keyed by argument name. Command blocks answer
    /// [`Value::Null`]; reporters answer the reported value.
    async fn invoke(&self, opcode: &str, args: &Value) -> HostResult<Value>;
}

/// Something an extension can be registered with.
pub trait HostAdapter: Send + Sync {
    /// Makes the extension available to the host.
    ///
    /// # Errors
    ///
    /// Implementations may reject the extension, e.g. on an id collision.
    fn register(&self, extension: Arc<dyn Extension>) -> HostResult<()>;
}

/// In-process host that keeps extensions keyed by id and dispatches block
/// invocations to them.
#[derive(Default)]
pub struct RuntimeHost {
    inner: RwLock<HashMap<String, Arc<dyn Extension>>>,
}

impl std::fmt::Debug for RuntimeHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<_> = inner.keys().cloned().collect();
        ids.sort();
        f.debug_struct("RuntimeHost")
            .field("registered", &ids)
            .finish()
    }
}

impl RuntimeHost {
    /// Creates an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the extension registered under `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<dyn Extension>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.get(id).cloned()
    }

    /// Invokes a block of a registered extension.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::UnknownExtension`] or [`HostError::UnknownOpcode`]
    /// when the target does not exist, or whatever the block handler returns.
    pub async fn invoke(&self, extension_id: &str, opcode: &str, args: &Value) -> HostResult<Value> {
        let extension = self
            .get(extension_id)
            .ok_or_else(|| HostError::UnknownExtension {
                id: extension_id.to_owned(),
            })?;

        if extension.descriptor().block(opcode).is_none() {
            return Err(HostError::UnknownOpcode {
                extension: extension_id.to_owned(),
                opcode: opcode.to_owned(),
            });
        }

        debug!(extension = extension_id, opcode, "dispatching block");
        extension.invoke(opcode, args).await
    }

    /// Lists the descriptors of all registered extensions, ordered by id.
    #[must_use]
    pub fn descriptors(&self) -> Vec<ExtensionDescriptor> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut descriptors: Vec<_> = inner
            .values()
            .map(|extension| extension.descriptor().clone())
            .collect();
        descriptors.sort_by(|a, b| a.id().cmp(b.id()));
        descriptors
    }
}

impl HostAdapter for RuntimeHost {
    fn register(&self, extension: Arc<dyn Extension>) -> HostResult<()> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let id = extension.descriptor().id().to_owned();
        if inner.contains_key(&id) {
            return Err(HostError::DuplicateExtension { id });
        }

        info!(
            extension = %id,
            name = extension.descriptor().name(),
            blocks = extension.descriptor().blocks().len(),
            "extension registered"
        );
        inner.insert(id, extension);
        Ok(())
    }
}

/// Host stand-in that accepts every registration and remembers the ids.
#[derive(Debug, Default)]
pub struct NoopHost {
    seen: Mutex<Vec<String>>,
}

impl NoopHost {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the ids registered so far, in registration order.
    #[must_use]
    pub fn registered_ids(&self) -> Vec<String> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl HostAdapter for NoopHost {
    fn register(&self, extension: Arc<dyn Extension>) -> HostResult<()> {
        let id = extension.descriptor().id().to_owned();
        debug!(extension = %id, "no-op host accepted extension");
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(id);
        Ok(())
    }
}

/// Reads argument `name` as text, coercing the way block runtimes do.
///
/// Strings pass through, numbers and booleans are stringified, and missing or
/// `null` values become the empty string.
#[must_use]
pub fn text_argument(args: &Value, name: &str) -> String {
    match args.get(name) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

/// Like [`text_argument`], but falsy values (`0`, `false`, `null`, missing)
/// read as the empty string instead of their literal text.
///
/// Blocks whose handlers treat "nothing supplied" specially use this so a
/// numeric zero is not mistaken for input.
#[must_use]
pub fn truthy_text_argument(args: &Value, name: &str) -> String {
    match args.get(name) {
        Some(Value::Bool(false)) => String::new(),
        Some(Value::Number(n))
            if n.as_f64().is_some_and(|v| v.classify() == FpCategory::Zero) =>
        {
            String::new()
        }
        _ => text_argument(args, name),
    }
}
