//! Extension metadata advertised to the block runtime.
//!
//! Descriptors serialise to the camelCase shape the runtime's `getInfo` call
//! expects, so a host bridge can hand them over verbatim.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{HostError, HostResult};

/// Shape of a block in the palette.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    /// Stack block that performs an action and returns nothing.
    Command,
    /// Rounded block that produces a value.
    Reporter,
}

/// Input slot type of a block argument.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentType {
    /// Free text slot.
    String,
}

/// How the runtime should treat a block re-triggered while still running.
///
/// This is advisory: the host owns the policy, the extension only states a
/// preference.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ConcurrencyMode {
    /// Abandon the pending invocation and start over.
    Restart,
    /// Run invocations one after another.
    Queue,
    /// Keep whichever invocation settles first.
    FirstPromise,
}

/// Palette colours, primary to tertiary, as `#RRGGBB`.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ThemeColors {
    color1: String,
    color2: String,
    color3: String,
}

impl ThemeColors {
    /// Validates and stores the three palette colours.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::InvalidDescriptor`] when a colour is not `#RRGGBB`.
    pub fn new(
        primary: impl Into<String>,
        secondary: impl Into<String>,
        tertiary: impl Into<String>,
    ) -> HostResult<Self> {
        let colors = Self {
            color1: primary.into(),
            color2: secondary.into(),
            color3: tertiary.into(),
        };
        for color in [&colors.color1, &colors.color2, &colors.color3] {
            if !is_hex_color(color) {
                return Err(HostError::invalid_descriptor(format!(
                    "colour `{color}` must be written as #RRGGBB"
                )));
            }
        }
        Ok(colors)
    }

    /// Returns the colours in palette order.
    #[must_use]
    pub fn as_array(&self) -> [&str; 3] {
        [&self.color1, &self.color2, &self.color3]
    }
}

/// One argument slot of a block.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentDescriptor {
    #[serde(rename = "type")]
    arg_type: ArgumentType,
    default_value: String,
}

impl ArgumentDescriptor {
    /// Text slot pre-filled with `default_value`.
    #[must_use]
    pub fn string(default_value: impl Into<String>) -> Self {
        Self {
            arg_type: ArgumentType::String,
            default_value: default_value.into(),
        }
    }

    /// Returns the slot type.
    #[must_use]
    pub const fn arg_type(&self) -> ArgumentType {
        self.arg_type
    }

    /// Returns the value shown before the user edits the slot.
    #[must_use]
    pub fn default_value(&self) -> &str {
        &self.default_value
    }
}

/// A single block contributed by an extension.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlockDescriptor {
    opcode: String,
    block_type: BlockType,
    text: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    arguments: BTreeMap<String, ArgumentDescriptor>,
    func: String,
}

impl BlockDescriptor {
    /// Starts building a block with the given opcode and shape.
    #[must_use]
    pub fn builder(opcode: impl Into<String>, block_type: BlockType) -> BlockDescriptorBuilder {
        BlockDescriptorBuilder {
            opcode: opcode.into(),
            block_type,
            text: None,
            arguments: BTreeMap::new(),
            func: None,
        }
    }

    /// Returns the opcode the runtime dispatches on.
    #[must_use]
    pub fn opcode(&self) -> &str {
        &self.opcode
    }

    /// Returns the block shape.
    #[must_use]
    pub const fn block_type(&self) -> BlockType {
        self.block_type
    }

    /// Returns the label, with `[ARG]` placeholders.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the declared argument slots keyed by name.
    #[must_use]
    pub fn arguments(&self) -> &BTreeMap<String, ArgumentDescriptor> {
        &self.arguments
    }

    /// Returns the name of the handler backing this block.
    #[must_use]
    pub fn func(&self) -> &str {
        &self.func
    }
}

/// Builder for [`BlockDescriptor`].
#[derive(Debug)]
pub struct BlockDescriptorBuilder {
    opcode: String,
    block_type: BlockType,
    text: Option<String>,
    arguments: BTreeMap<String, ArgumentDescriptor>,
    func: Option<String>,
}

impl BlockDescriptorBuilder {
    /// Sets the block label.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::InvalidDescriptor`] when the label is empty.
    pub fn text(mut self, text: impl Into<String>) -> HostResult<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(HostError::invalid_descriptor(format!(
                "block `{}` text cannot be empty",
                self.opcode
            )));
        }
        self.text = Some(text);
        Ok(self)
    }

    /// Declares an argument slot.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::InvalidDescriptor`] when the name is empty or
    /// already declared.
    pub fn argument(
        mut self,
        name: impl Into<String>,
        argument: ArgumentDescriptor,
    ) -> HostResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(HostError::invalid_descriptor(format!(
                "block `{}` has an unnamed argument",
                self.opcode
            )));
        }
        if self.arguments.contains_key(&name) {
            return Err(HostError::invalid_descriptor(format!(
                "block `{}` declares argument `{name}` twice",
                self.opcode
            )));
        }
        self.arguments.insert(name, argument);
        Ok(self)
    }

    /// Names the handler backing this block. Defaults to the opcode.
    #[must_use]
    pub fn func(mut self, func: impl Into<String>) -> Self {
        self.func = Some(func.into());
        self
    }

    /// Consumes the builder and returns the block.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::InvalidDescriptor`] when the opcode or text is
    /// missing, or when the `[ARG]` placeholders in the text do not match the
    /// declared arguments one to one.
    pub fn build(self) -> HostResult<BlockDescriptor> {
        if self.opcode.trim().is_empty() {
            return Err(HostError::invalid_descriptor("block opcode cannot be empty"));
        }
        let text = self.text.ok_or_else(|| {
            HostError::invalid_descriptor(format!("block `{}` text must be provided", self.opcode))
        })?;

        let referenced = placeholders(&text);
        if let Some(missing) = referenced
            .iter()
            .find(|name| !self.arguments.contains_key(**name))
        {
            return Err(HostError::invalid_descriptor(format!(
                "block `{}` text references undeclared argument `{missing}`",
                self.opcode
            )));
        }
        if let Some(unused) = self
            .arguments
            .keys()
            .find(|name| !referenced.contains(&name.as_str()))
        {
            return Err(HostError::invalid_descriptor(format!(
                "block `{}` declares argument `{unused}` missing from its text",
                self.opcode
            )));
        }

        let func = self.func.unwrap_or_else(|| self.opcode.clone());
        Ok(BlockDescriptor {
            opcode: self.opcode,
            block_type: self.block_type,
            text,
            arguments: self.arguments,
            func,
        })
    }
}

/// Everything the runtime needs to show an extension in its palette.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionDescriptor {
    id: String,
    name: String,
    #[serde(flatten)]
    colors: Option<ThemeColors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    concurrency_mode: Option<ConcurrencyMode>,
    blocks: Vec<BlockDescriptor>,
}

impl ExtensionDescriptor {
    /// Starts building a descriptor for the given extension id.
    #[must_use]
    pub fn builder(id: impl Into<String>) -> ExtensionDescriptorBuilder {
        ExtensionDescriptorBuilder {
            id: id.into(),
            name: None,
            colors: None,
            concurrency_mode: None,
            blocks: Vec::new(),
        }
    }

    /// Returns the extension identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the palette colours, if any.
    #[must_use]
    pub fn colors(&self) -> Option<&ThemeColors> {
        self.colors.as_ref()
    }

    /// Returns the advertised concurrency preference.
    #[must_use]
    pub const fn concurrency_mode(&self) -> Option<ConcurrencyMode> {
        self.concurrency_mode
    }

    /// Returns the blocks in palette order.
    #[must_use]
    pub fn blocks(&self) -> &[BlockDescriptor] {
        &self.blocks
    }

    /// Looks up a block by opcode.
    #[must_use]
    pub fn block(&self, opcode: &str) -> Option<&BlockDescriptor> {
        self.blocks.iter().find(|block| block.opcode == opcode)
    }
}

/// Builder for [`ExtensionDescriptor`].
#[derive(Debug)]
pub struct ExtensionDescriptorBuilder {
    id: String,
    name: Option<String>,
    colors: Option<ThemeColors>,
    concurrency_mode: Option<ConcurrencyMode>,
    blocks: Vec<BlockDescriptor>,
}

impl ExtensionDescriptorBuilder {
    /// Sets the display name.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::InvalidDescriptor`] when the name is empty.
    pub fn name(mut self, name: impl Into<String>) -> HostResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(HostError::invalid_descriptor(
                "extension name cannot be empty",
            ));
        }
        self.name = Some(name);
        Ok(self)
    }

    /// Sets the palette colours.
    #[must_use]
    pub fn colors(mut self, colors: ThemeColors) -> Self {
        self.colors = Some(colors);
        self
    }

    /// Advertises a concurrency preference.
    #[must_use]
    pub fn concurrency_mode(mut self, mode: ConcurrencyMode) -> Self {
        self.concurrency_mode = Some(mode);
        self
    }

    /// Appends a block.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::InvalidDescriptor`] if the opcode is already used.
    pub fn block(mut self, block: BlockDescriptor) -> HostResult<Self> {
        if self.blocks.iter().any(|b| b.opcode == block.opcode) {
            return Err(HostError::invalid_descriptor(format!(
                "opcode `{}` is declared twice",
                block.opcode
            )));
        }
        self.blocks.push(block);
        Ok(self)
    }

    /// Consumes the builder and returns the descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::InvalidDescriptor`] if the id is not alphanumeric,
    /// the name is missing, or no blocks were declared.
    pub fn build(self) -> HostResult<ExtensionDescriptor> {
        if self.id.is_empty() || !self.id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(HostError::invalid_descriptor(format!(
                "extension id `{}` must be non-empty and alphanumeric",
                self.id
            )));
        }
        let name = self
            .name
            .ok_or_else(|| HostError::invalid_descriptor("extension name must be provided"))?;
        if self.blocks.is_empty() {
            return Err(HostError::invalid_descriptor(format!(
                "extension `{}` declares no blocks",
                self.id
            )));
        }

        Ok(ExtensionDescriptor {
            id: self.id,
            name,
            colors: self.colors,
            concurrency_mode: self.concurrency_mode,
            blocks: self.blocks,
        })
    }
}

fn placeholders(text: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find('[') {
        let after = &rest[start + 1..];
        let Some(end) = after.find(']') else {
            break;
        };
        found.push(&after[..end]);
        rest = &after[end + 1..];
    }
    found
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}
