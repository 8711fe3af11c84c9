//! The API key held by the prompt client.

use std::fmt;

/// Value the block palette pre-fills the key slot with.
pub const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY_HERE";

/// An API key as entered by the user.
///
/// `Debug` never prints the key itself.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a raw key without validating it.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Whether the key is worth sending: not blank and not the placeholder.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        !self.0.trim().is_empty() && self.0 != PLACEHOLDER_API_KEY
    }

    /// Returns the raw key.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.is_usable() { "<redacted>" } else { "<unusable>" };
        f.debug_tuple("Credential").field(&state).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_and_blank_keys_are_unusable() {
        assert!(!Credential::new("").is_usable());
        assert!(!Credential::new("   ").is_usable());
        assert!(!Credential::new(PLACEHOLDER_API_KEY).is_usable());
        assert!(Credential::new("AIza-test").is_usable());
    }

    #[test]
    fn debug_output_hides_key() {
        let rendered = format!("{:?}", Credential::new("super-secret"));
        assert!(!rendered.contains("super-secret"));
        assert_eq!(rendered, "Credential(\"<redacted>\")");
    }
}
