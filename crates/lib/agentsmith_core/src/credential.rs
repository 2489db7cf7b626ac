//! Caller-supplied API credentials.
//!
//! Keys arrive with each request and are threaded explicitly through every
//! collaborator call; nothing holds them in module-level state.

use std::fmt;

/// An opaque API key for the integration platform or the LLM provider.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredential(String);

impl ApiCredential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Builds a credential from optional input, treating blank strings as absent.
    pub fn from_optional(key: Option<&str>) -> Option<Self> {
        key.map(str::trim)
            .filter(|k| !k.is_empty())
            .map(|k| Self(k.to_string()))
    }

    /// Raw key, for building request headers only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiCredential(***)")
    }
}
