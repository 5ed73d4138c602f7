//! Bearer credential.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque API token.
///
/// The client never inspects the token; it is only ever sent back to the
/// server as a bearer credential. `Debug` output is redacted so tokens do not
/// end up in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiToken(String);

impl ApiToken {
    /// Wrap a raw token string. Surrounding whitespace is trimmed.
    #[must_use]
    pub fn new(token: impl AsRef<str>) -> Self {
        Self(token.as_ref().trim().to_string())
    }

    /// The raw token value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Value for an `authorization` header.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }

    /// Whether the token is empty after trimming.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(<redacted>)")
    }
}

impl From<String> for ApiToken {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for ApiToken {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_redacted() {
        let token = ApiToken::new("abc.secret");
        assert!(!format!("{token:?}").contains("secret"));
    }

    #[test]
    fn test_bearer_header_and_trim() {
        let token = ApiToken::new("  abc.def\n");
        assert_eq!(token.expose(), "abc.def");
        assert_eq!(token.bearer(), "Bearer abc.def");
        assert!(ApiToken::new("   ").is_empty());
    }
}
