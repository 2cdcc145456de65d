//! Cache tokens granted by the runner at bundle start.
//!
//! A token is an opaque identifier that grants caching rights for one side
//! input. The same token can be handed to several bundles that are active at
//! the same time, so tokens carry no notion of which bundle they belong to.

use std::borrow::Borrow;
use std::fmt;

/// Opaque cache token. Only equality is meaningful.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(String);

impl Token {
    /// Create a token from any string-like value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw token string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for Token {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Identifies one cacheable side input within one transform.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    /// Transform (processing step) that consumes the side input.
    pub transform_id: String,
    /// Side input identifier local to the transform.
    pub side_input_id: String,
}

impl IdentityKey {
    pub fn new(transform_id: impl Into<String>, side_input_id: impl Into<String>) -> Self {
        Self {
            transform_id: transform_id.into(),
            side_input_id: side_input_id.into(),
        }
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.transform_id, self.side_input_id)
    }
}

/// What a cache token grants caching rights for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenScope {
    /// A side input of a specific transform.
    SideInput(IdentityKey),
    /// Per-key user state. Accepted on the wire but never cached.
    UserState,
}

/// A token together with its scope, as delivered in a bundle request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheToken {
    pub scope: TokenScope,
    pub token: Token,
}

impl CacheToken {
    /// Token granting caching rights for one side input.
    pub fn side_input(
        transform_id: impl Into<String>,
        side_input_id: impl Into<String>,
        token: impl Into<Token>,
    ) -> Self {
        Self {
            scope: TokenScope::SideInput(IdentityKey::new(transform_id, side_input_id)),
            token: token.into(),
        }
    }

    /// Token scoped to user state.
    pub fn user_state(token: impl Into<Token>) -> Self {
        Self {
            scope: TokenScope::UserState,
            token: token.into(),
        }
    }

    /// The identity key this token covers, or `None` for user state tokens.
    pub fn side_input_key(&self) -> Option<&IdentityKey> {
        match &self.scope {
            TokenScope::SideInput(key) => Some(key),
            TokenScope::UserState => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_input_token_exposes_key() {
        let tok = CacheToken::side_input("ParDo1", "si0", "tok-a");
        let key = tok.side_input_key().unwrap();
        assert_eq!(key.transform_id, "ParDo1");
        assert_eq!(key.side_input_id, "si0");
        assert_eq!(tok.token.as_str(), "tok-a");
    }

    #[test]
    fn test_user_state_token_has_no_key() {
        let tok = CacheToken::user_state("tok-u");
        assert!(tok.side_input_key().is_none());
        assert_eq!(tok.scope, TokenScope::UserState);
    }

    #[test]
    fn test_identity_key_display() {
        let key = IdentityKey::new("t1", "s1");
        assert_eq!(key.to_string(), "t1/s1");
    }

    #[test]
    fn test_identity_keys_do_not_collide_on_concatenation() {
        // "ab" + "c" and "a" + "bc" are different side inputs.
        assert_ne!(IdentityKey::new("ab", "c"), IdentityKey::new("a", "bc"));
    }
}
