//! Token registry: which token is authoritative for each side input, and how
//! many active bundles still consider each token valid.
//!
//! Validity is reference counted rather than a flag. Bundles overlap and can
//! share a token, so a token stays valid until every bundle that registered it
//! has released it.

use std::collections::HashMap;

use super::token::{CacheToken, Token};

/// Outcome of releasing a bundle's tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ReleaseSummary {
    /// Tokens whose count was decremented but remain valid.
    pub decremented: usize,
    /// Tokens whose count reached zero and were dropped from the registry.
    pub expired: usize,
    /// Tokens that were not registered at all.
    pub unmatched: usize,
}

#[derive(Debug, Default)]
pub(crate) struct TokenRegistry {
    /// transform id -> side input id -> current token.
    ids_to_tokens: HashMap<String, HashMap<String, Token>>,
    /// token -> number of active bundles holding it. Never stores zero.
    valid_tokens: HashMap<Token, usize>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the side input tokens of a starting bundle.
    ///
    /// Each token becomes authoritative for its identity key, replacing any
    /// earlier mapping, and its validity count goes up by one. User state
    /// tokens are skipped. Returns the number of tokens registered.
    pub fn register(&mut self, tokens: &[CacheToken]) -> usize {
        let mut registered = 0;
        for tok in tokens {
            let Some(key) = tok.side_input_key() else {
                continue;
            };
            self.ids_to_tokens
                .entry(key.transform_id.clone())
                .or_default()
                .insert(key.side_input_id.clone(), tok.token.clone());
            *self.valid_tokens.entry(tok.token.clone()).or_insert(0) += 1;
            registered += 1;
        }
        registered
    }

    /// Release the side input tokens of a completed bundle.
    ///
    /// Tokens that are not registered are left alone and reported as
    /// unmatched; the count never goes below zero.
    pub fn release(&mut self, tokens: &[CacheToken]) -> ReleaseSummary {
        let mut summary = ReleaseSummary::default();
        for tok in tokens {
            if tok.side_input_key().is_none() {
                continue;
            }
            match self.valid_tokens.get_mut(&tok.token) {
                Some(count) if *count > 1 => {
                    *count -= 1;
                    summary.decremented += 1;
                }
                Some(_) => {
                    self.valid_tokens.remove(&tok.token);
                    summary.expired += 1;
                }
                None => summary.unmatched += 1,
            }
        }
        summary
    }

    /// Look up the token for a side input and whether it is currently valid.
    pub fn resolve(&self, transform_id: &str, side_input_id: &str) -> Option<(&Token, bool)> {
        let tok = self.ids_to_tokens.get(transform_id)?.get(side_input_id)?;
        Some((tok, self.is_valid(tok)))
    }

    pub fn is_valid(&self, tok: &Token) -> bool {
        self.valid_tokens.get(tok).is_some_and(|count| *count > 0)
    }

    /// Number of distinct tokens held by at least one active bundle.
    pub fn valid_token_count(&self) -> usize {
        self.valid_tokens.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(transform: &str, side_input: &str, token: &str) -> CacheToken {
        CacheToken::side_input(transform, side_input, token)
    }

    #[test]
    fn test_resolve_unknown_key() {
        let registry = TokenRegistry::new();
        assert!(registry.resolve("t1", "s1").is_none());
    }

    #[test]
    fn test_register_makes_token_valid() {
        let mut registry = TokenRegistry::new();
        assert_eq!(registry.register(&[tok("t1", "s1", "A")]), 1);

        let (token, valid) = registry.resolve("t1", "s1").unwrap();
        assert_eq!(token.as_str(), "A");
        assert!(valid);
        assert_eq!(registry.valid_token_count(), 1);
    }

    #[test]
    fn test_user_state_tokens_are_ignored() {
        let mut registry = TokenRegistry::new();
        let tokens = [CacheToken::user_state("U")];

        assert_eq!(registry.register(&tokens), 0);
        assert_eq!(registry.valid_token_count(), 0);
        assert!(!registry.is_valid(&Token::new("U")));

        let summary = registry.release(&tokens);
        assert_eq!(summary, ReleaseSummary::default());
    }

    #[test]
    fn test_shared_token_stays_valid_until_last_release() {
        let mut registry = TokenRegistry::new();
        let bundle = [tok("t1", "s1", "A")];

        registry.register(&bundle);
        registry.register(&bundle);

        let summary = registry.release(&bundle);
        assert_eq!(summary.decremented, 1);
        assert!(registry.resolve("t1", "s1").unwrap().1);

        let summary = registry.release(&bundle);
        assert_eq!(summary.expired, 1);
        let (token, valid) = registry.resolve("t1", "s1").unwrap();
        assert_eq!(token.as_str(), "A");
        assert!(!valid);
        assert_eq!(registry.valid_token_count(), 0);
    }

    #[test]
    fn test_newer_registration_supersedes_mapping() {
        let mut registry = TokenRegistry::new();
        registry.register(&[tok("t1", "s1", "A")]);
        registry.register(&[tok("t1", "s1", "B")]);

        let (token, valid) = registry.resolve("t1", "s1").unwrap();
        assert_eq!(token.as_str(), "B");
        assert!(valid);
        // The superseded token keeps its count until released.
        assert!(registry.is_valid(&Token::new("A")));
    }

    #[test]
    fn test_release_of_unknown_token_is_a_no_op() {
        let mut registry = TokenRegistry::new();
        let summary = registry.release(&[tok("t1", "s1", "ghost")]);
        assert_eq!(summary.unmatched, 1);
        assert_eq!(registry.valid_token_count(), 0);

        // A later registration starts from a clean count.
        registry.register(&[tok("t1", "s1", "ghost")]);
        registry.release(&[tok("t1", "s1", "ghost")]);
        assert!(!registry.is_valid(&Token::new("ghost")));
    }

    #[test]
    fn test_same_token_for_two_keys_is_counted_twice() {
        let mut registry = TokenRegistry::new();
        registry.register(&[tok("t1", "s1", "A"), tok("t2", "s1", "A")]);

        registry.release(&[tok("t1", "s1", "A")]);
        assert!(registry.resolve("t2", "s1").unwrap().1);

        registry.release(&[tok("t2", "s1", "A")]);
        assert!(!registry.resolve("t2", "s1").unwrap().1);
    }
}
