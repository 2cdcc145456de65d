//! Victim selection for a full cache store.
//!
//! The policy is "prefer invalid, else arbitrary". An entry whose token no
//! active bundle holds is reclaimed first. Only when every cached token is
//! still in use is a live entry sacrificed. Candidates are visited in the
//! store's iteration order, which is unspecified; this is not an LRU.

use super::registry::TokenRegistry;
use super::token::Token;

/// The entry chosen for eviction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Victim {
    /// No active bundle holds this token.
    Invalid(Token),
    /// Every candidate was still valid; this one was taken anyway.
    InUse(Token),
}

impl Victim {
    pub fn token(&self) -> &Token {
        match self {
            Victim::Invalid(tok) | Victim::InUse(tok) => tok,
        }
    }

    pub fn is_in_use(&self) -> bool {
        matches!(self, Victim::InUse(_))
    }
}

/// Pick one victim among the cached tokens. Returns `None` only when there
/// are no candidates.
pub(crate) fn select_victim<'a, C>(candidates: C, registry: &TokenRegistry) -> Option<Victim>
where
    C: IntoIterator<Item = &'a Token>,
{
    let mut fallback = None;
    for tok in candidates {
        if !registry.is_valid(tok) {
            return Some(Victim::Invalid(tok.clone()));
        }
        if fallback.is_none() {
            fallback = Some(tok);
        }
    }
    fallback.map(|tok| Victim::InUse(tok.clone()))
}
