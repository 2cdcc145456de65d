//! Bounded token -> value storage.

use std::collections::HashMap;
use std::sync::Arc;

use super::eviction::{self, Victim};
use super::registry::TokenRegistry;
use super::token::Token;

/// Upper bound on slots reserved up front for very large capacities.
const PREALLOCATE_LIMIT: usize = 4096;

/// Fixed-capacity map from token to materialized value.
///
/// Values are held by shared reference; their init/reset lifecycle belongs
/// to whoever materialized them.
pub(crate) struct CacheStore<I: ?Sized> {
    capacity: usize,
    entries: HashMap<Token, Arc<I>>,
}

impl<I: ?Sized> CacheStore<I> {
    /// `capacity` must be non-zero; the caller validates it.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity.min(PREALLOCATE_LIMIT)),
        }
    }

    pub fn get(&self, tok: &Token) -> Option<Arc<I>> {
        self.entries.get(tok).cloned()
    }

    /// Insert or overwrite the value for `tok`.
    ///
    /// When the store is already at capacity exactly one entry is evicted
    /// first, chosen by [`eviction::select_victim`].
    pub fn insert(
        &mut self,
        tok: Token,
        value: Arc<I>,
        registry: &TokenRegistry,
    ) -> Option<Victim> {
        let victim = if self.entries.len() >= self.capacity {
            let victim = eviction::select_victim(self.entries.keys(), registry);
            if let Some(victim) = &victim {
                self.entries.remove(victim.token());
            }
            victim
        } else {
            None
        };
        self.entries.insert(tok, value);
        victim
    }

    pub fn contains(&self, tok: &Token) -> bool {
        self.entries.contains_key(tok)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::token::CacheToken;

    #[test]
    fn test_insert_below_capacity_does_not_evict() {
        let registry = TokenRegistry::new();
        let mut store: CacheStore<str> = CacheStore::new(2);

        assert!(store.insert(Token::new("A"), Arc::from("a"), &registry).is_none());
        assert!(store.insert(Token::new("B"), Arc::from("b"), &registry).is_none());
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&Token::new("A")).as_deref(), Some("a"));
    }

    #[test]
    fn test_insert_at_capacity_evicts_one() {
        let registry = TokenRegistry::new();
        let mut store: CacheStore<str> = CacheStore::new(1);

        store.insert(Token::new("A"), Arc::from("a"), &registry);
        let victim = store.insert(Token::new("B"), Arc::from("b"), &registry);

        assert_eq!(victim, Some(Victim::Invalid(Token::new("A"))));
        assert_eq!(store.len(), 1);
        assert!(!store.contains(&Token::new("A")));
        assert!(store.contains(&Token::new("B")));
    }

    #[test]
    fn test_overwrite_at_capacity_still_evicts() {
        let mut registry = TokenRegistry::new();
        registry.register(&[CacheToken::side_input("t", "s", "A")]);
        let mut store: CacheStore<str> = CacheStore::new(1);

        store.insert(Token::new("A"), Arc::from("a1"), &registry);
        let victim = store.insert(Token::new("A"), Arc::from("a2"), &registry);

        assert_eq!(victim, Some(Victim::InUse(Token::new("A"))));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&Token::new("A")).as_deref(), Some("a2"));
    }
}
