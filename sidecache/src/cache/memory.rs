//! In-memory side input cache shared by all bundle workers.
//!
//! The runner grants caching rights per side input by sending cache tokens
//! with each bundle request. Workers register those tokens when the bundle
//! starts, query and populate the cache while processing, and release the
//! tokens when the bundle completes.
//!
//! # Locking
//!
//! Registry, store and counters sit behind a single `parking_lot::Mutex`.
//! Every public method takes the lock for its whole duration and only does
//! in-memory map work while holding it, so operations are linearizable and
//! hold times stay short. Materialized values are never called under the lock.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sidecache::cache::{CacheToken, SideInputCache};
//!
//! let cache: SideInputCache<MaterializedIterable> = SideInputCache::new(100)?;
//! let tokens = vec![CacheToken::side_input("ParDo(Join)", "side0", "tok-17")];
//!
//! cache.set_valid_tokens(&tokens);
//! let input = match cache.query_cache("ParDo(Join)", "side0") {
//!     Some(input) => input,
//!     None => {
//!         let input = Arc::new(materialize(&state_client)?);
//!         cache.set_cache("ParDo(Join)", "side0", Arc::clone(&input));
//!         input
//!     }
//! };
//! // ... process the bundle ...
//! cache.complete_bundle(&tokens);
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use super::error::CacheError;
use super::metrics::CacheMetrics;
use super::registry::TokenRegistry;
use super::store::CacheStore;
use super::token::CacheToken;
use super::traits::ReusableInput;
use crate::config::CacheConfig;

/// Everything guarded by the cache lock.
struct CacheState<I: ?Sized> {
    registry: TokenRegistry,
    store: CacheStore<I>,
    metrics: CacheMetrics,
}

/// Bounded, token-validated cache of materialized side inputs.
///
/// A query only hits when the runner currently considers the side input
/// cacheable, i.e. some active bundle registered a token for it. When the
/// store is full, entries whose token no bundle holds anymore are evicted
/// first; a live entry is evicted only if nothing else is left.
pub struct SideInputCache<I: ReusableInput + ?Sized> {
    state: Mutex<CacheState<I>>,
}

impl<I: ReusableInput + ?Sized> SideInputCache<I> {
    /// Create a cache holding at most `capacity` side inputs.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidCapacity`] when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, CacheError> {
        if capacity == 0 {
            return Err(CacheError::InvalidCapacity { capacity });
        }

        info!(capacity, "Side input cache initialized");

        Ok(Self {
            state: Mutex::new(CacheState {
                registry: TokenRegistry::new(),
                store: CacheStore::new(capacity),
                metrics: CacheMetrics::default(),
            }),
        })
    }

    /// Create a cache from configuration.
    pub fn from_config(config: &CacheConfig) -> Result<Self, CacheError> {
        Self::new(config.capacity)
    }

    /// Register the cache tokens of a starting bundle.
    ///
    /// Each side input token becomes authoritative for its transform and side
    /// input, and stays valid until a matching [`complete_bundle`] call. User
    /// state tokens are ignored. Passing no tokens leaves caching disabled for
    /// the bundle's side inputs.
    ///
    /// [`complete_bundle`]: Self::complete_bundle
    pub fn set_valid_tokens(&self, tokens: &[CacheToken]) {
        let mut state = self.state.lock();
        let registered = state.registry.register(tokens);
        debug!(
            registered,
            ignored = tokens.len() - registered,
            valid_tokens = state.registry.valid_token_count(),
            "Registered bundle cache tokens"
        );
    }

    /// Release the tokens registered by [`set_valid_tokens`] once the bundle
    /// has finished.
    ///
    /// Releasing a token that is not registered does nothing beyond a warning.
    ///
    /// [`set_valid_tokens`]: Self::set_valid_tokens
    pub fn complete_bundle(&self, tokens: &[CacheToken]) {
        let mut state = self.state.lock();
        let summary = state.registry.release(tokens);
        if summary.unmatched > 0 {
            warn!(
                unmatched = summary.unmatched,
                "Released cache tokens that were not registered"
            );
        }
        debug!(
            decremented = summary.decremented,
            expired = summary.expired,
            valid_tokens = state.registry.valid_token_count(),
            "Released bundle cache tokens"
        );
    }

    /// Look up a cached side input.
    ///
    /// Returns `None` when the side input is not cacheable right now (no token
    /// or an invalid one) and when nothing is cached for its token. Only the
    /// second case is counted as a miss.
    pub fn query_cache(&self, transform_id: &str, side_input_id: &str) -> Option<Arc<I>> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let Some((tok, true)) = state.registry.resolve(transform_id, side_input_id) else {
            return None;
        };

        match state.store.get(tok) {
            Some(input) => {
                state.metrics.record_hit();
                trace!(transform_id, side_input_id, token = %tok, "Side input cache hit");
                Some(input)
            }
            None => {
                state.metrics.record_miss();
                trace!(transform_id, side_input_id, token = %tok, "Side input cache miss");
                None
            }
        }
    }

    /// Offer a materialized side input for reuse by later bundles.
    ///
    /// Silently ignored when the side input has no valid token: the runner is
    /// treating it as uncacheable. When the cache is full, one entry is
    /// evicted first.
    pub fn set_cache(&self, transform_id: &str, side_input_id: &str, input: Arc<I>) {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let tok = match state.registry.resolve(transform_id, side_input_id) {
            Some((tok, true)) => tok.clone(),
            _ => {
                trace!(transform_id, side_input_id, "Side input not cacheable, skipping");
                return;
            }
        };

        if let Some(victim) = state.store.insert(tok, input, &state.registry) {
            state.metrics.record_eviction(victim.is_in_use());
            debug!(
                token = %victim.token(),
                in_use = victim.is_in_use(),
                "Evicted side input from full cache"
            );
        }
    }

    /// Whether a value is cached for a currently valid token. Does not touch
    /// the counters.
    pub fn is_cached(&self, transform_id: &str, side_input_id: &str) -> bool {
        let state = self.state.lock();
        match state.registry.resolve(transform_id, side_input_id) {
            Some((tok, true)) => state.store.contains(tok),
            _ => false,
        }
    }

    /// Snapshot of the cache counters.
    pub fn metrics(&self) -> CacheMetrics {
        self.state.lock().metrics
    }

    /// Maximum number of cached side inputs.
    pub fn capacity(&self) -> usize {
        self.state.lock().store.capacity()
    }

    /// Number of cached side inputs, including ones whose token expired.
    pub fn len(&self) -> usize {
        self.state.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of distinct tokens held by at least one active bundle.
    pub fn valid_token_count(&self) -> usize {
        self.state.lock().registry.valid_token_count()
    }
}

impl<I: ReusableInput + ?Sized> fmt::Debug for SideInputCache<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SideInputCache")
            .field("capacity", &state.store.capacity())
            .field("len", &state.store.len())
            .field("valid_tokens", &state.registry.valid_token_count())
            .field("metrics", &state.metrics)
            .finish()
    }
}
