//! Side input cache.
//!
//! Lets a worker reuse materialized side inputs across bundles instead of
//! fetching them from the runner over the state API every time. The runner
//! decides what may be cached by sending cache tokens with each bundle.
//!
//! # Architecture
//!
//! ```text
//!                       ┌───────────────────── SideInputCache (one lock) ─┐
//! set_valid_tokens ───► │ TokenRegistry   (transform, side input) → token │
//! complete_bundle  ───► │                 token → active bundle count     │
//!                       │                                                 │
//! query_cache      ───► │ CacheStore      token → Arc<value>  ──► eviction│
//! set_cache        ───► │                                                 │
//!                       │ CacheMetrics    hits / misses / evictions       │
//!                       └─────────────────────────────────────────────────┘
//! ```

mod error;
mod eviction;
mod memory;
mod metrics;
mod registry;
mod store;
mod token;
mod traits;

pub use error::CacheError;
pub use memory::SideInputCache;
pub use metrics::CacheMetrics;
pub use token::{CacheToken, IdentityKey, Token, TokenScope};
pub use traits::{InputError, ReusableInput};
