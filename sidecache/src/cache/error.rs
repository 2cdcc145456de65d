//! Side input cache errors.

use thiserror::Error;

/// Errors that can occur when building a side input cache.
///
/// Construction is the only fallible step. Every other abnormal condition
/// (unknown identity, invalid token, unmatched release) degrades to a miss
/// or a no-op.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Capacity must hold at least one entry.
    #[error("capacity must be a positive integer, got {capacity}")]
    InvalidCapacity { capacity: usize },
}
