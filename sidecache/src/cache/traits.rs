//! Capability contract for cacheable side input values.
//!
//! The cache never looks inside a value. It only needs something it can hand
//! back to a later bundle; preparing the value before reading and rewinding it
//! afterwards is the job of the code that materialized it.
//!
//! # Example
//!
//! ```
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use sidecache::cache::{InputError, ReusableInput};
//!
//! struct Materialized {
//!     values: Vec<u64>,
//!     cursor: AtomicUsize,
//! }
//!
//! impl ReusableInput for Materialized {
//!     type Value = Vec<u64>;
//!
//!     fn init(&self) -> Result<(), InputError> {
//!         self.cursor.store(0, Ordering::Relaxed);
//!         Ok(())
//!     }
//!
//!     fn value(&self) -> Vec<u64> {
//!         self.values[self.cursor.load(Ordering::Relaxed)..].to_vec()
//!     }
//!
//!     fn reset(&self) -> Result<(), InputError> {
//!         self.cursor.store(0, Ordering::Relaxed);
//!         Ok(())
//!     }
//! }
//! ```

use thiserror::Error;

/// Errors raised by a [`ReusableInput`] while preparing or rewinding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    /// The value could not be prepared for reading.
    #[error("failed to initialize side input: {0}")]
    Init(String),

    /// The value could not be rewound for reuse.
    #[error("failed to reset side input: {0}")]
    Reset(String),
}

/// A materialized side input that can be read, rewound, and read again.
///
/// Implementations must be `Send + Sync`: the same cached value may be
/// handed to bundles running on different worker threads.
pub trait ReusableInput: Send + Sync {
    /// What a reader gets out of the materialized input.
    type Value;

    /// Prepare the value before its first read in a bundle.
    fn init(&self) -> Result<(), InputError>;

    /// Read the current materialized value.
    fn value(&self) -> Self::Value;

    /// Rewind after use so the value can serve another bundle.
    fn reset(&self) -> Result<(), InputError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_display() {
        let err = InputError::Init("iterator exhausted".to_string());
        assert_eq!(
            err.to_string(),
            "failed to initialize side input: iterator exhausted"
        );

        let err = InputError::Reset("closed".to_string());
        assert!(err.to_string().contains("reset"));
    }
}
