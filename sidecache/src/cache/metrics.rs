//! Cache counters.
//!
//! Counters only ever increase and are never consulted by the cache's own
//! control flow. They live inside the cache lock alongside the registry and
//! store, so a snapshot is always consistent with the state it describes.

use std::fmt;

use serde::Serialize;

/// Point-in-time copy of the cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheMetrics {
    /// Queries answered from the cache.
    pub hits: u64,
    /// Queries for a valid token that had no cached value.
    pub misses: u64,
    /// Entries evicted because no active bundle held their token.
    pub evictions: u64,
    /// Entries evicted while still valid because the cache was full of live values.
    pub in_use_evictions: u64,
}

impl CacheMetrics {
    /// Total counted lookups (hits + misses).
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of counted lookups that hit, or 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        match self.lookups() {
            0 => 0.0,
            n => self.hits as f64 / n as f64,
        }
    }

    pub(crate) fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub(crate) fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub(crate) fn record_eviction(&mut self, in_use: bool) {
        if in_use {
            self.in_use_evictions += 1;
        } else {
            self.evictions += 1;
        }
    }
}

impl fmt::Display for CacheMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hits={} misses={} evictions={} in_use_evictions={} hit_rate={:.1}%",
            self.hits,
            self.misses,
            self.evictions,
            self.in_use_evictions,
            self.hit_rate() * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_default() {
        let metrics = CacheMetrics::default();
        assert_eq!(metrics.lookups(), 0);
        assert_eq!(metrics.hit_rate(), 0.0);
    }

    #[test]
    fn test_record_eviction_kinds() {
        let mut metrics = CacheMetrics::default();
        metrics.record_eviction(false);
        metrics.record_eviction(true);
        metrics.record_eviction(true);
        assert_eq!(metrics.evictions, 1);
        assert_eq!(metrics.in_use_evictions, 2);
    }

    #[test]
    fn test_hit_rate() {
        let mut metrics = CacheMetrics::default();
        metrics.record_hit();
        metrics.record_hit();
        metrics.record_hit();
        metrics.record_miss();
        assert_eq!(metrics.lookups(), 4);
        assert!((metrics.hit_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_metrics_display() {
        let metrics = CacheMetrics {
            hits: 3,
            misses: 1,
            evictions: 2,
            in_use_evictions: 0,
        };
        let display = metrics.to_string();
        assert!(display.contains("hits=3"));
        assert!(display.contains("evictions=2"));
        assert!(display.contains("75.0%"));
    }

    #[test]
    fn test_metrics_serialize() {
        let metrics = CacheMetrics {
            hits: 1,
            ..Default::default()
        };
        let json = serde_json::to_string(&metrics).unwrap();
        assert!(json.contains("\"hits\":1"));
        assert!(json.contains("\"in_use_evictions\":0"));
    }
}
