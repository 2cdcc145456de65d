//! Simulate command - run a synthetic bundle workload against the cache.
//!
//! Each bundle registers one token per side input, reads a random subset of
//! them, materializes on miss, and releases its tokens when done. Side input
//! tokens roll over to a new generation every `generation_span` bundles, so
//! older entries expire and compete with live ones for capacity.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use sidecache::cache::{CacheMetrics, CacheToken, InputError, ReusableInput, SideInputCache};
use tracing::{debug, info};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the simulate command.
pub struct SimulateArgs {
    pub capacity: Option<usize>,
    pub workers: usize,
    pub bundles: usize,
    pub transforms: usize,
    pub side_inputs: usize,
    pub generation_span: usize,
    pub elements: usize,
    pub seed: u64,
    pub json: bool,
}

/// A side input materialized into memory, read through a cursor.
struct MaterializedSideInput {
    elements: Vec<u64>,
    cursor: AtomicUsize,
}

impl MaterializedSideInput {
    fn materialize(generation: usize, elements: usize) -> Self {
        Self {
            elements: (0..elements as u64).map(|e| e + generation as u64).collect(),
            cursor: AtomicUsize::new(0),
        }
    }
}

impl ReusableInput for MaterializedSideInput {
    type Value = u64;

    fn init(&self) -> Result<(), InputError> {
        self.cursor.store(0, Ordering::Relaxed);
        Ok(())
    }

    /// Sum of the unread elements.
    fn value(&self) -> u64 {
        let start = self.cursor.swap(self.elements.len(), Ordering::Relaxed);
        self.elements.get(start..).map_or(0, |rest| rest.iter().sum())
    }

    fn reset(&self) -> Result<(), InputError> {
        self.cursor.store(0, Ordering::Relaxed);
        Ok(())
    }
}

/// Shape of the synthetic workload.
#[derive(Debug, Clone, Copy, Serialize)]
struct Workload {
    transforms: usize,
    side_inputs: usize,
    generation_span: usize,
    elements: usize,
    seed: u64,
}

impl Workload {
    fn tokens(&self, bundle: usize) -> Vec<CacheToken> {
        let generation = bundle / self.generation_span;
        let mut tokens = Vec::with_capacity(self.transforms * self.side_inputs + 1);
        for t in 0..self.transforms {
            for s in 0..self.side_inputs {
                tokens.push(CacheToken::side_input(
                    transform_id(t),
                    side_input_id(s),
                    format!("t{}-s{}-g{}", t, s, generation),
                ));
            }
        }
        // Runners also send user state tokens; the cache ignores them.
        tokens.push(CacheToken::user_state(format!("user-state-{}", bundle)));
        tokens
    }
}

fn transform_id(t: usize) -> String {
    format!("ParDo-{}", t)
}

fn side_input_id(s: usize) -> String {
    format!("side-{}", s)
}

/// Per-bundle counts, merged across workers.
#[derive(Debug, Clone, Copy, Default)]
struct BundleStats {
    reads: u64,
    materializations: u64,
}

impl BundleStats {
    fn merge(self, other: Self) -> Self {
        Self {
            reads: self.reads + other.reads,
            materializations: self.materializations + other.materializations,
        }
    }
}

/// Result printed at the end of a simulation.
#[derive(Debug, Serialize)]
struct SimulationReport {
    capacity: usize,
    workers: usize,
    bundles: usize,
    workload: Workload,
    reads: u64,
    materializations: u64,
    elapsed_ms: u64,
    cached_entries: usize,
    metrics: CacheMetrics,
}

fn run_bundle(
    cache: &SideInputCache<MaterializedSideInput>,
    workload: &Workload,
    bundle: usize,
) -> Result<BundleStats, CliError> {
    let mut rng = StdRng::seed_from_u64(workload.seed ^ bundle as u64);
    let generation = bundle / workload.generation_span;
    let tokens = workload.tokens(bundle);
    let mut stats = BundleStats::default();

    cache.set_valid_tokens(&tokens);

    for t in 0..workload.transforms {
        let transform = transform_id(t);
        for s in 0..workload.side_inputs {
            if !rng.random_bool(0.75) {
                continue;
            }
            let side_input = side_input_id(s);

            let input = match cache.query_cache(&transform, &side_input) {
                Some(input) => input,
                None => {
                    let input = Arc::new(MaterializedSideInput::materialize(
                        generation,
                        workload.elements,
                    ));
                    cache.set_cache(&transform, &side_input, Arc::clone(&input));
                    stats.materializations += 1;
                    input
                }
            };

            input.init()?;
            let _ = input.value();
            input.reset()?;
            stats.reads += 1;
        }
    }

    cache.complete_bundle(&tokens);
    debug!(bundle, reads = stats.reads, "Bundle complete");
    Ok(stats)
}

/// Run the simulate command.
pub fn run(runner: &CliRunner, args: SimulateArgs) -> Result<(), CliError> {
    runner.log_startup("simulate");

    let mut cache_config = runner.config().cache.clone();
    if let Some(capacity) = args.capacity {
        cache_config = cache_config.with_capacity(capacity);
    }
    cache_config.validate()?;

    let cache = SideInputCache::from_config(&cache_config)?;
    let workload = Workload {
        transforms: args.transforms,
        side_inputs: args.side_inputs,
        generation_span: args.generation_span.max(1),
        elements: args.elements,
        seed: args.seed,
    };

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.workers)
        .thread_name(|i| format!("bundle-worker-{}", i))
        .build()
        .map_err(|e| CliError::ThreadPool(e.to_string()))?;

    info!(
        workers = args.workers,
        bundles = args.bundles,
        capacity = cache_config.capacity,
        "Starting simulated workload"
    );

    let start = Instant::now();
    let stats = pool.install(|| {
        (0..args.bundles)
            .into_par_iter()
            .map(|bundle| run_bundle(&cache, &workload, bundle))
            .try_reduce(BundleStats::default, |a, b| Ok(a.merge(b)))
    })?;
    let elapsed = start.elapsed();

    let report = SimulationReport {
        capacity: cache.capacity(),
        workers: args.workers,
        bundles: args.bundles,
        workload,
        reads: stats.reads,
        materializations: stats.materializations,
        elapsed_ms: elapsed.as_millis() as u64,
        cached_entries: cache.len(),
        metrics: cache.metrics(),
    };

    info!(metrics = %report.metrics, "Simulated workload finished");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &SimulationReport) {
    println!("Side input cache simulation");
    println!("  Capacity:         {}", report.capacity);
    println!("  Workers:          {}", report.workers);
    println!("  Bundles:          {}", report.bundles);
    println!("  Side input reads: {}", report.reads);
    println!("  Materializations: {}", report.materializations);
    println!("  Cached entries:   {}", report.cached_entries);
    println!("  Elapsed:          {}ms", report.elapsed_ms);
    println!();
    println!("  Hits:             {}", report.metrics.hits);
    println!("  Misses:           {}", report.metrics.misses);
    println!("  Evictions:        {}", report.metrics.evictions);
    println!("  In-use evictions: {}", report.metrics.in_use_evictions);
    println!("  Hit rate:         {:.1}%", report.metrics.hit_rate() * 100.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workload() -> Workload {
        Workload {
            transforms: 2,
            side_inputs: 2,
            generation_span: 3,
            elements: 4,
            seed: 7,
        }
    }

    #[test]
    fn test_materialized_side_input_rewinds() {
        let input = MaterializedSideInput::materialize(1, 3);
        input.init().unwrap();
        assert_eq!(input.value(), 1 + 2 + 3);
        assert_eq!(input.value(), 0, "cursor is exhausted until reset");
        input.reset().unwrap();
        assert_eq!(input.value(), 6);
    }

    #[test]
    fn test_workload_tokens_roll_over_by_generation() {
        let w = workload();
        let first = w.tokens(0);
        let same_generation = w.tokens(2);
        let next_generation = w.tokens(3);

        // 2 transforms x 2 side inputs + 1 user state token
        assert_eq!(first.len(), 5);
        assert_eq!(first[..4], same_generation[..4]);
        assert_ne!(first[0].token, next_generation[0].token);
        assert!(first[4].side_input_key().is_none());
    }

    #[test]
    fn test_run_bundle_accounts_every_read() {
        let cache = SideInputCache::new(8).unwrap();
        let w = workload();

        let mut total = BundleStats::default();
        for bundle in 0..12 {
            total = total.merge(run_bundle(&cache, &w, bundle).unwrap());
        }

        let metrics = cache.metrics();
        assert_eq!(metrics.lookups(), total.reads);
        assert_eq!(metrics.misses, total.materializations);
        assert_eq!(cache.valid_token_count(), 0);
        assert!(cache.len() <= 8);
    }
}
