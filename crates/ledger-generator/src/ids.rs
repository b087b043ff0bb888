//! Random primary keys, timestamps, and foreign-key picks.

use chrono::{DateTime, Utc};
use ledger_core::{EntityKind, TimeWindow};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

const NANOS_PER_SECOND: u32 = 1_000_000_000;

/// Derive the seed of an independent RNG stream from the run seed.
///
/// Each entity kind draws from its own stream, so generators never share RNG
/// state and each one is reproducible on its own for a given run seed.
pub fn stream_seed(seed: u64, stream: u64) -> u64 {
    seed.wrapping_add(stream.wrapping_mul(0x9E3779B97F4A7C15))
}

fn stream_for(kind: EntityKind) -> u64 {
    match kind {
        EntityKind::Company => 1,
        EntityKind::User => 2,
        EntityKind::Transaction => 3,
    }
}

/// Generates ids and timestamps from an owned, seeded random source.
///
/// Ids are drawn from the full non-negative `i64` range with no collision check.
pub struct IdAllocator {
    rng: StdRng,
}

impl IdAllocator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Allocator for `kind`, on that kind's stream of the run seed.
    pub fn for_kind(run_seed: u64, kind: EntityKind) -> Self {
        Self::new(stream_seed(run_seed, stream_for(kind)))
    }

    /// Uniform random id in `[0, 2^63)`.
    pub fn next_id(&mut self) -> i64 {
        (self.rng.next_u64() >> 1) as i64
    }

    /// Uniform random instant in `window`, at one-second granularity.
    ///
    /// Returns `window.start` if the window holds no whole second.
    pub fn next_timestamp(&mut self, window: &TimeWindow) -> DateTime<Utc> {
        match second_bounds(window) {
            Some((lo, hi)) => {
                let secs = self.rng.gen_range(lo..hi);
                DateTime::from_timestamp(secs, 0).unwrap_or(window.start)
            }
            None => window.start,
        }
    }

    /// Like [`IdAllocator::next_timestamp`], with uniformly drawn nanoseconds added.
    ///
    /// The result still lies inside `window`.
    pub fn next_timestamp_with_jitter(&mut self, window: &TimeWindow) -> DateTime<Utc> {
        let whole = self.next_timestamp(window);
        let nanos = self.rng.gen_range(0..NANOS_PER_SECOND);
        match DateTime::from_timestamp(whole.timestamp(), nanos) {
            Some(ts) if window.contains(&ts) => ts,
            _ => whole,
        }
    }

    /// Pick one element of `pool` uniformly at random, with replacement.
    pub fn pick(&mut self, pool: &[i64]) -> Option<i64> {
        if pool.is_empty() {
            None
        } else {
            Some(pool[self.rng.gen_range(0..pool.len())])
        }
    }
}

/// Whole-second range `[lo, hi)` whose instants all fall inside `window`.
fn second_bounds(window: &TimeWindow) -> Option<(i64, i64)> {
    let mut lo = window.start.timestamp();
    if window.start.timestamp_subsec_nanos() > 0 {
        lo += 1;
    }
    let mut hi = window.end.timestamp();
    if window.end.timestamp_subsec_nanos() > 0 {
        hi += 1;
    }
    (lo < hi).then_some((lo, hi))
}
