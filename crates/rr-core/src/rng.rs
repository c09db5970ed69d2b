//! Deterministic, injectable simulation RNG.
//!
//! # Determinism strategy
//!
//! There is no global random stream.  Every component that needs randomness
//! owns a `SimRng` handed to it at construction (or on reset), seeded from a
//! `u64`.  Independent streams are derived with [`SimRng::child`], which mixes
//! an offset with the 64-bit fractional golden-ratio constant:
//!
//!   child_seed = parent.next_u64() XOR (offset * MIXING_CONSTANT)
//!
//! so the city layout, the rider stream and disruption helpers never share
//! state.  Two runs from the same seed draw identical sequences, which is
//! what lets the learned and baseline fleets be replayed against the same
//! demand realisation.

use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::Poisson;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Simulation-level RNG.
///
/// Used only in single-threaded contexts.  If you need a separate stream,
/// derive one with [`child`](Self::child).
#[derive(Clone, Debug)]
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Derive a child `SimRng` with a different seed offset.
    pub fn child(&mut self, offset: u64) -> SimRng {
        let child_seed: u64 = self.0.r#gen::<u64>() ^ offset.wrapping_mul(MIXING_CONSTANT);
        SimRng(SmallRng::seed_from_u64(child_seed))
    }

    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }

    #[inline]
    pub fn random<T>(&mut self) -> T
    where
        rand::distributions::Standard: rand::distributions::Distribution<T>,
    {
        self.0.r#gen()
    }

    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// `true` with probability `p` (clamped to [0, 1]).
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }

    /// Draw a count from Poisson(`lambda`).
    ///
    /// Constant expected cost in `lambda`.  Non-positive or non-finite rates
    /// yield 0; counts beyond `u32::MAX` saturate.
    pub fn poisson(&mut self, lambda: f64) -> u32 {
        if !lambda.is_finite() || lambda <= 0.0 {
            return 0;
        }
        match Poisson::new(lambda) {
            Ok(dist) => {
                let k: f64 = dist.sample(&mut self.0);
                k as u32
            }
            Err(_) => 0,
        }
    }

    /// Sample an index with probability proportional to `weights[i]`.
    ///
    /// Returns `None` when the weights are empty, all zero, or contain a
    /// negative / non-finite entry; callers pick their own fallback.
    pub fn weighted_index(&mut self, weights: &[f64]) -> Option<usize> {
        let dist = WeightedIndex::new(weights).ok()?;
        Some(dist.sample(&mut self.0))
    }

    /// Choose a random element from a slice.
    /// Returns `None` if the slice is empty.
    #[inline]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.0)
    }
}
