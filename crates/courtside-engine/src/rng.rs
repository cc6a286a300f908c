// crates/courtside-engine/src/rng.rs
// ============================================================================
// Module: Game RNG
// Description: Single seeded PRNG with draw accounting.
// Purpose: Make every probabilistic decision reproducible from one seed.
// Dependencies: rand, sieve-logic
// ============================================================================

//! ## Overview
//! One `SmallRng` is seeded at the top of `simulate_game` and every
//! probabilistic decision in the game draws from it in a canonical order.
//! Effects that need randomness receive the same instance through the
//! [`RandomSource`] seam. Cloning or re-seeding mid-game is forbidden; the
//! draw counter is embedded in the game result as the final RNG position.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use sieve_logic::RandomSource;

// ============================================================================
// SECTION: Game RNG
// ============================================================================

/// Seeded PRNG with draw accounting.
///
/// # Invariants
/// - Constructed exactly once per game; never cloned or re-seeded.
/// - `draws` counts every unit draw, fixing the final RNG position.
#[derive(Debug)]
pub struct GameRng {
    /// Underlying small-state PRNG.
    rng: SmallRng,
    /// Unit draws consumed so far.
    draws: u64,
}

impl GameRng {
    /// Seeds the game RNG.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self { rng: SmallRng::seed_from_u64(seed), draws: 0 }
    }

    /// Returns the next unit-interval draw.
    pub fn unit(&mut self) -> f64 {
        self.draws += 1;
        self.rng.random::<f64>()
    }

    /// Returns true with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.unit() < p
    }

    /// Returns a draw in `[lo, hi)`.
    pub fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + self.unit() * (hi - lo)
    }

    /// Picks an index weighted by the given non-negative weights.
    ///
    /// Degenerate weight vectors (empty or non-positive total) fall back to
    /// index zero after consuming one draw, keeping the draw count stable.
    pub fn pick_weighted(&mut self, weights: &[f64]) -> usize {
        let total: f64 = weights.iter().map(|weight| weight.max(0.0)).sum();
        let mut draw = self.unit() * total;
        if total <= 0.0 {
            return 0;
        }
        for (index, weight) in weights.iter().enumerate() {
            let weight = weight.max(0.0);
            if draw < weight {
                return index;
            }
            draw -= weight;
        }
        weights.len().saturating_sub(1)
    }

    /// Returns the number of draws consumed.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl RandomSource for GameRng {
    fn next_unit(&mut self) -> f64 {
        self.unit()
    }
}
