// src/roulette/procedural.rs
//! Seeded value generation keyed by a point or a scalar.
//! Every call is a pure function of (seed, key): a fresh ChaCha stream is built
//! per call, so nothing here needs locking.

use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

// ---------- Seed ----------

/// Session seed; the root of every deterministic derivation.
#[derive(Resource, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouletteSeed(pub i32);

impl RouletteSeed {
    /// Fresh session seed from the thread RNG (product of two draws).
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let a: i32 = rng.random_range(0..=i32::from(i16::MAX));
        let b: i32 = rng.random_range(0..=i32::from(i16::MAX));
        let seed = Self(a.wrapping_mul(b));
        debug!("Generated session seed {}", seed.0);
        seed
    }
}

// ---------- Hashing ----------

/// Lattice hash of a point: floor each axis, scale by a per-axis odd prime,
/// fold with shifted XOR.
pub fn hash_point(p: Vec3) -> i32 {
    let x = (p.x.floor() as i32).wrapping_mul(73_856_093);
    let y = (p.y.floor() as i32).wrapping_mul(19_349_663);
    let z = (p.z.floor() as i32).wrapping_mul(83_492_791);
    x ^ (y << 1) ^ (z << 2)
}

/// Xorshift-style mix of the raw float bits.
pub fn hash_scalar(v: f32) -> i32 {
    let bits = v.to_bits() as i32;
    let folded = bits ^ (bits << 13) ^ (bits >> 17) ^ (bits << 5);

    // Odd multiplier spreads the low bits upward.
    let mut mixed = (folded as u32).wrapping_mul(0x9E37_79B9) as i32;
    mixed ^= mixed << 11;
    mixed ^= mixed >> 19;
    mixed ^= mixed << 7;
    mixed
}

// ---------- Generator ----------

#[derive(Clone, Copy, Debug)]
pub struct ProceduralGenerator {
    seed: RouletteSeed,
}

impl ProceduralGenerator {
    pub const fn new(seed: RouletteSeed) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> RouletteSeed {
        self.seed
    }

    #[inline]
    fn stream_for(&self, key_hash: i32) -> ChaCha8Rng {
        let combined = self.seed.0 ^ key_hash;
        ChaCha8Rng::seed_from_u64(u64::from(combined as u32))
    }

    /// Sequential stream keyed by the seed alone (shuffles draw from this).
    pub fn sequence(&self) -> ChaCha8Rng {
        self.stream_for(0)
    }

    pub fn range_int_by_point(&self, key: Vec3, min: i32, max_inclusive: i32) -> i32 {
        if max_inclusive <= min {
            return min;
        }
        self.stream_for(hash_point(key)).random_range(min..=max_inclusive)
    }

    pub fn range_float_by_point(&self, key: Vec3, min: f32, max_inclusive: f32) -> f32 {
        if !(max_inclusive > min) {
            return min;
        }
        self.stream_for(hash_point(key)).random_range(min..=max_inclusive)
    }

    pub fn range_int_by_scalar(&self, key: f32, min: i32, max_inclusive: i32) -> i32 {
        if max_inclusive <= min {
            return min;
        }
        self.stream_for(hash_scalar(key)).random_range(min..=max_inclusive)
    }

    pub fn range_float_by_scalar(&self, key: f32, min: f32, max_inclusive: f32) -> f32 {
        if !(max_inclusive > min) {
            return min;
        }
        self.stream_for(hash_scalar(key)).random_range(min..=max_inclusive)
    }
}

/// Seeded Fisher-Yates over the sequential stream of `generator`.
pub fn shuffle_in_place<T>(items: &mut [T], generator: &ProceduralGenerator) {
    let mut rng = generator.sequence();
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}
