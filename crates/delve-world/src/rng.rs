use delve_geom::CubeCoord;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::world::WorldSeed;

#[inline]
pub(crate) fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Hash of a world seed and a cube coordinate. Seed discovery and replay both seed
/// their generators from this, so a recomputed result matches a cached one.
#[inline]
pub fn coord_hash(seed: WorldSeed, c: CubeCoord) -> u64 {
    let mut h = seed.0 ^ 0x9e37_79b9_7f4a_7c15;
    h = mix64(h ^ (c.cx as u32 as u64).wrapping_mul(0x85eb_ca6b));
    h = mix64(h ^ (c.cy as u32 as u64).wrapping_mul(0xc2b2_ae35));
    h = mix64(h ^ (c.cz as u32 as u64).wrapping_mul(0x27d4_eb2f));
    h
}

/// Deterministic random stream for one generation step.
#[derive(Clone, Debug)]
pub struct CoordRng(ChaCha8Rng);

impl CoordRng {
    #[inline]
    pub fn from_seed(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }

    #[inline]
    pub fn for_cube(seed: WorldSeed, c: CubeCoord) -> Self {
        Self::from_seed(coord_hash(seed, c))
    }

    /// Uniform in `0..n`; 0 when `n` is 0.
    #[inline]
    pub fn below(&mut self, n: u32) -> u32 {
        if n == 0 { 0 } else { self.0.random_range(0..n) }
    }

    #[inline]
    pub fn one_in(&mut self, n: u32) -> bool {
        self.below(n) == 0
    }

    /// Uniform in `[0, 1)`.
    #[inline]
    pub fn f32(&mut self) -> f32 {
        self.0.random::<f32>()
    }

    #[inline]
    pub fn f64(&mut self) -> f64 {
        self.0.random::<f64>()
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        self.0.next_u64()
    }
}
