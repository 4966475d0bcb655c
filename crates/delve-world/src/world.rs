use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::worldgen::GenParams;

/// The world seed every generator derives its randomness from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldSeed(pub u64);

impl WorldSeed {
    /// Independent 64-bit stream for `salt`.
    #[inline]
    pub fn derive(self, salt: u64) -> u64 {
        crate::rng::mix64(self.0 ^ crate::rng::mix64(salt.wrapping_add(0x9e37_79b9_7f4a_7c15)))
    }

    /// 32-bit seed for noise samplers.
    #[inline]
    pub fn noise_seed(self, salt: i32) -> i32 {
        self.derive(salt as u32 as u64) as i32
    }
}

/// Identifies one loaded world (dimension) within a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorldId(pub u32);

/// Everything generation needs to know about a world, built once per world load
/// and passed by reference.
#[derive(Clone, Debug)]
pub struct WorldCtx {
    pub id: WorldId,
    pub seed: WorldSeed,
    pub params: Arc<GenParams>,
}

impl WorldCtx {
    pub fn new(id: WorldId, seed: WorldSeed, params: Arc<GenParams>) -> Self {
        Self { id, seed, params }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(WorldId(0), WorldSeed(seed), Arc::new(GenParams::default()))
    }

    /// Same world identity and settings, different seed.
    pub fn reseeded(&self, seed: WorldSeed) -> Self {
        Self {
            seed,
            ..self.clone()
        }
    }
}
