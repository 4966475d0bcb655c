//! Voxel values and biome descriptors.
#![forbid(unsafe_code)]

pub mod biome;
pub mod block;

pub use biome::{Biome, BiomeKind};
pub use block::{Block, BlockId, BlockState};
