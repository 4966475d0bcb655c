//! World context, generation settings, and cross-cube feature generation.
#![forbid(unsafe_code)]

pub mod biome;
pub mod error;
pub mod features;
pub mod generation;
pub mod noise;
pub mod rng;
pub mod world;
pub mod worldgen;

pub use biome::{BiomeFn, BiomeSource};
pub use error::ConfigError;
pub use features::{FeatureDriver, FeatureGenerator, FeatureStats, SeedGenerator};
pub use generation::{CaveGenerator, CaveKind, CaveSeed, PocketGenerator, PocketSeed};
pub use noise::{LayerSet, NoiseGrid, NoiseLayer};
pub use rng::{CoordRng, coord_hash};
pub use world::{WorldCtx, WorldId, WorldSeed};
pub use worldgen::{GenConfig, GenParams, load_config_from_path, load_params_from_path};
