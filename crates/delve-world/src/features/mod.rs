//! Seed discovery across a neighbourhood of cubes, feature materialization, and
//! per-cube replay.

mod bucket;
mod driver;
mod node;

pub use bucket::{OpBucket, VoxelOp};
pub use driver::{FeatureDriver, FeatureStats};
pub use node::{FeatureBuilder, FeatureNode, materialize, release_tree, visit_affecting};

use delve_cube::CubeVoxels;
use delve_geom::CubeCoord;

use crate::biome::BiomeSource;
use crate::rng::CoordRng;
use crate::world::WorldCtx;

/// Enumerates the feature origins of one cube.
pub trait SeedGenerator {
    /// Value-stable origin of one feature; cached, so it must not borrow world state.
    type Seed: Copy + Send + Sync + 'static;

    /// Chebyshev radius, in cubes, of neighbours whose seeds can reach a cube.
    fn range(&self) -> i32;

    /// Push the seeds of `cube` onto `out`. `rng` is seeded from the world seed and
    /// `cube` only.
    fn discover(&self, world: &WorldCtx, cube: CubeCoord, rng: &mut CoordRng, out: &mut Vec<Self::Seed>);
}

pub trait FeatureGenerator: SeedGenerator {
    /// Walk a seed once, recording every write and branch through `builder`.
    fn materialize(&self, world: &WorldCtx, seed: Self::Seed, builder: &mut FeatureBuilder<'_, Self::Seed>);

    /// Apply one node's writes for the cube being generated. Returns voxels written.
    ///
    /// `rng` is seeded from the coordinate of the cube being generated, not the
    /// cube the feature started in.
    fn replay<V: CubeVoxels, B: BiomeSource>(
        &self,
        world: &WorldCtx,
        bucket: &OpBucket,
        cube: &mut V,
        biomes: &B,
        rng: &mut CoordRng,
    ) -> usize {
        let _ = (world, biomes, rng);
        for op in bucket.ops() {
            cube.set(op.x as usize, op.y as usize, op.z as usize, op.block);
        }
        bucket.len()
    }
}
