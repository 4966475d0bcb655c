use delve_blocks::Block;
use delve_cube::CubeVoxels;
use delve_geom::{CUBE_SIZE_I32, CubeCoord, Vec3d};

use crate::biome::BiomeSource;
use crate::features::{FeatureBuilder, FeatureGenerator, OpBucket, SeedGenerator};
use crate::rng::CoordRng;
use crate::world::WorldCtx;
use crate::worldgen::{GenParams, PocketParams};

/// A buried fluid ellipsoid, centred anywhere in its cube.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PocketSeed {
    pub center: Vec3d,
    pub radius: f64,
    pub y_scale: f64,
    pub fluid: Block,
}

/// Rare water or lava pockets. Radii never exceed one cube, so seeds only reach
/// direct neighbours.
#[derive(Clone, Debug)]
pub struct PocketGenerator {
    params: PocketParams,
}

impl PocketGenerator {
    pub fn new(params: PocketParams) -> Self {
        Self { params }
    }

    pub fn from_params(params: &GenParams) -> Self {
        Self::new(params.pockets)
    }
}

impl SeedGenerator for PocketGenerator {
    type Seed = PocketSeed;

    fn range(&self) -> i32 {
        1
    }

    fn discover(&self, _world: &WorldCtx, cube: CubeCoord, rng: &mut CoordRng, out: &mut Vec<PocketSeed>) {
        let p = &self.params;
        if !rng.one_in(p.rarity) {
            return;
        }
        let (bx, by, bz) = cube.min_block();
        let size = f64::from(CUBE_SIZE_I32);
        let center = Vec3d::new(
            f64::from(bx) + rng.f64() * size,
            f64::from(by) + rng.f64() * size,
            f64::from(bz) + rng.f64() * size,
        );
        let radius = p.min_radius + rng.f64() * (p.max_radius - p.min_radius);
        out.push(PocketSeed {
            center,
            radius,
            y_scale: p.y_scale,
            fluid: p.fluid,
        });
    }
}

impl FeatureGenerator for PocketGenerator {
    fn materialize(&self, _world: &WorldCtx, seed: PocketSeed, b: &mut FeatureBuilder<'_, PocketSeed>) {
        let c = seed.center;
        let (r, ry) = (seed.radius, seed.radius * seed.y_scale);
        let lo = Vec3d::new(c.x - r, c.y - ry, c.z - r).floor_i32();
        let hi = Vec3d::new(c.x + r, c.y + ry, c.z + r).floor_i32();
        for wy in lo.1..=hi.1 {
            let dy = (f64::from(wy) + 0.5 - c.y) / ry;
            for wz in lo.2..=hi.2 {
                let dz = (f64::from(wz) + 0.5 - c.z) / r;
                for wx in lo.0..=hi.0 {
                    let dx = (f64::from(wx) + 0.5 - c.x) / r;
                    if dx * dx + dy * dy + dz * dz < 1.0 {
                        b.set(wx, wy, wz, seed.fluid);
                    }
                }
            }
        }
    }

    // Pockets only fill solid stone so they never leak into caves or open air.
    fn replay<V: CubeVoxels, B: BiomeSource>(
        &self,
        _world: &WorldCtx,
        bucket: &OpBucket,
        cube: &mut V,
        _biomes: &B,
        _rng: &mut CoordRng,
    ) -> usize {
        let mut written = 0;
        for op in bucket.ops() {
            let (x, y, z) = (op.x as usize, op.y as usize, op.z as usize);
            if cube.get(x, y, z).id == Block::STONE.id {
                cube.set(x, y, z, op.block);
                written += 1;
            }
        }
        written
    }
}
