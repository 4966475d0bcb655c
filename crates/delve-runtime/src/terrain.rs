use delve_blocks::Block;
use delve_cube::CubeVoxels;
use delve_geom::CUBE_SIZE;
use delve_world::worldgen::TerrainParams;
use delve_world::{LayerSet, NoiseGrid};

/// Base terrain from the `density` and `detail` noise layers: stone where the
/// density is positive, still water below sea level, air above it.
#[derive(Clone, Copy, Debug)]
pub struct DensityTerrain {
    density: Option<usize>,
    detail: Option<usize>,
    params: TerrainParams,
}

impl DensityTerrain {
    pub fn new(layers: &LayerSet, params: TerrainParams) -> Self {
        Self {
            density: layers.layer_index("density"),
            detail: layers.layer_index("detail"),
            params,
        }
    }

    /// Density at local voxel `(x, y, z)` of the grid's cube.
    pub fn density(&self, grid: &NoiseGrid, x: usize, y: usize, z: usize) -> f64 {
        let p = &self.params;
        let (_, by, _) = grid.cube.min_block();
        let wy = by + y as i32;
        let mut d = -f64::from(wy - p.ground_level) / p.vertical_scale;
        if let Some(i) = self.density {
            d += grid.interpolate(i, x, y, z);
        }
        if let Some(i) = self.detail {
            d += p.detail_weight * grid.interpolate(i, x, y, z);
        }
        d
    }

    /// Overwrite every voxel of `cube` from `grid`.
    pub fn fill<V: CubeVoxels>(&self, grid: &NoiseGrid, cube: &mut V) {
        let (_, by, _) = cube.coord().min_block();
        for y in 0..CUBE_SIZE {
            let below_sea = by + (y as i32) < self.params.sea_level;
            for z in 0..CUBE_SIZE {
                for x in 0..CUBE_SIZE {
                    let block = if self.density(grid, x, y, z) > 0.0 {
                        Block::STONE
                    } else if below_sea {
                        Block::WATER
                    } else {
                        Block::AIR
                    };
                    cube.set(x, y, z, block);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use delve_cube::CubeBuf;
    use delve_geom::CubeCoord;
    use delve_world::{GenParams, WorldCtx};

    use super::*;

    #[test]
    fn deep_cubes_are_solid_and_high_cubes_empty() {
        let world = WorldCtx::with_seed(11);
        let set = LayerSet::new(&world);
        let terrain = DensityTerrain::new(&set, world.params.terrain);

        let deep = CubeCoord::new(0, -20, 0);
        let mut cube = CubeBuf::new(deep);
        terrain.fill(&set.compute(deep, Vec::new()), &mut cube);
        assert_eq!(cube.count(|b| b == Block::STONE), CUBE_SIZE * CUBE_SIZE * CUBE_SIZE);

        let high = CubeCoord::new(0, 20, 0);
        let mut cube = CubeBuf::filled(high, Block::STONE);
        terrain.fill(&set.compute(high, Vec::new()), &mut cube);
        assert!(cube.iter().all(|b| b.is_air()));
    }

    #[test]
    fn open_space_below_sea_level_is_water() {
        let mut params = GenParams::default();
        params.layers.clear();
        params.terrain.ground_level = -64;
        params.terrain.sea_level = 0;
        let world = WorldCtx::new(Default::default(), Default::default(), params.into());
        let set = LayerSet::new(&world);
        let terrain = DensityTerrain::new(&set, world.params.terrain);

        let c = CubeCoord::new(0, -1, 0);
        let mut cube = CubeBuf::new(c);
        terrain.fill(&set.compute(c, Vec::new()), &mut cube);
        assert!(cube.iter().all(|b| b == Block::WATER));
    }
}
