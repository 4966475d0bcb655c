use std::sync::Arc;
use std::time::Duration;

use delve_cube::CubeVoxels;
use delve_geom::CubeCoord;
use delve_world::{
    BiomeSource, CaveGenerator, FeatureDriver, FeatureStats, GenParams, LayerSet,
    PocketGenerator, WorldCtx, WorldId, WorldSeed,
};
use hashbrown::HashMap;

use crate::precalc::{NoisePrecalc, PrecalcStats};
use crate::terrain::DensityTerrain;

#[derive(Clone, Copy, Debug, Default)]
pub struct PipelineStats {
    pub cubes: u64,
    pub pregenerated: u64,
    pub carved: u64,
    pub pocket_voxels: u64,
    pub worlds: usize,
    pub caves: FeatureStats,
    pub pockets: FeatureStats,
    pub precalc: PrecalcStats,
}

/// Samplers and feature caches of one loaded world.
struct WorldState {
    seed: WorldSeed,
    layers: Arc<LayerSet>,
    terrain: DensityTerrain,
    caves: Option<FeatureDriver<CaveGenerator>>,
    pockets: Option<FeatureDriver<PocketGenerator>>,
}

impl WorldState {
    fn new(world: &WorldCtx) -> Self {
        let params = &world.params;
        let layers = Arc::new(LayerSet::new(world));
        let terrain = DensityTerrain::new(&layers, params.terrain);
        let caves = params
            .caves_enable
            .then(|| FeatureDriver::from_params(CaveGenerator::from_params(params), params));
        let pockets = params
            .pockets_enable
            .then(|| FeatureDriver::from_params(PocketGenerator::from_params(params), params));
        Self {
            seed: world.seed,
            layers,
            terrain,
            caves,
            pockets,
        }
    }

    fn reseed(&mut self, world: &WorldCtx) {
        self.seed = world.seed;
        self.layers = Arc::new(LayerSet::new(world));
        self.terrain = DensityTerrain::new(&self.layers, world.params.terrain);
    }
}

/// The generation entry points: `pregenerate` hints, base terrain, then caves and
/// pockets replayed into each cube. Owned by the generation thread.
pub struct CubeGenerator {
    precalc: NoisePrecalc,
    worlds: HashMap<WorldId, WorldState>,
    cubes: u64,
    pregenerated: u64,
    carved: u64,
    pocket_voxels: u64,
}

impl CubeGenerator {
    pub fn new(params: &GenParams) -> Self {
        Self::with_precalc(NoisePrecalc::from_params(&params.precalc))
    }

    pub fn with_precalc(precalc: NoisePrecalc) -> Self {
        Self {
            precalc,
            worlds: HashMap::new(),
            cubes: 0,
            pregenerated: 0,
            carved: 0,
            pocket_voxels: 0,
        }
    }

    pub fn precalc(&self) -> &NoisePrecalc {
        &self.precalc
    }

    /// Hint that `cube` will be generated soon. Never touches voxels.
    pub fn pregenerate(&mut self, world: &WorldCtx, cube: CubeCoord) {
        if !world.params.precalc.enable {
            return;
        }
        self.pregenerated += 1;
        let layers = Arc::clone(&self.state(world).layers);
        self.precalc.submit(&layers, cube);
    }

    /// Overwrite `cube` with base density terrain.
    pub fn fill_base_terrain<V: CubeVoxels>(&mut self, world: &WorldCtx, cube: &mut V) {
        let coord = cube.coord();
        let state = self.state(world);
        let (layers, terrain) = (Arc::clone(&state.layers), state.terrain);
        let grid = self.precalc.take(&layers, coord);
        terrain.fill(&grid, cube);
        self.precalc.recycle(grid);
    }

    /// Replay caves, then fluid pockets, into a cube whose base terrain exists.
    /// Returns the number of voxels written.
    pub fn generate<V: CubeVoxels, B: BiomeSource>(
        &mut self,
        world: &WorldCtx,
        cube: &mut V,
        biomes: &B,
    ) -> usize {
        let state = self.state(world);
        let carved = state
            .caves
            .as_mut()
            .map_or(0, |d| d.generate(world, cube, biomes));
        let pocket_voxels = state
            .pockets
            .as_mut()
            .map_or(0, |d| d.generate(world, cube, biomes));
        self.cubes += 1;
        self.carved += carved as u64;
        self.pocket_voxels += pocket_voxels as u64;
        carved + pocket_voxels
    }

    /// Base terrain followed by [`CubeGenerator::generate`].
    pub fn generate_full<V: CubeVoxels, B: BiomeSource>(
        &mut self,
        world: &WorldCtx,
        cube: &mut V,
        biomes: &B,
    ) -> usize {
        self.fill_base_terrain(world, cube);
        self.generate(world, cube, biomes)
    }

    /// Drop everything held for `world`.
    pub fn unload(&mut self, world: WorldId) {
        if self.worlds.remove(&world).is_some() {
            self.precalc.clear_world(world);
            log::debug!(target: "features", "unloaded world {}", world.0);
        }
    }

    /// Wait for background precalculation. Returns false on timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.precalc.wait_idle(timeout)
    }

    pub fn stats(&self) -> PipelineStats {
        let mut caves = FeatureStats::default();
        let mut pockets = FeatureStats::default();
        for state in self.worlds.values() {
            if let Some(d) = &state.caves {
                caves.merge(&d.stats());
            }
            if let Some(d) = &state.pockets {
                pockets.merge(&d.stats());
            }
        }
        PipelineStats {
            cubes: self.cubes,
            pregenerated: self.pregenerated,
            carved: self.carved,
            pocket_voxels: self.pocket_voxels,
            worlds: self.worlds.len(),
            caves,
            pockets,
            precalc: self.precalc.stats(),
        }
    }

    fn state(&mut self, world: &WorldCtx) -> &mut WorldState {
        let state = self
            .worlds
            .entry(world.id)
            .or_insert_with(|| WorldState::new(world));
        if state.seed != world.seed {
            log::info!(
                target: "features",
                "world {} reseeded ({} -> {}), rebuilding samplers",
                world.id.0,
                state.seed.0,
                world.seed.0
            );
            state.reseed(world);
            self.precalc.clear_world(world.id);
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use delve_blocks::{Biome, Block};
    use delve_cube::CubeBuf;

    use super::*;

    fn world(seed: u64) -> WorldCtx {
        let mut p = GenParams::default();
        p.range = 2;
        p.precalc.workers = 1;
        WorldCtx::new(WorldId(0), WorldSeed(seed), Arc::new(p))
    }

    #[test]
    fn pregenerate_leaves_voxels_alone_and_warms_precalc() {
        let w = world(3);
        let mut g = CubeGenerator::new(&w.params);
        let c = CubeCoord::new(0, -1, 0);
        g.pregenerate(&w, c);
        g.pregenerate(&w, c);
        assert!(g.wait_idle(Duration::from_secs(10)));

        let mut cube = CubeBuf::new(c);
        g.fill_base_terrain(&w, &mut cube);
        let s = g.stats();
        assert_eq!(s.precalc.hits, 1);
        assert_eq!(s.precalc.misses, 0);
        assert!(cube.count(|b| b == Block::STONE) > 0);
    }

    #[test]
    fn reseed_rebuilds_samplers() {
        let w = world(3);
        let mut g = CubeGenerator::new(&w.params);
        let c = CubeCoord::new(1, -1, 0);
        g.pregenerate(&w, c);
        assert!(g.wait_idle(Duration::from_secs(10)));

        let other = w.reseeded(WorldSeed(4));
        let mut a = CubeBuf::new(c);
        g.generate_full(&other, &mut a, &Biome::PLAINS);
        // the grid computed for the old seed was dropped, not used
        assert_eq!(g.stats().precalc.hits, 0);

        let mut fresh = CubeGenerator::new(&other.params);
        let mut b = CubeBuf::new(c);
        fresh.generate_full(&other, &mut b, &Biome::PLAINS);
        assert_eq!(a.checksum(), b.checksum());
    }

    #[test]
    fn disabled_generators_write_nothing() {
        let mut p = GenParams::default();
        p.caves_enable = false;
        p.pockets_enable = false;
        let w = WorldCtx::new(WorldId(2), WorldSeed(1), Arc::new(p));
        let mut g = CubeGenerator::new(&w.params);
        let mut cube = CubeBuf::filled(CubeCoord::new(0, -3, 0), Block::STONE);
        assert_eq!(g.generate(&w, &mut cube, &Biome::PLAINS), 0);
        assert_eq!(g.stats().cubes, 1);
    }

    #[test]
    fn stats_add_up_across_worlds() {
        let a = world(3);
        let b = WorldCtx::new(WorldId(1), WorldSeed(8), Arc::clone(&a.params));
        let mut g = CubeGenerator::new(&a.params);
        let c = CubeCoord::new(0, -1, 0);
        g.generate(&a, &mut CubeBuf::filled(c, Block::STONE), &Biome::PLAINS);
        g.generate(&b, &mut CubeBuf::filled(c, Block::STONE), &Biome::PLAINS);

        let s = g.stats();
        assert_eq!(s.worlds, 2);
        assert_eq!(s.caves.cubes, 2);
        // each world's driver starts its first epoch with one clear
        assert_eq!(s.caves.seed_cache.clears, 2);
        assert_eq!(s.caves.tree_cache.clears, 2);
        assert_eq!(s.caves.scratch.created + s.caves.scratch.reused, s.caves.seed_lists);
        assert_eq!(s.caves.arena.allocated, s.caves.arena.live as u64);
    }
}
