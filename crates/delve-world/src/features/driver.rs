use std::time::{Duration, Instant};

use delve_cache::{
    ArenaStats, ObjectPool, PoolStats, SlotArena, SlotHandle, TieredCache, TieredCacheStats,
};
use delve_cube::CubeVoxels;
use delve_geom::CubeCoord;

use super::node::{FeatureNode, materialize, release_tree, visit_affecting};
use super::{FeatureGenerator, SeedGenerator};
use crate::biome::BiomeSource;
use crate::rng::CoordRng;
use crate::world::{WorldCtx, WorldSeed};
use crate::worldgen::GenParams;

/// `(seed epoch, cube)`. Keyed on the full coordinate so cubes past the packed
/// range never share an entry.
type GenKey = (u64, CubeCoord);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FeatureStats {
    pub cubes: u64,
    pub seed_lists: u64,
    pub seeds: u64,
    pub trees_built: u64,
    pub trees_released: u64,
    pub voxels_written: u64,
    pub epoch: u64,
    pub seed_cache: TieredCacheStats,
    pub tree_cache: TieredCacheStats,
    pub arena: ArenaStats,
    pub scratch: PoolStats,
}

impl FeatureStats {
    /// Add `o` into these totals; the epoch keeps the larger of the two.
    pub fn merge(&mut self, o: &Self) {
        self.cubes += o.cubes;
        self.seed_lists += o.seed_lists;
        self.seeds += o.seeds;
        self.trees_built += o.trees_built;
        self.trees_released += o.trees_released;
        self.voxels_written += o.voxels_written;
        self.epoch = self.epoch.max(o.epoch);
        self.seed_cache.merge(&o.seed_cache);
        self.tree_cache.merge(&o.tree_cache);
        self.arena.merge(&o.arena);
        self.scratch.merge(&o.scratch);
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Counters {
    cubes: u64,
    seed_lists: u64,
    seeds: u64,
    trees_built: u64,
    trees_released: u64,
    voxels_written: u64,
}

/// Drives one [`FeatureGenerator`]: caches seed lists and materialized trees per
/// neighbour cube and replays whatever reaches the cube being generated.
///
/// Owned by one generation thread.
pub struct FeatureDriver<G: FeatureGenerator> {
    generator: G,
    remembered_seed: Option<WorldSeed>,
    epoch: u64,
    seeds: TieredCache<GenKey, Box<[G::Seed]>>,
    trees: TieredCache<GenKey, Box<[SlotHandle]>>,
    arena: SlotArena<FeatureNode<G::Seed>>,
    scratch: ObjectPool<Vec<G::Seed>>,
    release_stack: Vec<SlotHandle>,
    counters: Counters,
}

impl<G: FeatureGenerator> FeatureDriver<G> {
    pub fn new(generator: G, tiers: &[Duration], pool_capacity: usize) -> Self {
        Self {
            generator,
            remembered_seed: None,
            epoch: 0,
            seeds: TieredCache::new(tiers),
            trees: TieredCache::new(tiers),
            arena: SlotArena::new(),
            scratch: ObjectPool::with_default(pool_capacity),
            release_stack: Vec::new(),
            counters: Counters::default(),
        }
    }

    pub fn from_params(generator: G, params: &GenParams) -> Self {
        Self::new(generator, &params.cache_tiers, params.pool_capacity)
    }

    #[inline]
    pub fn generator(&self) -> &G {
        &self.generator
    }

    #[inline]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Replay every feature reaching `cube`. Returns the number of voxels written.
    pub fn generate<V: CubeVoxels, B: BiomeSource>(
        &mut self,
        world: &WorldCtx,
        cube: &mut V,
        biomes: &B,
    ) -> usize {
        self.generate_at(world, cube, biomes, Instant::now())
    }

    /// [`FeatureDriver::generate`] with an explicit clock for cache expiry.
    pub fn generate_at<V: CubeVoxels, B: BiomeSource>(
        &mut self,
        world: &WorldCtx,
        cube: &mut V,
        biomes: &B,
        now: Instant,
    ) -> usize {
        self.sync_seed(world.seed);
        self.expire(now);

        let Self {
            generator,
            epoch,
            seeds,
            trees,
            arena,
            scratch,
            counters,
            ..
        } = self;
        let target = cube.coord();
        let mut rng = CoordRng::for_cube(world.seed, target);
        let mut written = 0;
        for n in target.neighborhood(generator.range()) {
            let key = (*epoch, n);
            let list = seeds.get_or_insert_with(key, now, |_| {
                counters.seed_lists += 1;
                discover(generator, scratch, world, n)
            });
            if list.is_empty() {
                continue;
            }
            counters.seeds += list.len() as u64;
            let roots = trees.get_or_insert_with(key, now, |_| {
                counters.trees_built += list.len() as u64;
                list.iter()
                    .map(|&s| materialize(arena, s, |b| generator.materialize(world, s, b)))
                    .collect()
            });
            for &root in roots.iter() {
                visit_affecting(arena, root, target, &mut |node| {
                    if let Some(bucket) = node.bucket(target) {
                        written += generator.replay(world, bucket, cube, biomes, &mut rng);
                    }
                });
            }
        }
        counters.cubes += 1;
        counters.voxels_written += written as u64;
        written
    }

    /// Seed list of one cube, discovered or from cache.
    pub fn seeds_at(&mut self, world: &WorldCtx, cube: CubeCoord, now: Instant) -> &[G::Seed] {
        self.sync_seed(world.seed);
        let Self {
            generator,
            epoch,
            seeds,
            scratch,
            counters,
            ..
        } = self;
        seeds.get_or_insert_with((*epoch, cube), now, |_| {
            counters.seed_lists += 1;
            discover(generator, scratch, world, cube)
        })
    }

    /// Drop every cached seed list and tree without recycling anything, and start a
    /// new epoch.
    pub fn invalidate(&mut self) {
        self.seeds.clear();
        self.trees.clear();
        self.arena.clear();
        self.epoch += 1;
    }

    /// Promote or release cache entries whose window has run out.
    pub fn expire(&mut self, now: Instant) {
        let Self {
            seeds,
            trees,
            arena,
            release_stack,
            counters,
            ..
        } = self;
        seeds.maybe_expire(now, |_, _| ());
        trees.maybe_expire(now, |_, roots| {
            for &root in roots.iter() {
                release_tree(arena, root, release_stack);
                counters.trees_released += 1;
            }
        });
    }

    pub fn stats(&self) -> FeatureStats {
        let c = self.counters;
        FeatureStats {
            cubes: c.cubes,
            seed_lists: c.seed_lists,
            seeds: c.seeds,
            trees_built: c.trees_built,
            trees_released: c.trees_released,
            voxels_written: c.voxels_written,
            epoch: self.epoch,
            seed_cache: self.seeds.stats(),
            tree_cache: self.trees.stats(),
            arena: self.arena.stats(),
            scratch: self.scratch.stats(),
        }
    }

    fn sync_seed(&mut self, seed: WorldSeed) {
        if self.remembered_seed == Some(seed) {
            return;
        }
        if let Some(old) = self.remembered_seed {
            log::info!(
                target: "features",
                "world seed changed ({} -> {}), dropping {} seed lists and {} trees",
                old.0,
                seed.0,
                self.seeds.len(),
                self.trees.len()
            );
        }
        self.invalidate();
        self.remembered_seed = Some(seed);
    }
}

fn discover<G: SeedGenerator>(
    generator: &G,
    scratch: &ObjectPool<Vec<G::Seed>>,
    world: &WorldCtx,
    cube: CubeCoord,
) -> Box<[G::Seed]> {
    let mut out = scratch.take();
    let mut rng = CoordRng::for_cube(world.seed, cube);
    generator.discover(world, cube, &mut rng, &mut out);
    let list: Box<[G::Seed]> = out.as_slice().into();
    scratch.put(out);
    list
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use delve_blocks::{Biome, Block};
    use delve_cube::CubeBuf;

    use super::*;
    use crate::features::{FeatureBuilder, FeatureGenerator};

    /// One seed per cube with even `cx`; writes a single voxel in the next cube over.
    struct Marker {
        discovered: Cell<usize>,
    }

    impl SeedGenerator for Marker {
        type Seed = (i32, i32, i32);

        fn range(&self) -> i32 {
            1
        }

        fn discover(&self, _: &WorldCtx, c: CubeCoord, _: &mut CoordRng, out: &mut Vec<Self::Seed>) {
            self.discovered.set(self.discovered.get() + 1);
            if c.cx % 2 == 0 {
                out.push(c.into());
            }
        }
    }

    impl FeatureGenerator for Marker {
        fn materialize(&self, _: &WorldCtx, s: Self::Seed, b: &mut FeatureBuilder<'_, Self::Seed>) {
            let (bx, by, bz) = CubeCoord::from(s).offset(1, 0, 0).min_block();
            b.set(bx + 3, by + 3, bz + 3, Block::GRAVEL);
        }
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn writes_cross_into_neighbour() {
        let world = WorldCtx::with_seed(5);
        let mut d = FeatureDriver::new(Marker { discovered: Cell::new(0) }, &[ms(100)], 4);
        let mut odd = CubeBuf::new(CubeCoord::new(1, 0, 0));
        assert_eq!(d.generate(&world, &mut odd, &Biome::PLAINS), 1);
        assert_eq!(odd.get(3, 3, 3), Block::GRAVEL);

        let mut even = CubeBuf::new(CubeCoord::new(2, 0, 0));
        assert_eq!(d.generate(&world, &mut even, &Biome::PLAINS), 0);
        assert_eq!(d.stats().cubes, 2);
    }

    #[test]
    fn unread_trees_are_released_on_expiry() {
        let world = WorldCtx::with_seed(5);
        let mut d = FeatureDriver::new(Marker { discovered: Cell::new(0) }, &[ms(10)], 4);
        let t0 = Instant::now();
        let mut cube = CubeBuf::new(CubeCoord::new(1, 0, 0));
        d.generate_at(&world, &mut cube, &Biome::PLAINS, t0);
        let built = d.stats().arena.live;
        assert!(built > 0);

        d.expire(t0 + ms(10));
        let s = d.stats();
        assert_eq!(s.arena.live, 0);
        assert_eq!(s.trees_released as usize, built);
        assert!(s.tree_cache.expiries > 0);
    }

    #[test]
    fn seed_change_starts_new_epoch() {
        let world = WorldCtx::with_seed(5);
        let mut d = FeatureDriver::new(Marker { discovered: Cell::new(0) }, &[ms(1000)], 4);
        let t0 = Instant::now();
        d.seeds_at(&world, CubeCoord::new(0, 0, 0), t0);
        d.seeds_at(&world, CubeCoord::new(0, 0, 0), t0);
        assert_eq!(d.generator().discovered.get(), 1);
        let first_epoch = d.epoch();

        d.seeds_at(&world.reseeded(WorldSeed(6)), CubeCoord::new(0, 0, 0), t0);
        assert_eq!(d.generator().discovered.get(), 2);
        assert_eq!(d.epoch(), first_epoch + 1);
        assert_eq!(d.stats().seed_cache.clears, 2);
    }

    #[test]
    fn merged_stats_add_every_counter() {
        let world = WorldCtx::with_seed(5);
        let t0 = Instant::now();
        let mut a = FeatureDriver::new(Marker { discovered: Cell::new(0) }, &[ms(10)], 4);
        let mut b = FeatureDriver::new(Marker { discovered: Cell::new(0) }, &[ms(10)], 4);
        a.generate_at(&world, &mut CubeBuf::new(CubeCoord::new(1, 0, 0)), &Biome::PLAINS, t0);
        a.expire(t0 + ms(10));
        b.generate_at(&world, &mut CubeBuf::new(CubeCoord::new(5, 0, 0)), &Biome::PLAINS, t0);
        b.invalidate();
        let (sa, sb) = (a.stats(), b.stats());

        let mut total = FeatureStats::default();
        total.merge(&sa);
        assert_eq!(total, sa);
        total.merge(&sb);
        assert_eq!(total.tree_cache.expiries, sa.tree_cache.expiries + sb.tree_cache.expiries);
        assert_eq!(total.seed_cache.clears, sa.seed_cache.clears + sb.seed_cache.clears);
        assert_eq!(total.arena.allocated, sa.arena.allocated + sb.arena.allocated);
        assert_eq!(total.arena.recycled, sa.arena.recycled);
        assert_eq!(total.scratch.created, sa.scratch.created + sb.scratch.created);
        assert_eq!(total.trees_released, sa.trees_released);
        assert_eq!(total.epoch, sb.epoch);
    }
}
