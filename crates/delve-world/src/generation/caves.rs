//! Branching tunnel walker.
//!
//! A cave seed is a start point plus heading. Materializing it marches the point for
//! a number of steps proportional to the feature range, wobbling yaw and pitch with
//! decaying random impulses and carving an ellipsoid around the point at each step.
//! The radius follows a sine envelope over the walk. Somewhere in the second quarter
//! a large tunnel splits into two branches heading off at right angles and stops.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use delve_blocks::Block;
use delve_cube::CubeVoxels;
use delve_geom::{CUBE_SIZE_I32, CubeCoord, Vec3d};

use super::carve::{can_carve, perimeter_water};
use crate::biome::BiomeSource;
use crate::features::{FeatureBuilder, FeatureGenerator, OpBucket, SeedGenerator};
use crate::rng::CoordRng;
use crate::world::WorldCtx;
use crate::worldgen::{CaveParams, GenParams};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaveKind {
    Tunnel,
    /// One wide ellipsoid at the middle of the envelope; never branches.
    Cavern,
    /// Spawned by a tunnel; never branches again.
    Branch,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaveSeed {
    pub origin: Vec3d,
    pub yaw: f32,
    pub pitch: f32,
    pub size: f32,
    pub kind: CaveKind,
    pub start_step: u32,
    /// Walk length; 0 lets the walk pick one from the feature range.
    pub max_steps: u32,
    pub y_scale: f64,
    pub rng_seed: u64,
}

#[derive(Clone, Debug)]
pub struct CaveGenerator {
    range: i32,
    params: CaveParams,
}

impl CaveGenerator {
    pub fn new(range: i32, params: CaveParams) -> Self {
        Self { range, params }
    }

    pub fn from_params(params: &GenParams) -> Self {
        Self::new(params.range, params.caves.clone())
    }

    #[inline]
    pub fn params(&self) -> &CaveParams {
        &self.params
    }

    /// Longest walk a seed can take and still reach every cube within range.
    #[inline]
    fn walk_span(&self) -> u32 {
        (self.range * CUBE_SIZE_I32 - CUBE_SIZE_I32).max(0) as u32
    }

    fn tunnel(&self, origin: Vec3d, rng: &mut CoordRng) -> CaveSeed {
        let yaw = rng.f32() * TAU;
        let pitch = (rng.f32() - 0.5) * 2.0 / 8.0;
        let mut size = rng.f32() * 2.0 + rng.f32();
        if rng.one_in(self.params.size_boost_rarity) {
            let (a, b) = (rng.f32(), rng.f32());
            size *= a * b * 3.0 + 1.0;
        }
        CaveSeed {
            origin,
            yaw,
            pitch,
            size,
            kind: CaveKind::Tunnel,
            start_step: 0,
            max_steps: 0,
            y_scale: self.params.tunnel_y_scale,
            rng_seed: rng.next_u64(),
        }
    }

    fn walk(&self, seed: CaveSeed, b: &mut FeatureBuilder<'_, CaveSeed>) {
        let mut walker = Walker::new(self, &seed);
        while let Some(s) = walker.advance(&self.params) {
            match s.action {
                StepAction::Branch => {
                    for turn in [-FRAC_PI_2, FRAC_PI_2] {
                        let child = walker.branch(&s, turn, self.params.tunnel_y_scale);
                        b.branch(child, |cb| self.walk(child, cb));
                    }
                }
                StepAction::Carve => self.carve(b, s.pos, s.radius_xz, s.radius_y),
                StepAction::Skip => {}
            }
        }
    }

    fn carve(&self, b: &mut FeatureBuilder<'_, CaveSeed>, at: Vec3d, rxz: f64, ry: f64) {
        let p = &self.params;
        let lo = Vec3d::new(at.x - rxz, at.y - ry, at.z - rxz).floor_i32();
        let hi = Vec3d::new(at.x + rxz, at.y + ry, at.z + rxz).floor_i32();
        for wy in lo.1..=hi.1 {
            let dy = (f64::from(wy) + 0.5 - at.y) / ry;
            if dy <= p.floor_cutoff {
                continue;
            }
            let fill = match p.lava_level {
                Some(level) if wy < level => Block::LAVA,
                _ => Block::AIR,
            };
            for wz in lo.2..=hi.2 {
                let dz = (f64::from(wz) + 0.5 - at.z) / rxz;
                for wx in lo.0..=hi.0 {
                    let dx = (f64::from(wx) + 0.5 - at.x) / rxz;
                    if dx * dx + dy * dy + dz * dz < 1.0 {
                        b.set(wx, wy, wz, fill);
                    }
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StepAction {
    Carve,
    Skip,
    /// Split into two branches here; the walk ends.
    Branch,
}

/// One step of a walk: where it is, its heading after the step, and what it does there.
#[derive(Clone, Copy, Debug)]
struct WalkStep {
    step: u32,
    pos: Vec3d,
    yaw: f32,
    pitch: f32,
    radius_xz: f64,
    radius_y: f64,
    action: StepAction,
}

/// Position and heading of one walk, advanced a step at a time from the seed's stream.
struct Walker {
    rng: CoordRng,
    kind: CaveKind,
    size: f32,
    y_scale: f64,
    step: u32,
    max: u32,
    branch_step: u32,
    steep: bool,
    pos: Vec3d,
    yaw: f32,
    pitch: f32,
    yaw_change: f32,
    pitch_change: f32,
}

impl Walker {
    fn new(g: &CaveGenerator, seed: &CaveSeed) -> Self {
        let mut rng = CoordRng::from_seed(seed.rng_seed);
        let max = if seed.max_steps > 0 {
            seed.max_steps
        } else {
            let span = g.walk_span();
            span - rng.below(span / 4)
        };
        let step = match seed.kind {
            CaveKind::Cavern => max / 2,
            _ => seed.start_step,
        };
        let branch_step = rng.below(max / 2) + max / 4;
        let steep = rng.one_in(g.params.steep_rarity);
        Self {
            rng,
            kind: seed.kind,
            size: seed.size,
            y_scale: seed.y_scale,
            step,
            max,
            branch_step,
            steep,
            pos: seed.origin,
            yaw: seed.yaw,
            pitch: seed.pitch,
            yaw_change: 0.0,
            pitch_change: 0.0,
        }
    }

    fn advance(&mut self, p: &CaveParams) -> Option<WalkStep> {
        if self.step >= self.max {
            return None;
        }
        let envelope = (self.step as f32 * PI / self.max as f32).sin() * self.size;
        let radius_xz = p.min_radius + f64::from(envelope);
        let radius_y = radius_xz * self.y_scale;

        self.pos += Vec3d::from_angles(self.yaw, self.pitch);
        self.pitch *= if self.steep { 0.92 } else { 0.7 };
        self.pitch += self.pitch_change * 0.1;
        self.yaw += self.yaw_change * 0.1;
        self.pitch_change *= 0.9;
        self.yaw_change *= 0.75;
        let (a, c, d) = (self.rng.f32(), self.rng.f32(), self.rng.f32());
        self.pitch_change += (a - c) * d * 2.0;
        let (a, c, d) = (self.rng.f32(), self.rng.f32(), self.rng.f32());
        self.yaw_change += (a - c) * d * 4.0;

        let action = if self.kind == CaveKind::Tunnel && self.step == self.branch_step && self.size > 1.0 {
            StepAction::Branch
        } else if self.kind == CaveKind::Cavern || !self.rng.one_in(p.carve_skip_rarity) {
            StepAction::Carve
        } else {
            StepAction::Skip
        };
        let out = WalkStep {
            step: self.step,
            pos: self.pos,
            yaw: self.yaw,
            pitch: self.pitch,
            radius_xz,
            radius_y,
            action,
        };
        // caverns carve once; a branching walk hands over to its children
        self.step = if self.kind == CaveKind::Cavern || action == StepAction::Branch {
            self.max
        } else {
            self.step + 1
        };
        Some(out)
    }

    /// Seed of a branch leaving `at`, turned `turn` radians off the current heading.
    fn branch(&mut self, at: &WalkStep, turn: f32, y_scale: f64) -> CaveSeed {
        let rng_seed = self.rng.next_u64();
        let size = self.rng.f32() * 0.5 + 0.5;
        CaveSeed {
            origin: at.pos,
            yaw: at.yaw + turn,
            pitch: at.pitch / 3.0,
            size,
            kind: CaveKind::Branch,
            start_step: at.step,
            max_steps: self.max,
            y_scale,
            rng_seed,
        }
    }
}

impl SeedGenerator for CaveGenerator {
    type Seed = CaveSeed;

    fn range(&self) -> i32 {
        self.range
    }

    fn discover(&self, _world: &WorldCtx, cube: CubeCoord, rng: &mut CoordRng, out: &mut Vec<CaveSeed>) {
        let p = &self.params;
        if rng.below(p.rarity) != 0 {
            return;
        }
        let inner = rng.below(p.max_init_nodes + 1) + 1;
        let middle = rng.below(inner) + 1;
        let count = rng.below(middle);

        let (bx, by, bz) = cube.min_block();
        let size = f64::from(CUBE_SIZE_I32);
        for _ in 0..count {
            let origin = Vec3d::new(
                f64::from(bx) + rng.f64() * size,
                f64::from(by) + rng.f64() * size,
                f64::from(bz) + rng.f64() * size,
            );
            let mut arms = 1;
            if rng.one_in(p.cavern_rarity) {
                let cavern_size = 1.0 + rng.f32() * 6.0;
                out.push(CaveSeed {
                    origin,
                    yaw: 0.0,
                    pitch: 0.0,
                    size: cavern_size,
                    kind: CaveKind::Cavern,
                    start_step: 0,
                    max_steps: 0,
                    y_scale: p.cavern_y_scale,
                    rng_seed: rng.next_u64(),
                });
                arms = 1 + rng.below(p.max_cavern_arms);
            }
            for _ in 0..arms {
                let seed = self.tunnel(origin, rng);
                out.push(seed);
            }
        }
    }
}

impl FeatureGenerator for CaveGenerator {
    fn materialize(&self, _world: &WorldCtx, seed: CaveSeed, builder: &mut FeatureBuilder<'_, CaveSeed>) {
        self.walk(seed, builder);
    }

    fn replay<V: CubeVoxels, B: BiomeSource>(
        &self,
        _world: &WorldCtx,
        bucket: &OpBucket,
        cube: &mut V,
        biomes: &B,
        _rng: &mut CoordRng,
    ) -> usize {
        let Some((min, max)) = bucket.local_bounds() else {
            return 0;
        };
        let limit = self.params.water_threshold;
        if perimeter_water(cube, min, max, limit) > limit {
            log::trace!(target: "features", "cave skipped at {:?}: water on perimeter", cube.coord());
            return 0;
        }
        let (bx, by, bz) = cube.coord().min_block();
        let mut written = 0;
        for op in bucket.ops() {
            let (x, y, z) = (op.x as usize, op.y as usize, op.z as usize);
            let biome = biomes.biome_at(bx + x as i32, by + y as i32, bz + z as i32);
            if can_carve(cube.get(x, y, z), &biome, &self.params.carvable) {
                cube.set(x, y, z, op.block);
                written += 1;
            }
        }
        written
    }
}
