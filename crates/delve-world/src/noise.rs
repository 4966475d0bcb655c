use delve_geom::{CUBE_SIZE, CubeCoord};
use fastnoise_lite::{FastNoiseLite, NoiseType};

use crate::rng::mix64;
use crate::world::{WorldCtx, WorldId, WorldSeed};

/// One configured noise field, sampled on a lattice every `span` voxels.
#[derive(Clone, Debug, PartialEq)]
pub struct NoiseLayer {
    pub name: String,
    pub salt: i32,
    pub frequency: f32,
    pub octaves: u32,
    pub span: usize,
}

impl NoiseLayer {
    /// Lattice points per axis for one cube, both faces included.
    #[inline]
    pub fn lattice(&self) -> usize {
        CUBE_SIZE / self.span.max(1) + 1
    }

    #[inline]
    pub fn samples(&self) -> usize {
        let n = self.lattice();
        n * n * n
    }

    fn fingerprint(&self, h: u64) -> u64 {
        let mut h = mix64(h ^ self.salt as u32 as u64);
        h = mix64(h ^ u64::from(self.frequency.to_bits()));
        h = mix64(h ^ u64::from(self.octaves));
        mix64(h ^ self.span as u64)
    }
}

/// Per-world samplers for every configured layer.
pub struct LayerSet {
    world: WorldId,
    layers: Vec<(NoiseLayer, FastNoiseLite)>,
    fingerprint: u64,
}

impl LayerSet {
    pub fn new(world: &WorldCtx) -> Self {
        Self::from_layers(world.id, world.seed, &world.params.layers)
    }

    pub fn from_layers(world: WorldId, seed: WorldSeed, layers: &[NoiseLayer]) -> Self {
        let mut fingerprint = mix64(seed.0 ^ u64::from(world.0));
        let layers = layers
            .iter()
            .map(|l| {
                fingerprint = l.fingerprint(fingerprint);
                let mut noise = FastNoiseLite::with_seed(seed.noise_seed(l.salt));
                noise.set_noise_type(Some(NoiseType::OpenSimplex2));
                noise.set_frequency(Some(l.frequency));
                (l.clone(), noise)
            })
            .collect();
        Self {
            world,
            layers,
            fingerprint,
        }
    }

    #[inline]
    pub fn world(&self) -> WorldId {
        self.world
    }

    /// Identifies the seed and layer settings this set samples with.
    #[inline]
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layer(&self, i: usize) -> Option<&NoiseLayer> {
        self.layers.get(i).map(|(l, _)| l)
    }

    pub fn layer_index(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|(l, _)| l.name == name)
    }

    /// Total doubles a grid for one cube holds.
    pub fn grid_len(&self) -> usize {
        self.layers.iter().map(|(l, _)| l.samples()).sum()
    }

    /// Fractal sample of layer `i` at a world position, roughly in `[-1, 1]`.
    pub fn sample(&self, i: usize, x: f64, y: f64, z: f64) -> f64 {
        let Some((layer, noise)) = self.layers.get(i) else {
            return 0.0;
        };
        let mut amp = 1.0_f32;
        let mut freq = 1.0_f32;
        let mut sum = 0.0_f32;
        let mut max_amp = 0.0_f32;
        for _ in 0..layer.octaves.max(1) {
            sum += noise.get_noise_3d(x as f32 * freq, y as f32 * freq, z as f32 * freq) * amp;
            max_amp += amp;
            amp *= 0.5;
            freq *= 2.0;
        }
        f64::from(if max_amp > 0.0 { sum / max_amp } else { sum })
    }

    /// Sample every layer's lattice for `cube` into `data`, reusing its allocation.
    pub fn compute(&self, cube: CubeCoord, mut data: Vec<f64>) -> NoiseGrid {
        data.clear();
        data.reserve(self.grid_len());
        let (bx, by, bz) = cube.min_block();
        let mut offsets = Vec::with_capacity(self.layers.len());
        for (i, (layer, _)) in self.layers.iter().enumerate() {
            offsets.push(data.len());
            let n = layer.lattice();
            let span = layer.span as i32;
            for y in 0..n as i32 {
                for z in 0..n as i32 {
                    for x in 0..n as i32 {
                        data.push(self.sample(
                            i,
                            f64::from(bx + x * span),
                            f64::from(by + y * span),
                            f64::from(bz + z * span),
                        ));
                    }
                }
            }
        }
        NoiseGrid {
            world: self.world,
            cube,
            fingerprint: self.fingerprint,
            spans: self.layers.iter().map(|(l, _)| l.span).collect(),
            offsets,
            data,
        }
    }
}

/// Dense lattice samples of every layer for one cube.
#[derive(Clone, Debug)]
pub struct NoiseGrid {
    pub world: WorldId,
    pub cube: CubeCoord,
    pub fingerprint: u64,
    spans: Vec<usize>,
    offsets: Vec<usize>,
    data: Vec<f64>,
}

impl NoiseGrid {
    /// True when this grid was produced for `cube` by the same seed and settings as `set`.
    #[inline]
    pub fn matches(&self, set: &LayerSet, cube: CubeCoord) -> bool {
        self.world == set.world && self.fingerprint == set.fingerprint && self.cube == cube
    }

    #[inline]
    pub fn layers(&self) -> usize {
        self.offsets.len()
    }

    /// Raw lattice value of layer `i` at lattice point `(x, y, z)`.
    #[inline]
    pub fn lattice(&self, i: usize, x: usize, y: usize, z: usize) -> f64 {
        let n = CUBE_SIZE / self.spans[i] + 1;
        self.data[self.offsets[i] + (y * n + z) * n + x]
    }

    /// Trilinear value of layer `i` at local voxel `(x, y, z)` in `0..CUBE_SIZE`.
    pub fn interpolate(&self, i: usize, x: usize, y: usize, z: usize) -> f64 {
        let span = self.spans[i];
        let (x0, y0, z0) = (x / span, y / span, z / span);
        let s = span as f64;
        let tx = (x % span) as f64 / s;
        let ty = (y % span) as f64 / s;
        let tz = (z % span) as f64 / s;
        let lerp = |a: f64, b: f64, t: f64| a + (b - a) * t;
        let c = |dx: usize, dy: usize, dz: usize| self.lattice(i, x0 + dx, y0 + dy, z0 + dz);
        let x00 = lerp(c(0, 0, 0), c(1, 0, 0), tx);
        let x10 = lerp(c(0, 1, 0), c(1, 1, 0), tx);
        let x01 = lerp(c(0, 0, 1), c(1, 0, 1), tx);
        let x11 = lerp(c(0, 1, 1), c(1, 1, 1), tx);
        lerp(lerp(x00, x01, tz), lerp(x10, x11, tz), ty)
    }

    /// Give the sample buffer back, e.g. to a pool.
    pub fn into_data(self) -> Vec<f64> {
        self.data
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }
}
