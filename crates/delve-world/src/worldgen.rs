use std::fs;
use std::path::Path;
use std::time::Duration;

use delve_blocks::Block;
use delve_geom::CUBE_SIZE;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::noise::NoiseLayer;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct GenConfig {
    #[serde(default)]
    pub features: Features,
    #[serde(default)]
    pub caves: Caves,
    #[serde(default)]
    pub pockets: Pockets,
    #[serde(default)]
    pub cache: Cache,
    #[serde(default)]
    pub precalc: Precalc,
    #[serde(default)]
    pub noise: Noise,
    #[serde(default)]
    pub terrain: Terrain,
}

impl GenConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Flatten into a validated [`GenParams`].
    pub fn into_params(self) -> Result<GenParams, ConfigError> {
        let params = GenParams::from_config(&self);
        params.validate()?;
        Ok(params)
    }
}

pub fn load_config_from_path(path: &Path) -> Result<GenConfig, ConfigError> {
    let s = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    GenConfig::from_toml_str(&s)
}

pub fn load_params_from_path(path: &Path) -> Result<GenParams, ConfigError> {
    load_config_from_path(path)?.into_params()
}

#[derive(Clone, Debug, Deserialize)]
pub struct Features {
    #[serde(default = "default_range")]
    pub range: i32,
    #[serde(default = "default_true")]
    pub caves: bool,
    #[serde(default = "default_true")]
    pub pockets: bool,
}
fn default_range() -> i32 {
    8
}
fn default_true() -> bool {
    true
}
impl Default for Features {
    fn default() -> Self {
        Self {
            range: default_range(),
            caves: true,
            pockets: true,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Caves {
    #[serde(default = "default_cave_rarity")]
    pub rarity: u32,
    #[serde(default = "default_cavern_rarity")]
    pub cavern_rarity: u32,
    #[serde(default = "default_max_init_nodes")]
    pub max_init_nodes: u32,
    #[serde(default = "default_max_cavern_arms")]
    pub max_cavern_arms: u32,
    #[serde(default = "default_min_radius")]
    pub min_radius: f64,
    #[serde(default = "default_tunnel_y_scale")]
    pub tunnel_y_scale: f64,
    #[serde(default = "default_cavern_y_scale")]
    pub cavern_y_scale: f64,
    #[serde(default = "default_floor_cutoff")]
    pub floor_cutoff: f64,
    #[serde(default = "default_carve_skip_rarity")]
    pub carve_skip_rarity: u32,
    #[serde(default = "default_steep_rarity")]
    pub steep_rarity: u32,
    #[serde(default = "default_size_boost_rarity")]
    pub size_boost_rarity: u32,
    #[serde(default = "default_water_threshold")]
    pub water_threshold: usize,
    #[serde(default)]
    pub lava_level: Option<i32>,
    #[serde(default = "default_carvable")]
    pub carvable: Vec<Block>,
}
fn default_cave_rarity() -> u32 {
    4
}
fn default_cavern_rarity() -> u32 {
    16
}
fn default_max_init_nodes() -> u32 {
    14
}
fn default_max_cavern_arms() -> u32 {
    4
}
fn default_min_radius() -> f64 {
    1.5
}
fn default_tunnel_y_scale() -> f64 {
    1.0
}
fn default_cavern_y_scale() -> f64 {
    0.5
}
fn default_floor_cutoff() -> f64 {
    -0.7
}
fn default_carve_skip_rarity() -> u32 {
    4
}
fn default_steep_rarity() -> u32 {
    6
}
fn default_size_boost_rarity() -> u32 {
    10
}
fn default_water_threshold() -> usize {
    4
}
fn default_carvable() -> Vec<Block> {
    vec![Block::STONE, Block::BEDROCK]
}
impl Default for Caves {
    fn default() -> Self {
        Self {
            rarity: default_cave_rarity(),
            cavern_rarity: default_cavern_rarity(),
            max_init_nodes: default_max_init_nodes(),
            max_cavern_arms: default_max_cavern_arms(),
            min_radius: default_min_radius(),
            tunnel_y_scale: default_tunnel_y_scale(),
            cavern_y_scale: default_cavern_y_scale(),
            floor_cutoff: default_floor_cutoff(),
            carve_skip_rarity: default_carve_skip_rarity(),
            steep_rarity: default_steep_rarity(),
            size_boost_rarity: default_size_boost_rarity(),
            water_threshold: default_water_threshold(),
            lava_level: None,
            carvable: default_carvable(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Pockets {
    #[serde(default = "default_pocket_rarity")]
    pub rarity: u32,
    #[serde(default = "default_pocket_min_radius")]
    pub min_radius: f64,
    #[serde(default = "default_pocket_max_radius")]
    pub max_radius: f64,
    #[serde(default = "default_pocket_y_scale")]
    pub y_scale: f64,
    #[serde(default = "default_pocket_fluid")]
    pub fluid: Block,
}
fn default_pocket_rarity() -> u32 {
    48
}
fn default_pocket_min_radius() -> f64 {
    2.5
}
fn default_pocket_max_radius() -> f64 {
    6.0
}
fn default_pocket_y_scale() -> f64 {
    0.6
}
fn default_pocket_fluid() -> Block {
    Block::WATER
}
impl Default for Pockets {
    fn default() -> Self {
        Self {
            rarity: default_pocket_rarity(),
            min_radius: default_pocket_min_radius(),
            max_radius: default_pocket_max_radius(),
            y_scale: default_pocket_y_scale(),
            fluid: default_pocket_fluid(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Cache {
    #[serde(default = "default_tiers_ms")]
    pub tiers_ms: Vec<u64>,
    #[serde(default = "default_pool_capacity")]
    pub pool_capacity: usize,
}
fn default_tiers_ms() -> Vec<u64> {
    vec![10_000, 25_000, 100_000]
}
fn default_pool_capacity() -> usize {
    64
}
impl Default for Cache {
    fn default() -> Self {
        Self {
            tiers_ms: default_tiers_ms(),
            pool_capacity: default_pool_capacity(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Precalc {
    #[serde(default = "default_true")]
    pub enable: bool,
    #[serde(default = "default_precalc_workers")]
    pub workers: usize,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_precalc_capacity")]
    pub cache_capacity: usize,
    #[serde(default = "default_precalc_ttl_ms")]
    pub ttl_ms: u64,
}
fn default_precalc_workers() -> usize {
    2
}
fn default_queue_capacity() -> usize {
    256
}
fn default_precalc_capacity() -> usize {
    1024
}
fn default_precalc_ttl_ms() -> u64 {
    30_000
}
impl Default for Precalc {
    fn default() -> Self {
        Self {
            enable: true,
            workers: default_precalc_workers(),
            queue_capacity: default_queue_capacity(),
            cache_capacity: default_precalc_capacity(),
            ttl_ms: default_precalc_ttl_ms(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Noise {
    #[serde(default = "default_layers")]
    pub layers: Vec<LayerConfig>,
}
impl Default for Noise {
    fn default() -> Self {
        Self {
            layers: default_layers(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct LayerConfig {
    pub name: String,
    #[serde(default)]
    pub salt: i32,
    #[serde(default = "default_layer_frequency")]
    pub frequency: f32,
    #[serde(default = "default_layer_octaves")]
    pub octaves: u32,
    #[serde(default = "default_layer_span")]
    pub span: usize,
}
fn default_layer_frequency() -> f32 {
    0.02
}
fn default_layer_octaves() -> u32 {
    3
}
fn default_layer_span() -> usize {
    4
}
fn default_layers() -> Vec<LayerConfig> {
    vec![
        LayerConfig {
            name: "density".into(),
            salt: 0,
            frequency: 0.012,
            octaves: 4,
            span: 4,
        },
        LayerConfig {
            name: "detail".into(),
            salt: 0x5eed,
            frequency: 0.06,
            octaves: 1,
            span: 2,
        },
    ]
}

#[derive(Clone, Debug, Deserialize)]
pub struct Terrain {
    #[serde(default)]
    pub sea_level: i32,
    #[serde(default)]
    pub ground_level: i32,
    #[serde(default = "default_vertical_scale")]
    pub vertical_scale: f64,
    #[serde(default = "default_detail_weight")]
    pub detail_weight: f64,
}
fn default_vertical_scale() -> f64 {
    24.0
}
fn default_detail_weight() -> f64 {
    0.2
}
impl Default for Terrain {
    fn default() -> Self {
        Self {
            sea_level: 0,
            ground_level: 0,
            vertical_scale: default_vertical_scale(),
            detail_weight: default_detail_weight(),
        }
    }
}

// ---- flattened parameters ----

#[derive(Clone, Debug, PartialEq)]
pub struct CaveParams {
    pub rarity: u32,
    pub cavern_rarity: u32,
    pub max_init_nodes: u32,
    pub max_cavern_arms: u32,
    pub min_radius: f64,
    pub tunnel_y_scale: f64,
    pub cavern_y_scale: f64,
    pub floor_cutoff: f64,
    pub carve_skip_rarity: u32,
    pub steep_rarity: u32,
    pub size_boost_rarity: u32,
    pub water_threshold: usize,
    pub lava_level: Option<i32>,
    pub carvable: Vec<Block>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PocketParams {
    pub rarity: u32,
    pub min_radius: f64,
    pub max_radius: f64,
    pub y_scale: f64,
    pub fluid: Block,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PrecalcParams {
    pub enable: bool,
    pub workers: usize,
    pub queue_capacity: usize,
    pub cache_capacity: usize,
    pub ttl: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainParams {
    pub sea_level: i32,
    pub ground_level: i32,
    pub vertical_scale: f64,
    pub detail_weight: f64,
}

/// Immutable snapshot of the generation settings, shared as `Arc<GenParams>`.
#[derive(Clone, Debug, PartialEq)]
pub struct GenParams {
    pub range: i32,
    pub caves_enable: bool,
    pub pockets_enable: bool,
    pub caves: CaveParams,
    pub pockets: PocketParams,
    pub cache_tiers: Vec<Duration>,
    pub pool_capacity: usize,
    pub precalc: PrecalcParams,
    pub layers: Vec<NoiseLayer>,
    pub terrain: TerrainParams,
}

impl Default for GenParams {
    fn default() -> Self {
        Self::from_config(&GenConfig::default())
    }
}

impl GenParams {
    pub fn from_config(cfg: &GenConfig) -> Self {
        let c = &cfg.caves;
        let p = &cfg.pockets;
        Self {
            range: cfg.features.range,
            caves_enable: cfg.features.caves,
            pockets_enable: cfg.features.pockets,
            caves: CaveParams {
                rarity: c.rarity,
                cavern_rarity: c.cavern_rarity,
                max_init_nodes: c.max_init_nodes,
                max_cavern_arms: c.max_cavern_arms,
                min_radius: c.min_radius,
                tunnel_y_scale: c.tunnel_y_scale,
                cavern_y_scale: c.cavern_y_scale,
                floor_cutoff: c.floor_cutoff,
                carve_skip_rarity: c.carve_skip_rarity,
                steep_rarity: c.steep_rarity,
                size_boost_rarity: c.size_boost_rarity,
                water_threshold: c.water_threshold,
                lava_level: c.lava_level,
                carvable: c.carvable.clone(),
            },
            pockets: PocketParams {
                rarity: p.rarity,
                min_radius: p.min_radius,
                max_radius: p.max_radius,
                y_scale: p.y_scale,
                fluid: p.fluid,
            },
            cache_tiers: cfg
                .cache
                .tiers_ms
                .iter()
                .map(|ms| Duration::from_millis(*ms))
                .collect(),
            pool_capacity: cfg.cache.pool_capacity,
            precalc: PrecalcParams {
                enable: cfg.precalc.enable,
                workers: cfg.precalc.workers,
                queue_capacity: cfg.precalc.queue_capacity,
                cache_capacity: cfg.precalc.cache_capacity,
                ttl: Duration::from_millis(cfg.precalc.ttl_ms),
            },
            layers: cfg
                .noise
                .layers
                .iter()
                .map(|l| NoiseLayer {
                    name: l.name.clone(),
                    salt: l.salt,
                    frequency: l.frequency,
                    octaves: l.octaves,
                    span: l.span,
                })
                .collect(),
            terrain: TerrainParams {
                sea_level: cfg.terrain.sea_level,
                ground_level: cfg.terrain.ground_level,
                vertical_scale: cfg.terrain.vertical_scale,
                detail_weight: cfg.terrain.detail_weight,
            },
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=32).contains(&self.range) {
            return Err(ConfigError::invalid(format!(
                "features.range must be in 1..=32, got {}",
                self.range
            )));
        }
        let c = &self.caves;
        for (name, v) in [
            ("caves.rarity", c.rarity),
            ("caves.cavern_rarity", c.cavern_rarity),
            ("caves.carve_skip_rarity", c.carve_skip_rarity),
            ("caves.steep_rarity", c.steep_rarity),
            ("caves.size_boost_rarity", c.size_boost_rarity),
            ("pockets.rarity", self.pockets.rarity),
        ] {
            if v == 0 {
                return Err(ConfigError::invalid(format!("{name} must be at least 1")));
            }
        }
        if c.max_cavern_arms == 0 {
            return Err(ConfigError::invalid("caves.max_cavern_arms must be at least 1"));
        }
        if !(c.min_radius > 0.0 && c.tunnel_y_scale > 0.0 && c.cavern_y_scale > 0.0) {
            return Err(ConfigError::invalid(
                "caves radii and y scales must be positive",
            ));
        }
        let p = &self.pockets;
        if !(p.min_radius > 0.0 && p.min_radius <= p.max_radius && p.y_scale > 0.0) {
            return Err(ConfigError::invalid(
                "pockets need 0 < min_radius <= max_radius and a positive y_scale",
            ));
        }
        if p.max_radius > CUBE_SIZE as f64 {
            return Err(ConfigError::invalid(format!(
                "pockets.max_radius must not exceed {CUBE_SIZE}"
            )));
        }
        if self.cache_tiers.is_empty() || self.cache_tiers.iter().any(|t| t.is_zero()) {
            return Err(ConfigError::invalid(
                "cache.tiers_ms needs at least one non-zero window",
            ));
        }
        if self.precalc.queue_capacity == 0 || self.precalc.cache_capacity == 0 {
            return Err(ConfigError::invalid(
                "precalc queue and cache capacities must be at least 1",
            ));
        }
        for (i, l) in self.layers.iter().enumerate() {
            if l.span == 0 || !CUBE_SIZE.is_multiple_of(l.span) {
                return Err(ConfigError::invalid(format!(
                    "noise layer '{}' span {} must divide {CUBE_SIZE}",
                    l.name, l.span
                )));
            }
            if l.octaves == 0 || !(l.frequency > 0.0) {
                return Err(ConfigError::invalid(format!(
                    "noise layer '{}' needs octaves >= 1 and a positive frequency",
                    l.name
                )));
            }
            if self.layers[..i].iter().any(|o| o.name == l.name) {
                return Err(ConfigError::invalid(format!(
                    "duplicate noise layer '{}'",
                    l.name
                )));
            }
        }
        if !(self.terrain.vertical_scale > 0.0) {
            return Err(ConfigError::invalid("terrain.vertical_scale must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let params = GenParams::default();
        params.validate().unwrap();
        assert_eq!(params.range, 8);
        assert_eq!(params.caves.rarity, 4);
        assert_eq!(params.caves.water_threshold, 4);
        assert_eq!(
            params.cache_tiers,
            vec![
                Duration::from_secs(10),
                Duration::from_secs(25),
                Duration::from_secs(100)
            ]
        );
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = GenConfig::from_toml_str(
            r#"
            [features]
            range = 3
            pockets = false

            [caves]
            lava_level = -40
            carvable = ["stone", "dirt"]

            [[noise.layers]]
            name = "density"
            span = 8
            "#,
        )
        .unwrap();
        let p = cfg.into_params().unwrap();
        assert_eq!(p.range, 3);
        assert!(p.caves_enable && !p.pockets_enable);
        assert_eq!(p.caves.lava_level, Some(-40));
        assert_eq!(p.caves.carvable, vec![Block::STONE, Block::DIRT]);
        assert_eq!(p.caves.cavern_rarity, 16);
        assert_eq!(p.layers.len(), 1);
        assert_eq!(p.layers[0].span, 8);
        assert_eq!(p.layers[0].octaves, 3);
    }

    #[test]
    fn bad_values_are_rejected() {
        for doc in [
            "[features]\nrange = 0",
            "[caves]\nrarity = 0",
            "[cache]\ntiers_ms = []",
            "[[noise.layers]]\nname = \"a\"\nspan = 3",
            "[[noise.layers]]\nname = \"a\"\nspan = 0",
            "[[noise.layers]]\nname = \"a\"\n[[noise.layers]]\nname = \"a\"",
            "[pockets]\nmin_radius = 4.0\nmax_radius = 2.0",
        ] {
            let res = GenConfig::from_toml_str(doc).and_then(GenConfig::into_params);
            assert!(
                matches!(res, Err(ConfigError::Invalid(_))),
                "accepted: {doc}"
            );
        }
    }

    #[test]
    fn syntax_errors_are_parse_errors() {
        let res = GenConfig::from_toml_str("[features\nrange = 2");
        assert!(matches!(res, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let res = load_config_from_path(Path::new("/definitely/not/here.toml"));
        assert!(matches!(res, Err(ConfigError::Io { .. })));
    }
}
