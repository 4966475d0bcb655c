use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use delve_blocks::{Biome, Block};
use delve_cube::CubeBuf;
use delve_geom::CubeCoord;
use delve_runtime::{CubeGenerator, PipelineStats};
use delve_world::{GenParams, WorldCtx, WorldId, WorldSeed, load_params_from_path};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Order {
    Forward,
    Reverse,
}

#[derive(Parser, Debug)]
#[command(name = "delve", about = "Generate a region of cubes with caves and fluid pockets")]
struct Cli {
    /// Generation settings (TOML); built-in defaults otherwise
    #[arg(long)]
    config: Option<PathBuf>,
    /// World seed
    #[arg(long, default_value_t = 1337)]
    seed: u64,
    /// Cubes generated in every direction from the centre
    #[arg(long, default_value_t = 2)]
    radius: i32,
    /// Centre cube as X,Y,Z
    #[arg(long, default_value = "0,-2,0", value_parser = parse_center, allow_hyphen_values = true)]
    center: CubeCoord,
    /// Order the region is generated in
    #[arg(long, value_enum, default_value_t = Order::Forward)]
    order: Order,
}

fn parse_center(s: &str) -> Result<CubeCoord, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [x, y, z] = parts.as_slice() else {
        return Err(format!("expected X,Y,Z, got '{s}'"));
    };
    let axis = |v: &str| v.parse::<i32>().map_err(|e| format!("bad axis '{v}': {e}"));
    Ok(CubeCoord::new(axis(x)?, axis(y)?, axis(z)?))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let params = match &cli.config {
        Some(path) => match load_params_from_path(path) {
            Ok(p) => p,
            Err(e) => {
                log::error!("failed to load {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => GenParams::default(),
    };
    if cli.radius < 0 {
        log::error!("radius must not be negative");
        return ExitCode::FAILURE;
    }

    let world = WorldCtx::new(WorldId(0), WorldSeed(cli.seed), Arc::new(params));
    let mut region: Vec<CubeCoord> = cli.center.neighborhood(cli.radius).collect();
    if cli.order == Order::Reverse {
        region.reverse();
    }
    log::info!(
        "generating {} cubes around {:?} (seed {}, {:?} order)",
        region.len(),
        cli.center,
        cli.seed,
        cli.order
    );

    let start = Instant::now();
    let mut generator = CubeGenerator::new(&world.params);
    for &c in &region {
        generator.pregenerate(&world, c);
    }
    let mut sums = Vec::with_capacity(region.len());
    let mut solid = 0usize;
    for &c in &region {
        let mut cube = CubeBuf::new(c);
        generator.generate_full(&world, &mut cube, &Biome::PLAINS);
        solid += cube.count(|b| b == Block::STONE);
        sums.push((c, cube.checksum()));
    }
    let elapsed = start.elapsed();
    if !generator.wait_idle(Duration::from_secs(5)) {
        log::warn!(target: "tasks", "background precalc still busy at exit");
    }

    report(&generator.stats(), sums.len(), solid, elapsed);
    println!("checksum      {:016x}", region_checksum(sums));
    ExitCode::SUCCESS
}

/// Order-independent digest of every cube's voxels.
fn region_checksum(mut sums: Vec<(CubeCoord, u64)>) -> u64 {
    sums.sort_unstable_by_key(|(c, _)| *c);
    sums.iter().fold(0xcbf2_9ce4_8422_2325_u64, |h, (c, s)| {
        (h ^ c.pack() ^ s.rotate_left(17)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

fn report(s: &PipelineStats, cubes: usize, solid: usize, elapsed: Duration) {
    println!("cubes         {cubes}");
    println!("stone left    {solid}");
    println!("carved        {}", s.carved);
    println!("pocket voxels {}", s.pocket_voxels);
    println!(
        "cave seeds    lists={} seeds={} trees={} released={}",
        s.caves.seed_lists, s.caves.seeds, s.caves.trees_built, s.caves.trees_released
    );
    println!(
        "seed cache    hits={} misses={} entries={}",
        s.caves.seed_cache.hits, s.caves.seed_cache.misses, s.caves.seed_cache.entries
    );
    println!(
        "tree cache    hits={} misses={} entries={} arena_live={}",
        s.caves.tree_cache.hits,
        s.caves.tree_cache.misses,
        s.caves.tree_cache.entries,
        s.caves.arena.live
    );
    println!(
        "precalc       hits={} misses={} stale={} submitted={} dropped={}",
        s.precalc.hits,
        s.precalc.misses,
        s.precalc.stale,
        s.precalc.submitted,
        s.precalc.tasks.dropped
    );
    println!("elapsed       {:.1} ms", elapsed.as_secs_f64() * 1000.0);
}
