use delve_blocks::{Biome, Block};
use delve_cube::{CubeBuf, CubeVoxels, box_perimeter};
use delve_geom::CubeCoord;
use delve_world::features::OpBucket;
use delve_world::{CaveGenerator, CoordRng, FeatureGenerator, GenParams, WorldCtx};

/// A stone cube with a carved line through it and `water` still-water voxels on the
/// perimeter of the line's box grown by one.
fn setup(water: usize) -> (CubeBuf, OpBucket) {
    let mut cube = CubeBuf::filled(CubeCoord::new(0, -1, 0), Block::STONE);
    let mut bucket = OpBucket::default();
    for x in 4..=10 {
        bucket.record(x, 6, 6, Block::AIR);
    }
    // grown box is (3,5,5)..(11,7,7); pick face voxels away from the line
    let faces: Vec<_> = box_perimeter((3, 5, 5), (11, 7, 7))
        .filter(|&(_, y, z)| y != 6 || z != 6)
        .collect();
    for &(x, y, z) in faces.iter().take(water) {
        cube.set(x, y, z, Block::WATER);
    }
    (cube, bucket)
}

fn replay(cube: &mut CubeBuf, bucket: &OpBucket) -> usize {
    let world = WorldCtx::with_seed(0);
    let g = CaveGenerator::from_params(&GenParams::default());
    let mut rng = CoordRng::for_cube(world.seed, cube.coord());
    g.replay(&world, bucket, cube, &Biome::PLAINS, &mut rng)
}

#[test]
fn five_water_voxels_block_the_cave() {
    let (mut cube, bucket) = setup(5);
    let before = cube.checksum();
    assert_eq!(replay(&mut cube, &bucket), 0);
    assert_eq!(cube.checksum(), before);
}

#[test]
fn four_water_voxels_do_not() {
    let (mut cube, bucket) = setup(4);
    assert_eq!(replay(&mut cube, &bucket), 7);
    assert!((4..=10).all(|x| cube.get(x, 6, 6) == Block::AIR));
}

#[test]
fn flowing_water_is_ignored() {
    let (mut cube, bucket) = setup(0);
    for (x, y, z) in box_perimeter((3, 5, 5), (11, 7, 7)).take(20) {
        cube.set(x, y, z, Block::FLOWING_WATER);
    }
    cube.set(4, 6, 6, Block::STONE);
    assert!(replay(&mut cube, &bucket) > 0);
}
