use delve_blocks::{Biome, Block};
use delve_cube::{CubeVoxels, box_perimeter};
use delve_geom::CUBE_SIZE;

/// Whether a carver may replace `current`: any of the configured rock blocks, or
/// the biome's own surface and filler.
#[inline]
pub fn can_carve(current: Block, biome: &Biome, carvable: &[Block]) -> bool {
    if carvable.iter().any(|b| b.id == current.id) {
        return true;
    }
    let (top, filler) = biome.carve_surface();
    current.id == top.id || current.id == filler.id
}

/// Still-water voxels on the faces of the local box `[min, max]` grown by one voxel
/// and clipped to the cube. Stops counting once `limit` is exceeded.
pub fn perimeter_water<V: CubeVoxels>(
    cube: &V,
    min: (usize, usize, usize),
    max: (usize, usize, usize),
    limit: usize,
) -> usize {
    let last = CUBE_SIZE - 1;
    let lo = (min.0.saturating_sub(1), min.1.saturating_sub(1), min.2.saturating_sub(1));
    let hi = ((max.0 + 1).min(last), (max.1 + 1).min(last), (max.2 + 1).min(last));
    let mut count = 0;
    for (x, y, z) in box_perimeter(lo, hi) {
        if cube.get(x, y, z).is_still_water() {
            count += 1;
            if count > limit {
                break;
            }
        }
    }
    count
}
