use delve_blocks::Block;
use delve_cube::{CubeBuf, CubeVoxels, StorageKind};
use delve_geom::{CUBE_VOLUME, CubeCoord};
use proptest::prelude::*;

proptest! {
    // Reads match a flat reference array whatever representation the buffer is in
    #[test]
    fn matches_flat_model(
        writes in prop::collection::vec((0usize..CUBE_VOLUME, 0u16..400), 0..1500)
    ) {
        let mut buf = CubeBuf::new(CubeCoord::new(2, -3, 5));
        let mut model = vec![Block::AIR; CUBE_VOLUME];
        for (i, id) in writes {
            buf.set_index(i, Block::new(id));
            model[i] = Block::new(id);
        }
        prop_assert_eq!(buf.to_vec(), model.clone());
        let dense = CubeBuf::from_blocks(buf.coord(), &model);
        prop_assert_eq!(dense.checksum(), buf.checksum());
    }
}

#[test]
fn checksum_ignores_representation() {
    let coord = CubeCoord::new(0, 0, 0);
    let mut a = CubeBuf::filled(coord, Block::STONE);
    let mut b = CubeBuf::filled(coord, Block::STONE);
    for i in 0..300u16 {
        b.set_index(usize::from(i), Block::new(1000 + i));
    }
    assert_eq!(b.storage_kind(), StorageKind::Dense);
    for i in 0..300u16 {
        b.set_index(usize::from(i), Block::STONE);
    }
    assert_eq!(a.checksum(), b.checksum());
    a.set(0, 0, 0, Block::AIR);
    assert_ne!(a.checksum(), b.checksum());
}
