//! Cube voxel storage and the accessor contract feature generators write through.
#![forbid(unsafe_code)]

mod palette;

use delve_blocks::Block;
use delve_geom::{CUBE_SIZE, CUBE_VOLUME, CubeCoord};

pub use palette::{PALETTE_CAPACITY, Palette, PaletteInsert};

/// Read/write view of one cube in local coordinates `0..CUBE_SIZE` per axis.
pub trait CubeVoxels {
    fn coord(&self) -> CubeCoord;
    fn get(&self, x: usize, y: usize, z: usize) -> Block;
    fn set(&mut self, x: usize, y: usize, z: usize, block: Block);
}

#[inline]
pub const fn local_index(x: usize, y: usize, z: usize) -> usize {
    (y * CUBE_SIZE + z) * CUBE_SIZE + x
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageKind {
    Uniform,
    Palette(usize),
    Dense,
}

#[derive(Clone, Debug)]
enum Storage {
    Uniform(Block),
    Palette {
        palette: Palette,
        indices: Box<[u8]>,
    },
    Dense(Box<[Block]>),
}

/// One cube of voxels. Starts out uniform, moves to a palette of up to
/// [`PALETTE_CAPACITY`] distinct blocks, and falls back to one `Block` per voxel
/// once the palette is full.
#[derive(Clone, Debug)]
pub struct CubeBuf {
    pub coord: CubeCoord,
    storage: Storage,
}

impl CubeBuf {
    pub fn new(coord: CubeCoord) -> Self {
        Self::filled(coord, Block::AIR)
    }

    pub fn filled(coord: CubeCoord, block: Block) -> Self {
        Self {
            coord,
            storage: Storage::Uniform(block),
        }
    }

    pub fn from_blocks(coord: CubeCoord, blocks: &[Block]) -> Self {
        let mut buf = Self::new(coord);
        for (i, b) in blocks.iter().take(CUBE_VOLUME).enumerate() {
            buf.set_index(i, *b);
        }
        buf
    }

    #[inline]
    pub fn get_index(&self, i: usize) -> Block {
        match &self.storage {
            Storage::Uniform(b) => *b,
            Storage::Palette { palette, indices } => palette.get(indices[i]),
            Storage::Dense(blocks) => blocks[i],
        }
    }

    pub fn set_index(&mut self, i: usize, block: Block) {
        match &mut self.storage {
            Storage::Uniform(u) => {
                if *u == block {
                    return;
                }
                let mut palette = Palette::with_first(*u);
                let mut indices = vec![0u8; CUBE_VOLUME].into_boxed_slice();
                if let PaletteInsert::Added(p) = palette.insert(block) {
                    indices[i] = p;
                }
                self.storage = Storage::Palette { palette, indices };
            }
            Storage::Palette { palette, indices } => match palette.insert(block) {
                PaletteInsert::Existing(p) | PaletteInsert::Added(p) => indices[i] = p,
                PaletteInsert::Full => {
                    let mut dense: Box<[Block]> =
                        indices.iter().map(|&p| palette.get(p)).collect();
                    dense[i] = block;
                    self.storage = Storage::Dense(dense);
                }
            },
            Storage::Dense(blocks) => blocks[i] = block,
        }
    }

    pub fn storage_kind(&self) -> StorageKind {
        match &self.storage {
            Storage::Uniform(_) => StorageKind::Uniform,
            Storage::Palette { palette, .. } => StorageKind::Palette(palette.len()),
            Storage::Dense(_) => StorageKind::Dense,
        }
    }

    #[inline]
    pub fn contains_world(&self, wx: i32, wy: i32, wz: i32) -> bool {
        CubeCoord::from_block(wx, wy, wz) == self.coord
    }

    #[inline]
    pub fn get_world(&self, wx: i32, wy: i32, wz: i32) -> Option<Block> {
        if !self.contains_world(wx, wy, wz) {
            return None;
        }
        let (bx, by, bz) = self.coord.min_block();
        Some(self.get(
            (wx - bx) as usize,
            (wy - by) as usize,
            (wz - bz) as usize,
        ))
    }

    pub fn iter(&self) -> impl Iterator<Item = Block> + '_ {
        (0..CUBE_VOLUME).map(|i| self.get_index(i))
    }

    pub fn count(&self, mut pred: impl FnMut(Block) -> bool) -> usize {
        match &self.storage {
            Storage::Uniform(b) => {
                if pred(*b) {
                    CUBE_VOLUME
                } else {
                    0
                }
            }
            _ => self.iter().filter(|b| pred(*b)).count(),
        }
    }

    /// FNV-1a over every voxel in index order. Independent of the storage kind.
    pub fn checksum(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        for b in self.iter() {
            for byte in b.id.to_le_bytes().into_iter().chain(b.state.to_le_bytes()) {
                h ^= u64::from(byte);
                h = h.wrapping_mul(0x0000_0100_0000_01b3);
            }
        }
        h
    }

    pub fn to_vec(&self) -> Vec<Block> {
        self.iter().collect()
    }
}

impl CubeVoxels for CubeBuf {
    #[inline]
    fn coord(&self) -> CubeCoord {
        self.coord
    }

    #[inline]
    fn get(&self, x: usize, y: usize, z: usize) -> Block {
        self.get_index(local_index(x, y, z))
    }

    #[inline]
    fn set(&mut self, x: usize, y: usize, z: usize, block: Block) {
        self.set_index(local_index(x, y, z), block);
    }
}

/// Local coordinates of every voxel on the faces of the box `[min, max]`.
pub fn box_perimeter(
    min: (usize, usize, usize),
    max: (usize, usize, usize),
) -> impl Iterator<Item = (usize, usize, usize)> {
    let (x0, y0, z0) = min;
    let (x1, y1, z1) = max;
    (y0..=y1).flat_map(move |y| {
        (z0..=z1).flat_map(move |z| {
            (x0..=x1).filter_map(move |x| {
                let edge = x == x0 || x == x1 || y == y0 || y == y1 || z == z0 || z == z1;
                edge.then_some((x, y, z))
            })
        })
    })
}
