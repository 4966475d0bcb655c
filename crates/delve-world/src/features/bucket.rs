use delve_blocks::Block;
use delve_cache::Recycle;
use delve_cube::local_index;
use delve_geom::{CUBE_SIZE, CUBE_VOLUME};

/// One pending voxel write in cube-local coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoxelOp {
    pub x: u8,
    pub y: u8,
    pub z: u8,
    pub block: Block,
}

/// Pending writes of one feature node that fall inside one cube.
///
/// Each local position is recorded at most once; later writes to an already
/// recorded position are ignored. Ops keep insertion order.
#[derive(Clone, Debug)]
pub struct OpBucket {
    written: Box<[u64; CUBE_VOLUME / 64]>,
    ops: Vec<VoxelOp>,
    min: [u8; 3],
    max: [u8; 3],
}

impl Default for OpBucket {
    fn default() -> Self {
        Self {
            written: Box::new([0; CUBE_VOLUME / 64]),
            ops: Vec::new(),
            min: [u8::MAX; 3],
            max: [0; 3],
        }
    }
}

impl OpBucket {
    /// Records a write. Returns false if the position was already taken.
    pub fn record(&mut self, x: usize, y: usize, z: usize, block: Block) -> bool {
        debug_assert!(x < CUBE_SIZE && y < CUBE_SIZE && z < CUBE_SIZE);
        let i = local_index(x, y, z);
        let (word, bit) = (i / 64, 1u64 << (i % 64));
        if self.written[word] & bit != 0 {
            return false;
        }
        self.written[word] |= bit;
        let p = [x as u8, y as u8, z as u8];
        for ((lo, hi), v) in self.min.iter_mut().zip(self.max.iter_mut()).zip(p) {
            *lo = (*lo).min(v);
            *hi = (*hi).max(v);
        }
        self.ops.push(VoxelOp {
            x: p[0],
            y: p[1],
            z: p[2],
            block,
        });
        true
    }

    #[inline]
    pub fn contains(&self, x: usize, y: usize, z: usize) -> bool {
        let i = local_index(x, y, z);
        self.written[i / 64] & (1u64 << (i % 64)) != 0
    }

    #[inline]
    pub fn ops(&self) -> &[VoxelOp] {
        &self.ops
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Inclusive local box covering every recorded op.
    pub fn local_bounds(&self) -> Option<((usize, usize, usize), (usize, usize, usize))> {
        if self.ops.is_empty() {
            return None;
        }
        let [x0, y0, z0] = self.min.map(usize::from);
        let [x1, y1, z1] = self.max.map(usize::from);
        Some(((x0, y0, z0), (x1, y1, z1)))
    }
}

impl Recycle for OpBucket {
    fn recycle(&mut self) {
        if !self.ops.is_empty() {
            self.written.fill(0);
        }
        self.ops.clear();
        self.min = [u8::MAX; 3];
        self.max = [0; 3];
    }
}
