use delve_blocks::Block;
use delve_cache::{Recycle, SlotArena, SlotHandle};
use delve_geom::{CubeBox, CubeCoord};
use hashbrown::HashMap;

use super::bucket::OpBucket;

/// A materialized feature: its seed, the cubes it touches, the writes bucketed per
/// cube, and its branches. Built once, then only read until it is released.
#[derive(Debug)]
pub struct FeatureNode<S> {
    seed: Option<S>,
    bounds: Option<CubeBox>,
    buckets: HashMap<CubeCoord, OpBucket>,
    children: Vec<SlotHandle>,
    spare: Vec<OpBucket>,
}

impl<S> Default for FeatureNode<S> {
    fn default() -> Self {
        Self {
            seed: None,
            bounds: None,
            buckets: HashMap::new(),
            children: Vec::new(),
            spare: Vec::new(),
        }
    }
}

impl<S> Recycle for FeatureNode<S> {
    fn recycle(&mut self) {
        self.seed = None;
        self.bounds = None;
        for (_, mut bucket) in self.buckets.drain() {
            bucket.recycle();
            self.spare.push(bucket);
        }
        self.children.clear();
    }
}

impl<S: Copy> FeatureNode<S> {
    #[inline]
    pub fn seed(&self) -> Option<S> {
        self.seed
    }

    /// Cube-space box covering every bucket of this node and of all its branches.
    #[inline]
    pub fn bounds(&self) -> Option<CubeBox> {
        self.bounds
    }

    #[inline]
    pub fn affects(&self, c: CubeCoord) -> bool {
        self.bounds.is_some_and(|b| b.contains(c))
    }

    #[inline]
    pub fn bucket(&self, c: CubeCoord) -> Option<&OpBucket> {
        self.buckets.get(&c)
    }

    pub fn buckets(&self) -> impl Iterator<Item = (&CubeCoord, &OpBucket)> {
        self.buckets.iter()
    }

    #[inline]
    pub fn children(&self) -> &[SlotHandle] {
        &self.children
    }

    pub fn op_count(&self) -> usize {
        self.buckets.values().map(OpBucket::len).sum()
    }

    fn record(&mut self, wx: i32, wy: i32, wz: i32, block: Block) -> bool {
        let cube = CubeCoord::from_block(wx, wy, wz);
        let (bx, by, bz) = cube.min_block();
        let Self {
            buckets,
            spare,
            bounds,
            ..
        } = self;
        let bucket = buckets
            .entry(cube)
            .or_insert_with(|| spare.pop().unwrap_or_default());
        let fresh = bucket.record(
            (wx - bx) as usize,
            (wy - by) as usize,
            (wz - bz) as usize,
            block,
        );
        *bounds = Some(match *bounds {
            Some(mut b) => {
                b.include(cube);
                b
            }
            None => CubeBox::point(cube),
        });
        fresh
    }

    fn include(&mut self, other: CubeBox) {
        self.bounds = Some(match self.bounds {
            Some(mut b) => {
                b.union(&other);
                b
            }
            None => other,
        });
    }
}

/// Write access to a node while it is being materialized.
pub struct FeatureBuilder<'a, S> {
    arena: &'a mut SlotArena<FeatureNode<S>>,
    node: SlotHandle,
    writes: usize,
}

impl<S: Copy> FeatureBuilder<'_, S> {
    /// Records a write at a world block position. The first write to a position wins.
    pub fn set(&mut self, wx: i32, wy: i32, wz: i32, block: Block) -> bool {
        let Some(node) = self.arena.get_mut(self.node) else {
            return false;
        };
        let fresh = node.record(wx, wy, wz, block);
        if fresh {
            self.writes += 1;
        }
        fresh
    }

    /// Materializes a branch as a child node; its bounds are folded into this node's.
    pub fn branch(&mut self, seed: S, build: impl FnOnce(&mut FeatureBuilder<'_, S>)) {
        let child = self.arena.alloc();
        if let Some(node) = self.arena.get_mut(child) {
            node.seed = Some(seed);
        }
        let mut sub = FeatureBuilder {
            arena: &mut *self.arena,
            node: child,
            writes: 0,
        };
        build(&mut sub);
        self.writes += sub.writes;

        let child_bounds = self.arena.get(child).and_then(|n| n.bounds);
        if let Some(node) = self.arena.get_mut(self.node) {
            node.children.push(child);
            if let Some(b) = child_bounds {
                node.include(b);
            }
        }
    }

    /// Writes recorded through this builder and its branches so far.
    #[inline]
    pub fn writes(&self) -> usize {
        self.writes
    }
}

/// Allocate a root node for `seed` and fill it through `build`.
pub fn materialize<S: Copy>(
    arena: &mut SlotArena<FeatureNode<S>>,
    seed: S,
    build: impl FnOnce(&mut FeatureBuilder<'_, S>),
) -> SlotHandle {
    let root = arena.alloc();
    if let Some(node) = arena.get_mut(root) {
        node.seed = Some(seed);
    }
    let mut builder = FeatureBuilder {
        arena,
        node: root,
        writes: 0,
    };
    build(&mut builder);
    root
}

/// Release a node and all of its branches back to the arena.
pub fn release_tree<S>(
    arena: &mut SlotArena<FeatureNode<S>>,
    root: SlotHandle,
    stack: &mut Vec<SlotHandle>,
) {
    stack.clear();
    stack.push(root);
    while let Some(h) = stack.pop() {
        if let Some(node) = arena.get(h) {
            stack.extend_from_slice(&node.children);
        }
        arena.release(h);
    }
}

/// Visit `root` and every branch whose bounds contain `target`, parents first.
pub fn visit_affecting<S: Copy>(
    arena: &SlotArena<FeatureNode<S>>,
    root: SlotHandle,
    target: CubeCoord,
    visit: &mut impl FnMut(&FeatureNode<S>),
) {
    let Some(node) = arena.get(root) else {
        return;
    };
    if !node.affects(target) {
        return;
    }
    visit(node);
    for &child in &node.children {
        visit_affecting(arena, child, target, visit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_bounds_fold_into_parent() {
        let mut arena: SlotArena<FeatureNode<u8>> = SlotArena::new();
        let root = materialize(&mut arena, 1, |b| {
            b.set(0, 0, 0, Block::AIR);
            b.branch(2, |c| {
                c.set(40, -20, 3, Block::AIR);
                c.set(40, -20, 3, Block::LAVA);
            });
            assert_eq!(b.writes(), 2);
        });
        let node = arena.get(root).unwrap();
        assert_eq!(node.children().len(), 1);
        let bounds = node.bounds().unwrap();
        assert!(bounds.contains(CubeCoord::new(0, 0, 0)));
        assert!(bounds.contains(CubeCoord::new(2, -2, 0)));
        assert_eq!(node.op_count(), 1);

        let child = arena.get(node.children()[0]).unwrap();
        assert_eq!(child.seed(), Some(2));
        assert_eq!(child.bucket(CubeCoord::new(2, -2, 0)).unwrap().ops()[0].block, Block::AIR);
    }

    #[test]
    fn release_tree_frees_branches() {
        let mut arena: SlotArena<FeatureNode<u8>> = SlotArena::new();
        let root = materialize(&mut arena, 1, |b| {
            b.set(0, 0, 0, Block::AIR);
            b.branch(2, |c| {
                c.set(1, 1, 1, Block::AIR);
                c.branch(3, |d| {
                    d.set(2, 2, 2, Block::AIR);
                });
            });
        });
        assert_eq!(arena.live(), 3);
        let mut stack = Vec::new();
        release_tree(&mut arena, root, &mut stack);
        assert_eq!(arena.live(), 0);
        // recycled nodes come back empty
        let h = arena.alloc();
        let n = arena.get(h).unwrap();
        assert!(n.seed().is_none() && n.bounds().is_none() && n.children().is_empty());
    }
}
