use delve_blocks::Block;
use delve_cache::SlotArena;
use delve_geom::{CubeCoord, Vec3d};
use delve_world::features::{FeatureNode, OpBucket, materialize, visit_affecting};
use delve_world::{CaveGenerator, CaveKind, CaveSeed, FeatureGenerator, GenParams, WorldCtx};
use proptest::prelude::*;

fn cave_seed() -> impl Strategy<Value = CaveSeed> {
    (
        (-64.0f64..64.0, -64.0f64..64.0, -64.0f64..64.0),
        0.0f32..std::f32::consts::TAU,
        -0.25f32..0.25,
        0.0f32..6.0,
        prop_oneof![Just(CaveKind::Tunnel), Just(CaveKind::Cavern)],
        any::<u64>(),
    )
        .prop_map(|((x, y, z), yaw, pitch, size, kind, rng_seed)| CaveSeed {
            origin: Vec3d::new(x, y, z),
            yaw,
            pitch,
            size,
            kind,
            start_step: 0,
            max_steps: 0,
            y_scale: if kind == CaveKind::Cavern { 0.5 } else { 1.0 },
            rng_seed,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    // Recording a position twice keeps one op holding the first value
    #[test]
    fn op_bucket_first_write_wins(
        writes in prop::collection::vec(((0usize..16, 0usize..16, 0usize..16), 0u16..20), 1..200)
    ) {
        let mut bucket = OpBucket::default();
        let mut first = std::collections::HashMap::new();
        for (p, id) in &writes {
            let fresh = bucket.record(p.0, p.1, p.2, Block::new(*id));
            prop_assert_eq!(fresh, !first.contains_key(p));
            first.entry(*p).or_insert(*id);
        }
        prop_assert_eq!(bucket.len(), first.len());
        for op in bucket.ops() {
            let key = (op.x as usize, op.y as usize, op.z as usize);
            prop_assert_eq!(Some(&op.block.id), first.get(&key));
        }
    }

    // Every bucketed cube lies inside its node's bounds, and nodes that do not
    // affect a cube hold nothing for it
    #[test]
    fn bounding_boxes_are_sound(seed in cave_seed()) {
        let g = CaveGenerator::new(3, GenParams::default().caves);
        let world = WorldCtx::with_seed(11);
        let mut arena: SlotArena<FeatureNode<CaveSeed>> = SlotArena::new();
        let root = materialize(&mut arena, seed, |b| g.materialize(&world, seed, b));

        let mut stack = vec![root];
        let mut touched = Vec::new();
        while let Some(h) = stack.pop() {
            let node = arena.get(h).unwrap();
            stack.extend_from_slice(node.children());
            for (c, bucket) in node.buckets() {
                prop_assert!(!bucket.is_empty());
                prop_assert!(node.affects(*c));
                prop_assert!(node.bounds().unwrap().contains(*c));
                touched.push(*c);
            }
        }

        let origin = CubeCoord::from_block(
            seed.origin.x as i32,
            seed.origin.y as i32,
            seed.origin.z as i32,
        );
        for c in origin.neighborhood(4) {
            let mut seen = 0;
            visit_affecting(&arena, root, c, &mut |n| {
                if n.bucket(c).is_some() {
                    seen += 1;
                }
            });
            prop_assert_eq!(seen > 0, touched.contains(&c));
        }
    }
}
