use delve_geom::{CubeBox, CubeCoord};
use proptest::prelude::*;

fn coord() -> impl Strategy<Value = CubeCoord> {
    (-64i32..64, -64i32..64, -64i32..64).prop_map(CubeCoord::from)
}

proptest! {
    // A box grown from a set of points contains every one of them
    #[test]
    fn include_contains_all(points in prop::collection::vec(coord(), 1..32)) {
        let mut b = CubeBox::point(points[0]);
        for &p in &points[1..] {
            b.include(p);
        }
        for &p in &points {
            prop_assert!(b.contains(p));
        }
    }

    // Growing never shrinks
    #[test]
    fn include_is_monotonic(a in coord(), b in coord(), c in coord()) {
        let mut bx = CubeBox::new(a, b);
        let before = bx;
        bx.include(c);
        prop_assert!(bx.contains(before.min) && bx.contains(before.max));
        prop_assert!(bx.volume() >= before.volume());
    }

    // Point boxes intersect exactly when contained
    #[test]
    fn point_intersection_matches_contains(a in coord(), b in coord(), p in coord()) {
        let bx = CubeBox::new(a, b);
        prop_assert_eq!(bx.intersects(&CubeBox::point(p)), bx.contains(p));
    }
}

#[test]
fn neighborhood_box_covers_neighborhood() {
    let center = CubeCoord::new(-3, 9, 0);
    let bx = CubeBox::new(center.offset(-2, -2, -2), center.offset(2, 2, 2));
    assert_eq!(bx.volume(), 125);
    assert!(center.neighborhood(2).all(|n| bx.contains(n)));
}
