// Copyright 2025 the Scrapbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Randomized checks of the sweep index invariants.

use proptest::prelude::*;
use scrapbook_index::{Aabb2D, Indexed, SpatialIndex};

#[derive(Clone, Debug)]
struct Tile {
    id: u32,
    aabb: Aabb2D<i64>,
}

impl Indexed<i64> for Tile {
    type Id = u32;

    fn id(&self) -> u32 {
        self.id
    }

    fn aabb(&self) -> Aabb2D<i64> {
        self.aabb
    }
}

#[derive(Clone, Debug)]
enum Op {
    Add(u32, Aabb2D<i64>),
    AddAll(Vec<(u32, Aabb2D<i64>)>),
    Remove(u32),
    RemoveAll(Vec<u32>),
    Move(u32, Aabb2D<i64>),
}

fn aabb() -> impl Strategy<Value = Aabb2D<i64>> {
    (-200_i64..200, -200_i64..200, 0_i64..80, 0_i64..80)
        .prop_map(|(x, y, w, h)| Aabb2D::from_xywh(x, y, w, h))
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0_u32..40, aabb()).prop_map(|(id, b)| Op::Add(id, b)),
        prop::collection::vec((0_u32..40, aabb()), 0..8).prop_map(Op::AddAll),
        (0_u32..40).prop_map(Op::Remove),
        prop::collection::vec(0_u32..40, 0..8).prop_map(Op::RemoveAll),
        (0_u32..40, aabb()).prop_map(|(id, b)| Op::Move(id, b)),
    ]
}

fn apply(idx: &mut SpatialIndex<i64, Tile>, op: Op) {
    match op {
        Op::Add(id, aabb) => {
            idx.add(Tile { id, aabb });
        }
        Op::AddAll(batch) => idx.add_all(batch.into_iter().map(|(id, aabb)| Tile { id, aabb })),
        Op::Remove(id) => {
            idx.remove(id);
        }
        Op::RemoveAll(ids) => {
            idx.remove_all(ids);
        }
        Op::Move(id, aabb) => {
            idx.modify(id, |t| t.aabb = aabb);
        }
    }
}

proptest! {
    #[test]
    fn sweep_order_survives_any_edit_sequence(ops in prop::collection::vec(op(), 0..60)) {
        let mut idx = SpatialIndex::new();
        for op in ops {
            apply(&mut idx, op);
            prop_assert!(idx.is_consistent());
        }

        let ordered: Vec<Aabb2D<i64>> = idx.iter().map(|t| t.aabb).collect();
        for w in ordered.windows(2) {
            prop_assert!((w[0].min_x, w[0].width()) <= (w[1].min_x, w[1].width()));
        }
        let ids: Vec<u32> = idx.ids().collect();
        for id in &ids {
            prop_assert!(idx.get(*id).is_some());
            prop_assert_eq!(ids.iter().filter(|other| *other == id).count(), 1);
        }
    }

    #[test]
    fn candidates_match_brute_force(
        ops in prop::collection::vec(op(), 0..40),
        query in aabb(),
    ) {
        let mut idx = SpatialIndex::new();
        for op in ops {
            apply(&mut idx, op);
        }
        let mut fast: Vec<u32> = idx.intersection_candidates(query, None).into_vec();
        fast.sort_unstable();
        let mut slow: Vec<u32> = idx
            .iter()
            .filter(|t| t.aabb.overlaps(&query))
            .map(|t| t.id)
            .collect();
        slow.sort_unstable();
        prop_assert_eq!(fast, slow);
    }

    #[test]
    fn overlap_is_symmetric(a in aabb(), b in aabb()) {
        prop_assert_eq!(a.overlaps_x(&b), b.overlaps_x(&a));
        prop_assert_eq!(a.overlaps_y(&b), b.overlaps_y(&a));
    }
}
