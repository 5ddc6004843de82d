// Copyright 2025 the Scrapbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Damage accumulated by a [`SpatialIndex`](crate::SpatialIndex) between drains.

use alloc::vec::Vec;

use crate::types::Aabb2D;

/// Boxes touched by structural or geometric changes since the last
/// [`SpatialIndex::take_damage`](crate::SpatialIndex::take_damage).
///
/// The record is coarse: boxes may overlap and an element added and then
/// removed within one window shows up in both lists.
#[derive(Clone, Debug)]
pub struct Damage<T> {
    /// Boxes of newly added elements.
    pub added: Vec<Aabb2D<T>>,
    /// Boxes of removed elements, as they were at removal time.
    pub removed: Vec<Aabb2D<T>>,
    /// Elements whose box changed: (old, new).
    pub moved: Vec<(Aabb2D<T>, Aabb2D<T>)>,
}

impl<T> Default for Damage<T> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            removed: Vec::new(),
            moved: Vec::new(),
        }
    }
}

impl<T: Copy + PartialOrd> Damage<T> {
    /// True if no damage entries recorded.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.moved.is_empty()
    }

    /// Union of all AABBs affected. Returns `None` if empty.
    pub fn union(&self) -> Option<Aabb2D<T>> {
        let mut it = self.boxes();
        let first = it.next()?;
        Some(it.fold(first, |acc, r| acc.union(r)))
    }

    /// Every affected box, old and new, in no particular order.
    pub fn boxes(&self) -> impl Iterator<Item = Aabb2D<T>> + '_ {
        self.added
            .iter()
            .copied()
            .chain(self.removed.iter().copied())
            .chain(self.moved.iter().flat_map(|(a, b)| [*a, *b]))
    }

    /// Fold another damage record into this one.
    pub fn extend(&mut self, other: Self) {
        self.added.extend(other.added);
        self.removed.extend(other.removed);
        self.moved.extend(other.moved);
    }
}
