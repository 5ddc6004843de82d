// Copyright 2025 the Scrapbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public `SpatialIndex` API: an id map plus an x-ordered sweep sequence.

use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt::Debug;
use core::hash::Hash;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::damage::Damage;
use crate::types::{Aabb2D, Scalar, cmp_t};

/// Something that can be stored in a [`SpatialIndex`].
///
/// The index reads [`Indexed::aabb`] on insertion and again on every
/// [`SpatialIndex::update`]; between those calls the cached box is what the
/// sweep order is built on.
pub trait Indexed<T: Copy + PartialOrd> {
    /// Stable identity. Must not change while the element is indexed.
    type Id: Copy + Eq + Hash + Ord + Debug;

    /// The element's identity.
    fn id(&self) -> Self::Id;

    /// The element's current axis-aligned bounds.
    fn aabb(&self) -> Aabb2D<T>;

    /// Exact containment test used by [`SpatialIndex::container_candidates`].
    ///
    /// Defaults to the bounding box.
    fn contains_point(&self, x: T, y: T) -> bool {
        self.aabb().contains_point(x, y)
    }
}

/// Candidate ids returned from intersection queries.
pub type Candidates<I> = SmallVec<[I; 16]>;

#[derive(Copy, Clone, Debug)]
struct Entry<T, I> {
    aabb: Aabb2D<T>,
    id: I,
}

/// Sweep order: left edge, then width, then id so that the order is total.
fn cmp_entries<T: Scalar, I: Ord>(a: &Entry<T, I>, b: &Entry<T, I>) -> Ordering {
    cmp_t(&a.aabb.min_x, &b.aabb.min_x)
        .then_with(|| cmp_t(&a.aabb.width(), &b.aabb.width()))
        .then_with(|| a.id.cmp(&b.id))
}

#[derive(Clone, Debug)]
struct Slot<T, E> {
    element: E,
    // Box the element was last ordered by.
    aabb: Aabb2D<T>,
}

/// An owning index of elements of one kind, ordered along the x axis.
///
/// The index keeps an id → element map for constant-time lookup and a
/// sequence of cached boxes sorted by `(min_x, width, id)`. Intersection
/// queries binary-search the sequence and scan outward only as far as an
/// overlap along x is still possible.
///
/// ## Example
///
/// ```rust
/// use scrapbook_index::{Aabb2D, Indexed, SpatialIndex};
///
/// #[derive(Debug)]
/// struct Tile(u32, Aabb2D<i64>);
///
/// impl Indexed<i64> for Tile {
///     type Id = u32;
///     fn id(&self) -> u32 {
///         self.0
///     }
///     fn aabb(&self) -> Aabb2D<i64> {
///         self.1
///     }
/// }
///
/// let mut idx = SpatialIndex::new();
/// idx.add(Tile(1, Aabb2D::new(0, 0, 10, 10)));
/// idx.add(Tile(2, Aabb2D::new(5, 5, 15, 15)));
/// idx.add(Tile(3, Aabb2D::new(40, 40, 50, 50)));
///
/// let hits = idx.intersection_candidates_of(1);
/// assert_eq!(hits.as_slice(), &[2]);
///
/// // Move tile 3 on top of tile 1 and let the index reorder it.
/// idx.modify(3, |t| t.1 = Aabb2D::new(1, 1, 2, 2));
/// let mut hits = idx.intersection_candidates_of(1);
/// hits.sort();
/// assert_eq!(hits.as_slice(), &[2, 3]);
/// ```
pub struct SpatialIndex<T: Scalar, E: Indexed<T>> {
    slots: HashMap<E::Id, Slot<T, E>>,
    order: Vec<Entry<T, E::Id>>,
    // Upper bound on the width of any ordered entry; bounds the leftward scan.
    max_width: T,
    damage: Damage<T>,
}

impl<T: Scalar, E: Indexed<T>> Debug for SpatialIndex<T, E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("len", &self.order.len())
            .field("max_width", &self.max_width)
            .field("pending_damage", &!self.damage.is_empty())
            .finish_non_exhaustive()
    }
}

impl<T: Scalar, E: Indexed<T>> Default for SpatialIndex<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar, E: Indexed<T>> SpatialIndex<T, E> {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            order: Vec::new(),
            max_width: T::zero(),
            damage: Damage::default(),
        }
    }

    /// Reserve space for at least `n` more elements.
    pub fn reserve(&mut self, n: usize) {
        self.slots.reserve(n);
        self.order.reserve(n);
    }

    /// Number of indexed elements.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the index holds no elements.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether an element with `id` is indexed.
    pub fn contains(&self, id: E::Id) -> bool {
        self.slots.contains_key(&id)
    }

    /// Look up an element by id.
    pub fn get(&self, id: E::Id) -> Option<&E> {
        self.slots.get(&id).map(|s| &s.element)
    }

    /// Iterate elements in sweep order (left edge ascending, then width).
    pub fn iter(&self) -> impl Iterator<Item = &E> + '_ {
        self.order
            .iter()
            .filter_map(|e| self.slots.get(&e.id).map(|s| &s.element))
    }

    /// Iterate ids in sweep order.
    pub fn ids(&self) -> impl Iterator<Item = E::Id> + '_ {
        self.order.iter().map(|e| e.id)
    }

    /// Insert an element, keeping the sweep order.
    ///
    /// If an element with the same id is already present it is replaced and
    /// returned.
    pub fn add(&mut self, element: E) -> Option<E> {
        let id = element.id();
        let previous = self.remove(id);
        let aabb = element.aabb();
        let entry = Entry { aabb, id };
        let at = self.insertion_point(&entry);
        self.order.insert(at, entry);
        self.grow_max_width(aabb.width());
        self.slots.insert(id, Slot { element, aabb });
        self.damage.added.push(aabb);
        previous
    }

    /// Insert many elements at once.
    ///
    /// The batch is sorted on its own and merged into the existing sequence in
    /// a single pass instead of re-sorting everything.
    pub fn add_all<I: IntoIterator<Item = E>>(&mut self, elements: I) {
        let mut fresh: Vec<Entry<T, E::Id>> = Vec::new();
        for element in elements {
            let id = element.id();
            if let Some(old) = self.slots.get(&id) {
                if self.locate(old.aabb, id).is_ok() {
                    self.remove(id);
                } else {
                    // Duplicate within this batch; last one wins.
                    fresh.retain(|e| e.id != id);
                    self.slots.remove(&id);
                }
            }
            let aabb = element.aabb();
            self.grow_max_width(aabb.width());
            self.damage.added.push(aabb);
            self.slots.insert(id, Slot { element, aabb });
            fresh.push(Entry { aabb, id });
        }
        if fresh.is_empty() {
            return;
        }
        fresh.sort_by(cmp_entries);

        let existing = core::mem::take(&mut self.order);
        let mut merged = Vec::with_capacity(existing.len() + fresh.len());
        let mut a = existing.into_iter().peekable();
        let mut b = fresh.into_iter().peekable();
        loop {
            let take_a = match (a.peek(), b.peek()) {
                (Some(x), Some(y)) => cmp_entries(x, y) != Ordering::Greater,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => break,
            };
            let next = if take_a { a.next() } else { b.next() };
            merged.extend(next);
        }
        self.order = merged;
    }

    /// Remove an element by id, returning it if present.
    pub fn remove(&mut self, id: E::Id) -> Option<E> {
        let slot = self.slots.remove(&id)?;
        if let Ok(pos) = self.locate(slot.aabb, id) {
            self.order.remove(pos);
        }
        self.damage.removed.push(slot.aabb);
        Some(slot.element)
    }

    /// Remove a batch of elements in one merge-style pass over the sequence.
    ///
    /// Ids that are not present are ignored. Returns the removed elements in
    /// the order their ids were given.
    pub fn remove_all<I: IntoIterator<Item = E::Id>>(&mut self, ids: I) -> Vec<E> {
        let mut doomed: Vec<Entry<T, E::Id>> = Vec::new();
        let mut removed = Vec::new();
        for id in ids {
            if let Some(slot) = self.slots.remove(&id) {
                doomed.push(Entry {
                    aabb: slot.aabb,
                    id,
                });
                self.damage.removed.push(slot.aabb);
                removed.push(slot.element);
            }
        }
        if doomed.is_empty() {
            return removed;
        }
        doomed.sort_by(cmp_entries);

        let mut next = 0;
        self.order.retain(|e| {
            while next < doomed.len() && cmp_entries(&doomed[next], e) == Ordering::Less {
                next += 1;
            }
            if next < doomed.len() && doomed[next].id == e.id {
                next += 1;
                false
            } else {
                true
            }
        });
        self.max_width = self
            .order
            .iter()
            .fold(T::zero(), |w, e| T::max(w, e.aabb.width()));
        removed
    }

    /// Re-read an element's bounds after it was mutated in place.
    ///
    /// If the new left edge still sits between its neighbours the entry is
    /// rewritten where it is; otherwise it is moved. Returns `false` if `id` is
    /// not indexed.
    pub fn update(&mut self, id: E::Id) -> bool {
        let (old, new) = {
            let Some(slot) = self.slots.get_mut(&id) else {
                return false;
            };
            let new = slot.element.aabb();
            let old = core::mem::replace(&mut slot.aabb, new);
            (old, new)
        };
        if old == new {
            return true;
        }
        self.damage.moved.push((old, new));
        self.grow_max_width(new.width());

        let entry = Entry { aabb: new, id };
        match self.locate(old, id) {
            Ok(pos) => {
                let fits_left =
                    pos == 0 || cmp_entries(&self.order[pos - 1], &entry) != Ordering::Greater;
                let fits_right = pos + 1 >= self.order.len()
                    || cmp_entries(&entry, &self.order[pos + 1]) != Ordering::Greater;
                if fits_left && fits_right {
                    self.order[pos] = entry;
                } else {
                    self.order.remove(pos);
                    let at = self.insertion_point(&entry);
                    self.order.insert(at, entry);
                }
            }
            Err(_) => {
                let at = self.insertion_point(&entry);
                self.order.insert(at, entry);
            }
        }
        true
    }

    /// Mutate an element in place and then [`update`](Self::update) it.
    ///
    /// Returns `None` if `id` is not indexed.
    pub fn modify<R>(&mut self, id: E::Id, f: impl FnOnce(&mut E) -> R) -> Option<R> {
        let slot = self.slots.get_mut(&id)?;
        let out = f(&mut slot.element);
        debug_assert!(
            slot.element.id() == id,
            "elements must keep their id while indexed"
        );
        self.update(id);
        Some(out)
    }

    /// Ids of elements whose box overlaps `aabb` (edges inclusive).
    ///
    /// `exclude` is skipped, which lets callers query with an element that is
    /// itself indexed. The result order is unspecified.
    pub fn intersection_candidates(
        &self,
        aabb: Aabb2D<T>,
        exclude: Option<E::Id>,
    ) -> Candidates<E::Id> {
        let mut out = Candidates::new();
        let start = self
            .order
            .partition_point(|e| cmp_t(&e.aabb.min_x, &aabb.min_x) == Ordering::Less);

        for e in &self.order[start..] {
            if e.aabb.min_x > aabb.max_x {
                break;
            }
            if Some(e.id) != exclude && e.aabb.overlaps(&aabb) {
                out.push(e.id);
            }
        }
        for e in self.order[..start].iter().rev() {
            // Nothing further left can reach `aabb.min_x`.
            if T::add(e.aabb.min_x, self.max_width) < aabb.min_x {
                break;
            }
            if Some(e.id) != exclude && e.aabb.overlaps(&aabb) {
                out.push(e.id);
            }
        }
        out
    }

    /// Intersection candidates of an indexed element, excluding itself.
    ///
    /// Returns an empty list when `id` is not indexed.
    pub fn intersection_candidates_of(&self, id: E::Id) -> Candidates<E::Id> {
        match self.slots.get(&id) {
            Some(slot) => self.intersection_candidates(slot.aabb, Some(id)),
            None => Candidates::new(),
        }
    }

    /// Ids of elements that exactly contain the point, in sweep order.
    pub fn container_candidates(&self, x: T, y: T) -> Vec<E::Id> {
        let mut out = Vec::new();
        for e in &self.order {
            if e.aabb.min_x > x {
                break;
            }
            if !e.aabb.contains_point(x, y) {
                continue;
            }
            if let Some(slot) = self.slots.get(&e.id)
                && slot.element.contains_point(x, y)
            {
                out.push(e.id);
            }
        }
        out
    }

    /// Drain the damage recorded since the last call.
    pub fn take_damage(&mut self) -> Damage<T> {
        core::mem::take(&mut self.damage)
    }

    /// Remove everything (without reporting damage).
    pub fn clear(&mut self) {
        self.slots.clear();
        self.order.clear();
        self.max_width = T::zero();
        self.damage = Damage::default();
    }

    /// Check the internal invariants: the sequence is strictly sorted, and
    /// every id in the map appears in it exactly once with its cached box.
    pub fn is_consistent(&self) -> bool {
        let sorted = self
            .order
            .windows(2)
            .all(|w| cmp_entries(&w[0], &w[1]) == Ordering::Less);
        let matched = self.order.iter().all(|e| {
            self.slots
                .get(&e.id)
                .is_some_and(|s| s.aabb == e.aabb && e.aabb.width() <= self.max_width)
        });
        sorted && matched && self.order.len() == self.slots.len()
    }

    fn locate(&self, aabb: Aabb2D<T>, id: E::Id) -> Result<usize, usize> {
        let probe = Entry { aabb, id };
        self.order.binary_search_by(|e| cmp_entries(e, &probe))
    }

    fn insertion_point(&self, entry: &Entry<T, E::Id>) -> usize {
        self.order
            .partition_point(|e| cmp_entries(e, entry) == Ordering::Less)
    }

    fn grow_max_width(&mut self, width: T) {
        if width > self.max_width {
            self.max_width = width;
        }
    }
}
