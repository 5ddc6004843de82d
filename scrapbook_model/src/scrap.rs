// Copyright 2025 the Scrapbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scraps: closed borders that own strokes and nested scraps.

use std::collections::BTreeSet;

use kurbo::{Affine, Point, Vec2};
use scrapbook_hit::Region;

use crate::element::{Element, ElementCore};
use crate::stroke::Stroke;
use crate::types::{ElementFlags, ElementId, ElementKey};
use crate::util::rect_to_aabb;

/// A group of elements enclosed by a closed border stroke.
///
/// Membership lives in two ordered id sets; the members themselves are owned
/// by the canvas indexes. While an edit is in progress only the border moves;
/// the accumulated transform is applied to members on commit.
#[derive(Clone, Debug)]
pub struct Scrap {
    core: ElementCore,
    border: Stroke,
    strokes: BTreeSet<ElementId>,
    scraps: BTreeSet<ElementId>,
    transform: Affine,
    rollback: Affine,
    snapshot_transform: Affine,
    editing: bool,
}

impl PartialEq for Scrap {
    fn eq(&self, other: &Self) -> bool {
        self.core.id == other.core.id
    }
}

impl Eq for Scrap {}

impl Scrap {
    /// A new, empty scrap bounded by `border`, which is closed if it is not already.
    pub fn new(border: Stroke) -> Self {
        Self::with_id(ElementId::fresh(), border)
    }

    pub(crate) fn with_id(id: ElementId, mut border: Stroke) -> Self {
        border.close();
        let mut core = ElementCore::new(id);
        core.flags.insert(ElementFlags::CONTENT_CHANGED);
        Self {
            core,
            border,
            strokes: BTreeSet::new(),
            scraps: BTreeSet::new(),
            transform: Affine::IDENTITY,
            rollback: Affine::IDENTITY,
            snapshot_transform: Affine::IDENTITY,
            editing: false,
        }
    }

    /// An empty scrap under a new id with a copy of this border.
    pub(crate) fn duplicate_shell(&self) -> Self {
        let mut border = self.border.duplicate();
        border.core_mut().flags = ElementFlags::default();
        Self::new(border)
    }

    /// The border stroke.
    pub fn border(&self) -> &Stroke {
        &self.border
    }

    /// Ids of member strokes, ascending.
    pub fn strokes(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.strokes.iter().copied()
    }

    /// Ids of member scraps, ascending.
    pub fn scraps(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.scraps.iter().copied()
    }

    /// All members, strokes first.
    pub fn members(&self) -> impl Iterator<Item = ElementKey> + '_ {
        self.strokes
            .iter()
            .map(|id| ElementKey::Stroke(*id))
            .chain(self.scraps.iter().map(|id| ElementKey::Scrap(*id)))
    }

    /// Whether `key` is a direct member.
    pub fn has_member(&self, key: ElementKey) -> bool {
        match key {
            ElementKey::Stroke(id) => self.strokes.contains(&id),
            ElementKey::Scrap(id) => self.scraps.contains(&id),
        }
    }

    /// Number of direct members.
    pub fn member_count(&self) -> usize {
        self.strokes.len() + self.scraps.len()
    }

    /// Insert a member id. Returns `false` if it was already present.
    pub(crate) fn insert_member(&mut self, key: ElementKey) -> bool {
        let inserted = match key {
            ElementKey::Stroke(id) => self.strokes.insert(id),
            ElementKey::Scrap(id) => self.scraps.insert(id),
        };
        if inserted {
            self.mark_content_changed();
        }
        inserted
    }

    /// Remove a member id. Returns `false` if it was absent.
    pub(crate) fn remove_member(&mut self, key: ElementKey) -> bool {
        let removed = match key {
            ElementKey::Stroke(id) => self.strokes.remove(&id),
            ElementKey::Scrap(id) => self.scraps.remove(&id),
        };
        if removed {
            self.mark_content_changed();
        }
        removed
    }

    pub(crate) fn take_members(&mut self) -> (BTreeSet<ElementId>, BTreeSet<ElementId>) {
        self.mark_content_changed();
        (
            core::mem::take(&mut self.strokes),
            core::mem::take(&mut self.scraps),
        )
    }

    pub(crate) fn set_members(
        &mut self,
        strokes: BTreeSet<ElementId>,
        scraps: BTreeSet<ElementId>,
    ) {
        self.strokes = strokes;
        self.scraps = scraps;
        self.mark_content_changed();
    }

    /// Whether an edit is in progress.
    pub fn is_editing(&self) -> bool {
        self.editing
    }

    /// Transform accumulated by the current edit.
    pub fn transform(&self) -> Affine {
        self.transform
    }

    /// Inverse of [`transform`](Self::transform); undoes the edit on the border.
    pub fn rollback(&self) -> Affine {
        self.rollback
    }

    /// Transform to draw the cached snapshot with during an edit.
    pub fn snapshot_transform(&self) -> Affine {
        self.snapshot_transform
    }

    /// Membership or content changed since the last snapshot.
    pub fn content_changed(&self) -> bool {
        self.core.flags.contains(ElementFlags::CONTENT_CHANGED)
    }

    /// A usable cached snapshot exists.
    pub fn has_snapshot(&self) -> bool {
        self.core.flags.contains(ElementFlags::HAS_SNAPSHOT)
    }

    pub(crate) fn mark_content_changed(&mut self) {
        self.core.flags.insert(ElementFlags::CONTENT_CHANGED);
    }

    pub(crate) fn store_snapshot(&mut self) {
        self.core.flags.insert(ElementFlags::HAS_SNAPSHOT);
        self.core.flags.remove(ElementFlags::CONTENT_CHANGED);
    }

    pub(crate) fn drop_snapshot(&mut self) {
        self.core.flags.remove(ElementFlags::HAS_SNAPSHOT);
    }

    /// Enter the editing state with identity matrices and a fresh border.
    pub(crate) fn begin_edit(&mut self) {
        self.transform = Affine::IDENTITY;
        self.rollback = Affine::IDENTITY;
        self.snapshot_transform = Affine::IDENTITY;
        self.border.set_boundary();
        self.editing = true;
    }

    /// Move by `(dx, dy)`. Ignored outside an edit.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.step(Affine::translate(Vec2::new(dx, dy)));
    }

    /// Rotate by `angle` radians about `pivot`. Ignored outside an edit.
    pub fn rotate(&mut self, angle: f64, pivot: Point) {
        self.step(Affine::rotate_about(angle, pivot));
    }

    /// Scale by `(sx, sy)` about `pivot`.
    ///
    /// `distance_to_pivot` is how far the dragged handle is from the pivot;
    /// steps whose handle sits within `min_distance` are rejected, as are
    /// degenerate factors. Returns whether the step was applied.
    pub fn scale(
        &mut self,
        sx: f64,
        sy: f64,
        pivot: Point,
        distance_to_pivot: f64,
        min_distance: f64,
    ) -> bool {
        let degenerate = !(sx.is_finite() && sy.is_finite()) || sx == 0.0 || sy == 0.0;
        if !self.editing || degenerate || distance_to_pivot < min_distance {
            return false;
        }
        let about = pivot.to_vec2();
        let scale = Affine::scale_non_uniform(sx, sy);
        self.step(Affine::translate(about) * scale * Affine::translate(-about));
        true
    }

    // Re-apply the rollback before composing, so the border is always one
    // transform away from its pre-edit geometry.
    fn step(&mut self, delta: Affine) {
        if !self.editing {
            return;
        }
        self.transform = delta * self.transform;
        self.snapshot_transform = delta * self.snapshot_transform;
        self.border.transform(self.transform * self.rollback);
        self.rollback = self.transform.inverse();
    }

    /// Leave the editing state, returning the accumulated transform.
    ///
    /// `None` when no edit was in progress.
    pub(crate) fn finish_edit(&mut self, force_cache_invalidate: bool) -> Option<Affine> {
        if !self.editing {
            return None;
        }
        let applied = self.transform;
        self.editing = false;
        self.transform = Affine::IDENTITY;
        self.rollback = Affine::IDENTITY;
        self.snapshot_transform = Affine::IDENTITY;
        if force_cache_invalidate {
            self.mark_content_changed();
        }
        Some(applied)
    }

    /// Put the border back where the edit started and leave the editing state.
    pub(crate) fn cancel_edit(&mut self) -> bool {
        if !self.editing {
            return false;
        }
        self.border.transform(self.rollback);
        self.editing = false;
        self.transform = Affine::IDENTITY;
        self.rollback = Affine::IDENTITY;
        self.snapshot_transform = Affine::IDENTITY;
        true
    }

    /// Move a non-editing scrap's border along with its editing ancestor.
    pub(crate) fn carry(&mut self, affine: Affine, force_cache_invalidate: bool) {
        self.border.transform(affine);
        if force_cache_invalidate {
            self.mark_content_changed();
        }
    }
}

impl Element for Scrap {
    fn core(&self) -> &ElementCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ElementCore {
        &mut self.core
    }

    fn region(&self) -> &Region {
        self.border.region()
    }

    fn inclusion_points(&self) -> &[Point] {
        self.border.points()
    }

    fn key(&self) -> ElementKey {
        ElementKey::Scrap(self.core.id)
    }
}

impl scrapbook_index::Indexed<f64> for Scrap {
    type Id = ElementId;

    fn id(&self) -> ElementId {
        self.core.id
    }

    fn aabb(&self) -> scrapbook_index::Aabb2D<f64> {
        rect_to_aabb(self.border.region().bounds())
    }

    fn contains_point(&self, x: f64, y: f64) -> bool {
        self.border.region().contains(Point::new(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Rect;

    fn square(x0: f64, y0: f64, size: f64) -> Scrap {
        Scrap::new(Stroke::rectangle(Rect::new(x0, y0, x0 + size, y0 + size)))
    }

    fn assert_near(a: Point, b: Point) {
        assert!(a.distance(b) < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn steps_accumulate() {
        let mut s = square(0.0, 0.0, 100.0);
        s.begin_edit();
        s.translate(4.0, 2.0);
        s.translate(6.0, 3.0);
        assert_eq!(s.transform(), Affine::translate((10.0, 5.0)));
        assert_eq!(s.bounds(), Rect::new(10.0, 5.0, 110.0, 105.0));
        assert_eq!(s.snapshot_transform(), s.transform());
    }

    #[test]
    fn rollback_restores_the_border() {
        let mut s = square(0.0, 0.0, 40.0);
        let before = s.border().points().to_vec();
        s.begin_edit();
        s.translate(7.0, -3.0);
        s.rotate(0.4, Point::new(20.0, 20.0));
        assert!(s.scale(1.5, 0.5, Point::new(20.0, 20.0), 30.0, 8.0));
        s.translate(-1.0, 11.0);

        let live = s.border().points().to_vec();
        for (p, q) in before.iter().zip(&live) {
            assert_near(s.transform() * *p, *q);
            assert_near(s.rollback() * *q, *p);
        }

        assert!(s.cancel_edit());
        for (p, q) in before.iter().zip(s.border().points()) {
            assert_near(*p, *q);
        }
        assert!(!s.is_editing());
    }

    #[test]
    fn scale_rejects_handles_near_the_pivot() {
        let mut s = square(0.0, 0.0, 40.0);
        s.begin_edit();
        assert!(!s.scale(2.0, 2.0, Point::ZERO, 3.0, 8.0));
        assert!(!s.scale(0.0, 2.0, Point::ZERO, 30.0, 8.0));
        assert_eq!(s.transform(), Affine::IDENTITY);
        assert!(s.scale(2.0, 2.0, Point::ZERO, 30.0, 8.0));
        assert_eq!(s.bounds(), Rect::new(0.0, 0.0, 80.0, 80.0));
    }

    #[test]
    fn steps_outside_an_edit_are_ignored() {
        let mut s = square(0.0, 0.0, 10.0);
        s.translate(5.0, 5.0);
        assert_eq!(s.bounds(), Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(s.finish_edit(false).is_none());
        assert!(!s.cancel_edit());
    }

    #[test]
    fn finish_reports_and_resets() {
        let mut s = square(0.0, 0.0, 10.0);
        s.store_snapshot();
        s.begin_edit();
        s.translate(1.0, 0.0);
        assert_eq!(s.finish_edit(true), Some(Affine::translate((1.0, 0.0))));
        assert_eq!(s.transform(), Affine::IDENTITY);
        assert!(s.content_changed());
    }

    #[test]
    fn membership_changes_invalidate_the_snapshot() {
        let mut s = square(0.0, 0.0, 10.0);
        s.store_snapshot();
        assert!(!s.content_changed());
        let child = ElementKey::Stroke(ElementId::fresh());
        assert!(s.insert_member(child));
        assert!(!s.insert_member(child));
        assert!(s.content_changed());
        assert!(s.has_member(child));
        assert_eq!(s.member_count(), 1);
        assert!(s.remove_member(child));
        assert!(!s.remove_member(child));
    }
}
