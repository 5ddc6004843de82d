// Copyright 2025 the Scrapbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The canvas: element ownership, membership, editing, and deferred deletion.

use std::collections::BTreeSet;
use std::sync::Arc;

use hashbrown::HashSet;
use kurbo::{Affine, Point};
use scrapbook_hit::HitParams;
use scrapbook_index::{Aabb2D, SpatialIndex};
use tracing::{debug, trace, warn};

use crate::config::CanvasConfig;
use crate::damage::Damage;
use crate::element::{Element, ElementCore, size_order};
use crate::grouping::build_group;
use crate::scrap::Scrap;
use crate::snapshot::{self, Snapshot, SnapshotRenderer};
use crate::stroke::Stroke;
use crate::types::{ElementFlags, ElementId, ElementKey};
use crate::util::rect_to_aabb;

/// Owner of every stroke and scrap.
///
/// Elements live in two x-ordered [`SpatialIndex`]es, one per kind. Scraps
/// refer to their members by id and members refer back through
/// [`Element::parent`]; the canvas keeps the two directions in agreement.
///
/// Deletion is deferred: [`erase`](Self::erase) only marks a subtree, and
/// [`sweep`](Self::sweep) removes everything marked in one batched pass.
///
/// ## Example
///
/// ```rust
/// use kurbo::{Point, Rect};
/// use scrapbook_model::{Canvas, Element, Stroke};
///
/// let mut canvas = Canvas::default();
/// let ink = canvas.insert_stroke(Stroke::polyline(&[
///     Point::new(40.0, 40.0),
///     Point::new(60.0, 60.0),
/// ]));
///
/// let lasso = Stroke::rectangle(Rect::new(0.0, 0.0, 100.0, 100.0)).into_ghost();
/// let scrap = canvas.commit_group(lasso, 1.0);
///
/// assert_eq!(canvas.stroke(ink).unwrap().parent(), Some(scrap));
/// ```
#[derive(Debug, Default)]
pub struct Canvas {
    pub(crate) strokes: SpatialIndex<f64, Stroke>,
    pub(crate) scraps: SpatialIndex<f64, Scrap>,
    pub(crate) config: CanvasConfig,
    generation: u64,
    damage: Damage,
}

impl Canvas {
    /// An empty canvas.
    pub fn new(config: CanvasConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    /// Replace the configuration. Existing elements are not restyled.
    pub fn set_config(&mut self, config: CanvasConfig) {
        self.config = config;
    }

    /// The stroke index.
    pub fn strokes(&self) -> &SpatialIndex<f64, Stroke> {
        &self.strokes
    }

    /// The scrap index.
    pub fn scraps(&self) -> &SpatialIndex<f64, Scrap> {
        &self.scraps
    }

    /// Look up a stroke.
    pub fn stroke(&self, id: ElementId) -> Option<&Stroke> {
        self.strokes.get(id)
    }

    /// Look up a scrap.
    pub fn scrap(&self, id: ElementId) -> Option<&Scrap> {
        self.scraps.get(id)
    }

    /// Shared state of either kind of element.
    pub fn core(&self, key: ElementKey) -> Option<&ElementCore> {
        match key {
            ElementKey::Stroke(id) => self.strokes.get(id).map(Element::core),
            ElementKey::Scrap(id) => self.scraps.get(id).map(Element::core),
        }
    }

    /// Whether the element exists (marked or not).
    pub fn contains(&self, key: ElementKey) -> bool {
        self.core(key).is_some()
    }

    /// Number of indexed elements, including ones awaiting the sweep.
    pub fn len(&self) -> usize {
        self.strokes.len() + self.scraps.len()
    }

    /// Whether the canvas holds nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Top-level scraps, in sweep order.
    pub fn roots(&self) -> impl Iterator<Item = &Scrap> + '_ {
        self.scraps
            .iter()
            .filter(|s| s.parent().is_none() && !s.is_pending_delete())
    }

    pub(crate) fn with_core<R>(
        &mut self,
        key: ElementKey,
        f: impl FnOnce(&mut ElementCore) -> R,
    ) -> Option<R> {
        match key {
            ElementKey::Stroke(id) => self.strokes.modify(id, |s| f(s.core_mut())),
            ElementKey::Scrap(id) => self.scraps.modify(id, |s| f(s.core_mut())),
        }
    }

    /// Index a stroke, linking it into its parent scrap if it names one.
    pub fn insert_stroke(&mut self, stroke: Stroke) -> ElementId {
        let id = stroke.id();
        let parent = stroke.parent();
        self.strokes.add(stroke);
        self.link_parent(ElementKey::Stroke(id), parent);
        id
    }

    /// Index many strokes with one merge.
    pub fn insert_strokes<I: IntoIterator<Item = Stroke>>(&mut self, strokes: I) {
        let strokes: Vec<Stroke> = strokes.into_iter().collect();
        let links: Vec<_> = strokes
            .iter()
            .filter_map(|s| s.parent().map(|p| (s.key(), p)))
            .collect();
        self.strokes.add_all(strokes);
        for (key, parent) in links {
            self.link_parent(key, Some(parent));
        }
    }

    /// Index a scrap, linking it into its parent scrap if it names one.
    ///
    /// Members the scrap lists must already name it as their parent, which
    /// is how [`group`](Self::group) builds scraps.
    pub fn insert_scrap(&mut self, scrap: Scrap) -> ElementId {
        let id = scrap.id();
        let parent = scrap.parent();
        self.scraps.add(scrap);
        self.link_parent(ElementKey::Scrap(id), parent);
        id
    }

    fn link_parent(&mut self, key: ElementKey, parent: Option<ElementId>) {
        let Some(parent) = parent else {
            return;
        };
        let linked = self.scraps.modify(parent, |p| {
            p.insert_member(key);
        });
        if linked.is_none() {
            warn!(
                element = %key.id(),
                %parent,
                "parent scrap is not on the canvas; inserting at top level"
            );
            self.with_core(key, |c| c.parent = None);
        }
    }

    /// Whether scrap `ancestor` is `id` or encloses it through membership.
    pub fn is_ancestor(&self, ancestor: ElementId, id: ElementId) -> bool {
        let mut current = Some(id);
        let mut steps = 0;
        while let Some(cur) = current {
            if cur == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.scraps.len() {
                break;
            }
            current = self.scraps.get(cur).and_then(Element::parent);
        }
        false
    }

    /// Every stroke and scrap below `id`, with scraps listed parents first.
    ///
    /// Each scrap is visited once. Reaching one twice means membership is
    /// corrupt; debug builds panic, release builds log and skip it.
    pub fn descendants(&self, id: ElementId) -> (Vec<ElementId>, Vec<ElementId>) {
        let mut strokes = Vec::new();
        let mut scraps = Vec::new();
        let mut seen: HashSet<ElementId> = HashSet::new();
        seen.insert(id);
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            let Some(scrap) = self.scraps.get(cur) else {
                continue;
            };
            strokes.extend(scrap.strokes());
            for child in scrap.scraps() {
                let fresh = seen.insert(child);
                debug_assert!(fresh, "scrap {child} reached twice below {id}");
                if !fresh {
                    warn!(scrap = %id, %child, "membership cycle; subtree walk cut short");
                    continue;
                }
                scraps.push(child);
                stack.push(child);
            }
        }
        (strokes, scraps)
    }

    /// Whether any ancestor or descendant of scrap `id` is mid-edit.
    fn has_editing_relative(&self, id: ElementId) -> bool {
        let mut current = self.scraps.get(id).and_then(Element::parent);
        let mut steps = 0;
        while let Some(cur) = current {
            let Some(scrap) = self.scraps.get(cur) else {
                break;
            };
            if scrap.is_editing() {
                return true;
            }
            steps += 1;
            if steps > self.scraps.len() {
                break;
            }
            current = scrap.parent();
        }
        self.descendants(id)
            .1
            .into_iter()
            .any(|sid| self.scraps.get(sid).is_some_and(Scrap::is_editing))
    }

    /// Make `child` a member of scrap `parent`, releasing it from its current
    /// parent first.
    ///
    /// A no-op returning `false` when `child` is the scrap itself, is already
    /// a member, is missing or marked, or is a scrap enclosing `parent`.
    pub fn add_to_scrap(&mut self, parent: ElementId, child: ElementKey) -> bool {
        if child == ElementKey::Scrap(parent) {
            return false;
        }
        let Some(p) = self.scraps.get(parent) else {
            return false;
        };
        if p.is_pending_delete() || p.has_member(child) {
            return false;
        }
        let Some(core) = self.core(child) else {
            return false;
        };
        if core.flags.contains(ElementFlags::PENDING_DELETE) {
            return false;
        }
        let previous = core.parent;
        if let ElementKey::Scrap(c) = child
            && self.is_ancestor(c, parent)
        {
            return false;
        }
        if let Some(old) = previous {
            self.scraps.modify(old, |s| s.remove_member(child));
        }
        self.with_core(child, |c| c.attach(parent));
        self.scraps.modify(parent, |s| s.insert_member(child));
        trace!(%parent, child = %child.id(), "adopted");
        true
    }

    /// Release `child` from scrap `parent`. Returns `false` if it was not a member.
    pub fn remove_from_scrap(&mut self, parent: ElementId, child: ElementKey) -> bool {
        let removed = self
            .scraps
            .modify(parent, |s| s.remove_member(child))
            .unwrap_or(false);
        if removed {
            self.with_core(child, |c| {
                if c.parent == Some(parent) {
                    c.detach();
                }
            });
        }
        removed
    }

    /// Mark an element, and for scraps its whole subtree, for the next sweep.
    pub fn erase(&mut self, key: ElementKey) -> bool {
        match key {
            ElementKey::Stroke(id) => self.erase_stroke(id),
            ElementKey::Scrap(id) => self.erase_scrap(id),
        }
    }

    /// Mark a stroke for deletion and release it from its scrap.
    pub fn erase_stroke(&mut self, id: ElementId) -> bool {
        let Some(stroke) = self.strokes.get(id) else {
            return false;
        };
        if stroke.is_pending_delete() {
            return false;
        }
        if let Some(parent) = stroke.parent() {
            self.remove_from_scrap(parent, ElementKey::Stroke(id));
        }
        self.strokes
            .modify(id, |s| s.core_mut().flags.insert(ElementFlags::PENDING_DELETE));
        true
    }

    /// Mark a scrap and everything below it for deletion.
    ///
    /// The scrap leaves its parent and every descendant leaves its immediate
    /// parent, so no live scrap refers to anything marked.
    pub fn erase_scrap(&mut self, id: ElementId) -> bool {
        let Some(scrap) = self.scraps.get(id) else {
            return false;
        };
        if scrap.is_pending_delete() {
            return false;
        }
        if let Some(parent) = scrap.parent() {
            self.remove_from_scrap(parent, ElementKey::Scrap(id));
        }
        let (strokes, scraps) = self.descendants(id);
        for sid in &strokes {
            self.strokes.modify(*sid, |s| {
                let core = s.core_mut();
                core.detach();
                core.flags.insert(ElementFlags::PENDING_DELETE);
            });
        }
        for sid in scraps.iter().chain([&id]) {
            self.scraps.modify(*sid, |s| {
                s.take_members();
                let core = s.core_mut();
                if *sid != id {
                    core.detach();
                }
                core.flags.insert(ElementFlags::PENDING_DELETE);
            });
        }
        debug!(scrap = %id, strokes = strokes.len(), scraps = scraps.len() + 1, "erased");
        true
    }

    /// Remove every marked element. Returns how many were removed.
    ///
    /// Safe to call repeatedly; a second call with nothing marked removes nothing.
    pub fn sweep(&mut self) -> usize {
        let dead_strokes: Vec<ElementId> = self
            .strokes
            .iter()
            .filter(|s| s.is_pending_delete())
            .map(Element::id)
            .collect();
        let dead_scraps: Vec<ElementId> = self
            .scraps
            .iter()
            .filter(|s| s.is_pending_delete())
            .map(Element::id)
            .collect();
        if dead_strokes.is_empty() && dead_scraps.is_empty() {
            return 0;
        }
        let keys = dead_strokes
            .iter()
            .map(|id| ElementKey::Stroke(*id))
            .chain(dead_scraps.iter().map(|id| ElementKey::Scrap(*id)));
        let links: Vec<_> = keys
            .filter_map(|k| self.core(k).and_then(|c| c.parent).map(|p| (p, k)))
            .collect();
        for (parent, key) in links {
            self.remove_from_scrap(parent, key);
        }
        let removed = self.strokes.remove_all(dead_strokes).len()
            + self.scraps.remove_all(dead_scraps).len();
        debug!(removed, "swept");
        removed
    }

    /// Begin a transactional edit of scrap `id`.
    ///
    /// When the scrap's content changed since its last snapshot, `renderer`
    /// is asked for a fresh one. With a usable snapshot every descendant
    /// stops drawing vectorially; if rendering fails the descendants keep
    /// drawing live geometry. Returns `false` if the scrap is missing, marked,
    /// or already being edited, or if an enclosing or enclosed scrap is.
    pub fn start_editing(
        &mut self,
        id: ElementId,
        scale_factor: f64,
        renderer: &mut dyn SnapshotRenderer,
    ) -> bool {
        let Some(scrap) = self.scraps.get(id) else {
            return false;
        };
        if scrap.is_pending_delete() || scrap.is_editing() || self.has_editing_relative(id) {
            return false;
        }
        let needs_snapshot = scrap.content_changed() || !scrap.has_snapshot();
        let bounds = scrap.bounds();
        let cached = if needs_snapshot {
            match renderer.render_snapshot(self, id, scale_factor) {
                Ok(()) => true,
                Err(err) => {
                    warn!(scrap = %id, %err, "snapshot failed; drawing contents vectorially");
                    false
                }
            }
        } else {
            true
        };
        self.scraps.modify(id, |s| {
            if needs_snapshot {
                if cached {
                    s.store_snapshot();
                } else {
                    s.drop_snapshot();
                }
            }
            s.begin_edit();
        });
        if cached {
            self.set_subtree_vectorial(id, false);
        }
        self.damage.push(bounds);
        debug!(scrap = %id, cached, "editing started");
        true
    }

    fn set_subtree_vectorial(&mut self, id: ElementId, vectorial: bool) {
        let (strokes, scraps) = self.descendants(id);
        for sid in strokes {
            self.strokes.modify(sid, |s| {
                s.core_mut().flags.set(ElementFlags::DRAW_VECTORIALLY, vectorial);
            });
        }
        for sid in scraps {
            self.scraps.modify(sid, |s| {
                s.core_mut().flags.set(ElementFlags::DRAW_VECTORIALLY, vectorial);
            });
        }
    }

    /// Translate the border of a scrap under edit.
    pub fn translate_scrap(&mut self, id: ElementId, dx: f64, dy: f64) -> bool {
        self.scraps
            .modify(id, |s| {
                s.translate(dx, dy);
                s.is_editing()
            })
            .unwrap_or(false)
    }

    /// Rotate the border of a scrap under edit about `pivot`.
    pub fn rotate_scrap(&mut self, id: ElementId, angle: f64, pivot: Point) -> bool {
        self.scraps
            .modify(id, |s| {
                s.rotate(angle, pivot);
                s.is_editing()
            })
            .unwrap_or(false)
    }

    /// Scale the border of a scrap under edit about `pivot`.
    ///
    /// Steps whose handle is nearer the pivot than
    /// [`CanvasConfig::min_scale_distance`] are rejected.
    pub fn scale_scrap(
        &mut self,
        id: ElementId,
        sx: f64,
        sy: f64,
        pivot: Point,
        distance_to_pivot: f64,
    ) -> bool {
        let min = self.config.min_scale_distance;
        self.scraps
            .modify(id, |s| s.scale(sx, sy, pivot, distance_to_pivot, min))
            .unwrap_or(false)
    }

    /// Commit an edit: apply the accumulated transform to every descendant.
    ///
    /// Descendants draw vectorially again afterwards. With
    /// `force_cache_invalidate` the scrap and nested scraps drop their
    /// snapshots' validity (use it after rotation or scaling, where the cached
    /// raster no longer matches).
    pub fn apply_transform(&mut self, id: ElementId, force_cache_invalidate: bool) -> bool {
        let Some(Some(applied)) = self
            .scraps
            .modify(id, |s| s.finish_edit(force_cache_invalidate))
        else {
            return false;
        };
        let (strokes, scraps) = self.descendants(id);
        let moved = applied != Affine::IDENTITY;
        for sid in &strokes {
            self.strokes.modify(*sid, |s| {
                if moved {
                    s.transform(applied);
                }
                s.core_mut().flags.insert(ElementFlags::DRAW_VECTORIALLY);
            });
        }
        // Innermost first, so each border is rebuilt after what it encloses.
        for sid in scraps.iter().rev() {
            self.scraps.modify(*sid, |s| {
                if moved {
                    s.carry(applied, force_cache_invalidate);
                }
                s.core_mut().flags.insert(ElementFlags::DRAW_VECTORIALLY);
            });
        }
        debug!(scrap = %id, strokes = strokes.len(), scraps = scraps.len(), "edit applied");
        true
    }

    /// Abandon an edit: restore the border and redraw descendants vectorially.
    pub fn cancel_editing(&mut self, id: ElementId) -> bool {
        let bounds = self.scraps.get(id).map(Element::bounds);
        let cancelled = self.scraps.modify(id, Scrap::cancel_edit).unwrap_or(false);
        if cancelled {
            self.set_subtree_vectorial(id, true);
            if let Some(b) = bounds {
                self.damage.push(b);
            }
            debug!(scrap = %id, "edit cancelled");
        }
        cancelled
    }

    /// Copy a scrap and insert the copy next to it (same parent).
    ///
    /// A shallow copy takes over the original's members; the original is left
    /// empty. A deep copy duplicates the whole subtree under new ids.
    pub fn copy_scrap(&mut self, id: ElementId, deep: bool) -> Option<ElementId> {
        let original = self.scraps.get(id)?;
        if original.is_pending_delete() {
            return None;
        }
        let parent = original.parent();
        let copy = if deep {
            self.deep_copy(id)?
        } else {
            let shell = original.duplicate_shell();
            let copy = shell.id();
            let (strokes, scraps) = self.scraps.modify(id, Scrap::take_members)?;
            for sid in &strokes {
                self.strokes.modify(*sid, |s| s.core_mut().attach(copy));
            }
            for sid in &scraps {
                self.scraps.modify(*sid, |s| s.core_mut().attach(copy));
            }
            let mut shell = shell;
            shell.set_members(strokes, scraps);
            self.scraps.add(shell);
            copy
        };
        if let Some(parent) = parent {
            self.add_to_scrap(parent, ElementKey::Scrap(copy));
        }
        debug!(original = %id, %copy, deep, "scrap copied");
        Some(copy)
    }

    fn deep_copy(&mut self, id: ElementId) -> Option<ElementId> {
        let original = self.scraps.get(id)?;
        if original.is_pending_delete() {
            return None;
        }
        let mut copy = original.duplicate_shell();
        let copy_id = copy.id();
        let strokes: Vec<Stroke> = original
            .strokes()
            .filter_map(|sid| self.strokes.get(sid))
            .filter(|s| !s.is_pending_delete())
            .map(|s| {
                let mut dup = s.duplicate();
                dup.core_mut().attach(copy_id);
                dup
            })
            .collect();
        let child_scraps: Vec<ElementId> = original.scraps().collect();
        let stroke_ids: BTreeSet<ElementId> = strokes.iter().map(Element::id).collect();
        self.strokes.add_all(strokes);
        let mut scrap_ids = BTreeSet::new();
        for child in child_scraps {
            if let Some(dup) = self.deep_copy(child) {
                self.scraps.modify(dup, |s| s.core_mut().attach(copy_id));
                scrap_ids.insert(dup);
            }
        }
        copy.set_members(stroke_ids, scrap_ids);
        self.scraps.add(copy);
        Some(copy_id)
    }

    /// Dissolve a scrap, handing its members to its parent (or the top level).
    pub fn ungroup(&mut self, id: ElementId) -> bool {
        let Some(scrap) = self.scraps.get(id) else {
            return false;
        };
        if scrap.is_pending_delete() {
            return false;
        }
        let parent = scrap.parent();
        let members: Vec<ElementKey> = scrap.members().collect();
        for member in members {
            self.remove_from_scrap(id, member);
            if let Some(parent) = parent {
                self.add_to_scrap(parent, member);
            }
        }
        self.erase_scrap(id)
    }

    /// Build a scrap from a lasso without inserting it. See [`build_group`].
    pub fn group(&mut self, boundary: Stroke, scale_factor: f64) -> Scrap {
        build_group(self, boundary, scale_factor)
    }

    /// Group, then insert the new scrap inside the smallest scrap enclosing it.
    ///
    /// Scraps the new one adopted, and anything nested in them, are never
    /// picked as its parent even when their borders have grown around it.
    pub fn commit_group(&mut self, boundary: Stroke, scale_factor: f64) -> ElementId {
        let mut scrap = self.group(boundary, scale_factor);
        let enclosing = self
            .scraps
            .intersection_candidates(rect_to_aabb(scrap.bounds()), None)
            .into_iter()
            .filter_map(|sid| self.scraps.get(sid))
            .filter(|s| {
                !s.is_pending_delete()
                    && !scrap.scraps().any(|m| self.is_ancestor(m, s.id()))
                    && s.contains(&scrap)
            })
            .min_by(|a, b| a.cmp_size(*b))
            .map(Element::id);
        if let Some(parent) = enclosing {
            scrap.core_mut().attach(parent);
        }
        self.insert_scrap(scrap)
    }

    /// The smallest live scrap whose region contains `pt`.
    pub fn scrap_at(&self, pt: Point) -> Option<ElementId> {
        self.scraps
            .container_candidates(pt.x, pt.y)
            .into_iter()
            .filter_map(|id| self.scraps.get(id))
            .filter(|s| !s.is_pending_delete())
            .min_by(|a, b| a.cmp_size(*b))
            .map(Element::id)
    }

    /// The live stroke nearest `pt` within [`CanvasConfig::hit_tolerance`].
    pub fn stroke_at(&self, pt: Point) -> Option<ElementId> {
        let tol = self.config.hit_tolerance;
        let params = HitParams {
            fill_tolerance: tol,
            stroke_tolerance: tol,
        };
        let probe = Aabb2D::new(pt.x - tol, pt.y - tol, pt.x + tol, pt.y + tol);
        self.strokes
            .intersection_candidates(probe, None)
            .into_iter()
            .filter_map(|id| self.strokes.get(id))
            .filter(|s| !s.is_pending_delete() && !s.is_ghost())
            .filter_map(|s| s.region().hit(pt, &params).map(|hit| (hit, s)))
            .min_by(|(ha, a), (hb, b)| {
                ha.cmp_distance(hb).then_with(|| {
                    size_order(
                        (a.width() + a.height(), a.id()),
                        (b.width() + b.height(), b.id()),
                    )
                })
            })
            .map(|(_, s)| s.id())
    }

    /// Ink under `pt` if any, otherwise the innermost scrap.
    pub fn hit_test(&self, pt: Point) -> Option<ElementKey> {
        self.stroke_at(pt)
            .map(ElementKey::Stroke)
            .or_else(|| self.scrap_at(pt).map(ElementKey::Scrap))
    }

    /// Drain the areas changed since the last call.
    pub fn take_damage(&mut self) -> Damage {
        let mut damage = core::mem::take(&mut self.damage);
        damage.absorb(&self.strokes.take_damage());
        damage.absorb(&self.scraps.take_damage());
        damage
    }

    /// An immutable view of everything live, for rendering on another thread.
    pub fn snapshot(&mut self) -> Arc<Snapshot> {
        self.generation += 1;
        snapshot::build(self, self.generation)
    }

    /// Check that both indexes are consistent, that scrap member sets and
    /// element parents agree, and that membership has no cycles.
    pub fn check_invariants(&self) -> bool {
        if !self.strokes.is_consistent() || !self.scraps.is_consistent() {
            return false;
        }
        let members_agree = self.scraps.iter().all(|scrap| {
            scrap
                .members()
                .all(|key| self.core(key).is_some_and(|c| c.parent == Some(scrap.id())))
        });
        let parents_agree = self
            .strokes
            .iter()
            .map(|s| (s.key(), s.parent()))
            .chain(self.scraps.iter().map(|s| (s.key(), s.parent())))
            .all(|(key, parent)| match parent {
                None => true,
                Some(p) => self.scraps.get(p).is_some_and(|s| s.has_member(key)),
            });
        let acyclic = self
            .scraps
            .iter()
            .all(|s| s.parent().is_none_or(|p| !self.is_ancestor(s.id(), p)));
        members_agree && parents_agree && acyclic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SnapshotError;
    use kurbo::Rect;

    #[derive(Default)]
    struct Recorder {
        calls: usize,
        fail: bool,
    }

    impl SnapshotRenderer for Recorder {
        fn render_snapshot(
            &mut self,
            _canvas: &Canvas,
            _scrap: ElementId,
            _scale_factor: f64,
        ) -> Result<(), SnapshotError> {
            self.calls += 1;
            if self.fail {
                Err(SnapshotError::Renderer("no surface".into()))
            } else {
                Ok(())
            }
        }
    }

    fn square_scrap(canvas: &mut Canvas, x0: f64, y0: f64, size: f64) -> ElementId {
        canvas.insert_scrap(Scrap::new(Stroke::rectangle(Rect::new(
            x0,
            y0,
            x0 + size,
            y0 + size,
        ))))
    }

    fn ink(canvas: &mut Canvas, a: (f64, f64), b: (f64, f64)) -> ElementId {
        let points = [Point::new(a.0, a.1), Point::new(b.0, b.1)];
        canvas.insert_stroke(Stroke::polyline(&points))
    }

    #[test]
    fn reparenting_records_the_previous_parent() {
        let mut canvas = Canvas::default();
        let a = square_scrap(&mut canvas, 0.0, 0.0, 100.0);
        let b = square_scrap(&mut canvas, 200.0, 0.0, 100.0);
        let s = ink(&mut canvas, (10.0, 10.0), (20.0, 20.0));
        let key = ElementKey::Stroke(s);

        assert!(canvas.add_to_scrap(a, key));
        assert!(canvas.add_to_scrap(b, key));
        let stroke = canvas.stroke(s).unwrap();
        assert_eq!(stroke.parent(), Some(b));
        assert_eq!(stroke.previous_parent(), Some(a));
        assert!(!canvas.scrap(a).unwrap().has_member(key));
        assert!(canvas.scrap(b).unwrap().has_member(key));
        assert!(canvas.check_invariants());
    }

    #[test]
    fn add_rejects_self_duplicates_and_cycles() {
        let mut canvas = Canvas::default();
        let outer = square_scrap(&mut canvas, 0.0, 0.0, 100.0);
        let inner = square_scrap(&mut canvas, 10.0, 10.0, 20.0);
        assert!(!canvas.add_to_scrap(outer, ElementKey::Scrap(outer)));
        assert!(canvas.add_to_scrap(outer, ElementKey::Scrap(inner)));
        assert!(!canvas.add_to_scrap(outer, ElementKey::Scrap(inner)));
        assert!(!canvas.add_to_scrap(inner, ElementKey::Scrap(outer)));
        assert!(canvas.check_invariants());
    }

    #[test]
    fn remove_then_readd() {
        let mut canvas = Canvas::default();
        let a = square_scrap(&mut canvas, 0.0, 0.0, 100.0);
        let s = ElementKey::Stroke(ink(&mut canvas, (10.0, 10.0), (20.0, 20.0)));
        canvas.add_to_scrap(a, s);
        assert!(canvas.remove_from_scrap(a, s));
        assert!(!canvas.remove_from_scrap(a, s));
        let core = canvas.core(s).unwrap();
        assert_eq!((core.parent, core.previous_parent), (None, Some(a)));
        assert!(canvas.add_to_scrap(a, s));
        assert_eq!(canvas.core(s).unwrap().parent, Some(a));
    }

    #[test]
    fn deletion_is_deferred_until_sweep() {
        let mut canvas = Canvas::default();
        let outer = square_scrap(&mut canvas, 0.0, 0.0, 100.0);
        let inner = square_scrap(&mut canvas, 10.0, 10.0, 40.0);
        let s1 = ink(&mut canvas, (20.0, 20.0), (30.0, 30.0));
        let s2 = ink(&mut canvas, (60.0, 60.0), (70.0, 70.0));
        canvas.add_to_scrap(outer, ElementKey::Scrap(inner));
        canvas.add_to_scrap(inner, ElementKey::Stroke(s1));
        canvas.add_to_scrap(outer, ElementKey::Stroke(s2));

        assert!(canvas.erase_scrap(outer));
        assert!(!canvas.erase_scrap(outer));
        assert_eq!(canvas.len(), 4);
        assert!(canvas.stroke(s1).unwrap().is_pending_delete());
        assert_eq!(canvas.stroke(s1).unwrap().parent(), None);
        assert_eq!(canvas.scrap(outer).unwrap().member_count(), 0);
        assert!(canvas.check_invariants());
        assert!(canvas.snapshot().items.is_empty());

        assert_eq!(canvas.sweep(), 4);
        assert!(canvas.is_empty());
        assert_eq!(canvas.sweep(), 0);
        assert!(canvas.check_invariants());
    }

    #[test]
    fn erasing_a_member_stroke_releases_it() {
        let mut canvas = Canvas::default();
        let a = square_scrap(&mut canvas, 0.0, 0.0, 100.0);
        let s = ink(&mut canvas, (10.0, 10.0), (20.0, 20.0));
        canvas.add_to_scrap(a, ElementKey::Stroke(s));
        assert!(canvas.erase_stroke(s));
        assert_eq!(canvas.scrap(a).unwrap().member_count(), 0);
        assert_eq!(canvas.sweep(), 1);
        assert!(canvas.scrap(a).is_some());
        assert!(canvas.check_invariants());
    }

    #[test]
    fn edit_moves_only_the_border_until_applied() {
        let mut canvas = Canvas::default();
        let scrap = square_scrap(&mut canvas, 0.0, 0.0, 100.0);
        let s = ink(&mut canvas, (10.0, 10.0), (20.0, 20.0));
        canvas.add_to_scrap(scrap, ElementKey::Stroke(s));
        let before = canvas.stroke(s).unwrap().bounds();

        let mut renderer = Recorder::default();
        assert!(canvas.start_editing(scrap, 1.0, &mut renderer));
        assert_eq!(renderer.calls, 1);
        assert!(!canvas.stroke(s).unwrap().draws_vectorially());

        assert!(canvas.translate_scrap(scrap, 4.0, 2.0));
        assert!(canvas.translate_scrap(scrap, 6.0, 3.0));
        assert_eq!(
            canvas.scrap(scrap).unwrap().bounds(),
            Rect::new(10.0, 5.0, 110.0, 105.0)
        );
        assert_eq!(canvas.stroke(s).unwrap().bounds(), before);

        assert!(canvas.apply_transform(scrap, false));
        let stroke = canvas.stroke(s).unwrap();
        assert_eq!(stroke.bounds(), before + kurbo::Vec2::new(10.0, 5.0));
        assert!(stroke.draws_vectorially());
        assert!(!canvas.scrap(scrap).unwrap().is_editing());
        assert!(canvas.check_invariants());

        // Content is unchanged, so the cached snapshot is reused.
        assert!(canvas.start_editing(scrap, 1.0, &mut renderer));
        assert_eq!(renderer.calls, 1);
    }

    #[test]
    fn children_move_by_exactly_the_composed_translation() {
        let mut canvas = Canvas::default();
        let scrap = square_scrap(&mut canvas, 0.0, 0.0, 100.0);
        let children = [
            ink(&mut canvas, (10.0, 10.0), (20.0, 25.0)),
            ink(&mut canvas, (30.5, 40.25), (60.0, 45.0)),
            ink(&mut canvas, (70.0, 70.0), (90.0, 80.0)),
        ];
        for s in children {
            canvas.add_to_scrap(scrap, ElementKey::Stroke(s));
        }
        let before: Vec<Vec<Point>> = children
            .iter()
            .map(|s| canvas.stroke(*s).unwrap().points().to_vec())
            .collect();

        canvas.start_editing(scrap, 1.0, &mut Recorder::default());
        canvas.translate_scrap(scrap, 4.0, 2.0);
        canvas.translate_scrap(scrap, 6.0, 3.0);
        canvas.apply_transform(scrap, false);

        for (s, original) in children.iter().zip(&before) {
            let moved: Vec<Point> = original
                .iter()
                .map(|p| *p + kurbo::Vec2::new(10.0, 5.0))
                .collect();
            assert_eq!(canvas.stroke(*s).unwrap().points(), moved.as_slice());
        }
        let scrap = canvas.scrap(scrap).unwrap();
        assert_eq!(scrap.transform(), Affine::IDENTITY);
        assert_eq!(scrap.rollback(), Affine::IDENTITY);
    }

    #[test]
    fn translate_and_back_is_a_no_op() {
        let mut canvas = Canvas::default();
        let scrap = square_scrap(&mut canvas, 0.0, 0.0, 50.0);
        let s = ink(&mut canvas, (10.0, 10.0), (20.0, 20.0));
        canvas.add_to_scrap(scrap, ElementKey::Stroke(s));
        let points = canvas.stroke(s).unwrap().points().to_vec();
        let border = canvas.scrap(scrap).unwrap().bounds();

        canvas.start_editing(scrap, 1.0, &mut Recorder::default());
        canvas.translate_scrap(scrap, 13.0, -7.0);
        canvas.translate_scrap(scrap, -13.0, 7.0);
        canvas.apply_transform(scrap, false);

        assert_eq!(canvas.stroke(s).unwrap().points(), points.as_slice());
        assert_eq!(canvas.scrap(scrap).unwrap().bounds(), border);
    }

    #[test]
    fn snapshot_failure_keeps_drawing_vectorially() {
        let mut canvas = Canvas::default();
        let scrap = square_scrap(&mut canvas, 0.0, 0.0, 50.0);
        let s = ink(&mut canvas, (10.0, 10.0), (20.0, 20.0));
        canvas.add_to_scrap(scrap, ElementKey::Stroke(s));

        let mut renderer = Recorder {
            fail: true,
            ..Recorder::default()
        };
        assert!(canvas.start_editing(scrap, 2.0, &mut renderer));
        assert!(canvas.stroke(s).unwrap().draws_vectorially());
        assert!(!canvas.scrap(scrap).unwrap().has_snapshot());
        assert!(canvas.scrap(scrap).unwrap().is_editing());
        assert!(!canvas.start_editing(scrap, 2.0, &mut renderer));
    }

    #[test]
    fn cancel_restores_border_and_flags() {
        let mut canvas = Canvas::default();
        let scrap = square_scrap(&mut canvas, 0.0, 0.0, 50.0);
        let s = ink(&mut canvas, (10.0, 10.0), (20.0, 20.0));
        canvas.add_to_scrap(scrap, ElementKey::Stroke(s));
        let border = canvas.scrap(scrap).unwrap().bounds();

        canvas.start_editing(scrap, 1.0, &mut Recorder::default());
        canvas.translate_scrap(scrap, 30.0, 30.0);
        assert!(canvas.cancel_editing(scrap));
        assert_eq!(canvas.scrap(scrap).unwrap().bounds(), border);
        assert!(canvas.stroke(s).unwrap().draws_vectorially());
        assert!(!canvas.cancel_editing(scrap));
        assert!(!canvas.apply_transform(scrap, false));
    }

    #[test]
    fn nested_scraps_follow_the_edit() {
        let mut canvas = Canvas::default();
        let outer = square_scrap(&mut canvas, 0.0, 0.0, 100.0);
        let inner = square_scrap(&mut canvas, 10.0, 10.0, 30.0);
        let s = ink(&mut canvas, (15.0, 15.0), (25.0, 25.0));
        canvas.add_to_scrap(outer, ElementKey::Scrap(inner));
        canvas.add_to_scrap(inner, ElementKey::Stroke(s));

        canvas.start_editing(outer, 1.0, &mut Recorder::default());
        canvas.scale_scrap(outer, 2.0, 2.0, Point::ZERO, 100.0);
        canvas.apply_transform(outer, true);

        assert_eq!(
            canvas.scrap(inner).unwrap().bounds(),
            Rect::new(20.0, 20.0, 80.0, 80.0)
        );
        assert_eq!(
            canvas.stroke(s).unwrap().points(),
            &[Point::new(30.0, 30.0), Point::new(50.0, 50.0)]
        );
        assert!(canvas.scrap(inner).unwrap().content_changed());
        assert!(canvas.check_invariants());
    }

    #[test]
    fn scale_near_pivot_is_rejected() {
        let mut canvas = Canvas::default();
        let scrap = square_scrap(&mut canvas, 0.0, 0.0, 100.0);
        canvas.start_editing(scrap, 1.0, &mut Recorder::default());
        assert!(!canvas.scale_scrap(scrap, 3.0, 3.0, Point::ZERO, 1.0));
        assert!(canvas.scale_scrap(scrap, 3.0, 3.0, Point::ZERO, 50.0));
    }

    #[test]
    fn nested_edits_are_exclusive() {
        let mut canvas = Canvas::default();
        let outer = square_scrap(&mut canvas, 0.0, 0.0, 100.0);
        let inner = square_scrap(&mut canvas, 10.0, 10.0, 30.0);
        canvas.add_to_scrap(outer, ElementKey::Scrap(inner));
        let mut renderer = Recorder::default();

        assert!(canvas.start_editing(outer, 1.0, &mut renderer));
        assert!(!canvas.start_editing(inner, 1.0, &mut renderer));
        assert!(canvas.apply_transform(outer, false));

        assert!(canvas.start_editing(inner, 1.0, &mut renderer));
        assert!(!canvas.start_editing(outer, 1.0, &mut renderer));
        assert!(canvas.cancel_editing(inner));
        assert!(canvas.start_editing(outer, 1.0, &mut renderer));
    }

    #[test]
    fn group_never_nests_inside_its_own_subtree() {
        let mut canvas = Canvas::default();
        let inner = square_scrap(&mut canvas, 45.0, 45.0, 10.0);
        let outer = canvas.commit_group(
            Stroke::rectangle(Rect::new(40.0, 40.0, 60.0, 60.0)).into_ghost(),
            1.0,
        );
        assert_eq!(canvas.scrap(inner).unwrap().parent(), Some(outer));

        // Grow the nested scrap well past its parent.
        assert!(canvas.start_editing(inner, 1.0, &mut Recorder::default()));
        assert!(canvas.scale_scrap(inner, 20.0, 20.0, Point::new(50.0, 50.0), 100.0));
        assert!(canvas.apply_transform(inner, true));
        assert!(
            canvas
                .scrap(inner)
                .unwrap()
                .bounds()
                .contains(Point::new(30.0, 30.0))
        );

        let group = canvas.commit_group(
            Stroke::rectangle(Rect::new(30.0, 30.0, 70.0, 70.0)).into_ghost(),
            1.0,
        );
        assert_eq!(canvas.scrap(outer).unwrap().parent(), Some(group));
        assert_eq!(canvas.scrap(inner).unwrap().parent(), Some(outer));
        assert_eq!(canvas.scrap(group).unwrap().parent(), None);
        assert_eq!(canvas.descendants(group).1, vec![outer, inner]);
        assert!(canvas.check_invariants());
    }

    #[test]
    #[should_panic(expected = "reached twice")]
    fn subtree_walk_stops_on_a_cycle() {
        let mut canvas = Canvas::default();
        let a = square_scrap(&mut canvas, 0.0, 0.0, 100.0);
        let b = square_scrap(&mut canvas, 10.0, 10.0, 30.0);
        canvas.add_to_scrap(a, ElementKey::Scrap(b));
        canvas
            .scraps
            .modify(b, |s| s.insert_member(ElementKey::Scrap(a)));
        canvas.descendants(a);
    }

    #[test]
    fn shallow_copy_takes_over_members() {
        let mut canvas = Canvas::default();
        let parent = square_scrap(&mut canvas, 0.0, 0.0, 200.0);
        let scrap = square_scrap(&mut canvas, 10.0, 10.0, 50.0);
        let s = ink(&mut canvas, (20.0, 20.0), (30.0, 30.0));
        canvas.add_to_scrap(parent, ElementKey::Scrap(scrap));
        canvas.add_to_scrap(scrap, ElementKey::Stroke(s));

        let copy = canvas.copy_scrap(scrap, false).unwrap();
        assert_ne!(copy, scrap);
        assert_eq!(canvas.scrap(scrap).unwrap().member_count(), 0);
        assert_eq!(canvas.stroke(s).unwrap().parent(), Some(copy));
        assert_eq!(canvas.stroke(s).unwrap().previous_parent(), Some(scrap));
        assert_eq!(canvas.scrap(copy).unwrap().parent(), Some(parent));
        assert!(canvas.check_invariants());
    }

    #[test]
    fn deep_copy_duplicates_the_subtree() {
        let mut canvas = Canvas::default();
        let outer = square_scrap(&mut canvas, 0.0, 0.0, 100.0);
        let inner = square_scrap(&mut canvas, 10.0, 10.0, 30.0);
        let s = ink(&mut canvas, (15.0, 15.0), (25.0, 25.0));
        canvas.add_to_scrap(outer, ElementKey::Scrap(inner));
        canvas.add_to_scrap(inner, ElementKey::Stroke(s));

        let copy = canvas.copy_scrap(outer, true).unwrap();
        let (strokes, scraps) = canvas.descendants(copy);
        assert_eq!((strokes.len(), scraps.len()), (1, 1));
        assert_ne!(strokes[0], s);
        assert_ne!(scraps[0], inner);
        assert_eq!(
            canvas.stroke(strokes[0]).unwrap().points(),
            canvas.stroke(s).unwrap().points()
        );
        // The original is untouched.
        assert_eq!(canvas.descendants(outer), (vec![s], vec![inner]));
        assert_eq!(canvas.len(), 6);
        assert!(canvas.check_invariants());
    }

    #[test]
    fn ungroup_hands_members_to_the_parent() {
        let mut canvas = Canvas::default();
        let outer = square_scrap(&mut canvas, 0.0, 0.0, 100.0);
        let inner = square_scrap(&mut canvas, 10.0, 10.0, 30.0);
        let s = ink(&mut canvas, (15.0, 15.0), (25.0, 25.0));
        canvas.add_to_scrap(outer, ElementKey::Scrap(inner));
        canvas.add_to_scrap(inner, ElementKey::Stroke(s));

        assert!(canvas.ungroup(inner));
        assert_eq!(canvas.stroke(s).unwrap().parent(), Some(outer));
        assert_eq!(canvas.stroke(s).unwrap().previous_parent(), Some(inner));
        assert_eq!(canvas.sweep(), 1);
        assert!(canvas.scrap(inner).is_none());
        assert!(canvas.check_invariants());
    }

    #[test]
    fn hit_test_prefers_ink_then_the_innermost_scrap() {
        let mut canvas = Canvas::default();
        let outer = square_scrap(&mut canvas, 0.0, 0.0, 100.0);
        let inner = square_scrap(&mut canvas, 10.0, 10.0, 30.0);
        let s = ink(&mut canvas, (60.0, 60.0), (80.0, 60.0));

        let hit = |x, y| canvas.hit_test(Point::new(x, y));
        assert_eq!(hit(70.0, 61.0), Some(ElementKey::Stroke(s)));
        assert_eq!(hit(20.0, 20.0), Some(ElementKey::Scrap(inner)));
        assert_eq!(hit(50.0, 20.0), Some(ElementKey::Scrap(outer)));
        assert_eq!(hit(500.0, 500.0), None);
    }

    #[test]
    fn damage_reports_moves() {
        let mut canvas = Canvas::default();
        let scrap = square_scrap(&mut canvas, 0.0, 0.0, 10.0);
        canvas.take_damage();
        canvas.start_editing(scrap, 1.0, &mut Recorder::default());
        canvas.translate_scrap(scrap, 100.0, 0.0);
        let union = canvas.take_damage().union_rect().unwrap();
        assert_eq!(union, Rect::new(0.0, 0.0, 110.0, 10.0));
        assert!(canvas.take_damage().is_empty());
    }
}
