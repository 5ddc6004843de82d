// Copyright 2025 the Scrapbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The geometric capability shared by strokes and scraps.

use core::cmp::Ordering;

use kurbo::{Point, Rect};
use scrapbook_hit::{Region, contains_all};

use crate::types::{ElementFlags, ElementId, ElementKey};

/// Identity, membership, and state bits common to every element.
///
/// `parent` is the scrap that currently owns the element. `previous_parent`
/// is the scrap that most recently released it, which lets undo and drag
/// logic put an element back where it came from.
#[derive(Clone, Debug)]
pub struct ElementCore {
    pub(crate) id: ElementId,
    pub(crate) parent: Option<ElementId>,
    pub(crate) previous_parent: Option<ElementId>,
    pub(crate) flags: ElementFlags,
}

impl ElementCore {
    pub(crate) fn new(id: ElementId) -> Self {
        Self {
            id,
            parent: None,
            previous_parent: None,
            flags: ElementFlags::default(),
        }
    }

    /// Record that the current parent (if any) released this element.
    pub(crate) fn detach(&mut self) {
        if let Some(old) = self.parent.take() {
            self.previous_parent = Some(old);
        }
    }

    /// Attach to `parent`, remembering the parent being left.
    pub(crate) fn attach(&mut self, parent: ElementId) {
        self.detach();
        self.parent = Some(parent);
    }
}

/// An element on the canvas.
///
/// Bounds are derived from the [`Region`], so they are always the
/// integer-rounded box of the occupied area.
pub trait Element {
    /// Shared element state.
    fn core(&self) -> &ElementCore;

    /// Mutable shared element state.
    fn core_mut(&mut self) -> &mut ElementCore;

    /// The exact occupied area.
    fn region(&self) -> &Region;

    /// Vertices sampled when another element tests whether it contains this one.
    fn inclusion_points(&self) -> &[Point];

    /// Tagged id.
    fn key(&self) -> ElementKey;

    /// Identity.
    fn id(&self) -> ElementId {
        self.core().id
    }

    /// Integer-rounded bounding box.
    fn bounds(&self) -> Rect {
        self.region().bounds()
    }

    /// Top-left corner of [`bounds`](Self::bounds).
    fn top_left(&self) -> Point {
        self.bounds().origin()
    }

    /// Width of [`bounds`](Self::bounds).
    fn width(&self) -> f64 {
        self.bounds().width()
    }

    /// Height of [`bounds`](Self::bounds).
    fn height(&self) -> f64 {
        self.bounds().height()
    }

    /// Owning scrap, if any.
    fn parent(&self) -> Option<ElementId> {
        self.core().parent
    }

    /// Scrap that most recently released this element.
    fn previous_parent(&self) -> Option<ElementId> {
        self.core().previous_parent
    }

    /// State bits.
    fn flags(&self) -> ElementFlags {
        self.core().flags
    }

    /// Marked for removal by the next sweep.
    fn is_pending_delete(&self) -> bool {
        self.flags().contains(ElementFlags::PENDING_DELETE)
    }

    /// Rendered from live geometry.
    fn draws_vectorially(&self) -> bool {
        self.flags().contains(ElementFlags::DRAW_VECTORIALLY)
    }

    /// Bounds overlap along x (edges inclusive).
    fn intersects_x<E: Element + ?Sized>(&self, other: &E) -> bool
    where
        Self: Sized,
    {
        let (a, b) = (self.bounds(), other.bounds());
        a.x0 <= b.x1 && b.x0 <= a.x1
    }

    /// Bounds overlap along y (edges inclusive).
    fn intersects_y<E: Element + ?Sized>(&self, other: &E) -> bool
    where
        Self: Sized,
    {
        let (a, b) = (self.bounds(), other.bounds());
        a.y0 <= b.y1 && b.y0 <= a.y1
    }

    /// Exact point containment.
    fn contains_point(&self, pt: Point) -> bool {
        self.region().contains(pt)
    }

    /// Vertex containment: every inclusion point of `other` lies in this
    /// element's region.
    fn contains<E: Element + ?Sized>(&self, other: &E) -> bool
    where
        Self: Sized,
    {
        contains_all(self.region(), other.inclusion_points())
    }

    /// Size order: `width + height`, ties broken by creation order.
    fn cmp_size<E: Element + ?Sized>(&self, other: &E) -> Ordering
    where
        Self: Sized,
    {
        size_order(
            (self.width() + self.height(), self.id()),
            (other.width() + other.height(), other.id()),
        )
    }
}

pub(crate) fn size_order(a: (f64, ElementId), b: (f64, ElementId)) -> Ordering {
    a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
}
