// Copyright 2025 the Scrapbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometry-level precise hit testing and occupied regions for sketch elements.
//!
//! This crate is the narrow phase under the scrapbook canvas model, built on
//! top of [`kurbo`]. The broad phase (`scrapbook_index`) culls candidates by
//! bounding box; the types here answer the exact questions afterwards.
//!
//! # Key types
//!
//! - [`HitParams`] – per-query tolerances for fills and stroked outlines.
//! - [`HitScore`] – a small scoring record `{ distance, kind }` for ranking
//!   candidates. Lower distance is preferred.
//! - [`PreciseHitTest`] – a trait implemented by shapes that can answer
//!   “does this point hit me?” queries.
//! - [`Region`] – the exact area an element occupies, with integer-rounded
//!   bounds and the vertex containment test used by grouping.
//!
//! ## Shapes and scope
//!
//! - [`Circle`] – treated as a filled disk (dots).
//! - [`BezPath`] – **fill-only** hit using [`kurbo::Shape::contains`], which
//!   applies the non-zero winding rule (closed borders).
//! - [`stroke::StrokedPolyline`] – distance to a polyline centerline against a
//!   half-width (freehand ink).

#![no_std]

extern crate alloc;

use core::cmp::Ordering;

use kurbo::{BezPath, Circle, ParamCurveNearest, Point, Rect, Shape};

mod region;
/// Stroke-oriented helpers and primitives.
pub mod stroke;

pub use region::{Region, contains_all};

/// What part of an element a point landed on.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HitKind {
    /// Inside a closed border or a dot.
    Fill,
    /// On (or near) a freehand line.
    Stroke,
}

/// Tolerances for a single hit query, in canvas units.
#[derive(Clone, Copy, Debug)]
pub struct HitParams {
    /// Slack around filled areas. Points this close to a fill's bounding box
    /// still count, scored at the tolerance distance.
    pub fill_tolerance: f64,
    /// Slack added to a line's half-width.
    pub stroke_tolerance: f64,
}

impl Default for HitParams {
    fn default() -> Self {
        Self {
            fill_tolerance: 0.0,
            stroke_tolerance: 0.0,
        }
    }
}

/// How well a point hit an element. Smaller distances rank first.
#[derive(Clone, Copy, Debug)]
pub struct HitScore {
    /// Distance past the element's edge; zero for a direct hit.
    pub distance: f64,
    /// Fill or line.
    pub kind: HitKind,
}

impl HitScore {
    /// A direct hit on a fill.
    pub const fn filled() -> Self {
        Self {
            distance: 0.0,
            kind: HitKind::Fill,
        }
    }

    /// Order by distance. NaN distances compare equal.
    pub fn cmp_distance(&self, other: &Self) -> Ordering {
        self.distance
            .partial_cmp(&other.distance)
            .unwrap_or(Ordering::Equal)
    }
}

/// Exact point queries against a piece of geometry.
///
/// Tolerances in [`HitParams`] are inclusive.
pub trait PreciseHitTest {
    /// Score `pt` against this geometry, or `None` on a miss.
    fn hit_test_local(&self, pt: Point, params: &HitParams) -> Option<HitScore>;
}

/// Filled disk; used for strokes collapsed into dots.
impl PreciseHitTest for Circle {
    fn hit_test_local(&self, pt: Point, params: &HitParams) -> Option<HitScore> {
        let dist = pt.distance(self.center);
        if dist <= self.radius + params.fill_tolerance {
            let distance = if dist <= self.radius {
                0.0
            } else {
                dist - self.radius
            };
            Some(HitScore {
                distance,
                kind: HitKind::Fill,
            })
        } else {
            None
        }
    }
}

/// Points this close to a path's outline count as on it.
const OUTLINE_EPSILON: f64 = 1e-9;

/// Filled path under the non-zero winding rule; used for closed borders.
///
/// The outline itself is inside, on every side. `fill_tolerance` inflates
/// the bounding box for near-miss behavior.
impl PreciseHitTest for BezPath {
    fn hit_test_local(&self, pt: Point, params: &HitParams) -> Option<HitScore> {
        let bounds = self.bounding_box();
        let inflated = if params.fill_tolerance > 0.0 {
            bounds.inflate(params.fill_tolerance, params.fill_tolerance)
        } else {
            bounds
        };
        if !contains_inclusive(inflated, pt) {
            return None;
        }
        if self.contains(pt) || on_outline(self, pt) {
            Some(HitScore::filled())
        } else if params.fill_tolerance > 0.0 {
            Some(HitScore {
                distance: params.fill_tolerance,
                kind: HitKind::Fill,
            })
        } else {
            None
        }
    }
}

/// `Rect::contains` with the max edges included.
pub(crate) fn contains_inclusive(r: Rect, pt: Point) -> bool {
    r.x0 <= pt.x && pt.x <= r.x1 && r.y0 <= pt.y && pt.y <= r.y1
}

// Winding tests are half-open along the outline.
fn on_outline(path: &BezPath, pt: Point) -> bool {
    let max_sq = OUTLINE_EPSILON * OUTLINE_EPSILON;
    path.segments()
        .any(|seg| seg.nearest(pt, OUTLINE_EPSILON).distance_sq <= max_sq)
}
