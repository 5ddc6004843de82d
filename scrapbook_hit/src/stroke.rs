// Copyright 2025 the Scrapbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stroke-oriented helpers for precise hit testing.
//!
//! Freehand ink is modeled as a centerline plus a half-width, with round
//! joins and caps implied by the distance test. Variable width is not
//! modeled.

use kurbo::{Line, Point};

use crate::{HitKind, HitParams, HitScore, PreciseHitTest};

/// Distance from `pt` to the closest point of segment `line`.
pub fn distance_to_segment(line: Line, pt: Point) -> f64 {
    let v = line.p1 - line.p0;
    let w = pt - line.p0;
    let len2 = v.hypot2();
    let t = if len2 > 0.0 { w.dot(v) / len2 } else { 0.0 };
    let proj = line.p0 + v * t.clamp(0.0, 1.0);
    pt.distance(proj)
}

/// A simple stroked line segment (centerline + half-width).
#[derive(Clone, Copy, Debug)]
pub struct StrokedLine {
    /// The centerline segment.
    pub line: Line,
    /// Half of the stroke width.
    pub half_width: f64,
}

impl PreciseHitTest for StrokedLine {
    fn hit_test_local(&self, pt: Point, params: &HitParams) -> Option<HitScore> {
        let dist = distance_to_segment(self.line, pt);
        (dist <= self.half_width + params.stroke_tolerance).then_some(HitScore {
            distance: dist,
            kind: HitKind::Stroke,
        })
    }
}

/// A stroked open polyline borrowed from its owner.
///
/// A single point behaves like a round dab of radius `half_width`. An empty
/// polyline never hits.
#[derive(Clone, Copy, Debug)]
pub struct StrokedPolyline<'a> {
    /// Centerline vertices in drawing order.
    pub points: &'a [Point],
    /// Half of the stroke width.
    pub half_width: f64,
}

impl StrokedPolyline<'_> {
    /// Distance from `pt` to the nearest point of the centerline, or `None`
    /// for an empty polyline.
    pub fn centerline_distance(&self, pt: Point) -> Option<f64> {
        match self.points {
            [] => None,
            [only] => Some(pt.distance(*only)),
            points => points
                .windows(2)
                .map(|w| distance_to_segment(Line::new(w[0], w[1]), pt))
                .min_by(|a, b| a.partial_cmp(b).unwrap_or(core::cmp::Ordering::Equal)),
        }
    }
}

impl PreciseHitTest for StrokedPolyline<'_> {
    fn hit_test_local(&self, pt: Point, params: &HitParams) -> Option<HitScore> {
        let dist = self.centerline_distance(pt)?;
        (dist <= self.half_width + params.stroke_tolerance).then_some(HitScore {
            distance: dist,
            kind: HitKind::Stroke,
        })
    }
}
