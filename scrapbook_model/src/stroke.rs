// Copyright 2025 the Scrapbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Strokes: freehand ink, dots, and the closed shapes used as scrap borders.

use kurbo::{Affine, BezPath, Circle, Point, Rect, Shape, Vec2};
use scrapbook_hit::Region;
use serde::{Deserialize, Serialize};

use crate::element::{Element, ElementCore};
use crate::types::{Color, ElementFlags, ElementId, ElementKey, LineStyle};
use crate::util::{length_scale, rect_to_aabb};

/// Pen width used by [`Stroke::polyline`].
pub const DEFAULT_WIDTH: f64 = 3.0;

/// Geometry variant of a stroke.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrokeShape {
    /// Points joined by straight segments. A closed polyline is filled.
    Polyline {
        /// Whether the last point joins back to the first.
        #[serde(default)]
        closed: bool,
    },
    /// A filled circle around the first point.
    Dot {
        /// Circle radius.
        radius: f64,
    },
    /// A closed polygon through four or more anchors.
    Rectangle,
    /// A closed polygon through four or more anchors with rounded corners.
    RoundedRectangle {
        /// Corner radius, clamped per corner to half the shorter adjacent edge.
        radius: f64,
    },
}

impl Default for StrokeShape {
    fn default() -> Self {
        Self::Polyline { closed: false }
    }
}

impl StrokeShape {
    /// Whether the shape encloses an area.
    pub fn is_closed(self) -> bool {
        !matches!(self, Self::Polyline { closed: false })
    }
}

/// A drawn stroke.
///
/// The rendered path and the occupied region are rebuilt from the points and
/// shape whenever either changes. Appending to open ink is incremental.
#[derive(Clone, Debug)]
pub struct Stroke {
    core: ElementCore,
    points: Vec<Point>,
    shape: StrokeShape,
    color: Color,
    width: f64,
    style: LineStyle,
    path: BezPath,
    region: Region,
}

impl PartialEq for Stroke {
    fn eq(&self, other: &Self) -> bool {
        self.core.id == other.core.id
    }
}

impl Eq for Stroke {}

impl Stroke {
    /// An empty open stroke with the given pen.
    pub fn new(color: Color, width: f64, style: LineStyle) -> Self {
        Self::from_parts(
            ElementId::fresh(),
            Vec::new(),
            StrokeShape::default(),
            color,
            width,
            style,
        )
    }

    /// Open black ink of [`DEFAULT_WIDTH`] through `points`.
    pub fn polyline(points: &[Point]) -> Self {
        Self::from_parts(
            ElementId::fresh(),
            points.to_vec(),
            StrokeShape::default(),
            Color::BLACK,
            DEFAULT_WIDTH,
            LineStyle::Solid,
        )
    }

    /// A closed shape through `anchors`, optionally with rounded corners.
    ///
    /// Returns `None` with fewer than four anchors.
    pub fn from_anchors(anchors: &[Point], corner_radius: Option<f64>) -> Option<Self> {
        if anchors.len() < 4 {
            return None;
        }
        let shape = match corner_radius {
            Some(radius) if radius > 0.0 => StrokeShape::RoundedRectangle { radius },
            _ => StrokeShape::Rectangle,
        };
        Some(Self::from_parts(
            ElementId::fresh(),
            anchors.to_vec(),
            shape,
            Color::BLACK,
            DEFAULT_WIDTH,
            LineStyle::Solid,
        ))
    }

    /// Axis-aligned rectangle, corners in clockwise order from the top left.
    pub fn rectangle(rect: Rect) -> Self {
        let corners = rect_corners(rect);
        Self::from_parts(
            ElementId::fresh(),
            corners.to_vec(),
            StrokeShape::Rectangle,
            Color::BLACK,
            DEFAULT_WIDTH,
            LineStyle::Solid,
        )
    }

    /// Axis-aligned rectangle with rounded corners.
    pub fn rounded_rectangle(rect: Rect, radius: f64) -> Self {
        let corners = rect_corners(rect);
        Self::from_parts(
            ElementId::fresh(),
            corners.to_vec(),
            StrokeShape::RoundedRectangle { radius },
            Color::BLACK,
            DEFAULT_WIDTH,
            LineStyle::Solid,
        )
    }

    /// A filled dot.
    pub fn dot(center: Point, radius: f64) -> Self {
        Self::from_parts(
            ElementId::fresh(),
            vec![center],
            StrokeShape::Dot { radius },
            Color::BLACK,
            DEFAULT_WIDTH,
            LineStyle::Solid,
        )
    }

    pub(crate) fn from_parts(
        id: ElementId,
        points: Vec<Point>,
        shape: StrokeShape,
        color: Color,
        width: f64,
        style: LineStyle,
    ) -> Self {
        let mut stroke = Self {
            core: ElementCore::new(id),
            points,
            shape,
            color,
            width,
            style,
            path: BezPath::new(),
            region: Region::empty(),
        };
        stroke.set_boundary();
        stroke
    }

    /// Same pen and geometry under a new id, detached from any scrap.
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.core = ElementCore::new(ElementId::fresh());
        copy.core.flags |= self.core.flags & ElementFlags::GHOST;
        copy
    }

    /// Replace the pen.
    pub fn with_pen(mut self, color: Color, width: f64, style: LineStyle) -> Self {
        self.color = color;
        self.width = width;
        self.style = style;
        self.set_boundary();
        self
    }

    /// Mark as a ghost: a boundary that grouping never adopts.
    pub fn into_ghost(mut self) -> Self {
        self.core.flags.insert(ElementFlags::GHOST);
        self
    }

    /// Whether this is a ghost boundary.
    pub fn is_ghost(&self) -> bool {
        self.core.flags.contains(ElementFlags::GHOST)
    }

    /// Anchor or sample points.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Geometry variant.
    pub fn shape(&self) -> StrokeShape {
        self.shape
    }

    /// Whether the stroke encloses an area.
    pub fn is_closed(&self) -> bool {
        self.shape.is_closed()
    }

    /// Pen color.
    pub fn color(&self) -> Color {
        self.color
    }

    /// Pen width.
    pub fn stroke_width(&self) -> f64 {
        self.width
    }

    /// Dash pattern.
    pub fn style(&self) -> LineStyle {
        self.style
    }

    /// Rendered path.
    pub fn path(&self) -> &BezPath {
        &self.path
    }

    /// Append a sample.
    ///
    /// The sample is dropped, and `false` returned, when it lies closer than
    /// `min_distance` to the last point along both axes.
    pub fn add_point(&mut self, pt: Point, min_distance: f64) -> bool {
        if let Some(last) = self.points.last()
            && (pt.x - last.x).abs() < min_distance
            && (pt.y - last.y).abs() < min_distance
        {
            return false;
        }
        self.points.push(pt);
        if self.shape == (StrokeShape::Polyline { closed: false }) {
            if self.points.len() == 1 {
                self.path.move_to(pt);
            } else {
                self.path.line_to(pt);
            }
            self.region.push_stroke_point(pt, self.width / 2.0);
        } else {
            self.set_boundary();
        }
        true
    }

    /// Collapse into a filled dot at the first point.
    ///
    /// Used when a gesture turns out to be a tap.
    pub fn turn_into_dot(&mut self) {
        let Some(&center) = self.points.first() else {
            return;
        };
        self.points = vec![center];
        self.shape = StrokeShape::Dot {
            radius: (self.width / 2.0).max(0.5),
        };
        self.set_boundary();
    }

    /// Join the last point back to the first. Only affects open polylines.
    pub fn close(&mut self) {
        if self.shape == (StrokeShape::Polyline { closed: false }) {
            self.shape = StrokeShape::Polyline { closed: true };
            self.set_boundary();
        }
    }

    /// Map every point through `affine` and rebuild.
    ///
    /// Radii follow the transform's uniform scale; the pen width does not.
    pub fn transform(&mut self, affine: Affine) {
        for p in &mut self.points {
            *p = affine * *p;
        }
        match &mut self.shape {
            StrokeShape::Dot { radius } | StrokeShape::RoundedRectangle { radius } => {
                *radius *= length_scale(affine);
            }
            StrokeShape::Polyline { .. } | StrokeShape::Rectangle => {}
        }
        self.set_boundary();
    }

    /// Rebuild the rendered path and occupied region from points and shape.
    pub fn set_boundary(&mut self) {
        let half = self.width / 2.0;
        let (path, region) = match (self.shape, self.points.as_slice()) {
            (_, []) => (BezPath::new(), Region::empty()),
            (StrokeShape::Dot { radius }, [center, ..]) => {
                let circle = Circle::new(*center, radius);
                (circle.to_path(0.1), Region::disk(circle))
            }
            (StrokeShape::Polyline { closed }, points) => {
                let path = polyline_path(points, closed);
                if closed && points.len() >= 3 {
                    (path.clone(), Region::fill(path))
                } else {
                    (path, Region::stroked(points, half))
                }
            }
            (StrokeShape::Rectangle, points) => {
                let path = polyline_path(points, true);
                (path.clone(), Region::fill(path))
            }
            (StrokeShape::RoundedRectangle { radius }, points) => {
                let path = rounded_polygon_path(points, radius);
                (path.clone(), Region::fill(path))
            }
        };
        self.path = path;
        self.region = region;
    }

    /// Turn a lasso into a closed scrap border with the given pen.
    pub(crate) fn into_border(mut self, color: Color, width: f64) -> Self {
        self.core.flags.remove(ElementFlags::GHOST);
        self.color = color;
        self.width = width;
        if let StrokeShape::Polyline { .. } = self.shape {
            self.shape = StrokeShape::Polyline { closed: true };
        }
        self.set_boundary();
        self
    }
}

impl Element for Stroke {
    fn core(&self) -> &ElementCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ElementCore {
        &mut self.core
    }

    fn region(&self) -> &Region {
        &self.region
    }

    fn inclusion_points(&self) -> &[Point] {
        &self.points
    }

    fn key(&self) -> ElementKey {
        ElementKey::Stroke(self.core.id)
    }
}

impl scrapbook_index::Indexed<f64> for Stroke {
    type Id = ElementId;

    fn id(&self) -> ElementId {
        self.core.id
    }

    fn aabb(&self) -> scrapbook_index::Aabb2D<f64> {
        rect_to_aabb(self.region.bounds())
    }

    fn contains_point(&self, x: f64, y: f64) -> bool {
        self.region.contains(Point::new(x, y))
    }
}

fn rect_corners(rect: Rect) -> [Point; 4] {
    [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ]
}

fn polyline_path(points: &[Point], closed: bool) -> BezPath {
    let mut path = BezPath::new();
    let Some((first, rest)) = points.split_first() else {
        return path;
    };
    path.move_to(*first);
    for p in rest {
        path.line_to(*p);
    }
    if closed {
        path.close_path();
    }
    path
}

fn rounded_polygon_path(points: &[Point], radius: f64) -> BezPath {
    let n = points.len();
    let mut path = BezPath::new();
    for i in 0..n {
        let corner = points[i];
        let prev = points[(i + n - 1) % n];
        let next = points[(i + 1) % n];
        let r = radius
            .min(corner.distance(prev) / 2.0)
            .min(corner.distance(next) / 2.0);
        let enter = toward(corner, prev, r);
        let leave = toward(corner, next, r);
        if i == 0 {
            path.move_to(enter);
        } else {
            path.line_to(enter);
        }
        path.quad_to(corner, leave);
    }
    path.close_path();
    path
}

fn toward(from: Point, to: Point, distance: f64) -> Point {
    let d: Vec2 = to - from;
    let len = d.hypot();
    if len > 0.0 {
        from + d * (distance / len)
    } else {
        from
    }
}
