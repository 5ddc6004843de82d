// Copyright 2025 the Scrapbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Exact occupied areas with integer-rounded bounds.

use alloc::vec::Vec;

use kurbo::{BezPath, Circle, Point, Rect, Shape};

use crate::stroke::StrokedPolyline;
use crate::{HitParams, HitScore, PreciseHitTest, contains_inclusive};

#[derive(Clone, Debug)]
enum Area {
    Empty,
    Fill(BezPath),
    Stroked { points: Vec<Point>, half_width: f64 },
    Disk(Circle),
}

/// The exact area an element occupies.
///
/// [`Region::bounds`] is the tight bounding box of the area rounded outward to
/// whole device units, so it always encloses the area and two regions built
/// from the same geometry have identical bounds.
#[derive(Clone, Debug)]
pub struct Region {
    area: Area,
    bounds: Rect,
}

impl Default for Region {
    fn default() -> Self {
        Self::empty()
    }
}

impl Region {
    /// A region that contains nothing and is contained by nothing.
    pub const fn empty() -> Self {
        Self {
            area: Area::Empty,
            bounds: Rect::ZERO,
        }
    }

    /// The fill of a closed path, non-zero winding.
    pub fn fill(path: BezPath) -> Self {
        if path.elements().is_empty() {
            return Self::empty();
        }
        let bounds = path.bounding_box().expand();
        Self {
            area: Area::Fill(path),
            bounds,
        }
    }

    /// The stroked outline of an open polyline with round joins and caps.
    pub fn stroked(points: &[Point], half_width: f64) -> Self {
        let Some(bounds) = points_bounds(points) else {
            return Self::empty();
        };
        Self {
            area: Area::Stroked {
                points: points.to_vec(),
                half_width,
            },
            bounds: bounds.inflate(half_width, half_width).expand(),
        }
    }

    /// A filled disk.
    pub fn disk(circle: Circle) -> Self {
        Self {
            bounds: circle.bounding_box().expand(),
            area: Area::Disk(circle),
        }
    }

    /// Extend a stroked region by one centerline vertex.
    ///
    /// Bounds grow to cover the new vertex. An empty region becomes a
    /// one-point stroke of `half_width`.
    pub fn push_stroke_point(&mut self, pt: Point, half_width: f64) {
        let dab = Rect::from_center_size(pt, (2.0 * half_width, 2.0 * half_width)).expand();
        match &mut self.area {
            Area::Stroked { points, .. } => {
                points.push(pt);
                self.bounds = self.bounds.union(dab);
            }
            _ => *self = Self::stroked(&[pt], half_width),
        }
    }

    /// Whether the region occupies no area at all.
    pub fn is_empty(&self) -> bool {
        matches!(self.area, Area::Empty)
    }

    /// Integer-rounded bounding box of the region.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Precise hit test with tolerances.
    pub fn hit(&self, pt: Point, params: &HitParams) -> Option<HitScore> {
        match &self.area {
            Area::Empty => None,
            Area::Fill(path) => path.hit_test_local(pt, params),
            Area::Stroked { points, half_width } => StrokedPolyline {
                points,
                half_width: *half_width,
            }
            .hit_test_local(pt, params),
            Area::Disk(circle) => circle.hit_test_local(pt, params),
        }
    }

    /// Exact point containment, with no tolerance.
    pub fn contains(&self, pt: Point) -> bool {
        contains_inclusive(self.bounds, pt) && self.hit(pt, &HitParams::default()).is_some()
    }

    /// See [`contains_all`].
    pub fn contains_all(&self, points: &[Point]) -> bool {
        contains_all(self, points)
    }
}

/// Vertex containment: whether every point lies inside `region`.
///
/// This samples only the given vertices, so a concave region can accept a
/// polygon whose edges leave it between vertices. An empty point list or an
/// empty region yields `false`.
pub fn contains_all(region: &Region, points: &[Point]) -> bool {
    !points.is_empty() && !region.is_empty() && points.iter().all(|p| region.contains(*p))
}

fn points_bounds(points: &[Point]) -> Option<Rect> {
    let (first, rest) = points.split_first()?;
    Some(
        rest.iter()
            .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> BezPath {
        let mut path = BezPath::new();
        path.move_to((x0, y0));
        path.line_to((x0 + size, y0));
        path.line_to((x0 + size, y0 + size));
        path.line_to((x0, y0 + size));
        path.close_path();
        path
    }

    #[test]
    fn bounds_round_outward() {
        let region = Region::fill(square(0.4, 0.6, 9.2));
        assert_eq!(region.bounds(), Rect::new(0.0, 0.0, 10.0, 10.0));

        let stroke = Region::stroked(&[Point::new(1.5, 1.5), Point::new(4.2, 1.5)], 0.5);
        assert_eq!(stroke.bounds(), Rect::new(1.0, 1.0, 5.0, 2.0));
    }

    #[test]
    fn push_point_grows_bounds() {
        let mut region = Region::empty();
        region.push_stroke_point(Point::new(0.0, 0.0), 1.0);
        assert_eq!(region.bounds(), Rect::new(-1.0, -1.0, 1.0, 1.0));
        region.push_stroke_point(Point::new(10.0, 0.0), 1.0);
        assert_eq!(region.bounds(), Rect::new(-1.0, -1.0, 11.0, 1.0));
        assert!(region.contains(Point::new(5.0, 0.5)));
        assert_eq!(
            region.bounds(),
            Region::stroked(&[Point::new(0.0, 0.0), Point::new(10.0, 0.0)], 1.0).bounds()
        );
    }

    #[test]
    fn vertex_containment() {
        let region = Region::fill(square(0.0, 0.0, 100.0));
        let inside = [Point::new(10.0, 10.0), Point::new(90.0, 50.0)];
        let straddling = [Point::new(90.0, 50.0), Point::new(110.0, 50.0)];
        assert!(contains_all(&region, &inside));
        assert!(!contains_all(&region, &straddling));
        assert!(!contains_all(&region, &[]));
        assert!(!contains_all(&Region::empty(), &inside));
    }

    #[test]
    fn vertex_containment_includes_every_edge() {
        let region = Region::fill(square(0.0, 0.0, 100.0));
        let left_top = [Point::new(0.0, 20.0), Point::new(40.0, 0.0)];
        let right_bottom = [Point::new(100.0, 20.0), Point::new(40.0, 100.0)];
        assert!(contains_all(&region, &left_top));
        assert!(contains_all(&region, &right_bottom));
        assert!(!contains_all(&region, &[Point::new(100.001, 20.0)]));
    }

    #[test]
    fn concave_region_accepts_by_vertices_only() {
        // A "U" shape: the notch between the arms is outside.
        let mut u = BezPath::new();
        u.move_to((0.0, 0.0));
        u.line_to((30.0, 0.0));
        u.line_to((30.0, 30.0));
        u.line_to((20.0, 30.0));
        u.line_to((20.0, 10.0));
        u.line_to((10.0, 10.0));
        u.line_to((10.0, 30.0));
        u.line_to((0.0, 30.0));
        u.close_path();
        let region = Region::fill(u);
        // A segment bridging the notch has both vertices inside the arms.
        let bridge = [Point::new(5.0, 25.0), Point::new(25.0, 25.0)];
        assert!(contains_all(&region, &bridge));
        assert!(!region.contains(Point::new(15.0, 25.0)));
    }

    #[test]
    fn disk_region() {
        let region = Region::disk(Circle::new((5.0, 5.0), 2.5));
        assert_eq!(region.bounds(), Rect::new(2.0, 2.0, 8.0, 8.0));
        assert!(region.contains(Point::new(5.0, 6.0)));
        assert!(!region.contains(Point::new(2.2, 2.2)));
    }
}
