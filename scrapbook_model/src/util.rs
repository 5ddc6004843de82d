// Copyright 2025 the Scrapbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Affine, Rect};
use scrapbook_index::Aabb2D;

pub(crate) fn rect_to_aabb(r: Rect) -> Aabb2D<f64> {
    Aabb2D::new(r.x0, r.y0, r.x1, r.y1)
}

pub(crate) fn aabb_to_rect(a: Aabb2D<f64>) -> Rect {
    Rect::new(a.min_x, a.min_y, a.max_x, a.max_y)
}

/// Uniform factor by which `affine` scales lengths (geometric mean of the axes).
pub(crate) fn length_scale(affine: Affine) -> f64 {
    affine.determinant().abs().sqrt()
}
