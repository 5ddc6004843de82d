// Copyright 2025 the Scrapbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Damage summary types returned from [`Canvas::take_damage`](crate::Canvas::take_damage).

use kurbo::Rect;
use scrapbook_index::Damage as IndexDamage;

use crate::util::aabb_to_rect;

/// Canvas areas that should be repainted.
#[derive(Clone, Debug, Default)]
pub struct Damage {
    /// Canvas-space rectangles; they may overlap and are not a minimal cover.
    pub dirty_rects: Vec<Rect>,
}

impl Damage {
    /// Returns the union of all damage rects.
    pub fn union_rect(&self) -> Option<Rect> {
        let mut it = self.dirty_rects.iter().copied();
        let first = it.next()?;
        Some(it.fold(first, |acc, r| acc.union(r)))
    }

    /// True if nothing needs repainting.
    pub fn is_empty(&self) -> bool {
        self.dirty_rects.is_empty()
    }

    pub(crate) fn absorb(&mut self, index: &IndexDamage<f64>) {
        self.dirty_rects.extend(index.boxes().map(aabb_to_rect));
    }

    pub(crate) fn push(&mut self, rect: Rect) {
        self.dirty_rects.push(rect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_of_nothing_is_none() {
        assert!(Damage::default().union_rect().is_none());
    }

    #[test]
    fn union_covers_every_rect() {
        let mut d = Damage::default();
        d.push(Rect::new(0.0, 0.0, 1.0, 1.0));
        d.push(Rect::new(5.0, -2.0, 6.0, 0.0));
        assert_eq!(d.union_rect(), Some(Rect::new(0.0, -2.0, 6.0, 1.0)));
    }
}
