// Copyright 2025 the Scrapbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Read-only views handed to renderers.
//!
//! The canvas is mutated on one thread. Renderers receive an immutable,
//! reference-counted [`Snapshot`] built after a turn, so drawing never
//! observes a half-applied edit.

use std::sync::Arc;

use kurbo::{Affine, BezPath, Rect};

use crate::canvas::Canvas;
use crate::element::Element;
use crate::error::SnapshotError;
use crate::types::{Color, ElementFlags, ElementId, ElementKey, LineStyle};

/// Produces the cached raster of a scrap's contents before an edit.
///
/// Implemented by the rendering backend. Failure is never fatal: the scrap
/// just keeps drawing its members from live geometry.
pub trait SnapshotRenderer {
    /// Render scrap `scrap` of `canvas` at `scale_factor` device pixels per
    /// canvas unit.
    fn render_snapshot(
        &mut self,
        canvas: &Canvas,
        scrap: ElementId,
        scale_factor: f64,
    ) -> Result<(), SnapshotError>;
}

/// One drawable element.
#[derive(Clone, Debug)]
pub struct DrawItem {
    /// What this draws.
    pub key: ElementKey,
    /// Owning scrap.
    pub parent: Option<ElementId>,
    /// Outline or centerline, in canvas space.
    pub path: BezPath,
    /// Integer-rounded bounds.
    pub bounds: Rect,
    /// Pen color.
    pub color: Color,
    /// Pen width.
    pub width: f64,
    /// Dash pattern.
    pub style: LineStyle,
    /// Closed shapes are filled.
    pub filled: bool,
    /// State bits at the time of the snapshot.
    pub flags: ElementFlags,
    /// For scraps under edit: where to draw the cached raster. Identity otherwise.
    pub snapshot_transform: Affine,
}

impl DrawItem {
    /// Whether the renderer should draw live geometry for this item.
    pub fn draws_vectorially(&self) -> bool {
        self.flags.contains(ElementFlags::DRAW_VECTORIALLY)
    }
}

/// Everything visible on the canvas at one point in time.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    /// Increases with every snapshot taken from the same canvas.
    pub generation: u64,
    /// Scraps first, then strokes, each in sweep order.
    pub items: Vec<DrawItem>,
}

impl Snapshot {
    /// Items whose bounds overlap `view`.
    pub fn visible(&self, view: Rect) -> impl Iterator<Item = &DrawItem> + '_ {
        self.items.iter().filter(move |item| {
            let b = item.bounds;
            b.x0 <= view.x1 && view.x0 <= b.x1 && b.y0 <= view.y1 && view.y0 <= b.y1
        })
    }

    /// Look up one element.
    pub fn get(&self, key: ElementKey) -> Option<&DrawItem> {
        self.items.iter().find(|item| item.key == key)
    }
}

pub(crate) fn build(canvas: &Canvas, generation: u64) -> Arc<Snapshot> {
    let live_scraps = canvas.scraps().iter().filter(|s| !s.is_pending_delete());
    let live_strokes = canvas.strokes().iter().filter(|s| !s.is_pending_delete());
    let mut items = Vec::with_capacity(canvas.scraps().len() + canvas.strokes().len());
    for scrap in live_scraps {
        let border = scrap.border();
        items.push(DrawItem {
            key: scrap.key(),
            parent: scrap.parent(),
            path: border.path().clone(),
            bounds: scrap.bounds(),
            color: border.color(),
            width: border.stroke_width(),
            style: border.style(),
            filled: false,
            flags: scrap.flags(),
            snapshot_transform: scrap.snapshot_transform(),
        });
    }
    for stroke in live_strokes {
        items.push(DrawItem {
            key: stroke.key(),
            parent: stroke.parent(),
            path: stroke.path().clone(),
            bounds: stroke.bounds(),
            color: stroke.color(),
            width: stroke.stroke_width(),
            style: stroke.style(),
            filled: stroke.is_closed(),
            flags: stroke.flags(),
            snapshot_transform: Affine::IDENTITY,
        });
    }
    Arc::new(Snapshot { generation, items })
}
