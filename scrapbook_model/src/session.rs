// Copyright 2025 the Scrapbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Turning pointer gestures into strokes.

use kurbo::Point;
use tracing::trace;

use crate::config::CanvasConfig;
use crate::element::Element;
use crate::stroke::Stroke;
use crate::types::{Color, LineStyle};

/// Phase of a pointer gesture.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum GesturePhase {
    /// Pointer down.
    Begin,
    /// Pointer moved while down.
    Continue,
    /// Pointer up.
    End,
    /// The gesture was taken over or aborted.
    Cancel,
}

/// One pointer sample, in canvas coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GestureEvent {
    /// Gesture phase.
    pub phase: GesturePhase,
    /// Pointer position.
    pub point: Point,
}

impl GestureEvent {
    /// Convenience constructor.
    pub fn new(phase: GesturePhase, point: impl Into<Point>) -> Self {
        Self {
            phase,
            point: point.into(),
        }
    }
}

/// What a session draws.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum DrawMode {
    /// Ink strokes.
    #[default]
    Ink,
    /// Ghost boundaries for grouping.
    Lasso,
}

/// A finished gesture.
#[derive(Clone, Debug)]
pub enum Gesture {
    /// A completed ink stroke (or dot, for a tap).
    Ink(Stroke),
    /// A completed lasso, ready for [`Canvas::commit_group`](crate::Canvas::commit_group).
    Lasso(Stroke),
}

/// The stroke currently being drawn.
///
/// Owned by the caller and fed one [`GestureEvent`] at a time. The stroke in
/// progress is not on the canvas; [`current`](Self::current) exposes it for
/// live rendering.
#[derive(Clone, Debug)]
pub struct DrawSession {
    mode: DrawMode,
    color: Color,
    width: f64,
    style: LineStyle,
    lasso: (Color, f64, LineStyle),
    min_distance: f64,
    current: Option<Stroke>,
}

impl DrawSession {
    /// A session drawing with the pen from `config`.
    pub fn new(mode: DrawMode, config: &CanvasConfig) -> Self {
        Self {
            mode,
            color: config.ink_color,
            width: config.ink_width,
            style: config.ink_style,
            lasso: (config.lasso_color, config.lasso_width, config.lasso_style),
            min_distance: config.min_point_distance,
            current: None,
        }
    }

    /// Switch modes. Drops any gesture in progress.
    pub fn set_mode(&mut self, mode: DrawMode) {
        self.mode = mode;
        self.current = None;
    }

    /// Current mode.
    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    /// Change the ink pen for subsequent strokes. The lasso pen is unaffected.
    pub fn set_pen(&mut self, color: Color, width: f64, style: LineStyle) {
        self.color = color;
        self.width = width;
        self.style = style;
    }

    /// The stroke in progress.
    pub fn current(&self) -> Option<&Stroke> {
        self.current.as_ref()
    }

    /// Feed one event. Returns a finished gesture on [`GesturePhase::End`].
    ///
    /// An ink tap becomes a dot. A lasso with fewer than three points
    /// cannot enclose anything and is discarded, as is any gesture that is
    /// cancelled. Samples arriving without a preceding `Begin` are ignored.
    pub fn feed(&mut self, event: GestureEvent) -> Option<Gesture> {
        match event.phase {
            GesturePhase::Begin => {
                let mut stroke = match self.mode {
                    DrawMode::Ink => Stroke::new(self.color, self.width, self.style),
                    DrawMode::Lasso => {
                        let (color, width, style) = self.lasso;
                        Stroke::new(color, width, style).into_ghost()
                    }
                };
                stroke.add_point(event.point, self.min_distance);
                self.current = Some(stroke);
                None
            }
            GesturePhase::Continue => {
                if let Some(stroke) = &mut self.current {
                    stroke.add_point(event.point, self.min_distance);
                }
                None
            }
            GesturePhase::End => {
                let mut stroke = self.current.take()?;
                stroke.add_point(event.point, self.min_distance);
                self.finish(stroke)
            }
            GesturePhase::Cancel => {
                self.current = None;
                None
            }
        }
    }

    fn finish(&self, mut stroke: Stroke) -> Option<Gesture> {
        match self.mode {
            DrawMode::Ink => {
                if stroke.points().len() == 1 {
                    stroke.turn_into_dot();
                }
                trace!(stroke = %stroke.id(), points = stroke.points().len(), "ink finished");
                Some(Gesture::Ink(stroke))
            }
            DrawMode::Lasso if stroke.points().len() >= 3 => {
                stroke.close();
                Some(Gesture::Lasso(stroke))
            }
            DrawMode::Lasso => None,
        }
    }
}
