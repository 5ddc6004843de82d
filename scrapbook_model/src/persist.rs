// Copyright 2025 the Scrapbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Document records and the two-pass canvas loader.
//!
//! Strokes are stored flat. Scraps store their border inline and their
//! members as id lists, which are resolved once every element exists.

use std::collections::BTreeSet;

use hashbrown::{HashMap, HashSet};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::canvas::Canvas;
use crate::config::CanvasConfig;
use crate::element::Element;
use crate::error::LoadError;
use crate::scrap::Scrap;
use crate::stroke::{Stroke, StrokeShape};
use crate::types::{Color, ElementId, ElementKey, LineStyle};

/// Format version written by [`Canvas::to_record`].
pub const FORMAT_VERSION: u32 = 1;

/// Geometry tag of a stored stroke. Records without one are polylines.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeTag {
    /// [`StrokeShape::Polyline`].
    #[default]
    Polyline,
    /// [`StrokeShape::Dot`].
    Dot,
    /// [`StrokeShape::Rectangle`].
    Rectangle,
    /// [`StrokeShape::RoundedRectangle`].
    RoundedRectangle,
}

/// A stored stroke.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrokeRecord {
    /// Element id.
    pub id: ElementId,
    /// Geometry tag.
    #[serde(default, rename = "type")]
    pub shape: ShapeTag,
    /// Pen color.
    #[serde(default)]
    pub color: Color,
    /// Pen width.
    pub width: f64,
    /// Dash pattern.
    #[serde(default)]
    pub style: LineStyle,
    /// Points in drawing order.
    pub points: Vec<(f64, f64)>,
    /// Dot or corner radius.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    /// Closed polyline.
    #[serde(default, skip_serializing_if = "is_false")]
    pub closed: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// A stored scrap.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScrapRecord {
    /// Element id.
    pub id: ElementId,
    /// Border stroke.
    pub border: StrokeRecord,
    /// Member stroke ids.
    #[serde(default)]
    pub strokes: Vec<ElementId>,
    /// Member scrap ids.
    #[serde(default)]
    pub scraps: Vec<ElementId>,
}

/// A stored canvas.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanvasRecord {
    /// Format version.
    #[serde(default = "format_version")]
    pub version: u32,
    /// Every live stroke.
    #[serde(default)]
    pub strokes: Vec<StrokeRecord>,
    /// Every live scrap.
    #[serde(default)]
    pub scraps: Vec<ScrapRecord>,
}

fn format_version() -> u32 {
    FORMAT_VERSION
}

impl Stroke {
    /// Describe this stroke for storage.
    pub fn to_record(&self) -> StrokeRecord {
        let (shape, radius, closed) = match self.shape() {
            StrokeShape::Polyline { closed } => (ShapeTag::Polyline, None, closed),
            StrokeShape::Dot { radius } => (ShapeTag::Dot, Some(radius), false),
            StrokeShape::Rectangle => (ShapeTag::Rectangle, None, false),
            StrokeShape::RoundedRectangle { radius } => {
                (ShapeTag::RoundedRectangle, Some(radius), false)
            }
        };
        StrokeRecord {
            id: self.id(),
            shape,
            color: self.color(),
            width: self.stroke_width(),
            style: self.style(),
            points: self.points().iter().map(|p| (p.x, p.y)).collect(),
            radius,
            closed,
        }
    }

    /// Rebuild a stroke from storage, reserving its id.
    pub fn from_record(record: &StrokeRecord) -> Result<Self, LoadError> {
        let id = ElementId::observe(record.id.get());
        let invalid = |reason| LoadError::InvalidStroke { id, reason };
        if !(record.width.is_finite() && record.width > 0.0) {
            return Err(invalid("width must be positive and finite"));
        }
        if record
            .points
            .iter()
            .any(|(x, y)| !(x.is_finite() && y.is_finite()))
        {
            return Err(invalid("points must be finite"));
        }
        let radius = record.radius.filter(|r| r.is_finite() && *r >= 0.0);
        let shape = match record.shape {
            ShapeTag::Polyline => StrokeShape::Polyline {
                closed: record.closed,
            },
            ShapeTag::Dot => StrokeShape::Dot {
                radius: radius.unwrap_or(record.width / 2.0),
            },
            ShapeTag::Rectangle => StrokeShape::Rectangle,
            ShapeTag::RoundedRectangle => StrokeShape::RoundedRectangle {
                radius: radius.unwrap_or(0.0),
            },
        };
        let points = record
            .points
            .iter()
            .map(|&(x, y)| Point::new(x, y))
            .collect();
        Ok(Self::from_parts(
            id,
            points,
            shape,
            record.color,
            record.width,
            record.style,
        ))
    }
}

impl Canvas {
    /// Describe every live, non-ghost element for storage.
    pub fn to_record(&self) -> CanvasRecord {
        let strokes = self
            .strokes
            .iter()
            .filter(|s| !s.is_pending_delete() && !s.is_ghost())
            .map(Stroke::to_record)
            .collect();
        let scraps = self
            .scraps
            .iter()
            .filter(|s| !s.is_pending_delete())
            .map(|s| ScrapRecord {
                id: s.id(),
                border: s.border().to_record(),
                strokes: s.strokes().collect(),
                scraps: s.scraps().collect(),
            })
            .collect();
        CanvasRecord {
            version: FORMAT_VERSION,
            strokes,
            scraps,
        }
    }

    /// Serialize [`to_record`](Self::to_record) as JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_record())
    }

    /// Rebuild a canvas from storage.
    ///
    /// Elements are created first; member lists are resolved in a second
    /// pass. Members that name no stored element are logged and skipped.
    /// Ids are reserved so elements created afterwards never collide.
    pub fn from_record(record: &CanvasRecord, config: CanvasConfig) -> Result<Self, LoadError> {
        let mut strokes: HashMap<ElementId, Stroke> =
            HashMap::with_capacity(record.strokes.len());
        for rec in &record.strokes {
            let stroke = Stroke::from_record(rec)?;
            if strokes.insert(stroke.id(), stroke).is_some() {
                return Err(LoadError::DuplicateId(rec.id));
            }
        }
        let mut scraps: HashMap<ElementId, Scrap> =
            HashMap::with_capacity(record.scraps.len());
        for rec in &record.scraps {
            let border = Stroke::from_record(&rec.border)?;
            let id = ElementId::observe(rec.id.get());
            let clash = strokes.contains_key(&id);
            if clash || scraps.insert(id, Scrap::with_id(id, border)).is_some() {
                return Err(LoadError::DuplicateId(id));
            }
        }

        let mut owner: HashMap<ElementKey, ElementId> = HashMap::new();
        for rec in &record.scraps {
            let children = rec
                .strokes
                .iter()
                .map(|id| ElementKey::Stroke(*id))
                .chain(rec.scraps.iter().map(|id| ElementKey::Scrap(*id)));
            for key in children {
                let exists = match key {
                    ElementKey::Stroke(id) => strokes.contains_key(&id),
                    ElementKey::Scrap(id) => scraps.contains_key(&id),
                };
                if !exists {
                    warn!(
                        scrap = %rec.id,
                        child = %key.id(),
                        "dangling member reference skipped"
                    );
                    continue;
                }
                if key == ElementKey::Scrap(rec.id) {
                    return Err(LoadError::OwnershipCycle(rec.id));
                }
                if let Some(first) = owner.insert(key, rec.id)
                    && first != rec.id
                {
                    return Err(LoadError::SharedChild {
                        child: key.id(),
                        first,
                        second: rec.id,
                    });
                }
            }
        }
        for &start in scraps.keys() {
            let mut seen = HashSet::new();
            let mut current = start;
            while let Some(&parent) = owner.get(&ElementKey::Scrap(current)) {
                if parent == start || !seen.insert(parent) {
                    return Err(LoadError::OwnershipCycle(start));
                }
                current = parent;
            }
        }

        let mut members: HashMap<ElementId, (BTreeSet<ElementId>, BTreeSet<ElementId>)> =
            HashMap::new();
        for (&key, &parent) in &owner {
            match key {
                ElementKey::Stroke(id) => {
                    if let Some(s) = strokes.get_mut(&id) {
                        s.core_mut().parent = Some(parent);
                    }
                    members.entry(parent).or_default().0.insert(id);
                }
                ElementKey::Scrap(id) => {
                    if let Some(s) = scraps.get_mut(&id) {
                        s.core_mut().parent = Some(parent);
                    }
                    members.entry(parent).or_default().1.insert(id);
                }
            }
        }
        for (id, (stroke_ids, scrap_ids)) in members {
            if let Some(scrap) = scraps.get_mut(&id) {
                scrap.set_members(stroke_ids, scrap_ids);
            }
        }

        let mut canvas = Self::new(config);
        let (stroke_count, scrap_count) = (strokes.len(), scraps.len());
        canvas.strokes.add_all(strokes.into_values());
        canvas.scraps.add_all(scraps.into_values());
        canvas.take_damage();
        debug!(strokes = stroke_count, scraps = scrap_count, "canvas loaded");
        Ok(canvas)
    }

    /// Parse a JSON document written by [`to_json`](Self::to_json).
    pub fn from_json(json: &str, config: CanvasConfig) -> Result<Self, LoadError> {
        let record: CanvasRecord = serde_json::from_str(json)?;
        Self::from_record(&record, config)
    }
}
