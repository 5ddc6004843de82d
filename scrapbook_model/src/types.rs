// Copyright 2025 the Scrapbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the canvas model: element identifiers, keys, flags, and styles.

use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique element identifier.
///
/// Ids are handed out in increasing order and never reused, so comparing two
/// ids also tells which element was created first.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(u64);

impl ElementId {
    /// Allocate a new id.
    pub fn fresh() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Adopt an id read back from storage, making sure [`fresh`](Self::fresh)
    /// never hands it out again.
    pub fn observe(raw: u64) -> Self {
        NEXT_ID.fetch_max(raw.saturating_add(1), Ordering::Relaxed);
        Self(raw)
    }

    /// The raw value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An element id tagged with the index it lives in.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum ElementKey {
    /// A stroke in the stroke index.
    Stroke(ElementId),
    /// A scrap in the scrap index.
    Scrap(ElementId),
}

impl ElementKey {
    /// The untagged id.
    pub const fn id(self) -> ElementId {
        match self {
            Self::Stroke(id) | Self::Scrap(id) => id,
        }
    }
}

bitflags::bitflags! {
    /// Per-element state bits.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ElementFlags: u8 {
        /// Marked for removal by the next sweep.
        const PENDING_DELETE   = 0b0000_0001;
        /// Rendered from live geometry rather than a cached snapshot.
        const DRAW_VECTORIALLY = 0b0000_0010;
        /// Ephemeral lasso/boundary stroke; never adopted, never persisted as ink.
        const GHOST            = 0b0000_0100;
        /// Scrap membership or content changed since its snapshot was taken.
        const CONTENT_CHANGED  = 0b0000_1000;
        /// Scrap has a usable cached snapshot.
        const HAS_SNAPSHOT     = 0b0001_0000;
    }
}

impl Default for ElementFlags {
    fn default() -> Self {
        Self::DRAW_VECTORIALLY
    }
}

/// Packed `0xAARRGGBB` color.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub u32);

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self(0xFF00_0000);
    /// Translucent blue used for lasso and scrap borders.
    pub const SELECTION: Self = Self(0x8033_66CC);
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// Dash pattern of a stroke.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    /// Continuous line.
    #[default]
    Solid,
    /// Long dashes.
    Dashed,
    /// Short dots.
    Dotted,
}
