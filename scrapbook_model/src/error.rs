// Copyright 2025 the Scrapbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for loading, configuration, and snapshot rendering.

use thiserror::Error;

use crate::types::ElementId;

/// Failure to rebuild a canvas from a persisted record.
///
/// Dangling child references are not an error; they are logged and skipped.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The document is not valid JSON or does not match the record shape.
    #[error("malformed canvas document: {0}")]
    Json(#[from] serde_json::Error),
    /// Two records share one id.
    #[error("duplicate element id {0}")]
    DuplicateId(ElementId),
    /// A child is listed by more than one scrap.
    #[error("element {child} is listed by both scrap {first} and scrap {second}")]
    SharedChild {
        /// The contested child.
        child: ElementId,
        /// The scrap that claimed it first.
        first: ElementId,
        /// The scrap that claimed it again.
        second: ElementId,
    },
    /// Scrap membership loops back on itself.
    #[error("scrap {0} is its own ancestor")]
    OwnershipCycle(ElementId),
    /// A stroke record cannot describe a stroke.
    #[error("stroke {id}: {reason}")]
    InvalidStroke {
        /// Offending record.
        id: ElementId,
        /// What was wrong with it.
        reason: &'static str,
    },
}

/// Invalid canvas configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid JSON or does not match the config shape.
    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),
    /// A value is outside its accepted range.
    #[error("invalid `{key}`: {reason}")]
    Invalid {
        /// Field name.
        key: &'static str,
        /// Accepted range.
        reason: &'static str,
    },
}

/// A snapshot cache could not be produced.
///
/// Never fatal: the scrap keeps drawing its contents vectorially.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The requested surface is larger than the renderer can allocate.
    #[error("snapshot surface {width}x{height} is too large")]
    TooLarge {
        /// Requested width in device pixels.
        width: u32,
        /// Requested height in device pixels.
        height: u32,
    },
    /// The scrap has no area to render.
    #[error("scrap {0} has empty bounds")]
    EmptyBounds(ElementId),
    /// The renderer failed for its own reasons.
    #[error("renderer failed: {0}")]
    Renderer(String),
}
