// Copyright 2025 the Scrapbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scrapbook Index: an owning 2D index ordered along the x axis.
//!
//! Scrapbook Index is the broad phase under the scrapbook canvas model.
//!
//! - Own elements of one kind keyed by a stable id, with constant-time lookup.
//! - Keep them in a sweep sequence sorted by `(left edge, width)`.
//! - Find intersection candidates by binary search plus a bounded outward scan.
//! - Re-order an element after an in-place edit without disturbing the rest.
//! - Batch inserts (sorted merge) and batch removals (single pass).
//! - Record coarse [`Damage`] for whoever repaints.
//!
//! It is generic over the scalar type `T` and does not depend on any geometry crate.
//! Elements describe themselves through the [`Indexed`] trait; exact geometry stays
//! with the element and is only consulted for point containment.
//!
//! # Example
//!
//! ```rust
//! use scrapbook_index::{Aabb2D, Indexed, SpatialIndex};
//!
//! struct Blob {
//!     id: u64,
//!     bounds: Aabb2D<f64>,
//! }
//!
//! impl Indexed<f64> for Blob {
//!     type Id = u64;
//!     fn id(&self) -> u64 {
//!         self.id
//!     }
//!     fn aabb(&self) -> Aabb2D<f64> {
//!         self.bounds
//!     }
//! }
//!
//! let mut idx = SpatialIndex::new();
//! idx.add_all([
//!     Blob { id: 1, bounds: Aabb2D::new(0.0, 0.0, 10.0, 10.0) },
//!     Blob { id: 2, bounds: Aabb2D::new(5.0, 5.0, 15.0, 15.0) },
//! ]);
//!
//! let hits = idx.container_candidates(6.0, 6.0);
//! assert_eq!(hits, vec![1, 2]);
//!
//! idx.remove_all([1]);
//! assert!(idx.get(1).is_none());
//! assert!(idx.is_consistent());
//! ```
//!
//! ### Float semantics
//!
//! This crate assumes no NaNs for floating-point coordinates; incomparable values
//! are ordered as equal.

#![no_std]

extern crate alloc;

mod damage;
mod index;
mod types;

pub use damage::Damage;
pub use index::{Candidates, Indexed, SpatialIndex};
pub use types::{Aabb2D, Scalar};
