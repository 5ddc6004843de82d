// Copyright 2025 the Scrapbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scrapbook Model: the element model behind a freehand sketching canvas.
//!
//! Users draw ink [`Stroke`]s and lasso them into [`Scrap`]s, which are closed
//! borders owning the elements they enclose. Scraps nest, move as a unit
//! through a transactional edit, and can be copied, ungrouped, and erased.
//!
//! - The [`Canvas`] owns every element in two sweep-ordered indexes from
//!   [`scrapbook_index`], one per kind. Membership is by id both ways:
//!   scraps list member ids and members name their [`parent`](Element::parent).
//! - Containment uses the exact occupied [`Region`](scrapbook_hit::Region)
//!   of an element and samples only the other element's vertices.
//! - Grouping ([`build_group`]) adopts the largest enclosed scraps whole,
//!   then any unclaimed ink that lies entirely inside the lasso.
//!
//! ## Editing
//!
//! [`Canvas::start_editing`] asks a [`SnapshotRenderer`] to cache the scrap's
//! contents, after which translate/rotate/scale steps move only the border.
//! [`Canvas::apply_transform`] commits the accumulated transform to the whole
//! subtree at once; [`Canvas::cancel_editing`] puts the border back.
//!
//! ## Turns
//!
//! Deletion is deferred. [`Canvas::erase`] marks elements and
//! [`Canvas::sweep`] removes them in one batched pass. A [`CommandQueue`]
//! run through [`Canvas::run_turn`] orders this for you: removals, sweep,
//! then insertions. Renderers read an immutable [`Snapshot`].
//!
//! ## Example
//!
//! ```rust
//! use kurbo::Point;
//! use scrapbook_model::{
//!     Canvas, Command, CommandQueue, DrawMode, DrawSession, Gesture, GestureEvent, GesturePhase,
//! };
//!
//! let mut canvas = Canvas::default();
//! let mut queue = CommandQueue::new();
//!
//! let mut pen = DrawSession::new(DrawMode::Ink, canvas.config());
//! pen.feed(GestureEvent::new(GesturePhase::Begin, (20.0, 20.0)));
//! pen.feed(GestureEvent::new(GesturePhase::Continue, (40.0, 30.0)));
//! let done = pen.feed(GestureEvent::new(GesturePhase::End, (60.0, 25.0)));
//! if let Some(Gesture::Ink(stroke)) = done {
//!     queue.push(Command::InsertStroke(stroke));
//! }
//!
//! let mut lasso = DrawSession::new(DrawMode::Lasso, canvas.config());
//! for (i, p) in [(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)].into_iter().enumerate() {
//!     let phase = match i {
//!         0 => GesturePhase::Begin,
//!         3 => GesturePhase::End,
//!         _ => GesturePhase::Continue,
//!     };
//!     if let Some(Gesture::Lasso(boundary)) = lasso.feed(GestureEvent::new(phase, p)) {
//!         queue.push(Command::Group { boundary, scale_factor: 1.0 });
//!     }
//! }
//!
//! let report = canvas.run_turn(&mut queue);
//! assert_eq!(report.inserted.len(), 2);
//! let scrap = canvas.scrap_at(Point::new(50.0, 50.0)).unwrap();
//! assert_eq!(canvas.scrap(scrap).unwrap().member_count(), 1);
//! ```

mod canvas;
mod command;
mod config;
mod damage;
mod element;
mod error;
mod grouping;
mod persist;
mod scrap;
mod session;
mod snapshot;
mod stroke;
mod types;
mod util;

pub use canvas::Canvas;
pub use command::{Command, CommandQueue, TurnReport};
pub use config::CanvasConfig;
pub use damage::Damage;
pub use element::{Element, ElementCore};
pub use error::{ConfigError, LoadError, SnapshotError};
pub use grouping::build_group;
pub use persist::{CanvasRecord, FORMAT_VERSION, ScrapRecord, ShapeTag, StrokeRecord};
pub use scrap::Scrap;
pub use session::{DrawMode, DrawSession, Gesture, GestureEvent, GesturePhase};
pub use snapshot::{DrawItem, Snapshot, SnapshotRenderer};
pub use stroke::{DEFAULT_WIDTH, Stroke, StrokeShape};
pub use types::{Color, ElementFlags, ElementId, ElementKey, LineStyle};
