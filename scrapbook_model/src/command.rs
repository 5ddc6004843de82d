// Copyright 2025 the Scrapbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Queued canvas mutations, applied one turn at a time.

use std::collections::VecDeque;

use tracing::debug;

use crate::canvas::Canvas;
use crate::damage::Damage;
use crate::scrap::Scrap;
use crate::stroke::Stroke;
use crate::types::{ElementId, ElementKey};

/// A deferred canvas mutation.
#[derive(Clone, Debug)]
pub enum Command {
    /// Index a finished stroke.
    InsertStroke(Stroke),
    /// Index a scrap.
    InsertScrap(Scrap),
    /// Group whatever a lasso encloses into a new scrap.
    Group {
        /// Closed boundary.
        boundary: Stroke,
        /// View scale at the time the lasso was drawn.
        scale_factor: f64,
    },
    /// Mark an element (and a scrap's subtree) for deletion.
    Erase(ElementKey),
    /// Dissolve a scrap into its parent.
    Ungroup(ElementId),
}

impl Command {
    fn is_removal(&self) -> bool {
        matches!(self, Self::Erase(_) | Self::Ungroup(_))
    }
}

/// Commands waiting for the next turn, in submission order.
#[derive(Clone, Debug, Default)]
pub struct CommandQueue {
    pending: VecDeque<Command>,
}

impl CommandQueue {
    /// An empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a command.
    pub fn push(&mut self, command: Command) {
        self.pending.push_back(command);
    }

    /// Number of queued commands.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// What a turn did.
#[derive(Debug, Default)]
pub struct TurnReport {
    /// Elements removed by the sweep.
    pub removed: usize,
    /// Ids of elements inserted or created this turn, in order.
    pub inserted: Vec<ElementKey>,
    /// Areas to repaint.
    pub damage: Damage,
}

impl Canvas {
    /// Drain `queue` and apply it as one turn.
    ///
    /// Erasures and ungroups run first, then a single sweep, then insertions
    /// and groupings in submission order. Insertions therefore never see an
    /// element this turn deleted.
    pub fn run_turn(&mut self, queue: &mut CommandQueue) -> TurnReport {
        let (removals, insertions): (Vec<Command>, Vec<Command>) =
            queue.pending.drain(..).partition(Command::is_removal);
        for command in removals {
            match command {
                Command::Erase(key) => {
                    self.erase(key);
                }
                Command::Ungroup(id) => {
                    self.ungroup(id);
                }
                _ => {}
            }
        }
        let removed = self.sweep();

        let mut inserted = Vec::with_capacity(insertions.len());
        for command in insertions {
            let key = match command {
                Command::InsertStroke(stroke) => ElementKey::Stroke(self.insert_stroke(stroke)),
                Command::InsertScrap(scrap) => ElementKey::Scrap(self.insert_scrap(scrap)),
                Command::Group {
                    boundary,
                    scale_factor,
                } => ElementKey::Scrap(self.commit_group(boundary, scale_factor)),
                Command::Erase(_) | Command::Ungroup(_) => continue,
            };
            inserted.push(key);
        }
        debug!(removed, inserted = inserted.len(), "turn finished");
        TurnReport {
            removed,
            inserted,
            damage: self.take_damage(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;
    use kurbo::{Point, Rect};

    fn ink(a: (f64, f64), b: (f64, f64)) -> Stroke {
        Stroke::polyline(&[Point::new(a.0, a.1), Point::new(b.0, b.1)])
    }

    #[test]
    fn removals_are_swept_before_insertions() {
        let mut canvas = Canvas::default();
        let old = canvas.insert_stroke(ink((10.0, 10.0), (20.0, 20.0)));
        canvas.take_damage();

        let mut queue = CommandQueue::new();
        queue.push(Command::InsertStroke(ink((30.0, 30.0), (40.0, 40.0))));
        queue.push(Command::Group {
            boundary: Stroke::rectangle(Rect::new(0.0, 0.0, 100.0, 100.0)).into_ghost(),
            scale_factor: 1.0,
        });
        queue.push(Command::Erase(ElementKey::Stroke(old)));
        assert_eq!(queue.len(), 3);

        let report = canvas.run_turn(&mut queue);
        assert!(queue.is_empty());
        assert_eq!(report.removed, 1);
        assert_eq!(report.inserted.len(), 2);
        assert!(canvas.stroke(old).is_none());

        // The group saw the new stroke but not the erased one.
        let ElementKey::Scrap(scrap) = report.inserted[1] else {
            panic!("expected a scrap");
        };
        let members: Vec<ElementKey> = canvas.scrap(scrap).unwrap().members().collect();
        assert_eq!(members, vec![report.inserted[0]]);
        assert!(!report.damage.is_empty());
        assert!(canvas.check_invariants());
    }

    #[test]
    fn ungroup_runs_as_a_removal() {
        let mut canvas = Canvas::default();
        let s = canvas.insert_stroke(ink((10.0, 10.0), (20.0, 20.0)));
        let scrap = canvas.commit_group(
            Stroke::rectangle(Rect::new(0.0, 0.0, 50.0, 50.0)).into_ghost(),
            1.0,
        );

        let mut queue = CommandQueue::new();
        queue.push(Command::Ungroup(scrap));
        let report = canvas.run_turn(&mut queue);
        assert_eq!(report.removed, 1);
        assert!(canvas.scrap(scrap).is_none());
        assert_eq!(canvas.stroke(s).unwrap().parent(), None);
    }

    #[test]
    fn empty_turn_does_nothing() {
        let mut canvas = Canvas::default();
        let report = canvas.run_turn(&mut CommandQueue::new());
        assert_eq!(report.removed, 0);
        assert!(report.inserted.is_empty());
        assert!(report.damage.is_empty());
    }
}
