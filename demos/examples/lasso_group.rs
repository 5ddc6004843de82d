// Copyright 2025 the Scrapbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Draw, lasso, move, and save a small sketch.
//!
//! This example walks one scrap through its life:
//! - ink strokes fed through a `DrawSession` as pointer samples,
//! - a lasso gesture grouped into a scrap in a single turn,
//! - a transactional drag of that scrap with a counting snapshot renderer,
//! - a JSON round trip of the result.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p scrapbook_demos --example lasso_group`

use kurbo::{Point, Rect};
use scrapbook_model::{
    Canvas, Command, CommandQueue, DrawMode, DrawSession, Element, ElementId, Gesture,
    GestureEvent, GesturePhase, SnapshotError, SnapshotRenderer,
};
use tracing_subscriber::EnvFilter;

/// Pretends to rasterize scraps; only counts members.
#[derive(Debug, Default)]
struct CountingRenderer {
    rendered: usize,
}

impl SnapshotRenderer for CountingRenderer {
    fn render_snapshot(
        &mut self,
        canvas: &Canvas,
        scrap: ElementId,
        scale_factor: f64,
    ) -> Result<(), SnapshotError> {
        let Some(scrap) = canvas.scrap(scrap) else {
            return Err(SnapshotError::Renderer("scrap vanished".into()));
        };
        let b = scrap.bounds();
        tracing::info!(
            members = scrap.member_count(),
            width = b.width() * scale_factor,
            height = b.height() * scale_factor,
            "rendering snapshot"
        );
        self.rendered += 1;
        Ok(())
    }
}

fn gesture(session: &mut DrawSession, points: &[(f64, f64)]) -> Option<Gesture> {
    let last = points.len().checked_sub(1)?;
    let mut out = None;
    for (i, p) in points.iter().enumerate() {
        let phase = match i {
            0 => GesturePhase::Begin,
            i if i == last => GesturePhase::End,
            _ => GesturePhase::Continue,
        };
        out = session.feed(GestureEvent::new(phase, *p));
    }
    out
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut canvas = Canvas::default();
    let mut queue = CommandQueue::new();

    // A squiggle and a dot inside the future lasso, and one stroke outside it.
    let mut pen = DrawSession::new(DrawMode::Ink, canvas.config());
    for points in [
        &[(20.0, 30.0), (35.0, 45.0), (50.0, 30.0), (65.0, 45.0)][..],
        &[(70.0, 70.0)][..],
        &[(150.0, 20.0), (190.0, 60.0)][..],
    ] {
        if let Some(Gesture::Ink(stroke)) = gesture(&mut pen, points) {
            queue.push(Command::InsertStroke(stroke));
        }
    }

    let mut lasso = DrawSession::new(DrawMode::Lasso, canvas.config());
    let ring = [
        (5.0, 5.0),
        (60.0, 0.0),
        (110.0, 10.0),
        (105.0, 95.0),
        (50.0, 105.0),
        (0.0, 90.0),
    ];
    if let Some(Gesture::Lasso(boundary)) = gesture(&mut lasso, &ring) {
        queue.push(Command::Group {
            boundary,
            scale_factor: 1.0,
        });
    }

    let report = canvas.run_turn(&mut queue);
    println!(
        "turn: inserted {} elements, {} dirty rects",
        report.inserted.len(),
        report.damage.dirty_rects.len()
    );

    let Some(scrap) = canvas.scrap_at(Point::new(50.0, 50.0)) else {
        println!("lasso enclosed nothing");
        return;
    };
    println!(
        "scrap {scrap} holds {} members",
        canvas.scrap(scrap).map_or(0, |s| s.member_count())
    );

    // Drag the scrap 40 units right in two steps, then commit.
    let mut renderer = CountingRenderer::default();
    if canvas.start_editing(scrap, 2.0, &mut renderer) {
        canvas.translate_scrap(scrap, 25.0, 0.0);
        canvas.translate_scrap(scrap, 15.0, 0.0);
        canvas.apply_transform(scrap, false);
    }
    if let Some(s) = canvas.scrap(scrap) {
        let b = s.bounds();
        println!(
            "after drag: border spans x {:.1}..{:.1}, {} snapshot(s) rendered",
            b.x0, b.x1, renderer.rendered
        );
    }

    let snapshot = canvas.snapshot();
    let visible = snapshot.visible(Rect::new(0.0, 0.0, 120.0, 120.0)).count();
    println!("{visible} items visible in the top-left corner");

    match canvas.to_json() {
        Ok(json) => match Canvas::from_json(&json, canvas.config().clone()) {
            Ok(loaded) => println!(
                "saved {} bytes, reloaded {} elements (consistent: {})",
                json.len(),
                loaded.len(),
                loaded.check_invariants()
            ),
            Err(err) => println!("reload failed: {err}"),
        },
        Err(err) => println!("save failed: {err}"),
    }
}
