// Copyright 2025 the Scrapbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lasso grouping: turn a closed boundary into a scrap that adopts what it encloses.

use hashbrown::HashSet;
use smallvec::SmallVec;
use tracing::debug;

use crate::canvas::Canvas;
use crate::element::Element;
use crate::scrap::Scrap;
use crate::stroke::Stroke;
use crate::types::ElementKey;
use crate::util::rect_to_aabb;

/// Build a scrap bounded by `boundary` that adopts every element it encloses.
///
/// Scraps are considered first, largest first. A scrap whose border vertices
/// all lie inside the boundary is adopted as a direct child and its whole
/// subtree is claimed, so nothing nested inside it is adopted a second time.
/// Then every unclaimed, non-ghost stroke whose points all lie inside is
/// adopted. Adopted elements are released from their previous parents.
///
/// The border width is [`border_width`](crate::CanvasConfig::border_width)
/// divided by `scale_factor`, so borders look the same at any zoom. The
/// returned scrap is not inserted; see [`Canvas::commit_group`].
pub fn build_group(canvas: &mut Canvas, boundary: Stroke, scale_factor: f64) -> Scrap {
    let scale = if scale_factor.is_finite() && scale_factor > 0.0 {
        scale_factor
    } else {
        1.0
    };
    let boundary_id = boundary.id();
    let border = boundary.into_border(
        canvas.config.border_color,
        canvas.config.border_width / scale,
    );
    let mut scrap = Scrap::new(border);
    if scrap.region().is_empty() {
        return scrap;
    }
    let query = rect_to_aabb(scrap.bounds());

    let mut claimed: HashSet<ElementKey> = HashSet::new();
    let mut adopted: SmallVec<[ElementKey; 16]> = SmallVec::new();

    let mut candidates: Vec<&Scrap> = canvas
        .scraps
        .intersection_candidates(query, None)
        .into_iter()
        .filter_map(|id| canvas.scraps.get(id))
        .filter(|s| !s.is_pending_delete())
        .collect();
    candidates.sort_by(|a, b| b.cmp_size(*a));
    for candidate in candidates {
        let key = candidate.key();
        if claimed.contains(&key) || !scrap.contains(candidate) {
            continue;
        }
        adopted.push(key);
        let (strokes, scraps) = canvas.descendants(candidate.id());
        claimed.extend(strokes.into_iter().map(ElementKey::Stroke));
        claimed.extend(scraps.into_iter().map(ElementKey::Scrap));
    }
    claimed.retain(|k| matches!(k, ElementKey::Stroke(_)));
    let adopted_scraps = adopted.len();

    for id in canvas.strokes.intersection_candidates(query, Some(boundary_id)) {
        let key = ElementKey::Stroke(id);
        if claimed.contains(&key) {
            continue;
        }
        let Some(stroke) = canvas.strokes.get(id) else {
            continue;
        };
        if stroke.is_pending_delete() || stroke.is_ghost() {
            continue;
        }
        if scrap.contains(stroke) {
            adopted.push(key);
        }
    }
    drop(claimed);

    let new_id = scrap.id();
    for key in &adopted {
        if let Some(old) = canvas.core(*key).and_then(|c| c.parent) {
            canvas.remove_from_scrap(old, *key);
        }
        canvas.with_core(*key, |c| c.attach(new_id));
        scrap.insert_member(*key);
    }
    debug!(
        scrap = %new_id,
        scraps = adopted_scraps,
        strokes = adopted.len() - adopted_scraps,
        "grouped"
    );
    scrap
}
