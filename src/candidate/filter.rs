//! Per-cell confidence filtering.

use crate::bbox::BBox;
use crate::candidate::Candidate;
use crate::tensor::{Cell, DecodedCells};

/// Converts one cell into a candidate if its best score clears `score_threshold`.
#[inline]
pub(crate) fn cell_candidate(cell: Cell<'_>, score_threshold: f32) -> Option<Candidate> {
    let (class_index, score) = cell.best_class()?;
    if score < score_threshold {
        return None;
    }
    let [cx, cy, w, h] = cell.bbox();
    Some(Candidate {
        bbox: BBox::from_center(cx, cy, w, h),
        score,
        class_index,
        cell: cell.index(),
    })
}

/// Collects candidates from every cell, appending to `out` in cell order.
pub fn filter_candidates_into(
    cells: &DecodedCells<'_>,
    score_threshold: f32,
    out: &mut Vec<Candidate>,
) {
    out.extend(
        cells
            .iter()
            .filter_map(|cell| cell_candidate(cell, score_threshold)),
    );
}

/// Collects candidates from every cell in cell order.
pub fn filter_candidates(cells: &DecodedCells<'_>, score_threshold: f32) -> Vec<Candidate> {
    let mut out = Vec::new();
    filter_candidates_into(cells, score_threshold, &mut out);
    out
}
