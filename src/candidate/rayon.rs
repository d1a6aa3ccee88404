//! Rayon-parallel candidate filtering (feature-gated).
//!
//! Cells are independent, so the filter splits the cell range across the pool
//! and collects back in cell order.

use crate::candidate::filter::cell_candidate;
use crate::candidate::Candidate;
use crate::tensor::DecodedCells;
use rayon::prelude::*;

/// Cell-parallel version of `filter_candidates_into` with identical output.
pub fn filter_candidates_par_into(
    cells: &DecodedCells<'_>,
    score_threshold: f32,
    out: &mut Vec<Candidate>,
) {
    let found: Vec<Candidate> = (0..cells.len())
        .into_par_iter()
        .filter_map(|idx| {
            cells
                .cell(idx)
                .and_then(|cell| cell_candidate(cell, score_threshold))
        })
        .collect();
    out.extend(found);
}
