//! Candidate extraction and pruning.
//!
//! Includes the per-cell confidence filter and greedy non-maximum suppression.

pub(crate) mod filter;
pub(crate) mod nms;
#[cfg(feature = "rayon")]
pub(crate) mod rayon;

use crate::bbox::BBox;

/// A cell that cleared the score threshold, in corner form.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    /// Corner-form box in model input pixels.
    pub bbox: BBox,
    /// Best class score.
    pub score: f32,
    /// Index of the best class.
    pub class_index: usize,
    /// Source cell index.
    pub cell: usize,
}
