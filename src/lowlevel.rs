//! Low-level building blocks for custom post-processing pipelines.
//!
//! These expose the individual stages behind [`Engine`](crate::Engine) for
//! callers that decode, filter or suppress on their own. Most users should
//! prefer `Engine::process`.

pub use crate::candidate::filter::{filter_candidates, filter_candidates_into};
pub use crate::candidate::nms::nms_boxes;
#[cfg(feature = "rayon")]
pub use crate::candidate::rayon::filter_candidates_par_into;
pub use crate::candidate::Candidate;
pub use crate::label::parse_label_lines;
pub use crate::tensor::{decode, Cell, DecodedCells, BOX_CHANNELS};
