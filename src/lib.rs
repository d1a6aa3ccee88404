//! yolopost turns raw YOLO-style detection-head tensors into final detections.
//!
//! Each model branch emits a `[1, 4 + C, N]` tensor. The engine decodes it as
//! `N` cells, keeps cells whose best class score clears a threshold, runs
//! greedy non-maximum suppression, optionally resolves class labels, and
//! concatenates the per-branch results in branch order. Optional parallelism
//! is available via the `rayon` feature.

pub mod bbox;
mod candidate;
pub mod engine;
pub mod label;
pub mod lowlevel;
pub mod tensor;
mod trace;
pub mod util;

pub use bbox::BBox;
pub use candidate::Candidate;
pub use engine::{
    BranchConfig, ClassColumn, Detection, DetectionSet, Engine, EngineConfig, OutputTensors,
    Workspace,
};
pub use label::{ClassIdentity, ClassMode, LabelTable};
pub use tensor::{RawOutputTensor, TensorView};
pub use util::{PostError, PostResult};
