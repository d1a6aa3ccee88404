//! Error types for yolopost.

use thiserror::Error;

/// Result alias for post-processing operations.
pub type PostResult<T> = std::result::Result<T, PostError>;

/// Errors that can occur while turning raw tensors into detections.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PostError {
    /// A tensor's dimensions or backing buffer are unusable.
    #[error("invalid tensor shape {shape:?} for {len} elements")]
    InvalidShape { shape: [usize; 3], len: usize },
    /// A tensor's channel count disagrees with the configured class count.
    #[error("branch `{branch}`: expected {expected} channels, got {got}")]
    ShapeMismatch {
        branch: String,
        expected: usize,
        got: usize,
    },
    /// The number of tensors differs from the number of configured branches.
    #[error("expected {expected} branch tensors, got {got}")]
    BranchCountMismatch { expected: usize, got: usize },
    /// A class index has no label in its branch's label list.
    #[error("branch `{branch}`: class index {index} out of range for {len} labels")]
    LabelIndexOutOfRange {
        branch: String,
        index: usize,
        len: usize,
    },
    /// The label table holds no labels for a branch.
    #[error("no labels loaded for branch `{branch}`")]
    UnknownBranch { branch: String },
    /// A label source could not be read.
    #[error("failed to read labels from {path}: {reason}")]
    LabelSource { path: String, reason: String },
    /// The engine configuration is invalid.
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}
