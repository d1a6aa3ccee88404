//! The post-processing engine.
//!
//! Each configured branch runs decode → filter → suppress → label resolve on
//! its own tensor; the per-branch sets are then concatenated in branch order.
//! An `Engine` holds only configuration and a read-only label table, so one
//! instance can serve concurrent requests from many threads.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::candidate::filter::filter_candidates_into;
use crate::candidate::nms::nms_boxes;
use crate::candidate::Candidate;
use crate::label::{ClassIdentity, ClassMode, LabelTable};
use crate::tensor::{decode, DecodedCells, TensorView};
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{PostError, PostResult};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

pub(crate) mod detection;
pub(crate) mod output;

pub use detection::{Detection, DetectionSet};
pub use output::{ClassColumn, OutputTensors};

/// Default minimum best-class score.
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.25;
/// Default IoU above which the lower-scoring box is suppressed.
pub const DEFAULT_NMS_THRESHOLD: f32 = 0.45;
/// Default row bound of the packed output tensors.
pub const DEFAULT_MAX_DETECTIONS: usize = 1000;

/// One model branch: a named detection head with its own label space.
#[derive(Clone, Debug, PartialEq)]
pub struct BranchConfig {
    /// Branch identifier, e.g. the input name in the ensemble.
    pub name: String,
    /// Number of class score channels after the four box channels.
    pub num_classes: usize,
    /// Newline-delimited label list; `None` keeps numeric classes.
    pub labels: Option<PathBuf>,
}

impl BranchConfig {
    pub fn new(name: impl Into<String>, num_classes: usize) -> Self {
        Self {
            name: name.into(),
            num_classes,
            labels: None,
        }
    }

    pub fn with_labels(mut self, path: impl Into<PathBuf>) -> Self {
        self.labels = Some(path.into());
        self
    }
}

/// Engine configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Minimum best-class score for a cell to become a candidate.
    pub score_threshold: f32,
    /// IoU above which suppression discards the lower-scoring box.
    pub nms_threshold: f32,
    /// Row bound used by [`Engine::pack`].
    pub max_detections: usize,
    /// Process branches and cells on the rayon pool (`rayon` feature).
    pub parallel: bool,
    /// Branches in the order their tensors are supplied.
    pub branches: Vec<BranchConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            nms_threshold: DEFAULT_NMS_THRESHOLD,
            max_detections: DEFAULT_MAX_DETECTIONS,
            parallel: false,
            branches: Vec::new(),
        }
    }
}

impl EngineConfig {
    fn validate(&self) -> PostResult<()> {
        if !self.score_threshold.is_finite() {
            return Err(PostError::InvalidConfig("score_threshold must be finite"));
        }
        if !(0.0..=1.0).contains(&self.nms_threshold) {
            return Err(PostError::InvalidConfig(
                "nms_threshold must lie in [0, 1]",
            ));
        }
        if self.branches.is_empty() {
            return Err(PostError::InvalidConfig("at least one branch is required"));
        }
        let mut seen = HashSet::new();
        for branch in &self.branches {
            if branch.num_classes == 0 {
                return Err(PostError::InvalidConfig("num_classes must be at least 1"));
            }
            if !seen.insert(branch.name.as_str()) {
                return Err(PostError::InvalidConfig("branch names must be unique"));
            }
        }
        Ok(())
    }
}

/// Reusable per-branch candidate buffers, indexed by branch position.
#[derive(Debug, Default)]
pub struct Workspace {
    buffers: Vec<Vec<Candidate>>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure(&mut self, branches: usize) -> &mut [Vec<Candidate>] {
        if self.buffers.len() < branches {
            self.buffers.resize_with(branches, Vec::new);
        }
        &mut self.buffers[..branches]
    }
}

/// Stateless detection post-processor.
#[derive(Clone, Debug)]
pub struct Engine {
    cfg: EngineConfig,
    mode: ClassMode,
}

impl Engine {
    /// Validates `cfg` and loads every configured label source.
    ///
    /// Named-class mode is selected when at least one branch has labels.
    pub fn new(cfg: EngineConfig) -> PostResult<Self> {
        Self::with_labels(cfg, LabelTable::new())
    }

    /// Like [`Engine::new`], starting from an in-memory label table.
    ///
    /// Label files in `cfg` replace same-named entries of `labels`.
    pub fn with_labels(cfg: EngineConfig, mut labels: LabelTable) -> PostResult<Self> {
        cfg.validate()?;
        for branch in &cfg.branches {
            if let Some(path) = &branch.labels {
                labels.insert_file(branch.name.clone(), path)?;
            }
        }
        let mode = if labels.is_empty() {
            ClassMode::Numeric
        } else {
            ClassMode::Named(labels)
        };
        Ok(Self { cfg, mode })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    pub fn class_mode(&self) -> &ClassMode {
        &self.mode
    }

    /// Returns `true` in named-class mode.
    pub fn is_named(&self) -> bool {
        matches!(self.mode, ClassMode::Named(_))
    }

    /// Processes one tensor per configured branch into the aggregate set.
    ///
    /// Any branch error fails the whole call; no partial set is returned.
    pub fn process(&self, tensors: &[TensorView<'_>]) -> PostResult<DetectionSet> {
        let mut ws = Workspace::new();
        self.process_with(&mut ws, tensors)
    }

    /// Same as [`Engine::process`], reusing the buffers in `ws`.
    pub fn process_with(
        &self,
        ws: &mut Workspace,
        tensors: &[TensorView<'_>],
    ) -> PostResult<DetectionSet> {
        let sets = self.run_branches(ws, tensors)?;
        let sets = sets.into_iter().collect::<PostResult<Vec<_>>>()?;
        let set = DetectionSet::aggregate(sets);
        trace_event!("process_done", detections = set.count());
        Ok(set)
    }

    /// Processes every branch independently and returns one result each.
    ///
    /// Lets callers log and skip a failing branch. The outer error is only
    /// returned when the tensor count does not match the branch count.
    pub fn process_branches(
        &self,
        tensors: &[TensorView<'_>],
    ) -> PostResult<Vec<PostResult<DetectionSet>>> {
        let mut ws = Workspace::new();
        self.run_branches(&mut ws, tensors)
    }

    /// Packs `set` into the declared output tensors, truncated to `max_detections`.
    pub fn pack(&self, set: &DetectionSet) -> OutputTensors {
        OutputTensors::pack(set, self.cfg.max_detections, self.is_named())
    }

    fn run_branches(
        &self,
        ws: &mut Workspace,
        tensors: &[TensorView<'_>],
    ) -> PostResult<Vec<PostResult<DetectionSet>>> {
        let expected = self.cfg.branches.len();
        if tensors.len() != expected {
            return Err(PostError::BranchCountMismatch {
                expected,
                got: tensors.len(),
            });
        }
        let _span = trace_span!("process", branches = expected).entered();
        let buffers = ws.ensure(expected);

        #[cfg(feature = "rayon")]
        {
            if self.cfg.parallel {
                return Ok(tensors
                    .par_iter()
                    .zip(buffers.par_iter_mut())
                    .enumerate()
                    .map(|(idx, (tensor, scratch))| self.process_branch(idx, *tensor, scratch))
                    .collect());
            }
        }

        Ok(tensors
            .iter()
            .zip(buffers.iter_mut())
            .enumerate()
            .map(|(idx, (tensor, scratch))| self.process_branch(idx, *tensor, scratch))
            .collect())
    }

    fn process_branch(
        &self,
        idx: usize,
        tensor: TensorView<'_>,
        scratch: &mut Vec<Candidate>,
    ) -> PostResult<DetectionSet> {
        let branch = &self.cfg.branches[idx];
        let _span = trace_span!("branch", branch = branch.name.as_str()).entered();

        let cells = decode(tensor, branch.num_classes, &branch.name)?;
        scratch.clear();
        self.filter_into(&cells, scratch);

        let kept = nms_boxes(scratch, self.cfg.score_threshold, self.cfg.nms_threshold);
        trace_event!("branch_done", candidates = scratch.len(), kept = kept.len());

        let mut set = DetectionSet::new();
        for candidate_idx in kept {
            let candidate = &scratch[candidate_idx];
            set.push(Detection {
                bbox: candidate.bbox,
                score: candidate.score,
                class: self.identity(&branch.name, candidate.class_index),
                branch: idx,
            });
        }
        Ok(set)
    }

    fn filter_into(&self, cells: &DecodedCells<'_>, out: &mut Vec<Candidate>) {
        #[cfg(feature = "rayon")]
        {
            if self.cfg.parallel {
                crate::candidate::rayon::filter_candidates_par_into(
                    cells,
                    self.cfg.score_threshold,
                    out,
                );
                return;
            }
        }
        filter_candidates_into(cells, self.cfg.score_threshold, out);
    }

    fn identity(&self, branch: &str, class_index: usize) -> ClassIdentity {
        match &self.mode {
            ClassMode::Numeric => ClassIdentity::Numeric(class_index),
            ClassMode::Named(table) => match table.resolve(branch, class_index) {
                Ok(label) => ClassIdentity::Named(label.clone()),
                Err(_) => {
                    trace_warn!("label_fallback", branch = branch, class_index = class_index);
                    ClassIdentity::Numeric(class_index)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BranchConfig, Engine, EngineConfig};
    use crate::util::PostError;

    fn cfg(branches: Vec<BranchConfig>) -> EngineConfig {
        EngineConfig {
            branches,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn rejects_empty_branch_list() {
        let err = Engine::new(EngineConfig::default()).unwrap_err();
        assert_eq!(
            err,
            PostError::InvalidConfig("at least one branch is required")
        );
    }

    #[test]
    fn rejects_duplicate_branch_names() {
        let err = Engine::new(cfg(vec![
            BranchConfig::new("a", 1),
            BranchConfig::new("a", 2),
        ]))
        .unwrap_err();
        assert_eq!(err, PostError::InvalidConfig("branch names must be unique"));
    }

    #[test]
    fn rejects_zero_classes_and_bad_thresholds() {
        assert!(Engine::new(cfg(vec![BranchConfig::new("a", 0)])).is_err());
        let bad_nms = EngineConfig {
            nms_threshold: 1.5,
            ..cfg(vec![BranchConfig::new("a", 1)])
        };
        assert!(Engine::new(bad_nms).is_err());
        let bad_score = EngineConfig {
            score_threshold: f32::NAN,
            ..cfg(vec![BranchConfig::new("a", 1)])
        };
        assert!(Engine::new(bad_score).is_err());
    }

    #[test]
    fn missing_label_file_fails_construction() {
        let err = Engine::new(cfg(vec![BranchConfig::new("a", 1)
            .with_labels("/nonexistent/yolopost/labels.txt")]))
        .unwrap_err();
        assert!(matches!(err, PostError::LabelSource { .. }));
    }

    #[test]
    fn engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
    }
}
