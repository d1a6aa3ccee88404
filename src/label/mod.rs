//! Per-branch class label tables.
//!
//! A `LabelTable` is built once from newline-delimited label lists and is
//! read-only afterwards, so it can be shared freely across worker threads.
//! Line `i` of a branch's list names class index `i`.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::util::{PostError, PostResult};

/// Class identity attached to a detection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClassIdentity {
    /// Raw class index.
    Numeric(usize),
    /// Label resolved from the branch's label list.
    Named(Arc<str>),
}

impl fmt::Display for ClassIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassIdentity::Numeric(index) => write!(f, "{index}"),
            ClassIdentity::Named(label) => f.write_str(label),
        }
    }
}

/// How detections report their class.
#[derive(Clone, Debug, Default)]
pub enum ClassMode {
    /// Emit the numeric class index.
    #[default]
    Numeric,
    /// Resolve class indices through a label table, falling back to the
    /// numeric index when a label is missing.
    Named(LabelTable),
}

/// Mapping from branch name to its ordered label list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LabelTable {
    branches: HashMap<String, Arc<[Arc<str>]>>,
}

impl LabelTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the labels of `branch`.
    pub fn insert<I, S>(&mut self, branch: impl Into<String>, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let labels: Arc<[Arc<str>]> = labels.into_iter().map(|s| Arc::from(s.as_ref())).collect();
        self.branches.insert(branch.into(), labels);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_branch<I, S>(mut self, branch: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.insert(branch, labels);
        self
    }

    /// Parses labels for `branch` from newline-delimited text.
    pub fn insert_text(&mut self, branch: impl Into<String>, text: &str) {
        self.insert(branch, parse_label_lines(text));
    }

    /// Reads labels for `branch` from a newline-delimited file.
    pub fn insert_file(&mut self, branch: impl Into<String>, path: &Path) -> PostResult<()> {
        let text = fs::read_to_string(path).map_err(|err| PostError::LabelSource {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        self.insert_text(branch, &text);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// Returns the labels of `branch`.
    pub fn labels(&self, branch: &str) -> Option<&[Arc<str>]> {
        self.branches.get(branch).map(|labels| &labels[..])
    }

    /// Resolves `class_index` within `branch`.
    pub fn resolve(&self, branch: &str, class_index: usize) -> PostResult<&Arc<str>> {
        let labels = self
            .branches
            .get(branch)
            .ok_or_else(|| PostError::UnknownBranch {
                branch: branch.to_owned(),
            })?;
        labels
            .get(class_index)
            .ok_or_else(|| PostError::LabelIndexOutOfRange {
                branch: branch.to_owned(),
                index: class_index,
                len: labels.len(),
            })
    }
}

/// Splits a label list into lines.
///
/// Trailing whitespace (including `\r`) is trimmed per line and trailing empty
/// lines are dropped. Interior empty lines stay so indices remain aligned.
pub fn parse_label_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines
}
