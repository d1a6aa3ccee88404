//! Final detections and their per-branch and aggregate sets.

use crate::bbox::BBox;
use crate::label::ClassIdentity;

/// One emitted detection.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    /// Corner-form box in model input pixels.
    pub bbox: BBox,
    /// Confidence of the best class.
    pub score: f32,
    /// Numeric index or resolved label.
    pub class: ClassIdentity,
    /// Position of the originating branch.
    pub branch: usize,
}

/// Ordered detections; the count is always the number of detections held.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectionSet {
    detections: Vec<Detection>,
}

impl DetectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    pub fn into_detections(self) -> Vec<Detection> {
        self.detections
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Detection> {
        self.detections.iter()
    }

    pub(crate) fn push(&mut self, detection: Detection) {
        self.detections.push(detection);
    }

    /// Appends every detection of `other` after the current ones.
    pub fn append(&mut self, other: DetectionSet) {
        self.detections.extend(other.detections);
    }

    /// Concatenates per-branch sets in input order.
    ///
    /// No cross-set suppression happens: duplicates from different branches
    /// are all kept.
    pub fn aggregate<I>(sets: I) -> DetectionSet
    where
        I: IntoIterator<Item = DetectionSet>,
    {
        let mut out = DetectionSet::new();
        for set in sets {
            out.append(set);
        }
        out
    }
}

impl From<Vec<Detection>> for DetectionSet {
    fn from(detections: Vec<Detection>) -> Self {
        Self { detections }
    }
}

impl IntoIterator for DetectionSet {
    type Item = Detection;
    type IntoIter = std::vec::IntoIter<Detection>;

    fn into_iter(self) -> Self::IntoIter {
        self.detections.into_iter()
    }
}

impl<'a> IntoIterator for &'a DetectionSet {
    type Item = &'a Detection;
    type IntoIter = std::slice::Iter<'a, Detection>;

    fn into_iter(self) -> Self::IntoIter {
        self.detections.iter()
    }
}
