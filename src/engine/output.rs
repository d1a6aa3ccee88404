//! Fixed-bound output columns for the hosting request/response framework.
//!
//! The serving side declares `num_detections: int32[1]`,
//! `detection_boxes: f32[MAX, 4]`, `detection_scores: f32[MAX]` and
//! `detection_classes: int32-or-string[MAX]`. Packing keeps the first `MAX`
//! detections in aggregate order; the rest are counted in `truncated`.

use crate::engine::detection::DetectionSet;
use crate::label::ClassIdentity;
use crate::trace::trace_event;

/// Class column in the type the hosting framework declares.
#[derive(Clone, Debug, PartialEq)]
pub enum ClassColumn {
    /// Numeric-class deployments.
    Int32(Vec<i32>),
    /// Named-class deployments; numeric fallbacks are rendered as decimals.
    Text(Vec<String>),
}

impl ClassColumn {
    pub fn len(&self) -> usize {
        match self {
            ClassColumn::Int32(v) => v.len(),
            ClassColumn::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The four output tensors of one response.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputTensors {
    pub num_detections: [i32; 1],
    pub detection_boxes: Vec<[f32; 4]>,
    pub detection_scores: Vec<f32>,
    pub detection_classes: ClassColumn,
    /// Detections dropped because the set exceeded `max_detections`.
    pub truncated: usize,
}

impl OutputTensors {
    /// Packs the first `max_detections` detections of `set`.
    ///
    /// `named` selects the text class column.
    pub fn pack(set: &DetectionSet, max_detections: usize, named: bool) -> Self {
        let kept = set.count().min(max_detections);
        let truncated = set.count() - kept;
        if truncated > 0 {
            trace_event!("output_truncated", kept = kept, truncated = truncated);
        }

        let rows = &set.detections()[..kept];
        let detection_boxes = rows.iter().map(|d| d.bbox.to_array()).collect();
        let detection_scores = rows.iter().map(|d| d.score).collect();
        let detection_classes = if named {
            ClassColumn::Text(rows.iter().map(|d| d.class.to_string()).collect())
        } else {
            ClassColumn::Int32(
                rows.iter()
                    .map(|d| match &d.class {
                        ClassIdentity::Numeric(index) => {
                            i32::try_from(*index).unwrap_or(i32::MAX)
                        }
                        ClassIdentity::Named(_) => -1,
                    })
                    .collect(),
            )
        };

        Self {
            num_detections: [i32::try_from(kept).unwrap_or(i32::MAX)],
            detection_boxes,
            detection_scores,
            detection_classes,
            truncated,
        }
    }
}
