//! Greedy non-maximum suppression over candidate boxes.

use std::cmp::Ordering;

use crate::candidate::Candidate;

fn score_cmp_desc(a: (usize, &Candidate), b: (usize, &Candidate)) -> Ordering {
    b.1.score.total_cmp(&a.1.score).then_with(|| a.0.cmp(&b.0))
}

/// Runs class-agnostic greedy NMS and returns kept indices in pick order.
///
/// Candidates scoring below `score_threshold` are ignored. A candidate is
/// dropped when its IoU with any already kept box exceeds `nms_threshold`.
/// Equal scores keep input order.
pub fn nms_boxes(candidates: &[Candidate], score_threshold: f32, nms_threshold: f32) -> Vec<usize> {
    if candidates.is_empty() {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..candidates.len())
        .filter(|&idx| candidates[idx].score >= score_threshold)
        .collect();
    order.sort_by(|&a, &b| score_cmp_desc((a, &candidates[a]), (b, &candidates[b])));

    let mut kept: Vec<usize> = Vec::new();
    'outer: for idx in order {
        let bbox = &candidates[idx].bbox;
        for &kept_idx in kept.iter() {
            if candidates[kept_idx].bbox.iou(bbox) > nms_threshold {
                continue 'outer;
            }
        }
        kept.push(idx);
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::nms_boxes;
    use crate::bbox::BBox;
    use crate::candidate::Candidate;

    fn cand(x: f32, score: f32, class_index: usize) -> Candidate {
        Candidate {
            bbox: BBox::new(x, 0.0, 10.0, 10.0),
            score,
            class_index,
            cell: 0,
        }
    }

    #[test]
    fn empty_input_returns_empty() {
        assert!(nms_boxes(&[], 0.25, 0.45).is_empty());
    }

    #[test]
    fn output_is_in_descending_score_order() {
        let c = [cand(0.0, 0.3, 0), cand(50.0, 0.9, 0), cand(100.0, 0.6, 0)];
        assert_eq!(nms_boxes(&c, 0.25, 0.45), vec![1, 2, 0]);
    }

    #[test]
    fn suppression_ignores_class() {
        // IoU of a 1-pixel shift is 90/110.
        let c = [cand(0.0, 0.8, 0), cand(1.0, 0.7, 5)];
        assert_eq!(nms_boxes(&c, 0.25, 0.45), vec![0]);
    }

    #[test]
    fn iou_equal_to_threshold_is_kept() {
        // Shifted by 5: IoU = 50 / 150 = 1/3.
        let c = [cand(0.0, 0.9, 0), cand(5.0, 0.8, 0)];
        assert_eq!(nms_boxes(&c, 0.0, 1.0 / 3.0), vec![0, 1]);
    }

    #[test]
    fn ties_keep_input_order() {
        let c = [cand(0.0, 0.5, 0), cand(1.0, 0.5, 0)];
        assert_eq!(nms_boxes(&c, 0.25, 0.45), vec![0]);
    }

    #[test]
    fn below_threshold_candidates_are_ignored() {
        let c = [cand(0.0, 0.1, 0), cand(50.0, 0.4, 0)];
        assert_eq!(nms_boxes(&c, 0.25, 0.45), vec![1]);
    }
}
