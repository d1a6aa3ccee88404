use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use yolopost::lowlevel::{decode, filter_candidates, nms_boxes};
use yolopost::{BBox, Candidate, RawOutputTensor};

fn random_candidates(rng: &mut StdRng, n: usize) -> Vec<Candidate> {
    (0..n)
        .map(|cell| Candidate {
            bbox: BBox::new(
                rng.random_range(0.0..100.0),
                rng.random_range(0.0..100.0),
                rng.random_range(5.0..40.0),
                rng.random_range(5.0..40.0),
            ),
            score: rng.random_range(0.0..1.0),
            class_index: rng.random_range(0..4),
            cell,
        })
        .collect()
}

#[test]
fn filter_never_emits_scores_below_threshold() {
    let mut rng = StdRng::seed_from_u64(21);
    let rows: Vec<_> = (0..300)
        .map(|_| {
            let scores = (0..5).map(|_| rng.random_range(0.0..1.0)).collect();
            ([50.0, 50.0, 10.0, 10.0], scores)
        })
        .collect();
    let tensor = RawOutputTensor::from_cells(5, &rows).unwrap();
    let cells = decode(tensor.view(), 5, "b").unwrap();

    for &threshold in &[0.0f32, 0.25, 0.5, 0.9, 1.0] {
        let kept = filter_candidates(&cells, threshold);
        assert!(kept.iter().all(|c| c.score >= threshold));

        let expected = rows
            .iter()
            .filter(|(_, scores)| scores.iter().any(|&s| s >= threshold))
            .count();
        assert_eq!(kept.len(), expected);
    }
}

#[test]
fn kept_boxes_never_overlap_beyond_threshold() {
    let mut rng = StdRng::seed_from_u64(99);
    for &nms_threshold in &[0.0f32, 0.3, 0.45, 0.7] {
        let candidates = random_candidates(&mut rng, 200);
        let kept = nms_boxes(&candidates, 0.25, nms_threshold);
        assert!(!kept.is_empty());

        for (i, &a) in kept.iter().enumerate() {
            for &b in &kept[i + 1..] {
                let iou = candidates[a].bbox.iou(&candidates[b].bbox);
                assert!(iou <= nms_threshold, "iou {iou} > {nms_threshold}");
            }
        }

        for pair in kept.windows(2) {
            assert!(candidates[pair[0]].score >= candidates[pair[1]].score);
        }

        for (idx, c) in candidates.iter().enumerate() {
            if c.score < 0.25 || kept.contains(&idx) {
                continue;
            }
            let suppressed = kept.iter().any(|&k| {
                candidates[k].score >= c.score && candidates[k].bbox.iou(&c.bbox) > nms_threshold
            });
            assert!(suppressed, "candidate {idx} dropped without a suppressor");
        }
    }
}

#[test]
fn empty_candidate_set_yields_nothing() {
    assert!(nms_boxes(&[], 0.25, 0.45).is_empty());
}

#[test]
fn overlapping_pair_keeps_higher_score() {
    // Shifting a 10x10 box by 2.5 gives IoU 75 / 125 = 0.6.
    let a = BBox::new(0.0, 0.0, 10.0, 10.0);
    let b = BBox::new(2.5, 0.0, 10.0, 10.0);
    assert!((a.iou(&b) - 0.6).abs() < 1e-6);

    let candidates = [
        Candidate {
            bbox: b,
            score: 0.7,
            class_index: 0,
            cell: 0,
        },
        Candidate {
            bbox: a,
            score: 0.9,
            class_index: 0,
            cell: 1,
        },
    ];
    assert_eq!(nms_boxes(&candidates, 0.25, 0.45), vec![1]);
}
