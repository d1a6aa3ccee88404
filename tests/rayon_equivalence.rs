#![cfg(feature = "rayon")]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use yolopost::lowlevel::{decode, filter_candidates, filter_candidates_par_into};
use yolopost::{BranchConfig, Engine, EngineConfig, RawOutputTensor, TensorView};

fn random_tensor(rng: &mut StdRng, cells: usize, classes: usize) -> RawOutputTensor {
    let rows: Vec<_> = (0..cells)
        .map(|_| {
            let bbox = [
                rng.random_range(0.0..640.0),
                rng.random_range(0.0..640.0),
                rng.random_range(4.0..120.0),
                rng.random_range(4.0..120.0),
            ];
            let scores = (0..classes).map(|_| rng.random_range(0.0..0.6)).collect();
            (bbox, scores)
        })
        .collect();
    RawOutputTensor::from_cells(classes, &rows).unwrap()
}

#[test]
fn parallel_filter_matches_sequential() {
    let mut rng = StdRng::seed_from_u64(5);
    let tensor = random_tensor(&mut rng, 2000, 8);
    let cells = decode(tensor.view(), 8, "b").unwrap();

    let seq = filter_candidates(&cells, 0.25);
    let mut par = Vec::new();
    filter_candidates_par_into(&cells, 0.25, &mut par);
    assert_eq!(seq, par);
}

#[test]
fn parallel_engine_matches_sequential() {
    let mut rng = StdRng::seed_from_u64(17);
    let tensors = [
        random_tensor(&mut rng, 1500, 80),
        random_tensor(&mut rng, 900, 3),
    ];
    let views: Vec<TensorView<'_>> = tensors.iter().map(RawOutputTensor::view).collect();

    let base = EngineConfig {
        branches: vec![BranchConfig::new("INPUT_0", 80), BranchConfig::new("INPUT_1", 3)],
        ..EngineConfig::default()
    };
    let seq = Engine::new(EngineConfig {
        parallel: false,
        ..base.clone()
    })
    .unwrap();
    let par = Engine::new(EngineConfig {
        parallel: true,
        ..base
    })
    .unwrap();

    let seq_set = seq.process(&views).unwrap();
    let par_set = par.process(&views).unwrap();
    assert!(!seq_set.is_empty());
    assert_eq!(seq_set, par_set);
}
