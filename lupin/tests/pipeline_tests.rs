use lupin::pruning::*;
use lupin::reference::*;
use lupin::scoring::*;
use lupin::simulate::*;

use lupin::annot_common::Mat;
use matrix_util::traits::IoOps;

fn small_simulation() -> anyhow::Result<SimOut> {
    generate_labeled_pair(&SimArgs {
        num_genes: 120,
        num_types: 3,
        ref_cells_per_type: 30,
        query_cells: 90,
        markers_per_type: 10,
        depth: 2000,
        marker_fold: 5.0,
        rseed: 7,
    })
}

#[test]
fn simulated_query_is_annotated_accurately() -> anyhow::Result<()> {
    let sim = small_simulation()?;

    let reference = build_reference(&sim.ref_data, &sim.ref_labels, &ReferenceOptions::default())?;
    let scores = SpearmanScorer::default().score_cells(&reference, &sim.query_data)?;
    let assignment = assign_labels(&scores);

    let n_correct = assignment
        .iter()
        .zip(sim.query_labels.iter())
        .filter(|&(&kk, truth)| &scores.labels[kk] == truth)
        .count();

    let accuracy = n_correct as f32 / sim.query_labels.len() as f32;
    assert!(accuracy > 0.9, "accuracy {} too low", accuracy);

    // pruning can only withdraw calls, never add them
    let (decisions, _) = prune_assignments(&scores, &assignment, &PruningOptions::default());
    let n_kept = decisions.iter().filter(|dd| !dd.pruned).count();
    assert!(n_kept <= sim.query_labels.len());
    assert!(n_kept as f32 / sim.query_labels.len() as f32 > 0.5);
    Ok(())
}

#[test]
fn score_checkpoint_round_trip_reproduces_the_assignment() -> anyhow::Result<()> {
    let sim = small_simulation()?;

    let reference = build_reference(&sim.ref_data, &sim.ref_labels, &ReferenceOptions::default())?;
    let scores = SpearmanScorer::default().score_cells(&reference, &sim.query_data)?;
    let assignment = assign_labels(&scores);
    let (decisions, _) = prune_assignments(&scores, &assignment, &PruningOptions::default());

    let dir = tempfile::tempdir()?;
    let file = dir
        .path()
        .join("scores.parquet")
        .to_string_lossy()
        .to_string();

    scores
        .scores_nl
        .to_parquet(&file, Some(&scores.cells), Some(&scores.labels))?;

    let checkpoint = Mat::from_parquet(&file)?;
    let restored = ScoreMatrix {
        cells: checkpoint.rows,
        labels: checkpoint.cols,
        scores_nl: checkpoint.mat,
    };

    assert_eq!(restored.cells, scores.cells);
    assert_eq!(restored.labels, scores.labels);
    assert_eq!(restored.scores_nl, scores.scores_nl);

    let reassignment = assign_labels(&restored);
    assert_eq!(reassignment, assignment);

    let (redecisions, _) = prune_assignments(&restored, &reassignment, &PruningOptions::default());
    let flags: Vec<bool> = decisions.iter().map(|dd| dd.pruned).collect();
    let reflags: Vec<bool> = redecisions.iter().map(|dd| dd.pruned).collect();
    assert_eq!(flags, reflags);
    Ok(())
}

#[test]
fn simulation_is_reproducible_for_a_fixed_seed() -> anyhow::Result<()> {
    let s1 = small_simulation()?;
    let s2 = small_simulation()?;

    assert_eq!(s1.ref_data.mat, s2.ref_data.mat);
    assert_eq!(s1.query_data.mat, s2.query_data.mat);
    assert_eq!(s1.ref_labels, s2.ref_labels);
    assert_eq!(s1.query_labels, s2.query_labels);
    Ok(())
}
