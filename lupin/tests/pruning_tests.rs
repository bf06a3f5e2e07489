use lupin::annot_common::Mat;
use lupin::pruning::*;
use lupin::reference::*;
use lupin::scoring::*;

use approx::assert_relative_eq;
use matrix_util::traits::MatWithNames;

fn names(prefix: &str, nn: usize) -> Vec<Box<str>> {
    (0..nn)
        .map(|ii| format!("{}_{}", prefix, ii + 1).into_boxed_str())
        .collect()
}

fn labels_of(ll: &[&str]) -> Vec<Box<str>> {
    ll.iter().map(|x| x.to_string().into_boxed_str()).collect()
}

fn expression(genes: &[&str], columns: &[&[f32]]) -> MatWithNames<Mat> {
    let nrows = genes.len();
    let ncols = columns.len();
    let mat = Mat::from_fn(nrows, ncols, |gg, jj| columns[jj][gg]);
    MatWithNames {
        rows: labels_of(genes),
        cols: names("cell", ncols),
        mat,
    }
}

fn score_matrix(labels: &[&str], rows: &[&[f32]]) -> ScoreMatrix {
    ScoreMatrix {
        cells: names("cell", rows.len()),
        labels: labels_of(labels),
        scores_nl: Mat::from_fn(rows.len(), labels.len(), |ii, jj| rows[ii][jj]),
    }
}

#[test]
fn delta_is_top_score_minus_median_of_the_rest() {
    let scores = score_matrix(&["A", "B", "C", "D"], &[&[0.9, 0.1, 0.2, 0.4]]);
    let deltas = score_deltas(&scores, &[0]);

    assert_relative_eq!(deltas[0], 0.9 - 0.2, epsilon = 1e-6);
}

#[test]
fn clean_disjoint_markers_survive_pruning() -> anyhow::Result<()> {
    let genes = ["g1", "g2", "g3", "g4", "g5", "g6"];
    let a_cell: &[f32] = &[9.0, 8.0, 7.0, 1.0, 0.0, 0.0];
    let b_cell: &[f32] = &[0.0, 1.0, 0.0, 7.0, 8.0, 9.0];

    let ref_data = expression(&genes, &[a_cell, a_cell, b_cell, b_cell]);
    let ref_labels = labels_of(&["A", "A", "B", "B"]);

    let opts = ReferenceOptions {
        num_markers: 0,
        ..ReferenceOptions::default()
    };
    let reference = build_reference(&ref_data, &ref_labels, &opts)?;

    let query = expression(&genes, &[a_cell, a_cell, a_cell, b_cell, b_cell, b_cell]);

    let scores = SpearmanScorer::default().score_cells(&reference, &query)?;
    let assignment = assign_labels(&scores);

    let called: Vec<&str> = assignment
        .iter()
        .map(|&kk| scores.labels[kk].as_ref())
        .collect();
    assert_eq!(called, vec!["A", "A", "A", "B", "B", "B"]);

    let (decisions, summaries) =
        prune_assignments(&scores, &assignment, &PruningOptions::default());

    assert!(decisions.iter().all(|dd| !dd.pruned));
    assert!(summaries.iter().all(|ss| ss.n_pruned == 0));
    Ok(())
}

#[test]
fn flat_expression_cell_is_pruned() -> anyhow::Result<()> {
    let genes = ["g1", "g2", "g3", "g4", "g5", "g6"];
    let a_cell: &[f32] = &[9.0, 8.0, 7.0, 1.0, 0.0, 0.0];
    let b_cell: &[f32] = &[0.0, 1.0, 0.0, 7.0, 8.0, 9.0];
    let flat: &[f32] = &[2.0, 2.0, 2.0, 2.0, 2.0, 2.0];

    let ref_data = expression(&genes, &[a_cell, a_cell, b_cell, b_cell]);
    let ref_labels = labels_of(&["A", "A", "B", "B"]);

    let opts = ReferenceOptions {
        num_markers: 0,
        ..ReferenceOptions::default()
    };
    let reference = build_reference(&ref_data, &ref_labels, &opts)?;

    // twelve confident A cells pin the delta distribution of label A;
    // a flat cell has zero rank variance, scores 0 against every
    // label, and ties to A
    let mut columns: Vec<&[f32]> = vec![a_cell; 12];
    columns.push(flat);
    let query = expression(&genes, &columns);

    let scores = SpearmanScorer::default().score_cells(&reference, &query)?;
    let assignment = assign_labels(&scores);
    assert!(assignment.iter().all(|&kk| scores.labels[kk].as_ref() == "A"));

    let (decisions, summaries) =
        prune_assignments(&scores, &assignment, &PruningOptions::default());

    assert!(!decisions[0].pruned);
    assert!(decisions[12].pruned);
    assert_relative_eq!(decisions[12].delta, 0.0, epsilon = 1e-6);

    let a_summary = summaries.iter().find(|ss| ss.label.as_ref() == "A").unwrap();
    assert_eq!(a_summary.n_cells, 13);
    assert_eq!(a_summary.n_pruned, 1);
    assert!(a_summary.threshold.is_some());
    Ok(())
}

#[test]
fn pruning_never_touches_scores_or_assignment() {
    let scores = score_matrix(
        &["A", "B", "C"],
        &[
            &[0.9, 0.1, 0.2],
            &[0.8, 0.2, 0.1],
            &[0.7, 0.3, 0.2],
            &[0.1, 0.1, 0.1],
        ],
    );

    let before = scores.scores_nl.clone();
    let assignment = assign_labels(&scores);
    let (decisions, _) = prune_assignments(&scores, &assignment, &PruningOptions::default());

    assert_eq!(scores.scores_nl, before);
    assert_eq!(assignment, assign_labels(&scores));
    assert_eq!(decisions.len(), scores.num_cells());
}

#[test]
fn min_delta_floor_applies_to_every_cell() {
    let scores = score_matrix(
        &["A", "B", "C"],
        &[&[0.9, 0.1, 0.2], &[0.8, 0.2, 0.1], &[0.7, 0.3, 0.2]],
    );
    let assignment = assign_labels(&scores);

    let opts = PruningOptions {
        nmads: 3.0,
        min_delta: 10.0,
    };
    let (decisions, _) = prune_assignments(&scores, &assignment, &opts);

    assert!(decisions.iter().all(|dd| dd.pruned));
}

#[test]
fn small_labels_are_exempt_from_outlier_calling() {
    // only two cells are assigned to each label, below the minimum
    // group size, so the MAD rule never fires
    let scores = score_matrix(
        &["A", "B"],
        &[
            &[0.9, 0.1],
            &[0.2, 0.1],
            &[0.1, 0.9],
            &[0.1, 0.2],
        ],
    );
    let assignment = assign_labels(&scores);
    assert_eq!(assignment, vec![0, 0, 1, 1]);

    let (decisions, summaries) =
        prune_assignments(&scores, &assignment, &PruningOptions::default());

    assert!(decisions.iter().all(|dd| !dd.pruned));
    assert!(summaries.iter().all(|ss| ss.threshold.is_none()));
}
