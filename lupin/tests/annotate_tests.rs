use lupin::annot_common::Mat;
use lupin::error::AnnotError;
use lupin::reference::*;
use lupin::scoring::*;

use fnv::FnvHashMap;
use matrix_util::traits::MatWithNames;

fn names(prefix: &str, nn: usize) -> Vec<Box<str>> {
    (0..nn)
        .map(|ii| format!("{}_{}", prefix, ii + 1).into_boxed_str())
        .collect()
}

fn labels_of(ll: &[&str]) -> Vec<Box<str>> {
    ll.iter().map(|x| x.to_string().into_boxed_str()).collect()
}

/// gene x cell matrix from per-cell columns
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

fn two_label_reference() -> MatWithNames<Mat> {
    expression(
        &["g1", "g2", "g3", "g4"],
        &[
            &[5.0, 4.0, 0.0, 1.0],
            &[6.0, 5.0, 1.0, 0.0],
            &[0.0, 1.0, 5.0, 4.0],
            &[1.0, 0.0, 6.0, 5.0],
        ],
    )
}

fn all_gene_opts() -> ReferenceOptions {
    ReferenceOptions {
        num_markers: 0,
        ..ReferenceOptions::default()
    }
}

#[test]
fn one_profile_per_distinct_label() -> anyhow::Result<()> {
    let data = two_label_reference();
    let labels = labels_of(&["B", "A", "B", "A"]);

    let reference = build_reference(&data, &labels, &all_gene_opts())?;

    // distinct labels in lexicographic order, one profile column each
    assert_eq!(reference.labels(), labels_of(&["A", "B"]).as_slice());
    assert_eq!(reference.num_labels(), 2);
    assert_eq!(reference.profile().ncols(), 2);
    assert_eq!(reference.profile().nrows(), reference.genes().len());
    Ok(())
}

#[test]
fn assignment_is_row_argmax_with_first_label_ties() {
    let scores = ScoreMatrix {
        cells: names("cell", 4),
        labels: labels_of(&["A", "B", "C"]),
        scores_nl: Mat::from_fn(4, 3, |ii, jj| match ii {
            0 => [0.1, 0.9, 0.2][jj],
            1 => [0.7, 0.1, 0.2][jj],
            2 => [0.5, 0.5, 0.1][jj], // tie between A and B
            _ => [0.0, 0.0, 0.0][jj], // three-way tie
        }),
    };

    assert_eq!(assign_labels(&scores), vec![1, 0, 0, 0]);
}

#[test]
fn scoring_is_deterministic() -> anyhow::Result<()> {
    let data = two_label_reference();
    let labels = labels_of(&["A", "A", "B", "B"]);
    let reference = build_reference(&data, &labels, &all_gene_opts())?;

    let query = expression(
        &["g1", "g2", "g3", "g4"],
        &[&[7.0, 5.0, 1.0, 0.0], &[0.0, 1.0, 7.0, 5.0]],
    );

    let scorer = SpearmanScorer::default();
    let first = scorer.score_cells(&reference, &query)?;
    let second = scorer.score_cells(&reference, &query)?;

    assert_eq!(first.scores_nl, second.scores_nl);
    assert_eq!(assign_labels(&first), assign_labels(&second));
    Ok(())
}

#[test]
fn query_like_cells_recover_their_labels() -> anyhow::Result<()> {
    let data = two_label_reference();
    let labels = labels_of(&["A", "A", "B", "B"]);
    let reference = build_reference(&data, &labels, &all_gene_opts())?;

    let query = expression(
        &["g1", "g2", "g3", "g4"],
        &[&[7.0, 5.0, 1.0, 0.0], &[0.0, 1.0, 7.0, 5.0]],
    );

    let scores = SpearmanScorer::default().score_cells(&reference, &query)?;
    let assignment = assign_labels(&scores);

    assert_eq!(scores.labels[assignment[0]].as_ref(), "A");
    assert_eq!(scores.labels[assignment[1]].as_ref(), "B");
    Ok(())
}

#[test]
fn extra_query_gene_leaves_scores_unchanged() -> anyhow::Result<()> {
    let data = two_label_reference();
    let labels = labels_of(&["A", "A", "B", "B"]);
    let reference = build_reference(&data, &labels, &all_gene_opts())?;

    let query = expression(
        &["g1", "g2", "g3", "g4"],
        &[&[7.0, 5.0, 1.0, 0.0], &[0.0, 1.0, 7.0, 5.0]],
    );

    // g5 never occurs in the reference, so it is dropped from the
    // reconciled panel; the rank correlation should not move
    let wider = expression(
        &["g1", "g2", "g3", "g4", "g5"],
        &[&[7.0, 5.0, 1.0, 0.0, 3.0], &[0.0, 1.0, 7.0, 5.0, 2.0]],
    );

    let scorer = SpearmanScorer::default();
    let base = scorer.score_cells(&reference, &query)?;
    let extended = scorer.score_cells(&reference, &wider)?;

    assert_eq!(base.scores_nl, extended.scores_nl);
    Ok(())
}

#[test]
fn extra_silent_reference_gene_leaves_scores_unchanged() -> anyhow::Result<()> {
    let labels = labels_of(&["A", "A", "B", "B"]);

    let base_ref = two_label_reference();
    let wider_ref = expression(
        &["g1", "g2", "g3", "g4", "g5"],
        &[
            &[5.0, 4.0, 0.0, 1.0, 0.0],
            &[6.0, 5.0, 1.0, 0.0, 0.0],
            &[0.0, 1.0, 5.0, 4.0, 0.0],
            &[1.0, 0.0, 6.0, 5.0, 0.0],
        ],
    );

    let query = expression(
        &["g1", "g2", "g3", "g4"],
        &[&[7.0, 5.0, 1.0, 0.0], &[0.0, 1.0, 7.0, 5.0]],
    );

    let scorer = SpearmanScorer::default();
    let base = build_reference(&base_ref, &labels, &all_gene_opts())?;
    let wider = build_reference(&wider_ref, &labels, &all_gene_opts())?;

    let s1 = scorer.score_cells(&base, &query)?;
    let s2 = scorer.score_cells(&wider, &query)?;

    assert_eq!(s1.scores_nl, s2.scores_nl);
    Ok(())
}

#[test]
fn mismatched_labels_are_rejected() {
    let data = two_label_reference();
    let labels = labels_of(&["A", "A", "B"]); // one short

    let err = build_reference(&data, &labels, &all_gene_opts()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AnnotError>(),
        Some(AnnotError::InvalidInput(_))
    ));
}

#[test]
fn single_label_reference_is_rejected() {
    let data = two_label_reference();
    let labels = labels_of(&["A", "A", "A", "A"]);

    let err = build_reference(&data, &labels, &all_gene_opts()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AnnotError>(),
        Some(AnnotError::InvalidInput(_))
    ));
}

#[test]
fn underpopulated_label_is_rejected() {
    let data = two_label_reference();
    let labels = labels_of(&["A", "A", "A", "B"]);

    let opts = ReferenceOptions {
        min_cells_per_label: 2,
        ..all_gene_opts()
    };

    let err = build_reference(&data, &labels, &opts).unwrap_err();
    match err.downcast_ref::<AnnotError>() {
        Some(AnnotError::EmptyLabel {
            label,
            n_cells,
            min_cells,
        }) => {
            assert_eq!(label.as_ref(), "B");
            assert_eq!(*n_cells, 1);
            assert_eq!(*min_cells, 2);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn disjoint_gene_sets_are_rejected() -> anyhow::Result<()> {
    let data = two_label_reference();
    let labels = labels_of(&["A", "A", "B", "B"]);
    let reference = build_reference(&data, &labels, &all_gene_opts())?;

    let query = expression(
        &["h1", "h2", "h3", "h4"],
        &[&[7.0, 5.0, 1.0, 0.0], &[0.0, 1.0, 7.0, 5.0]],
    );

    let err = SpearmanScorer::default()
        .score_cells(&reference, &query)
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AnnotError>(),
        Some(AnnotError::InsufficientOverlap { found: 0, .. })
    ));
    Ok(())
}

#[test]
fn hierarchical_assignment_stays_in_the_winning_coarse_group() -> anyhow::Result<()> {
    let genes = ["g1", "g2", "g3", "g4", "g5", "g6", "g7", "g8"];

    // four fine labels, each marked by a disjoint pair of genes
    let fine_profiles: [&[f32]; 4] = [
        &[9.0, 8.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
        &[0.0, 1.0, 9.0, 8.0, 1.0, 0.0, 0.0, 0.0],
        &[0.0, 0.0, 1.0, 0.0, 9.0, 8.0, 1.0, 0.0],
        &[1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 9.0, 8.0],
    ];

    let columns: Vec<&[f32]> = fine_profiles
        .iter()
        .flat_map(|&cc| std::iter::repeat(cc).take(2))
        .collect();

    let ref_data = expression(&genes, &columns);
    let fine_labels = labels_of(&["a1", "a1", "a2", "a2", "b1", "b1", "b2", "b2"]);

    let mut fine_to_coarse: FnvHashMap<Box<str>, Box<str>> = FnvHashMap::default();
    for (fine, coarse) in [("a1", "alpha"), ("a2", "alpha"), ("b1", "beta"), ("b2", "beta")] {
        fine_to_coarse.insert(fine.into(), coarse.into());
    }

    let coarse_labels: Vec<Box<str>> = fine_labels
        .iter()
        .map(|ll| fine_to_coarse[ll].clone())
        .collect();

    let opts = all_gene_opts();
    let fine_reference = build_reference(&ref_data, &fine_labels, &opts)?;
    let coarse_reference = build_reference(&ref_data, &coarse_labels, &opts)?;

    let query = expression(
        &genes,
        &[
            &[8.0, 7.0, 2.0, 1.0, 0.0, 1.0, 0.0, 0.0],
            &[0.0, 1.0, 0.0, 0.0, 8.0, 7.0, 2.0, 1.0],
            &[1.0, 0.0, 0.0, 1.0, 0.0, 2.0, 8.0, 7.0],
        ],
    );

    let scorer = SpearmanScorer::default();
    let hier = score_hierarchical(
        &scorer,
        &fine_reference,
        &coarse_reference,
        &fine_to_coarse,
        &query,
    )?;

    // the fine ScoreMatrix keeps every label for checkpointing
    assert_eq!(hier.fine.num_labels(), 4);

    let coarse_winner = assign_labels(&hier.coarse);
    for (ii, &kk) in hier.assignment.iter().enumerate() {
        let fine = &hier.fine.labels[kk];
        let coarse = &fine_to_coarse[fine];
        assert_eq!(coarse, &hier.coarse.labels[coarse_winner[ii]]);
    }

    assert_eq!(hier.fine.labels[hier.assignment[0]].as_ref(), "a1");
    assert_eq!(hier.fine.labels[hier.assignment[1]].as_ref(), "b1");
    assert_eq!(hier.fine.labels[hier.assignment[2]].as_ref(), "b2");
    Ok(())
}
