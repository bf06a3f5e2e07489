use crate::annot_common::*;
use crate::error::AnnotError;
use crate::reference::ReferenceProfile;

use matrix_util::dmatrix_stat::{average_ranks, pearson};
use matrix_util::traits::MatWithNames;

use fnv::FnvHashMap as HashMap;
use indicatif::ParallelProgressIterator;
use rayon::prelude::*;

/// `cell x label` similarity scores; immutable once produced. Values
/// are comparable within a row (used for ranking labels per cell) but
/// not across rows.
#[derive(Clone, Debug)]
pub struct ScoreMatrix {
    pub cells: Vec<Box<str>>,
    pub labels: Vec<Box<str>>,
    pub scores_nl: Mat,
}

impl ScoreMatrix {
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn num_labels(&self) -> usize {
        self.labels.len()
    }
}

/// Scoring seam: alternative similarity measures can be swapped in
/// without touching the pruner or the output writers.
pub trait LabelScorer {
    fn score_cells(
        &self,
        reference: &ReferenceProfile,
        query: &MatWithNames<Mat>,
    ) -> anyhow::Result<ScoreMatrix>;
}

/// Spearman rank correlation between each query cell and each label
/// profile over the reconciled marker panel.
#[derive(Clone, Debug)]
pub struct SpearmanScorer {
    pub target_library_size: f32,
}

impl Default for SpearmanScorer {
    fn default() -> Self {
        Self {
            target_library_size: TARGET_LIBRARY_SIZE,
        }
    }
}

impl LabelScorer for SpearmanScorer {
    fn score_cells(
        &self,
        reference: &ReferenceProfile,
        query: &MatWithNames<Mat>,
    ) -> anyhow::Result<ScoreMatrix> {
        let num_cells = query.mat.ncols();

        if query.cols.len() != num_cells || query.rows.len() != query.mat.nrows() {
            return Err(AnnotError::InvalidInput(format!(
                "names ({} genes, {} cells) do not match the query matrix ({} x {})",
                query.rows.len(),
                query.cols.len(),
                query.mat.nrows(),
                num_cells
            ))
            .into());
        }

        // reconcile the panel with the query gene set; genes absent
        // on either side are dropped from the comparison
        let query_index: HashMap<&str, usize> = query
            .rows
            .iter()
            .enumerate()
            .map(|(jj, gg)| (gg.as_ref(), jj))
            .collect();

        let mut panel_rows = Vec::with_capacity(reference.genes().len());
        let mut query_rows = Vec::with_capacity(reference.genes().len());
        for (ii, gg) in reference.genes().iter().enumerate() {
            if let Some(&jj) = query_index.get(gg.as_ref()) {
                panel_rows.push(ii);
                query_rows.push(jj);
            }
        }

        if panel_rows.is_empty() {
            return Err(AnnotError::InsufficientOverlap {
                needed: reference.genes().len(),
                found: 0,
            }
            .into());
        }

        info!(
            "{} of {} panel genes present in the query",
            panel_rows.len(),
            reference.genes().len()
        );

        // rank each label profile over the reconciled panel once
        let profile = reference.profile();
        let label_ranks: Vec<Vec<f32>> = (0..reference.num_labels())
            .map(|kk| {
                let values: Vec<f32> = panel_rows.iter().map(|&ii| profile[(ii, kk)]).collect();
                average_ranks(&values)
            })
            .collect();

        let target = self.target_library_size;

        // each cell owns its own score row
        let score_rows: Vec<Vec<f32>> = (0..num_cells)
            .into_par_iter()
            .progress_count(num_cells as u64)
            .map(|jj| {
                let x_j = query.mat.column(jj);
                let total: f32 = x_j.sum();
                let scale = if total > 0.0 { target / total } else { 0.0 };

                let values: Vec<f32> = query_rows
                    .iter()
                    .map(|&ii| (x_j[ii] * scale).ln_1p())
                    .collect();
                let cell_ranks = average_ranks(&values);

                label_ranks
                    .iter()
                    .map(|rr| pearson(&cell_ranks, rr))
                    .collect()
            })
            .collect();

        let scores_nl = Mat::from_fn(num_cells, reference.num_labels(), |ii, jj| {
            score_rows[ii][jj]
        });

        Ok(ScoreMatrix {
            cells: query.cols.clone(),
            labels: reference.labels().to_vec(),
            scores_nl,
        })
    }
}

/// Arg-max label per cell. Ties go to the smallest column index, and
/// labels are kept in lexicographic order, so the lexicographically
/// first label wins a tie; repeated runs give the same answer.
pub fn assign_labels(scores: &ScoreMatrix) -> Vec<usize> {
    scores
        .scores_nl
        .row_iter()
        .map(|row| {
            let mut best = 0_usize;
            for jj in 1..row.ncols() {
                if row[jj] > row[best] {
                    best = jj;
                }
            }
            best
        })
        .collect()
}

/// Arg-max restricted to the labels of each cell's group, with the
/// same tie-breaking rule; a cell with an empty group falls back to
/// the full row.
///
/// * `label_group` - group index per score column
/// * `cell_group` - group index per cell
pub fn assign_labels_in_groups(
    scores: &ScoreMatrix,
    label_group: &[usize],
    cell_group: &[usize],
) -> Vec<usize> {
    scores
        .scores_nl
        .row_iter()
        .zip(cell_group.iter())
        .map(|(row, &gg)| {
            let mut best: Option<usize> = None;
            for jj in 0..row.ncols() {
                if label_group[jj] != gg {
                    continue;
                }
                match best {
                    Some(bb) if row[jj] <= row[bb] => {}
                    _ => best = Some(jj),
                }
            }
            best.unwrap_or_else(|| {
                let mut bb = 0_usize;
                for jj in 1..row.ncols() {
                    if row[jj] > row[bb] {
                        bb = jj;
                    }
                }
                bb
            })
        })
        .collect()
}

/// Two-pass hierarchical scoring output: the fine ScoreMatrix stays
/// complete (all fine labels for every cell); only the assignment is
/// restricted by the winning coarse label.
pub struct HierarchicalScores {
    pub coarse: ScoreMatrix,
    pub fine: ScoreMatrix,
    pub assignment: Vec<usize>,
}

/// Score the coarse profiles first, then assign each cell to the best
/// fine label within its winning coarse group.
pub fn score_hierarchical<S: LabelScorer>(
    scorer: &S,
    fine_reference: &ReferenceProfile,
    coarse_reference: &ReferenceProfile,
    fine_to_coarse: &HashMap<Box<str>, Box<str>>,
    query: &MatWithNames<Mat>,
) -> anyhow::Result<HierarchicalScores> {
    let coarse_of: HashMap<&str, usize> = coarse_reference
        .labels()
        .iter()
        .enumerate()
        .map(|(kk, ll)| (ll.as_ref(), kk))
        .collect();

    let label_group: Vec<usize> = fine_reference
        .labels()
        .iter()
        .map(|fine| {
            let coarse = fine_to_coarse.get(fine).ok_or_else(|| {
                AnnotError::InvalidInput(format!("no coarse label for '{}'", fine))
            })?;
            coarse_of.get(coarse.as_ref()).copied().ok_or_else(|| {
                anyhow::Error::from(AnnotError::InvalidInput(format!(
                    "unknown coarse label '{}'",
                    coarse
                )))
            })
        })
        .collect::<anyhow::Result<_>>()?;

    info!("coarse pass over {} labels", coarse_reference.num_labels());
    let coarse = scorer.score_cells(coarse_reference, query)?;
    let cell_group = assign_labels(&coarse);

    info!("fine pass over {} labels", fine_reference.num_labels());
    let fine = scorer.score_cells(fine_reference, query)?;
    let assignment = assign_labels_in_groups(&fine, &label_group, &cell_group);

    Ok(HierarchicalScores {
        coarse,
        fine,
        assignment,
    })
}
