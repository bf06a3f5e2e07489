use crate::annot_common::*;
use crate::scoring::ScoreMatrix;

use matrix_util::dmatrix_stat::{mad, median};
use matrix_util::utils::partition_by_membership;

use serde::Serialize;

/// Scale factor that makes the MAD consistent with a normal sigma
const MAD_SIGMA: f32 = 1.4826;

/// A label needs at least this many assigned cells before its delta
/// distribution is trusted for outlier calling
const MIN_CELLS_FOR_PRUNING: usize = 3;

#[derive(Clone, Debug)]
pub struct PruningOptions {
    /// number of MADs below the per-label median delta
    pub nmads: f32,
    /// absolute floor on the delta regardless of the distribution
    pub min_delta: f32,
}

impl Default for PruningOptions {
    fn default() -> Self {
        Self {
            nmads: DEFAULT_NMADS,
            min_delta: DEFAULT_MIN_DELTA,
        }
    }
}

/// Per-cell pruning outcome; never rewrites the assigned label, it
/// only withdraws confidence from it.
#[derive(Clone, Copy, Debug)]
pub struct PruningDecision {
    pub delta: f32,
    pub pruned: bool,
}

/// Empirical delta distribution of one label, ready for QC plotting
#[derive(Clone, Debug, Serialize)]
pub struct LabelDeltaSummary {
    pub label: Box<str>,
    pub n_cells: usize,
    pub median: f32,
    pub mad: f32,
    /// `None` when the label had too few cells to call outliers
    pub threshold: Option<f32>,
    pub n_pruned: usize,
    pub deltas: Vec<f32>,
}

/// Delta per cell: the assigned label's score minus the median of the
/// remaining scores in the row. The median baseline stays stable when
/// two labels are near-duplicates, unlike a top-minus-second margin.
pub fn score_deltas(scores: &ScoreMatrix, assignment: &[usize]) -> Vec<f32> {
    let num_labels = scores.num_labels();

    scores
        .scores_nl
        .row_iter()
        .zip(assignment.iter())
        .map(|(row, &kk)| {
            let top = row[kk];
            let others: Vec<f32> = (0..num_labels).filter(|&jj| jj != kk).map(|jj| row[jj]).collect();
            if others.is_empty() {
                return 0.0;
            }
            top - median(&others)
        })
        .collect()
}

/// Flag low-confidence assignments per label: a cell is pruned when
/// its delta falls below `median - nmads * 1.4826 * MAD` of its
/// label's delta distribution, or below the absolute `min_delta`
/// floor. The ScoreMatrix and the assignment itself are left intact.
pub fn prune_assignments(
    scores: &ScoreMatrix,
    assignment: &[usize],
    opts: &PruningOptions,
) -> (Vec<PruningDecision>, Vec<LabelDeltaSummary>) {
    let deltas = score_deltas(scores, assignment);

    let mut decisions: Vec<PruningDecision> = deltas
        .iter()
        .map(|&delta| PruningDecision {
            delta,
            pruned: delta < opts.min_delta,
        })
        .collect();

    let groups = partition_by_membership(assignment, None);

    let mut summaries = Vec::with_capacity(scores.num_labels());
    for (kk, label) in scores.labels.iter().enumerate() {
        let cells: &[usize] = groups.get(&kk).map(|v| v.as_slice()).unwrap_or(&[]);
        let label_deltas: Vec<f32> = cells.iter().map(|&ii| deltas[ii]).collect();

        let mut threshold = None;
        if label_deltas.len() >= MIN_CELLS_FOR_PRUNING {
            let centre = median(&label_deltas);
            let sigma = MAD_SIGMA * mad(&label_deltas, centre);
            let cutoff = centre - opts.nmads * sigma;
            threshold = Some(cutoff);

            for &ii in cells {
                if deltas[ii] < cutoff {
                    decisions[ii].pruned = true;
                }
            }
        }

        let n_pruned = cells.iter().filter(|&&ii| decisions[ii].pruned).count();

        summaries.push(LabelDeltaSummary {
            label: label.clone(),
            n_cells: cells.len(),
            median: if label_deltas.is_empty() {
                0.0
            } else {
                median(&label_deltas)
            },
            mad: if label_deltas.is_empty() {
                0.0
            } else {
                mad(&label_deltas, median(&label_deltas))
            },
            threshold,
            n_pruned,
            deltas: label_deltas,
        });
    }

    let total_pruned = decisions.iter().filter(|d| d.pruned).count();
    info!(
        "pruned {} of {} assignments",
        total_pruned,
        decisions.len()
    );

    (decisions, summaries)
}
