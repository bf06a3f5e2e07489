use crate::annot_common::*;
use crate::error::AnnotError;

use matrix_util::dmatrix_stat::median;
use matrix_util::dmatrix_util::subset_rows;
use matrix_util::traits::MatWithNames;
use matrix_util::utils::partition_by_membership;

use clap::ValueEnum;
use fnv::FnvHashSet as HashSet;
use rayon::prelude::*;
use std::cmp::Ordering;

/// Per-label aggregate statistic for the reference profiles
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProfileStat {
    /// median expression per gene (robust to outlier cells)
    Median,
    /// mean expression per gene
    Mean,
}

#[derive(Clone, Debug)]
pub struct ReferenceOptions {
    /// marker genes kept per label; `0` keeps all genes
    pub num_markers: usize,
    /// minimum number of reference cells per label
    pub min_cells_per_label: usize,
    pub profile_stat: ProfileStat,
    pub target_library_size: f32,
}

impl Default for ReferenceOptions {
    fn default() -> Self {
        Self {
            num_markers: DEFAULT_NUM_MARKERS,
            min_cells_per_label: 1,
            profile_stat: ProfileStat::Median,
            target_library_size: TARGET_LIBRARY_SIZE,
        }
    }
}

/// Per-label expression profiles over a marker gene panel, built once
/// per analysis run and read-only afterwards.
#[derive(Clone, Debug)]
pub struct ReferenceProfile {
    labels: Vec<Box<str>>,
    genes: Vec<Box<str>>,
    profile_gk: Mat,
}

impl ReferenceProfile {
    /// Distinct labels in lexicographic order; this order fixes the
    /// ScoreMatrix columns and the tie-breaking rule downstream.
    pub fn labels(&self) -> &[Box<str>] {
        &self.labels
    }

    /// Marker panel gene names (a subset of the reference genes)
    pub fn genes(&self) -> &[Box<str>] {
        &self.genes
    }

    /// `gene x label` aggregate expression over the panel
    pub fn profile(&self) -> &Mat {
        &self.profile_gk
    }

    pub fn num_labels(&self) -> usize {
        self.labels.len()
    }
}

/// Build per-label reference profiles from a labeled expression matrix.
///
/// Columns are library-size normalized and `log1p`-transformed, then
/// aggregated per label, and a marker gene panel is selected by the
/// margin of each label's aggregate over its best competitor.
///
/// * `data` - `gene x cell` expression matrix with names
/// * `labels` - one label per reference cell/column
pub fn build_reference(
    data: &MatWithNames<Mat>,
    labels: &[Box<str>],
    opts: &ReferenceOptions,
) -> anyhow::Result<ReferenceProfile> {
    let num_cells = data.mat.ncols();
    let num_genes = data.mat.nrows();

    if data.cols.len() != num_cells || data.rows.len() != num_genes {
        return Err(AnnotError::InvalidInput(format!(
            "names ({} genes, {} cells) do not match the reference matrix ({} x {})",
            data.rows.len(),
            data.cols.len(),
            num_genes,
            num_cells
        ))
        .into());
    }

    if labels.len() != num_cells {
        return Err(AnnotError::InvalidInput(format!(
            "{} labels for {} reference cells",
            labels.len(),
            num_cells
        ))
        .into());
    }

    let mut distinct: Vec<Box<str>> = labels.to_vec();
    distinct.sort();
    distinct.dedup();

    if distinct.len() < 2 {
        return Err(AnnotError::InvalidInput(
            "need at least two distinct reference labels".to_string(),
        )
        .into());
    }

    let groups = partition_by_membership(labels, None);
    let min_cells = opts.min_cells_per_label.max(1);
    for label in &distinct {
        let n_cells = groups.get(label).map(|v| v.len()).unwrap_or(0);
        if n_cells < min_cells {
            return Err(AnnotError::EmptyLabel {
                label: label.clone(),
                n_cells,
                min_cells,
            }
            .into());
        }
    }

    info!(
        "building reference profiles: {} genes x {} cells, {} labels",
        num_genes,
        num_cells,
        distinct.len()
    );

    let mut norm = data.mat.clone();
    log1p_normalize_columns_inplace(&mut norm, opts.target_library_size);

    // per-label aggregate, one column per label in sorted label order
    let agg_columns: Vec<Vec<f32>> = distinct
        .par_iter()
        .map(|label| {
            let cells = &groups[label];
            let mut agg = Vec::with_capacity(num_genes);
            match opts.profile_stat {
                ProfileStat::Median => {
                    let mut buf = vec![0.0_f32; cells.len()];
                    for gg in 0..num_genes {
                        for (bb, &jj) in buf.iter_mut().zip(cells.iter()) {
                            *bb = norm[(gg, jj)];
                        }
                        agg.push(median(&buf));
                    }
                }
                ProfileStat::Mean => {
                    let denom = cells.len() as f32;
                    for gg in 0..num_genes {
                        let total: f32 = cells.iter().map(|&jj| norm[(gg, jj)]).sum();
                        agg.push(total / denom);
                    }
                }
            }
            agg
        })
        .collect();

    let stat_gk = Mat::from_fn(num_genes, distinct.len(), |gg, kk| agg_columns[kk][gg]);

    let panel = select_marker_panel(&stat_gk, opts.num_markers);

    info!(
        "selected a panel of {} marker genes ({} per label requested)",
        panel.len(),
        opts.num_markers
    );

    let genes: Vec<Box<str>> = panel.iter().map(|&gg| data.rows[gg].clone()).collect();
    let profile_gk = subset_rows(&stat_gk, &panel);

    Ok(ReferenceProfile {
        labels: distinct,
        genes,
        profile_gk,
    })
}

/// For each label, keep the `num_markers` genes with the largest
/// positive margin over the best competing label; the panel is the
/// union across labels.
fn select_marker_panel(stat_gk: &Mat, num_markers: usize) -> Vec<usize> {
    let num_genes = stat_gk.nrows();
    let num_labels = stat_gk.ncols();

    if num_markers == 0 {
        return (0..num_genes).collect();
    }

    let mut keep: HashSet<usize> = HashSet::default();

    for kk in 0..num_labels {
        let mut margins: Vec<(usize, f32)> = (0..num_genes)
            .map(|gg| {
                let own = stat_gk[(gg, kk)];
                let mut best_other = f32::NEG_INFINITY;
                for jj in 0..num_labels {
                    if jj != kk {
                        best_other = best_other.max(stat_gk[(gg, jj)]);
                    }
                }
                (gg, own - best_other)
            })
            .collect();

        margins.sort_by(|aa, bb| bb.1.partial_cmp(&aa.1).unwrap_or(Ordering::Equal));

        keep.extend(
            margins
                .iter()
                .take(num_markers)
                .filter(|&&(_, margin)| margin > 0.0)
                .map(|&(gg, _)| gg),
        );
    }

    let mut panel: Vec<usize> = keep.into_iter().collect();
    panel.sort_unstable();

    // a degenerate reference can leave no positive margins
    if panel.is_empty() {
        return (0..num_genes).collect();
    }
    panel
}
