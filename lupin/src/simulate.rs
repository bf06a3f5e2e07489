use crate::annot_common::*;
use crate::error::AnnotError;

use matrix_util::common_io::write_lines;
use matrix_util::mtx_io::write_mtx_triplets;
use matrix_util::traits::MatWithNames;

use clap::Args;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Poisson};

#[derive(Clone, Debug)]
pub struct SimArgs {
    pub num_genes: usize,
    pub num_types: usize,
    pub ref_cells_per_type: usize,
    pub query_cells: usize,
    pub markers_per_type: usize,
    pub depth: usize,
    pub marker_fold: f32,
    pub rseed: u64,
}

impl Default for SimArgs {
    fn default() -> Self {
        Self {
            num_genes: 200,
            num_types: 5,
            ref_cells_per_type: 50,
            query_cells: 200,
            markers_per_type: 10,
            depth: 2000,
            marker_fold: 5.0,
            rseed: 42,
        }
    }
}

pub struct SimOut {
    pub ref_data: MatWithNames<Mat>,
    pub ref_labels: Vec<Box<str>>,
    pub query_data: MatWithNames<Mat>,
    pub query_labels: Vec<Box<str>>,
}

/// Generate a labeled reference and query pair with disjoint marker
/// gene blocks per cell type.
///
/// ```text
/// Y(g,j) ~ Poisson( depth * rate(g, type(j)) / sum_g rate(g, type(j)) )
/// ```
///
/// where `rate(g,k)` is a shared baseline boosted by `marker_fold`
/// on the `k`-th marker block.
pub fn generate_labeled_pair(args: &SimArgs) -> anyhow::Result<SimOut> {
    if args.markers_per_type * args.num_types > args.num_genes {
        return Err(AnnotError::InvalidInput(format!(
            "{} marker genes x {} types exceed {} genes",
            args.markers_per_type, args.num_types, args.num_genes
        ))
        .into());
    }
    if args.num_types < 2 {
        return Err(AnnotError::InvalidInput("need at least two types".to_string()).into());
    }

    let mut rng = StdRng::seed_from_u64(args.rseed);

    let baseline: Vec<f32> = (0..args.num_genes)
        .map(|_| 0.1 + 0.9 * rng.random::<f32>())
        .collect();

    // type k boosts the marker block [k * m, (k+1) * m)
    let rate_of = |gg: usize, kk: usize| -> f32 {
        let lb = kk * args.markers_per_type;
        let ub = lb + args.markers_per_type;
        if gg >= lb && gg < ub {
            baseline[gg] * args.marker_fold
        } else {
            baseline[gg]
        }
    };

    let rate_totals: Vec<f32> = (0..args.num_types)
        .map(|kk| (0..args.num_genes).map(|gg| rate_of(gg, kk)).sum())
        .collect();

    let sample_cell = |rng: &mut StdRng, kk: usize| -> anyhow::Result<Vec<f32>> {
        let mut cell = Vec::with_capacity(args.num_genes);
        for gg in 0..args.num_genes {
            let lambda = args.depth as f32 * rate_of(gg, kk) / rate_totals[kk];
            let count = if lambda > 0.0 {
                Poisson::new(lambda)?.sample(rng)
            } else {
                0.0
            };
            cell.push(count);
        }
        Ok(cell)
    };

    let gene_names: Vec<Box<str>> = (0..args.num_genes)
        .map(|gg| format!("gene_{}", gg + 1).into_boxed_str())
        .collect();

    let type_names: Vec<Box<str>> = (0..args.num_types)
        .map(|kk| format!("type_{}", kk + 1).into_boxed_str())
        .collect();

    // reference: a fixed number of cells per type
    let num_ref = args.num_types * args.ref_cells_per_type;
    let mut ref_mat = Mat::zeros(args.num_genes, num_ref);
    let mut ref_labels = Vec::with_capacity(num_ref);

    for jj in 0..num_ref {
        let kk = jj / args.ref_cells_per_type;
        let cell = sample_cell(&mut rng, kk)?;
        ref_mat.column_mut(jj).copy_from_slice(&cell);
        ref_labels.push(type_names[kk].clone());
    }

    let ref_cols: Vec<Box<str>> = (0..num_ref)
        .map(|jj| format!("ref_{}", jj + 1).into_boxed_str())
        .collect();

    // query: types drawn at random
    let mut query_mat = Mat::zeros(args.num_genes, args.query_cells);
    let mut query_labels = Vec::with_capacity(args.query_cells);

    for jj in 0..args.query_cells {
        let kk = rng.random_range(0..args.num_types);
        let cell = sample_cell(&mut rng, kk)?;
        query_mat.column_mut(jj).copy_from_slice(&cell);
        query_labels.push(type_names[kk].clone());
    }

    let query_cols: Vec<Box<str>> = (0..args.query_cells)
        .map(|jj| format!("query_{}", jj + 1).into_boxed_str())
        .collect();

    info!(
        "simulated {} reference and {} query cells over {} genes",
        num_ref, args.query_cells, args.num_genes
    );

    Ok(SimOut {
        ref_data: MatWithNames {
            rows: gene_names.clone(),
            cols: ref_cols,
            mat: ref_mat,
        },
        ref_labels,
        query_data: MatWithNames {
            rows: gene_names,
            cols: query_cols,
            mat: query_mat,
        },
        query_labels,
    })
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    #[arg(long, default_value_t = 200, help = "Number of genes")]
    num_genes: usize,

    #[arg(long, default_value_t = 5, help = "Number of cell types")]
    num_types: usize,

    #[arg(long, default_value_t = 50, help = "Reference cells per type")]
    ref_cells_per_type: usize,

    #[arg(long, default_value_t = 200, help = "Number of query cells")]
    query_cells: usize,

    #[arg(long, default_value_t = 10, help = "Marker genes per type")]
    markers_per_type: usize,

    #[arg(long, default_value_t = 2000, help = "Expected total counts per cell")]
    depth: usize,

    #[arg(long, default_value_t = 5.0, help = "Fold change on marker genes")]
    marker_fold: f32,

    #[arg(long, default_value_t = 42, help = "Random seed")]
    rseed: u64,

    #[arg(long, short, required = true, help = "Output header")]
    out: Box<str>,

    #[arg(long, short, help = "Verbosity")]
    verbose: bool,
}

/// Write a simulated reference/query pair:
/// `{out}.ref.mtx.gz` + name files, `{out}.ref_labels.tsv.gz`,
/// `{out}.query.mtx.gz` + name files, `{out}.query_truth.tsv.gz`
pub fn run_simulate(args: &SimulateArgs) -> anyhow::Result<()> {
    if args.verbose {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    matrix_util::common_io::mkdir(&args.out)?;

    let sim = generate_labeled_pair(&SimArgs {
        num_genes: args.num_genes,
        num_types: args.num_types,
        ref_cells_per_type: args.ref_cells_per_type,
        query_cells: args.query_cells,
        markers_per_type: args.markers_per_type,
        depth: args.depth,
        marker_fold: args.marker_fold,
        rseed: args.rseed,
    })?;

    write_expression_mtx(&format!("{}.ref", args.out), &sim.ref_data)?;
    write_expression_mtx(&format!("{}.query", args.out), &sim.query_data)?;

    let ref_label_lines: Vec<Box<str>> = sim
        .ref_data
        .cols
        .iter()
        .zip(sim.ref_labels.iter())
        .map(|(cell, label)| format!("{}\t{}", cell, label).into_boxed_str())
        .collect();
    write_lines(&ref_label_lines, &format!("{}.ref_labels.tsv.gz", args.out))?;

    let truth_lines: Vec<Box<str>> = sim
        .query_data
        .cols
        .iter()
        .zip(sim.query_labels.iter())
        .map(|(cell, label)| format!("{}\t{}", cell, label).into_boxed_str())
        .collect();
    write_lines(&truth_lines, &format!("{}.query_truth.tsv.gz", args.out))?;

    info!("wrote simulated data with header {}", args.out);
    Ok(())
}

/// Write a dense matrix as MatrixMarket triplets with name side files
pub fn write_expression_mtx(header: &str, data: &MatWithNames<Mat>) -> anyhow::Result<()> {
    let mut triplets: Vec<(u64, u64, f32)> = vec![];
    for jj in 0..data.mat.ncols() {
        for gg in 0..data.mat.nrows() {
            let x = data.mat[(gg, jj)];
            if x != 0.0 {
                triplets.push((gg as u64, jj as u64, x));
            }
        }
    }

    write_mtx_triplets(
        &triplets,
        data.mat.nrows(),
        data.mat.ncols(),
        &format!("{}.mtx.gz", header),
    )?;
    write_lines(&data.rows, &format!("{}.rows.gz", header))?;
    write_lines(&data.cols, &format!("{}.cols.gz", header))?;
    Ok(())
}
