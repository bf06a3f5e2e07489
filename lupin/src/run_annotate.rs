use crate::annot_common::*;
use crate::input::*;
use crate::pruning::*;
use crate::reference::*;
use crate::scoring::*;

use matrix_util::common_io::{mkdir, open_buf_writer, write_lines};
use matrix_util::traits::IoOps;

use clap::Args;
use rayon::ThreadPoolBuilder;
use std::io::Write;

#[derive(Args, Debug)]
pub struct AnnotateArgs {
    #[arg(
        short = 'r',
        long = "ref-data",
        required = true,
        help = "Reference expression matrix",
        long_help = "Labeled reference expression matrix (gene x cell).\n\
		     Either a delimited dense matrix (.tsv/.csv, optionally .gz)\n\
		     with a header of cell names and gene names in the first\n\
		     column, or a MatrixMarket file (.mtx/.mtx.gz) with\n\
		     `--ref-rows` and `--ref-cols` name files."
    )]
    ref_data_file: Box<str>,

    #[arg(long = "ref-rows", help = "Gene name file for an .mtx reference")]
    ref_row_file: Option<Box<str>>,

    #[arg(long = "ref-cols", help = "Cell name file for an .mtx reference")]
    ref_col_file: Option<Box<str>>,

    #[arg(
        short = 'l',
        long = "ref-labels",
        required = true,
        help = "Cell type labels of the reference cells",
        long_help = "Cell type labels of the reference cells.\n\
		     Each line holds either a bare label (aligned to the\n\
		     reference columns) or a `cell<TAB>label` pair."
    )]
    ref_label_file: Box<str>,

    #[arg(
        short = 'q',
        long = "query-data",
        required = true,
        help = "Query expression matrix to annotate (same formats as the reference)"
    )]
    query_data_file: Box<str>,

    #[arg(long = "query-rows", help = "Gene name file for an .mtx query")]
    query_row_file: Option<Box<str>>,

    #[arg(long = "query-cols", help = "Cell name file for an .mtx query")]
    query_col_file: Option<Box<str>>,

    #[arg(
        long = "hierarchy",
        help = "Optional `fine<TAB>coarse` label map for two-pass annotation",
        long_help = "Optional `fine<TAB>coarse` label map.\n\
		     When given, coarse profiles are scored first and each\n\
		     cell's fine label is restricted to its winning coarse\n\
		     group."
    )]
    hierarchy_file: Option<Box<str>>,

    #[arg(
        short = 'm',
        long,
        default_value_t = DEFAULT_NUM_MARKERS,
        help = "Marker genes kept per label (0 = all genes)"
    )]
    num_markers: usize,

    #[arg(long, default_value_t = 1, help = "Minimum reference cells per label")]
    min_cells_per_label: usize,

    #[arg(
        long,
        value_enum,
        default_value = "median",
        help = "Per-label aggregate statistic"
    )]
    profile_stat: ProfileStat,

    #[arg(
        long,
        default_value_t = DEFAULT_NMADS,
        help = "MADs below the per-label median delta that flag a cell as pruned"
    )]
    nmads: f32,

    #[arg(
        long,
        default_value_t = DEFAULT_MIN_DELTA,
        help = "Absolute floor on the delta regardless of the distribution"
    )]
    min_delta: f32,

    #[arg(
        long,
        short,
        required = true,
        help = "Output header",
        long_help = "Output header for:\n\
		     `{out}.scores.parquet` (cell x label score checkpoint)\n\
		     `{out}.assignment.tsv.gz` (per-cell labels and deltas)\n\
		     `{out}.delta_stats.json` (per-label delta distributions)"
    )]
    out: Box<str>,

    #[arg(long, default_value_t = 0, help = "Maximum number of threads (0 = all)")]
    max_threads: usize,

    #[arg(
        long,
        short,
        help = "Verbosity",
        long_help = "Enable verbose output.\n\
		     Prints additional information during execution."
    )]
    verbose: bool,
}

pub fn run_annotate(args: &AnnotateArgs) -> anyhow::Result<()> {
    if args.verbose {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let max_threads = if args.max_threads == 0 {
        num_cpus::get()
    } else {
        num_cpus::get().min(args.max_threads)
    };

    ThreadPoolBuilder::new()
        .num_threads(max_threads)
        .build_global()?;

    info!("will use {} threads", rayon::current_num_threads());

    mkdir(&args.out)?;

    //////////////////////////////////////////
    // 1. read the labeled reference data   //
    //////////////////////////////////////////

    let ref_data = read_expression(
        &args.ref_data_file,
        args.ref_row_file.as_deref(),
        args.ref_col_file.as_deref(),
    )?;
    let ref_labels = read_labels(&args.ref_label_file, &ref_data.cols)?;

    //////////////////////////////////////////
    // 2. read the query data               //
    //////////////////////////////////////////

    let query = read_expression(
        &args.query_data_file,
        args.query_row_file.as_deref(),
        args.query_col_file.as_deref(),
    )?;

    //////////////////////////////////////////
    // 3. build profiles and score cells    //
    //////////////////////////////////////////

    let opts = ReferenceOptions {
        num_markers: args.num_markers,
        min_cells_per_label: args.min_cells_per_label,
        profile_stat: args.profile_stat,
        target_library_size: TARGET_LIBRARY_SIZE,
    };

    let scorer = SpearmanScorer::default();

    let (scores, assignment) = match args.hierarchy_file.as_deref() {
        Some(hierarchy_file) => {
            let fine_to_coarse = read_hierarchy(hierarchy_file)?;
            let fine_reference = build_reference(&ref_data, &ref_labels, &opts)?;
            let coarse_labels = to_coarse_labels(&ref_labels, &fine_to_coarse)?;
            let coarse_reference = build_reference(&ref_data, &coarse_labels, &opts)?;

            let hier = score_hierarchical(
                &scorer,
                &fine_reference,
                &coarse_reference,
                &fine_to_coarse,
                &query,
            )?;
            (hier.fine, hier.assignment)
        }
        None => {
            let reference = build_reference(&ref_data, &ref_labels, &opts)?;
            let scores = scorer.score_cells(&reference, &query)?;
            let assignment = assign_labels(&scores);
            (scores, assignment)
        }
    };

    //////////////////////////////////////////
    // 4. prune low-confidence assignments  //
    //////////////////////////////////////////

    let prune_opts = PruningOptions {
        nmads: args.nmads,
        min_delta: args.min_delta,
    };
    let (decisions, summaries) = prune_assignments(&scores, &assignment, &prune_opts);

    //////////////////////////////////////////
    // 5. write the checkpoint and reports  //
    //////////////////////////////////////////

    let score_file = format!("{}.scores.parquet", args.out);
    scores
        .scores_nl
        .to_parquet(&score_file, Some(&scores.cells), Some(&scores.labels))?;
    info!("wrote {}", score_file);

    write_assignment(
        &format!("{}.assignment.tsv.gz", args.out),
        &scores,
        &assignment,
        &decisions,
    )?;

    write_delta_stats(&format!("{}.delta_stats.json", args.out), &summaries)?;

    Ok(())
}

/// Write the per-cell assignment table: the raw label, the released
/// label (`NA` when pruned), the top score, and the delta.
pub fn write_assignment(
    file: &str,
    scores: &ScoreMatrix,
    assignment: &[usize],
    decisions: &[PruningDecision],
) -> anyhow::Result<()> {
    let mut lines: Vec<Box<str>> = Vec::with_capacity(scores.num_cells() + 1);
    lines.push("cell\tlabel\tpruned.label\tscore\tdelta\tpruned".into());

    for (ii, cell) in scores.cells.iter().enumerate() {
        let kk = assignment[ii];
        let decision = &decisions[ii];
        let released = if decision.pruned {
            "NA"
        } else {
            scores.labels[kk].as_ref()
        };
        lines.push(
            format!(
                "{}\t{}\t{}\t{}\t{}\t{}",
                cell,
                scores.labels[kk],
                released,
                scores.scores_nl[(ii, kk)],
                decision.delta,
                decision.pruned
            )
            .into_boxed_str(),
        );
    }

    write_lines(&lines, file)?;
    info!("wrote {}", file);
    Ok(())
}

/// Write the per-label delta distributions for QC plotting
pub fn write_delta_stats(file: &str, summaries: &[LabelDeltaSummary]) -> anyhow::Result<()> {
    let mut buf = open_buf_writer(file)?;
    serde_json::to_writer_pretty(&mut buf, summaries)?;
    buf.flush()?;
    info!("wrote {}", file);
    Ok(())
}
