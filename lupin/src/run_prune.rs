use crate::annot_common::*;
use crate::pruning::*;
use crate::run_annotate::{write_assignment, write_delta_stats};
use crate::scoring::*;

use matrix_util::common_io::mkdir;
use matrix_util::traits::IoOps;

use clap::Args;

#[derive(Args, Debug)]
pub struct PruneArgs {
    #[arg(
        short = 's',
        long = "scores",
        required = true,
        help = "ScoreMatrix checkpoint (`.parquet` or a named .tsv/.csv matrix)",
        long_help = "ScoreMatrix checkpoint written by `annotate`\n\
		     (`{out}.scores.parquet`), or any cell x label matrix\n\
		     with cell row names and label column names.\n\
		     Re-runs the pruning stage without re-scoring."
    )]
    score_file: Box<str>,

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

    #[arg(long, short, required = true, help = "Output header")]
    out: Box<str>,

    #[arg(long, short, help = "Verbosity")]
    verbose: bool,
}

/// Re-run the pruning/QC stage from a score checkpoint
pub fn run_prune(args: &PruneArgs) -> anyhow::Result<()> {
    if args.verbose {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    mkdir(&args.out)?;

    let checkpoint = if args.score_file.ends_with(".parquet") {
        Mat::from_parquet(&args.score_file)?
    } else {
        Mat::read_data(&args.score_file, &['\t', ','])?
    };

    info!(
        "read {} cells x {} labels from {}",
        checkpoint.mat.nrows(),
        checkpoint.mat.ncols(),
        args.score_file
    );

    let scores = ScoreMatrix {
        cells: checkpoint.rows,
        labels: checkpoint.cols,
        scores_nl: checkpoint.mat,
    };

    let assignment = assign_labels(&scores);

    let prune_opts = PruningOptions {
        nmads: args.nmads,
        min_delta: args.min_delta,
    };
    let (decisions, summaries) = prune_assignments(&scores, &assignment, &prune_opts);

    write_assignment(
        &format!("{}.assignment.tsv.gz", args.out),
        &scores,
        &assignment,
        &decisions,
    )?;

    write_delta_stats(&format!("{}.delta_stats.json", args.out), &summaries)?;

    Ok(())
}
