use lupin::run_annotate::*;
use lupin::run_prune::*;
use lupin::simulate::*;

use clap::{Parser, Subcommand};
use log::info;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "LUPIN",
    long_about = "Label transfer by Unsupervised Profile matching and\n\
		  Instance-level Non-conformity pruning.\n\
		  Annotate query cells against a labeled reference by rank\n\
		  correlation and flag low-confidence calls."
)]
struct Cli {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Annotate query cells against a labeled reference",
        long_about = "Annotate query cells in the three stages: \n\
		      (1) Build per-label reference profiles over a marker panel\n\
		      (2) Score each cell against each label by rank correlation\n\
		      (3) Prune low-confidence assignments by the delta margin.\n"
    )]
    Annotate(AnnotateArgs),

    #[command(
        about = "Re-run the pruning stage from a score checkpoint",
        long_about = "Re-run the pruning stage from a score checkpoint\n\
		      (`{out}.scores.parquet` written by `annotate`) without\n\
		      re-scoring, e.g., to try a different `--nmads`.\n"
    )]
    Prune(PruneArgs),

    /// generate a synthetic labeled reference and query pair
    Simulate(SimulateArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.commands {
        Commands::Annotate(args) => {
            run_annotate(args)?;
        }
        Commands::Prune(args) => {
            run_prune(args)?;
        }
        Commands::Simulate(args) => {
            run_simulate(args)?;
        }
    }

    info!("Done");
    Ok(())
}
