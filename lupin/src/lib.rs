pub mod annot_common;
pub mod error;
pub mod input;
pub mod pruning;
pub mod reference;
pub mod run_annotate;
pub mod run_prune;
pub mod scoring;
pub mod simulate;
