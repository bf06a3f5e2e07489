use thiserror::Error;

/// Fail-fast errors raised by the annotation stages; everything else
/// propagates through `anyhow`.
#[derive(Debug, Error)]
pub enum AnnotError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("insufficient gene overlap: {found} of {needed} reference panel genes found in the query")]
    InsufficientOverlap { needed: usize, found: usize },

    #[error("label '{label}' has {n_cells} reference cells, fewer than the required {min_cells}")]
    EmptyLabel {
        label: Box<str>,
        n_cells: usize,
        min_cells: usize,
    },
}
