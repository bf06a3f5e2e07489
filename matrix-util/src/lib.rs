pub mod common_io; // gz-aware delimited text I/O
pub mod dmatrix_io; // dense matrix I/O with row/column names
pub mod dmatrix_stat; // ranks, medians, correlations
pub mod dmatrix_util; // dense matrix operations
pub mod mtx_io; // matrix market triplets
pub mod parquet; // matrix I/O with parquet backend
pub mod traits;
pub mod utils;
