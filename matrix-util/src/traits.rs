use crate::common_io::Delimiter;

/// A matrix accompanied by its row and column names
#[derive(Clone, Debug)]
pub struct MatWithNames<M> {
    pub rows: Vec<Box<str>>,
    pub cols: Vec<Box<str>>,
    pub mat: M,
}

/// Normalize or scale columns
pub trait MatOps {
    type Mat;
    type Scalar;

    fn normalize_columns_inplace(&mut self);
    fn normalize_columns(&self) -> Self::Mat;
    fn scale_columns_inplace(&mut self);
    fn scale_columns(&self) -> Self::Mat;
    fn centre_columns_inplace(&mut self);
    fn centre_columns(&self) -> Self::Mat;
}

/// Operations to sample random matrices
pub trait SampleOps {
    type Mat;
    type Scalar;

    /// Sample a `dd x nn` matrix from a uniform distribution `U(0,1)`
    fn runif(dd: usize, nn: usize) -> Self::Mat;

    /// Sample a `dd x nn` matrix from a normal distribution `N(0,1)`
    fn rnorm(dd: usize, nn: usize) -> Self::Mat;
}

/// Build a matrix from a vector of `(row, column, value)` triplets
pub trait MatTriplets {
    type Mat;
    type Scalar;

    fn from_nonzero_triplets<I>(
        nrow: usize,
        ncol: usize,
        triplets: Vec<(I, I, Self::Scalar)>,
    ) -> anyhow::Result<Self::Mat>
    where
        I: TryInto<usize> + Copy,
        <I as TryInto<usize>>::Error: std::fmt::Debug;
}

/// Read and write matrices from and to files
pub trait IoOps: Sized {
    type Scalar;

    /// Read a bare matrix without row or column names
    fn read_file_delim(
        file: &str,
        delim: impl Into<Delimiter>,
        skip: Option<usize>,
    ) -> anyhow::Result<Self>;

    fn from_tsv(tsv_file: &str, skip: Option<usize>) -> anyhow::Result<Self> {
        Self::read_file_delim(tsv_file, "\t", skip)
    }

    /// Read a matrix whose first line holds column names and whose
    /// first column holds row names
    fn read_data(file: &str, delim: impl Into<Delimiter>) -> anyhow::Result<MatWithNames<Self>>;

    fn write_file_delim(&self, file: &str, delim: &str) -> anyhow::Result<()>;

    fn to_tsv(&self, tsv_file: &str) -> anyhow::Result<()> {
        self.write_file_delim(tsv_file, "\t")
    }

    /// Write a matrix with a header line of column names and row
    /// names in the first column
    fn write_data(
        &self,
        file: &str,
        delim: &str,
        rows: &[Box<str>],
        cols: &[Box<str>],
    ) -> anyhow::Result<()>;

    /// Write to a parquet file; `None` names are replaced with `[0, n)`
    fn to_parquet(
        &self,
        file: &str,
        rows: Option<&[Box<str>]>,
        cols: Option<&[Box<str>]>,
    ) -> anyhow::Result<()>;

    /// Read back a matrix written by `to_parquet` (column `0` holds
    /// the row names)
    fn from_parquet(file: &str) -> anyhow::Result<MatWithNames<Self>>;
}
