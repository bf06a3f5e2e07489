use crate::common_io::{read_lines_of_types, read_lines_of_words_delim, write_lines, Delimiter};
use crate::parquet::*;
use crate::traits::*;

use nalgebra::DMatrix;
use num_traits::{FromPrimitive, ToPrimitive};
use std::fmt::{Debug, Display};
use std::str::FromStr;

impl<T> IoOps for DMatrix<T>
where
    T: nalgebra::Scalar + FromStr + Display + FromPrimitive + ToPrimitive + Copy + Send + Sync,
    <T as FromStr>::Err: Debug,
{
    type Scalar = T;

    fn read_file_delim(
        file: &str,
        delim: impl Into<Delimiter>,
        skip: Option<usize>,
    ) -> anyhow::Result<Self> {
        let hdr_line = match skip {
            Some(skip) => skip as i64,
            None => -1,
        };

        let data = read_lines_of_types::<T>(file, delim, hdr_line)?.lines;

        if data.is_empty() {
            return Err(anyhow::anyhow!("no data in {}", file));
        }

        let ncols = data[0].len();
        if data.iter().any(|row| row.len() != ncols) {
            return Err(anyhow::anyhow!("ragged rows in {}", file));
        }

        let nrows = data.len();
        let data = data.into_iter().flatten();
        Ok(DMatrix::<T>::from_row_iterator(nrows, ncols, data))
    }

    fn read_data(file: &str, delim: impl Into<Delimiter>) -> anyhow::Result<MatWithNames<Self>> {
        let out = read_lines_of_words_delim(file, delim, 0)?;
        let mut header = out.header;

        if out.lines.is_empty() {
            return Err(anyhow::anyhow!("no data in {}", file));
        }

        let ncols = out.lines[0].len().saturating_sub(1);
        if ncols == 0 {
            return Err(anyhow::anyhow!("no data columns in {}", file));
        }

        let nrows = out.lines.len();
        let mut rows: Vec<Box<str>> = Vec::with_capacity(nrows);
        let mut data: Vec<T> = Vec::with_capacity(nrows * ncols);

        for words in out.lines {
            if words.len() != ncols + 1 {
                return Err(anyhow::anyhow!("ragged rows in {}", file));
            }
            rows.push(words[0].clone());
            for word in &words[1..] {
                let x = word
                    .parse::<T>()
                    .map_err(|e| anyhow::anyhow!("failed to parse '{}': {:?}", word, e))?;
                data.push(x);
            }
        }

        // the header may or may not carry a corner token for the
        // row-name column
        let cols: Vec<Box<str>> = if header.len() == ncols + 1 {
            header.split_off(1)
        } else if header.len() == ncols {
            header
        } else {
            return Err(anyhow::anyhow!(
                "header with {} fields vs. {} data columns in {}",
                header.len(),
                ncols,
                file
            ));
        };

        Ok(MatWithNames {
            rows,
            cols,
            mat: DMatrix::<T>::from_row_iterator(nrows, ncols, data),
        })
    }

    fn write_file_delim(&self, file: &str, delim: &str) -> anyhow::Result<()> {
        let lines: Vec<Box<str>> = self
            .row_iter()
            .map(|row| {
                row.iter()
                    .map(|x| format!("{}", *x))
                    .collect::<Vec<String>>()
                    .join(delim)
                    .into_boxed_str()
            })
            .collect();

        write_lines(&lines, file)?;
        Ok(())
    }

    fn write_data(
        &self,
        file: &str,
        delim: &str,
        rows: &[Box<str>],
        cols: &[Box<str>],
    ) -> anyhow::Result<()> {
        if rows.len() != self.nrows() || cols.len() != self.ncols() {
            return Err(anyhow::anyhow!(
                "names ({} x {}) do not match the matrix ({} x {})",
                rows.len(),
                cols.len(),
                self.nrows(),
                self.ncols()
            ));
        }

        let mut lines: Vec<Box<str>> = Vec::with_capacity(self.nrows() + 1);

        let mut header = vec!["".to_string()];
        header.extend(cols.iter().map(|x| x.to_string()));
        lines.push(header.join(delim).into_boxed_str());

        for (name, row) in rows.iter().zip(self.row_iter()) {
            let mut words = vec![name.to_string()];
            words.extend(row.iter().map(|x| format!("{}", *x)));
            lines.push(words.join(delim).into_boxed_str());
        }

        write_lines(&lines, file)?;
        Ok(())
    }

    fn to_parquet(
        &self,
        file: &str,
        rows: Option<&[Box<str>]>,
        cols: Option<&[Box<str>]>,
    ) -> anyhow::Result<()> {
        let default_rows: Vec<Box<str>>;
        let rows = match rows {
            Some(rows) => rows,
            None => {
                default_rows = (0..self.nrows())
                    .map(|i| i.to_string().into_boxed_str())
                    .collect();
                &default_rows
            }
        };

        let default_cols: Vec<Box<str>>;
        let cols = match cols {
            Some(cols) => cols,
            None => {
                default_cols = (0..self.ncols())
                    .map(|j| j.to_string().into_boxed_str())
                    .collect();
                &default_cols
            }
        };

        if rows.len() != self.nrows() || cols.len() != self.ncols() {
            return Err(anyhow::anyhow!(
                "names ({} x {}) do not match the matrix ({} x {})",
                rows.len(),
                cols.len(),
                self.nrows(),
                self.ncols()
            ));
        }

        let data_columns: Vec<Vec<f32>> = (0..self.ncols())
            .map(|j| {
                self.column(j)
                    .iter()
                    .map(|x| x.to_f32().unwrap_or(f32::NAN))
                    .collect()
            })
            .collect();

        write_parquet_mat(file, &data_columns, rows, cols)
    }

    fn from_parquet(file: &str) -> anyhow::Result<MatWithNames<Self>> {
        let parquet = read_parquet_mat(file)?;

        let data: anyhow::Result<Vec<T>> = parquet
            .row_major_data
            .into_iter()
            .map(|x| {
                T::from_f32(x).ok_or(anyhow::anyhow!("failed to convert {} from parquet", x))
            })
            .collect();

        let nrows = parquet.row_names.len();
        let ncols = parquet.column_names.len();

        Ok(MatWithNames {
            rows: parquet.row_names,
            cols: parquet.column_names,
            mat: DMatrix::<T>::from_row_iterator(nrows, ncols, data?),
        })
    }
}
