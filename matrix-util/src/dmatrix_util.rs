#![allow(dead_code)]

use crate::traits::*;

pub use nalgebra::DMatrix;
pub use nalgebra_sparse::{coo::CooMatrix, csc::CscMatrix};

use rand::Rng;
use rand_distr::StandardNormal;
use rayon::prelude::*;

impl SampleOps for DMatrix<f32> {
    type Mat = Self;
    type Scalar = f32;

    fn runif(dd: usize, nn: usize) -> Self::Mat {
        let rvec = (0..(dd * nn))
            .into_par_iter()
            .map_init(rand::rng, |rng, _| rng.random::<f32>())
            .collect();

        DMatrix::<f32>::from_vec(dd, nn, rvec)
    }

    fn rnorm(dd: usize, nn: usize) -> Self::Mat {
        let rvec = (0..(dd * nn))
            .into_par_iter()
            .map_init(rand::rng, |rng, _| rng.sample(StandardNormal))
            .collect();

        DMatrix::<f32>::from_vec(dd, nn, rvec)
    }
}

impl MatOps for DMatrix<f32> {
    type Mat = Self;
    type Scalar = f32;

    /// `X[,j] <- X[,j] / max(1, norm(X[,j]))`
    fn normalize_columns_inplace(&mut self) {
        for mut x_j in self.column_iter_mut() {
            let denom = x_j.norm().max(1.0);
            x_j /= denom;
        }
    }

    fn normalize_columns(&self) -> Self::Mat {
        let mut ret = self.clone();
        ret.normalize_columns_inplace();
        ret
    }

    /// Standardize each column; a constant column is only centred
    fn scale_columns_inplace(&mut self) {
        let nn = self.nrows().max(1) as f32;
        for mut x_j in self.column_iter_mut() {
            let mu = x_j.mean();
            let sig = (x_j.iter().map(|&x| (x - mu) * (x - mu)).sum::<f32>() / nn).sqrt();
            if sig > 0.0 {
                x_j.apply(|x| *x = (*x - mu) / sig);
            } else {
                x_j.add_scalar_mut(-mu);
            }
        }
    }

    fn scale_columns(&self) -> Self::Mat {
        let mut ret = self.clone();
        ret.scale_columns_inplace();
        ret
    }

    fn centre_columns_inplace(&mut self) {
        for mut x_j in self.column_iter_mut() {
            let mu = x_j.mean();
            x_j.add_scalar_mut(-mu);
        }
    }

    fn centre_columns(&self) -> Self::Mat {
        let mut ret = self.clone();
        ret.centre_columns_inplace();
        ret
    }
}

impl MatTriplets for DMatrix<f32> {
    type Mat = Self;
    type Scalar = f32;

    fn from_nonzero_triplets<I>(
        nrow: usize,
        ncol: usize,
        triplets: Vec<(I, I, Self::Scalar)>,
    ) -> anyhow::Result<Self::Mat>
    where
        I: TryInto<usize> + Copy,
        <I as TryInto<usize>>::Error: std::fmt::Debug,
    {
        let csc = CscMatrix::<f32>::from_nonzero_triplets(nrow, ncol, triplets)?;
        Ok(nalgebra_sparse::convert::serial::convert_csc_dense(&csc))
    }
}

impl MatTriplets for CscMatrix<f32> {
    type Mat = Self;
    type Scalar = f32;

    fn from_nonzero_triplets<I>(
        nrow: usize,
        ncol: usize,
        triplets: Vec<(I, I, Self::Scalar)>,
    ) -> anyhow::Result<Self::Mat>
    where
        I: TryInto<usize> + Copy,
        <I as TryInto<usize>>::Error: std::fmt::Debug,
    {
        let mut coo = CooMatrix::<f32>::new(nrow, ncol);
        for (ii, jj, x_ij) in triplets {
            let ii: usize = ii
                .try_into()
                .map_err(|e| anyhow::anyhow!("bad row index: {:?}", e))?;
            let jj: usize = jj
                .try_into()
                .map_err(|e| anyhow::anyhow!("bad column index: {:?}", e))?;
            if ii >= nrow || jj >= ncol {
                return Err(anyhow::anyhow!(
                    "triplet ({}, {}) out of bounds for {} x {}",
                    ii,
                    jj,
                    nrow,
                    ncol
                ));
            }
            coo.push(ii, jj, x_ij);
        }
        Ok(CscMatrix::from(&coo))
    }
}

/// Take a subset of rows and keep all the columns
pub fn subset_rows(xx: &DMatrix<f32>, rows: &[usize]) -> DMatrix<f32> {
    DMatrix::from_fn(rows.len(), xx.ncols(), |i, j| xx[(rows[i], j)])
}
