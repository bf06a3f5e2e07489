#![allow(dead_code)]

pub use log::info;

pub type Mat = nalgebra::DMatrix<f32>;

pub const DEFAULT_NUM_MARKERS: usize = 50;
pub const DEFAULT_NMADS: f32 = 3.0;
pub const DEFAULT_MIN_DELTA: f32 = 0.0;

/// Target column sum for library-size normalization
pub const TARGET_LIBRARY_SIZE: f32 = 1e4;

/// Library-size normalize each column to `target` total counts and
/// take `log1p`; an all-zero column stays zero
pub fn log1p_normalize_columns_inplace(xx: &mut Mat, target: f32) {
    for mut x_j in xx.column_iter_mut() {
        let total: f32 = x_j.sum();
        let scale = if total > 0.0 { target / total } else { 0.0 };
        x_j.apply(|x| *x = (*x * scale).ln_1p());
    }
}
