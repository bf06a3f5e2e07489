use approx::assert_abs_diff_eq;
use matrix_util::traits::{MatOps, SampleOps};

type Mat = nalgebra::DMatrix<f32>;

#[test]
fn normalize_columns_to_unit_norm() {
    let mut xx = Mat::runif(100, 10);
    xx *= 10.0;
    xx.normalize_columns_inplace();

    for j in 0..xx.ncols() {
        let norm = xx.column(j).norm();
        assert_abs_diff_eq!(norm, 1.0, epsilon = 1e-4);
    }
}

#[test]
fn scale_columns_to_zero_mean_unit_variance() {
    let xx = Mat::rnorm(200, 5).scale_columns();

    let nn = xx.nrows() as f32;
    for j in 0..xx.ncols() {
        let mu = xx.column(j).mean();
        let var = xx.column(j).iter().map(|&x| (x - mu) * (x - mu)).sum::<f32>() / nn;
        assert_abs_diff_eq!(mu, 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(var, 1.0, epsilon = 1e-3);
    }
}

#[test]
fn scale_constant_column_is_centred() {
    let mut xx = Mat::from_element(10, 2, 3.0);
    xx.scale_columns_inplace();
    for x in xx.iter() {
        assert_abs_diff_eq!(*x, 0.0);
    }
}

#[test]
fn centre_columns_to_zero_mean() {
    let xx = Mat::runif(50, 4).centre_columns();
    for j in 0..xx.ncols() {
        assert_abs_diff_eq!(xx.column(j).mean(), 0.0, epsilon = 1e-5);
    }
}
