#![allow(dead_code)]

use std::cmp::Ordering;

fn sort_f32(values: &mut [f32]) {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
}

/// Median of the values; `NaN` for an empty slice
pub fn median(values: &[f32]) -> f32 {
    if values.is_empty() {
        return f32::NAN;
    }
    let mut sorted = values.to_vec();
    sort_f32(&mut sorted);
    let nn = sorted.len();
    if nn % 2 == 1 {
        sorted[nn / 2]
    } else {
        0.5 * (sorted[nn / 2 - 1] + sorted[nn / 2])
    }
}

/// Median absolute deviation around the `centre`
pub fn mad(values: &[f32], centre: f32) -> f32 {
    let dev: Vec<f32> = values.iter().map(|&x| (x - centre).abs()).collect();
    median(&dev)
}

/// Rank transform with average ranks on ties; the smallest value
/// gets rank `1`
///
/// ```
/// use matrix_util::dmatrix_stat::average_ranks;
/// let rr = average_ranks(&[3.0, 1.0, 1.0, 2.0]);
/// assert_eq!(rr, vec![4.0, 1.5, 1.5, 3.0]);
/// ```
pub fn average_ranks(values: &[f32]) -> Vec<f32> {
    let nn = values.len();
    let mut order: Vec<usize> = (0..nn).collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0.0_f32; nn];
    let mut i = 0;
    while i < nn {
        let mut j = i;
        while j + 1 < nn && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        // 1-based average rank for the tie block [i, j]
        let avg = (i + j) as f32 * 0.5 + 1.0;
        for &o in &order[i..=j] {
            ranks[o] = avg;
        }
        i = j + 1;
    }
    ranks
}

/// Pearson correlation; `0` when either side has no variance
pub fn pearson(xx: &[f32], yy: &[f32]) -> f32 {
    debug_assert_eq!(xx.len(), yy.len());
    let nn = xx.len();
    if nn < 2 {
        return 0.0;
    }

    let nn = nn as f32;
    let mu_x = xx.iter().sum::<f32>() / nn;
    let mu_y = yy.iter().sum::<f32>() / nn;

    let mut sxy = 0.0_f32;
    let mut sxx = 0.0_f32;
    let mut syy = 0.0_f32;
    for (&x, &y) in xx.iter().zip(yy.iter()) {
        let dx = x - mu_x;
        let dy = y - mu_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx <= 0.0 || syy <= 0.0 {
        return 0.0;
    }
    sxy / (sxx.sqrt() * syy.sqrt())
}

/// Spearman rank correlation with average ranks on ties
pub fn spearman(xx: &[f32], yy: &[f32]) -> f32 {
    pearson(&average_ranks(xx), &average_ranks(yy))
}
