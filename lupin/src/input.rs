use crate::annot_common::*;
use crate::error::AnnotError;

use matrix_util::common_io::{read_lines, read_lines_of_words_delim};
use matrix_util::mtx_io::read_mtx_triplets;
use matrix_util::traits::{IoOps, MatTriplets, MatWithNames};

use fnv::FnvHashMap as HashMap;

fn is_mtx(file: &str) -> bool {
    file.ends_with(".mtx") || file.ends_with(".mtx.gz")
}

/// Read a `gene x cell` expression matrix with names.
///
/// * delimited dense matrices (`.tsv`, `.csv`, optionally gzipped)
///   carry a header line of cell names and gene names in the first
///   column;
/// * MatrixMarket files (`.mtx`, `.mtx.gz`) need the `row_file` and
///   `col_file` side files with one name per line.
pub fn read_expression(
    data_file: &str,
    row_file: Option<&str>,
    col_file: Option<&str>,
) -> anyhow::Result<MatWithNames<Mat>> {
    if is_mtx(data_file) {
        let (row_file, col_file) = match (row_file, col_file) {
            (Some(rr), Some(cc)) => (rr, cc),
            _ => {
                return Err(AnnotError::InvalidInput(format!(
                    "mtx input '{}' needs row and column name files",
                    data_file
                ))
                .into());
            }
        };

        let (triplets, (nrow, ncol, _nnz)) = read_mtx_triplets(data_file)?;
        let rows = read_lines(row_file)?;
        let cols = read_lines(col_file)?;

        if rows.len() != nrow || cols.len() != ncol {
            return Err(AnnotError::InvalidInput(format!(
                "{} row names and {} column names for a {} x {} mtx matrix",
                rows.len(),
                cols.len(),
                nrow,
                ncol
            ))
            .into());
        }

        let mat = Mat::from_nonzero_triplets(nrow, ncol, triplets)?;
        info!("read {} x {} matrix from {}", nrow, ncol, data_file);
        return Ok(MatWithNames { rows, cols, mat });
    }

    // dense matrices carry their own names; extra name files would be
    // silently dropped, so reject them
    if row_file.is_some() || col_file.is_some() {
        return Err(AnnotError::InvalidInput(format!(
            "row/column name files only apply to .mtx input, not '{}'",
            data_file
        ))
        .into());
    }

    let data = Mat::read_data(data_file, &['\t', ','])?;
    info!(
        "read {} x {} matrix from {}",
        data.mat.nrows(),
        data.mat.ncols(),
        data_file
    );
    Ok(data)
}

/// Read the label of each reference cell. Each line holds either a
/// bare label (positional, aligned to the reference columns) or a
/// `cell<TAB>label` pair matched by cell name. Fields split on tabs
/// only, so labels may contain spaces.
pub fn read_labels(label_file: &str, cells: &[Box<str>]) -> anyhow::Result<Vec<Box<str>>> {
    let words = read_lines_of_words_delim(label_file, "\t", -1)?;

    if words.lines.is_empty() {
        return Err(AnnotError::InvalidInput(format!("empty label file '{}'", label_file)).into());
    }

    let width = words.lines[0].len();
    if words.lines.iter().any(|ww| ww.len() != width) {
        return Err(AnnotError::InvalidInput(format!(
            "ragged lines in label file '{}'",
            label_file
        ))
        .into());
    }

    match width {
        1 => {
            if words.lines.len() != cells.len() {
                return Err(AnnotError::InvalidInput(format!(
                    "{} labels for {} cells in '{}'",
                    words.lines.len(),
                    cells.len(),
                    label_file
                ))
                .into());
            }
            Ok(words.lines.into_iter().map(|mut ww| ww.remove(0)).collect())
        }
        2 => {
            let map: HashMap<Box<str>, Box<str>> = words
                .lines
                .into_iter()
                .map(|mut ww| {
                    let label = ww.remove(1);
                    let cell = ww.remove(0);
                    (cell, label)
                })
                .collect();

            let mut labels = Vec::with_capacity(cells.len());
            let mut missing = vec![];
            for cell in cells {
                match map.get(cell) {
                    Some(label) => labels.push(label.clone()),
                    None => missing.push(cell.clone()),
                }
            }

            if !missing.is_empty() {
                let shown: Vec<&str> = missing.iter().take(5).map(|x| x.as_ref()).collect();
                return Err(AnnotError::InvalidInput(format!(
                    "{} cells without a label in '{}' (e.g., {})",
                    missing.len(),
                    label_file,
                    shown.join(", ")
                ))
                .into());
            }
            Ok(labels)
        }
        _ => Err(AnnotError::InvalidInput(format!(
            "label file '{}' should have one or two fields per line",
            label_file
        ))
        .into()),
    }
}

/// Read a `fine<TAB>coarse` label hierarchy; tab-separated so that
/// either side may contain spaces
pub fn read_hierarchy(file: &str) -> anyhow::Result<HashMap<Box<str>, Box<str>>> {
    let words = read_lines_of_words_delim(file, "\t", -1)?;

    let mut map: HashMap<Box<str>, Box<str>> = HashMap::default();
    for mut ww in words.lines {
        if ww.len() != 2 {
            return Err(AnnotError::InvalidInput(format!(
                "hierarchy file '{}' should have two fields per line",
                file
            ))
            .into());
        }
        let coarse = ww.remove(1);
        let fine = ww.remove(0);
        map.insert(fine, coarse);
    }

    if map.is_empty() {
        return Err(AnnotError::InvalidInput(format!("empty hierarchy file '{}'", file)).into());
    }
    Ok(map)
}

/// Map fine labels to their coarse groups
pub fn to_coarse_labels(
    fine_labels: &[Box<str>],
    fine_to_coarse: &HashMap<Box<str>, Box<str>>,
) -> anyhow::Result<Vec<Box<str>>> {
    fine_labels
        .iter()
        .map(|fine| {
            fine_to_coarse.get(fine).cloned().ok_or_else(|| {
                anyhow::Error::from(AnnotError::InvalidInput(format!(
                    "no coarse label for '{}'",
                    fine
                )))
            })
        })
        .collect()
}
