#![allow(dead_code)]

use crate::common_io::*;
use std::io::Write;

/// Write the triplets into a MatrixMarket file with 1-based indices
/// * `triplets` - 0-based `(row, column, value)` triplets
/// * `nrow` - number of rows
/// * `ncol` - number of columns
/// * `mtx_file` - the output file (e.g., "matrix.mtx.gz")
pub fn write_mtx_triplets(
    triplets: &[(u64, u64, f32)],
    nrow: usize,
    ncol: usize,
    mtx_file: &str,
) -> anyhow::Result<()> {
    mkdir(mtx_file)?;

    let mut buf = open_buf_writer(mtx_file)?;

    writeln!(buf, "%%MatrixMarket matrix coordinate real general")?;
    writeln!(buf, "{}\t{}\t{}", nrow, ncol, triplets.len())?;

    for (row, col, val) in triplets {
        writeln!(buf, "{}\t{}\t{}", row + 1, col + 1, val)?;
    }

    buf.flush()?;
    Ok(())
}

/// Read a MatrixMarket file into 0-based `(row, column, value)`
/// triplets along with the `(nrow, ncol, nnz)` header
/// * `mtx_file` - either gzipped or not
pub fn read_mtx_triplets(
    mtx_file: &str,
) -> anyhow::Result<(Vec<(u64, u64, f32)>, (usize, usize, usize))> {
    // `%` comment lines are stripped; the first remaining line is
    // the shape header
    let words = read_lines_of_words(mtx_file, -1)?;

    if words.lines.is_empty() {
        return Err(anyhow::anyhow!("empty mtx file: {}", mtx_file));
    }

    let parse_usize = |w: &str| -> anyhow::Result<usize> {
        w.parse::<usize>()
            .map_err(|_| anyhow::anyhow!("invalid mtx header word '{}' in {}", w, mtx_file))
    };

    let hdr = &words.lines[0];
    if hdr.len() != 3 {
        return Err(anyhow::anyhow!("malformed mtx header in {}", mtx_file));
    }
    let shape = (
        parse_usize(&hdr[0])?,
        parse_usize(&hdr[1])?,
        parse_usize(&hdr[2])?,
    );

    let mut triplets = Vec::with_capacity(shape.2);
    for line in &words.lines[1..] {
        if line.len() != 3 {
            return Err(anyhow::anyhow!("malformed mtx triplet in {}", mtx_file));
        }
        let row = parse_usize(&line[0])?;
        let col = parse_usize(&line[1])?;
        let val = line[2]
            .parse::<f32>()
            .map_err(|_| anyhow::anyhow!("invalid mtx value '{}' in {}", line[2], mtx_file))?;

        if row < 1 || col < 1 || row > shape.0 || col > shape.1 {
            return Err(anyhow::anyhow!(
                "mtx index ({}, {}) out of bounds for {} x {}",
                row,
                col,
                shape.0,
                shape.1
            ));
        }
        triplets.push(((row - 1) as u64, (col - 1) as u64, val));
    }

    if triplets.len() != shape.2 {
        return Err(anyhow::anyhow!(
            "expected {} triplets but found {} in {}",
            shape.2,
            triplets.len(),
            mtx_file
        ));
    }

    Ok((triplets, shape))
}
