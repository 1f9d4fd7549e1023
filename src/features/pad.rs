use thiserror::Error;

use crate::math::Matrix;

#[derive(Debug, Error, PartialEq)]
pub enum PadError {
    #[error("cannot pad an empty feature collection")]
    Empty,
    #[error("feature {index} has {got} rows, expected {expected}")]
    RowMismatch {
        index: usize,
        expected: usize,
        got: usize,
    },
}

/// Widest column count across `features`.
pub fn max_width(features: &[Matrix]) -> usize {
    features.iter().map(|m| m.cols).max().unwrap_or(0)
}

/// Copy `m` into the left edge of a zero matrix `width` columns wide.
pub fn pad_width(m: &Matrix, width: usize) -> Matrix {
    debug_assert!(width >= m.cols);
    let mut out = Matrix::zeros(m.rows, width);
    for r in 0..m.rows {
        out.row_mut(r)[..m.cols].copy_from_slice(m.row(r));
    }
    out
}

/// Keep the first `width` columns of `m`.
pub fn truncate_width(m: &Matrix, width: usize) -> Matrix {
    let width = width.min(m.cols);
    let mut out = Matrix::zeros(m.rows, width);
    for r in 0..m.rows {
        out.row_mut(r).copy_from_slice(&m.row(r)[..width]);
    }
    out
}

/// Zero-pad every feature on the right to the widest one.
///
/// All features must share their row count (mel bands, or 1 for
/// waveforms). Features already at full width are moved through untouched.
pub fn pad_to_max_width(features: Vec<Matrix>) -> Result<Vec<Matrix>, PadError> {
    let rows = features.first().ok_or(PadError::Empty)?.rows;
    if let Some((index, m)) = features.iter().enumerate().find(|(_, m)| m.rows != rows) {
        return Err(PadError::RowMismatch {
            index,
            expected: rows,
            got: m.rows,
        });
    }
    let width = max_width(&features);
    Ok(features
        .into_iter()
        .map(|m| if m.cols == width { m } else { pad_width(&m, width) })
        .collect())
}
