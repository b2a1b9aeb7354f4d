use nalgebra::{RealField, SMatrix, Scalar};

use crate::Error;

/// Checks that a flat buffer holds exactly `expected` elements.
#[inline(always)]
pub(crate) fn check_len(expected: usize, found: usize) -> Result<(), Error> {
    if expected == found {
        Ok(())
    } else {
        Err(Error::BufferLength { expected, found })
    }
}

/// Builds a fixed-size matrix from a flat row-major buffer.
pub(crate) fn from_row_major<T: Scalar + Copy, const R: usize, const C: usize>(
    data: &[T],
) -> Result<SMatrix<T, R, C>, Error> {
    check_len(R * C, data.len())?;
    Ok(SMatrix::from_fn(|row, col| data[row * C + col]))
}

/// Writes a fixed-size matrix into a flat row-major buffer.
pub(crate) fn write_row_major<T: Scalar + Copy, const R: usize, const C: usize>(
    matrix: &SMatrix<T, R, C>,
    buffer: &mut [T],
) -> Result<(), Error> {
    check_len(R * C, buffer.len())?;
    for (row, chunk) in buffer.chunks_exact_mut(C).enumerate() {
        for (col, value) in chunk.iter_mut().enumerate() {
            *value = matrix[(row, col)];
        }
    }
    Ok(())
}

/// Shifts all columns such that `column[i] <- column[i + 1]` with the last two being identical.
#[inline(always)]
pub(crate) fn shift_columns_left<T: Scalar + Copy, const R: usize, const C: usize>(
    matrix: &mut SMatrix<T, R, C>,
) {
    if C > 1 {
        // Storage is column-major, so one column is `R` contiguous elements
        matrix.as_mut_slice().copy_within(R.., 0);
    }
}

/// Largest absolute element of `a - b`
#[inline(always)]
pub(crate) fn max_abs_diff<T: RealField + Copy, const R: usize, const C: usize>(
    a: &SMatrix<T, R, C>,
    b: &SMatrix<T, R, C>,
) -> T {
    (a - b).abs().max()
}

/// Returns `true` if every element of `min` is less than or equal to `max`
pub(crate) fn ordered<T: RealField + Copy, const R: usize, const C: usize>(
    min: &SMatrix<T, R, C>,
    max: &SMatrix<T, R, C>,
) -> bool {
    min.iter().zip(max.iter()).all(|(lo, hi)| lo <= hi)
}
