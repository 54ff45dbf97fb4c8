//! Face-addressed (LDU) to compressed sparse row conversion.
//!
//! The output keeps one entry per stored coefficient: `n` diagonals plus two
//! off-diagonals per face, so `nnz == n + 2 * n_faces` always holds. Explicit
//! zeros are kept and faces joining the same pair of cells are not merged.
//!
//! Within a row the diagonal comes first, followed by the off-diagonals in
//! face order. For face `f` with owner `o = lower_addr[f]` and neighbour
//! `n = upper_addr[f]`:
//!
//! * row `o` receives `(n, upper[f])`;
//! * row `n` receives `(o, lower[f])`.

use crate::sparse_matrix::SparseMatrix;
use crate::traits::{LduView, Scalar};

/// Converts an LDU matrix into CSR storage in O(n + faces), without sorting.
///
/// Addressing indices are trusted: they must be smaller than `matrix.size()`.
/// An out-of-range index panics rather than producing a corrupt matrix.
pub fn ldu_to_csr<T, M>(matrix: &M) -> SparseMatrix<T>
where
    T: Scalar,
    M: LduView<Value = T> + ?Sized,
{
    let n = matrix.size();
    let owners = matrix.lower_addr();
    let neighbours = matrix.upper_addr();
    let upper = matrix.upper();
    let lower = matrix.lower();
    let diag = matrix.diag();

    // Count non-zeros per row, starting with the diagonal
    let mut row_nnz = vec![1usize; n];
    for (&own, &nei) in owners.iter().zip(neighbours) {
        row_nnz[own] += 1;
        row_nnz[nei] += 1;
    }

    // Exclusive prefix sum
    let mut row_ptr = Vec::with_capacity(n + 1);
    row_ptr.push(0usize);
    let mut total = 0usize;
    for count in &row_nnz {
        total += count;
        row_ptr.push(total);
    }
    log::debug!(
        "LDU -> CSR: {} rows, {} faces, {} non-zeros",
        n,
        owners.len(),
        total
    );

    let mut col_indices = vec![0usize; total];
    let mut values = vec![T::zero(); total];
    // Next free slot of every row
    let mut cursor: Vec<usize> = row_ptr[..n].to_vec();

    for (row, &d) in diag.iter().enumerate().take(n) {
        let pos = cursor[row];
        col_indices[pos] = row;
        values[pos] = d;
        cursor[row] += 1;
    }

    let faces = owners
        .iter()
        .zip(neighbours)
        .zip(upper.iter().zip(lower));
    for ((&own, &nei), (&upper_coeff, &lower_coeff)) in faces {
        let pos = cursor[own];
        col_indices[pos] = nei;
        values[pos] = upper_coeff;
        cursor[own] += 1;

        let pos = cursor[nei];
        col_indices[pos] = own;
        values[pos] = lower_coeff;
        cursor[nei] += 1;
    }

    debug_assert!(cursor
        .iter()
        .zip(&row_ptr[1..])
        .all(|(&next, &end)| next == end));

    SparseMatrix::from_parts_unchecked(n, n, values, col_indices, row_ptr)
}
