use crate::dense_matrix::DenseMatrix;
use crate::error::LduCoreError;
use crate::traits::{Matrix, Scalar};
use serde::Serialize;

/// Represents a sparse matrix in Compressed Sparse Row (CSR) format on the CPU.
///
/// Column indices within a row are kept in insertion order; they are not
/// required to be sorted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SparseMatrix<T: Scalar = f64> {
    /// Number of rows.
    rows: usize,
    /// Number of columns.
    cols: usize,
    /// Vector containing the non-zero values of the matrix.
    pub(crate) values: Vec<T>,
    /// Vector containing the column indices corresponding to the values.
    pub(crate) col_indices: Vec<usize>,
    /// Vector containing the pointers to the start of each row in `values` and `col_indices`.
    /// The length of this vector is `rows + 1`. `row_ptr[i]` gives the index in `values`
    /// where row `i` starts, and `row_ptr[rows]` gives the total number of non-zero elements (nnz).
    pub(crate) row_ptr: Vec<usize>,
}

impl<T: Scalar> SparseMatrix<T> {
    /// Creates a new empty SparseMatrix with given dimensions.
    pub fn new(rows: usize, cols: usize) -> Self {
        SparseMatrix {
            rows,
            cols,
            values: Vec::new(),
            col_indices: Vec::new(),
            row_ptr: vec![0; rows + 1],
        }
    }

    /// Internal constructor for arrays that are valid by construction.
    pub(crate) fn from_parts_unchecked(
        rows: usize,
        cols: usize,
        values: Vec<T>,
        col_indices: Vec<usize>,
        row_ptr: Vec<usize>,
    ) -> Self {
        debug_assert_eq!(row_ptr.len(), rows + 1);
        debug_assert_eq!(values.len(), col_indices.len());
        SparseMatrix {
            rows,
            cols,
            values,
            col_indices,
            row_ptr,
        }
    }

    /// Creates a SparseMatrix from CSR components.
    pub fn from_csr(
        rows: usize,
        cols: usize,
        values: Vec<T>,
        col_indices: Vec<usize>,
        row_ptr: Vec<usize>,
    ) -> Result<Self, LduCoreError> {
        if row_ptr.len() != rows + 1 {
            return Err(LduCoreError::InvalidDimensions(
                "row_ptr length must be rows + 1".to_string(),
            ));
        }
        if values.len() != col_indices.len() {
            return Err(LduCoreError::InvalidDimensions(
                "values and col_indices must have the same length".to_string(),
            ));
        }
        if row_ptr[0] != 0 {
            return Err(LduCoreError::InvalidDimensions(
                "First element of row_ptr must be zero".to_string(),
            ));
        }
        if row_ptr[rows] != values.len() {
            return Err(LduCoreError::InvalidDimensions(
                "Last element of row_ptr must equal the number of non-zero values".to_string(),
            ));
        }
        if row_ptr.windows(2).any(|w| w[0] > w[1]) {
            return Err(LduCoreError::InvalidDimensions(
                "row_ptr must be non-decreasing".to_string(),
            ));
        }
        if col_indices.iter().any(|&c| c >= cols) {
            return Err(LduCoreError::InvalidDimensions(
                "Column index out of bounds".to_string(),
            ));
        }

        Ok(SparseMatrix {
            rows,
            cols,
            values,
            col_indices,
            row_ptr,
        })
    }

    /// Creates a SparseMatrix from a dense 2D vector representation,
    /// dropping exact zeros.
    pub fn from_dense(dense: &[Vec<T>]) -> Result<Self, LduCoreError> {
        let rows = dense.len();
        let cols = dense.first().map_or(0, |row| row.len());
        let mut values = Vec::new();
        let mut col_indices = Vec::new();
        let mut row_ptr = Vec::with_capacity(rows + 1);
        row_ptr.push(0);

        for row_vec in dense {
            if row_vec.len() != cols {
                return Err(LduCoreError::InvalidDimensions(
                    "Input dense matrix must be rectangular".to_string(),
                ));
            }
            for (c, &val) in row_vec.iter().enumerate() {
                if val != T::zero() {
                    values.push(val);
                    col_indices.push(c);
                }
            }
            row_ptr.push(values.len());
        }
        Ok(Self::from_parts_unchecked(
            rows,
            cols,
            values,
            col_indices,
            row_ptr,
        ))
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of non-zero elements.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Column indices and values stored for `row`.
    ///
    /// # Panics
    /// Panics if `row >= self.rows()`.
    pub fn row(&self, row: usize) -> (&[usize], &[T]) {
        let range = self.row_ptr[row]..self.row_ptr[row + 1];
        (&self.col_indices[range.clone()], &self.values[range])
    }

    /// Value at a specific row and column, summing repeated entries.
    /// Inefficient for sparse matrices, primarily for testing/debugging.
    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        let (cols, values) = self.row(row);
        cols.iter()
            .zip(values)
            .filter(|&(&c, _)| c == col)
            .map(|(_, &v)| v)
            .reduce(|acc, v| acc + v)
    }

    /// Returns a slice containing the non-zero values.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Returns a slice containing the column indices.
    pub fn col_indices(&self) -> &[usize] {
        &self.col_indices
    }

    /// Returns a slice containing the row pointers.
    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    /// Expands into a row-major dense matrix. Repeated positions accumulate.
    pub fn to_dense(&self) -> DenseMatrix<T> {
        let mut dense = DenseMatrix::zeros(self.rows, self.cols);
        for Triplet { row, col, value } in self.iter() {
            dense.add_at(row, col, value);
        }
        dense
    }

    pub fn iter(&self) -> SparseMatrixIter<'_, T> {
        SparseMatrixIter {
            matrix: self,
            row: 0,
            pos: 0,
        }
    }
}

/// A single stored entry of a sparse matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triplet<T> {
    pub row: usize,
    pub col: usize,
    pub value: T,
}

pub struct SparseMatrixIter<'a, T: Scalar> {
    matrix: &'a SparseMatrix<T>,
    row: usize,
    pos: usize,
}

impl<'a, T: Scalar> Iterator for SparseMatrixIter<'a, T> {
    type Item = Triplet<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let m = self.matrix;
        if self.pos >= m.nnz() {
            return None;
        }
        // Skip empty rows
        while self.row < m.rows && m.row_ptr[self.row + 1] <= self.pos {
            self.row += 1;
        }
        let item = Triplet {
            row: self.row,
            col: m.col_indices[self.pos],
            value: m.values[self.pos],
        };
        self.pos += 1;
        Some(item)
    }
}

impl<T: Scalar> Matrix for SparseMatrix<T> {
    type Value = T;

    fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }
}
