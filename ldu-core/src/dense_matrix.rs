use crate::error::LduCoreError;
use crate::traits::{LduView, Matrix, Scalar};

/// Represents a dense matrix stored in row-major order on the CPU.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix<T: Scalar = f64> {
    rows: usize,
    cols: usize,
    data: Vec<T>, // Data stored row-major: data[row * cols + col]
}

impl<T: Scalar> DenseMatrix<T> {
    /// Creates a new DenseMatrix from raw data, dimensions, assuming row-major order.
    pub fn new(rows: usize, cols: usize, data: Vec<T>) -> Result<Self, LduCoreError> {
        if data.len() != rows * cols {
            return Err(LduCoreError::InvalidDimensions(format!(
                "Data length ({}) does not match dimensions ({}x{})",
                data.len(),
                rows,
                cols
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Creates a new DenseMatrix filled with zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![T::zero(); rows * cols],
        }
    }

    /// Builds the dense operator of a face-addressed matrix directly from its
    /// arrays, without going through CSR.
    pub fn from_ldu<M: LduView<Value = T> + ?Sized>(matrix: &M) -> Self {
        let n = matrix.size();
        let mut dense = Self::zeros(n, n);
        for (i, &d) in matrix.diag().iter().enumerate() {
            dense.add_at(i, i, d);
        }
        let faces = matrix
            .lower_addr()
            .iter()
            .zip(matrix.upper_addr())
            .zip(matrix.upper().iter().zip(matrix.lower()));
        for ((&own, &nei), (&upper, &lower)) in faces {
            dense.add_at(own, nei, upper);
            dense.add_at(nei, own, lower);
        }
        dense
    }

    /// Gets the element at the specified row and column.
    /// Returns None if indices are out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row < self.rows && col < self.cols {
            self.data.get(row * self.cols + col)
        } else {
            None
        }
    }

    pub(crate) fn add_at(&mut self, row: usize, col: usize, value: T) {
        let idx = row * self.cols + col;
        self.data[idx] = self.data[idx] + value;
    }

    /// `y = A x`.
    pub fn mul_vec(&self, x: &[T]) -> Result<Vec<T>, LduCoreError> {
        if x.len() != self.cols {
            return Err(LduCoreError::InvalidDimensions(format!(
                "Vector length ({}) does not match matrix columns ({})",
                x.len(),
                self.cols
            )));
        }
        Ok((0..self.rows)
            .map(|r| {
                self.data[r * self.cols..(r + 1) * self.cols]
                    .iter()
                    .zip(x)
                    .fold(T::zero(), |acc, (&a, &b)| acc + a * b)
            })
            .collect())
    }

    /// Whether `self` equals its transpose exactly.
    pub fn is_symmetric(&self) -> bool {
        self.rows == self.cols
            && (0..self.rows).all(|r| {
                (r + 1..self.cols).all(|c| self.data[r * self.cols + c] == self.data[c * self.cols + r])
            })
    }
}

impl<T: Scalar> Matrix for DenseMatrix<T> {
    type Value = T;

    fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }
}
