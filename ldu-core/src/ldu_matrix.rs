use crate::convert;
use crate::error::LduCoreError;
use crate::sparse_matrix::SparseMatrix;
use crate::traits::{LduView, Matrix, Scalar};
use serde::Serialize;

/// Face addressing of an LDU matrix: `size` unknowns and one
/// (owner, neighbour) pair per face.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LduAddressing {
    size: usize,
    /// Owner cell of every face.
    lower_addr: Vec<usize>,
    /// Neighbour cell of every face.
    upper_addr: Vec<usize>,
}

impl LduAddressing {
    /// Creates the addressing, checking that both arrays have one entry per
    /// face and that every index refers to an existing unknown.
    ///
    /// Faces whose owner equals their neighbour are not rejected.
    pub fn new(
        size: usize,
        lower_addr: Vec<usize>,
        upper_addr: Vec<usize>,
    ) -> Result<Self, LduCoreError> {
        if lower_addr.len() != upper_addr.len() {
            return Err(LduCoreError::InvalidDimensions(format!(
                "Owner addressing ({}) and neighbour addressing ({}) must have the same length",
                lower_addr.len(),
                upper_addr.len()
            )));
        }
        if let Some(&index) = lower_addr.iter().find(|&&i| i >= size) {
            return Err(LduCoreError::IndexOutOfBounds {
                what: "owner",
                index,
                size,
            });
        }
        if let Some(&index) = upper_addr.iter().find(|&&i| i >= size) {
            return Err(LduCoreError::IndexOutOfBounds {
                what: "neighbour",
                index,
                size,
            });
        }
        Ok(Self {
            size,
            lower_addr,
            upper_addr,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn n_faces(&self) -> usize {
        self.lower_addr.len()
    }

    pub fn lower_addr(&self) -> &[usize] {
        &self.lower_addr
    }

    pub fn upper_addr(&self) -> &[usize] {
        &self.upper_addr
    }
}

/// A scalar matrix in lower/diagonal/upper storage.
///
/// Symmetric matrices keep only the upper coefficients; `lower()` then
/// returns the same slice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LduMatrix<T: Scalar = f64> {
    addressing: LduAddressing,
    diag: Vec<T>,
    upper: Vec<T>,
    lower: Option<Vec<T>>,
}

impl<T: Scalar> LduMatrix<T> {
    /// Creates an asymmetric matrix.
    pub fn new(
        addressing: LduAddressing,
        diag: Vec<T>,
        upper: Vec<T>,
        lower: Vec<T>,
    ) -> Result<Self, LduCoreError> {
        check_len("lower", lower.len(), addressing.n_faces())?;
        let mut matrix = Self::symmetric(addressing, diag, upper)?;
        matrix.lower = Some(lower);
        Ok(matrix)
    }

    /// Creates a symmetric matrix (`lower == upper`).
    pub fn symmetric(
        addressing: LduAddressing,
        diag: Vec<T>,
        upper: Vec<T>,
    ) -> Result<Self, LduCoreError> {
        check_len("diag", diag.len(), addressing.size())?;
        check_len("upper", upper.len(), addressing.n_faces())?;
        Ok(Self {
            addressing,
            diag,
            upper,
            lower: None,
        })
    }

    pub fn addressing(&self) -> &LduAddressing {
        &self.addressing
    }

    pub fn is_symmetric(&self) -> bool {
        self.lower.is_none()
    }

    /// Mutable diagonal, for reassembling coefficients on the same mesh.
    pub fn diag_mut(&mut self) -> &mut [T] {
        &mut self.diag
    }

    pub fn upper_mut(&mut self) -> &mut [T] {
        &mut self.upper
    }

    /// Mutable lower coefficients. A symmetric matrix becomes asymmetric,
    /// starting from a copy of its upper coefficients.
    pub fn lower_mut(&mut self) -> &mut [T] {
        let upper = &self.upper;
        self.lower.get_or_insert_with(|| upper.clone())
    }

    /// Converts into compressed sparse row storage.
    pub fn to_csr(&self) -> SparseMatrix<T> {
        convert::ldu_to_csr(self)
    }
}

fn check_len(what: &str, actual: usize, expected: usize) -> Result<(), LduCoreError> {
    if actual != expected {
        return Err(LduCoreError::InvalidDimensions(format!(
            "{} coefficients ({}) must match addressing ({})",
            what, actual, expected
        )));
    }
    Ok(())
}

impl<T: Scalar> LduView for LduMatrix<T> {
    type Value = T;

    fn size(&self) -> usize {
        self.addressing.size()
    }

    fn diag(&self) -> &[T] {
        &self.diag
    }

    fn lower_addr(&self) -> &[usize] {
        self.addressing.lower_addr()
    }

    fn upper_addr(&self) -> &[usize] {
        self.addressing.upper_addr()
    }

    fn upper(&self) -> &[T] {
        &self.upper
    }

    fn lower(&self) -> &[T] {
        self.lower.as_deref().unwrap_or(&self.upper[..])
    }
}

impl<T: Scalar> Matrix for LduMatrix<T> {
    type Value = T;

    fn dims(&self) -> (usize, usize) {
        (self.size(), self.size())
    }
}

#[cfg(test)]
mod tests {
    use super::{LduAddressing, LduMatrix};
    use crate::{LduCoreError, LduView};

    #[test]
    fn test_addressing_rejects_length_mismatch() {
        let err = LduAddressing::new(3, vec![0, 1], vec![1]).unwrap_err();
        match err {
            LduCoreError::InvalidDimensions(msg) => assert!(msg.contains("same length")),
            _ => panic!("Expected InvalidDimensions error"),
        }
    }

    #[test]
    fn test_addressing_rejects_out_of_range() {
        let err = LduAddressing::new(2, vec![0], vec![2]).unwrap_err();
        assert_eq!(
            err,
            LduCoreError::IndexOutOfBounds {
                what: "neighbour",
                index: 2,
                size: 2
            }
        );
        let err = LduAddressing::new(2, vec![5], vec![1]).unwrap_err();
        assert!(matches!(
            err,
            LduCoreError::IndexOutOfBounds { what: "owner", .. }
        ));
    }

    #[test]
    fn test_matrix_rejects_wrong_coefficient_lengths() {
        let addr = LduAddressing::new(2, vec![0], vec![1]).unwrap();
        assert!(LduMatrix::symmetric(addr.clone(), vec![1.0], vec![2.0]).is_err());
        assert!(LduMatrix::symmetric(addr.clone(), vec![1.0, 1.0], vec![]).is_err());
        assert!(LduMatrix::new(addr, vec![1.0, 1.0], vec![2.0], vec![3.0, 4.0]).is_err());
    }

    #[test]
    fn test_symmetric_lower_mirrors_upper() {
        let addr = LduAddressing::new(2, vec![0], vec![1]).unwrap();
        let mut m = LduMatrix::symmetric(addr, vec![2.0, 2.0], vec![-1.0]).unwrap();
        assert!(m.is_symmetric());
        assert_eq!(m.lower(), &[-1.0]);

        m.lower_mut()[0] = -0.5;
        assert!(!m.is_symmetric());
        assert_eq!(m.upper(), &[-1.0]);
        assert_eq!(m.lower(), &[-0.5]);
    }
}
