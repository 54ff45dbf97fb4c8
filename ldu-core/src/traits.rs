use bytemuck::{Pod, Zeroable};
use num_traits::Float;
use std::fmt::Debug;

/// Numeric element type usable in every matrix of this crate (f32, f64).
pub trait Scalar: Float + Copy + Debug + Default + Pod + Zeroable + Send + Sync {}

impl<T> Scalar for T where T: Float + Copy + Debug + Default + Pod + Zeroable + Send + Sync {}

/// Generic trait representing a matrix.
/// Implementations can be sparse, dense or face-addressed.
pub trait Matrix: Debug {
    /// The underlying numeric type of the matrix elements (e.g., f32, f64).
    type Value: Scalar;

    /// Returns the dimensions of the matrix as (rows, columns).
    fn dims(&self) -> (usize, usize);

    /// Returns the number of rows.
    fn rows(&self) -> usize {
        self.dims().0
    }

    /// Returns the number of columns.
    fn cols(&self) -> usize {
        self.dims().1
    }

    /// Checks if the matrix is square.
    fn is_square(&self) -> bool {
        let (rows, cols) = self.dims();
        rows == cols
    }
}

/// Read-only view of a face-addressed (lower/diagonal/upper) matrix.
///
/// This is the seam through which a CFD framework hands its matrix to the
/// converter. All arrays are indexed by plain position:
///
/// * `diag()` has one entry per unknown (`size()` entries);
/// * `lower_addr()[f]` is the owner and `upper_addr()[f]` the neighbour of face `f`;
/// * `upper()[f]` is the coefficient in the owner's row at the neighbour's column;
/// * `lower()[f]` is the coefficient in the neighbour's row at the owner's column.
pub trait LduView {
    type Value: Scalar;

    /// Number of unknowns (cells).
    fn size(&self) -> usize;

    fn diag(&self) -> &[Self::Value];

    fn lower_addr(&self) -> &[usize];

    fn upper_addr(&self) -> &[usize];

    fn upper(&self) -> &[Self::Value];

    fn lower(&self) -> &[Self::Value];

    /// Number of faces (off-diagonal pairs).
    fn n_faces(&self) -> usize {
        self.lower_addr().len()
    }
}
