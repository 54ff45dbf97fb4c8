//! # LDU Core Library
//!
//! Matrix data structures shared by the solver bridge: face-addressed (LDU)
//! matrices as assembled by a finite-volume code, compressed sparse row
//! matrices as consumed by external sparse solvers, and the conversion
//! between the two.

pub mod convert;
pub mod dense_matrix;
pub mod error;
pub mod ldu_matrix;
pub mod sparse_matrix;
pub mod traits;

// Re-export public types
pub use convert::ldu_to_csr;
pub use dense_matrix::DenseMatrix;
pub use error::LduCoreError;
pub use ldu_matrix::{LduAddressing, LduMatrix};
pub use sparse_matrix::{SparseMatrix, Triplet};
pub use traits::{LduView, Matrix, Scalar};
