//! The narrow protocol spoken to an external sparse solver library.
//!
//! Method names follow the AmgX C API one-to-one. Handles are opaque `Copy`
//! values owned by the caller; every `*_create` must be paired with the
//! matching `*_destroy` (see [`crate::handles`]).

use serde::Serialize;
use std::fmt::Debug;
use std::path::Path;
use thiserror::Error;

pub type BackendResult<T> = Result<T, BackendError>;

/// A failed backend call. The backend gives no transient/permanent
/// distinction, so callers treat every failure as permanent.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{call} failed with code {code}: {message}")]
pub struct BackendError {
    pub call: &'static str,
    pub code: i32,
    pub message: String,
}

impl BackendError {
    pub fn new(call: &'static str, code: i32, message: impl Into<String>) -> Self {
        Self {
            call,
            code,
            message: message.into(),
        }
    }
}

/// Memory space and precisions of matrices, vectors and solvers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Mode {
    /// Device memory, double vectors, double matrix, 32-bit indices (`dDDI`).
    DeviceDoubleDoubleInt,
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::DeviceDoubleDoubleInt => "dDDI",
        }
    }
}

/// Terminal status of the last solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SolveStatus {
    Success,
    Failed,
    Diverged,
    NotConverged,
}

impl SolveStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, SolveStatus::Success)
    }
}

/// A CSR matrix ready for upload, with 32-bit indices.
#[derive(Debug, Clone, Copy)]
pub struct MatrixUpload<'a> {
    pub n: usize,
    pub nnz: usize,
    pub block_dim_x: usize,
    pub block_dim_y: usize,
    pub row_ptrs: &'a [i32],
    pub col_indices: &'a [i32],
    pub values: &'a [f64],
}

/// An external sparse solver library.
///
/// The runtime calls (`initialize`, `initialize_plugins`, `finalize_plugins`,
/// `finalize`) act on process-wide library state and are only issued through
/// [`crate::runtime::Runtime`].
pub trait Backend: Send + Sync {
    type Config: Copy + Debug;
    type Resources: Copy + Debug;
    type Matrix: Copy + Debug;
    type Vector: Copy + Debug;
    type Solver: Copy + Debug;

    /// Human readable backend name for logs.
    fn name(&self) -> &'static str;

    fn initialize(&self) -> BackendResult<()>;
    fn initialize_plugins(&self) -> BackendResult<()>;
    fn finalize_plugins(&self) -> BackendResult<()>;
    fn finalize(&self) -> BackendResult<()>;

    /// Parses an inline configuration string.
    fn config_create(&self, options: &str) -> BackendResult<Self::Config>;
    /// Lets the library read a configuration file; the path is not parsed here.
    fn config_create_from_file(&self, path: &Path) -> BackendResult<Self::Config>;
    fn config_destroy(&self, config: Self::Config) -> BackendResult<()>;

    fn resources_create_simple(&self, config: Self::Config) -> BackendResult<Self::Resources>;
    fn resources_destroy(&self, resources: Self::Resources) -> BackendResult<()>;

    fn matrix_create(&self, resources: Self::Resources, mode: Mode)
        -> BackendResult<Self::Matrix>;
    fn matrix_upload_all(&self, matrix: Self::Matrix, upload: &MatrixUpload<'_>)
        -> BackendResult<()>;
    fn matrix_destroy(&self, matrix: Self::Matrix) -> BackendResult<()>;

    fn vector_create(&self, resources: Self::Resources, mode: Mode)
        -> BackendResult<Self::Vector>;
    fn vector_upload(&self, vector: Self::Vector, block_dim: usize, data: &[f64])
        -> BackendResult<()>;
    /// Copies the vector into `data`, which must hold exactly the uploaded length.
    fn vector_download(&self, vector: Self::Vector, data: &mut [f64]) -> BackendResult<()>;
    fn vector_destroy(&self, vector: Self::Vector) -> BackendResult<()>;

    fn solver_create(
        &self,
        resources: Self::Resources,
        mode: Mode,
        config: Self::Config,
    ) -> BackendResult<Self::Solver>;
    fn solver_setup(&self, solver: Self::Solver, matrix: Self::Matrix) -> BackendResult<()>;
    fn solver_solve(
        &self,
        solver: Self::Solver,
        rhs: Self::Vector,
        solution: Self::Vector,
    ) -> BackendResult<()>;
    fn solver_iterations(&self, solver: Self::Solver) -> BackendResult<usize>;
    fn solver_status(&self, solver: Self::Solver) -> BackendResult<SolveStatus>;
    /// Residual norm recorded at `iteration` of the last solve, if the
    /// backend keeps a residual history.
    fn solver_iteration_residual(
        &self,
        _solver: Self::Solver,
        _iteration: usize,
    ) -> BackendResult<Option<f64>> {
        Ok(None)
    }
    fn solver_destroy(&self, solver: Self::Solver) -> BackendResult<()>;
}
