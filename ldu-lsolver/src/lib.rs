//! `ldu-lsolver`: hands face-addressed (LDU) systems to an external sparse
//! solver library such as AmgX.
//!
//! A [`SolverSession`] owns the backend handles for one equation and drives
//! upload, setup and solve. [`AmgxSolver`] wraps a session the way a
//! finite-volume framework expects a linear solver to behave: one call per
//! solve, returning a [`SolverPerformance`] record.

// Core modules
pub mod amgx_solver;
pub mod backend;
pub mod config;
pub mod error;
mod handles;
pub mod performance;
pub mod runtime;
pub mod session;

#[cfg(feature = "amgx")]
pub mod amgx;

pub use amgx_solver::{AmgxSolver, SOLVER_NAME};
pub use backend::{Backend, BackendError, BackendResult, MatrixUpload, Mode, SolveStatus};
pub use config::{AmgxOptions, ConfigSource, Dictionary, ResidualMode, SolverControls};
pub use error::{LsolverError, Result};
pub use performance::SolverPerformance;
pub use runtime::Runtime;
pub use session::{ResidualNorms, SessionState, SolveOutcome, SolverSession};

#[cfg(feature = "amgx")]
pub use amgx::Amgx;

// Re-export from ldu_core
pub use ldu_core::{ldu_to_csr, LduAddressing, LduCoreError, LduMatrix, LduView, SparseMatrix};
