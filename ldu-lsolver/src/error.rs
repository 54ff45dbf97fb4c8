use crate::backend::BackendError;
use crate::session::SessionState;
use ldu_core::LduCoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LsolverError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Core(#[from] LduCoreError),

    #[error("Cannot {operation} a solver session that is {state:?}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    #[error("No matrix has been uploaded to the solver session")]
    MatrixNotUploaded,

    #[error("Vector lengths (psi: {psi}, rhs: {rhs}) must match matrix rows ({rows})")]
    DimensionMismatch { rows: usize, psi: usize, rhs: usize },

    #[error("Index {0} does not fit the backend's 32-bit indices")]
    IndexOverflow(usize),

    #[error("Invalid value {value:?} for solver control '{key}'")]
    InvalidControl { key: &'static str, value: String },

    #[error("Backend runtime lock poisoned")]
    RuntimePoisoned,
}

pub type Result<T> = core::result::Result<T, LsolverError>;
