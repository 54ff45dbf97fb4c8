use crate::backend::{Backend, MatrixUpload, Mode, SolveStatus};
use crate::config::ConfigSource;
use crate::error::{LsolverError, Result};
use crate::handles::HandleSet;
use crate::runtime::Runtime;
use ldu_core::{ldu_to_csr, LduView};
use std::mem;
use std::sync::Arc;

/// Mode of every matrix, vector and solver created by a session.
pub const SESSION_MODE: Mode = Mode::DeviceDoubleDoubleInt;

/// Lifecycle of a [`SolverSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initialized,
    Finalized,
}

/// What the backend reported for one solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolveOutcome {
    pub iterations: usize,
    pub status: SolveStatus,
}

/// Residual norms read back from the backend's history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidualNorms {
    pub initial: f64,
    pub last: f64,
}

struct Active<B: Backend> {
    handles: HandleSet<B>,
    /// Rows of the matrix currently set up in the solver.
    matrix_rows: Option<usize>,
    last_outcome: Option<SolveOutcome>,
}

enum State<B: Backend> {
    Uninitialized,
    Initialized(Active<B>),
    Finalized,
}

/// Owns one backend handle set and drives upload, setup and solve.
///
/// The session is initialized eagerly by [`SolverSession::new`] and finalized
/// on drop. A finalized session cannot be initialized again; build a new one.
pub struct SolverSession<B: Backend> {
    runtime: Arc<Runtime<B>>,
    config: ConfigSource,
    state: State<B>,
}

impl<B: Backend> SolverSession<B> {
    pub fn new(runtime: Arc<Runtime<B>>, config: ConfigSource) -> Result<Self> {
        let mut session = Self {
            runtime,
            config,
            state: State::Uninitialized,
        };
        session.initialize()?;
        Ok(session)
    }

    pub fn state(&self) -> SessionState {
        match self.state {
            State::Uninitialized => SessionState::Uninitialized,
            State::Initialized(_) => SessionState::Initialized,
            State::Finalized => SessionState::Finalized,
        }
    }

    pub fn config(&self) -> &ConfigSource {
        &self.config
    }

    pub fn runtime(&self) -> &Arc<Runtime<B>> {
        &self.runtime
    }

    /// Acquires the runtime and all handles. Does nothing when already
    /// initialized; a failed acquisition leaves the session uninitialized.
    pub fn initialize(&mut self) -> Result<()> {
        match self.state {
            State::Initialized(_) => return Ok(()),
            State::Finalized => {
                return Err(LsolverError::InvalidState {
                    operation: "initialize",
                    state: SessionState::Finalized,
                })
            }
            State::Uninitialized => {}
        }

        let handles = HandleSet::acquire(&self.runtime, &self.config, SESSION_MODE)?;
        self.state = State::Initialized(Active {
            handles,
            matrix_rows: None,
            last_outcome: None,
        });
        log::info!(
            "{} solver session initialized ({})",
            self.runtime.backend().name(),
            SESSION_MODE.name()
        );
        Ok(())
    }

    /// Converts `matrix` to CSR, uploads it with 1x1 blocks and runs the
    /// solver setup against it.
    pub fn upload_and_setup<M>(&mut self, matrix: &M) -> Result<()>
    where
        M: LduView<Value = f64> + ?Sized,
    {
        let active = self.active_mut("upload a matrix to")?;
        let csr = ldu_to_csr(matrix);
        let row_ptrs = to_backend_indices(csr.row_ptr())?;
        let col_indices = to_backend_indices(csr.col_indices())?;
        let upload = MatrixUpload {
            n: csr.rows(),
            nnz: csr.nnz(),
            block_dim_x: 1,
            block_dim_y: 1,
            row_ptrs: &row_ptrs,
            col_indices: &col_indices,
            values: csr.values(),
        };
        log::debug!("Uploading {} rows, {} non-zeros", upload.n, upload.nnz);

        // A failed upload leaves no usable matrix behind
        active.matrix_rows = None;
        let handles = &active.handles;
        let backend = handles.backend();
        backend.matrix_upload_all(handles.matrix(), &upload)?;
        backend.solver_setup(handles.solver(), handles.matrix())?;
        active.matrix_rows = Some(upload.n);
        Ok(())
    }

    /// Solves with the matrix from the last [`Self::upload_and_setup`],
    /// starting from `psi` and overwriting it with the solution.
    pub fn solve(&mut self, psi: &mut [f64], rhs: &[f64]) -> Result<SolveOutcome> {
        let active = self.active_mut("solve with")?;
        let rows = active.matrix_rows.ok_or(LsolverError::MatrixNotUploaded)?;
        if psi.len() != rows || rhs.len() != rows {
            return Err(LsolverError::DimensionMismatch {
                rows,
                psi: psi.len(),
                rhs: rhs.len(),
            });
        }

        let handles = &active.handles;
        let backend = handles.backend();
        backend.vector_upload(handles.rhs(), 1, rhs)?;
        backend.vector_upload(handles.solution(), 1, psi)?;
        backend.solver_solve(handles.solver(), handles.rhs(), handles.solution())?;
        backend.vector_download(handles.solution(), psi)?;

        let outcome = SolveOutcome {
            iterations: backend.solver_iterations(handles.solver())?,
            status: backend.solver_status(handles.solver())?,
        };
        active.last_outcome = Some(outcome);
        if outcome.status.is_success() {
            log::debug!("Solve converged in {} iterations", outcome.iterations);
        } else {
            log::warn!(
                "Solve ended with status {:?} after {} iterations",
                outcome.status,
                outcome.iterations
            );
        }
        Ok(outcome)
    }

    /// Residual norms of the last solve, if the backend recorded them.
    pub fn residual_norms(&self) -> Result<Option<ResidualNorms>> {
        let active = match &self.state {
            State::Initialized(active) => active,
            _ => return Err(self.invalid_state("query residuals of")),
        };
        let Some(outcome) = active.last_outcome else {
            return Ok(None);
        };
        let handles = &active.handles;
        let backend = handles.backend();
        let initial = backend.solver_iteration_residual(handles.solver(), 0)?;
        let last = backend.solver_iteration_residual(handles.solver(), outcome.iterations)?;
        Ok(initial
            .zip(last)
            .map(|(initial, last)| ResidualNorms { initial, last }))
    }

    /// Destroys all handles in reverse creation order and releases the
    /// runtime. Does nothing unless initialized.
    pub fn finalize(&mut self) -> Result<()> {
        match mem::replace(&mut self.state, State::Finalized) {
            State::Initialized(active) => {
                active.handles.release()?;
                log::info!("{} solver session finalized", self.runtime.backend().name());
                Ok(())
            }
            other => {
                self.state = other;
                Ok(())
            }
        }
    }

    fn active_mut(&mut self, operation: &'static str) -> Result<&mut Active<B>> {
        let state = self.state();
        match &mut self.state {
            State::Initialized(active) => Ok(active),
            _ => Err(LsolverError::InvalidState { operation, state }),
        }
    }

    fn invalid_state(&self, operation: &'static str) -> LsolverError {
        LsolverError::InvalidState {
            operation,
            state: self.state(),
        }
    }
}

impl<B: Backend> Drop for SolverSession<B> {
    fn drop(&mut self) {
        if let Err(e) = self.finalize() {
            log::error!("Finalizing solver session failed: {}", e);
        }
    }
}

fn to_backend_indices(indices: &[usize]) -> Result<Vec<i32>> {
    indices
        .iter()
        .map(|&i| i32::try_from(i).map_err(|_| LsolverError::IndexOverflow(i)))
        .collect()
}
