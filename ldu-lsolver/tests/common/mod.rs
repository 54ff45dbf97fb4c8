//! A simulated backend that records every call and solves densely.
#![allow(dead_code)]

use ldu_core::{LduAddressing, LduMatrix};
use ldu_lsolver::{Backend, BackendError, BackendResult, MatrixUpload, Mode, SolveStatus};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimHandle(u64);

/// Copy of the arrays passed to one `matrix_upload_all`.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRecord {
    pub n: usize,
    pub nnz: usize,
    pub block_dims: (usize, usize),
    pub row_ptrs: Vec<i32>,
    pub col_indices: Vec<i32>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigRecord {
    Inline(String),
    File(String),
}

#[derive(Debug)]
struct SimState {
    calls: Vec<&'static str>,
    next_id: u64,
    live: BTreeMap<SimHandle, &'static str>,
    initialized: bool,
    plugins: bool,
    configs: Vec<ConfigRecord>,
    uploads: Vec<UploadRecord>,
    matrices: HashMap<SimHandle, UploadRecord>,
    vectors: HashMap<SimHandle, Vec<f64>>,
    setups: HashMap<SimHandle, SimHandle>,
    fail_on: Option<&'static str>,
    status: SolveStatus,
    iterations: usize,
    residuals: Option<(f64, f64)>,
}

#[derive(Debug)]
pub struct SimBackend {
    state: Mutex<SimState>,
}

impl Default for SimBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SimBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimState {
                calls: Vec::new(),
                next_id: 1,
                live: BTreeMap::new(),
                initialized: false,
                plugins: false,
                configs: Vec::new(),
                uploads: Vec::new(),
                matrices: HashMap::new(),
                vectors: HashMap::new(),
                setups: HashMap::new(),
                fail_on: None,
                status: SolveStatus::Success,
                iterations: 7,
                residuals: None,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap()
    }

    pub fn fail_on(&self, call: &'static str) {
        self.state().fail_on = Some(call);
    }

    pub fn clear_failure(&self) {
        self.state().fail_on = None;
    }

    pub fn set_status(&self, status: SolveStatus) {
        self.state().status = status;
    }

    pub fn set_iterations(&self, iterations: usize) {
        self.state().iterations = iterations;
    }

    /// Residual history reported as (first iteration, any later iteration).
    pub fn set_residuals(&self, residuals: Option<(f64, f64)>) {
        self.state().residuals = residuals;
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    pub fn count(&self, call: &str) -> usize {
        self.state().calls.iter().filter(|c| **c == call).count()
    }

    pub fn live_handles(&self) -> usize {
        self.state().live.len()
    }

    pub fn is_initialized(&self) -> bool {
        let state = self.state();
        state.initialized && state.plugins
    }

    pub fn configs(&self) -> Vec<ConfigRecord> {
        self.state().configs.clone()
    }

    pub fn uploads(&self) -> Vec<UploadRecord> {
        self.state().uploads.clone()
    }

    fn enter(&self, call: &'static str) -> BackendResult<MutexGuard<'_, SimState>> {
        let mut state = self.state();
        state.calls.push(call);
        if state.fail_on == Some(call) {
            return Err(BackendError::new(call, 1, "simulated failure"));
        }
        Ok(state)
    }

    fn create(&self, call: &'static str, kind: &'static str) -> BackendResult<SimHandle> {
        let mut state = self.enter(call)?;
        if !state.initialized {
            return Err(BackendError::new(call, 2, "library not initialized"));
        }
        let handle = SimHandle(state.next_id);
        state.next_id += 1;
        state.live.insert(handle, kind);
        Ok(handle)
    }

    fn destroy(&self, call: &'static str, handle: SimHandle) -> BackendResult<()> {
        let mut state = self.enter(call)?;
        match state.live.remove(&handle) {
            Some(_) => {
                state.matrices.remove(&handle);
                state.vectors.remove(&handle);
                state.setups.remove(&handle);
                Ok(())
            }
            None => Err(BackendError::new(call, 3, "handle is not live")),
        }
    }
}

impl Backend for SimBackend {
    type Config = SimHandle;
    type Resources = SimHandle;
    type Matrix = SimHandle;
    type Vector = SimHandle;
    type Solver = SimHandle;

    fn name(&self) -> &'static str {
        "sim"
    }

    fn initialize(&self) -> BackendResult<()> {
        let mut state = self.enter("initialize")?;
        if state.initialized {
            return Err(BackendError::new("initialize", 4, "already initialized"));
        }
        state.initialized = true;
        Ok(())
    }

    fn initialize_plugins(&self) -> BackendResult<()> {
        self.enter("initialize_plugins")?.plugins = true;
        Ok(())
    }

    fn finalize_plugins(&self) -> BackendResult<()> {
        self.enter("finalize_plugins")?.plugins = false;
        Ok(())
    }

    fn finalize(&self) -> BackendResult<()> {
        let mut state = self.enter("finalize")?;
        if !state.live.is_empty() {
            return Err(BackendError::new("finalize", 5, "handles still live"));
        }
        state.initialized = false;
        Ok(())
    }

    fn config_create(&self, options: &str) -> BackendResult<SimHandle> {
        let handle = self.create("config_create", "config")?;
        self.state().configs.push(ConfigRecord::Inline(options.to_string()));
        Ok(handle)
    }

    fn config_create_from_file(&self, path: &Path) -> BackendResult<SimHandle> {
        let handle = self.create("config_create_from_file", "config")?;
        self.state()
            .configs
            .push(ConfigRecord::File(path.display().to_string()));
        Ok(handle)
    }

    fn config_destroy(&self, config: SimHandle) -> BackendResult<()> {
        self.destroy("config_destroy", config)
    }

    fn resources_create_simple(&self, _config: SimHandle) -> BackendResult<SimHandle> {
        self.create("resources_create_simple", "resources")
    }

    fn resources_destroy(&self, resources: SimHandle) -> BackendResult<()> {
        self.destroy("resources_destroy", resources)
    }

    fn matrix_create(&self, _resources: SimHandle, _mode: Mode) -> BackendResult<SimHandle> {
        self.create("matrix_create", "matrix")
    }

    fn matrix_upload_all(&self, matrix: SimHandle, upload: &MatrixUpload<'_>) -> BackendResult<()> {
        let mut state = self.enter("matrix_upload_all")?;
        let record = UploadRecord {
            n: upload.n,
            nnz: upload.nnz,
            block_dims: (upload.block_dim_x, upload.block_dim_y),
            row_ptrs: upload.row_ptrs.to_vec(),
            col_indices: upload.col_indices.to_vec(),
            values: upload.values.to_vec(),
        };
        state.uploads.push(record.clone());
        state.matrices.insert(matrix, record);
        Ok(())
    }

    fn matrix_destroy(&self, matrix: SimHandle) -> BackendResult<()> {
        self.destroy("matrix_destroy", matrix)
    }

    fn vector_create(&self, _resources: SimHandle, _mode: Mode) -> BackendResult<SimHandle> {
        self.create("vector_create", "vector")
    }

    fn vector_upload(&self, vector: SimHandle, _block_dim: usize, data: &[f64]) -> BackendResult<()> {
        self.enter("vector_upload")?
            .vectors
            .insert(vector, data.to_vec());
        Ok(())
    }

    fn vector_download(&self, vector: SimHandle, data: &mut [f64]) -> BackendResult<()> {
        let state = self.enter("vector_download")?;
        match state.vectors.get(&vector) {
            Some(values) if values.len() == data.len() => {
                data.copy_from_slice(values);
                Ok(())
            }
            _ => Err(BackendError::new("vector_download", 6, "length mismatch")),
        }
    }

    fn vector_destroy(&self, vector: SimHandle) -> BackendResult<()> {
        self.destroy("vector_destroy", vector)
    }

    fn solver_create(&self, _resources: SimHandle, _mode: Mode, _config: SimHandle) -> BackendResult<SimHandle> {
        self.create("solver_create", "solver")
    }

    fn solver_setup(&self, solver: SimHandle, matrix: SimHandle) -> BackendResult<()> {
        self.enter("solver_setup")?.setups.insert(solver, matrix);
        Ok(())
    }

    fn solver_solve(&self, solver: SimHandle, rhs: SimHandle, solution: SimHandle) -> BackendResult<()> {
        let mut state = self.enter("solver_solve")?;
        let matrix = state
            .setups
            .get(&solver)
            .and_then(|m| state.matrices.get(m))
            .cloned()
            .ok_or_else(|| BackendError::new("solver_solve", 7, "solver not set up"))?;
        let b = state
            .vectors
            .get(&rhs)
            .cloned()
            .ok_or_else(|| BackendError::new("solver_solve", 8, "rhs not uploaded"))?;
        let x = dense_solve(&matrix, &b)
            .ok_or_else(|| BackendError::new("solver_solve", 9, "singular matrix"))?;
        state.vectors.insert(solution, x);
        Ok(())
    }

    fn solver_iterations(&self, _solver: SimHandle) -> BackendResult<usize> {
        Ok(self.enter("solver_iterations")?.iterations)
    }

    fn solver_status(&self, _solver: SimHandle) -> BackendResult<SolveStatus> {
        Ok(self.enter("solver_status")?.status)
    }

    fn solver_iteration_residual(&self, _solver: SimHandle, iteration: usize) -> BackendResult<Option<f64>> {
        let state = self.enter("solver_iteration_residual")?;
        Ok(state
            .residuals
            .map(|(initial, last)| if iteration == 0 { initial } else { last }))
    }

    fn solver_destroy(&self, solver: SimHandle) -> BackendResult<()> {
        self.destroy("solver_destroy", solver)
    }
}

/// Gaussian elimination with partial pivoting on the uploaded CSR.
fn dense_solve(matrix: &UploadRecord, b: &[f64]) -> Option<Vec<f64>> {
    let n = matrix.n;
    if b.len() != n {
        return None;
    }
    let mut a = vec![vec![0.0; n + 1]; n];
    for (row, a_row) in a.iter_mut().enumerate() {
        let start = matrix.row_ptrs[row] as usize;
        let end = matrix.row_ptrs[row + 1] as usize;
        for k in start..end {
            a_row[matrix.col_indices[k] as usize] += matrix.values[k];
        }
        a_row[n] = b[row];
    }
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-300 {
            return None;
        }
        a.swap(col, pivot);
        let pivot_row = a[col].clone();
        for a_row in a.iter_mut().skip(col + 1) {
            let factor = a_row[col] / pivot_row[col];
            for k in col..=n {
                a_row[k] -= factor * pivot_row[k];
            }
        }
    }
    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let sum: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (a[row][n] - sum) / a[row][row];
    }
    Some(x)
}

/// Symmetric 1D Laplacian on `n` cells with Dirichlet-like diagonal boost.
pub fn laplacian_1d(n: usize) -> LduMatrix<f64> {
    let lower: Vec<usize> = (0..n.saturating_sub(1)).collect();
    let upper: Vec<usize> = (1..n).collect();
    let addressing = LduAddressing::new(n, lower, upper).unwrap();
    let mut diag = vec![2.0; n];
    if n > 0 {
        diag[0] = 3.0;
        diag[n - 1] = 3.0;
    }
    LduMatrix::symmetric(addressing, diag, vec![-1.0; n.saturating_sub(1)]).unwrap()
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn assert_approx_eq_vec(a: &[f64], b: &[f64], tolerance: f64) {
    assert_eq!(a.len(), b.len(), "Vector lengths differ");
    for i in 0..a.len() {
        let diff = (a[i] - b[i]).abs();
        assert!(
            diff <= tolerance,
            "Verification failed at index {}: expected {}, got {}, diff {}",
            i,
            b[i],
            a[i],
            diff
        );
    }
}

/// Sequence issued by a successful session initialization.
pub const INIT_CALLS: [&str; 8] = [
    "initialize",
    "initialize_plugins",
    "config_create",
    "resources_create_simple",
    "matrix_create",
    "vector_create",
    "vector_create",
    "solver_create",
];

/// Sequence issued by finalizing the last session.
pub const FINALIZE_CALLS: [&str; 8] = [
    "solver_destroy",
    "vector_destroy",
    "vector_destroy",
    "matrix_destroy",
    "resources_destroy",
    "config_destroy",
    "finalize_plugins",
    "finalize",
];
