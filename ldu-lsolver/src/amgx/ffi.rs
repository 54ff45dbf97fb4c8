//! Declarations of the subset of the AmgX C API used by [`super::Amgx`].

use std::os::raw::{c_char, c_double, c_int, c_void};

pub type AmgxRc = c_int;
pub type AmgxMode = c_int;
pub type AmgxSolveStatus = c_int;

pub const AMGX_RC_OK: AmgxRc = 0;
pub const AMGX_RC_BAD_PARAMETERS: AmgxRc = 1;

const AMGX_DEVICE: c_int = 1;
const AMGX_VEC_DOUBLE: c_int = 0;
const AMGX_MAT_DOUBLE: c_int = 0;
/// `AMGX_indInt`, which equals `AMGX_int`.
const AMGX_IND_INT: c_int = 2;

/// `AMGX_ASSEMBLE_MODE`: memory space, then vector, matrix and index
/// precision in base-16 digits.
const fn assemble_mode(mem: c_int, vec: c_int, mat: c_int, ind: c_int) -> AmgxMode {
    mem + vec * 16 + mat * 256 + ind * 4096
}

/// `AMGX_mode_dDDI`.
pub const AMGX_MODE_DDDI: AmgxMode =
    assemble_mode(AMGX_DEVICE, AMGX_VEC_DOUBLE, AMGX_MAT_DOUBLE, AMGX_IND_INT);

pub const AMGX_SOLVE_SUCCESS: AmgxSolveStatus = 0;
pub const AMGX_SOLVE_FAILED: AmgxSolveStatus = 1;
/// The header gives `AMGX_SOLVE_NOT_CONVERGED` the same value.
pub const AMGX_SOLVE_DIVERGED: AmgxSolveStatus = 2;

pub type ConfigHandle = *mut c_void;
pub type ResourcesHandle = *mut c_void;
pub type MatrixHandle = *mut c_void;
pub type VectorHandle = *mut c_void;
pub type SolverHandle = *mut c_void;

#[link(name = "amgxsh")]
extern "C" {
    pub fn AMGX_initialize() -> AmgxRc;
    pub fn AMGX_initialize_plugins() -> AmgxRc;
    pub fn AMGX_finalize_plugins() -> AmgxRc;
    pub fn AMGX_finalize() -> AmgxRc;
    pub fn AMGX_get_error_string(err: AmgxRc, buf: *mut c_char, buf_len: c_int) -> AmgxRc;

    pub fn AMGX_config_create(cfg: *mut ConfigHandle, options: *const c_char) -> AmgxRc;
    pub fn AMGX_config_create_from_file(cfg: *mut ConfigHandle, param_file: *const c_char) -> AmgxRc;
    pub fn AMGX_config_destroy(cfg: ConfigHandle) -> AmgxRc;

    pub fn AMGX_resources_create_simple(rsc: *mut ResourcesHandle, cfg: ConfigHandle) -> AmgxRc;
    pub fn AMGX_resources_destroy(rsc: ResourcesHandle) -> AmgxRc;

    pub fn AMGX_matrix_create(mtx: *mut MatrixHandle, rsc: ResourcesHandle, mode: AmgxMode) -> AmgxRc;
    pub fn AMGX_matrix_upload_all(
        mtx: MatrixHandle,
        n: c_int,
        nnz: c_int,
        block_dimx: c_int,
        block_dimy: c_int,
        row_ptrs: *const c_int,
        col_indices: *const c_int,
        data: *const c_void,
        diag_data: *const c_void,
    ) -> AmgxRc;
    pub fn AMGX_matrix_destroy(mtx: MatrixHandle) -> AmgxRc;

    pub fn AMGX_vector_create(vec: *mut VectorHandle, rsc: ResourcesHandle, mode: AmgxMode) -> AmgxRc;
    pub fn AMGX_vector_upload(vec: VectorHandle, n: c_int, block_dim: c_int, data: *const c_void) -> AmgxRc;
    pub fn AMGX_vector_download(vec: VectorHandle, data: *mut c_void) -> AmgxRc;
    pub fn AMGX_vector_get_size(vec: VectorHandle, n: *mut c_int, block_dim: *mut c_int) -> AmgxRc;
    pub fn AMGX_vector_destroy(vec: VectorHandle) -> AmgxRc;

    pub fn AMGX_solver_create(
        slv: *mut SolverHandle,
        rsc: ResourcesHandle,
        mode: AmgxMode,
        cfg: ConfigHandle,
    ) -> AmgxRc;
    pub fn AMGX_solver_setup(slv: SolverHandle, mtx: MatrixHandle) -> AmgxRc;
    pub fn AMGX_solver_solve(slv: SolverHandle, rhs: VectorHandle, sol: VectorHandle) -> AmgxRc;
    pub fn AMGX_solver_get_iterations_number(slv: SolverHandle, n: *mut c_int) -> AmgxRc;
    pub fn AMGX_solver_get_status(slv: SolverHandle, st: *mut AmgxSolveStatus) -> AmgxRc;
    pub fn AMGX_solver_get_iteration_residual(
        slv: SolverHandle,
        it: c_int,
        idx: c_int,
        res: *mut c_double,
    ) -> AmgxRc;
    pub fn AMGX_solver_destroy(slv: SolverHandle) -> AmgxRc;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_values_match_header() {
        assert_eq!(AMGX_MODE_DDDI, 8193);
        // AMGX_mode_hDDI and AMGX_mode_dFFI
        assert_eq!(assemble_mode(0, 0, 0, AMGX_IND_INT), 8192);
        assert_eq!(assemble_mode(AMGX_DEVICE, 1, 1, AMGX_IND_INT), 8465);
    }
}
