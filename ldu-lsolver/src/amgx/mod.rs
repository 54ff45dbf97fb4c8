//! [`Backend`] implementation over the AmgX shared library.

mod ffi;

use crate::backend::{Backend, BackendError, BackendResult, MatrixUpload, Mode, SolveStatus};
use crate::runtime::Runtime;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_void};
use std::path::Path;
use std::ptr;
use std::sync::{Arc, OnceLock};

macro_rules! handle {
    ($name:ident) => {
        /// Opaque AmgX handle.
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name(*mut c_void);
    };
}

handle!(ConfigHandle);
handle!(ResourcesHandle);
handle!(MatrixHandle);
handle!(VectorHandle);
handle!(SolverHandle);

/// The AmgX library. Its state is process-wide, so the only way to reach
/// it is the single runtime returned by [`Amgx::shared`].
#[derive(Debug)]
pub struct Amgx(());

static SHARED: OnceLock<Arc<Runtime<Amgx>>> = OnceLock::new();

impl Amgx {
    /// The process-wide AmgX runtime. Every call returns the same runtime,
    /// so all sessions share one lease count.
    pub fn shared() -> Arc<Runtime<Amgx>> {
        Arc::clone(SHARED.get_or_init(|| Runtime::new(Amgx(()))))
    }
}

fn error_string(rc: ffi::AmgxRc) -> String {
    let mut buf = [0 as c_char; 256];
    // SAFETY: the buffer length passed matches the buffer.
    let status = unsafe { ffi::AMGX_get_error_string(rc, buf.as_mut_ptr(), buf.len() as c_int) };
    if status != ffi::AMGX_RC_OK {
        return "unknown error".to_string();
    }
    // SAFETY: AmgX writes a NUL-terminated string into the buffer.
    unsafe { CStr::from_ptr(buf.as_ptr()) }
        .to_string_lossy()
        .into_owned()
}

fn check(call: &'static str, rc: ffi::AmgxRc) -> BackendResult<()> {
    if rc == ffi::AMGX_RC_OK {
        Ok(())
    } else {
        Err(BackendError::new(call, rc, error_string(rc)))
    }
}

fn to_c_int(call: &'static str, value: usize) -> BackendResult<c_int> {
    c_int::try_from(value).map_err(|_| {
        BackendError::new(
            call,
            ffi::AMGX_RC_BAD_PARAMETERS,
            format!("{} exceeds the 32-bit range", value),
        )
    })
}

fn to_c_string(call: &'static str, bytes: &[u8]) -> BackendResult<CString> {
    CString::new(bytes).map_err(|_| {
        BackendError::new(call, ffi::AMGX_RC_BAD_PARAMETERS, "argument contains a NUL byte")
    })
}

fn mode_value(mode: Mode) -> ffi::AmgxMode {
    match mode {
        Mode::DeviceDoubleDoubleInt => ffi::AMGX_MODE_DDDI,
    }
}

impl Backend for Amgx {
    type Config = ConfigHandle;
    type Resources = ResourcesHandle;
    type Matrix = MatrixHandle;
    type Vector = VectorHandle;
    type Solver = SolverHandle;

    fn name(&self) -> &'static str {
        "AmgX"
    }

    fn initialize(&self) -> BackendResult<()> {
        check("AMGX_initialize", unsafe { ffi::AMGX_initialize() })
    }

    fn initialize_plugins(&self) -> BackendResult<()> {
        check("AMGX_initialize_plugins", unsafe { ffi::AMGX_initialize_plugins() })
    }

    fn finalize_plugins(&self) -> BackendResult<()> {
        check("AMGX_finalize_plugins", unsafe { ffi::AMGX_finalize_plugins() })
    }

    fn finalize(&self) -> BackendResult<()> {
        check("AMGX_finalize", unsafe { ffi::AMGX_finalize() })
    }

    fn config_create(&self, options: &str) -> BackendResult<ConfigHandle> {
        let options = to_c_string("AMGX_config_create", options.as_bytes())?;
        let mut cfg = ptr::null_mut();
        // SAFETY: `options` outlives the call and `cfg` is a valid out pointer.
        check("AMGX_config_create", unsafe {
            ffi::AMGX_config_create(&mut cfg, options.as_ptr())
        })?;
        Ok(ConfigHandle(cfg))
    }

    fn config_create_from_file(&self, path: &Path) -> BackendResult<ConfigHandle> {
        let path = to_c_string(
            "AMGX_config_create_from_file",
            path.as_os_str().as_encoded_bytes(),
        )?;
        let mut cfg = ptr::null_mut();
        check("AMGX_config_create_from_file", unsafe {
            ffi::AMGX_config_create_from_file(&mut cfg, path.as_ptr())
        })?;
        Ok(ConfigHandle(cfg))
    }

    fn config_destroy(&self, config: ConfigHandle) -> BackendResult<()> {
        check("AMGX_config_destroy", unsafe { ffi::AMGX_config_destroy(config.0) })
    }

    fn resources_create_simple(&self, config: ConfigHandle) -> BackendResult<ResourcesHandle> {
        let mut rsrc = ptr::null_mut();
        check("AMGX_resources_create_simple", unsafe {
            ffi::AMGX_resources_create_simple(&mut rsrc, config.0)
        })?;
        Ok(ResourcesHandle(rsrc))
    }

    fn resources_destroy(&self, resources: ResourcesHandle) -> BackendResult<()> {
        check("AMGX_resources_destroy", unsafe {
            ffi::AMGX_resources_destroy(resources.0)
        })
    }

    fn matrix_create(&self, resources: ResourcesHandle, mode: Mode) -> BackendResult<MatrixHandle> {
        let mut mtx = ptr::null_mut();
        check("AMGX_matrix_create", unsafe {
            ffi::AMGX_matrix_create(&mut mtx, resources.0, mode_value(mode))
        })?;
        Ok(MatrixHandle(mtx))
    }

    fn matrix_upload_all(&self, matrix: MatrixHandle, upload: &MatrixUpload<'_>) -> BackendResult<()> {
        const CALL: &str = "AMGX_matrix_upload_all";
        let block = upload.block_dim_x * upload.block_dim_y;
        if upload.row_ptrs.len() != upload.n + 1
            || upload.col_indices.len() != upload.nnz
            || upload.values.len() != upload.nnz * block
        {
            return Err(BackendError::new(
                CALL,
                ffi::AMGX_RC_BAD_PARAMETERS,
                "array lengths do not match n and nnz",
            ));
        }
        // SAFETY: the arrays were checked against n and nnz above and the
        // diagonal is stored inline, so no separate diagonal array is read.
        check(CALL, unsafe {
            ffi::AMGX_matrix_upload_all(
                matrix.0,
                to_c_int(CALL, upload.n)?,
                to_c_int(CALL, upload.nnz)?,
                to_c_int(CALL, upload.block_dim_x)?,
                to_c_int(CALL, upload.block_dim_y)?,
                upload.row_ptrs.as_ptr(),
                upload.col_indices.as_ptr(),
                upload.values.as_ptr().cast(),
                ptr::null(),
            )
        })
    }

    fn matrix_destroy(&self, matrix: MatrixHandle) -> BackendResult<()> {
        check("AMGX_matrix_destroy", unsafe { ffi::AMGX_matrix_destroy(matrix.0) })
    }

    fn vector_create(&self, resources: ResourcesHandle, mode: Mode) -> BackendResult<VectorHandle> {
        let mut vec = ptr::null_mut();
        check("AMGX_vector_create", unsafe {
            ffi::AMGX_vector_create(&mut vec, resources.0, mode_value(mode))
        })?;
        Ok(VectorHandle(vec))
    }

    fn vector_upload(&self, vector: VectorHandle, block_dim: usize, data: &[f64]) -> BackendResult<()> {
        const CALL: &str = "AMGX_vector_upload";
        if block_dim == 0 || data.len() % block_dim != 0 {
            return Err(BackendError::new(
                CALL,
                ffi::AMGX_RC_BAD_PARAMETERS,
                format!("{} values do not split into blocks of {}", data.len(), block_dim),
            ));
        }
        let n = to_c_int(CALL, data.len() / block_dim)?;
        let block_dim = to_c_int(CALL, block_dim)?;
        check(CALL, unsafe {
            ffi::AMGX_vector_upload(vector.0, n, block_dim, data.as_ptr().cast())
        })
    }

    fn vector_download(&self, vector: VectorHandle, data: &mut [f64]) -> BackendResult<()> {
        const CALL: &str = "AMGX_vector_download";
        let (mut n, mut block_dim): (c_int, c_int) = (0, 0);
        check("AMGX_vector_get_size", unsafe {
            ffi::AMGX_vector_get_size(vector.0, &mut n, &mut block_dim)
        })?;
        let len = usize::try_from(n).unwrap_or(0) * usize::try_from(block_dim).unwrap_or(0);
        if len != data.len() {
            return Err(BackendError::new(
                CALL,
                ffi::AMGX_RC_BAD_PARAMETERS,
                format!("vector holds {} values, buffer holds {}", len, data.len()),
            ));
        }
        // SAFETY: the buffer length equals the vector length checked above.
        check(CALL, unsafe {
            ffi::AMGX_vector_download(vector.0, data.as_mut_ptr().cast())
        })
    }

    fn vector_destroy(&self, vector: VectorHandle) -> BackendResult<()> {
        check("AMGX_vector_destroy", unsafe { ffi::AMGX_vector_destroy(vector.0) })
    }

    fn solver_create(
        &self,
        resources: ResourcesHandle,
        mode: Mode,
        config: ConfigHandle,
    ) -> BackendResult<SolverHandle> {
        let mut slv = ptr::null_mut();
        check("AMGX_solver_create", unsafe {
            ffi::AMGX_solver_create(&mut slv, resources.0, mode_value(mode), config.0)
        })?;
        Ok(SolverHandle(slv))
    }

    fn solver_setup(&self, solver: SolverHandle, matrix: MatrixHandle) -> BackendResult<()> {
        check("AMGX_solver_setup", unsafe {
            ffi::AMGX_solver_setup(solver.0, matrix.0)
        })
    }

    fn solver_solve(
        &self,
        solver: SolverHandle,
        rhs: VectorHandle,
        solution: VectorHandle,
    ) -> BackendResult<()> {
        check("AMGX_solver_solve", unsafe {
            ffi::AMGX_solver_solve(solver.0, rhs.0, solution.0)
        })
    }

    fn solver_iterations(&self, solver: SolverHandle) -> BackendResult<usize> {
        let mut n: c_int = 0;
        check("AMGX_solver_get_iterations_number", unsafe {
            ffi::AMGX_solver_get_iterations_number(solver.0, &mut n)
        })?;
        Ok(usize::try_from(n).unwrap_or(0))
    }

    fn solver_status(&self, solver: SolverHandle) -> BackendResult<SolveStatus> {
        const CALL: &str = "AMGX_solver_get_status";
        let mut status = ffi::AMGX_SOLVE_FAILED;
        check(CALL, unsafe { ffi::AMGX_solver_get_status(solver.0, &mut status) })?;
        match status {
            ffi::AMGX_SOLVE_SUCCESS => Ok(SolveStatus::Success),
            ffi::AMGX_SOLVE_FAILED => Ok(SolveStatus::Failed),
            ffi::AMGX_SOLVE_DIVERGED => Ok(SolveStatus::Diverged),
            other => Err(BackendError::new(
                CALL,
                ffi::AMGX_RC_BAD_PARAMETERS,
                format!("unknown solve status {}", other),
            )),
        }
    }

    /// Reads block 0 of the residual history. Without `store_res_history`
    /// the call fails and no residual is reported.
    fn solver_iteration_residual(
        &self,
        solver: SolverHandle,
        iteration: usize,
    ) -> BackendResult<Option<f64>> {
        let it = to_c_int("AMGX_solver_get_iteration_residual", iteration)?;
        let mut res: f64 = 0.0;
        let rc = unsafe { ffi::AMGX_solver_get_iteration_residual(solver.0, it, 0, &mut res) };
        if rc == ffi::AMGX_RC_OK {
            Ok(Some(res))
        } else {
            log::debug!("No residual history: {}", error_string(rc));
            Ok(None)
        }
    }

    fn solver_destroy(&self, solver: SolverHandle) -> BackendResult<()> {
        check("AMGX_solver_destroy", unsafe { ffi::AMGX_solver_destroy(solver.0) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_runtime_is_unique() {
        let first = Amgx::shared();
        let second = Amgx::shared();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.active_leases(), 0);
    }
}
