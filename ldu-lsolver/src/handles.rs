//! Ownership of the backend handles of one solver session.

use crate::backend::{Backend, BackendResult, Mode};
use crate::config::ConfigSource;
use crate::error::Result;
use crate::runtime::{Runtime, RuntimeLease};
use std::sync::Arc;

type Destroy<B, H> = fn(&B, H) -> BackendResult<()>;

/// A backend handle that is destroyed when dropped.
pub(crate) struct Owned<B: Backend, H: Copy> {
    runtime: Arc<Runtime<B>>,
    handle: H,
    destroy: Destroy<B, H>,
    kind: &'static str,
    live: bool,
}

impl<B: Backend, H: Copy> Owned<B, H> {
    fn new(runtime: &Arc<Runtime<B>>, handle: H, destroy: Destroy<B, H>, kind: &'static str) -> Self {
        log::debug!("Created {} handle", kind);
        Self {
            runtime: Arc::clone(runtime),
            handle,
            destroy,
            kind,
            live: true,
        }
    }

    pub(crate) fn get(&self) -> H {
        self.handle
    }

    fn release(mut self) -> BackendResult<()> {
        self.live = false;
        log::debug!("Destroying {} handle", self.kind);
        (self.destroy)(self.runtime.backend(), self.handle)
    }
}

impl<B: Backend, H: Copy> Drop for Owned<B, H> {
    fn drop(&mut self) {
        if self.live {
            log::debug!("Destroying {} handle", self.kind);
            if let Err(e) = (self.destroy)(self.runtime.backend(), self.handle) {
                log::error!("Destroying {} handle failed: {}", self.kind, e);
            }
        }
    }
}

/// Config, resources, matrix, two vectors and solver of one session.
///
/// Fields are declared in release order: dropping the set destroys the
/// solver first and the configuration last, then gives up the runtime.
pub(crate) struct HandleSet<B: Backend> {
    solver: Owned<B, B::Solver>,
    solution: Owned<B, B::Vector>,
    rhs: Owned<B, B::Vector>,
    matrix: Owned<B, B::Matrix>,
    resources: Owned<B, B::Resources>,
    config: Owned<B, B::Config>,
    lease: RuntimeLease<B>,
}

impl<B: Backend> HandleSet<B> {
    /// Runs the acquisition sequence. On failure everything acquired so far
    /// is released in reverse order before the error is returned.
    pub(crate) fn acquire(runtime: &Arc<Runtime<B>>, source: &ConfigSource, mode: Mode) -> Result<Self> {
        let lease = runtime.lease()?;
        let backend = runtime.backend();

        let config = match source {
            ConfigSource::Inline(options) => backend.config_create(options)?,
            ConfigSource::File(path) => {
                log::info!("Reading solver configuration from {}", path.display());
                backend.config_create_from_file(path)?
            }
        };
        let config = Owned::new(runtime, config, B::config_destroy, "config");

        let resources = backend.resources_create_simple(config.get())?;
        let resources = Owned::new(runtime, resources, B::resources_destroy, "resources");

        let matrix = backend.matrix_create(resources.get(), mode)?;
        let matrix = Owned::new(runtime, matrix, B::matrix_destroy, "matrix");

        let rhs = backend.vector_create(resources.get(), mode)?;
        let rhs = Owned::new(runtime, rhs, B::vector_destroy, "rhs vector");

        let solution = backend.vector_create(resources.get(), mode)?;
        let solution = Owned::new(runtime, solution, B::vector_destroy, "solution vector");

        let solver = backend.solver_create(resources.get(), mode, config.get())?;
        let solver = Owned::new(runtime, solver, B::solver_destroy, "solver");

        Ok(Self {
            solver,
            solution,
            rhs,
            matrix,
            resources,
            config,
            lease,
        })
    }

    pub(crate) fn backend(&self) -> &B {
        self.lease.runtime().backend()
    }

    pub(crate) fn solver(&self) -> B::Solver {
        self.solver.get()
    }

    pub(crate) fn solution(&self) -> B::Vector {
        self.solution.get()
    }

    pub(crate) fn rhs(&self) -> B::Vector {
        self.rhs.get()
    }

    pub(crate) fn matrix(&self) -> B::Matrix {
        self.matrix.get()
    }

    /// Destroys every handle in reverse creation order and releases the
    /// runtime. All releases are attempted; the first failure is returned.
    pub(crate) fn release(self) -> BackendResult<()> {
        let HandleSet {
            solver,
            solution,
            rhs,
            matrix,
            resources,
            config,
            lease,
        } = self;
        let results = [
            solver.release(),
            solution.release(),
            rhs.release(),
            matrix.release(),
            resources.release(),
            config.release(),
            lease.release(),
        ];
        results.into_iter().collect()
    }
}
