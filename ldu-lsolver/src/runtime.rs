use crate::backend::{Backend, BackendResult};
use crate::error::{LsolverError, Result};
use std::sync::{Arc, Mutex, PoisonError};

/// Process-wide library state of a backend, shared by all sessions.
///
/// The library is initialized when the first session leases the runtime and
/// shut down when the last lease is released, so sessions with overlapping
/// lifetimes never double-initialize or finalize under each other.
#[derive(Debug)]
pub struct Runtime<B: Backend> {
    backend: B,
    leases: Mutex<usize>,
}

impl<B: Backend> Runtime<B> {
    pub fn new(backend: B) -> Arc<Self> {
        Arc::new(Self {
            backend,
            leases: Mutex::new(0),
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Number of sessions currently holding the runtime.
    pub fn active_leases(&self) -> usize {
        *self.leases.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn lease(self: &Arc<Self>) -> Result<RuntimeLease<B>> {
        let mut leases = self
            .leases
            .lock()
            .map_err(|_| LsolverError::RuntimePoisoned)?;
        if *leases == 0 {
            log::info!("Initializing {} runtime", self.backend.name());
            self.backend.initialize()?;
            if let Err(e) = self.backend.initialize_plugins() {
                if let Err(fin) = self.backend.finalize() {
                    log::error!("Rolling back {} runtime failed: {}", self.backend.name(), fin);
                }
                return Err(e.into());
            }
        }
        *leases += 1;
        log::debug!("{} runtime leases: {}", self.backend.name(), *leases);
        Ok(RuntimeLease {
            runtime: Arc::clone(self),
            active: true,
        })
    }

    fn release(&self) -> BackendResult<()> {
        let mut leases = self.leases.lock().unwrap_or_else(PoisonError::into_inner);
        *leases = leases.saturating_sub(1);
        log::debug!("{} runtime leases: {}", self.backend.name(), *leases);
        if *leases > 0 {
            return Ok(());
        }
        log::info!("Shutting down {} runtime", self.backend.name());
        let plugins = self.backend.finalize_plugins();
        let library = self.backend.finalize();
        plugins.and(library)
    }
}

/// One session's hold on the runtime. Released on drop.
#[derive(Debug)]
pub(crate) struct RuntimeLease<B: Backend> {
    runtime: Arc<Runtime<B>>,
    active: bool,
}

impl<B: Backend> RuntimeLease<B> {
    pub(crate) fn runtime(&self) -> &Arc<Runtime<B>> {
        &self.runtime
    }

    pub(crate) fn release(mut self) -> BackendResult<()> {
        self.active = false;
        self.runtime.release()
    }
}

impl<B: Backend> Drop for RuntimeLease<B> {
    fn drop(&mut self) {
        if self.active {
            if let Err(e) = self.runtime.release() {
                log::error!("Releasing {} runtime failed: {}", self.runtime.backend.name(), e);
            }
        }
    }
}
