use crate::backend::Backend;
use crate::config::{Dictionary, ResidualMode, SolverControls};
use crate::error::Result;
use crate::performance::SolverPerformance;
use crate::runtime::Runtime;
use crate::session::SolverSession;
use ldu_core::LduView;
use std::sync::Arc;

/// Name tag of every [`SolverPerformance`] produced here.
pub const SOLVER_NAME: &str = "amgx";

/// Solves one field's equation on the backend, re-uploading the matrix on
/// every call.
pub struct AmgxSolver<B: Backend> {
    field_name: String,
    controls: SolverControls,
    session: SolverSession<B>,
}

impl<B: Backend> AmgxSolver<B> {
    pub fn new(
        field_name: impl Into<String>,
        runtime: Arc<Runtime<B>>,
        controls: SolverControls,
    ) -> Result<Self> {
        let field_name = field_name.into();
        let session = SolverSession::new(runtime, controls.config_source())?;
        log::info!("AmgX GPU solver initialized for {}", field_name);
        Ok(Self {
            field_name,
            controls,
            session,
        })
    }

    pub fn from_dictionary<D: Dictionary + ?Sized>(
        field_name: impl Into<String>,
        runtime: Arc<Runtime<B>>,
        dict: &D,
    ) -> Result<Self> {
        Self::new(field_name, runtime, SolverControls::from_dictionary(dict)?)
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn controls(&self) -> &SolverControls {
        &self.controls
    }

    pub fn session(&self) -> &SolverSession<B> {
        &self.session
    }

    /// Solves `matrix * psi = source` for component `cmpt`, overwriting `psi`.
    ///
    /// The backend only sees scalar systems, so `cmpt` only tags the log.
    pub fn solve<M>(
        &mut self,
        matrix: &M,
        psi: &mut [f64],
        source: &[f64],
        cmpt: usize,
    ) -> Result<SolverPerformance>
    where
        M: LduView<Value = f64> + ?Sized,
    {
        log::debug!(
            "{}: solving {} component {} on {} cells",
            SOLVER_NAME,
            self.field_name,
            cmpt,
            matrix.size()
        );
        self.session.upload_and_setup(matrix)?;
        let outcome = self.session.solve(psi, source)?;

        let mut performance = SolverPerformance::placeholder(
            SOLVER_NAME,
            &self.field_name,
            self.controls.tolerance,
            outcome.iterations,
            outcome.status,
        );
        if self.controls.residuals == ResidualMode::Backend {
            match self.session.residual_norms()? {
                Some(norms) => {
                    performance.initial_residual = norms.initial;
                    performance.final_residual = norms.last;
                }
                None => log::debug!("Backend kept no residual history, using placeholders"),
            }
        }
        log::info!("{}", performance);
        Ok(performance)
    }
}
