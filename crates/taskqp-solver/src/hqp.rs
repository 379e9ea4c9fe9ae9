use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::backend::{QpStatus, SolverBackend};
use crate::canonical::CanonicalQp;
use crate::clarabel_backend::ClarabelBackend;
use crate::diagnostics::{report_violations, DiagnosticsSink, TracingSink};
use taskqp_types::{HierarchicalProblem, Result};

/// Default Hessian diagonal regularization.
pub const DEFAULT_HESSIAN_REGULARIZATION: f64 = 1e-8;

/// Domain-level outcome of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    MaxIterationsReached,
    Error,
}

/// Structured solve result, owned by the solver and overwritten on every
/// call; callers must not retain it across calls.
///
/// `active_set` lists canonical inequality row indices active at the
/// optimum; the always-active equality rows `0..neq` are excluded, so every
/// reported index is `>= neq`. `multipliers[k]` is the Lagrange multiplier
/// of `active_set[k]`. On a non-`Optimal` status only `status` is
/// authoritative; the remaining fields keep their previous contents.
#[derive(Debug, Clone)]
pub struct SolveOutput {
    pub x: DVector<f64>,
    pub status: SolveStatus,
    pub multipliers: Vec<f64>,
    pub active_set: Vec<usize>,
    pub iterations: usize,
}

impl SolveOutput {
    fn with_capacity(n: usize, nin: usize) -> Self {
        SolveOutput {
            x: DVector::zeros(n),
            status: SolveStatus::Error,
            multipliers: Vec::with_capacity(2 * nin),
            active_set: Vec::with_capacity(2 * nin),
            iterations: 0,
        }
    }
}

/// Two-level hierarchical QP solver for a fixed problem shape.
///
/// Owns the canonical buffers, the backend, and the output; `solve`
/// assembles the canonical form, dispatches to the backend, and translates
/// the raw result. Construct once, solve once per control cycle; no buffer
/// is reallocated between calls, and `&mut self` makes the single-owner
/// requirement explicit.
pub struct HqpSolver {
    name: String,
    qp: CanonicalQp,
    backend: Box<dyn SolverBackend>,
    regularization: f64,
    output: SolveOutput,
    objective: f64,
    check_solution: bool,
    sink: Box<dyn DiagnosticsSink>,
}

impl HqpSolver {
    /// Solver with the Clarabel backend for a fixed `(n, neq, nin)` shape.
    pub fn new(name: impl Into<String>, n: usize, neq: usize, nin: usize) -> Self {
        Self::with_backend(name, n, neq, nin, Box::new(ClarabelBackend::new(n, neq, nin)))
    }

    /// Solver with an injected backend.
    pub fn with_backend(
        name: impl Into<String>,
        n: usize,
        neq: usize,
        nin: usize,
        backend: Box<dyn SolverBackend>,
    ) -> Self {
        HqpSolver {
            name: name.into(),
            qp: CanonicalQp::new(n, neq, nin),
            backend,
            regularization: DEFAULT_HESSIAN_REGULARIZATION,
            output: SolveOutput::with_capacity(n, nin),
            objective: 0.0,
            check_solution: cfg!(debug_assertions),
            sink: Box::new(TracingSink),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn n(&self) -> usize {
        self.qp.n()
    }

    pub fn neq(&self) -> usize {
        self.qp.neq()
    }

    pub fn nin(&self) -> usize {
        self.qp.nin()
    }

    pub fn hessian_regularization(&self) -> f64 {
        self.regularization
    }

    pub fn set_hessian_regularization(&mut self, regularization: f64) {
        self.regularization = regularization;
    }

    /// Propagate a new iteration limit to the backend; returns whether the
    /// backend accepted it.
    pub fn set_max_iterations(&mut self, max_iter: u32) -> bool {
        self.backend.set_max_iterations(max_iter)
    }

    /// Enable or disable the post-solve constraint re-check (defaults to
    /// enabled in debug builds).
    pub fn set_check_solution(&mut self, enabled: bool) {
        self.check_solution = enabled;
    }

    /// Redirect violation reports, e.g. to a capturing sink in tests.
    pub fn set_diagnostics_sink(&mut self, sink: Box<dyn DiagnosticsSink>) {
        self.sink = sink;
    }

    /// Objective value achieved by the last solve.
    pub fn objective_value(&self) -> f64 {
        self.objective
    }

    /// Result of the last solve, stable until the next `solve` call.
    pub fn output(&self) -> &SolveOutput {
        &self.output
    }

    /// Assemble the canonical form, run the QP backend, translate the
    /// result. Configuration errors (shape or hierarchy misuse) surface as
    /// `Err`; solver outcomes surface through `SolveOutput::status`.
    pub fn solve(&mut self, problem: &HierarchicalProblem) -> Result<&SolveOutput> {
        self.qp.assemble(problem, self.regularization)?;
        tracing::debug!(
            solver = %self.name,
            n = self.qp.n(),
            neq = self.qp.neq(),
            nin = self.qp.nin(),
            "assembled hierarchical problem"
        );

        let raw = self.backend.solve_qp(&self.qp)?;
        self.objective = raw.objective;
        self.output.iterations = raw.iterations;
        self.output.status = match raw.status {
            QpStatus::Optimal => SolveStatus::Optimal,
            QpStatus::Unbounded => SolveStatus::Infeasible,
            QpStatus::MaxIterationsReached => SolveStatus::MaxIterationsReached,
            QpStatus::RedundantEqualities => SolveStatus::Error,
        };

        if self.output.status == SolveStatus::Optimal {
            self.output.x.copy_from(&raw.x);
            let neq = self.qp.neq();
            self.output.active_set.clear();
            self.output.multipliers.clear();
            for &row in &raw.active_set {
                if row >= neq {
                    self.output.active_set.push(row);
                    self.output.multipliers.push(raw.ineq_multipliers[row - neq]);
                }
            }
            if self.check_solution {
                report_violations(problem.hard_level(), &self.output.x, self.sink.as_mut());
            }
        }

        tracing::debug!(
            solver = %self.name,
            status = ?self.output.status,
            iterations = self.output.iterations,
            "solve finished"
        );
        Ok(&self.output)
    }
}
