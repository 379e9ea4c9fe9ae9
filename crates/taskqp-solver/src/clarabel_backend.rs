use clarabel::algebra::CscMatrix;
use clarabel::solver::{
    DefaultSettings, DefaultSolver, IPSolver, SolverStatus, SupportedConeT,
};

use crate::backend::{QpSolution, QpStatus, SolverBackend};
use crate::canonical::CanonicalQp;
use taskqp_types::{Result, TaskQpError};

/// Bound magnitude passed to Clarabel in place of an infinite offset. The
/// canonical buffers keep the true ±infinity; only the Clarabel copy is
/// clamped, so vacuous doubled rows stay in the fixed layout.
const CLARABEL_INFINITY: f64 = 1e20;

/// An inequality row counts as active when its slack is below this.
const ACTIVE_SLACK_TOLERANCE: f64 = 1e-6;

/// Clarabel-based QP backend (pure Rust).
///
/// The CSC matrices carry a full dense sparsity pattern built once at
/// construction; every solve only rewrites `nzval` and the right-hand side
/// in place, so the pattern, the cone layout and all scratch storage stay
/// fixed for the backend's lifetime.
pub struct ClarabelBackend {
    n: usize,
    neq: usize,
    nin: usize,
    verbose: bool,
    max_iter: u32,
    tol_gap_abs: f64,
    tol_gap_rel: f64,
    p_csc: CscMatrix<f64>,
    a_csc: CscMatrix<f64>,
    q: Vec<f64>,
    b: Vec<f64>,
    cones: Vec<SupportedConeT<f64>>,
    solution: QpSolution,
}

impl ClarabelBackend {
    /// Create a backend for a fixed problem shape with default settings.
    pub fn new(n: usize, neq: usize, nin: usize) -> Self {
        Self::with_params(n, neq, nin, 10_000, 1e-8)
    }

    /// Create a backend with a custom iteration limit and tolerance.
    pub fn with_params(
        n: usize,
        neq: usize,
        nin: usize,
        max_iter: u32,
        tolerance: f64,
    ) -> Self {
        let m = neq + 2 * nin;
        let mut cones = Vec::with_capacity(2);
        if neq > 0 {
            cones.push(SupportedConeT::ZeroConeT(neq));
        }
        if nin > 0 {
            cones.push(SupportedConeT::NonnegativeConeT(2 * nin));
        }
        ClarabelBackend {
            n,
            neq,
            nin,
            verbose: false,
            max_iter,
            tol_gap_abs: tolerance,
            tol_gap_rel: tolerance,
            p_csc: dense_upper_csc(n),
            a_csc: dense_csc(m, n),
            q: vec![0.0; n],
            b: vec![0.0; m],
            cones,
            solution: QpSolution::with_capacity(n, neq, nin),
        }
    }

    /// Rewrite the Clarabel-side problem data from the canonical buffers.
    ///
    /// Clarabel format is `A x + s = b, s in K`; with `A = [CE; -CI]` and
    /// `b = [-ce0; ci0]` the zero-cone block reproduces `CE x + ce0 = 0` and
    /// the nonnegative slack of the remaining block is exactly
    /// `CI x + ci0 >= 0`.
    fn refill(&mut self, qp: &CanonicalQp) {
        let (n, neq, nin2) = (self.n, self.neq, 2 * self.nin);

        let mut idx = 0;
        for j in 0..n {
            for i in 0..=j {
                self.p_csc.nzval[idx] = qp.h[(i, j)];
                idx += 1;
            }
        }

        let mut idx = 0;
        for j in 0..n {
            for i in 0..neq {
                self.a_csc.nzval[idx] = qp.ce[(i, j)];
                idx += 1;
            }
            for i in 0..nin2 {
                self.a_csc.nzval[idx] = -qp.ci[(i, j)];
                idx += 1;
            }
        }

        for i in 0..n {
            self.q[i] = qp.g[i];
        }
        for i in 0..neq {
            self.b[i] = -qp.ce0[i];
        }
        for i in 0..nin2 {
            self.b[neq + i] = qp.ci0[i].clamp(-CLARABEL_INFINITY, CLARABEL_INFINITY);
        }
    }
}

impl SolverBackend for ClarabelBackend {
    fn solve_qp(&mut self, qp: &CanonicalQp) -> Result<&QpSolution> {
        if qp.n() != self.n || qp.neq() != self.neq || qp.nin() != self.nin {
            return Err(TaskQpError::CapacityMismatch {
                n: qp.n(),
                neq: qp.neq(),
                nin: qp.nin(),
                cap_n: self.n,
                cap_neq: self.neq,
                cap_nin: self.nin,
            });
        }
        self.refill(qp);

        let mut settings = DefaultSettings::default();
        settings.verbose = self.verbose;
        settings.max_iter = self.max_iter;
        settings.tol_gap_abs = self.tol_gap_abs;
        settings.tol_gap_rel = self.tol_gap_rel;

        let mut solver = DefaultSolver::new(
            &self.p_csc,
            &self.q,
            &self.a_csc,
            &self.b,
            &self.cones,
            settings,
        );
        solver.solve();

        let status = match solver.solution.status {
            SolverStatus::Solved => QpStatus::Optimal,
            SolverStatus::PrimalInfeasible | SolverStatus::DualInfeasible => {
                QpStatus::Unbounded
            }
            SolverStatus::MaxIterations => QpStatus::MaxIterationsReached,
            _ => QpStatus::RedundantEqualities,
        };

        let (neq, nin2) = (self.neq, 2 * self.nin);
        for i in 0..self.n {
            self.solution.x[i] = solver.solution.x[i];
        }
        for i in 0..neq {
            self.solution.eq_multipliers[i] = solver.solution.z[i];
        }
        for i in 0..nin2 {
            self.solution.ineq_multipliers[i] = solver.solution.z[neq + i];
        }
        self.solution.active_set.clear();
        for i in 0..neq {
            self.solution.active_set.push(i);
        }
        for i in 0..nin2 {
            if solver.solution.s[neq + i].abs() <= ACTIVE_SLACK_TOLERANCE {
                self.solution.active_set.push(neq + i);
            }
        }
        self.solution.iterations = solver.info.iterations as usize;
        self.solution.objective = solver.solution.obj_val;
        self.solution.status = status;
        Ok(&self.solution)
    }

    fn set_max_iterations(&mut self, max_iter: u32) -> bool {
        if max_iter == 0 {
            return false;
        }
        self.max_iter = max_iter;
        true
    }
}

/// Upper-triangular CSC with a full dense pattern (for P).
fn dense_upper_csc(n: usize) -> CscMatrix<f64> {
    let mut colptr = Vec::with_capacity(n + 1);
    let mut rowval = Vec::with_capacity(n * (n + 1) / 2);
    colptr.push(0);
    for j in 0..n {
        for i in 0..=j {
            rowval.push(i);
        }
        colptr.push(rowval.len());
    }
    let nnz = rowval.len();
    CscMatrix {
        m: n,
        n,
        colptr,
        rowval,
        nzval: vec![0.0; nnz],
    }
}

/// CSC with a full dense pattern (for A).
fn dense_csc(m: usize, n: usize) -> CscMatrix<f64> {
    let mut colptr = Vec::with_capacity(n + 1);
    let mut rowval = Vec::with_capacity(m * n);
    colptr.push(0);
    for _ in 0..n {
        for i in 0..m {
            rowval.push(i);
        }
        colptr.push(rowval.len());
    }
    let nnz = rowval.len();
    CscMatrix {
        m,
        n,
        colptr,
        rowval,
        nzval: vec![0.0; nnz],
    }
}
