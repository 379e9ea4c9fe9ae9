mod backend;
mod canonical;
mod clarabel_backend;
mod diagnostics;
mod hqp;

pub use backend::{QpSolution, QpStatus, SolverBackend};
pub use canonical::CanonicalQp;
pub use clarabel_backend::ClarabelBackend;
pub use diagnostics::{
    report_violations, ConstraintViolation, DiagnosticsSink, TracingSink, ViolationKind,
};
pub use hqp::{HqpSolver, SolveOutput, SolveStatus, DEFAULT_HESSIAN_REGULARIZATION};
