use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskQpError {
    #[error("Hierarchy has {0} levels, at most 2 are supported")]
    TooManyLevels(usize),

    #[error("Cost term is not an equality: {0}")]
    NonEqualityCostTerm(String),

    #[error("Constraint {name}: expected {expected} columns, got {got}")]
    DimensionMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error(
        "Problem shape (n={n}, neq={neq}, nin={nin}) does not match solver capacity \
         (n={cap_n}, neq={cap_neq}, nin={cap_nin})"
    )]
    CapacityMismatch {
        n: usize,
        neq: usize,
        nin: usize,
        cap_n: usize,
        cap_neq: usize,
        cap_nin: usize,
    },

    #[error("Invalid constraint {name}: {reason}")]
    InvalidConstraint { name: String, reason: String },

    #[error("Solver error: {0}")]
    SolverError(String),
}

pub type Result<T> = std::result::Result<T, TaskQpError>;
