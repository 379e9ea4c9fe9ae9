mod constraint;
mod error;
mod level;
mod problem;

pub use constraint::{Constraint, ConstraintForm, ConstraintKind};
pub use error::{Result, TaskQpError};
pub use level::ConstraintLevel;
pub use problem::HierarchicalProblem;

#[cfg(test)]
mod tests;
