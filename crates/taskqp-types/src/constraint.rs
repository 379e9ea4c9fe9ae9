use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TaskQpError};

/// Tolerance used by [`Constraint::check`] for post-solve satisfaction
/// tests. Looser than machine precision on purpose: solutions come from an
/// iterative QP solver with tolerances around 1e-8.
const CHECK_TOLERANCE: f64 = 1e-6;

/// Classification tag for the three supported constraint shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintKind {
    Equality,
    Inequality,
    Bound,
}

/// The payload of a constraint, a closed three-way variant.
///
/// `Bound` carries no matrix: it constrains the variable vector directly,
/// i.e. its matrix is implicitly the identity.
#[derive(Debug, Clone)]
pub enum ConstraintForm {
    /// `matrix * x = target`
    Equality {
        matrix: DMatrix<f64>,
        target: DVector<f64>,
    },
    /// `lower <= matrix * x <= upper`, componentwise, bounds possibly infinite
    Inequality {
        matrix: DMatrix<f64>,
        lower: DVector<f64>,
        upper: DVector<f64>,
    },
    /// `lower <= x <= upper`, componentwise, bounds possibly infinite
    Bound {
        lower: DVector<f64>,
        upper: DVector<f64>,
    },
}

/// One linear constraint block, fixed at construction and only read during a
/// solve. Constructors validate internal shape so a `Constraint` value is
/// always well-formed.
#[derive(Debug, Clone)]
pub struct Constraint {
    name: String,
    form: ConstraintForm,
}

impl Constraint {
    /// Equality constraint `matrix * x = target`.
    pub fn equality(
        name: impl Into<String>,
        matrix: DMatrix<f64>,
        target: DVector<f64>,
    ) -> Result<Self> {
        let name = name.into();
        if target.len() != matrix.nrows() {
            return Err(TaskQpError::InvalidConstraint {
                name,
                reason: format!(
                    "target has {} rows, matrix has {}",
                    target.len(),
                    matrix.nrows()
                ),
            });
        }
        Ok(Constraint {
            name,
            form: ConstraintForm::Equality { matrix, target },
        })
    }

    /// Two-sided inequality constraint `lower <= matrix * x <= upper`.
    pub fn inequality(
        name: impl Into<String>,
        matrix: DMatrix<f64>,
        lower: DVector<f64>,
        upper: DVector<f64>,
    ) -> Result<Self> {
        let name = name.into();
        if lower.len() != matrix.nrows() || upper.len() != matrix.nrows() {
            return Err(TaskQpError::InvalidConstraint {
                name,
                reason: format!(
                    "bounds have {}/{} rows, matrix has {}",
                    lower.len(),
                    upper.len(),
                    matrix.nrows()
                ),
            });
        }
        Ok(Constraint {
            name,
            form: ConstraintForm::Inequality {
                matrix,
                lower,
                upper,
            },
        })
    }

    /// Variable bound `lower <= x <= upper`.
    pub fn bound(
        name: impl Into<String>,
        lower: DVector<f64>,
        upper: DVector<f64>,
    ) -> Result<Self> {
        let name = name.into();
        if lower.len() != upper.len() {
            return Err(TaskQpError::InvalidConstraint {
                name,
                reason: format!(
                    "lower bound has {} rows, upper bound has {}",
                    lower.len(),
                    upper.len()
                ),
            });
        }
        Ok(Constraint {
            name,
            form: ConstraintForm::Bound { lower, upper },
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn form(&self) -> &ConstraintForm {
        &self.form
    }

    pub fn kind(&self) -> ConstraintKind {
        match self.form {
            ConstraintForm::Equality { .. } => ConstraintKind::Equality,
            ConstraintForm::Inequality { .. } => ConstraintKind::Inequality,
            ConstraintForm::Bound { .. } => ConstraintKind::Bound,
        }
    }

    pub fn is_equality(&self) -> bool {
        self.kind() == ConstraintKind::Equality
    }

    pub fn is_inequality(&self) -> bool {
        self.kind() == ConstraintKind::Inequality
    }

    pub fn is_bound(&self) -> bool {
        self.kind() == ConstraintKind::Bound
    }

    /// Number of constraint rows.
    pub fn rows(&self) -> usize {
        match &self.form {
            ConstraintForm::Equality { matrix, .. }
            | ConstraintForm::Inequality { matrix, .. } => matrix.nrows(),
            ConstraintForm::Bound { lower, .. } => lower.len(),
        }
    }

    /// Number of variables the constraint acts on.
    pub fn cols(&self) -> usize {
        match &self.form {
            ConstraintForm::Equality { matrix, .. }
            | ConstraintForm::Inequality { matrix, .. } => matrix.ncols(),
            ConstraintForm::Bound { lower, .. } => lower.len(),
        }
    }

    /// Check whether `x` satisfies the constraint within a small tolerance.
    ///
    /// `x.len()` must equal `cols()`; mismatched input reports unsatisfied.
    pub fn check(&self, x: &DVector<f64>) -> bool {
        if x.len() != self.cols() {
            return false;
        }
        match &self.form {
            ConstraintForm::Equality { matrix, target } => {
                let residual = matrix * x - target;
                residual.amax() <= CHECK_TOLERANCE
            }
            ConstraintForm::Inequality {
                matrix,
                lower,
                upper,
            } => {
                let ax = matrix * x;
                within_bounds(&ax, lower, upper)
            }
            ConstraintForm::Bound { lower, upper } => within_bounds(x, lower, upper),
        }
    }
}

fn within_bounds(v: &DVector<f64>, lower: &DVector<f64>, upper: &DVector<f64>) -> bool {
    v.iter()
        .zip(lower.iter().zip(upper.iter()))
        .all(|(&vi, (&lo, &hi))| vi >= lo - CHECK_TOLERANCE && vi <= hi + CHECK_TOLERANCE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_shape_validation() {
        let matrix = DMatrix::identity(2, 3);
        let target = DVector::from_vec(vec![1.0, 2.0, 3.0]); // wrong: 3 rows vs 2
        assert!(Constraint::equality("eq", matrix, target).is_err());

        let matrix = DMatrix::identity(2, 3);
        let target = DVector::from_vec(vec![1.0, 2.0]);
        let c = Constraint::equality("eq", matrix, target).unwrap();
        assert_eq!(c.rows(), 2);
        assert_eq!(c.cols(), 3);
        assert_eq!(c.kind(), ConstraintKind::Equality);
    }

    #[test]
    fn bound_shape_validation() {
        let lower = DVector::from_vec(vec![0.0, 0.0]);
        let upper = DVector::from_vec(vec![1.0]);
        assert!(Constraint::bound("b", lower, upper).is_err());

        let lower = DVector::from_vec(vec![0.0, 0.0]);
        let upper = DVector::from_vec(vec![1.0, 1.0]);
        let c = Constraint::bound("b", lower, upper).unwrap();
        assert_eq!(c.rows(), 2);
        assert_eq!(c.cols(), 2);
        assert!(c.is_bound());
    }

    #[test]
    fn check_equality() {
        let matrix = DMatrix::from_row_slice(1, 2, &[1.0, 1.0]);
        let target = DVector::from_vec(vec![1.0]);
        let c = Constraint::equality("sum", matrix, target).unwrap();

        assert!(c.check(&DVector::from_vec(vec![0.5, 0.5])));
        assert!(!c.check(&DVector::from_vec(vec![1.0, 1.0])));
    }

    #[test]
    fn check_bound_with_infinite_side() {
        let lower = DVector::from_vec(vec![0.0, f64::NEG_INFINITY]);
        let upper = DVector::from_vec(vec![f64::INFINITY, 1.0]);
        let c = Constraint::bound("box", lower, upper).unwrap();

        assert!(c.check(&DVector::from_vec(vec![10.0, -10.0])));
        assert!(!c.check(&DVector::from_vec(vec![-0.1, 0.0])));
        assert!(!c.check(&DVector::from_vec(vec![0.0, 1.1])));
    }

    #[test]
    fn check_rejects_wrong_length() {
        let lower = DVector::from_vec(vec![0.0, 0.0]);
        let upper = DVector::from_vec(vec![1.0, 1.0]);
        let c = Constraint::bound("box", lower, upper).unwrap();
        assert!(!c.check(&DVector::from_vec(vec![0.5])));
    }
}
