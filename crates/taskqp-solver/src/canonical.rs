use nalgebra::{DMatrix, DVector};

use taskqp_types::{ConstraintForm, ConstraintLevel, HierarchicalProblem, Result, TaskQpError};

/// Dense QP buffers in the canonical form
///
/// ```text
/// minimize    0.5 * x^T H x + g^T x
/// subject to  CE x + ce0  = 0
///             CI x + ci0 >= 0
/// ```
///
/// All buffers are sized once at construction from the fixed problem shape
/// `(n, neq, nin)` and are overwritten in place on every [`assemble`] call;
/// they are never resized or reallocated. `ci`/`ci0` hold two rows per
/// inequality row (lower-bound side, then negated upper-bound side), so
/// their row count is `2 * nin`.
///
/// [`assemble`]: CanonicalQp::assemble
#[derive(Debug, Clone)]
pub struct CanonicalQp {
    /// Hessian H (n x n, symmetric)
    pub h: DMatrix<f64>,
    /// Gradient g (n)
    pub g: DVector<f64>,
    /// Equality matrix CE (neq x n)
    pub ce: DMatrix<f64>,
    /// Equality offset ce0 (neq), encodes CE x = -ce0
    pub ce0: DVector<f64>,
    /// Inequality matrix CI (2*nin x n)
    pub ci: DMatrix<f64>,
    /// Inequality offset ci0 (2*nin), encodes CI x >= -ci0
    pub ci0: DVector<f64>,
}

impl CanonicalQp {
    /// Allocate buffers for a fixed problem shape.
    pub fn new(n: usize, neq: usize, nin: usize) -> Self {
        CanonicalQp {
            h: DMatrix::zeros(n, n),
            g: DVector::zeros(n),
            ce: DMatrix::zeros(neq, n),
            ce0: DVector::zeros(neq),
            ci: DMatrix::zeros(2 * nin, n),
            ci0: DVector::zeros(2 * nin),
        }
    }

    /// Variable count n.
    pub fn n(&self) -> usize {
        self.h.ncols()
    }

    /// Equality row capacity neq.
    pub fn neq(&self) -> usize {
        self.ce.nrows()
    }

    /// Inequality row capacity nin (before doubling).
    pub fn nin(&self) -> usize {
        self.ci.nrows() / 2
    }

    /// Populate every buffer from a hierarchical problem.
    ///
    /// The hard level must match the fixed `(n, neq, nin)` shape exactly;
    /// the cost level accumulates the weighted normal equations into `h`/`g`,
    /// and `regularization` is added to the Hessian diagonal unconditionally
    /// so `h` stays positive definite even without cost terms.
    pub fn assemble(
        &mut self,
        problem: &HierarchicalProblem,
        regularization: f64,
    ) -> Result<()> {
        self.assemble_hard(problem.hard_level())?;
        self.assemble_cost(problem.cost_level(), regularization)
    }

    fn assemble_hard(&mut self, level: &ConstraintLevel) -> Result<()> {
        let cap_n = self.n();
        let cap_neq = self.neq();
        let cap_nin = self.nin();

        // Sizing pass: the variable count comes from the first constraint,
        // every other constraint in the level must agree.
        let n = match level.iter().next() {
            Some((_, first)) => first.cols(),
            None => cap_n,
        };
        let mut neq = 0;
        let mut nin = 0;
        for (_, constraint) in level.iter() {
            if constraint.cols() != n {
                return Err(TaskQpError::DimensionMismatch {
                    name: constraint.name().to_string(),
                    expected: n,
                    got: constraint.cols(),
                });
            }
            if constraint.is_equality() {
                neq += constraint.rows();
            } else {
                nin += constraint.rows();
            }
        }
        if n != cap_n || neq != cap_neq || nin != cap_nin {
            return Err(TaskQpError::CapacityMismatch {
                n,
                neq,
                nin,
                cap_n,
                cap_neq,
                cap_nin,
            });
        }

        // Fill pass. Buffers are cleared first so rows written sparsely
        // (bound identity blocks) never keep entries from a previous solve.
        self.ce.fill(0.0);
        self.ce0.fill(0.0);
        self.ci.fill(0.0);
        self.ci0.fill(0.0);

        let mut i_eq = 0;
        let mut i_in = 0;
        for (_, constraint) in level.iter() {
            let rows = constraint.rows();
            match constraint.form() {
                ConstraintForm::Equality { matrix, target } => {
                    self.ce.rows_mut(i_eq, rows).copy_from(matrix);
                    for k in 0..rows {
                        self.ce0[i_eq + k] = -target[k];
                    }
                    i_eq += rows;
                }
                ConstraintForm::Inequality {
                    matrix,
                    lower,
                    upper,
                } => {
                    // matrix * x >= lower
                    self.ci.rows_mut(i_in, rows).copy_from(matrix);
                    for k in 0..rows {
                        self.ci0[i_in + k] = -lower[k];
                    }
                    i_in += rows;
                    // -matrix * x >= -upper
                    for i in 0..rows {
                        for j in 0..n {
                            self.ci[(i_in + i, j)] = -matrix[(i, j)];
                        }
                    }
                    for k in 0..rows {
                        self.ci0[i_in + k] = upper[k];
                    }
                    i_in += rows;
                }
                ConstraintForm::Bound { lower, upper } => {
                    // identity block: x >= lower, then -x >= -upper
                    for k in 0..rows {
                        self.ci[(i_in + k, k)] = 1.0;
                        self.ci0[i_in + k] = -lower[k];
                    }
                    i_in += rows;
                    for k in 0..rows {
                        self.ci[(i_in + k, k)] = -1.0;
                        self.ci0[i_in + k] = upper[k];
                    }
                    i_in += rows;
                }
            }
        }
        Ok(())
    }

    fn assemble_cost(
        &mut self,
        cost: Option<&ConstraintLevel>,
        regularization: f64,
    ) -> Result<()> {
        let n = self.n();
        self.h.fill(0.0);
        self.g.fill(0.0);

        if let Some(level) = cost {
            for (weight, constraint) in level.iter() {
                match constraint.form() {
                    ConstraintForm::Equality { matrix, target } => {
                        if matrix.ncols() != n {
                            return Err(TaskQpError::DimensionMismatch {
                                name: constraint.name().to_string(),
                                expected: n,
                                got: matrix.ncols(),
                            });
                        }
                        // Normal equations of w * ||A x - b||^2:
                        // h += w * A^T A, g -= w * A^T b, in place.
                        self.h.gemm_tr(*weight, matrix, matrix, 1.0);
                        self.g.gemv_tr(-*weight, matrix, target, 1.0);
                    }
                    _ => {
                        return Err(TaskQpError::NonEqualityCostTerm(
                            constraint.name().to_string(),
                        ))
                    }
                }
            }
        }

        for i in 0..n {
            self.h[(i, i)] += regularization;
        }
        Ok(())
    }
}
