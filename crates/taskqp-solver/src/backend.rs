use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::canonical::CanonicalQp;
use taskqp_types::Result;

/// Raw status reported by a QP backend.
///
/// `RedundantEqualities` also covers backend-internal numerical failure;
/// the translator maps it to a domain-level error either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QpStatus {
    Optimal,
    Unbounded,
    MaxIterationsReached,
    RedundantEqualities,
}

/// Raw solution data owned by a backend and overwritten on every solve.
///
/// `active_set` uses canonical row numbering: equality rows `0..neq` come
/// first and are always active, active inequality rows follow as `neq + i`
/// where `i` indexes the doubled `ci` block.
#[derive(Debug, Clone)]
pub struct QpSolution {
    pub x: DVector<f64>,
    pub eq_multipliers: DVector<f64>,
    pub ineq_multipliers: DVector<f64>,
    pub active_set: Vec<usize>,
    pub iterations: usize,
    pub objective: f64,
    pub status: QpStatus,
}

impl QpSolution {
    /// Pre-size every field for a fixed problem shape.
    pub fn with_capacity(n: usize, neq: usize, nin: usize) -> Self {
        QpSolution {
            x: DVector::zeros(n),
            eq_multipliers: DVector::zeros(neq),
            ineq_multipliers: DVector::zeros(2 * nin),
            active_set: Vec::with_capacity(neq + 2 * nin),
            iterations: 0,
            objective: 0.0,
            status: QpStatus::RedundantEqualities,
        }
    }
}

/// Contract for the external QP engine, solving
///
/// ```text
/// minimize    0.5 * x^T H x + g^T x
/// subject to  CE x + ce0  = 0
///             CI x + ci0 >= 0
/// ```
///
/// Implementations must not mutate the canonical buffers, must operate on
/// storage sized once for the fixed problem shape, and return a reference to
/// their reused solution buffer (stable until the next `solve_qp` call).
pub trait SolverBackend: Send {
    fn solve_qp(&mut self, qp: &CanonicalQp) -> Result<&QpSolution>;

    /// Propagate a new iteration limit; returns whether it was accepted.
    fn set_max_iterations(&mut self, max_iter: u32) -> bool;
}
