//! Joint-acceleration clipping demo
//!
//! A 2-DOF arm wants to accelerate towards a reference of [2, 2] rad/s^2,
//! but the actuators only allow accelerations inside [0, 1]^2. The HQP
//! solver clips the tracking objective against the hard bounds.

use nalgebra::{DMatrix, DVector};
use taskqp_solver::{HqpSolver, SolveStatus};
use taskqp_types::{Constraint, ConstraintLevel, HierarchicalProblem};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let n = 2;

    // Level 0: hard actuation limits 0 <= qdd <= 1
    let mut hard = ConstraintLevel::new();
    hard.push(
        0.0,
        Constraint::bound(
            "acceleration-limits",
            DVector::from_element(n, 0.0),
            DVector::from_element(n, 1.0),
        )?,
    );

    // Level 1: track the reference acceleration [2, 2]
    let mut cost = ConstraintLevel::new();
    cost.push(
        1.0,
        Constraint::equality(
            "reference-tracking",
            DMatrix::identity(n, n),
            DVector::from_element(n, 2.0),
        )?,
    );

    let problem = HierarchicalProblem::with_cost(hard, cost)?;

    let mut solver = HqpSolver::new("reach-clip", n, 0, n);
    solver.solve(&problem)?;
    let output = solver.output();

    println!("status:     {:?}", output.status);
    println!(
        "qdd:        [{:.4}, {:.4}]",
        output.x[0], output.x[1]
    );
    println!("active set: {:?}", output.active_set);
    println!("iterations: {}", output.iterations);
    println!("objective:  {:.6}", solver.objective_value());

    if output.status == SolveStatus::Optimal {
        println!("reference [2, 2] was clipped to the actuation box as expected");
    }

    Ok(())
}
