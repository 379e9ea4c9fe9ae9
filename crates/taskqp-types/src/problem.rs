use crate::error::{Result, TaskQpError};
use crate::level::ConstraintLevel;

/// A two-level prioritized problem: level 0 holds hard constraints
/// (equality, inequality, bound), level 1 holds the weighted least-squares
/// objective built from equality-kind terms only.
///
/// The constructors are the only way to build a value, so a
/// `HierarchicalProblem` is well-formed by construction: never more than two
/// levels, never a non-equality term at the cost level.
#[derive(Debug, Clone)]
pub struct HierarchicalProblem {
    hard: ConstraintLevel,
    cost: Option<ConstraintLevel>,
}

impl HierarchicalProblem {
    /// Hard constraints only, no objective beyond regularization.
    pub fn new(hard: ConstraintLevel) -> Self {
        HierarchicalProblem { hard, cost: None }
    }

    /// Hard constraints plus a weighted least-squares cost level.
    pub fn with_cost(hard: ConstraintLevel, cost: ConstraintLevel) -> Result<Self> {
        validate_cost_level(&cost)?;
        Ok(HierarchicalProblem {
            hard,
            cost: Some(cost),
        })
    }

    /// Build from an ordered sequence of levels, rejecting depth > 2.
    pub fn from_levels(levels: Vec<ConstraintLevel>) -> Result<Self> {
        if levels.len() > 2 {
            return Err(TaskQpError::TooManyLevels(levels.len()));
        }
        let mut it = levels.into_iter();
        let hard = it.next().unwrap_or_default();
        match it.next() {
            Some(cost) => Self::with_cost(hard, cost),
            None => Ok(Self::new(hard)),
        }
    }

    pub fn hard_level(&self) -> &ConstraintLevel {
        &self.hard
    }

    pub fn cost_level(&self) -> Option<&ConstraintLevel> {
        self.cost.as_ref()
    }
}

fn validate_cost_level(cost: &ConstraintLevel) -> Result<()> {
    for (_, constraint) in cost.iter() {
        if !constraint.is_equality() {
            return Err(TaskQpError::NonEqualityCostTerm(
                constraint.name().to_string(),
            ));
        }
    }
    Ok(())
}
