// Comprehensive integration tests for types crate

#[cfg(test)]
mod tests {
    use crate::*;
    use nalgebra::{DMatrix, DVector};

    fn bound01(n: usize) -> Constraint {
        Constraint::bound(
            "box",
            DVector::from_element(n, 0.0),
            DVector::from_element(n, 1.0),
        )
        .unwrap()
    }

    fn tracking(n: usize, target: f64) -> Constraint {
        Constraint::equality(
            "tracking",
            DMatrix::identity(n, n),
            DVector::from_element(n, target),
        )
        .unwrap()
    }

    #[test]
    fn test_level_preserves_order() {
        let mut level = ConstraintLevel::new();
        level.push(1.0, bound01(2));
        level.push(2.0, tracking(2, 1.0));

        let names: Vec<&str> = level.iter().map(|(_, c)| c.name()).collect();
        assert_eq!(names, vec!["box", "tracking"]);
        assert_eq!(level.len(), 2);
        assert!(!level.is_empty());
    }

    #[test]
    fn test_problem_accepts_two_levels() {
        let mut hard = ConstraintLevel::new();
        hard.push(0.0, bound01(2));
        let mut cost = ConstraintLevel::new();
        cost.push(1.0, tracking(2, 2.0));

        let problem = HierarchicalProblem::with_cost(hard, cost).unwrap();
        assert_eq!(problem.hard_level().len(), 1);
        assert_eq!(problem.cost_level().unwrap().len(), 1);
    }

    #[test]
    fn test_problem_rejects_three_levels() {
        let levels = vec![
            ConstraintLevel::new(),
            ConstraintLevel::new(),
            ConstraintLevel::new(),
        ];
        match HierarchicalProblem::from_levels(levels) {
            Err(TaskQpError::TooManyLevels(3)) => {}
            other => panic!("expected TooManyLevels, got {other:?}"),
        }
    }

    #[test]
    fn test_problem_rejects_inequality_cost_term() {
        let hard = ConstraintLevel::new();
        let mut cost = ConstraintLevel::new();
        cost.push(1.0, bound01(2));

        match HierarchicalProblem::with_cost(hard, cost) {
            Err(TaskQpError::NonEqualityCostTerm(name)) => assert_eq!(name, "box"),
            other => panic!("expected NonEqualityCostTerm, got {other:?}"),
        }
    }

    #[test]
    fn test_from_levels_single_level() {
        let mut hard = ConstraintLevel::new();
        hard.push(0.0, bound01(3));
        let problem = HierarchicalProblem::from_levels(vec![hard]).unwrap();
        assert_eq!(problem.hard_level().len(), 1);
        assert!(problem.cost_level().is_none());
    }

    #[test]
    fn test_from_levels_empty() {
        let problem = HierarchicalProblem::from_levels(vec![]).unwrap();
        assert!(problem.hard_level().is_empty());
        assert!(problem.cost_level().is_none());
    }

    #[test]
    fn test_kind_serialization_roundtrip() {
        for kind in [
            ConstraintKind::Equality,
            ConstraintKind::Inequality,
            ConstraintKind::Bound,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            let back: ConstraintKind = serde_json::from_str(&json).unwrap();
            assert_eq!(kind, back);
        }
    }

    #[test]
    fn test_error_messages_name_the_offender() {
        let err = TaskQpError::DimensionMismatch {
            name: "contact".to_string(),
            expected: 6,
            got: 4,
        };
        let msg = err.to_string();
        assert!(msg.contains("contact"));
        assert!(msg.contains('6'));
        assert!(msg.contains('4'));
    }
}
