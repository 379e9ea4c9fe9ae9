use nalgebra::DVector;

use taskqp_types::{ConstraintForm, ConstraintLevel};

/// Signed magnitude of a constraint violation.
///
/// For inequalities and bounds the slacks are the smallest margins on each
/// side (negative on the violated side); for equalities it is the residual
/// norm.
#[derive(Debug, Clone, PartialEq)]
pub enum ViolationKind {
    Equality { residual: f64 },
    Inequality { lower_slack: f64, upper_slack: f64 },
    Bound { lower_slack: f64, upper_slack: f64 },
}

/// A named post-solve violation report.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintViolation {
    pub name: String,
    pub kind: ViolationKind,
}

/// Receiver for post-solve violation reports. Observational only: reports
/// never alter the solve status or the solution.
pub trait DiagnosticsSink: Send {
    fn report(&mut self, violation: &ConstraintViolation);
}

/// Default sink, emits structured warning records.
#[derive(Debug, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn report(&mut self, violation: &ConstraintViolation) {
        match violation.kind {
            ViolationKind::Equality { residual } => {
                tracing::warn!(
                    constraint = %violation.name,
                    residual,
                    "equality constraint violated"
                );
            }
            ViolationKind::Inequality {
                lower_slack,
                upper_slack,
            } => {
                tracing::warn!(
                    constraint = %violation.name,
                    lower_slack,
                    upper_slack,
                    "inequality constraint violated"
                );
            }
            ViolationKind::Bound {
                lower_slack,
                upper_slack,
            } => {
                tracing::warn!(
                    constraint = %violation.name,
                    lower_slack,
                    upper_slack,
                    "bound constraint violated"
                );
            }
        }
    }
}

/// Re-check every constraint of a level against `x`, reporting each
/// violation through the sink.
pub fn report_violations(
    level: &ConstraintLevel,
    x: &DVector<f64>,
    sink: &mut dyn DiagnosticsSink,
) {
    for (_, constraint) in level.iter() {
        if constraint.check(x) {
            continue;
        }
        let kind = match constraint.form() {
            ConstraintForm::Equality { matrix, target } => ViolationKind::Equality {
                residual: (matrix * x - target).norm(),
            },
            ConstraintForm::Inequality {
                matrix,
                lower,
                upper,
            } => {
                let ax = matrix * x;
                ViolationKind::Inequality {
                    lower_slack: min_lower_slack(&ax, lower),
                    upper_slack: min_upper_slack(&ax, upper),
                }
            }
            ConstraintForm::Bound { lower, upper } => ViolationKind::Bound {
                lower_slack: min_lower_slack(x, lower),
                upper_slack: min_upper_slack(x, upper),
            },
        };
        sink.report(&ConstraintViolation {
            name: constraint.name().to_string(),
            kind,
        });
    }
}

fn min_lower_slack(v: &DVector<f64>, lower: &DVector<f64>) -> f64 {
    v.iter()
        .zip(lower.iter())
        .map(|(&vi, &lo)| vi - lo)
        .fold(f64::INFINITY, f64::min)
}

fn min_upper_slack(v: &DVector<f64>, upper: &DVector<f64>) -> f64 {
    v.iter()
        .zip(upper.iter())
        .map(|(&vi, &hi)| hi - vi)
        .fold(f64::INFINITY, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;
    use taskqp_types::Constraint;

    #[derive(Default)]
    struct CapturingSink {
        reports: Vec<ConstraintViolation>,
    }

    impl DiagnosticsSink for CapturingSink {
        fn report(&mut self, violation: &ConstraintViolation) {
            self.reports.push(violation.clone());
        }
    }

    #[test]
    fn violated_bound_reports_signed_slack() {
        let mut level = ConstraintLevel::new();
        level.push(
            0.0,
            Constraint::bound(
                "box",
                DVector::from_vec(vec![0.0, 0.0]),
                DVector::from_vec(vec![1.0, 1.0]),
            )
            .unwrap(),
        );

        let mut sink = CapturingSink::default();
        report_violations(&level, &DVector::from_vec(vec![1.5, 0.5]), &mut sink);

        assert_eq!(sink.reports.len(), 1);
        assert_eq!(sink.reports[0].name, "box");
        match sink.reports[0].kind {
            ViolationKind::Bound {
                lower_slack,
                upper_slack,
            } => {
                assert!((lower_slack - 0.5).abs() < 1e-12);
                assert!((upper_slack - (-0.5)).abs() < 1e-12);
            }
            ref other => panic!("expected bound violation, got {other:?}"),
        }
    }

    #[test]
    fn violated_equality_reports_residual_norm() {
        let mut level = ConstraintLevel::new();
        level.push(
            0.0,
            Constraint::equality(
                "track",
                DMatrix::identity(2, 2),
                DVector::from_vec(vec![1.0, 1.0]),
            )
            .unwrap(),
        );

        let mut sink = CapturingSink::default();
        report_violations(&level, &DVector::from_vec(vec![1.0, 2.0]), &mut sink);

        assert_eq!(sink.reports.len(), 1);
        match sink.reports[0].kind {
            ViolationKind::Equality { residual } => {
                assert!((residual - 1.0).abs() < 1e-12);
            }
            ref other => panic!("expected equality violation, got {other:?}"),
        }
    }

    #[test]
    fn satisfied_level_reports_nothing() {
        let mut level = ConstraintLevel::new();
        level.push(
            0.0,
            Constraint::bound(
                "box",
                DVector::from_vec(vec![0.0]),
                DVector::from_vec(vec![1.0]),
            )
            .unwrap(),
        );

        let mut sink = CapturingSink::default();
        report_violations(&level, &DVector::from_vec(vec![0.5]), &mut sink);
        assert!(sink.reports.is_empty());
    }
}
