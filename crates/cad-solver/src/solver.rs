//! Newton-Raphson constraint solver (§4.4): forward-difference Jacobian,
//! damped steps, SVD pseudoinverse for under/over-determined systems.

use crate::error::SolverError;
use crate::model::VarModel;
use crate::residuals::residual_vector;
use cad_types::{CancelToken, ConstraintKind, Sketch};
use nalgebra::DMatrix;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub max_iterations: usize,
    /// Convergence threshold on `||r||_inf`.
    pub residual_tol: f64,
    /// Convergence threshold on `||Δx||_inf`.
    pub step_tol: f64,
    /// Minimum damping factor before a step is abandoned.
    pub min_damping: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self { max_iterations: 50, residual_tol: 1e-8, step_tol: 1e-10, min_damping: 1e-6 }
    }
}

#[derive(Debug, Clone)]
pub struct SolveReport {
    pub iterations: usize,
    pub residual_inf: f64,
}

fn inf_norm(v: &nalgebra::DVector<f64>) -> f64 {
    v.iter().fold(0.0_f64, |acc, &e| acc.max(e.abs()))
}

fn jacobian(
    model: &VarModel,
    constraints: &[ConstraintKind],
    x: &nalgebra::DVector<f64>,
    r0: &nalgebra::DVector<f64>,
) -> Result<DMatrix<f64>, SolverError> {
    let n = x.len();
    let m = r0.len();
    let mut j = DMatrix::zeros(m, n);
    for col in 0..n {
        let step = (1e-6_f64).max(1e-6 * x[col].abs());
        let mut xp = x.clone();
        xp[col] += step;
        let rp = residual_vector(model, constraints, &xp)?;
        for row in 0..m {
            j[(row, col)] = (rp[row] - r0[row]) / step;
        }
    }
    Ok(j)
}

/// Solves `constraints` against `sketch`'s current geometry. On success the
/// sketch is updated in place; on failure (including cancellation) the
/// geometry is left untouched.
pub fn solve_sketch(
    sketch: &mut Sketch,
    constraints: &[ConstraintKind],
    config: &SolverConfig,
    cancel: &CancelToken,
) -> Result<SolveReport, SolverError> {
    let model = VarModel::build(sketch);
    if constraints.is_empty() {
        return Ok(SolveReport { iterations: 0, residual_inf: 0.0 });
    }

    let mut x = model.x.clone();
    let mut r = residual_vector(&model, constraints, &x)?;
    let m = r.len();
    let n = x.len();

    for iteration in 0..config.max_iterations {
        if cancel.is_cancelled() {
            debug!(iteration, "constraint solver cancelled");
            return Err(SolverError::Cancelled);
        }
        let r_inf = inf_norm(&r);
        if r_inf < config.residual_tol {
            debug!(iteration, residual_inf = r_inf, "constraint solver converged on residual");
            model.write_back(sketch, &x);
            return Ok(SolveReport { iterations: iteration, residual_inf: r_inf });
        }

        let j = jacobian(&model, constraints, &x, &r)?;
        let pinv = j.clone().pseudo_inverse(1e-10).map_err(|_| SolverError::ConstraintInconsistent { residual_inf: r_inf })?;
        let delta = -(&pinv * &r);

        let mut alpha = 1.0_f64;
        let (mut x_new, mut r_new) = step(&model, constraints, &x, &delta, alpha)?;
        while inf_norm(&r_new) >= r_inf && alpha > config.min_damping {
            alpha /= 2.0;
            let (xn, rn) = step(&model, constraints, &x, &delta, alpha)?;
            x_new = xn;
            r_new = rn;
        }

        let step_inf = (alpha * delta.iter().fold(0.0_f64, |acc, &e| acc.max(e.abs()))).abs();
        x = x_new;
        r = r_new;
        if step_inf < config.step_tol {
            let r_inf = inf_norm(&r);
            debug!(iteration, step_inf, residual_inf = r_inf, "constraint solver converged on step size");
            model.write_back(sketch, &x);
            return Ok(SolveReport { iterations: iteration + 1, residual_inf: r_inf });
        }
    }

    let r_inf = inf_norm(&r);
    if m > n {
        Err(SolverError::ConstraintInconsistent { residual_inf: r_inf })
    } else {
        Err(SolverError::ConstraintUnsolved { iterations: config.max_iterations, residual_inf: r_inf })
    }
}

fn step(
    model: &VarModel,
    constraints: &[ConstraintKind],
    x: &nalgebra::DVector<f64>,
    delta: &nalgebra::DVector<f64>,
    alpha: f64,
) -> Result<(nalgebra::DVector<f64>, nalgebra::DVector<f64>), SolverError> {
    let x_new = x + delta * alpha;
    let r_new = residual_vector(model, constraints, &x_new)?;
    Ok((x_new, r_new))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cad_types::{ElementParams, LineParams, SketchElement, SketchElementKind};

    #[test]
    fn length_constraint_converges_to_target() {
        let mut sketch = Sketch::new("s".into(), "p".into());
        sketch.elements.insert(SketchElement::new(
            "l".into(),
            SketchElementKind::Line,
            ElementParams::Line(LineParams { x1: 0.0, y1: 0.0, x2: 3.0, y2: 0.0 }),
        ));
        let constraints = vec![ConstraintKind::Length { element: "l".into(), value: 10.0 }];
        let report = solve_sketch(&mut sketch, &constraints, &SolverConfig::default(), &CancelToken::new()).unwrap();
        assert!(report.residual_inf < 1e-6);
        let l = sketch.elements.get("l").unwrap().as_line().unwrap();
        let len = ((l.x2 - l.x1).powi(2) + (l.y2 - l.y1).powi(2)).sqrt();
        assert!((len - 10.0).abs() < 1e-6);
    }

    #[test]
    fn horizontal_and_vertical_together() {
        let mut sketch = Sketch::new("s".into(), "p".into());
        sketch.elements.insert(SketchElement::new(
            "a".into(),
            SketchElementKind::Line,
            ElementParams::Line(LineParams { x1: 0.0, y1: 0.0, x2: 5.0, y2: 0.3 }),
        ));
        sketch.elements.insert(SketchElement::new(
            "b".into(),
            SketchElementKind::Line,
            ElementParams::Line(LineParams { x1: 5.0, y1: 0.3, x2: 5.2, y2: 8.0 }),
        ));
        let constraints = vec![
            ConstraintKind::Horizontal { line: "a".into() },
            ConstraintKind::Vertical { line: "b".into() },
        ];
        solve_sketch(&mut sketch, &constraints, &SolverConfig::default(), &CancelToken::new()).unwrap();
        let a = sketch.elements.get("a").unwrap().as_line().unwrap();
        let b = sketch.elements.get("b").unwrap().as_line().unwrap();
        assert!((a.y2 - a.y1).abs() < 1e-6);
        assert!((b.x2 - b.x1).abs() < 1e-6);
        // The shared endpoint must have moved consistently for both lines.
        assert!((a.x2 - b.x1).abs() < 1e-9);
        assert!((a.y2 - b.y1).abs() < 1e-9);
    }

    #[test]
    fn inconsistent_constraints_are_reported() {
        let mut sketch = Sketch::new("s".into(), "p".into());
        sketch.elements.insert(SketchElement::new(
            "l".into(),
            SketchElementKind::Line,
            ElementParams::Line(LineParams { x1: 0.0, y1: 0.0, x2: 3.0, y2: 0.0 }),
        ));
        // Horizontal + Vertical force the line to collapse to a point, which
        // can never also satisfy a positive Length target.
        let constraints = vec![
            ConstraintKind::Horizontal { line: "l".into() },
            ConstraintKind::Vertical { line: "l".into() },
            ConstraintKind::Length { element: "l".into(), value: 10.0 },
        ];
        let err = solve_sketch(&mut sketch, &constraints, &SolverConfig::default(), &CancelToken::new());
        assert!(err.is_err());
        // Geometry must be untouched on failure.
        let l = sketch.elements.get("l").unwrap().as_line().unwrap();
        assert_eq!(l.x2, 3.0);
    }

    #[test]
    fn pre_cancelled_token_aborts_before_any_mutation() {
        let mut sketch = Sketch::new("s".into(), "p".into());
        sketch.elements.insert(SketchElement::new(
            "l".into(),
            SketchElementKind::Line,
            ElementParams::Line(LineParams { x1: 0.0, y1: 0.0, x2: 3.0, y2: 0.0 }),
        ));
        let constraints = vec![ConstraintKind::Length { element: "l".into(), value: 10.0 }];
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = solve_sketch(&mut sketch, &constraints, &SolverConfig::default(), &cancel);
        assert!(matches!(err, Err(SolverError::Cancelled)));
        let l = sketch.elements.get("l").unwrap().as_line().unwrap();
        assert_eq!(l.x2, 3.0);
    }
}
