//! Constraint residual formulas (§4.4). One row per scalar residual;
//! `Coincident` contributes two.

use crate::error::SolverError;
use crate::model::VarModel;
use cad_types::ConstraintKind;
use nalgebra::DVector;

fn line(model: &VarModel, x: &DVector<f64>, id: &str) -> Result<(f64, f64, f64, f64), SolverError> {
    model
        .line_endpoints(x, id)
        .ok_or_else(|| SolverError::UnsupportedElement { id: id.to_string(), reason: "not a line".into() })
}

fn point(model: &VarModel, x: &DVector<f64>, id: &str) -> Result<(f64, f64), SolverError> {
    model
        .representative_point(x, id)
        .ok_or_else(|| SolverError::ElementNotFound { id: id.to_string() })
}

/// Number of residual rows a constraint contributes.
pub fn row_count(kind: &ConstraintKind) -> usize {
    match kind {
        ConstraintKind::Coincident { .. } => 2,
        _ => 1,
    }
}

/// Appends the residual rows for a single constraint to `out`.
pub fn push_residuals(
    model: &VarModel,
    x: &DVector<f64>,
    kind: &ConstraintKind,
    out: &mut Vec<f64>,
) -> Result<(), SolverError> {
    match kind {
        ConstraintKind::Length { element, value } => {
            let (x1, y1, x2, y2) = line(model, x, element)?;
            out.push(((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt() - value);
        }
        ConstraintKind::Horizontal { line: id } => {
            let (_, y1, _, y2) = line(model, x, id)?;
            out.push(y2 - y1);
        }
        ConstraintKind::Vertical { line: id } => {
            let (x1, _, x2, _) = line(model, x, id)?;
            out.push(x2 - x1);
        }
        ConstraintKind::Coincident { element_a, element_b } => {
            let (ax, ay) = point(model, x, element_a)?;
            let (bx, by) = point(model, x, element_b)?;
            out.push(ax - bx);
            out.push(ay - by);
        }
        ConstraintKind::Perpendicular { line_a, line_b } => {
            let (ax1, ay1, ax2, ay2) = line(model, x, line_a)?;
            let (bx1, by1, bx2, by2) = line(model, x, line_b)?;
            out.push((ax2 - ax1) * (bx2 - bx1) + (ay2 - ay1) * (by2 - by1));
        }
        ConstraintKind::Parallel { line_a, line_b } => {
            let (ax1, ay1, ax2, ay2) = line(model, x, line_a)?;
            let (bx1, by1, bx2, by2) = line(model, x, line_b)?;
            out.push((ax2 - ax1) * (by2 - by1) - (ay2 - ay1) * (bx2 - bx1));
        }
    }
    Ok(())
}

/// Evaluates the full residual vector for `constraints` at `x`.
pub fn residual_vector(
    model: &VarModel,
    constraints: &[ConstraintKind],
    x: &DVector<f64>,
) -> Result<DVector<f64>, SolverError> {
    let mut out = Vec::with_capacity(constraints.iter().map(row_count).sum());
    for kind in constraints {
        push_residuals(model, x, kind, &mut out)?;
    }
    Ok(DVector::from_vec(out))
}
