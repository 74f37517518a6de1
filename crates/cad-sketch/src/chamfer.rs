//! Chamfer insertion between two lines (§4.2): same corner-finding as
//! fillet, but the trimmed lines are joined by a straight Line element
//! instead of an arc.

use crate::error::SketchError;
use cad_geom::{line_line_intersection, unit_direction, Point2};
use cad_types::{ElementParams, LineParams, Sketch, SketchElement, SketchElementKind};

const EPS: f64 = 1e-9;

fn line_endpoints(sketch: &Sketch, id: &str) -> Result<(Point2, Point2), SketchError> {
    let element = sketch.elements.get(id).ok_or_else(|| SketchError::ElementNotFound { id: id.to_string() })?;
    let line = element.as_line().ok_or_else(|| SketchError::NotALine { id: id.to_string() })?;
    Ok((Point2::new(line.x1, line.y1), Point2::new(line.x2, line.y2)))
}

fn near_far(i: Point2, p1: Point2, p2: Point2) -> (Point2, bool) {
    if i.distance_to(&p1) <= i.distance_to(&p2) {
        (p2, true)
    } else {
        (p1, false)
    }
}

fn replace_near_endpoint(sketch: &mut Sketch, id: &str, near_is_p1: bool, replacement: Point2) {
    let element = sketch.elements.get_mut(id).unwrap();
    let line = element.as_line_mut().unwrap();
    if near_is_p1 {
        line.x1 = replacement.x;
        line.y1 = replacement.y;
    } else {
        line.x2 = replacement.x;
        line.y2 = replacement.y;
    }
}

/// Inserts a Chamfer (a Line element) joining `line1_id` and `line2_id` at
/// distance `d` from their intersection, trimming both referenced lines.
pub fn add_chamfer(
    sketch: &mut Sketch,
    id: String,
    line1_id: &str,
    line2_id: &str,
    distance: f64,
) -> Result<(), SketchError> {
    if distance <= 0.0 {
        return Err(SketchError::ChamferInfeasible { reason: "distance must be positive".into() });
    }
    let (a1, a2) = line_endpoints(sketch, line1_id)?;
    let (b1, b2) = line_endpoints(sketch, line2_id)?;

    let da = unit_direction(a1, a2).ok_or_else(|| SketchError::ChamferInfeasible { reason: "line A has zero length".into() })?;
    let db = unit_direction(b1, b2).ok_or_else(|| SketchError::ChamferInfeasible { reason: "line B has zero length".into() })?;

    let i = line_line_intersection(a1, da, b1, db).ok_or(SketchError::FilletParallelLines)?;

    let (far_a, a_near_is_p1) = near_far(i, a1, a2);
    let (far_b, b_near_is_p1) = near_far(i, b1, b2);

    if i.distance_to(&far_a) < distance - EPS {
        return Err(SketchError::ChamferInfeasible { reason: "distance exceeds line A's far endpoint".into() });
    }
    if i.distance_to(&far_b) < distance - EPS {
        return Err(SketchError::ChamferInfeasible { reason: "distance exceeds line B's far endpoint".into() });
    }

    let d1 = unit_direction(i, far_a).ok_or_else(|| SketchError::ChamferInfeasible { reason: "line A collapses onto the intersection".into() })?;
    let d2 = unit_direction(i, far_b).ok_or_else(|| SketchError::ChamferInfeasible { reason: "line B collapses onto the intersection".into() })?;

    let t1 = Point2::new(i.x + d1.0 * distance, i.y + d1.1 * distance);
    let t2 = Point2::new(i.x + d2.0 * distance, i.y + d2.1 * distance);

    let mut chamfer = SketchElement::new(
        id,
        SketchElementKind::Chamfer,
        ElementParams::Line(LineParams { x1: t1.x, y1: t1.y, x2: t2.x, y2: t2.y }),
    );
    chamfer.referenced_elements = vec![line1_id.to_string(), line2_id.to_string()];

    replace_near_endpoint(sketch, line1_id, a_near_is_p1, t1);
    replace_near_endpoint(sketch, line2_id, b_near_is_p1, t2);
    sketch.elements.insert(chamfer);
    Ok(())
}
