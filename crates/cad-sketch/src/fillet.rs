//! Fillet insertion between two lines (§4.2, line-line only in v1).

use crate::error::SketchError;
use cad_geom::{angle_between, line_line_intersection, unit_direction, Point2};
use cad_types::{ElementParams, FilletParams, Sketch, SketchElement, SketchElementKind};

const EPS: f64 = 1e-9;

fn line_endpoints(sketch: &Sketch, id: &str) -> Result<(Point2, Point2), SketchError> {
    let element = sketch.elements.get(id).ok_or_else(|| SketchError::ElementNotFound { id: id.to_string() })?;
    let line = element.as_line().ok_or_else(|| SketchError::NotALine { id: id.to_string() })?;
    Ok((Point2::new(line.x1, line.y1), Point2::new(line.x2, line.y2)))
}

/// Projects `c` onto the infinite line through `p` with unit direction `d`.
fn project_onto_line(c: Point2, p: Point2, d: (f64, f64)) -> Point2 {
    let t = (c.x - p.x) * d.0 + (c.y - p.y) * d.1;
    Point2::new(p.x + t * d.0, p.y + t * d.1)
}

/// The endpoint nearer `i`, and the one farther from it.
fn near_far(i: Point2, p1: Point2, p2: Point2) -> (Point2, Point2, bool) {
    if i.distance_to(&p1) <= i.distance_to(&p2) {
        (p1, p2, true)
    } else {
        (p2, p1, false)
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

/// Inserts a Fillet element joining `line1_id` and `line2_id`, trimming both
/// lines to their tangent points.
pub fn add_fillet(
    sketch: &mut Sketch,
    id: String,
    line1_id: &str,
    line2_id: &str,
    radius: f64,
) -> Result<(), SketchError> {
    if radius <= 0.0 {
        return Err(SketchError::FilletInfeasible { reason: "radius must be positive".into() });
    }
    let (a1, a2) = line_endpoints(sketch, line1_id)?;
    let (b1, b2) = line_endpoints(sketch, line2_id)?;

    let da = unit_direction(a1, a2).ok_or_else(|| SketchError::FilletInfeasible { reason: "line A has zero length".into() })?;
    let db = unit_direction(b1, b2).ok_or_else(|| SketchError::FilletInfeasible { reason: "line B has zero length".into() })?;

    let i = line_line_intersection(a1, da, b1, db).ok_or(SketchError::FilletParallelLines)?;

    let len_a = a1.distance_to(&a2);
    let len_b = b1.distance_to(&b2);
    let t_a = (i.x - a1.x) * da.0 + (i.y - a1.y) * da.1;
    let t_b = (i.x - b1.x) * db.0 + (i.y - b1.y) * db.1;
    if t_a < -EPS || t_a > len_a + EPS {
        return Err(SketchError::FilletInfeasible { reason: "intersection lies outside line A's extension".into() });
    }
    if t_b < -EPS || t_b > len_b + EPS {
        return Err(SketchError::FilletInfeasible { reason: "intersection lies outside line B's extension".into() });
    }

    let (_near_a, far_a, a_near_is_p1) = near_far(i, a1, a2);
    let (_near_b, far_b, b_near_is_p1) = near_far(i, b1, b2);
    let d1 = unit_direction(i, far_a).ok_or_else(|| SketchError::FilletInfeasible { reason: "line A collapses onto the intersection".into() })?;
    let d2 = unit_direction(i, far_b).ok_or_else(|| SketchError::FilletInfeasible { reason: "line B collapses onto the intersection".into() })?;

    let bisector_raw = (d1.0 + d2.0, d1.1 + d2.1);
    let bisector_len = (bisector_raw.0.powi(2) + bisector_raw.1.powi(2)).sqrt();
    if bisector_len < EPS {
        return Err(SketchError::FilletInfeasible { reason: "lines are collinear and opposed".into() });
    }
    let bisector = (bisector_raw.0 / bisector_len, bisector_raw.1 / bisector_len);

    let theta = angle_between(d1, d2);
    let half = theta / 2.0;
    if half.sin().abs() < EPS {
        return Err(SketchError::FilletInfeasible { reason: "lines are nearly collinear".into() });
    }
    let offset = radius / half.sin();
    let center = Point2::new(i.x + bisector.0 * offset, i.y + bisector.1 * offset);

    let foot_a = project_onto_line(center, a1, da);
    let foot_b = project_onto_line(center, b1, db);
    let t1 = tangent_point(center, foot_a, radius)?;
    let t2 = tangent_point(center, foot_b, radius)?;

    if i.distance_to(&t1) > i.distance_to(&far_a) + EPS {
        return Err(SketchError::FilletInfeasible { reason: "fillet radius overshoots line A".into() });
    }
    if i.distance_to(&t2) > i.distance_to(&far_b) + EPS {
        return Err(SketchError::FilletInfeasible { reason: "fillet radius overshoots line B".into() });
    }

    let mut fillet = SketchElement::new(
        id,
        SketchElementKind::Fillet,
        ElementParams::Fillet(FilletParams {
            radius,
            center_x: center.x,
            center_y: center.y,
            tangent1_x: t1.x,
            tangent1_y: t1.y,
            tangent2_x: t2.x,
            tangent2_y: t2.y,
        }),
    );
    fillet.referenced_elements = vec![line1_id.to_string(), line2_id.to_string()];

    replace_near_endpoint(sketch, line1_id, a_near_is_p1, t1);
    replace_near_endpoint(sketch, line2_id, b_near_is_p1, t2);
    sketch.elements.insert(fillet);
    Ok(())
}

fn tangent_point(center: Point2, foot: Point2, r: f64) -> Result<Point2, SketchError> {
    let dir = unit_direction(center, foot).ok_or_else(|| SketchError::FilletInfeasible { reason: "fillet center coincides with a line".into() })?;
    Ok(Point2::new(center.x + dir.0 * r, center.y + dir.1 * r))
}
