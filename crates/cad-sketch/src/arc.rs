//! Arc construction rules (§4.3). The sweep angles are always derived from
//! the stored endpoints — never hard-coded to `[0, pi]` (§9 Open Question 1).

use crate::error::SketchError;
use cad_types::ArcParams;
use std::f64::consts::PI;

const EPS: f64 = 1e-9;

fn normalize_angle(a: f64) -> f64 {
    let two_pi = 2.0 * PI;
    let mut a = a % two_pi;
    if a < 0.0 {
        a += two_pi;
    }
    a
}

/// Circle through three non-collinear points, returning `(center, radius)`.
fn circumcircle(
    (ax, ay): (f64, f64),
    (bx, by): (f64, f64),
    (cx, cy): (f64, f64),
) -> Result<((f64, f64), f64), SketchError> {
    let d = 2.0 * (ax * (by - cy) + bx * (cy - ay) + cx * (ay - by));
    if d.abs() < EPS {
        return Err(SketchError::ArcInfeasible { reason: "three points are collinear".into() });
    }
    let a2 = ax * ax + ay * ay;
    let b2 = bx * bx + by * by;
    let c2 = cx * cx + cy * cy;
    let ux = (a2 * (by - cy) + b2 * (cy - ay) + c2 * (ay - by)) / d;
    let uy = (a2 * (cx - bx) + b2 * (ax - cx) + c2 * (bx - ax)) / d;
    let r = ((ax - ux).powi(2) + (ay - uy).powi(2)).sqrt();
    Ok(((ux, uy), r))
}

/// Three-point arc: the unique circle through the three points, swept from
/// start to end passing through the midpoint.
pub fn arc_from_three_points(
    x1: f64,
    y1: f64,
    xm: f64,
    ym: f64,
    x2: f64,
    y2: f64,
) -> Result<ArcParams, SketchError> {
    let ((cx, cy), r) = circumcircle((x1, y1), (xm, ym), (x2, y2))?;

    let a1 = normalize_angle((y1 - cy).atan2(x1 - cx));
    let am = normalize_angle((ym - cy).atan2(xm - cx));
    let a2 = normalize_angle((y2 - cy).atan2(x2 - cx));

    let ccw_span = normalize_angle(a2 - a1);
    let am_rel = normalize_angle(am - a1);

    let (theta_start, theta_end) = if am_rel <= ccw_span + EPS {
        (a1, a1 + ccw_span)
    } else {
        let cw_span = normalize_angle(a1 - a2);
        (a1, a1 - cw_span)
    };

    Ok(ArcParams { cx, cy, r, x1, y1, x2, y2, theta_start, theta_end })
}

/// Endpoints + radius arc. Of the two circles through `(x1,y1)` and
/// `(x2,y2)` with radius `r`, the minor arc (sweep < pi) is always used —
/// feasible exactly when `r` strictly exceeds half the chord length.
pub fn arc_from_endpoints_radius(
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    r: f64,
) -> Result<ArcParams, SketchError> {
    let dx = x2 - x1;
    let dy = y2 - y1;
    let chord = (dx * dx + dy * dy).sqrt();
    if chord < EPS {
        return Err(SketchError::ArcInfeasible { reason: "endpoints coincide".into() });
    }
    if r <= chord / 2.0 + EPS {
        return Err(SketchError::ArcInfeasible {
            reason: format!("radius {r} does not exceed half the chord length {}", chord / 2.0),
        });
    }
    let h = (r * r - (chord / 2.0).powi(2)).sqrt();
    let mx = (x1 + x2) / 2.0;
    let my = (y1 + y2) / 2.0;
    // Left-hand perpendicular of (dx,dy), normalized.
    let (px, py) = (-dy / chord, dx / chord);
    let cx = mx + px * h;
    let cy = my + py * h;

    let a1 = normalize_angle((y1 - cy).atan2(x1 - cx));
    let a2 = normalize_angle((y2 - cy).atan2(x2 - cx));
    let ccw_span = normalize_angle(a2 - a1);
    // Minor arc: whichever direction has span < pi.
    let (theta_start, theta_end) = if ccw_span <= PI {
        (a1, a1 + ccw_span)
    } else {
        (a1, a1 - (2.0 * PI - ccw_span))
    };

    Ok(ArcParams { cx, cy, r, x1, y1, x2, y2, theta_start, theta_end })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_point_semicircle() {
        let arc = arc_from_three_points(-1.0, 0.0, 0.0, 1.0, 1.0, 0.0).unwrap();
        assert!((arc.cx - 0.0).abs() < 1e-9);
        assert!((arc.cy - 0.0).abs() < 1e-9);
        assert!((arc.r - 1.0).abs() < 1e-9);
        let span = (arc.theta_end - arc.theta_start).abs();
        assert!((span - PI).abs() < 1e-6);
    }

    #[test]
    fn collinear_points_are_infeasible() {
        let r = arc_from_three_points(0.0, 0.0, 1.0, 0.0, 2.0, 0.0);
        assert!(r.is_err());
    }

    #[test]
    fn endpoints_radius_minor_arc() {
        let arc = arc_from_endpoints_radius(-5.0, 0.0, 5.0, 0.0, 10.0).unwrap();
        let span = (arc.theta_end - arc.theta_start).abs();
        assert!(span < PI);
    }

    #[test]
    fn endpoints_radius_too_small_is_infeasible() {
        let r = arc_from_endpoints_radius(-5.0, 0.0, 5.0, 0.0, 4.0);
        assert!(r.is_err());
    }
}
