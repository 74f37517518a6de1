//! Visualization payload builders (§6.3). Curve sampling here is a fixed,
//! coarse 16-segment scheme for the UI outline — unrelated to the kernel
//! adapter's own 64/32-segment tessellation sampling used to build B-Rep
//! wires (`cad-kernel`'s `CIRCLE_SEGMENTS`/`ARC_SEGMENTS`).

use cad_geom::Point2;
use cad_types::{ElementParams, Plane, Sketch, SketchElement, SketchElementKind};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::f64::consts::PI;

const CURVE_SEGMENTS: usize = 16;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaneVisualization {
    pub plane_id: String,
    pub plane_type: String,
    pub origin: [f64; 3],
    pub normal: [f64; 3],
    pub u_axis: [f64; 3],
    pub v_axis: [f64; 3],
}

pub fn plane_visualization(plane: &Plane) -> PlaneVisualization {
    PlaneVisualization {
        plane_id: plane.id.clone(),
        plane_type: plane.kind.as_str().to_string(),
        origin: plane.origin.to_array(),
        normal: plane.normal.to_array(),
        u_axis: plane.u_axis.to_array(),
        v_axis: plane.v_axis.to_array(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SketchVisualization {
    pub sketch_id: String,
    pub plane_id: String,
    pub plane_type: String,
    pub origin: [f64; 3],
    pub normal: [f64; 3],
    pub u_axis: [f64; 3],
    pub v_axis: [f64; 3],
}

pub fn sketch_visualization(sketch: &Sketch, plane: &Plane) -> SketchVisualization {
    let p = plane_visualization(plane);
    SketchVisualization {
        sketch_id: sketch.id.clone(),
        plane_id: p.plane_id,
        plane_type: p.plane_type,
        origin: p.origin,
        normal: p.normal,
        u_axis: p.u_axis,
        v_axis: p.v_axis,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementVisualization {
    pub element_id: String,
    pub sketch_id: String,
    pub element_type: String,
    /// Flattened `[x1,y1,z1, x2,y2,z2, ...]`; empty for a composite parent.
    pub points_3d: Vec<f64>,
    pub parameters_2d: Value,
    pub parent_id: Option<String>,
    #[serde(default)]
    pub is_composite: bool,
    #[serde(default)]
    pub child_ids: Vec<String>,
}

fn sample_points_2d(element: &SketchElement) -> Vec<Point2> {
    match &element.parameters_2d {
        ElementParams::Line(l) => vec![Point2::new(l.x1, l.y1), Point2::new(l.x2, l.y2)],
        ElementParams::Circle(c) => (0..=CURVE_SEGMENTS)
            .map(|i| {
                let theta = 2.0 * PI * (i as f64) / (CURVE_SEGMENTS as f64);
                Point2::new(c.cx + c.r * theta.cos(), c.cy + c.r * theta.sin())
            })
            .collect(),
        ElementParams::Arc(a) => (0..=CURVE_SEGMENTS)
            .map(|i| {
                let t = a.theta_start + (a.theta_end - a.theta_start) * (i as f64) / (CURVE_SEGMENTS as f64);
                Point2::new(a.cx + a.r * t.cos(), a.cy + a.r * t.sin())
            })
            .collect(),
        ElementParams::Fillet(f) => {
            let theta_start = (f.tangent1_y - f.center_y).atan2(f.tangent1_x - f.center_x);
            let theta_end = (f.tangent2_y - f.center_y).atan2(f.tangent2_x - f.center_x);
            (0..=CURVE_SEGMENTS)
                .map(|i| {
                    let t = theta_start + (theta_end - theta_start) * (i as f64) / (CURVE_SEGMENTS as f64);
                    Point2::new(f.center_x + f.radius * t.cos(), f.center_y + f.radius * t.sin())
                })
                .collect()
        }
        ElementParams::Chamfer(_) => unreachable!("chamfers are stored as Line elements"),
        ElementParams::Rectangle(_) | ElementParams::Polygon(_) => Vec::new(),
    }
}

fn parameters_json(element: &SketchElement) -> Value {
    match &element.parameters_2d {
        ElementParams::Line(l) => json!({"x1": l.x1, "y1": l.y1, "x2": l.x2, "y2": l.y2}),
        ElementParams::Circle(c) => json!({"cx": c.cx, "cy": c.cy, "r": c.r}),
        ElementParams::Arc(a) => json!({
            "cx": a.cx, "cy": a.cy, "r": a.r,
            "x1": a.x1, "y1": a.y1, "x2": a.x2, "y2": a.y2,
        }),
        ElementParams::Rectangle(r) => json!({"corner_x": r.corner_x, "corner_y": r.corner_y, "w": r.w, "h": r.h}),
        ElementParams::Polygon(p) => json!({"cx": p.cx, "cy": p.cy, "sides": p.sides, "circumradius": p.circumradius}),
        ElementParams::Fillet(f) => json!({
            "radius": f.radius, "center_x": f.center_x, "center_y": f.center_y,
            "tangent1": [f.tangent1_x, f.tangent1_y], "tangent2": [f.tangent2_x, f.tangent2_y],
        }),
        ElementParams::Chamfer(c) => json!({"distance": c.distance, "p1": [c.p1_x, c.p1_y], "p2": [c.p2_x, c.p2_y]}),
    }
}

/// Builds the visualization envelope for a single element. Composite parents
/// get `points_3d: []`, `is_composite: true`, and their `child_ids`.
pub fn element_visualization(sketch: &Sketch, plane: &Plane, element: &SketchElement) -> ElementVisualization {
    let points_3d: Vec<f64> = if element.is_composite_parent {
        Vec::new()
    } else {
        sample_points_2d(element).into_iter().flat_map(|p| plane.to_world(p).to_array()).collect()
    };
    ElementVisualization {
        element_id: element.id.clone(),
        sketch_id: sketch.id.clone(),
        element_type: element.kind.as_str().to_string(),
        points_3d,
        parameters_2d: parameters_json(element),
        parent_id: element.parent_id.clone(),
        is_composite: element.is_composite_parent,
        child_ids: element.child_ids.clone(),
    }
}

/// Visualization envelopes for an element and, if it is a composite parent,
/// one per child in insertion order (§5 "parent-first, then children").
pub fn element_visualizations(sketch: &Sketch, plane: &Plane, id: &str) -> Vec<ElementVisualization> {
    let Some(element) = sketch.elements.get(id) else { return Vec::new() };
    let mut out = vec![element_visualization(sketch, plane, element)];
    for child_id in &element.child_ids {
        if let Some(child) = sketch.elements.get(child_id) {
            out.push(element_visualization(sketch, plane, child));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cad_types::{CircleParams, LineParams, PlaneKind, SketchElementKind};

    fn plane() -> Plane {
        Plane::canonical("plane_1".into(), PlaneKind::XY, cad_geom::Vector3::ZERO)
    }

    #[test]
    fn line_samples_two_points() {
        let sketch = Sketch::new("s".into(), "plane_1".into());
        let el = SketchElement::new(
            "l".into(),
            SketchElementKind::Line,
            ElementParams::Line(LineParams { x1: 0.0, y1: 0.0, x2: 1.0, y2: 0.0 }),
        );
        let v = element_visualization(&sketch, &plane(), &el);
        assert_eq!(v.points_3d.len(), 6);
    }

    #[test]
    fn circle_closes_to_seventeen_points() {
        let sketch = Sketch::new("s".into(), "plane_1".into());
        let el = SketchElement::new(
            "c".into(),
            SketchElementKind::Circle,
            ElementParams::Circle(CircleParams { cx: 0.0, cy: 0.0, r: 1.0 }),
        );
        let v = element_visualization(&sketch, &plane(), &el);
        assert_eq!(v.points_3d.len(), 17 * 3);
        // First and last sampled point coincide.
        let first = &v.points_3d[0..3];
        let last = &v.points_3d[v.points_3d.len() - 3..];
        assert!((first[0] - last[0]).abs() < 1e-9);
        assert!((first[1] - last[1]).abs() < 1e-9);
    }
}
