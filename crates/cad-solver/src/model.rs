//! Variable model (§4.4): one flat vector of scalars, with line endpoints
//! fused across elements when they are exactly coincident — this is what
//! makes a composite's child lines behave as a connected polyline without
//! the solver needing to know anything about composites.

use cad_types::{ElementParams, Sketch, SketchElementKind};
use nalgebra::DVector;
use std::collections::HashMap;

const FUSE_TOL: f64 = 1e-9;

#[derive(Debug, Clone, Copy)]
pub enum ElementVars {
    /// `p1`/`p2` are base indices into the flat vector; each point occupies
    /// two consecutive slots, `(x, y)`.
    Line { p1: usize, p2: usize },
    /// Three consecutive slots: `(cx, cy, r)`.
    Circle { base: usize },
    /// Five consecutive slots: `(cx, cy, r, theta_start, theta_end)`.
    Arc { base: usize },
}

pub struct VarModel {
    pub x: DVector<f64>,
    pub elements: HashMap<String, ElementVars>,
}

impl VarModel {
    /// Builds the variable vector from every Line/Circle/Arc in `sketch`.
    /// Container parents contribute no variables of their own (their
    /// children do); fillets/chamfers are derived geometry and are excluded
    /// — no constraint kind in §4.4 targets them directly.
    pub fn build(sketch: &Sketch) -> Self {
        let mut slots: Vec<f64> = Vec::new();
        let mut point_clusters: Vec<(f64, f64, usize)> = Vec::new();
        let mut elements = HashMap::new();

        let mut point_index = |x: f64, y: f64, slots: &mut Vec<f64>, clusters: &mut Vec<(f64, f64, usize)>| -> usize {
            for (cx, cy, base) in clusters.iter() {
                if (cx - x).abs() < FUSE_TOL && (cy - y).abs() < FUSE_TOL {
                    return *base;
                }
            }
            let base = slots.len();
            slots.push(x);
            slots.push(y);
            clusters.push((x, y, base));
            base
        };

        for element in sketch.elements.iter() {
            if element.produces_no_edge() {
                continue;
            }
            match (&element.kind, &element.parameters_2d) {
                (SketchElementKind::Line, ElementParams::Line(l)) => {
                    let p1 = point_index(l.x1, l.y1, &mut slots, &mut point_clusters);
                    let p2 = point_index(l.x2, l.y2, &mut slots, &mut point_clusters);
                    elements.insert(element.id.clone(), ElementVars::Line { p1, p2 });
                }
                (SketchElementKind::Circle, ElementParams::Circle(c)) => {
                    let base = slots.len();
                    slots.extend_from_slice(&[c.cx, c.cy, c.r]);
                    elements.insert(element.id.clone(), ElementVars::Circle { base });
                }
                (SketchElementKind::Arc, ElementParams::Arc(a)) => {
                    let base = slots.len();
                    slots.extend_from_slice(&[a.cx, a.cy, a.r, a.theta_start, a.theta_end]);
                    elements.insert(element.id.clone(), ElementVars::Arc { base });
                }
                _ => {}
            }
        }

        Self { x: DVector::from_vec(slots), elements }
    }

    pub fn line_endpoints(&self, x: &DVector<f64>, id: &str) -> Option<(f64, f64, f64, f64)> {
        match self.elements.get(id)? {
            ElementVars::Line { p1, p2 } => Some((x[*p1], x[*p1 + 1], x[*p2], x[*p2 + 1])),
            _ => None,
        }
    }

    /// The element's representative point for a `Coincident` constraint: a
    /// line's first endpoint, or a circle/arc's center.
    pub fn representative_point(&self, x: &DVector<f64>, id: &str) -> Option<(f64, f64)> {
        match self.elements.get(id)? {
            ElementVars::Line { p1, .. } => Some((x[*p1], x[*p1 + 1])),
            ElementVars::Circle { base } | ElementVars::Arc { base } => Some((x[*base], x[*base + 1])),
        }
    }

    /// Writes the solved vector back into the sketch's element parameters.
    pub fn write_back(&self, sketch: &mut Sketch, x: &DVector<f64>) {
        for (id, vars) in &self.elements {
            let Some(element) = sketch.elements.get_mut(id) else { continue };
            match (*vars, &mut element.parameters_2d) {
                (ElementVars::Line { p1, p2 }, ElementParams::Line(l)) => {
                    l.x1 = x[p1];
                    l.y1 = x[p1 + 1];
                    l.x2 = x[p2];
                    l.y2 = x[p2 + 1];
                }
                (ElementVars::Circle { base }, ElementParams::Circle(c)) => {
                    c.cx = x[base];
                    c.cy = x[base + 1];
                    c.r = x[base + 2];
                }
                (ElementVars::Arc { base }, ElementParams::Arc(a)) => {
                    a.cx = x[base];
                    a.cy = x[base + 1];
                    a.r = x[base + 2];
                    a.theta_start = x[base + 3];
                    a.theta_end = x[base + 4];
                    a.x1 = a.cx + a.r * a.theta_start.cos();
                    a.y1 = a.cy + a.r * a.theta_start.sin();
                    a.x2 = a.cx + a.r * a.theta_end.cos();
                    a.y2 = a.cy + a.r * a.theta_end.sin();
                }
                _ => {}
            }
        }
    }
}
