//! Primitive insertion: lines, circles, arcs, and the rectangle/polygon
//! composites (§4.2). Composite creation is atomic — the parent and its
//! children are only inserted once every child has been built successfully.

use crate::arc;
use crate::error::SketchError;
use cad_types::{
    ArcParams, CircleParams, ElementParams, LineParams, PolygonParams, RectangleParams,
    Sketch, SketchElement, SketchElementKind,
};
use std::f64::consts::PI;

pub fn add_line(sketch: &mut Sketch, id: String, params: LineParams) -> Result<(), SketchError> {
    sketch.elements.insert(SketchElement::new(id, SketchElementKind::Line, ElementParams::Line(params)));
    Ok(())
}

pub fn add_circle(sketch: &mut Sketch, id: String, params: CircleParams) -> Result<(), SketchError> {
    if params.r <= 0.0 {
        return Err(SketchError::InvariantViolated { reason: "circle radius must be positive".into() });
    }
    sketch
        .elements
        .insert(SketchElement::new(id, SketchElementKind::Circle, ElementParams::Circle(params)));
    Ok(())
}

pub fn add_arc_three_point(
    sketch: &mut Sketch,
    id: String,
    x1: f64,
    y1: f64,
    xm: f64,
    ym: f64,
    x2: f64,
    y2: f64,
) -> Result<(), SketchError> {
    let params = arc::arc_from_three_points(x1, y1, xm, ym, x2, y2)?;
    insert_arc(sketch, id, params);
    Ok(())
}

pub fn add_arc_endpoints_radius(
    sketch: &mut Sketch,
    id: String,
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    r: f64,
) -> Result<(), SketchError> {
    let params = arc::arc_from_endpoints_radius(x1, y1, x2, y2, r)?;
    insert_arc(sketch, id, params);
    Ok(())
}

fn insert_arc(sketch: &mut Sketch, id: String, params: ArcParams) {
    sketch.elements.insert(SketchElement::new(id, SketchElementKind::Arc, ElementParams::Arc(params)));
}

/// Rectangle composite: parent is a container (contributes no edge of its
/// own); four child lines, named `{parent_id}_line_{bottom,right,top,left}`.
pub fn add_rectangle(
    sketch: &mut Sketch,
    parent_id: String,
    params: RectangleParams,
) -> Result<(), SketchError> {
    if params.w <= 0.0 || params.h <= 0.0 {
        return Err(SketchError::InvariantViolated { reason: "rectangle width/height must be positive".into() });
    }
    let (x, y, w, h) = (params.corner_x, params.corner_y, params.w, params.h);
    let corners = [(x, y), (x + w, y), (x + w, y + h), (x, y + h)];
    let names = ["bottom", "right", "top", "left"];

    let mut parent = SketchElement::new(parent_id.clone(), SketchElementKind::Rectangle, ElementParams::Rectangle(params));
    parent.is_composite_parent = true;
    parent.is_container_only = true;

    let mut children = Vec::with_capacity(4);
    for i in 0..4 {
        let (x1, y1) = corners[i];
        let (x2, y2) = corners[(i + 1) % 4];
        let child_id = format!("{parent_id}_line_{}", names[i]);
        parent.child_ids.push(child_id.clone());
        let mut child = SketchElement::new(child_id, SketchElementKind::Line, ElementParams::Line(LineParams { x1, y1, x2, y2 }));
        child.parent_id = Some(parent_id.clone());
        children.push(child);
    }

    sketch.elements.insert(parent);
    for child in children {
        sketch.elements.insert(child);
    }
    Ok(())
}

/// Regular polygon composite: `sides` child lines, named
/// `{parent_id}_line_{i}`, vertices evenly spaced starting on the +u axis.
pub fn add_polygon(
    sketch: &mut Sketch,
    parent_id: String,
    params: PolygonParams,
) -> Result<(), SketchError> {
    if params.sides < 3 {
        return Err(SketchError::InvariantViolated { reason: "polygon needs at least 3 sides".into() });
    }
    if params.circumradius <= 0.0 {
        return Err(SketchError::InvariantViolated { reason: "polygon circumradius must be positive".into() });
    }
    let n = params.sides;
    let verts: Vec<(f64, f64)> = (0..n)
        .map(|i| {
            let theta = 2.0 * PI * (i as f64) / (n as f64);
            (params.cx + params.circumradius * theta.cos(), params.cy + params.circumradius * theta.sin())
        })
        .collect();

    let mut parent = SketchElement::new(parent_id.clone(), SketchElementKind::Polygon, ElementParams::Polygon(params));
    parent.is_composite_parent = true;
    parent.is_container_only = true;

    let mut children = Vec::with_capacity(n as usize);
    for i in 0..n as usize {
        let (x1, y1) = verts[i];
        let (x2, y2) = verts[(i + 1) % n as usize];
        let child_id = format!("{parent_id}_line_{i}");
        parent.child_ids.push(child_id.clone());
        let mut child = SketchElement::new(child_id, SketchElementKind::Line, ElementParams::Line(LineParams { x1, y1, x2, y2 }));
        child.parent_id = Some(parent_id.clone());
        children.push(child);
    }

    sketch.elements.insert(parent);
    for child in children {
        sketch.elements.insert(child);
    }
    Ok(())
}

/// Deletes a composite as a unit: deleting any child (or the parent itself)
/// removes the parent and all its children.
pub fn delete_element(sketch: &mut Sketch, id: &str) -> Result<(), SketchError> {
    let element = sketch.elements.get(id).ok_or_else(|| SketchError::ElementNotFound { id: id.to_string() })?;
    let unit_parent = element.parent_id.clone();
    if let Some(parent_id) = unit_parent {
        delete_element(sketch, &parent_id)
    } else {
        let child_ids = element.child_ids.clone();
        sketch.elements.remove(id);
        for child in child_ids {
            sketch.elements.remove(&child);
        }
        Ok(())
    }
}

/// Replaces a non-composite element's parameters in place.
pub fn modify_element(sketch: &mut Sketch, id: &str, params: ElementParams) -> Result<(), SketchError> {
    let element = sketch.elements.get_mut(id).ok_or_else(|| SketchError::ElementNotFound { id: id.to_string() })?;
    if element.is_composite_parent {
        return Err(SketchError::InvariantViolated { reason: "cannot directly modify a composite parent".into() });
    }
    element.parameters_2d = params;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectangle_inserts_parent_and_four_children() {
        let mut sketch = Sketch::new("sketch_1".into(), "plane_1".into());
        add_rectangle(&mut sketch, "rect_1".into(), RectangleParams { corner_x: 0.0, corner_y: 0.0, w: 10.0, h: 5.0 }).unwrap();
        assert_eq!(sketch.elements.len(), 5);
        let parent = sketch.elements.get("rect_1").unwrap();
        assert!(parent.is_container_only);
        assert_eq!(parent.child_ids.len(), 4);
        let bottom = sketch.elements.get("rect_1_line_bottom").unwrap().as_line().unwrap();
        assert_eq!(*bottom, LineParams { x1: 0.0, y1: 0.0, x2: 10.0, y2: 0.0 });
    }

    #[test]
    fn rectangle_rejects_non_positive_dimensions() {
        let mut sketch = Sketch::new("sketch_1".into(), "plane_1".into());
        let err = add_rectangle(&mut sketch, "rect_1".into(), RectangleParams { corner_x: 0.0, corner_y: 0.0, w: -1.0, h: 5.0 });
        assert!(err.is_err());
        assert!(sketch.elements.is_empty());
    }

    #[test]
    fn polygon_closes_on_itself() {
        let mut sketch = Sketch::new("sketch_1".into(), "plane_1".into());
        add_polygon(&mut sketch, "hex_1".into(), PolygonParams { cx: 0.0, cy: 0.0, sides: 6, circumradius: 2.0 }).unwrap();
        assert_eq!(sketch.elements.get("hex_1").unwrap().child_ids.len(), 6);
        let last = sketch.elements.get("hex_1_line_5").unwrap().as_line().unwrap();
        let first = sketch.elements.get("hex_1_line_0").unwrap().as_line().unwrap();
        assert!((last.x2 - first.x1).abs() < 1e-9);
        assert!((last.y2 - first.y1).abs() < 1e-9);
    }

    #[test]
    fn delete_element_removes_whole_composite() {
        let mut sketch = Sketch::new("sketch_1".into(), "plane_1".into());
        add_rectangle(&mut sketch, "rect_1".into(), RectangleParams { corner_x: 0.0, corner_y: 0.0, w: 1.0, h: 1.0 }).unwrap();
        delete_element(&mut sketch, "rect_1_line_top").unwrap();
        assert!(sketch.elements.is_empty());
    }
}
