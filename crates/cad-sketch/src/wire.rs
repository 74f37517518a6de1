//! Wire and face assembly (§4.2): element → kernel edge, chain ordering,
//! closed-boundary detection.

use crate::error::SketchError;
use cad_geom::Point2;
use cad_kernel::{EdgeId, FaceId, Kernel, WireId};
use cad_types::{CancelToken, ElementParams, Plane, Sketch, SketchElement, SketchElementKind};

const PROXIMITY_TOL: f64 = 1e-6;

/// An edge's 2D endpoints in the sketch plane, used for chain ordering.
/// `None` for closed standalone edges (full circles).
type Endpoints = Option<(Point2, Point2)>;

fn build_edge<K: Kernel>(kernel: &mut K, plane: &Plane, element: &SketchElement) -> Result<(EdgeId, Endpoints), SketchError> {
    match &element.parameters_2d {
        ElementParams::Line(l) => {
            let p1 = plane.to_world(Point2::new(l.x1, l.y1));
            let p2 = plane.to_world(Point2::new(l.x2, l.y2));
            let edge = kernel.make_edge_line(p1, p2)?;
            Ok((edge, Some((Point2::new(l.x1, l.y1), Point2::new(l.x2, l.y2)))))
        }
        ElementParams::Circle(c) => {
            let center = plane.to_world(Point2::new(c.cx, c.cy));
            let edge = kernel.make_edge_circle(center, plane.normal, c.r)?;
            Ok((edge, None))
        }
        ElementParams::Arc(a) => {
            let center = plane.to_world(Point2::new(a.cx, a.cy));
            let edge = kernel.make_edge_arc(center, plane.normal, plane.u_axis, a.r, a.theta_start, a.theta_end)?;
            Ok((edge, Some((Point2::new(a.x1, a.y1), Point2::new(a.x2, a.y2)))))
        }
        ElementParams::Fillet(f) => {
            let center = Point2::new(f.center_x, f.center_y);
            let t1 = Point2::new(f.tangent1_x, f.tangent1_y);
            let t2 = Point2::new(f.tangent2_x, f.tangent2_y);
            let theta_start = (t1.y - center.y).atan2(t1.x - center.x);
            let theta_end = (t2.y - center.y).atan2(t2.x - center.x);
            let world_center = plane.to_world(center);
            let edge = kernel.make_edge_arc(world_center, plane.normal, plane.u_axis, f.radius, theta_start, theta_end)?;
            Ok((edge, Some((t1, t2))))
        }
        ElementParams::Chamfer(_) | ElementParams::Rectangle(_) | ElementParams::Polygon(_) => {
            unreachable!("chamfers are stored as Line elements; rectangles/polygons are container-only")
        }
    }
}

/// Greedy nearest-endpoint chaining (§4.2 "best-effort by endpoint proximity").
fn order_chain(mut entries: Vec<(EdgeId, Endpoints)>) -> Vec<(EdgeId, Endpoints)> {
    if entries.len() <= 1 {
        return entries;
    }
    let mut ordered = vec![entries.remove(0)];
    while !entries.is_empty() {
        let tail = ordered.last().unwrap().1;
        let next_index = tail.and_then(|(_, tail_end)| {
            entries.iter().position(|(_, ep)| match ep {
                Some((s, _)) => s.distance_to(&tail_end) < PROXIMITY_TOL,
                None => false,
            })
        });
        match next_index {
            Some(i) => ordered.push(entries.remove(i)),
            None => ordered.push(entries.remove(0)),
        }
    }
    ordered
}

/// True when `edges`' endpoints form a single closed cycle: every vertex
/// (clustered within `tol`) has degree 2 and the graph is connected (§4.2).
pub fn is_closed_boundary(edges: &[(Point2, Point2)], tol: f64) -> bool {
    if edges.is_empty() {
        return false;
    }
    fn cluster_of(p: Point2, clusters: &mut Vec<Point2>, tol: f64) -> usize {
        for (i, c) in clusters.iter().enumerate() {
            if c.distance_to(&p) < tol {
                return i;
            }
        }
        clusters.push(p);
        clusters.len() - 1
    }

    let mut clusters: Vec<Point2> = Vec::new();
    let mut edge_clusters = Vec::with_capacity(edges.len());
    for (a, b) in edges {
        let ca = cluster_of(*a, &mut clusters, tol);
        let cb = cluster_of(*b, &mut clusters, tol);
        edge_clusters.push((ca, cb));
    }

    let n = clusters.len();
    if n != edges.len() {
        return false;
    }
    let mut degree = vec![0usize; n];
    for (ca, cb) in &edge_clusters {
        degree[*ca] += 1;
        degree[*cb] += 1;
    }
    if degree.iter().any(|&d| d != 2) {
        return false;
    }

    let mut visited = vec![false; n];
    let mut stack = vec![0usize];
    visited[0] = true;
    let mut count = 1;
    while let Some(node) = stack.pop() {
        for (ca, cb) in &edge_clusters {
            let neighbor = if *ca == node { Some(*cb) } else if *cb == node { Some(*ca) } else { None };
            if let Some(next) = neighbor {
                if !visited[next] {
                    visited[next] = true;
                    count += 1;
                    stack.push(next);
                }
            }
        }
    }
    count == n
}

/// Assembles a wire from the given element ids, in insertion order unless
/// fillets/chamfers require proximity-based reordering.
fn assemble_wire<K: Kernel>(
    sketch: &Sketch,
    plane: &Plane,
    kernel: &mut K,
    elements: &[&SketchElement],
    cancel: &CancelToken,
) -> Result<WireId, SketchError> {
    let has_fillet_or_chamfer = elements
        .iter()
        .any(|e| matches!(e.kind, SketchElementKind::Fillet | SketchElementKind::Chamfer));

    let mut entries = Vec::with_capacity(elements.len());
    for element in elements {
        if cancel.is_cancelled() {
            return Err(SketchError::Cancelled);
        }
        entries.push(build_edge(kernel, plane, element)?);
    }

    let ordered = if has_fillet_or_chamfer { order_chain(entries) } else { entries };

    let endpoint_pairs: Vec<(Point2, Point2)> =
        ordered.iter().filter_map(|(_, ep)| *ep).collect();
    if ordered.len() > 1 && endpoint_pairs.len() == ordered.len() && !is_closed_boundary(&endpoint_pairs, PROXIMITY_TOL) {
        return Err(SketchError::WireOpen);
    }

    let edge_ids: Vec<EdgeId> = ordered.into_iter().map(|(id, _)| id).collect();
    Ok(kernel.make_wire(&edge_ids)?)
}

/// Builds a wire spanning every edge-contributing element in the sketch,
/// in insertion order (§4.2 "build_wire").
pub fn build_wire<K: Kernel>(
    sketch: &Sketch,
    plane: &Plane,
    kernel: &mut K,
    cancel: &CancelToken,
) -> Result<WireId, SketchError> {
    let elements: Vec<&SketchElement> = sketch.elements.iter().filter(|e| !e.produces_no_edge()).collect();
    if elements.is_empty() {
        return Err(SketchError::WireOpen);
    }
    assemble_wire(sketch, plane, kernel, &elements, cancel)
}

/// Builds the planar face bounded by `wire`.
pub fn build_face_from_wire<K: Kernel>(kernel: &mut K, wire: WireId) -> Result<FaceId, SketchError> {
    Ok(kernel.make_face(wire)?)
}

/// Builds a face directly from a single element: a container's closed child
/// boundary, or a standalone circle. A single open element (line/arc) is
/// rejected with [`SketchError::NotExtrudable`] (§4.5 face selection).
pub fn build_face_from_element<K: Kernel>(
    sketch: &Sketch,
    plane: &Plane,
    kernel: &mut K,
    id: &str,
    cancel: &CancelToken,
) -> Result<FaceId, SketchError> {
    let element = sketch.elements.get(id).ok_or_else(|| SketchError::ElementNotFound { id: id.to_string() })?;

    if element.is_composite_parent {
        let child_ids = &element.child_ids;
        let mut members: Vec<&SketchElement> =
            child_ids.iter().filter_map(|cid| sketch.elements.get(cid)).collect();
        // Pull in any fillet/chamfer that bridges two of this container's children.
        let child_set: std::collections::HashSet<&str> = child_ids.iter().map(String::as_str).collect();
        for other in sketch.elements.iter() {
            if matches!(other.kind, SketchElementKind::Fillet | SketchElementKind::Chamfer)
                && other.referenced_elements.iter().all(|r| child_set.contains(r.as_str()))
            {
                members.push(other);
            }
        }
        let wire = assemble_wire(sketch, plane, kernel, &members, cancel)?;
        return build_face_from_wire(kernel, wire);
    }

    if cancel.is_cancelled() {
        return Err(SketchError::Cancelled);
    }

    match element.kind {
        SketchElementKind::Circle => {
            let (edge, _) = build_edge(kernel, plane, element)?;
            let wire = kernel.make_wire(&[edge])?;
            build_face_from_wire(kernel, wire)
        }
        _ => Err(SketchError::NotExtrudable { reason: format!("{id} is a single open element") }),
    }
}
