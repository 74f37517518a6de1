//! `TruckAdapter` — the one concrete [`Kernel`]/[`KernelIntrospect`]
//! implementation, backed by the `truck` B-Rep family (§4.9).
//!
//! Edges and wires are kept as plain point-sampled geometry until
//! [`Kernel::make_face`] is called, where they are realized as a single
//! chain of shared-vertex `truck` line edges (the only wire-construction
//! pattern the ancestor kernel crate demonstrates working, in its
//! `make_faces_from_profiles`). Circles and arcs are sampled the same way
//! visualization samples them (§6.3): 64 segments for a full circle, 32 for
//! an open arc. This keeps `make_wire`/`make_face` uniform regardless of
//! which element kinds contributed edges, at the cost of representing
//! curved boundaries as dense polygons rather than true circular edges in
//! the B-Rep — acceptable given `truck-shapeops` booleans and tessellation
//! are themselves deflection-tolerant.

use std::collections::HashMap;
use std::f64::consts::PI;

use cad_geom::Vector3 as GeomVec;
use truck_meshalgo::prelude::*;
use truck_meshalgo::tessellation::MeshableShape;
use truck_modeling::builder;
use truck_modeling::topology::{Edge as TEdge, Face as TFace, Solid as TSolid, Wire as TWire};
use truck_modeling::{Point3, Vector3 as TVector3};

use crate::traits::{BooleanOp, Kernel, KernelIntrospect};
use crate::types::{EdgeId, FaceId, KernelError, RawMesh, SolidId, WireId};
use cad_types::CancelToken;

const CIRCLE_SEGMENTS: usize = 64;
const ARC_SEGMENTS: usize = 32;
/// Points closer than this are treated as the same vertex when chaining
/// wire segments (matches the seam-merge tolerance of §4.7).
const COINCIDENT_TOL: f64 = 1e-6;

#[derive(Debug, Clone)]
enum EdgeGeom {
    Line(GeomVec, GeomVec),
    /// Closed loop sampled eagerly into `CIRCLE_SEGMENTS` points.
    Circle { center: GeomVec, axis: GeomVec, radius: f64 },
    Arc {
        center: GeomVec,
        axis: GeomVec,
        x_axis: GeomVec,
        radius: f64,
        theta_start: f64,
        theta_end: f64,
    },
}

impl EdgeGeom {
    /// Samples the edge into an ordered point list, first point to last,
    /// not repeating the start point at the end even when closed.
    fn sample(&self) -> Vec<GeomVec> {
        match *self {
            EdgeGeom::Line(p1, p2) => vec![p1, p2],
            EdgeGeom::Circle { center, axis, radius } => {
                // Inclusive range so the last sample exactly coincides with
                // the first: a lone circle edge must close on itself without
                // relying on the chain-wraparound coincidence check below.
                let (u, v) = in_plane_basis(axis);
                (0..=CIRCLE_SEGMENTS)
                    .map(|i| {
                        let t = 2.0 * PI * (i as f64) / (CIRCLE_SEGMENTS as f64);
                        center + u * (radius * t.cos()) + v * (radius * t.sin())
                    })
                    .collect()
            }
            EdgeGeom::Arc { center, axis, x_axis, radius, theta_start, theta_end } => {
                let u = x_axis.normalized().expect("arc x_axis must be non-zero");
                let w = axis.normalized().expect("arc axis must be non-zero").cross(&u);
                (0..=ARC_SEGMENTS)
                    .map(|i| {
                        let t = theta_start
                            + (theta_end - theta_start) * (i as f64) / (ARC_SEGMENTS as f64);
                        center + u * (radius * t.cos()) + w * (radius * t.sin())
                    })
                    .collect()
            }
        }
    }
}

fn in_plane_basis(axis: GeomVec) -> (GeomVec, GeomVec) {
    let n = axis.normalized().expect("circle axis must be non-zero");
    let u_raw = if n.dot(&GeomVec::Z).abs() > 0.9 {
        n.cross(&GeomVec::X)
    } else {
        n.cross(&GeomVec::Z)
    };
    let u = u_raw.normalized().expect("degenerate circle basis");
    let v = n.cross(&u);
    (u, v)
}

fn to_point3(p: GeomVec) -> Point3 {
    Point3::new(p.x, p.y, p.z)
}

fn to_tvector3(v: GeomVec) -> TVector3 {
    TVector3::new(v.x, v.y, v.z)
}

/// The sole B-Rep-kernel-backed implementation of [`Kernel`]/[`KernelIntrospect`].
pub struct TruckAdapter {
    next_edge: u64,
    next_wire: u64,
    next_face: u64,
    next_solid: u64,
    edges: HashMap<EdgeId, EdgeGeom>,
    /// Flattened, deduplicated boundary points plus whether the loop closes.
    wires: HashMap<WireId, (Vec<GeomVec>, bool)>,
    faces: HashMap<FaceId, TFace>,
    solids: HashMap<SolidId, TSolid>,
}

impl TruckAdapter {
    pub fn new() -> Self {
        Self {
            next_edge: 1,
            next_wire: 1,
            next_face: 1,
            next_solid: 1,
            edges: HashMap::new(),
            wires: HashMap::new(),
            faces: HashMap::new(),
            solids: HashMap::new(),
        }
    }

    fn alloc_edge(&mut self) -> EdgeId {
        let id = EdgeId(self.next_edge);
        self.next_edge += 1;
        id
    }

    fn alloc_wire(&mut self) -> WireId {
        let id = WireId(self.next_wire);
        self.next_wire += 1;
        id
    }

    fn alloc_face(&mut self) -> FaceId {
        let id = FaceId(self.next_face);
        self.next_face += 1;
        id
    }

    fn alloc_solid(&mut self) -> SolidId {
        let id = SolidId(self.next_solid);
        self.next_solid += 1;
        id
    }

    fn solid(&self, id: SolidId) -> Result<&TSolid, KernelError> {
        self.solids.get(&id).ok_or(KernelError::SolidNotFound(id))
    }
}

impl Default for TruckAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Kernel for TruckAdapter {
    fn make_edge_line(&mut self, p1: GeomVec, p2: GeomVec) -> Result<EdgeId, KernelError> {
        let id = self.alloc_edge();
        self.edges.insert(id, EdgeGeom::Line(p1, p2));
        Ok(id)
    }

    fn make_edge_circle(
        &mut self,
        center: GeomVec,
        axis: GeomVec,
        radius: f64,
    ) -> Result<EdgeId, KernelError> {
        if radius <= 0.0 {
            return Err(KernelError::DegenerateInput { reason: "circle radius must be positive".into() });
        }
        let id = self.alloc_edge();
        self.edges.insert(id, EdgeGeom::Circle { center, axis, radius });
        Ok(id)
    }

    fn make_edge_arc(
        &mut self,
        center: GeomVec,
        axis: GeomVec,
        x_axis: GeomVec,
        radius: f64,
        theta_start: f64,
        theta_end: f64,
    ) -> Result<EdgeId, KernelError> {
        if radius <= 0.0 {
            return Err(KernelError::DegenerateInput { reason: "arc radius must be positive".into() });
        }
        let id = self.alloc_edge();
        self.edges.insert(id, EdgeGeom::Arc { center, axis, x_axis, radius, theta_start, theta_end });
        Ok(id)
    }

    fn make_wire(&mut self, edges: &[EdgeId]) -> Result<WireId, KernelError> {
        let mut points: Vec<GeomVec> = Vec::new();
        for (i, eid) in edges.iter().enumerate() {
            let geom = self.edges.get(eid).ok_or(KernelError::EdgeNotFound(*eid))?;
            let sampled = geom.sample();
            if i == 0 {
                points.extend(sampled);
            } else {
                // Drop the leading point if it coincides with the chain's
                // current tail — consecutive sketch edges share an endpoint.
                let skip_first = points
                    .last()
                    .map(|tail| tail.distance_to(&sampled[0]) < COINCIDENT_TOL)
                    .unwrap_or(false);
                points.extend(sampled.into_iter().skip(if skip_first { 1 } else { 0 }));
            }
        }
        if points.len() < 2 {
            return Err(KernelError::DegenerateInput { reason: "wire has fewer than 2 points".into() });
        }
        let closed = points.first().unwrap().distance_to(points.last().unwrap()) < COINCIDENT_TOL;
        if closed {
            points.pop();
        }
        let id = self.alloc_wire();
        self.wires.insert(id, (points, closed));
        Ok(id)
    }

    fn make_face(&mut self, wire: WireId) -> Result<FaceId, KernelError> {
        let (points, closed) = self.wires.get(&wire).ok_or(KernelError::WireNotFound(wire))?;
        if !closed {
            return Err(KernelError::WireOpen);
        }
        if points.len() < 3 {
            return Err(KernelError::FaceBuildFailed {
                reason: "closed wire needs at least 3 points".into(),
            });
        }

        let vertices: Vec<_> = points.iter().map(|p| builder::vertex(to_point3(*p))).collect();
        let n = vertices.len();
        let mut wire_edges: Vec<TEdge> = Vec::with_capacity(n);
        for i in 0..n {
            let j = (i + 1) % n;
            let edge = TEdge::new(
                &vertices[i],
                &vertices[j],
                truck_modeling::geometry::Curve::Line(truck_modeling::geometry::Line(
                    to_point3(points[i]),
                    to_point3(points[j]),
                )),
            );
            wire_edges.push(edge);
        }
        let truck_wire = TWire::from_iter(wire_edges);
        let face = builder::try_attach_plane(&[truck_wire]).map_err(|e| KernelError::FaceBuildFailed {
            reason: format!("{e}"),
        })?;
        let id = self.alloc_face();
        self.faces.insert(id, face);
        Ok(id)
    }

    fn make_prism(&mut self, face: FaceId, vector: GeomVec) -> Result<SolidId, KernelError> {
        let f = self.faces.get(&face).ok_or(KernelError::FaceNotFound(face))?;
        if vector.length() < 1e-12 {
            return Err(KernelError::DegenerateInput { reason: "extrude vector has zero length".into() });
        }
        let solid = builder::tsweep(f, to_tvector3(vector));
        let id = self.alloc_solid();
        self.solids.insert(id, solid);
        Ok(id)
    }

    fn boolean(&mut self, op: BooleanOp, a: SolidId, b: SolidId) -> Result<SolidId, KernelError> {
        let solid_a = self.solid(a)?.clone();
        let solid_b = self.solid(b)?.clone();
        const BOOLEAN_TOL: f64 = 0.05;
        let result = match op {
            BooleanOp::Union => truck_shapeops::or(&solid_a, &solid_b, BOOLEAN_TOL),
            BooleanOp::Intersect => truck_shapeops::and(&solid_a, &solid_b, BOOLEAN_TOL),
            BooleanOp::Cut => {
                let mut not_b = solid_b;
                not_b.not();
                truck_shapeops::and(&solid_a, &not_b, BOOLEAN_TOL)
            }
        };
        let result = result.ok_or_else(|| KernelError::BooleanFailed {
            reason: format!("truck shapeops returned no result for {op:?}"),
        })?;
        let id = self.alloc_solid();
        self.solids.insert(id, result);
        Ok(id)
    }

    fn validate(&self, solid: SolidId) -> bool {
        let Ok(s) = self.solid(solid) else { return false };
        for shell in s.boundaries().iter() {
            let mut vert_ids = std::collections::HashSet::new();
            for v in shell.vertex_iter() {
                vert_ids.insert(v.id());
            }
            let mut edge_ids = std::collections::HashSet::new();
            for e in shell.edge_iter() {
                edge_ids.insert(e.id());
            }
            let faces: Vec<_> = shell.face_iter().collect();
            if faces.is_empty() {
                return false;
            }
            let v = vert_ids.len() as i64;
            let e = edge_ids.len() as i64;
            let f = faces.len() as i64;
            if v - e + f != 2 {
                return false;
            }
        }
        true
    }

    fn tessellate(&self, solid: SolidId, deflection: f64, cancel: &CancelToken) -> Result<RawMesh, KernelError> {
        let s = self.solid(solid)?;
        let meshed = s.triangulation(deflection);

        let mut mesh = RawMesh::default();
        let mut next_face_id = 1u64;
        for shell in meshed.boundaries().iter() {
            for face in shell.face_iter() {
                if cancel.is_cancelled() {
                    return Err(KernelError::Cancelled);
                }
                let face_id = FaceId(next_face_id);
                next_face_id += 1;

                let Some(mut face_mesh) = face.surface() else { continue };
                if !face.orientation() {
                    face_mesh.invert();
                }

                let start_index = mesh.indices.len() as u32;
                let base_vertex = mesh.positions.len() as u32;

                let positions = face_mesh.positions();
                let normals = face_mesh.normals();
                let tri_faces = face_mesh.tri_faces();

                for pos in positions {
                    mesh.positions.push([pos[0], pos[1], pos[2]]);
                }

                if normals.len() == positions.len() {
                    for n in normals {
                        mesh.normals.push([n[0], n[1], n[2]]);
                    }
                } else {
                    // Kernel didn't supply per-vertex normals: fall back to
                    // the first triangle's face normal for every vertex of
                    // this face (§4.7 — seam averaging happens one layer up).
                    let fallback = tri_faces
                        .first()
                        .map(|tri| {
                            let idx: Vec<_> = tri.iter().map(|v| v.pos).collect();
                            let a = positions[idx[0]];
                            let b = positions[idx[1]];
                            let c = positions[idx[2]];
                            let ab = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
                            let ac = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
                            let n = [
                                ab[1] * ac[2] - ab[2] * ac[1],
                                ab[2] * ac[0] - ab[0] * ac[2],
                                ab[0] * ac[1] - ab[1] * ac[0],
                            ];
                            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt().max(1e-12);
                            [n[0] / len, n[1] / len, n[2] / len]
                        })
                        .unwrap_or([0.0, 0.0, 1.0]);
                    for _ in 0..positions.len() {
                        mesh.normals.push(fallback);
                    }
                }

                for tri in tri_faces {
                    for v in tri.iter() {
                        mesh.indices.push(v.pos as u32 + base_vertex);
                    }
                }

                let end_index = mesh.indices.len() as u32;
                mesh.face_ranges.push((face_id, start_index, end_index));
            }
        }
        Ok(mesh)
    }
}

impl KernelIntrospect for TruckAdapter {
    fn face_normals(
        &self,
        solid: SolidId,
        deflection: f64,
    ) -> Result<Vec<(FaceId, GeomVec)>, KernelError> {
        let mesh = self.tessellate(solid, deflection, &CancelToken::new())?;
        Ok(mesh
            .face_ranges
            .iter()
            .filter_map(|(face_id, start, end)| {
                let start = *start as usize;
                let end = *end as usize;
                if end - start < 3 {
                    return None;
                }
                let i0 = mesh.indices[start] as usize;
                let n = mesh.normals.get(i0)?;
                Some((*face_id, GeomVec::new(n[0], n[1], n[2])))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_wire(adapter: &mut TruckAdapter, w: f64, h: f64) -> WireId {
        let p00 = GeomVec::new(0.0, 0.0, 0.0);
        let p10 = GeomVec::new(w, 0.0, 0.0);
        let p11 = GeomVec::new(w, h, 0.0);
        let p01 = GeomVec::new(0.0, h, 0.0);
        let e1 = adapter.make_edge_line(p00, p10).unwrap();
        let e2 = adapter.make_edge_line(p10, p11).unwrap();
        let e3 = adapter.make_edge_line(p11, p01).unwrap();
        let e4 = adapter.make_edge_line(p01, p00).unwrap();
        adapter.make_wire(&[e1, e2, e3, e4]).unwrap()
    }

    #[test]
    fn extrudes_rectangle_to_valid_box() {
        let mut adapter = TruckAdapter::new();
        let wire = rect_wire(&mut adapter, 10.0, 5.0);
        let face = adapter.make_face(wire).unwrap();
        let solid = adapter.make_prism(face, GeomVec::new(0.0, 0.0, 3.0)).unwrap();
        assert!(adapter.validate(solid));

        let mesh = adapter.tessellate(solid, 0.1, &CancelToken::new()).unwrap();
        assert!(!mesh.positions.is_empty());
        assert_eq!(mesh.indices.len() % 3, 0);
        assert!(mesh.face_ranges.len() >= 6);
    }

    #[test]
    fn standalone_circle_closes_on_itself() {
        let mut adapter = TruckAdapter::new();
        let edge = adapter
            .make_edge_circle(GeomVec::ZERO, GeomVec::Z, 3.0)
            .unwrap();
        let wire = adapter.make_wire(&[edge]).unwrap();
        let face = adapter.make_face(wire).unwrap();
        let solid = adapter.make_prism(face, GeomVec::new(0.0, 0.0, 1.0)).unwrap();
        assert!(adapter.validate(solid));
    }

    #[test]
    fn open_wire_cannot_build_a_face() {
        let mut adapter = TruckAdapter::new();
        let e1 = adapter
            .make_edge_line(GeomVec::new(0.0, 0.0, 0.0), GeomVec::new(1.0, 0.0, 0.0))
            .unwrap();
        let wire = adapter.make_wire(&[e1]).unwrap();
        assert!(matches!(adapter.make_face(wire), Err(KernelError::WireOpen)));
    }

    #[test]
    fn union_of_two_overlapping_boxes_is_valid() {
        let mut adapter = TruckAdapter::new();
        let wire_a = rect_wire(&mut adapter, 4.0, 4.0);
        let face_a = adapter.make_face(wire_a).unwrap();
        let a = adapter.make_prism(face_a, GeomVec::new(0.0, 0.0, 2.0)).unwrap();

        let e1 = adapter
            .make_edge_line(GeomVec::new(2.0, 2.0, 0.0), GeomVec::new(6.0, 2.0, 0.0))
            .unwrap();
        let e2 = adapter
            .make_edge_line(GeomVec::new(6.0, 2.0, 0.0), GeomVec::new(6.0, 6.0, 0.0))
            .unwrap();
        let e3 = adapter
            .make_edge_line(GeomVec::new(6.0, 6.0, 0.0), GeomVec::new(2.0, 6.0, 0.0))
            .unwrap();
        let e4 = adapter
            .make_edge_line(GeomVec::new(2.0, 6.0, 0.0), GeomVec::new(2.0, 2.0, 0.0))
            .unwrap();
        let wire_b = adapter.make_wire(&[e1, e2, e3, e4]).unwrap();
        let face_b = adapter.make_face(wire_b).unwrap();
        let b = adapter.make_prism(face_b, GeomVec::new(0.0, 0.0, 2.0)).unwrap();

        let result = adapter.boolean(BooleanOp::Union, a, b).unwrap();
        assert!(adapter.validate(result));
    }

    #[test]
    fn pre_cancelled_tessellation_is_rejected() {
        let mut adapter = TruckAdapter::new();
        let wire = rect_wire(&mut adapter, 10.0, 5.0);
        let face = adapter.make_face(wire).unwrap();
        let solid = adapter.make_prism(face, GeomVec::new(0.0, 0.0, 3.0)).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(matches!(adapter.tessellate(solid, 0.1, &cancel), Err(KernelError::Cancelled)));
    }
}
