use crate::types::{EdgeId, FaceId, KernelError, RawMesh, SolidId, WireId};
use cad_geom::Vector3;
use cad_types::CancelToken;

/// Boolean combination kind understood by [`Kernel::boolean`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    Union,
    Cut,
    Intersect,
}

/// Thin façade over the underlying B-Rep kernel (§4.9, §6.4).
///
/// Covers shape construction and mutation. Implementations may keep all
/// state in-process (the only one shipped here wraps `truck`); handles are
/// opaque and only meaningful to the adapter that issued them.
pub trait Kernel {
    /// A straight edge between two 3D points.
    fn make_edge_line(&mut self, p1: Vector3, p2: Vector3) -> Result<EdgeId, KernelError>;

    /// A closed circular edge: `center` plus unit `axis` (the circle's
    /// plane normal) and `radius`.
    fn make_edge_circle(
        &mut self,
        center: Vector3,
        axis: Vector3,
        radius: f64,
    ) -> Result<EdgeId, KernelError>;

    /// A trimmed arc edge on the circle `(center, axis, radius)`, swept from
    /// `theta_start` to `theta_end` (radians, in the plane spanned by an
    /// arbitrary in-plane `x_axis` and `axis`).
    fn make_edge_arc(
        &mut self,
        center: Vector3,
        axis: Vector3,
        x_axis: Vector3,
        radius: f64,
        theta_start: f64,
        theta_end: f64,
    ) -> Result<EdgeId, KernelError>;

    /// Assembles an ordered chain of edges into a wire. Does not itself
    /// require the chain to be closed — callers check closure first via
    /// endpoint connectivity (§4.2) before calling [`Kernel::make_face`].
    fn make_wire(&mut self, edges: &[EdgeId]) -> Result<WireId, KernelError>;

    /// Builds a planar face bounded by `wire`. Fails with
    /// [`KernelError::FaceBuildFailed`] if the wire is open or self-intersecting.
    fn make_face(&mut self, wire: WireId) -> Result<FaceId, KernelError>;

    /// Sweeps `face` along `vector` to produce a solid (the "prism").
    fn make_prism(&mut self, face: FaceId, vector: Vector3) -> Result<SolidId, KernelError>;

    /// Boolean-combines two solids.
    fn boolean(&mut self, op: BooleanOp, a: SolidId, b: SolidId) -> Result<SolidId, KernelError>;

    /// Runs the kernel's internal consistency check on a solid.
    fn validate(&self, solid: SolidId) -> bool;

    /// Incrementally meshes a solid to the given chordal deflection.
    /// Checked for cancellation at each face in the solid's shell (§5); a
    /// cancelled tessellation leaves no partial mesh behind.
    fn tessellate(&self, solid: SolidId, deflection: f64, cancel: &CancelToken) -> Result<RawMesh, KernelError>;
}

/// Read-only topology queries used for extrude face-role tagging (§4.9).
/// Never mutates the kernel. (Closed-boundary detection for composite
/// sketch elements is done on 2D endpoints by `cad-sketch`, §4.2 — it does
/// not go through this trait.)
pub trait KernelIntrospect {
    /// Per-face outward-normal hints for `solid`, derived from the solid's
    /// own tessellation (one representative triangle per face range). Used
    /// only to sort an extrude result into end-cap / side-face roles; never
    /// re-exposed in an external payload (§4.9).
    fn face_normals(
        &self,
        solid: SolidId,
        deflection: f64,
    ) -> Result<Vec<(FaceId, Vector3)>, KernelError>;
}
