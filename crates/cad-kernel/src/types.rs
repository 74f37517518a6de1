use serde::{Deserialize, Serialize};

/// Opaque handle to an edge recorded in the kernel. Not yet materialized
/// into kernel topology until it is assembled into a wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeId(pub u64);

/// Opaque handle to an assembled wire (ordered chain of edges).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WireId(pub u64);

/// Opaque handle to a bounded face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceId(pub u64);

/// Opaque handle to a solid. Never persisted across process restarts;
/// stable only for the lifetime of the owning engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SolidId(pub u64);

/// Opaque handle to a vertex, exposed only through `KernelIntrospect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexId(pub u64);

macro_rules! impl_id_serde {
    ($t:ident) => {
        impl Serialize for $t {
            fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                self.0.serialize(s)
            }
        }
        impl<'de> Deserialize<'de> for $t {
            fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                u64::deserialize(d).map($t)
            }
        }
    };
}

impl_id_serde!(EdgeId);
impl_id_serde!(WireId);
impl_id_serde!(FaceId);
impl_id_serde!(SolidId);
impl_id_serde!(VertexId);

#[derive(Debug, Clone, thiserror::Error)]
pub enum KernelError {
    #[error("edge {0:?} not found")]
    EdgeNotFound(EdgeId),
    #[error("wire {0:?} not found")]
    WireNotFound(WireId),
    #[error("face {0:?} not found")]
    FaceNotFound(FaceId),
    #[error("solid {0:?} not found")]
    SolidNotFound(SolidId),
    #[error("wire is not closed")]
    WireOpen,
    #[error("face construction failed: {reason}")]
    FaceBuildFailed { reason: String },
    #[error("boolean operation failed: {reason}")]
    BooleanFailed { reason: String },
    #[error("tessellation failed: {reason}")]
    TessellationFailed { reason: String },
    #[error("degenerate input: {reason}")]
    DegenerateInput { reason: String },
    #[error("operation cancelled")]
    Cancelled,
}

/// Triangle mesh of a single solid, still keyed by face so the engine can
/// merge seam vertices and recompute normals per §4.7.
#[derive(Debug, Clone, Default)]
pub struct RawMesh {
    pub positions: Vec<[f64; 3]>,
    pub normals: Vec<[f64; 3]>,
    /// Triangle indices into `positions`/`normals`, 3 per triangle.
    pub indices: Vec<u32>,
    /// Contiguous `[start, end)` ranges into `indices`, one per source face.
    pub face_ranges: Vec<(FaceId, u32, u32)>,
}
