//! Thin façade over the B-Rep kernel (§4.9, §6.4): edges from curves, wires
//! from edges, faces from wires, prisms, booleans, incremental meshing.
//! The rest of the workspace talks to geometry only through [`Kernel`] and
//! [`KernelIntrospect`] — nobody above this crate touches `truck` directly.

pub mod traits;
pub mod truck_adapter;
pub mod types;

pub use traits::{BooleanOp, Kernel, KernelIntrospect};
pub use truck_adapter::TruckAdapter;
pub use types::{EdgeId, FaceId, KernelError, RawMesh, SolidId, VertexId, WireId};
