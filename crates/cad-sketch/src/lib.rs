//! Sketch construction: primitives, composites, fillets/chamfers, and their
//! assembly into kernel wires and faces (§4.2, §4.3).

pub mod arc;
pub mod chamfer;
pub mod elements;
pub mod error;
pub mod fillet;
pub mod wire;

pub use chamfer::add_chamfer;
pub use elements::{add_arc_endpoints_radius, add_arc_three_point, add_circle, add_line, add_polygon, add_rectangle, delete_element, modify_element};
pub use error::SketchError;
pub use fillet::add_fillet;
pub use wire::{build_face_from_element, build_face_from_wire, build_wire, is_closed_boundary};
