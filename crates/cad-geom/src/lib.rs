//! 2D/3D vector math shared by the sketch, solver, and kernel-adapter layers.

pub mod intersection;
pub mod point;
pub mod vector;

pub use intersection::{
    angle_between, cross2, line_circle_intersection, line_line_intersection, unit_direction,
};
pub use point::Point2;
pub use vector::Vector3;
