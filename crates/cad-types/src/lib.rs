//! Data model shared by the sketch, solver, feature, and engine layers:
//! planes, sketch elements, constraints, and the extrude feature.

pub mod cancel;
pub mod constraint;
pub mod element;
pub mod feature;
pub mod plane;
pub mod sketch;

pub use cancel::CancelToken;
pub use constraint::{Constraint, ConstraintKind};
pub use element::{
    ArcParams, ChamferParams, CircleParams, ElementParams, FilletParams, LineParams,
    PolygonParams, RectangleParams, SketchElement, SketchElementKind, VarId,
};
pub use feature::{ExtrudeDirection, ExtrudeFeature, ExtrudeType};
pub use plane::{Plane, PlaneKind};
pub use sketch::{DimensionCache, ElementMap, Sketch};
