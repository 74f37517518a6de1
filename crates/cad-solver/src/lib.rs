//! Sketch constraint solving: variable model, residual formulas, damped
//! Newton-Raphson, and the Horizontal/Vertical inference pass (§4.4).

pub mod error;
pub mod inference;
pub mod model;
pub mod residuals;
pub mod solver;

pub use error::SolverError;
pub use inference::{infer_constraints, InferenceConfig};
pub use model::VarModel;
pub use solver::{solve_sketch, SolveReport, SolverConfig};
