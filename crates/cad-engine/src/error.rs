//! The external error taxonomy (§7). Every lower-crate error is mapped here
//! at the `CommandAPI` boundary; nothing below this crate knows these codes.

use cad_features::FeatureError;
use cad_kernel::KernelError;
use cad_sketch::SketchError;
use cad_solver::SolverError;

#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("no engine for session {session_id}")]
    SessionUnknown { session_id: String },
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("invalid arguments: {details:?}")]
    InvalidArgs { details: Vec<String> },
    #[error("invariant violated: {reason}")]
    InvariantViolated { reason: String },
    #[error("wire is open")]
    WireOpen,
    #[error("face construction failed: {reason}")]
    FaceBuildFailed { reason: String },
    #[error("the two lines are parallel")]
    FilletParallelLines,
    #[error("fillet is infeasible: {reason}")]
    FilletInfeasible { reason: String },
    #[error("chamfer is infeasible: {reason}")]
    ChamferInfeasible { reason: String },
    #[error("arc construction is infeasible: {reason}")]
    ArcInfeasible { reason: String },
    #[error("element is not extrudable: {reason}")]
    NotExtrudable { reason: String },
    #[error("constraint solver did not converge: {reason}")]
    ConstraintUnsolved { reason: String },
    #[error("constraint system is inconsistent: {reason}")]
    ConstraintInconsistent { reason: String },
    #[error("kernel failure: {reason}")]
    KernelFailure { reason: String },
    #[error("operation cancelled")]
    Cancelled,
    #[error("not implemented: {operation}")]
    NotImplemented { operation: String },
}

impl EngineError {
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::SessionUnknown { .. } => "SessionUnknown",
            EngineError::NotFound { .. } => "NotFound",
            EngineError::InvalidArgs { .. } => "InvalidArgs",
            EngineError::InvariantViolated { .. } => "InvariantViolated",
            EngineError::WireOpen => "WireOpen",
            EngineError::FaceBuildFailed { .. } => "FaceBuildFailed",
            EngineError::FilletParallelLines => "FilletParallelLines",
            EngineError::FilletInfeasible { .. } => "FilletInfeasible",
            EngineError::ChamferInfeasible { .. } => "ChamferInfeasible",
            EngineError::ArcInfeasible { .. } => "ArcInfeasible",
            EngineError::NotExtrudable { .. } => "NotExtrudable",
            EngineError::ConstraintUnsolved { .. } => "ConstraintUnsolved",
            EngineError::ConstraintInconsistent { .. } => "ConstraintInconsistent",
            EngineError::KernelFailure { .. } => "KernelFailure",
            EngineError::Cancelled => "Cancelled",
            EngineError::NotImplemented { .. } => "NotImplemented",
        }
    }
}

impl From<SketchError> for EngineError {
    fn from(e: SketchError) -> Self {
        match e {
            SketchError::ElementNotFound { id } => EngineError::NotFound { kind: "element", id },
            SketchError::NotALine { id } => {
                EngineError::InvariantViolated { reason: format!("{id} is not a Line element") }
            }
            SketchError::InvariantViolated { reason } => EngineError::InvariantViolated { reason },
            SketchError::FilletParallelLines => EngineError::FilletParallelLines,
            SketchError::FilletInfeasible { reason } => EngineError::FilletInfeasible { reason },
            SketchError::ChamferInfeasible { reason } => EngineError::ChamferInfeasible { reason },
            SketchError::ArcInfeasible { reason } => EngineError::ArcInfeasible { reason },
            SketchError::WireOpen => EngineError::WireOpen,
            SketchError::FaceBuildFailed { reason } => EngineError::FaceBuildFailed { reason },
            SketchError::NotExtrudable { reason } => EngineError::NotExtrudable { reason },
            SketchError::Kernel(k) => k.into(),
            SketchError::Cancelled => EngineError::Cancelled,
        }
    }
}

impl From<SolverError> for EngineError {
    fn from(e: SolverError) -> Self {
        match e {
            SolverError::ElementNotFound { id } => EngineError::NotFound { kind: "element", id },
            SolverError::UnsupportedElement { id, reason } => {
                EngineError::InvariantViolated { reason: format!("{id}: {reason}") }
            }
            SolverError::ConstraintUnsolved { iterations, residual_inf } => EngineError::ConstraintUnsolved {
                reason: format!("did not converge within {iterations} iterations (residual {residual_inf:.3e})"),
            },
            SolverError::ConstraintInconsistent { residual_inf } => {
                EngineError::ConstraintInconsistent { reason: format!("residual stalled at {residual_inf:.3e}") }
            }
            SolverError::Cancelled => EngineError::Cancelled,
        }
    }
}

impl From<FeatureError> for EngineError {
    fn from(e: FeatureError) -> Self {
        match e {
            FeatureError::InvalidDistance { reason } => EngineError::InvalidArgs { details: vec![reason] },
            FeatureError::DegenerateDirection => {
                EngineError::InvalidArgs { details: vec!["extrude direction is degenerate".into()] }
            }
            FeatureError::EmptySketch => EngineError::NotExtrudable { reason: "sketch is empty".into() },
            FeatureError::Sketch(s) => s.into(),
            FeatureError::Kernel(k) => k.into(),
        }
    }
}

impl From<KernelError> for EngineError {
    fn from(e: KernelError) -> Self {
        match e {
            KernelError::WireOpen => EngineError::WireOpen,
            KernelError::FaceBuildFailed { reason } => EngineError::FaceBuildFailed { reason },
            KernelError::Cancelled => EngineError::Cancelled,
            other => EngineError::KernelFailure { reason: other.to_string() },
        }
    }
}
