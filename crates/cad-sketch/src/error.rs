use cad_kernel::KernelError;

/// Errors raised while building or editing a [`cad_types::Sketch`] (§7).
#[derive(Debug, Clone, thiserror::Error)]
pub enum SketchError {
    #[error("element not found: {id}")]
    ElementNotFound { id: String },
    #[error("{id} is not a Line element")]
    NotALine { id: String },
    #[error("invariant violated: {reason}")]
    InvariantViolated { reason: String },
    #[error("the two lines are parallel")]
    FilletParallelLines,
    #[error("fillet is infeasible: {reason}")]
    FilletInfeasible { reason: String },
    #[error("chamfer is infeasible: {reason}")]
    ChamferInfeasible { reason: String },
    #[error("arc construction is infeasible: {reason}")]
    ArcInfeasible { reason: String },
    #[error("wire is open")]
    WireOpen,
    #[error("face construction failed: {reason}")]
    FaceBuildFailed { reason: String },
    #[error("element is not extrudable: {reason}")]
    NotExtrudable { reason: String },
    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),
    #[error("operation cancelled")]
    Cancelled,
}
