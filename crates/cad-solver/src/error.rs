/// Errors raised while solving a sketch's constraint system (§4.4, §7).
#[derive(Debug, Clone, thiserror::Error)]
pub enum SolverError {
    #[error("constraint target not found: {id}")]
    ElementNotFound { id: String },
    #[error("constraint kind does not apply to element {id}: {reason}")]
    UnsupportedElement { id: String, reason: String },
    #[error("solver did not converge within {iterations} iterations (residual {residual_inf:.3e})")]
    ConstraintUnsolved { iterations: usize, residual_inf: f64 },
    #[error("constraint system is inconsistent (residual {residual_inf:.3e} after convergence stalled)")]
    ConstraintInconsistent { residual_inf: f64 },
    #[error("operation cancelled")]
    Cancelled,
}
