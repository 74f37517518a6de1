use cad_kernel::KernelError;
use cad_sketch::SketchError;

/// Errors raised while validating or executing a feature (§4.5, §7).
#[derive(Debug, Clone, thiserror::Error)]
pub enum FeatureError {
    #[error("invalid distance: {reason}")]
    InvalidDistance { reason: String },
    #[error("extrude direction is degenerate")]
    DegenerateDirection,
    #[error("sketch is empty and no face was supplied")]
    EmptySketch,
    #[error(transparent)]
    Sketch(#[from] SketchError),
    #[error(transparent)]
    Kernel(#[from] KernelError),
}
