//! Boolean combination of two solids (§4.6 `boolean_op`).

use crate::error::FeatureError;
use cad_kernel::{BooleanOp, Kernel, SolidId};

pub fn execute<K: Kernel>(kernel: &mut K, op: BooleanOp, a: SolidId, b: SolidId) -> Result<SolidId, FeatureError> {
    Ok(kernel.boolean(op, a, b)?)
}
