//! Horizontal/Vertical inference pass (§4.4), run after a primitive add or
//! edit touches a set of lines.

use cad_types::{ConstraintKind, Sketch};

#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub eps_abs: f64,
    pub eps_rel: f64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self { eps_abs: 1e-4, eps_rel: 1e-2 }
    }
}

/// Proposes Horizontal/Vertical constraints for `touched` lines that are
/// nearly axis-aligned, skipping any line that already carries either kind.
pub fn infer_constraints(
    sketch: &Sketch,
    existing: &[ConstraintKind],
    touched: &[String],
    config: &InferenceConfig,
) -> Vec<ConstraintKind> {
    let mut proposals = Vec::new();
    for id in touched {
        let Some(element) = sketch.elements.get(id) else { continue };
        let Some(line) = element.as_line() else { continue };

        let has_h = existing.iter().any(|c| matches!(c, ConstraintKind::Horizontal { line } if line == id));
        let has_v = existing.iter().any(|c| matches!(c, ConstraintKind::Vertical { line } if line == id));
        if has_h || has_v {
            continue;
        }

        let dy = (line.y2 - line.y1).abs();
        let dx = (line.x2 - line.x1).abs();
        if dy < config.eps_abs || dy < config.eps_rel * dx {
            proposals.push(ConstraintKind::Horizontal { line: id.clone() });
        } else if dx < config.eps_abs || dx < config.eps_rel * dy {
            proposals.push(ConstraintKind::Vertical { line: id.clone() });
        }
    }
    proposals
}
