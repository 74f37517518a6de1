use serde::{Deserialize, Serialize};

/// Constraint kinds. Narrower than the ancestor engine's constraint set by
/// design — length / horizontal / vertical / coincident / perpendicular /
/// parallel are the only kinds in scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ConstraintKind {
    Length { element: String, value: f64 },
    Horizontal { line: String },
    Vertical { line: String },
    Coincident { element_a: String, element_b: String },
    Perpendicular { line_a: String, line_b: String },
    Parallel { line_a: String, line_b: String },
}

impl ConstraintKind {
    pub fn target_element_ids(&self) -> Vec<String> {
        match self {
            ConstraintKind::Length { element, .. } => vec![element.clone()],
            ConstraintKind::Horizontal { line } => vec![line.clone()],
            ConstraintKind::Vertical { line } => vec![line.clone()],
            ConstraintKind::Coincident { element_a, element_b } => {
                vec![element_a.clone(), element_b.clone()]
            }
            ConstraintKind::Perpendicular { line_a, line_b } => {
                vec![line_a.clone(), line_b.clone()]
            }
            ConstraintKind::Parallel { line_a, line_b } => vec![line_a.clone(), line_b.clone()],
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            ConstraintKind::Length { value, .. } => Some(*value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constraint {
    pub id: String,
    pub sketch_id: String,
    pub kind: ConstraintKind,
}

impl Constraint {
    pub fn new(id: String, sketch_id: String, kind: ConstraintKind) -> Self {
        Self { id, sketch_id, kind }
    }
}
