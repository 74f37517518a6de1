use cad_geom::Vector3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtrudeType {
    Blind,
    Symmetric,
    ThroughAll,
    ToSurface,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ExtrudeDirection {
    Normal,
    Custom(Vector3),
}

/// The sole concrete feature variant in scope for v1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtrudeFeature {
    pub id: String,
    pub sketch_id: String,
    pub element_id: String,
    pub extrude_type: ExtrudeType,
    pub distance: f64,
    /// Second distance, used by `Symmetric` (`d1`/`d2` about the sketch face).
    pub distance_2: f64,
    pub direction: ExtrudeDirection,
    pub reverse: bool,
    pub taper_deg: f64,
    pub result_shape_id: Option<String>,
    pub valid: bool,
    /// Set when a requested mode fell back to `Blind` (§4.5) or taper was ignored (§9.3).
    pub warnings: Vec<String>,
}

impl ExtrudeFeature {
    pub fn new(id: String, sketch_id: String, element_id: String) -> Self {
        Self {
            id,
            sketch_id,
            element_id,
            extrude_type: ExtrudeType::Blind,
            distance: 0.0,
            distance_2: 0.0,
            direction: ExtrudeDirection::Normal,
            reverse: false,
            taper_deg: 0.0,
            result_shape_id: None,
            valid: false,
            warnings: Vec::new(),
        }
    }
}
