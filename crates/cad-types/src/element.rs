use serde::{Deserialize, Serialize};

pub type VarId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SketchElementKind {
    Line,
    Circle,
    Arc,
    Rectangle,
    Polygon,
    Fillet,
    Chamfer,
}

impl SketchElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SketchElementKind::Line => "line",
            SketchElementKind::Circle => "circle",
            SketchElementKind::Arc => "arc",
            SketchElementKind::Rectangle => "rectangle",
            SketchElementKind::Polygon => "polygon",
            SketchElementKind::Fillet => "fillet",
            SketchElementKind::Chamfer => "chamfer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineParams {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircleParams {
    pub cx: f64,
    pub cy: f64,
    pub r: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcParams {
    pub cx: f64,
    pub cy: f64,
    pub r: f64,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    /// Sweep start angle in radians, derived from the stored endpoints (never hard-coded).
    pub theta_start: f64,
    /// Sweep end angle in radians, derived from the stored endpoints.
    pub theta_end: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectangleParams {
    pub corner_x: f64,
    pub corner_y: f64,
    pub w: f64,
    pub h: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolygonParams {
    pub cx: f64,
    pub cy: f64,
    pub sides: u32,
    pub circumradius: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilletParams {
    pub radius: f64,
    pub center_x: f64,
    pub center_y: f64,
    pub tangent1_x: f64,
    pub tangent1_y: f64,
    pub tangent2_x: f64,
    pub tangent2_y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChamferParams {
    pub distance: f64,
    pub p1_x: f64,
    pub p1_y: f64,
    pub p2_x: f64,
    pub p2_y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ElementParams {
    Line(LineParams),
    Circle(CircleParams),
    Arc(ArcParams),
    Rectangle(RectangleParams),
    Polygon(PolygonParams),
    Fillet(FilletParams),
    Chamfer(ChamferParams),
}

/// A single sketch primitive: a line/circle/arc, a composite-parent
/// rectangle/polygon, or a fillet/chamfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SketchElement {
    pub id: String,
    pub kind: SketchElementKind,
    pub parameters_2d: ElementParams,
    pub is_composite_parent: bool,
    pub is_container_only: bool,
    pub parent_id: Option<String>,
    pub child_ids: Vec<String>,
    /// For fillet/chamfer: the two Line elements it joins.
    pub referenced_elements: Vec<String>,
    pub constraint_variables: Vec<VarId>,
}

impl SketchElement {
    pub fn new(id: String, kind: SketchElementKind, parameters_2d: ElementParams) -> Self {
        Self {
            id,
            kind,
            parameters_2d,
            is_composite_parent: false,
            is_container_only: false,
            parent_id: None,
            child_ids: Vec::new(),
            referenced_elements: Vec::new(),
            constraint_variables: Vec::new(),
        }
    }

    pub fn as_line(&self) -> Option<&LineParams> {
        match &self.parameters_2d {
            ElementParams::Line(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_line_mut(&mut self) -> Option<&mut LineParams> {
        match &mut self.parameters_2d {
            ElementParams::Line(p) => Some(p),
            _ => None,
        }
    }

    /// True when this element is entirely metadata and contributes no edge
    /// of its own (a rectangle/polygon composite parent).
    pub fn produces_no_edge(&self) -> bool {
        self.is_container_only
    }
}
