//! The flat command API (§6.1): one request/response shape for every
//! operation, addressed by the `op` string rather than a typed message enum.

use cad_geom::Vector3;
use cad_kernel::BooleanOp;
use cad_types::{CircleParams, ConstraintKind, ExtrudeDirection, ExtrudeType, LineParams, PlaneKind, PolygonParams, RectangleParams};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::instrument;

use crate::error::EngineError;
use crate::session::SessionManager;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandRequest {
    pub session_id: String,
    pub op: String,

    pub plane_type: Option<String>,
    pub origin_x: Option<f64>,
    pub origin_y: Option<f64>,
    pub origin_z: Option<f64>,
    pub plane_id: Option<String>,

    pub sketch_id: Option<String>,
    pub element_type: Option<String>,
    pub element_id: Option<String>,

    pub x1: Option<f64>,
    pub y1: Option<f64>,
    pub x2: Option<f64>,
    pub y2: Option<f64>,
    pub x_mid: Option<f64>,
    pub y_mid: Option<f64>,
    pub center_x: Option<f64>,
    pub center_y: Option<f64>,
    pub radius: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub sides: Option<u32>,
    pub arc_type: Option<String>,

    pub line1_id: Option<String>,
    pub line2_id: Option<String>,
    pub distance: Option<f64>,
    pub distance_2: Option<f64>,

    pub direction: Option<String>,
    pub reverse: Option<bool>,
    pub taper_deg: Option<f64>,

    pub constraint_kind: Option<String>,
    pub constraint_id: Option<String>,
    pub constraint_value: Option<f64>,

    pub shape_a: Option<String>,
    pub shape_b: Option<String>,
    pub result_id: Option<String>,

    pub deflection: Option<f64>,
    pub format: Option<String>,

    /// Caller-assigned id for this operation, enabling a later `"cancel"`
    /// request to reach it (§6.5). Only meaningful for the cancellable
    /// operations: `solve_sketch`, `extrude`, `tessellate`, `export`.
    pub op_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub details: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct CommandResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visualization_data: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub child_visualizations: Vec<Value>,
}

impl CommandResponse {
    fn ok(data: Value) -> Self {
        Self { success: true, data: Some(data), ..Default::default() }
    }

    fn ok_visualization(data: Value, viz: Value) -> Self {
        Self { success: true, data: Some(data), visualization_data: Some(viz), ..Default::default() }
    }

    fn error(e: EngineError) -> Self {
        let details = match &e {
            EngineError::InvalidArgs { details } => details.clone(),
            _ => Vec::new(),
        };
        Self {
            success: false,
            error: Some(ErrorPayload { code: e.code().to_string(), message: e.to_string(), details }),
            ..Default::default()
        }
    }
}

fn require_str<'a>(v: &'a Option<String>, field: &str) -> Result<&'a str, EngineError> {
    v.as_deref().ok_or_else(|| EngineError::InvalidArgs { details: vec![format!("missing field: {field}")] })
}

fn require_f64(v: Option<f64>, field: &str) -> Result<f64, EngineError> {
    v.ok_or_else(|| EngineError::InvalidArgs { details: vec![format!("missing field: {field}")] })
}

/// Entry point: never panics, always returns a response envelope.
#[instrument(skip(req, sessions), fields(op = %req.op, session_id = %req.session_id))]
pub fn dispatch(req: CommandRequest, sessions: &mut SessionManager) -> CommandResponse {
    match handle_op(&req, sessions) {
        Ok(resp) => resp,
        Err(e) => CommandResponse::error(e),
    }
}

fn parse_plane_kind(s: &str) -> Result<PlaneKind, EngineError> {
    match s {
        "XY" => Ok(PlaneKind::XY),
        "XZ" => Ok(PlaneKind::XZ),
        "YZ" => Ok(PlaneKind::YZ),
        "Custom" => Ok(PlaneKind::Custom),
        other => Err(EngineError::InvalidArgs { details: vec![format!("unknown plane_type: {other}")] }),
    }
}

fn parse_extrude_type(s: Option<&str>) -> Result<ExtrudeType, EngineError> {
    match s.unwrap_or("blind") {
        "blind" => Ok(ExtrudeType::Blind),
        "symmetric" => Ok(ExtrudeType::Symmetric),
        "through_all" => Ok(ExtrudeType::ThroughAll),
        "to_surface" => Ok(ExtrudeType::ToSurface),
        other => Err(EngineError::InvalidArgs { details: vec![format!("unknown extrude type: {other}")] }),
    }
}

fn parse_extrude_direction(req: &CommandRequest) -> Result<ExtrudeDirection, EngineError> {
    match req.direction.as_deref() {
        None | Some("normal") => Ok(ExtrudeDirection::Normal),
        Some("custom") => {
            let x = require_f64(req.x1, "x1")?;
            let y = require_f64(req.y1, "y1")?;
            let z = require_f64(req.origin_z, "origin_z")?;
            Ok(ExtrudeDirection::Custom(Vector3::new(x, y, z)))
        }
        Some(other) => Err(EngineError::InvalidArgs { details: vec![format!("unknown direction: {other}")] }),
    }
}

fn parse_boolean_op(s: &str) -> Result<BooleanOp, EngineError> {
    match s {
        "union" => Ok(BooleanOp::Union),
        "cut" => Ok(BooleanOp::Cut),
        "intersect" => Ok(BooleanOp::Intersect),
        other => Err(EngineError::InvalidArgs { details: vec![format!("unknown boolean op: {other}")] }),
    }
}

fn parse_constraint_kind(req: &CommandRequest) -> Result<ConstraintKind, EngineError> {
    let kind = require_str(&req.constraint_kind, "constraint_kind")?;
    match kind {
        "length" => Ok(ConstraintKind::Length {
            element: require_str(&req.element_id, "element_id")?.to_string(),
            value: require_f64(req.constraint_value, "constraint_value")?,
        }),
        "horizontal" => Ok(ConstraintKind::Horizontal { line: require_str(&req.element_id, "element_id")?.to_string() }),
        "vertical" => Ok(ConstraintKind::Vertical { line: require_str(&req.element_id, "element_id")?.to_string() }),
        "coincident" => Ok(ConstraintKind::Coincident {
            element_a: require_str(&req.line1_id, "line1_id")?.to_string(),
            element_b: require_str(&req.line2_id, "line2_id")?.to_string(),
        }),
        "perpendicular" => Ok(ConstraintKind::Perpendicular {
            line_a: require_str(&req.line1_id, "line1_id")?.to_string(),
            line_b: require_str(&req.line2_id, "line2_id")?.to_string(),
        }),
        "parallel" => Ok(ConstraintKind::Parallel {
            line_a: require_str(&req.line1_id, "line1_id")?.to_string(),
            line_b: require_str(&req.line2_id, "line2_id")?.to_string(),
        }),
        other => Err(EngineError::InvalidArgs { details: vec![format!("unknown constraint_kind: {other}")] }),
    }
}

fn element_list_json(viz: Vec<crate::visualize::ElementVisualization>) -> (Value, Vec<Value>) {
    let mut iter = viz.into_iter();
    let head = iter.next().map(|v| serde_json::to_value(v).unwrap()).unwrap_or(Value::Null);
    let rest = iter.map(|v| serde_json::to_value(v).unwrap()).collect();
    (head, rest)
}

fn handle_op(req: &CommandRequest, sessions: &mut SessionManager) -> Result<CommandResponse, EngineError> {
    // These two ops act on the session table itself, not on an engine
    // already inside it, so they're handled before `get_or_create` below
    // would otherwise spin one up.
    match req.op.as_str() {
        "open_session" => {
            sessions.get_or_create(&req.session_id);
            return Ok(CommandResponse::ok(json!({"session_id": req.session_id})));
        }
        "close_session" => {
            return if sessions.close(&req.session_id) {
                Ok(CommandResponse::ok(json!({})))
            } else {
                Err(EngineError::SessionUnknown { session_id: req.session_id.clone() })
            };
        }
        _ => {}
    }

    let engine = sessions.get_or_create(&req.session_id);

    match req.op.as_str() {
        "create_plane" => {
            let kind = parse_plane_kind(req.plane_type.as_deref().unwrap_or("XY"))?;
            let origin = Vector3::new(req.origin_x.unwrap_or(0.0), req.origin_y.unwrap_or(0.0), req.origin_z.unwrap_or(0.0));
            let (id, viz) = engine.create_plane(kind, origin);
            Ok(CommandResponse::ok_visualization(json!({"plane_id": id}), serde_json::to_value(viz).unwrap()))
        }
        "delete_plane" => {
            engine.delete_plane(require_str(&req.plane_id, "plane_id")?)?;
            Ok(CommandResponse::ok(json!({})))
        }
        "create_sketch" => {
            let (id, viz) = engine.create_sketch(require_str(&req.plane_id, "plane_id")?)?;
            Ok(CommandResponse::ok_visualization(json!({"sketch_id": id}), serde_json::to_value(viz).unwrap()))
        }
        "delete_sketch" => {
            engine.delete_sketch(require_str(&req.sketch_id, "sketch_id")?)?;
            Ok(CommandResponse::ok(json!({})))
        }
        "add_element" => {
            let sketch_id = require_str(&req.sketch_id, "sketch_id")?;
            let kind = require_str(&req.element_type, "element_type")?;
            let viz = match kind {
                "line" => engine.add_line(
                    sketch_id,
                    LineParams {
                        x1: require_f64(req.x1, "x1")?,
                        y1: require_f64(req.y1, "y1")?,
                        x2: require_f64(req.x2, "x2")?,
                        y2: require_f64(req.y2, "y2")?,
                    },
                )?,
                "circle" => engine.add_circle(
                    sketch_id,
                    CircleParams { cx: require_f64(req.center_x, "center_x")?, cy: require_f64(req.center_y, "center_y")?, r: require_f64(req.radius, "radius")? },
                )?,
                "arc" => match req.arc_type.as_deref().unwrap_or("three_point") {
                    "three_point" => engine.add_arc_three_point(
                        sketch_id,
                        require_f64(req.x1, "x1")?,
                        require_f64(req.y1, "y1")?,
                        require_f64(req.x_mid, "x_mid")?,
                        require_f64(req.y_mid, "y_mid")?,
                        require_f64(req.x2, "x2")?,
                        require_f64(req.y2, "y2")?,
                    )?,
                    "endpoints_radius" => engine.add_arc_endpoints_radius(
                        sketch_id,
                        require_f64(req.x1, "x1")?,
                        require_f64(req.y1, "y1")?,
                        require_f64(req.x2, "x2")?,
                        require_f64(req.y2, "y2")?,
                        require_f64(req.radius, "radius")?,
                    )?,
                    other => return Err(EngineError::InvalidArgs { details: vec![format!("unknown arc_type: {other}")] }),
                },
                "rectangle" => engine.add_rectangle(
                    sketch_id,
                    RectangleParams {
                        corner_x: require_f64(req.x1, "x1")?,
                        corner_y: require_f64(req.y1, "y1")?,
                        w: require_f64(req.width, "width")?,
                        h: require_f64(req.height, "height")?,
                    },
                )?,
                "polygon" => engine.add_polygon(
                    sketch_id,
                    PolygonParams {
                        cx: require_f64(req.center_x, "center_x")?,
                        cy: require_f64(req.center_y, "center_y")?,
                        sides: req.sides.ok_or_else(|| EngineError::InvalidArgs { details: vec!["missing field: sides".into()] })?,
                        circumradius: require_f64(req.radius, "radius")?,
                    },
                )?,
                other => return Err(EngineError::InvalidArgs { details: vec![format!("unknown element_type: {other}")] }),
            };
            let (head, rest) = element_list_json(viz);
            Ok(CommandResponse { success: true, data: Some(json!({"element_id": head["element_id"]})), visualization_data: Some(head), child_visualizations: rest, error: None })
        }
        "modify_element" => {
            let sketch_id = require_str(&req.sketch_id, "sketch_id")?;
            let element_id = require_str(&req.element_id, "element_id")?;
            let params = match req.element_type.as_deref().unwrap_or("line") {
                "line" => cad_types::ElementParams::Line(LineParams {
                    x1: require_f64(req.x1, "x1")?,
                    y1: require_f64(req.y1, "y1")?,
                    x2: require_f64(req.x2, "x2")?,
                    y2: require_f64(req.y2, "y2")?,
                }),
                "circle" => cad_types::ElementParams::Circle(CircleParams {
                    cx: require_f64(req.center_x, "center_x")?,
                    cy: require_f64(req.center_y, "center_y")?,
                    r: require_f64(req.radius, "radius")?,
                }),
                other => return Err(EngineError::InvalidArgs { details: vec![format!("modify_element does not support element_type: {other}")] }),
            };
            let viz = engine.modify_element(sketch_id, element_id, params)?;
            let (head, rest) = element_list_json(viz);
            Ok(CommandResponse { success: true, data: Some(json!({})), visualization_data: Some(head), child_visualizations: rest, error: None })
        }
        "delete_element" => {
            engine.delete_element(require_str(&req.sketch_id, "sketch_id")?, require_str(&req.element_id, "element_id")?)?;
            Ok(CommandResponse::ok(json!({})))
        }
        "add_fillet" => {
            let viz = engine.add_fillet(
                require_str(&req.sketch_id, "sketch_id")?,
                require_str(&req.line1_id, "line1_id")?,
                require_str(&req.line2_id, "line2_id")?,
                require_f64(req.radius, "radius")?,
            )?;
            let (head, rest) = element_list_json(viz);
            Ok(CommandResponse { success: true, data: Some(json!({"element_id": head["element_id"]})), visualization_data: Some(head), child_visualizations: rest, error: None })
        }
        "add_chamfer" => {
            let viz = engine.add_chamfer(
                require_str(&req.sketch_id, "sketch_id")?,
                require_str(&req.line1_id, "line1_id")?,
                require_str(&req.line2_id, "line2_id")?,
                require_f64(req.distance, "distance")?,
            )?;
            let (head, rest) = element_list_json(viz);
            Ok(CommandResponse { success: true, data: Some(json!({"element_id": head["element_id"]})), visualization_data: Some(head), child_visualizations: rest, error: None })
        }
        "add_constraint" => {
            let sketch_id = require_str(&req.sketch_id, "sketch_id")?;
            let kind = parse_constraint_kind(req)?;
            let id = engine.add_constraint(sketch_id, kind)?;
            Ok(CommandResponse::ok(json!({"constraint_id": id})))
        }
        "update_constraint_value" => {
            engine.update_constraint_value(require_str(&req.constraint_id, "constraint_id")?, require_f64(req.constraint_value, "constraint_value")?)?;
            Ok(CommandResponse::ok(json!({})))
        }
        "delete_constraint" => {
            engine.delete_constraint(require_str(&req.constraint_id, "constraint_id")?)?;
            Ok(CommandResponse::ok(json!({})))
        }
        "solve_sketch" => {
            let report = engine.solve_sketch(require_str(&req.sketch_id, "sketch_id")?, req.op_id.as_deref())?;
            Ok(CommandResponse::ok(json!({"iterations": report.iterations, "residual_inf": report.residual_inf})))
        }
        "extrude" => {
            // No dedicated extrude-type field in the flat schema; `element_type`
            // is reused here to carry "blind"/"symmetric"/"through_all"/"to_surface".
            let extrude_type = parse_extrude_type(req.element_type.as_deref())?;
            let direction = parse_extrude_direction(req)?;
            let (feature_id, shape_id) = engine.extrude(
                require_str(&req.sketch_id, "sketch_id")?,
                require_str(&req.element_id, "element_id")?,
                extrude_type,
                req.distance.unwrap_or(0.0),
                req.distance_2.unwrap_or(0.0),
                direction,
                req.reverse.unwrap_or(false),
                req.taper_deg.unwrap_or(0.0),
                req.op_id.as_deref(),
            )?;
            Ok(CommandResponse::ok(json!({"feature_id": feature_id, "shape_id": shape_id})))
        }
        "boolean_op" => {
            // No dedicated op-kind field either; `constraint_kind` carries
            // "union"/"cut"/"intersect" for this op.
            let op = parse_boolean_op(require_str(&req.constraint_kind, "constraint_kind")?)?;
            let result_id = engine.boolean_op(
                op,
                require_str(&req.shape_a, "shape_a")?,
                require_str(&req.shape_b, "shape_b")?,
                require_str(&req.result_id, "result_id")?.to_string(),
            )?;
            Ok(CommandResponse::ok(json!({"shape_id": result_id})))
        }
        "tessellate" => {
            // `shape_a` doubles as the single shape-id field outside boolean_op.
            let mesh = engine.tessellate(require_str(&req.shape_a, "shape_a")?, req.deflection.unwrap_or(0.1), req.op_id.as_deref())?;
            Ok(CommandResponse::ok(serde_json::to_value(mesh).unwrap()))
        }
        "visualize_plane" => {
            let viz = engine.visualize_plane(require_str(&req.plane_id, "plane_id")?)?;
            Ok(CommandResponse::ok_visualization(json!({}), serde_json::to_value(viz).unwrap()))
        }
        "visualize_sketch" => {
            let viz = engine.visualize_sketch(require_str(&req.sketch_id, "sketch_id")?)?;
            Ok(CommandResponse::ok_visualization(json!({}), serde_json::to_value(viz).unwrap()))
        }
        "visualize_element" => {
            let viz = engine.visualize_element(require_str(&req.sketch_id, "sketch_id")?, require_str(&req.element_id, "element_id")?)?;
            let (head, rest) = element_list_json(viz);
            Ok(CommandResponse { success: true, data: Some(json!({})), visualization_data: Some(head), child_visualizations: rest, error: None })
        }
        "export" => {
            let bytes = engine.export(require_str(&req.shape_a, "shape_a")?, req.format.as_deref().unwrap_or("stl"), req.op_id.as_deref())?;
            Ok(CommandResponse::ok(json!({"bytes_base64": base64_encode(&bytes)})))
        }
        "cancel" => {
            let op_id = require_str(&req.op_id, "op_id")?;
            let cancelled = engine.cancel_op(op_id);
            Ok(CommandResponse::ok(json!({"cancelled": cancelled})))
        }
        other => Err(EngineError::InvalidArgs { details: vec![format!("unknown op: {other}")] }),
    }
}

/// Minimal base64 encoder for the export payload; avoids pulling in a
/// dedicated crate for a single call site.
fn base64_encode(data: &[u8]) -> String {
    const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut out = String::with_capacity((data.len() + 2) / 3 * 4);
    for chunk in data.chunks(3) {
        let b0 = chunk[0];
        let b1 = *chunk.get(1).unwrap_or(&0);
        let b2 = *chunk.get(2).unwrap_or(&0);
        let n = ((b0 as u32) << 16) | ((b1 as u32) << 8) | (b2 as u32);
        out.push(ALPHABET[(n >> 18 & 0x3F) as usize] as char);
        out.push(ALPHABET[(n >> 12 & 0x3F) as usize] as char);
        out.push(if chunk.len() > 1 { ALPHABET[(n >> 6 & 0x3F) as usize] as char } else { '=' });
        out.push(if chunk.len() > 2 { ALPHABET[(n & 0x3F) as usize] as char } else { '=' });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(op: &str) -> CommandRequest {
        CommandRequest { session_id: "s1".into(), op: op.into(), ..Default::default() }
    }

    #[test]
    fn unknown_op_reports_invalid_args() {
        let mut sessions = SessionManager::new();
        let resp = dispatch(req("not_a_real_op"), &mut sessions);
        assert!(!resp.success);
        assert_eq!(resp.error.unwrap().code, "InvalidArgs");
    }

    #[test]
    fn create_plane_and_sketch_then_add_a_line() {
        let mut sessions = SessionManager::new();
        let plane_resp = dispatch(
            CommandRequest { session_id: "s1".into(), op: "create_plane".into(), plane_type: Some("XY".into()), ..Default::default() },
            &mut sessions,
        );
        assert!(plane_resp.success);
        let plane_id = plane_resp.data.unwrap()["plane_id"].as_str().unwrap().to_string();

        let sketch_resp = dispatch(
            CommandRequest { session_id: "s1".into(), op: "create_sketch".into(), plane_id: Some(plane_id), ..Default::default() },
            &mut sessions,
        );
        assert!(sketch_resp.success);
        let sketch_id = sketch_resp.data.unwrap()["sketch_id"].as_str().unwrap().to_string();

        let line_resp = dispatch(
            CommandRequest {
                session_id: "s1".into(),
                op: "add_element".into(),
                sketch_id: Some(sketch_id),
                element_type: Some("line".into()),
                x1: Some(0.0),
                y1: Some(0.0),
                x2: Some(10.0),
                y2: Some(0.0),
                ..Default::default()
            },
            &mut sessions,
        );
        assert!(line_resp.success);
    }

    #[test]
    fn missing_required_field_is_reported_as_invalid_args() {
        let mut sessions = SessionManager::new();
        let resp = dispatch(CommandRequest { session_id: "s1".into(), op: "create_sketch".into(), ..Default::default() }, &mut sessions);
        assert!(!resp.success);
        assert_eq!(resp.error.unwrap().code, "InvalidArgs");
    }

    #[test]
    fn cancel_of_an_unknown_op_id_reports_not_cancelled() {
        let mut sessions = SessionManager::new();
        let resp = dispatch(
            CommandRequest { session_id: "s1".into(), op: "cancel".into(), op_id: Some("op_1".into()), ..Default::default() },
            &mut sessions,
        );
        assert!(resp.success);
        assert_eq!(resp.data.unwrap()["cancelled"], false);
    }

    #[test]
    fn open_and_close_session_round_trip() {
        let mut sessions = SessionManager::new();
        let open_resp = dispatch(CommandRequest { session_id: "s1".into(), op: "open_session".into(), ..Default::default() }, &mut sessions);
        assert!(open_resp.success);
        assert_eq!(open_resp.data.unwrap()["session_id"], "s1");
        assert_eq!(sessions.session_count(), 1);

        let close_resp = dispatch(CommandRequest { session_id: "s1".into(), op: "close_session".into(), ..Default::default() }, &mut sessions);
        assert!(close_resp.success);
        assert_eq!(sessions.session_count(), 0);
    }

    #[test]
    fn close_session_on_an_unknown_session_reports_session_unknown() {
        let mut sessions = SessionManager::new();
        let resp = dispatch(CommandRequest { session_id: "ghost".into(), op: "close_session".into(), ..Default::default() }, &mut sessions);
        assert!(!resp.success);
        assert_eq!(resp.error.unwrap().code, "SessionUnknown");
    }
}
