//! Thin dispatch wrappers so scenario tests read as a sequence of
//! operations instead of `CommandRequest { .. , ..Default::default() }`
//! boilerplate. Every wrapper panics with the response's error payload on
//! failure — scenario tests are expected to succeed end to end, and an
//! unexpected failure should point straight at the offending op.

use cad_engine::{dispatch, CommandRequest, CommandResponse, SessionManager};
use serde_json::Value;

pub const SESSION: &str = "harness";

fn req(op: &str) -> CommandRequest {
    CommandRequest { session_id: SESSION.into(), op: op.into(), ..Default::default() }
}

fn unwrap_ok(op: &str, resp: CommandResponse) -> Value {
    if !resp.success {
        let err = resp.error.unwrap();
        panic!("{op} failed: {} ({})", err.message, err.code);
    }
    resp.data.unwrap_or(Value::Null)
}

/// A field pulled out of a successful response's `data`, as a `&str`.
pub fn field<'a>(data: &'a Value, name: &str) -> &'a str {
    data[name].as_str().unwrap_or_else(|| panic!("missing/non-string field {name:?} in {data}"))
}

pub fn create_plane(sessions: &mut SessionManager, plane_type: &str, origin: (f64, f64, f64)) -> String {
    let data = unwrap_ok(
        "create_plane",
        dispatch(
            CommandRequest {
                plane_type: Some(plane_type.into()),
                origin_x: Some(origin.0),
                origin_y: Some(origin.1),
                origin_z: Some(origin.2),
                ..req("create_plane")
            },
            sessions,
        ),
    );
    field(&data, "plane_id").to_string()
}

pub fn create_sketch(sessions: &mut SessionManager, plane_id: &str) -> String {
    let data = unwrap_ok(
        "create_sketch",
        dispatch(CommandRequest { plane_id: Some(plane_id.into()), ..req("create_sketch") }, sessions),
    );
    field(&data, "sketch_id").to_string()
}

pub fn add_line(sessions: &mut SessionManager, sketch_id: &str, x1: f64, y1: f64, x2: f64, y2: f64) -> String {
    let data = unwrap_ok(
        "add_element(line)",
        dispatch(
            CommandRequest {
                sketch_id: Some(sketch_id.into()),
                element_type: Some("line".into()),
                x1: Some(x1),
                y1: Some(y1),
                x2: Some(x2),
                y2: Some(y2),
                ..req("add_element")
            },
            sessions,
        ),
    );
    field(&data, "element_id").to_string()
}

pub fn add_rectangle(sessions: &mut SessionManager, sketch_id: &str, corner_x: f64, corner_y: f64, w: f64, h: f64) -> String {
    let data = unwrap_ok(
        "add_element(rectangle)",
        dispatch(
            CommandRequest {
                sketch_id: Some(sketch_id.into()),
                element_type: Some("rectangle".into()),
                x1: Some(corner_x),
                y1: Some(corner_y),
                width: Some(w),
                height: Some(h),
                ..req("add_element")
            },
            sessions,
        ),
    );
    field(&data, "element_id").to_string()
}

pub fn add_length_constraint(sessions: &mut SessionManager, sketch_id: &str, element_id: &str, value: f64) -> String {
    let data = unwrap_ok(
        "add_constraint(length)",
        dispatch(
            CommandRequest {
                sketch_id: Some(sketch_id.into()),
                constraint_kind: Some("length".into()),
                element_id: Some(element_id.into()),
                constraint_value: Some(value),
                ..req("add_constraint")
            },
            sessions,
        ),
    );
    field(&data, "constraint_id").to_string()
}

pub fn solve_sketch(sessions: &mut SessionManager, sketch_id: &str) -> Value {
    unwrap_ok("solve_sketch", dispatch(CommandRequest { sketch_id: Some(sketch_id.into()), ..req("solve_sketch") }, sessions))
}

pub fn update_constraint_value(sessions: &mut SessionManager, constraint_id: &str, value: f64) {
    unwrap_ok(
        "update_constraint_value",
        dispatch(
            CommandRequest { constraint_id: Some(constraint_id.into()), constraint_value: Some(value), ..req("update_constraint_value") },
            sessions,
        ),
    );
}

#[allow(clippy::too_many_arguments)]
pub fn extrude_blind(sessions: &mut SessionManager, sketch_id: &str, element_id: &str, distance: f64) -> (String, String) {
    let data = unwrap_ok(
        "extrude",
        dispatch(
            CommandRequest {
                sketch_id: Some(sketch_id.into()),
                element_id: Some(element_id.into()),
                element_type: Some("blind".into()),
                distance: Some(distance),
                ..req("extrude")
            },
            sessions,
        ),
    );
    (field(&data, "feature_id").to_string(), field(&data, "shape_id").to_string())
}

pub fn add_fillet(sessions: &mut SessionManager, sketch_id: &str, line1: &str, line2: &str, radius: f64) -> CommandResponse {
    dispatch(
        CommandRequest {
            sketch_id: Some(sketch_id.into()),
            line1_id: Some(line1.into()),
            line2_id: Some(line2.into()),
            radius: Some(radius),
            ..req("add_fillet")
        },
        sessions,
    )
}

pub fn tessellate(sessions: &mut SessionManager, shape_id: &str, deflection: f64) -> Value {
    unwrap_ok(
        "tessellate",
        dispatch(CommandRequest { shape_a: Some(shape_id.into()), deflection: Some(deflection), ..req("tessellate") }, sessions),
    )
}

/// Axis-aligned bounding box of a flattened `[x,y,z, x,y,z, ...]` vertex list.
pub fn aabb(vertices: &[f64]) -> ([f64; 3], [f64; 3]) {
    let mut min = [f64::MAX; 3];
    let mut max = [f64::MIN; 3];
    for chunk in vertices.chunks(3) {
        for i in 0..3 {
            min[i] = min[i].min(chunk[i]);
            max[i] = max[i].max(chunk[i]);
        }
    }
    (min, max)
}
