//! Literal I/O scenarios (§8 "Scenarios").

use cad_engine::{dispatch, CommandRequest, SessionManager};

use crate::helpers::*;

#[test]
fn s1_create_xy_plane() {
    let mut sessions = SessionManager::new();
    let resp = dispatch(
        CommandRequest {
            session_id: SESSION.into(),
            op: "create_plane".into(),
            plane_type: Some("XY".into()),
            origin_x: Some(0.0),
            origin_y: Some(0.0),
            origin_z: Some(0.0),
            ..Default::default()
        },
        &mut sessions,
    );
    assert!(resp.success);
    assert_eq!(resp.data.unwrap()["plane_id"], "plane_1");

    let viz = resp.visualization_data.unwrap();
    assert_eq!(viz["plane_id"], "plane_1");
    assert_eq!(viz["plane_type"], "XY");
    assert_eq!(viz["origin"], serde_json::json!([0.0, 0.0, 0.0]));
    assert_eq!(viz["normal"], serde_json::json!([0.0, 0.0, 1.0]));
    assert_eq!(viz["u_axis"], serde_json::json!([1.0, 0.0, 0.0]));
    assert_eq!(viz["v_axis"], serde_json::json!([0.0, 1.0, 0.0]));
}

#[test]
fn s2_sketch_rectangle_extrude() {
    let mut sessions = SessionManager::new();
    let plane_id = create_plane(&mut sessions, "XY", (0.0, 0.0, 0.0));
    let sketch_id = create_sketch(&mut sessions, &plane_id);
    assert_eq!(sketch_id, "sketch_1");

    let rect_id = add_rectangle(&mut sessions, &sketch_id, 0.0, 0.0, 10.0, 5.0);
    assert!(rect_id.starts_with("rectangle_1_"));

    let engine = sessions.get(SESSION).unwrap();
    let sketch = engine.sketches.get(&sketch_id).unwrap();
    let rect = sketch.elements.get(&rect_id).unwrap();
    let expect_children: Vec<String> =
        ["bottom", "right", "top", "left"].iter().map(|n| format!("{rect_id}_line_{n}")).collect();
    assert_eq!(rect.child_ids, expect_children);

    let (_, shape_id) = extrude_blind(&mut sessions, &sketch_id, &rect_id, 3.0);
    let mesh = tessellate(&mut sessions, &shape_id, 0.1);

    let vertices: Vec<f64> = serde_json::from_value(mesh["vertices"].clone()).unwrap();
    let (min, max) = aabb(&vertices);
    let close = |a: f64, b: f64| (a - b).abs() < 1e-6;
    assert!(close(min[0], 0.0) && close(max[0], 10.0));
    assert!(close(min[1], 0.0) && close(max[1], 5.0));
    assert!(close(min[2], 0.0) && close(max[2], 3.0));

    let face_count = mesh["metadata"]["face_count"].as_u64().unwrap();
    assert!(face_count >= 12, "expected at least 12 triangles for a box, got {face_count}");
}

#[test]
fn s3_fillet_trims_both_lines() {
    let mut sessions = SessionManager::new();
    let plane_id = create_plane(&mut sessions, "XY", (0.0, 0.0, 0.0));
    let sketch_id = create_sketch(&mut sessions, &plane_id);
    let l1 = add_line(&mut sessions, &sketch_id, 0.0, 0.0, 10.0, 0.0);
    let l2 = add_line(&mut sessions, &sketch_id, 10.0, 0.0, 10.0, 10.0);

    let resp = add_fillet(&mut sessions, &sketch_id, &l1, &l2, 2.0);
    assert!(resp.success);

    let engine = sessions.get(SESSION).unwrap();
    let sketch = engine.sketches.get(&sketch_id).unwrap();
    let line1 = sketch.elements.get(&l1).unwrap().as_line().unwrap();
    let line2 = sketch.elements.get(&l2).unwrap().as_line().unwrap();
    let close = |a: f64, b: f64| (a - b).abs() < 1e-9;
    assert!(close(line1.x2, 8.0) && close(line1.y2, 0.0), "L1 should be trimmed to (8,0), got ({}, {})", line1.x2, line1.y2);
    assert!(close(line2.x1, 10.0) && close(line2.y1, 2.0), "L2 should be trimmed to (10,2), got ({}, {})", line2.x1, line2.y1);

    let fillet_id = resp.data.unwrap()["element_id"].as_str().unwrap().to_string();
    let fillet = sketch.elements.get(&fillet_id).unwrap();
    let params = match &fillet.parameters_2d {
        cad_types::ElementParams::Fillet(f) => *f,
        other => panic!("expected Fillet params, got {other:?}"),
    };
    assert!(close(params.center_x, 8.0) && close(params.center_y, 2.0));
    assert!(close(params.radius, 2.0));
}

#[test]
fn s4_length_constraint_solves_symmetrically() {
    let mut sessions = SessionManager::new();
    let plane_id = create_plane(&mut sessions, "XY", (0.0, 0.0, 0.0));
    let sketch_id = create_sketch(&mut sessions, &plane_id);
    let line_id = add_line(&mut sessions, &sketch_id, 0.0, 0.0, 3.0, 0.0);
    add_length_constraint(&mut sessions, &sketch_id, &line_id, 5.0);

    let report = solve_sketch(&mut sessions, &sketch_id);
    assert!(report["residual_inf"].as_f64().unwrap() < 1e-8);

    let engine = sessions.get(SESSION).unwrap();
    let line = engine.sketches.get(&sketch_id).unwrap().elements.get(&line_id).unwrap().as_line().unwrap();
    let close = |a: f64, b: f64| (a - b).abs() < 1e-6;
    assert!(close(line.x1, -1.0) && close(line.y1, 0.0), "got ({}, {})", line.x1, line.y1);
    assert!(close(line.x2, 4.0) && close(line.y2, 0.0), "got ({}, {})", line.x2, line.y2);
}

#[test]
fn s5_parallel_lines_fillet_fails_and_sketch_is_unchanged() {
    let mut sessions = SessionManager::new();
    let plane_id = create_plane(&mut sessions, "XY", (0.0, 0.0, 0.0));
    let sketch_id = create_sketch(&mut sessions, &plane_id);
    let l1 = add_line(&mut sessions, &sketch_id, 0.0, 0.0, 10.0, 0.0);
    let l2 = add_line(&mut sessions, &sketch_id, 0.0, 5.0, 10.0, 5.0);

    let before = {
        let engine = sessions.get(SESSION).unwrap();
        let sketch = engine.sketches.get(&sketch_id).unwrap();
        (sketch.elements.get(&l1).unwrap().clone(), sketch.elements.get(&l2).unwrap().clone())
    };

    let resp = add_fillet(&mut sessions, &sketch_id, &l1, &l2, 2.0);
    assert!(!resp.success);
    assert_eq!(resp.error.unwrap().code, "FilletParallelLines");

    let engine = sessions.get(SESSION).unwrap();
    let sketch = engine.sketches.get(&sketch_id).unwrap();
    assert_eq!(sketch.elements.get(&l1).unwrap(), &before.0);
    assert_eq!(sketch.elements.get(&l2).unwrap(), &before.1);
}

#[test]
fn s6_round_trip_transform_on_xz_plane() {
    let mut sessions = SessionManager::new();
    let plane_id = create_plane(&mut sessions, "XZ", (1.0, 2.0, 3.0));
    let engine = sessions.get(SESSION).unwrap();
    let plane = &engine.planes[&plane_id];

    let p2 = cad_geom::Point2::new(4.0, 7.0);
    let world = plane.to_world(p2);
    assert_eq!(world.to_array(), [5.0, 2.0, 10.0]);

    let back = plane.to_sketch(world);
    assert!((back.x - p2.x).abs() < 1e-9);
    assert!((back.y - p2.y).abs() < 1e-9);
}
