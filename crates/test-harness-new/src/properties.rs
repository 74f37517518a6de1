//! Property-style tests (§8 "Universal invariants") driven by `proptest`.

use cad_engine::SessionManager;
use cad_types::PlaneKind;
use proptest::prelude::*;

use crate::helpers::*;

proptest! {
    /// For every plane, axes form a right-handed orthonormal basis.
    #[test]
    fn plane_axes_are_always_orthonormal(
        kind_idx in 0..3u8,
        ox in -1000.0..1000.0f64,
        oy in -1000.0..1000.0f64,
        oz in -1000.0..1000.0f64,
    ) {
        let kind = match kind_idx {
            0 => "XY",
            1 => "XZ",
            _ => "YZ",
        };
        let mut sessions = SessionManager::new();
        let plane_id = create_plane(&mut sessions, kind, (ox, oy, oz));
        let engine = sessions.get(SESSION).unwrap();
        let plane = &engine.planes[&plane_id];
        prop_assert!(plane.is_orthonormal(1e-9));
        prop_assert_eq!(plane.kind, match kind {
            "XY" => PlaneKind::XY,
            "XZ" => PlaneKind::XZ,
            _ => PlaneKind::YZ,
        });
    }

    /// `to_sketch(to_world(p2)) == p2` within tolerance, for any p2 on any
    /// canonical plane at any origin.
    #[test]
    fn plane_transform_round_trips(
        kind_idx in 0..3u8,
        ox in -500.0..500.0f64,
        oy in -500.0..500.0f64,
        oz in -500.0..500.0f64,
        px in -500.0..500.0f64,
        py in -500.0..500.0f64,
    ) {
        let kind = match kind_idx { 0 => "XY", 1 => "XZ", _ => "YZ" };
        let mut sessions = SessionManager::new();
        let plane_id = create_plane(&mut sessions, kind, (ox, oy, oz));
        let engine = sessions.get(SESSION).unwrap();
        let plane = &engine.planes[&plane_id];

        let p2 = cad_geom::Point2::new(px, py);
        let world = plane.to_world(p2);
        let back = plane.to_sketch(world);
        prop_assert!((back.x - p2.x).abs() < 1e-9);
        prop_assert!((back.y - p2.y).abs() < 1e-9);
    }

    /// After `solve_sketch`, a Length constraint on a line of value L leaves
    /// `|line| - L` under tolerance regardless of the line's starting pose.
    #[test]
    fn length_constraint_converges_from_any_starting_line(
        x1 in -50.0..50.0f64,
        y1 in -50.0..50.0f64,
        dx in 1.0..50.0f64,
        dy in -50.0..50.0f64,
        target in 1.0..200.0f64,
    ) {
        let mut sessions = SessionManager::new();
        let plane_id = create_plane(&mut sessions, "XY", (0.0, 0.0, 0.0));
        let sketch_id = create_sketch(&mut sessions, &plane_id);
        let line_id = add_line(&mut sessions, &sketch_id, x1, y1, x1 + dx, y1 + dy);
        add_length_constraint(&mut sessions, &sketch_id, &line_id, target);

        let report = solve_sketch(&mut sessions, &sketch_id);
        let residual = report["residual_inf"].as_f64().unwrap();
        prop_assert!(residual < 1e-6, "residual {residual} too large");

        let engine = sessions.get(SESSION).unwrap();
        let line = engine.sketches.get(&sketch_id).unwrap().elements.get(&line_id).unwrap().as_line().unwrap();
        let len = ((line.x2 - line.x1).powi(2) + (line.y2 - line.y1).powi(2)).sqrt();
        prop_assert!((len - target).abs() < 1e-6, "|line|={len}, target={target}");
    }

    /// A closed planar rectangle extruded by `d` validates and its
    /// tessellation's bounding-box extent along the extrude direction is `d`.
    #[test]
    fn extrude_distance_matches_tessellated_extent(
        w in 1.0..50.0f64,
        h in 1.0..50.0f64,
        d in 0.5..20.0f64,
    ) {
        let mut sessions = SessionManager::new();
        let plane_id = create_plane(&mut sessions, "XY", (0.0, 0.0, 0.0));
        let sketch_id = create_sketch(&mut sessions, &plane_id);
        let rect_id = add_rectangle(&mut sessions, &sketch_id, 0.0, 0.0, w, h);
        let (_, shape_id) = extrude_blind(&mut sessions, &sketch_id, &rect_id, d);
        let mesh = tessellate(&mut sessions, &shape_id, 0.1);
        let vertices: Vec<f64> = serde_json::from_value(mesh["vertices"].clone()).unwrap();
        let (min, max) = aabb(&vertices);
        prop_assert!((max[2] - min[2] - d).abs() < 1e-6, "extent {} vs distance {d}", max[2] - min[2]);
    }

    /// Two identical `update_constraint_value` calls on an already-converged
    /// Length constraint leave the line's endpoints bitwise unchanged.
    #[test]
    fn repeated_update_constraint_value_is_idempotent(
        x1 in -50.0..50.0f64,
        y1 in -50.0..50.0f64,
        dx in 1.0..50.0f64,
        dy in -50.0..50.0f64,
        target in 1.0..200.0f64,
    ) {
        let mut sessions = SessionManager::new();
        let plane_id = create_plane(&mut sessions, "XY", (0.0, 0.0, 0.0));
        let sketch_id = create_sketch(&mut sessions, &plane_id);
        let line_id = add_line(&mut sessions, &sketch_id, x1, y1, x1 + dx, y1 + dy);
        let constraint_id = add_length_constraint(&mut sessions, &sketch_id, &line_id, target);
        solve_sketch(&mut sessions, &sketch_id);

        update_constraint_value(&mut sessions, &constraint_id, target);
        solve_sketch(&mut sessions, &sketch_id);
        let engine = sessions.get(SESSION).unwrap();
        let after_first = *engine.sketches.get(&sketch_id).unwrap().elements.get(&line_id).unwrap().as_line().unwrap();

        update_constraint_value(&mut sessions, &constraint_id, target);
        solve_sketch(&mut sessions, &sketch_id);
        let engine = sessions.get(SESSION).unwrap();
        let after_second = *engine.sketches.get(&sketch_id).unwrap().elements.get(&line_id).unwrap().as_line().unwrap();

        prop_assert_eq!(after_first.x1.to_bits(), after_second.x1.to_bits());
        prop_assert_eq!(after_first.y1.to_bits(), after_second.y1.to_bits());
        prop_assert_eq!(after_first.x2.to_bits(), after_second.x2.to_bits());
        prop_assert_eq!(after_first.y2.to_bits(), after_second.y2.to_bits());
    }
}
