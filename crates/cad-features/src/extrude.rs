//! Extrude feature validation and execution (§4.5).

use crate::error::FeatureError;
use cad_geom::Vector3;
use cad_kernel::{FaceId, Kernel, SolidId};
use cad_types::{CancelToken, ExtrudeDirection, ExtrudeFeature, ExtrudeType, Plane, Sketch};
use tracing::warn;

/// Checks the feature's parameters before any kernel work is attempted.
pub fn validate(feature: &ExtrudeFeature, sketch: &Sketch) -> Result<(), FeatureError> {
    if sketch.elements.is_empty() {
        return Err(FeatureError::EmptySketch);
    }
    match feature.extrude_type {
        ExtrudeType::Blind | ExtrudeType::ThroughAll | ExtrudeType::ToSurface => {
            if feature.distance <= 0.0 {
                return Err(FeatureError::InvalidDistance { reason: "distance must be positive".into() });
            }
        }
        ExtrudeType::Symmetric => {
            if feature.distance <= 0.0 || feature.distance_2 <= 0.0 {
                return Err(FeatureError::InvalidDistance { reason: "both distances must be positive for a symmetric extrude".into() });
            }
        }
    }
    if let ExtrudeDirection::Custom(v) = feature.direction {
        if v.length() < 1e-6 {
            return Err(FeatureError::DegenerateDirection);
        }
    }
    Ok(())
}

fn resolve_direction(plane: &Plane, feature: &ExtrudeFeature) -> Result<Vector3, FeatureError> {
    let raw = match feature.direction {
        ExtrudeDirection::Normal => plane.normal,
        ExtrudeDirection::Custom(v) => v.normalized().ok_or(FeatureError::DegenerateDirection)?,
    };
    Ok(if feature.reverse { -raw } else { raw })
}

fn translate_plane(plane: &Plane, offset: Vector3) -> Plane {
    let mut shifted = plane.clone();
    shifted.origin = shifted.origin + offset;
    shifted
}

fn build_face<K: Kernel>(
    sketch: &Sketch,
    plane: &Plane,
    kernel: &mut K,
    element_id: &str,
    cancel: &CancelToken,
) -> Result<FaceId, FeatureError> {
    Ok(cad_sketch::build_face_from_element(sketch, plane, kernel, element_id, cancel)?)
}

/// Executes `feature` against `sketch`/`plane`, mutating `feature.warnings`
/// and `feature.valid` in place and returning the resulting solid. The
/// caller (the engine) is responsible for assigning `feature.result_shape_id`.
pub fn execute<K: Kernel>(
    sketch: &Sketch,
    plane: &Plane,
    kernel: &mut K,
    feature: &mut ExtrudeFeature,
    cancel: &CancelToken,
) -> Result<SolidId, FeatureError> {
    validate(feature, sketch)?;
    let direction = resolve_direction(plane, feature)?;

    let mut extrude_type = feature.extrude_type;
    if matches!(extrude_type, ExtrudeType::ThroughAll | ExtrudeType::ToSurface) {
        let msg = format!("{:?} is not implemented in v1; falling back to Blind", extrude_type);
        warn!(feature_id = %feature.id, "{msg}");
        feature.warnings.push(msg);
        extrude_type = ExtrudeType::Blind;
    }
    if feature.taper_deg.abs() > 1e-9 {
        let msg = "taper is not implemented in v1 and was ignored".to_string();
        warn!(feature_id = %feature.id, "{msg}");
        feature.warnings.push(msg);
    }

    let solid = match extrude_type {
        ExtrudeType::Blind => {
            let face = build_face(sketch, plane, kernel, &feature.element_id, cancel)?;
            kernel.make_prism(face, direction * feature.distance)?
        }
        ExtrudeType::Symmetric => {
            let shifted = translate_plane(plane, direction * -feature.distance_2);
            let face = build_face(sketch, &shifted, kernel, &feature.element_id, cancel)?;
            kernel.make_prism(face, direction * (feature.distance + feature.distance_2))?
        }
        ExtrudeType::ThroughAll | ExtrudeType::ToSurface => unreachable!("normalized to Blind above"),
    };

    feature.valid = kernel.validate(solid);
    Ok(solid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cad_kernel::TruckAdapter;
    use cad_types::{CancelToken, ElementParams, LineParams, PlaneKind, SketchElement, SketchElementKind};

    fn square_sketch() -> (Sketch, Plane) {
        let plane = Plane::canonical("plane_1".into(), PlaneKind::XY, Vector3::ZERO);
        let mut sketch = Sketch::new("sketch_1".into(), plane.id.clone());
        cad_sketch::add_rectangle(
            &mut sketch,
            "rect_1".into(),
            cad_types::RectangleParams { corner_x: 0.0, corner_y: 0.0, w: 4.0, h: 3.0 },
        )
        .unwrap();
        (sketch, plane)
    }

    #[test]
    fn blind_extrude_produces_a_valid_box() {
        let (sketch, plane) = square_sketch();
        let mut kernel = TruckAdapter::new();
        let mut feature = ExtrudeFeature::new("extrude_1".into(), sketch.id.clone(), "rect_1".into());
        feature.distance = 2.0;
        let solid = execute(&sketch, &plane, &mut kernel, &mut feature, &CancelToken::new()).unwrap();
        assert!(feature.valid);
        let mesh = kernel.tessellate(solid, 0.1, &CancelToken::new()).unwrap();
        assert!(!mesh.positions.is_empty());
    }

    #[test]
    fn symmetric_extrude_centers_the_face() {
        let (sketch, plane) = square_sketch();
        let mut kernel = TruckAdapter::new();
        let mut feature = ExtrudeFeature::new("extrude_1".into(), sketch.id.clone(), "rect_1".into());
        feature.extrude_type = ExtrudeType::Symmetric;
        feature.distance = 1.0;
        feature.distance_2 = 1.0;
        let solid = execute(&sketch, &plane, &mut kernel, &mut feature, &CancelToken::new()).unwrap();
        assert!(feature.valid);
        assert!(kernel.validate(solid));
    }

    #[test]
    fn non_positive_distance_is_rejected() {
        let (sketch, plane) = square_sketch();
        let mut kernel = TruckAdapter::new();
        let mut feature = ExtrudeFeature::new("extrude_1".into(), sketch.id.clone(), "rect_1".into());
        feature.distance = 0.0;
        let err = execute(&sketch, &plane, &mut kernel, &mut feature, &CancelToken::new());
        assert!(matches!(err, Err(FeatureError::InvalidDistance { .. })));
    }

    #[test]
    fn through_all_falls_back_to_blind_with_a_warning() {
        let (sketch, plane) = square_sketch();
        let mut kernel = TruckAdapter::new();
        let mut feature = ExtrudeFeature::new("extrude_1".into(), sketch.id.clone(), "rect_1".into());
        feature.extrude_type = ExtrudeType::ThroughAll;
        feature.distance = 1.0;
        execute(&sketch, &plane, &mut kernel, &mut feature, &CancelToken::new()).unwrap();
        assert_eq!(feature.warnings.len(), 1);
    }

    #[test]
    fn pre_cancelled_token_aborts_extrude_before_kernel_work() {
        let (sketch, plane) = square_sketch();
        let mut kernel = TruckAdapter::new();
        let mut feature = ExtrudeFeature::new("extrude_1".into(), sketch.id.clone(), "rect_1".into());
        feature.distance = 2.0;
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = execute(&sketch, &plane, &mut kernel, &mut feature, &cancel);
        assert!(err.is_err());
    }
}
