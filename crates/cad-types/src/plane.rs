use cad_geom::{Point2, Vector3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaneKind {
    XY,
    XZ,
    YZ,
    Custom,
}

impl PlaneKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaneKind::XY => "XY",
            PlaneKind::XZ => "XZ",
            PlaneKind::YZ => "YZ",
            PlaneKind::Custom => "Custom",
        }
    }
}

/// An oriented 2D frame embedded in 3D. All sketch geometry lives in its
/// `(u, v)` coordinates; `to_world`/`to_sketch` are the only path by which
/// 2D coordinates leave the sketch domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub id: String,
    pub kind: PlaneKind,
    pub origin: Vector3,
    pub normal: Vector3,
    pub u_axis: Vector3,
    pub v_axis: Vector3,
}

impl Plane {
    /// Builds one of the three canonical planes. Axes are fixed per kind (§6.2);
    /// only the origin is caller-supplied.
    pub fn canonical(id: String, kind: PlaneKind, origin: Vector3) -> Self {
        let (u_axis, v_axis, normal) = match kind {
            PlaneKind::XY => (Vector3::X, Vector3::Y, Vector3::Z),
            PlaneKind::XZ => (Vector3::X, Vector3::Z, Vector3::Y),
            PlaneKind::YZ => (Vector3::Y, Vector3::Z, Vector3::X),
            PlaneKind::Custom => unreachable!("canonical() called with PlaneKind::Custom"),
        };
        Self { id, kind, origin, normal, u_axis, v_axis }
    }

    /// Builds a custom plane from an origin and unit normal. `u` is chosen as
    /// `normal x Z` unless `normal` is nearly parallel to Z, in which case
    /// `u = normal x X`; `v = normal x u` completes the right-handed frame.
    pub fn custom(id: String, origin: Vector3, normal: Vector3) -> Self {
        let normal = normal.normalized().expect("custom plane normal must be non-zero");
        let u_raw = if normal.dot(&Vector3::Z).abs() > 0.9 {
            normal.cross(&Vector3::X)
        } else {
            normal.cross(&Vector3::Z)
        };
        let u_axis = u_raw.normalized().expect("degenerate custom plane axis");
        let v_axis = normal.cross(&u_axis);
        Self { id, kind: PlaneKind::Custom, origin, normal, u_axis, v_axis }
    }

    pub fn to_world(&self, p: Point2) -> Vector3 {
        self.origin + self.u_axis * p.x + self.v_axis * p.y
    }

    pub fn to_sketch(&self, p: Vector3) -> Point2 {
        let rel = p - self.origin;
        Point2::new(rel.dot(&self.u_axis), rel.dot(&self.v_axis))
    }

    /// Right-handed orthonormal basis check within the given tolerance.
    pub fn is_orthonormal(&self, tol: f64) -> bool {
        let unit = |v: &Vector3| (v.length() - 1.0).abs() < tol;
        let ortho = |a: &Vector3, b: &Vector3| a.dot(b).abs() < tol;
        unit(&self.u_axis)
            && unit(&self.v_axis)
            && unit(&self.normal)
            && ortho(&self.u_axis, &self.v_axis)
            && ortho(&self.v_axis, &self.normal)
            && ortho(&self.normal, &self.u_axis)
            && (self.u_axis.cross(&self.v_axis) - self.normal).length() < tol
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_xy_axes() {
        let p = Plane::canonical("plane_1".into(), PlaneKind::XY, Vector3::ZERO);
        assert_eq!(p.u_axis, Vector3::X);
        assert_eq!(p.v_axis, Vector3::Y);
        assert_eq!(p.normal, Vector3::Z);
        assert!(p.is_orthonormal(1e-9));
    }

    #[test]
    fn round_trip_transform() {
        let p = Plane::canonical("plane_1".into(), PlaneKind::XZ, Vector3::new(1.0, 2.0, 3.0));
        let p2 = Point2::new(4.0, 7.0);
        let world = p.to_world(p2);
        assert!((world.x - 5.0).abs() < 1e-12);
        assert!((world.y - 2.0).abs() < 1e-12);
        assert!((world.z - 10.0).abs() < 1e-12);
        let back = p.to_sketch(world);
        assert!((back.x - p2.x).abs() < 1e-9);
        assert!((back.y - p2.y).abs() < 1e-9);
    }
}
