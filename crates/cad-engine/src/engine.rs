//! The `Engine` (§4.6): sole owner of every plane, sketch, element,
//! constraint, feature, and shape in a session. Every operation validates
//! fully before mutating state — on error the engine is left unchanged.

use std::cell::RefCell;
use std::collections::HashMap;

use cad_geom::Vector3;
use cad_kernel::{BooleanOp, Kernel, SolidId, TruckAdapter};
use cad_solver::{InferenceConfig, SolveReport, SolverConfig};
use cad_types::{CancelToken, Constraint, ConstraintKind, ElementParams, ExtrudeDirection, ExtrudeFeature, ExtrudeType, Plane, PlaneKind, Sketch};
use tracing::{debug, instrument, warn};

use crate::error::EngineError;
use crate::ids::IdAllocator;
use crate::mesh::{self, Mesh};
use crate::visualize::{self, ElementVisualization, PlaneVisualization, SketchVisualization};

pub struct Engine {
    pub planes: HashMap<String, Plane>,
    pub sketches: HashMap<String, Sketch>,
    pub constraints: HashMap<String, Constraint>,
    pub features: HashMap<String, ExtrudeFeature>,
    pub shapes: HashMap<String, SolidId>,
    kernel: TruckAdapter,
    ids: IdAllocator,
    constraint_counter: u64,
    /// Cancel tokens for in-flight operations, keyed by caller-supplied
    /// `op_id` (§6.5). An op without an `op_id` is simply not cancellable.
    op_tokens: RefCell<HashMap<String, CancelToken>>,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            planes: HashMap::new(),
            sketches: HashMap::new(),
            constraints: HashMap::new(),
            features: HashMap::new(),
            shapes: HashMap::new(),
            kernel: TruckAdapter::new(),
            ids: IdAllocator::new(),
            constraint_counter: 0,
            op_tokens: RefCell::new(HashMap::new()),
        }
    }

    /// Registers a fresh cancel token under `op_id`, if given, so a later
    /// `cancel_op` call can reach it.
    fn begin_op(&self, op_id: Option<&str>) -> CancelToken {
        match op_id {
            Some(id) => {
                let token = CancelToken::new();
                self.op_tokens.borrow_mut().insert(id.to_string(), token.clone());
                token
            }
            None => CancelToken::new(),
        }
    }

    /// Unregisters `op_id`'s cancel token once its operation has finished.
    fn end_op(&self, op_id: Option<&str>) {
        if let Some(id) = op_id {
            self.op_tokens.borrow_mut().remove(id);
        }
    }

    /// Sets the cancel flag for the in-flight operation registered under
    /// `op_id` (§6.5 Cancel control channel). Best-effort: returns `false`
    /// if no such operation is currently running (it may have already
    /// finished, or never started).
    pub fn cancel_op(&self, op_id: &str) -> bool {
        match self.op_tokens.borrow().get(op_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Resolves a plane id, honoring the legacy `XY_Plane|XZ_Plane|YZ_Plane`
    /// aliases (§3.2) by falling back to the first canonical plane of that
    /// kind if no plane is registered under the literal alias string.
    pub fn resolve_plane_id<'a>(&'a self, id: &str) -> Option<(&'a str, &'a Plane)> {
        if let Some(plane) = self.planes.get(id) {
            return Some((id, plane));
        }
        let kind = match id {
            "XY_Plane" => PlaneKind::XY,
            "XZ_Plane" => PlaneKind::XZ,
            "YZ_Plane" => PlaneKind::YZ,
            _ => return None,
        };
        self.planes.iter().find(|(_, p)| p.kind == kind).map(|(id, p)| (id.as_str(), p))
    }

    fn plane_or_not_found(&self, id: &str) -> Result<&Plane, EngineError> {
        self.resolve_plane_id(id)
            .map(|(_, p)| p)
            .ok_or_else(|| EngineError::NotFound { kind: "plane", id: id.to_string() })
    }

    fn sketch_or_not_found(&self, id: &str) -> Result<&Sketch, EngineError> {
        self.sketches.get(id).ok_or_else(|| EngineError::NotFound { kind: "sketch", id: id.to_string() })
    }

    // -- Planes --------------------------------------------------------

    pub fn create_plane(&mut self, kind: PlaneKind, origin: Vector3) -> (String, PlaneVisualization) {
        let id = self.ids.next_plane_id();
        let plane = match kind {
            PlaneKind::Custom => Plane::custom(id.clone(), origin, Vector3::Z),
            other => Plane::canonical(id.clone(), other, origin),
        };
        let viz = visualize::plane_visualization(&plane);
        self.planes.insert(id.clone(), plane);
        (id, viz)
    }

    pub fn delete_plane(&mut self, id: &str) -> Result<(), EngineError> {
        let (resolved_id, _) = self.resolve_plane_id(id).ok_or_else(|| EngineError::NotFound { kind: "plane", id: id.to_string() })?;
        let resolved_id = resolved_id.to_string();
        if self.sketches.values().any(|s| s.plane_id == resolved_id) {
            return Err(EngineError::InvariantViolated {
                reason: format!("plane {resolved_id} is still referenced by a sketch"),
            });
        }
        self.planes.remove(&resolved_id);
        Ok(())
    }

    pub fn visualize_plane(&self, id: &str) -> Result<PlaneVisualization, EngineError> {
        Ok(visualize::plane_visualization(self.plane_or_not_found(id)?))
    }

    // -- Sketches --------------------------------------------------------

    pub fn create_sketch(&mut self, plane_id: &str) -> Result<(String, SketchVisualization), EngineError> {
        let (resolved_id, plane) = self.resolve_plane_id(plane_id).ok_or_else(|| EngineError::NotFound { kind: "plane", id: plane_id.to_string() })?;
        let resolved_id = resolved_id.to_string();
        let id = self.ids.next_sketch_id();
        let sketch = Sketch::new(id.clone(), resolved_id);
        let viz = visualize::sketch_visualization(&sketch, plane);
        self.sketches.insert(id.clone(), sketch);
        Ok((id, viz))
    }

    pub fn delete_sketch(&mut self, id: &str) -> Result<(), EngineError> {
        if !self.sketches.contains_key(id) {
            return Err(EngineError::NotFound { kind: "sketch", id: id.to_string() });
        }
        self.sketches.remove(id);
        self.constraints.retain(|_, c| c.sketch_id != id);
        Ok(())
    }

    pub fn visualize_sketch(&self, id: &str) -> Result<SketchVisualization, EngineError> {
        let sketch = self.sketch_or_not_found(id)?;
        let plane = self.plane_or_not_found(&sketch.plane_id)?;
        Ok(visualize::sketch_visualization(sketch, plane))
    }

    pub fn visualize_element(&self, sketch_id: &str, element_id: &str) -> Result<Vec<ElementVisualization>, EngineError> {
        let sketch = self.sketch_or_not_found(sketch_id)?;
        if !sketch.elements.contains(element_id) {
            return Err(EngineError::NotFound { kind: "element", id: element_id.to_string() });
        }
        Ok(visualize::element_visualizations(sketch, self.plane_or_not_found(&sketch.plane_id)?, element_id))
    }

    // -- Elements --------------------------------------------------------

    /// Adds a line and runs the Horizontal/Vertical inference pass over it.
    pub fn add_line(&mut self, sketch_id: &str, params: cad_types::LineParams) -> Result<Vec<ElementVisualization>, EngineError> {
        let sketch = self.sketches.get_mut(sketch_id).ok_or_else(|| EngineError::NotFound { kind: "sketch", id: sketch_id.to_string() })?;
        let id = self.ids.next_element_id(sketch_id, "line");
        cad_sketch::add_line(sketch, id.clone(), params)?;
        self.infer_for(sketch_id, &[id.clone()]);
        self.visualize_element(sketch_id, &id)
    }

    pub fn add_circle(&mut self, sketch_id: &str, params: cad_types::CircleParams) -> Result<Vec<ElementVisualization>, EngineError> {
        let sketch = self.sketches.get_mut(sketch_id).ok_or_else(|| EngineError::NotFound { kind: "sketch", id: sketch_id.to_string() })?;
        let id = self.ids.next_element_id(sketch_id, "circle");
        cad_sketch::add_circle(sketch, id.clone(), params)?;
        self.visualize_element(sketch_id, &id)
    }

    pub fn add_arc_three_point(
        &mut self,
        sketch_id: &str,
        x1: f64,
        y1: f64,
        xm: f64,
        ym: f64,
        x2: f64,
        y2: f64,
    ) -> Result<Vec<ElementVisualization>, EngineError> {
        let sketch = self.sketches.get_mut(sketch_id).ok_or_else(|| EngineError::NotFound { kind: "sketch", id: sketch_id.to_string() })?;
        let id = self.ids.next_element_id(sketch_id, "arc");
        cad_sketch::add_arc_three_point(sketch, id.clone(), x1, y1, xm, ym, x2, y2)?;
        self.visualize_element(sketch_id, &id)
    }

    pub fn add_arc_endpoints_radius(
        &mut self,
        sketch_id: &str,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        r: f64,
    ) -> Result<Vec<ElementVisualization>, EngineError> {
        let sketch = self.sketches.get_mut(sketch_id).ok_or_else(|| EngineError::NotFound { kind: "sketch", id: sketch_id.to_string() })?;
        let id = self.ids.next_element_id(sketch_id, "arc");
        cad_sketch::add_arc_endpoints_radius(sketch, id.clone(), x1, y1, x2, y2, r)?;
        self.visualize_element(sketch_id, &id)
    }

    pub fn add_rectangle(&mut self, sketch_id: &str, params: cad_types::RectangleParams) -> Result<Vec<ElementVisualization>, EngineError> {
        let sketch = self.sketches.get_mut(sketch_id).ok_or_else(|| EngineError::NotFound { kind: "sketch", id: sketch_id.to_string() })?;
        let id = self.ids.next_element_id(sketch_id, "rectangle");
        cad_sketch::add_rectangle(sketch, id.clone(), params)?;
        let child_ids = sketch.elements.get(&id).unwrap().child_ids.clone();
        self.infer_for(sketch_id, &child_ids);
        self.visualize_element(sketch_id, &id)
    }

    pub fn add_polygon(&mut self, sketch_id: &str, params: cad_types::PolygonParams) -> Result<Vec<ElementVisualization>, EngineError> {
        let sketch = self.sketches.get_mut(sketch_id).ok_or_else(|| EngineError::NotFound { kind: "sketch", id: sketch_id.to_string() })?;
        let id = self.ids.next_element_id(sketch_id, "polygon");
        cad_sketch::add_polygon(sketch, id.clone(), params)?;
        let child_ids = sketch.elements.get(&id).unwrap().child_ids.clone();
        self.infer_for(sketch_id, &child_ids);
        self.visualize_element(sketch_id, &id)
    }

    pub fn modify_element(&mut self, sketch_id: &str, element_id: &str, params: ElementParams) -> Result<Vec<ElementVisualization>, EngineError> {
        let sketch = self.sketches.get_mut(sketch_id).ok_or_else(|| EngineError::NotFound { kind: "sketch", id: sketch_id.to_string() })?;
        cad_sketch::modify_element(sketch, element_id, params)?;
        if matches!(params, ElementParams::Line(_)) {
            self.infer_for(sketch_id, &[element_id.to_string()]);
        }
        self.visualize_element(sketch_id, element_id)
    }

    pub fn delete_element(&mut self, sketch_id: &str, element_id: &str) -> Result<(), EngineError> {
        let sketch = self.sketches.get_mut(sketch_id).ok_or_else(|| EngineError::NotFound { kind: "sketch", id: sketch_id.to_string() })?;
        cad_sketch::delete_element(sketch, element_id)?;
        let sketch_id = sketch_id.to_string();
        self.constraints.retain(|_, c| !(c.sketch_id == sketch_id && c.kind.target_element_ids().iter().any(|t| t == element_id)));
        Ok(())
    }

    /// Proposes and auto-accepts Horizontal/Vertical constraints for lines
    /// touched by the most recent add/edit (§4.4). Rejected silently if the
    /// line already carries either kind — `infer_constraints` already skips
    /// those, this just assigns ids to whatever it proposes.
    fn infer_for(&mut self, sketch_id: &str, touched: &[String]) {
        let Some(sketch) = self.sketches.get(sketch_id) else { return };
        let existing: Vec<ConstraintKind> = self
            .constraints
            .values()
            .filter(|c| c.sketch_id == sketch_id)
            .map(|c| c.kind.clone())
            .collect();
        let proposals = cad_solver::infer_constraints(sketch, &existing, touched, &InferenceConfig::default());
        for kind in proposals {
            self.constraint_counter += 1;
            let id = format!("constraint_{}", self.constraint_counter);
            debug!(sketch_id, constraint_id = %id, ?kind, "accepted inferred constraint");
            self.constraints.insert(id.clone(), Constraint::new(id, sketch_id.to_string(), kind));
        }
    }

    // -- Fillet / chamfer --------------------------------------------------

    pub fn add_fillet(&mut self, sketch_id: &str, line1_id: &str, line2_id: &str, radius: f64) -> Result<Vec<ElementVisualization>, EngineError> {
        let sketch = self.sketches.get_mut(sketch_id).ok_or_else(|| EngineError::NotFound { kind: "sketch", id: sketch_id.to_string() })?;
        let id = self.ids.next_element_id(sketch_id, "fillet");
        cad_sketch::add_fillet(sketch, id.clone(), line1_id, line2_id, radius)?;
        let mut out = self.visualize_element(sketch_id, &id)?;
        out.extend(self.visualize_element(sketch_id, line1_id)?);
        out.extend(self.visualize_element(sketch_id, line2_id)?);
        Ok(out)
    }

    pub fn add_chamfer(&mut self, sketch_id: &str, line1_id: &str, line2_id: &str, distance: f64) -> Result<Vec<ElementVisualization>, EngineError> {
        let sketch = self.sketches.get_mut(sketch_id).ok_or_else(|| EngineError::NotFound { kind: "sketch", id: sketch_id.to_string() })?;
        let id = self.ids.next_element_id(sketch_id, "chamfer");
        cad_sketch::add_chamfer(sketch, id.clone(), line1_id, line2_id, distance)?;
        let mut out = self.visualize_element(sketch_id, &id)?;
        out.extend(self.visualize_element(sketch_id, line1_id)?);
        out.extend(self.visualize_element(sketch_id, line2_id)?);
        Ok(out)
    }

    // -- Constraints --------------------------------------------------------

    pub fn add_constraint(&mut self, sketch_id: &str, kind: ConstraintKind) -> Result<String, EngineError> {
        let sketch = self.sketch_or_not_found(sketch_id)?;
        for target in kind.target_element_ids() {
            if !sketch.elements.contains(&target) {
                return Err(EngineError::NotFound { kind: "element", id: target });
            }
        }
        self.constraint_counter += 1;
        let id = format!("constraint_{}", self.constraint_counter);
        self.constraints.insert(id.clone(), Constraint::new(id.clone(), sketch_id.to_string(), kind));
        Ok(id)
    }

    pub fn update_constraint_value(&mut self, constraint_id: &str, value: f64) -> Result<(), EngineError> {
        let constraint = self.constraints.get_mut(constraint_id).ok_or_else(|| EngineError::NotFound { kind: "constraint", id: constraint_id.to_string() })?;
        match &mut constraint.kind {
            ConstraintKind::Length { value: v, .. } => {
                *v = value;
                Ok(())
            }
            _ => Err(EngineError::InvariantViolated { reason: "constraint kind has no numeric value".into() }),
        }
    }

    pub fn delete_constraint(&mut self, constraint_id: &str) -> Result<(), EngineError> {
        self.constraints.remove(constraint_id).ok_or_else(|| EngineError::NotFound { kind: "constraint", id: constraint_id.to_string() })?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn solve_sketch(&mut self, sketch_id: &str, op_id: Option<&str>) -> Result<SolveReport, EngineError> {
        let cancel = self.begin_op(op_id);
        let kinds: Vec<ConstraintKind> = self
            .constraints
            .values()
            .filter(|c| c.sketch_id == sketch_id)
            .map(|c| c.kind.clone())
            .collect();
        let sketch = self.sketches.get_mut(sketch_id).ok_or_else(|| EngineError::NotFound { kind: "sketch", id: sketch_id.to_string() })?;
        let result = cad_solver::solve_sketch(sketch, &kinds, &SolverConfig::default(), &cancel);
        self.end_op(op_id);
        Ok(result?)
    }

    // -- Extrude / boolean --------------------------------------------------

    #[instrument(skip(self))]
    pub fn extrude(
        &mut self,
        sketch_id: &str,
        element_id: &str,
        extrude_type: ExtrudeType,
        distance: f64,
        distance_2: f64,
        direction: ExtrudeDirection,
        reverse: bool,
        taper_deg: f64,
        op_id: Option<&str>,
    ) -> Result<(String, String), EngineError> {
        let sketch = self.sketch_or_not_found(sketch_id)?.clone();
        let plane = self.plane_or_not_found(&sketch.plane_id)?.clone();

        let id = self.ids.next_feature_id();
        let mut feature = ExtrudeFeature::new(id.clone(), sketch_id.to_string(), element_id.to_string());
        feature.extrude_type = extrude_type;
        feature.distance = distance;
        feature.distance_2 = distance_2;
        feature.direction = direction;
        feature.reverse = reverse;
        feature.taper_deg = taper_deg;

        let cancel = self.begin_op(op_id);
        let solid = cad_features::extrude::execute(&sketch, &plane, &mut self.kernel, &mut feature, &cancel);
        self.end_op(op_id);
        let solid = solid?;
        feature.result_shape_id = Some(id.clone());
        self.shapes.insert(id.clone(), solid);
        self.features.insert(id.clone(), feature);
        Ok((id.clone(), id))
    }

    #[instrument(skip(self))]
    pub fn boolean_op(&mut self, op: BooleanOp, shape_a: &str, shape_b: &str, result_id: String) -> Result<String, EngineError> {
        let a = *self.shapes.get(shape_a).ok_or_else(|| EngineError::NotFound { kind: "shape", id: shape_a.to_string() })?;
        let b = *self.shapes.get(shape_b).ok_or_else(|| EngineError::NotFound { kind: "shape", id: shape_b.to_string() })?;
        let result = cad_features::boolean::execute(&mut self.kernel, op, a, b)?;
        self.shapes.insert(result_id.clone(), result);
        Ok(result_id)
    }

    #[instrument(skip(self))]
    pub fn tessellate(&self, shape_id: &str, deflection: f64, op_id: Option<&str>) -> Result<Mesh, EngineError> {
        let solid = *self.shapes.get(shape_id).ok_or_else(|| EngineError::NotFound { kind: "shape", id: shape_id.to_string() })?;
        let cancel = self.begin_op(op_id);
        let raw = self.kernel.tessellate(solid, deflection, &cancel);
        self.end_op(op_id);
        Ok(mesh::assemble(&raw?, deflection))
    }

    pub fn export(&self, shape_id: &str, format: &str, op_id: Option<&str>) -> Result<Vec<u8>, EngineError> {
        if format != "stl" {
            warn!(format, "export format requested is not implemented in v1");
            return Err(EngineError::NotImplemented { operation: format!("export({format})") });
        }
        let mesh = self.tessellate(shape_id, crate::export::stl_deflection(), op_id)?;
        Ok(crate::export::mesh_to_stl(&mesh))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
