use crate::element::SketchElement;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An insertion-ordered map of sketch elements. Ordering matters: wire
/// assembly iterates elements in insertion order (§4.2).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementMap {
    order: Vec<String>,
    elements: HashMap<String, SketchElement>,
}

impl ElementMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, element: SketchElement) {
        if !self.elements.contains_key(&element.id) {
            self.order.push(element.id.clone());
        }
        self.elements.insert(element.id.clone(), element);
    }

    pub fn get(&self, id: &str) -> Option<&SketchElement> {
        self.elements.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut SketchElement> {
        self.elements.get_mut(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<SketchElement> {
        self.order.retain(|eid| eid != id);
        self.elements.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }

    /// Elements in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &SketchElement> {
        self.order.iter().filter_map(move |id| self.elements.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DimensionCache {
    pub lengths: HashMap<String, f64>,
}

/// A collection of sketch elements on a single plane.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sketch {
    pub id: String,
    pub plane_id: String,
    pub elements: ElementMap,
    pub dimension_cache: DimensionCache,
}

impl Sketch {
    pub fn new(id: String, plane_id: String) -> Self {
        Self {
            id,
            plane_id,
            elements: ElementMap::new(),
            dimension_cache: DimensionCache::default(),
        }
    }
}
