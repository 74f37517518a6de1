//! Identifier allocation (§3.2). Counters are monotonic per engine;
//! identifiers are stable for the lifetime of the owning engine.

use std::time::{SystemTime, UNIX_EPOCH};

fn epoch_now() -> std::time::Duration {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default()
}

#[derive(Debug, Default)]
pub struct IdAllocator {
    plane_counter: u64,
    sketch_counter: u64,
    feature_counter: u64,
    /// Per-sketch element count, keyed by sketch id, for the
    /// `{kind}_{count_in_sketch}_{...}` element naming scheme.
    element_counts: std::collections::HashMap<String, u64>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_plane_id(&mut self) -> String {
        self.plane_counter += 1;
        format!("plane_{}", self.plane_counter)
    }

    pub fn next_sketch_id(&mut self) -> String {
        self.sketch_counter += 1;
        format!("sketch_{}", self.sketch_counter)
    }

    /// `{kind}_{count_in_sketch}_{ms_since_epoch mod 10000}`.
    pub fn next_element_id(&mut self, sketch_id: &str, kind: &str) -> String {
        let count = self.element_counts.entry(sketch_id.to_string()).or_insert(0);
        *count += 1;
        let ms = epoch_now().as_millis() % 10000;
        format!("{kind}_{count}_{ms}")
    }

    /// `Extrude_{epoch_seconds}`, disambiguated with a per-engine counter so
    /// two extrudes issued within the same second stay unique.
    pub fn next_feature_id(&mut self) -> String {
        self.feature_counter += 1;
        let secs = epoch_now().as_secs();
        format!("Extrude_{secs}_{}", self.feature_counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_and_sketch_ids_are_monotonic() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.next_plane_id(), "plane_1");
        assert_eq!(ids.next_plane_id(), "plane_2");
        assert_eq!(ids.next_sketch_id(), "sketch_1");
    }

    #[test]
    fn element_ids_are_counted_per_sketch() {
        let mut ids = IdAllocator::new();
        let a = ids.next_element_id("sketch_1", "line");
        let b = ids.next_element_id("sketch_1", "circle");
        let c = ids.next_element_id("sketch_2", "line");
        assert!(a.starts_with("line_1_"));
        assert!(b.starts_with("circle_2_"));
        assert!(c.starts_with("line_1_"));
    }

    #[test]
    fn feature_ids_are_unique() {
        let mut ids = IdAllocator::new();
        let a = ids.next_feature_id();
        let b = ids.next_feature_id();
        assert_ne!(a, b);
        assert!(a.starts_with("Extrude_"));
    }
}
