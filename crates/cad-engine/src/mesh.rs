//! Tessellation assembly (§4.7): merges per-face triangulations from the
//! kernel into a single indexed mesh, averaging normals at seam vertices.

use cad_kernel::RawMesh;
use serde::{Deserialize, Serialize};

const SEAM_TOL: f64 = 1e-6;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshMetadata {
    pub vertex_count: usize,
    pub face_count: usize,
    pub deflection: f64,
}

/// Flattened mesh payload matching §4.7's `{vertices, faces, normals, metadata}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<f64>,
    pub faces: Vec<u32>,
    pub normals: Vec<f64>,
    pub metadata: MeshMetadata,
}

/// Quantizes a position to a grid cell key so seam-vertex lookup is O(1)
/// instead of O(n) per vertex; cells are `SEAM_TOL`-sized so any two points
/// within tolerance of each other land in the same or an adjacent cell.
fn cell_key(p: [f64; 3]) -> (i64, i64, i64) {
    let q = |v: f64| (v / SEAM_TOL).round() as i64;
    (q(p[0]), q(p[1]), q(p[2]))
}

/// Builds the output mesh from the kernel's raw per-face triangulation.
/// Vertices within `SEAM_TOL` of each other (across face boundaries) are
/// merged into one, with normals averaged across the contributing faces.
/// An empty input returns an empty mesh, not an error.
pub fn assemble(raw: &RawMesh, deflection: f64) -> Mesh {
    if raw.positions.is_empty() {
        return Mesh { metadata: MeshMetadata { deflection, ..Default::default() }, ..Default::default() };
    }

    let mut merged_positions: Vec<[f64; 3]> = Vec::new();
    let mut normal_sums: Vec<([f64; 3], usize)> = Vec::new();
    let mut cells: std::collections::HashMap<(i64, i64, i64), usize> = std::collections::HashMap::new();
    let mut remap = vec![0u32; raw.positions.len()];

    for (i, &pos) in raw.positions.iter().enumerate() {
        let key = cell_key(pos);
        let merged_index = *cells.entry(key).or_insert_with(|| {
            merged_positions.push(pos);
            normal_sums.push(([0.0; 3], 0));
            merged_positions.len() - 1
        });
        remap[i] = merged_index as u32;
        let n = raw.normals.get(i).copied().unwrap_or([0.0, 0.0, 0.0]);
        let (sum, count) = &mut normal_sums[merged_index];
        sum[0] += n[0];
        sum[1] += n[1];
        sum[2] += n[2];
        *count += 1;
    }

    let mut vertices = Vec::with_capacity(merged_positions.len() * 3);
    for p in &merged_positions {
        vertices.extend_from_slice(p);
    }

    let mut normals = Vec::with_capacity(merged_positions.len() * 3);
    for (sum, count) in &normal_sums {
        let count = (*count).max(1) as f64;
        let avg = [sum[0] / count, sum[1] / count, sum[2] / count];
        let len = (avg[0] * avg[0] + avg[1] * avg[1] + avg[2] * avg[2]).sqrt();
        if len > 1e-12 {
            normals.extend_from_slice(&[avg[0] / len, avg[1] / len, avg[2] / len]);
        } else {
            normals.extend_from_slice(&avg);
        }
    }

    let faces: Vec<u32> = raw.indices.iter().map(|&i| remap[i as usize]).collect();

    let metadata = MeshMetadata {
        vertex_count: merged_positions.len(),
        face_count: faces.len() / 3,
        deflection,
    };
    Mesh { vertices, faces, normals, metadata }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cad_kernel::FaceId;

    #[test]
    fn empty_input_returns_empty_mesh() {
        let raw = RawMesh::default();
        let mesh = assemble(&raw, 0.1);
        assert!(mesh.vertices.is_empty());
        assert_eq!(mesh.metadata.vertex_count, 0);
        assert_eq!(mesh.metadata.deflection, 0.1);
    }

    #[test]
    fn coincident_seam_vertices_merge_and_average_normals() {
        let raw = RawMesh {
            positions: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                // second triangle shares the first edge's two vertices exactly
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.5, -1.0, 0.0],
            ],
            normals: vec![
                [0.0, 0.0, 1.0],
                [0.0, 0.0, 1.0],
                [0.0, 0.0, 1.0],
                [0.0, 0.0, -1.0],
                [0.0, 0.0, -1.0],
                [0.0, 0.0, -1.0],
            ],
            indices: vec![0, 1, 2, 3, 4, 5],
            face_ranges: vec![(FaceId(0), 0, 3), (FaceId(1), 3, 6)],
        };
        let mesh = assemble(&raw, 0.1);
        // 4 distinct positions after merging (the shared edge's 2 points fused).
        assert_eq!(mesh.metadata.vertex_count, 4);
        assert_eq!(mesh.metadata.face_count, 2);
    }
}
