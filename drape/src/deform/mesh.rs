use crate::math::*;
use serde::{Deserialize, Serialize};

/// One weighted frame of a morph target. Delta arrays are index-aligned with the mesh vertices;
/// normal and tangent deltas may be empty when the source carries none.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MorphFrame {
    pub weight: f64,
    pub delta_vertices: Vec<Vec3>,
    pub delta_normals: Vec<Vec3>,
    pub delta_tangents: Vec<Vec3>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MorphTarget {
    pub name: String,
    pub frames: Vec<MorphFrame>,
}

#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,  // empty if absent
    pub tangents: Vec<Vec3>, // empty if absent
    pub indices: Vec<u32>,   // triangle list
    pub morph_targets: Vec<MorphTarget>,
    pub aabb: AABB,
    /// Set on meshes produced by a bake, so they are never fed back in as originals.
    pub deformed_output: bool,
}

impl Mesh {
    pub fn new(name: impl Into<String>, positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let aabb = AABB::from_points(&positions);
        Self { name: name.into(), positions, indices, aabb, ..Default::default() }
    }

    pub fn with_morph_target(mut self, target: MorphTarget) -> Self {
        self.morph_targets.push(target);
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn recompute_bounds(&mut self) {
        self.aabb = AABB::from_points(&self.positions);
    }

    /// Replaces normals with area-weighted face normals. Meshes without triangles keep theirs.
    pub fn recompute_normals(&mut self) {
        if let Some(normals) = compute_normals(&self.positions, &self.indices) {
            self.normals = normals;
        }
    }
}

/// Per-vertex normals from accumulated, area-weighted triangle normals.
///
/// Returns `None` when `indices` holds no complete triangle. Triangles referencing
/// out-of-range vertices are ignored.
pub fn compute_normals(positions: &[Vec3], indices: &[u32]) -> Option<Vec<Vec3>> {
    if indices.len() < 3 {
        return None;
    }

    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
            continue;
        }
        // length of the cross product is twice the triangle area
        let face = cross(positions[i1] - positions[i0], positions[i2] - positions[i0]);
        normals[i0] += face;
        normals[i1] += face;
        normals[i2] += face;
    }

    for n in normals.iter_mut() {
        *n = n.normalized_or_zero();
    }
    Some(normals)
}
