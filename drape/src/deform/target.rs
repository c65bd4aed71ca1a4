use super::buffer::Buffer;
use super::hierarchy::{NodeId, Transform};
use super::mesh::{Mesh, MorphTarget, compute_normals};
use super::morph::{bake_shape_key_groups, merge_morph_targets, transfer_existing_morphs};
use super::pass::DeformationPass;
use super::report::SkippedItem;
use crate::error::Result;
use crate::math::*;
use crate::rbf::FieldSet;
use std::sync::Arc;
use tracing::debug;

/// Suffix given to the names of baked meshes.
pub const DEFORMED_SUFFIX: &str = "_deformed";

/// Output of one mesh bake. Positions live in a ledger-tracked buffer; every other
/// array is plain output data for the persistence side.
#[derive(Debug)]
pub struct DeformedMesh {
    pub name: String,
    pub positions: Buffer<Vec3>,
    pub normals: Vec<Vec3>,
    pub aabb: AABB,
    pub morph_targets: Vec<MorphTarget>,
}

impl DeformedMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Standalone mesh built from this output, flagged so it is never baked again.
    /// Topology and tangents come from `original`.
    pub fn to_mesh(&self, original: &Mesh) -> Mesh {
        Mesh {
            name: self.name.clone(),
            positions: self.positions.as_slice().to_vec(),
            normals: self.normals.clone(),
            tangents: original.tangents.clone(),
            indices: original.indices.clone(),
            morph_targets: self.morph_targets.clone(),
            aabb: self.aabb,
            deformed_output: true,
        }
    }
}

/// What baking one mesh produced, before it is committed to a [`MeshTarget`].
#[derive(Debug)]
pub struct MeshBake {
    pub mesh: DeformedMesh,
    pub morph_targets_processed: usize,
    pub shape_key_frames: usize,
    pub skipped: Vec<SkippedItem>,
}

/// Deforms `original` and all of its morph data under `fields`.
///
/// `original` is only read. Every working buffer is scoped to this call; on an
/// error they are all released before the error reaches the caller.
pub fn bake_mesh(pass: &DeformationPass, original: &Mesh, fields: &FieldSet) -> Result<MeshBake> {
    let base_displacement = pass.displacements(&original.positions, &fields.primary)?;
    let mut positions = pass.ledger.alloc_from(&original.positions)?;
    for (p, d) in positions.as_mut_slice().iter_mut().zip(base_displacement.as_slice()) {
        *p += *d;
    }

    let normals = compute_normals(positions.as_slice(), &original.indices).unwrap_or_else(|| original.normals.clone());
    let aabb = AABB::from_points(positions.as_slice());

    let transferred = transfer_existing_morphs(pass, original, base_displacement.as_slice(), &fields.primary)?;
    drop(base_displacement);
    let baked = bake_shape_key_groups(pass, positions.as_slice(), &fields.shape_keys)?;

    let morph_targets_processed = transferred.targets.len() + baked.len();
    let shape_key_frames = baked.iter().map(|t| t.frames.len()).sum();
    let morph_targets = merge_morph_targets(&original.name, transferred.targets, baked);

    debug!(
        mesh = %original.name,
        vertices = original.vertex_count(),
        morph_targets = morph_targets.len(),
        "baked mesh"
    );

    Ok(MeshBake {
        mesh: DeformedMesh {
            name: format!("{}{}", original.name, DEFORMED_SUFFIX),
            positions,
            normals,
            aabb,
            morph_targets,
        },
        morph_targets_processed,
        shape_key_frames,
        skipped: transferred.skipped,
    })
}

/// Registry record binding a node to its undeformed mesh and its latest bake.
#[derive(Debug)]
pub struct MeshTarget {
    id: NodeId,
    original: Arc<Mesh>,
    transform: Transform,
    deformed: Option<DeformedMesh>,
}

impl MeshTarget {
    pub fn new(id: NodeId, original: Arc<Mesh>, transform: Transform) -> Self {
        Self { id, original, transform, deformed: None }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn original(&self) -> &Arc<Mesh> {
        &self.original
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn deformed(&self) -> Option<&DeformedMesh> {
        self.deformed.as_ref()
    }

    pub(crate) fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    /// Points the target at new source geometry. A bake of the old geometry is
    /// released if the vertex count no longer matches.
    pub(crate) fn set_original(&mut self, original: Arc<Mesh>) {
        if self.deformed.as_ref().is_some_and(|d| d.vertex_count() != original.vertex_count()) {
            self.deformed = None;
        }
        self.original = original;
    }

    /// Stores a finished bake. The existing position buffer is reused when the
    /// vertex count is unchanged and recreated otherwise. Returns whether it was reused.
    pub(crate) fn commit(&mut self, output: DeformedMesh) -> bool {
        match &mut self.deformed {
            Some(current) if current.vertex_count() == output.vertex_count() => {
                current.positions.as_mut_slice().copy_from_slice(output.positions.as_slice());
                current.name = output.name;
                current.normals = output.normals;
                current.aabb = output.aabb;
                current.morph_targets = output.morph_targets;
                true
            }
            _ => {
                self.deformed = Some(output);
                false
            }
        }
    }

    /// Drops the deformed output, returning its buffer to the ledger.
    pub fn release(&mut self) {
        self.deformed = None;
    }
}
