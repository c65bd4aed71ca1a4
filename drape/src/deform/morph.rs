//! Re-deriving morph targets against a deformed base mesh.
//!
//! Two sources feed the output: morph targets authored on the original mesh,
//! and shape-key field groups that describe extra body-driven shapes.

use super::mesh::{Mesh, MorphFrame, MorphTarget};
use super::pass::{DeformationPass, deltas};
use super::report::SkippedItem;
use crate::error::{BakeError, Result};
use crate::math::*;
use crate::rbf::{RbfField, ShapeKeyFieldGroup};
use rayon::prelude::*;
use tracing::{debug, warn};

/// Authored morph targets after transfer, with the frames that could not be carried over.
#[derive(Debug, Default)]
pub struct TransferredMorphs {
    pub targets: Vec<MorphTarget>,
    pub skipped: Vec<SkippedItem>,
}

/// Re-derives every authored morph target of `original` under `primary`.
///
/// `base_displacement` is the local displacement the primary field gave the
/// original vertices. For each frame the shaped vertices `original + delta` are
/// deformed by the same field, and the new delta is
/// `delta + shape_displacement - base_displacement`, i.e. deformed shape minus
/// deformed base. Normal and tangent deltas are carried over unchanged.
pub fn transfer_existing_morphs(
    pass: &DeformationPass,
    original: &Mesh,
    base_displacement: &[Vec3],
    primary: &RbfField,
) -> Result<TransferredMorphs> {
    let per_target: Vec<(Option<MorphTarget>, Vec<SkippedItem>)> = original
        .morph_targets
        .par_iter()
        .map(|target| transfer_target(pass, original, base_displacement, primary, target))
        .collect::<Result<_>>()?;

    let mut out = TransferredMorphs::default();
    for (target, skipped) in per_target {
        out.targets.extend(target);
        out.skipped.extend(skipped);
    }
    Ok(out)
}

fn transfer_target(
    pass: &DeformationPass,
    original: &Mesh,
    base_displacement: &[Vec3],
    primary: &RbfField,
    target: &MorphTarget,
) -> Result<(Option<MorphTarget>, Vec<SkippedItem>)> {
    let vertex_count = original.vertex_count();
    let mut frames = Vec::with_capacity(target.frames.len());
    let mut skipped = Vec::new();

    for (index, frame) in target.frames.iter().enumerate() {
        if let Err(err) = check_frame_shape(&target.name, frame, vertex_count) {
            warn!(mesh = %original.name, target = %target.name, frame = index, "skipping morph frame: {}", err);
            skipped.push(SkippedItem::new(format!("{}/{}[{}]", original.name, target.name, index), err));
            continue;
        }

        let mut offsets = pass.ledger.alloc_from(&frame.delta_vertices)?;
        pass.accumulate(&original.positions, offsets.as_mut_slice(), primary);

        frames.push(MorphFrame {
            weight: frame.weight,
            delta_vertices: deltas(offsets.as_slice(), base_displacement),
            delta_normals: frame.delta_normals.clone(),
            delta_tangents: frame.delta_tangents.clone(),
        });
    }

    if frames.is_empty() {
        debug!(mesh = %original.name, target = %target.name, "no frame survived, dropping morph target");
        return Ok((None, skipped));
    }
    Ok((Some(MorphTarget { name: target.name.clone(), frames }), skipped))
}

fn check_frame_shape(target: &str, frame: &MorphFrame, vertex_count: usize) -> Result<()> {
    let arrays = [&frame.delta_vertices, &frame.delta_normals, &frame.delta_tangents];
    for (i, array) in arrays.into_iter().enumerate() {
        // normals and tangents may be absent; vertex deltas may not
        let optional = i > 0;
        if array.len() != vertex_count && !(optional && array.is_empty()) {
            return Err(BakeError::ShapeMismatch { target: target.to_string(), expected: vertex_count, got: array.len() });
        }
    }
    Ok(())
}

/// Bakes every shape-key group into a morph target over `deformed_base`.
///
/// Steps of a group form a chain: each step is evaluated at the position the
/// previous steps produced. Every step emits a frame at its weight whose delta is
/// measured against `deformed_base`, never against the previous step. Groups are
/// independent and run in parallel.
pub fn bake_shape_key_groups(
    pass: &DeformationPass,
    deformed_base: &[Vec3],
    groups: &[ShapeKeyFieldGroup],
) -> Result<Vec<MorphTarget>> {
    groups.par_iter().map(|group| bake_group(pass, deformed_base, group)).collect()
}

fn bake_group(pass: &DeformationPass, deformed_base: &[Vec3], group: &ShapeKeyFieldGroup) -> Result<MorphTarget> {
    let vertex_count = deformed_base.len();
    let mut chain = pass.ledger.alloc::<Vec3>(vertex_count)?;
    let mut frames = Vec::with_capacity(group.steps.len());

    for step in &group.steps {
        pass.accumulate(deformed_base, chain.as_mut_slice(), &step.field);
        frames.push(MorphFrame {
            weight: step.weight,
            delta_vertices: chain.as_slice().to_vec(),
            delta_normals: vec![Vec3::ZERO; vertex_count],
            delta_tangents: vec![Vec3::ZERO; vertex_count],
        });
    }

    debug!(group = %group.name, frames = frames.len(), "baked shape-key group");
    Ok(MorphTarget { name: group.name.clone(), frames })
}

/// Final morph set for a deformed mesh: transferred targets, then baked groups.
/// A baked group replaces a transferred target of the same name.
pub fn merge_morph_targets(mesh_name: &str, transferred: Vec<MorphTarget>, baked: Vec<MorphTarget>) -> Vec<MorphTarget> {
    let mut merged: Vec<MorphTarget> = transferred
        .into_iter()
        .filter(|t| {
            let shadowed = baked.iter().any(|b| b.name == t.name);
            if shadowed {
                warn!(mesh = %mesh_name, target = %t.name, "shape-key group replaces authored morph target");
            }
            !shadowed
        })
        .collect();
    merged.extend(baked);
    merged
}
