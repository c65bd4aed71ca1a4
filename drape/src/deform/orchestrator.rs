//! Applying one field set to every mesh of a hierarchy.

use super::buffer::BufferLedger;
use super::hierarchy::{Node, NodeId, Transform};
use super::mesh::Mesh;
use super::pass::DeformationPass;
use super::report::{BakeReport, SkippedItem};
use super::target::{MeshBake, MeshTarget, bake_mesh};
use crate::config::BakeConfig;
use crate::error::{BakeError, Result};
use crate::rbf::{CoordinateBridge, FieldSet, RbfData};
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Owns a field set, the registry of meshes it has deformed, and the ledger all
/// working buffers are drawn from.
///
/// Call [`dispose`](Self::dispose) (or [`close`](Self::close)) when the deformed
/// output is no longer needed. Nothing releases the registry implicitly except
/// dropping the deformer, which logs a warning if it still held output.
pub struct Deformer {
    fields: FieldSet,
    config: BakeConfig,
    ledger: BufferLedger,
    registry: HashMap<NodeId, MeshTarget>,
}

/// One mesh to bake, staged without touching the registry.
struct Job {
    id: NodeId,
    label: String,
    original: Arc<Mesh>,
    transform: Transform,
}

impl Deformer {
    pub fn new(fields: FieldSet, config: BakeConfig) -> Self {
        Self { fields, ledger: BufferLedger::new(config.memory_budget), config, registry: HashMap::new() }
    }

    /// Converts `data` with the bridge named in `config`. Malformed data aborts here.
    pub fn from_data(data: &RbfData, config: BakeConfig) -> Result<Self> {
        let bridge = CoordinateBridge::from_preset(config.bridge);
        Ok(Self::new(FieldSet::from_data(data, &bridge)?, config))
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn config(&self) -> &BakeConfig {
        &self.config
    }

    pub fn ledger(&self) -> &BufferLedger {
        &self.ledger
    }

    /// Inserts a target or updates the one already registered under `id`.
    pub fn register(&mut self, id: NodeId, original: Arc<Mesh>, transform: Transform) -> &mut MeshTarget {
        let target = self.registry.entry(id).or_insert_with(|| MeshTarget::new(id, original.clone(), transform));
        if !Arc::ptr_eq(target.original(), &original) {
            target.set_original(original);
        }
        target.set_transform(transform);
        target
    }

    pub fn target(&self, id: NodeId) -> Option<&MeshTarget> {
        self.registry.get(&id)
    }

    pub fn targets(&self) -> impl Iterator<Item = &MeshTarget> {
        self.registry.values()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Removes a target, handing it (and its deformed buffer) to the caller.
    pub fn evict(&mut self, id: NodeId) -> Option<MeshTarget> {
        self.registry.remove(&id)
    }

    /// Deforms every mesh under `root`.
    ///
    /// Nodes with a renderer but no mesh, and unregistered nodes whose mesh is
    /// already a bake output, are skipped and reported. A registered node showing
    /// its own bake output is baked again from the registered original.
    ///
    /// Every mesh is computed into fresh buffers before the registry is touched.
    /// If any mesh fails fatally, every fresh buffer is dropped and the registry
    /// is left exactly as it was.
    pub fn bake(&mut self, root: &Node) -> Result<BakeReport> {
        let mut report = BakeReport::default();
        let jobs = self.collect_jobs(root, &mut report);

        let results: Vec<(Job, Result<MeshBake>)> = {
            let fields = &self.fields;
            let ledger = &self.ledger;
            let chunk_size = self.config.effective_chunk_size();
            let run = |job: Job| {
                let pass = DeformationPass::new(ledger, job.transform, chunk_size);
                let result = bake_mesh(&pass, &job.original, fields);
                (job, result)
            };
            if self.config.parallel_meshes {
                jobs.into_par_iter().map(run).collect()
            } else {
                jobs.into_iter().map(run).collect()
            }
        };

        let mut finished = Vec::with_capacity(results.len());
        for (job, result) in results {
            match result {
                Ok(bake) => finished.push((job, bake)),
                Err(err) if err.is_fatal() => {
                    warn!(mesh = %job.label, "bake aborted: {}", err);
                    return Err(err);
                }
                Err(err) => {
                    warn!(mesh = %job.label, "skipping mesh: {}", err);
                    report.skipped.push(SkippedItem::new(job.label, err));
                }
            }
        }

        for (job, bake) in finished {
            report.meshes_processed += 1;
            report.morph_targets_processed += bake.morph_targets_processed;
            report.shape_key_frames += bake.shape_key_frames;
            report.skipped.extend(bake.skipped);
            let reused = self.register(job.id, job.original, job.transform).commit(bake.mesh);
            debug!(node = %job.id, reused, "committed deformed mesh");
        }

        info!(
            meshes = report.meshes_processed,
            morph_targets = report.morph_targets_processed,
            skipped = report.skipped.len(),
            live_buffers = self.ledger.live_buffers(),
            "bake finished"
        );
        Ok(report)
    }

    fn collect_jobs(&self, root: &Node, report: &mut BakeReport) -> Vec<Job> {
        let mut jobs = Vec::new();
        root.visit_renderers(&mut |node, renderer, world| {
            let label = format!("{} ({})", node.name, node.id);
            let registered = self.registry.get(&node.id).map(|t| t.original().clone());
            let original = match (&renderer.mesh, registered) {
                (Some(mesh), _) if !mesh.deformed_output => mesh.clone(),
                (Some(_), Some(original)) => {
                    // our own output is assigned; bake again from the registered original
                    debug!(node = %label, "assigned mesh is a deformed output, baking from registered original");
                    report.rebaked_from_registry += 1;
                    original
                }
                (Some(_), None) => {
                    warn!(node = %label, "mesh is already a deformed output, skipping");
                    report.skipped.push(SkippedItem::new(label, "assigned mesh is already a deformed output"));
                    return;
                }
                (None, Some(original)) => original,
                (None, None) => {
                    let err = BakeError::MissingInput(format!("node {} has no mesh assigned", label));
                    warn!("{}", err);
                    report.skipped.push(SkippedItem::new(label, err));
                    return;
                }
            };
            jobs.push(Job { id: node.id, label, original, transform: *world });
        });
        jobs
    }

    /// Assigns each committed bake to its node as a new mesh flagged as deformed
    /// output. Returns how many nodes were updated.
    pub fn apply(&self, root: &mut Node) -> usize {
        let mut updated = 0;
        root.for_each_node_mut(&mut |node| {
            let Some(target) = self.registry.get(&node.id) else { return };
            let Some(deformed) = target.deformed() else { return };
            if let Some(renderer) = node.renderer.as_mut() {
                renderer.mesh = Some(Arc::new(deformed.to_mesh(target.original())));
                updated += 1;
            }
        });
        updated
    }

    /// Releases every deformed buffer and forgets all targets. Mandatory once the
    /// output has been handed off.
    pub fn dispose(&mut self) {
        for target in self.registry.values_mut() {
            target.release();
        }
        self.registry.clear();
        debug!(live_buffers = self.ledger.live_buffers(), "deformer disposed");
    }

    /// Disposes and consumes the deformer. The ledger is returned so callers can check for leaks.
    pub fn close(mut self) -> BufferLedger {
        self.dispose();
        self.ledger.clone()
    }
}

impl Drop for Deformer {
    fn drop(&mut self) {
        if !self.registry.is_empty() {
            warn!(targets = self.registry.len(), "deformer dropped without dispose");
        }
    }
}
