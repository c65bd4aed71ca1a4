use super::buffer::{Buffer, BufferLedger};
use super::hierarchy::Transform;
use crate::error::Result;
use crate::math::*;
use crate::rbf::DisplacementField;
use rayon::prelude::*;

/// One mesh's deformation context: where its buffers come from and how its
/// local vertices relate to the world space the fields live in.
pub struct DeformationPass<'a> {
    pub ledger: &'a BufferLedger,
    pub transform: Transform,
    pub chunk_size: usize,
}

impl<'a> DeformationPass<'a> {
    pub fn new(ledger: &'a BufferLedger, transform: Transform, chunk_size: usize) -> Self {
        Self { ledger, transform, chunk_size: chunk_size.max(1) }
    }

    /// Deformed copy of `local`: each vertex plus the field evaluated at its world
    /// position, rotated back into local space.
    pub fn run<F>(&self, local: &[Vec3], field: &F) -> Result<Buffer<Vec3>>
    where
        F: DisplacementField + ?Sized,
    {
        let mut out = self.displacements(local, field)?;
        out.as_mut_slice().par_chunks_mut(self.chunk_size).zip(local.par_chunks(self.chunk_size)).for_each(
            |(dst, src)| {
                for (d, &p) in dst.iter_mut().zip(src) {
                    *d = p + *d;
                }
            },
        );
        Ok(out)
    }

    /// Local-space displacement of every vertex of `local`.
    pub fn displacements<F>(&self, local: &[Vec3], field: &F) -> Result<Buffer<Vec3>>
    where
        F: DisplacementField + ?Sized,
    {
        let mut offsets = self.ledger.alloc::<Vec3>(local.len())?;
        self.accumulate(local, offsets.as_mut_slice(), field);
        Ok(offsets)
    }

    /// One step of a chain: each vertex currently sits at `origin[i] + offsets[i]`,
    /// and its local displacement at that position is added onto `offsets[i]`.
    ///
    /// Vertices are independent, so chunks run on the worker pool and are joined
    /// before this returns.
    pub fn accumulate<F>(&self, origin: &[Vec3], offsets: &mut [Vec3], field: &F)
    where
        F: DisplacementField + ?Sized,
    {
        debug_assert_eq!(origin.len(), offsets.len());
        let transform = &self.transform;
        offsets.par_chunks_mut(self.chunk_size).zip(origin.par_chunks(self.chunk_size)).for_each(|(dst, src)| {
            for (offset, &p) in dst.iter_mut().zip(src) {
                let world = transform.point_to_world(p + *offset);
                *offset += transform.direction_to_local(field.displacement(world));
            }
        });
    }
}

/// `a[i] - b[i]` for index-aligned buffers.
pub fn deltas(a: &[Vec3], b: &[Vec3]) -> Vec<Vec3> {
    debug_assert_eq!(a.len(), b.len());
    a.par_iter().zip(b.par_iter()).map(|(&a, &b)| a - b).collect()
}
