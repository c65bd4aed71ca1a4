use crate::error::{BakeError, Result};
use bytemuck::{Pod, Zeroable};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
struct LedgerInner {
    live_buffers: AtomicUsize,
    live_bytes: AtomicUsize,
    budget: Option<usize>,
}

/// Shared accounting for every working buffer of one deformer.
///
/// Buffers register on allocation and deregister on drop, so a ledger that reads
/// zero after `dispose` proves nothing leaked, whichever path the bake took.
#[derive(Debug, Clone, Default)]
pub struct BufferLedger {
    inner: Arc<LedgerInner>,
}

impl BufferLedger {
    pub fn new(budget: Option<usize>) -> Self {
        Self { inner: Arc::new(LedgerInner { budget, ..Default::default() }) }
    }

    pub fn budget(&self) -> Option<usize> {
        self.inner.budget
    }

    /// Number of buffers currently alive.
    pub fn live_buffers(&self) -> usize {
        self.inner.live_buffers.load(Ordering::Acquire)
    }

    /// Bytes currently held by live buffers.
    pub fn live_bytes(&self) -> usize {
        self.inner.live_bytes.load(Ordering::Acquire)
    }

    /// Zero-filled buffer of `len` elements.
    pub fn alloc<T: Pod>(&self, len: usize) -> Result<Buffer<T>> {
        let mut buffer = self.reserve::<T>(len)?;
        buffer.elems.resize(len, T::zeroed());
        Ok(buffer)
    }

    /// Buffer holding a copy of `src`.
    pub fn alloc_from<T: Pod>(&self, src: &[T]) -> Result<Buffer<T>> {
        let mut buffer = self.reserve::<T>(src.len())?;
        buffer.elems.extend_from_slice(src);
        Ok(buffer)
    }

    fn reserve<T: Pod>(&self, len: usize) -> Result<Buffer<T>> {
        let bytes = len.checked_mul(std::mem::size_of::<T>()).ok_or_else(|| BakeError::Resource {
            requested: usize::MAX,
            reason: format!("{} elements overflow the address space", len),
        })?;

        let budget = self.inner.budget;
        self.inner
            .live_bytes
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |live| {
                let next = live.checked_add(bytes)?;
                match budget {
                    Some(limit) if next > limit => None,
                    _ => Some(next),
                }
            })
            .map_err(|live| BakeError::Resource {
                requested: bytes,
                reason: format!("budget of {} bytes exhausted ({} in use)", budget.unwrap_or(usize::MAX), live),
            })?;

        let mut elems = Vec::new();
        if let Err(err) = elems.try_reserve_exact(len) {
            self.inner.live_bytes.fetch_sub(bytes, Ordering::AcqRel);
            return Err(BakeError::Resource { requested: bytes, reason: err.to_string() });
        }

        self.inner.live_buffers.fetch_add(1, Ordering::AcqRel);
        Ok(Buffer { elems, bytes, ledger: self.clone() })
    }

    fn release(&self, bytes: usize) {
        self.inner.live_bytes.fetch_sub(bytes, Ordering::AcqRel);
        self.inner.live_buffers.fetch_sub(1, Ordering::AcqRel);
    }
}

/// A vertex-sized working buffer. Its memory is returned to the ledger when it is dropped.
pub struct Buffer<T: Pod> {
    elems: Vec<T>,
    bytes: usize,
    ledger: BufferLedger,
}

impl<T: Pod> Buffer<T> {
    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.elems
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.elems
    }

}

impl<T: Pod + std::fmt::Debug> std::fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer").field("len", &self.elems.len()).field("bytes", &self.bytes).finish()
    }
}

impl<T: Pod> Drop for Buffer<T> {
    fn drop(&mut self) {
        self.ledger.release(self.bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    #[test]
    fn test_alloc_is_zeroed_and_tracked() {
        let ledger = BufferLedger::default();
        let buffer = ledger.alloc::<Vec3>(10).unwrap();
        assert_eq!(buffer.len(), 10);
        assert!(buffer.as_slice().iter().all(|v| *v == Vec3::ZERO));
        assert_eq!(ledger.live_buffers(), 1);
        assert_eq!(ledger.live_bytes(), 10 * 24);
        drop(buffer);
        assert_eq!(ledger.live_buffers(), 0);
        assert_eq!(ledger.live_bytes(), 0);
    }

    #[test]
    fn test_budget_is_enforced() {
        let ledger = BufferLedger::new(Some(100));
        let small = ledger.alloc::<f64>(10).unwrap();
        let err = ledger.alloc::<f64>(10).unwrap_err();
        assert!(matches!(err, BakeError::Resource { requested: 80, .. }));
        assert_eq!(ledger.live_buffers(), 1);
        drop(small);
        assert!(ledger.alloc::<f64>(10).is_ok());
        assert_eq!(ledger.live_buffers(), 0);
    }

    #[test]
    fn test_alloc_from_copies() {
        let ledger = BufferLedger::default();
        let src = [Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0)];
        let mut buffer = ledger.alloc_from(&src).unwrap();
        buffer.as_mut_slice()[0] = Vec3::ZERO;
        assert_eq!(buffer.as_slice(), &[Vec3::ZERO, src[1]]);
        assert_eq!(ledger.live_bytes(), 48);
    }

    #[test]
    fn test_clones_share_one_ledger() {
        let ledger = BufferLedger::default();
        let other = ledger.clone();
        let _buffer = other.alloc::<u32>(4).unwrap();
        assert_eq!(ledger.live_buffers(), 1);
    }
}
