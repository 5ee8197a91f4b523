use tracing::{debug, warn};

use crate::error::Result;
use crate::traits::ActivityStore;
use crate::types::WriteOp;

/// Accumulates writes and applies them in staging order, one round-trip per
/// flush. Flushes on its own once `threshold` ops are staged; callers flush
/// the remainder explicitly.
pub struct WriteBatch<'a> {
    store: &'a dyn ActivityStore,
    staged: Vec<WriteOp>,
    threshold: usize,
    flushed: usize,
}

impl<'a> WriteBatch<'a> {
    pub fn new(store: &'a dyn ActivityStore, threshold: usize) -> Self {
        let threshold = threshold.max(1);
        Self {
            store,
            staged: Vec::with_capacity(threshold),
            threshold,
            flushed: 0,
        }
    }

    pub async fn stage(&mut self, op: WriteOp) -> Result<()> {
        self.staged.push(op);
        if self.staged.len() >= self.threshold {
            self.flush().await?;
        }
        Ok(())
    }

    /// Apply everything staged. Returns how many ops were applied. Staged ops
    /// are discarded if the store rejects the batch.
    pub async fn flush(&mut self) -> Result<usize> {
        if self.staged.is_empty() {
            return Ok(0);
        }
        let ops = std::mem::take(&mut self.staged);
        self.store.apply(&ops).await?;
        self.flushed += ops.len();
        debug!(applied = ops.len(), total = self.flushed, "Flushed write batch");
        Ok(ops.len())
    }

    pub fn pending(&self) -> usize {
        self.staged.len()
    }

    /// Ops applied over the batch's lifetime.
    pub fn flushed(&self) -> usize {
        self.flushed
    }
}

impl Drop for WriteBatch<'_> {
    fn drop(&mut self) {
        if !self.staged.is_empty() {
            warn!(pending = self.staged.len(), "Write batch dropped with unflushed ops");
        }
    }
}
