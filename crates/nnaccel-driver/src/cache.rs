//! Prepared-matrix cache
//!
//! `prepare` copies a matrix, partitions it once and hands back a
//! [`PreparedMatrix`] handle; `compute` then reuses the partition for any
//! number of vectors. Each prepare yields an independent entry, so two
//! prepares of equal matrices never share state and mutating the source
//! afterwards cannot leak into the cache.
//!
//! Handles carry the id of the cache that issued them; a handle presented
//! to any other cache is rejected rather than resolved against its entries.
//!
//! Preparation and release take the write lock. Computation only holds the
//! read lock long enough to clone the entry's `Arc`, so concurrent computes
//! against prepared handles run in parallel.

use crate::block::BlockPartition;
use crate::error::{AccelError, Result};
use crate::matrix::Matrix;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

static NEXT_CACHE_ID: AtomicU64 = AtomicU64::new(0);

/// Handle to a prepared matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PreparedMatrix {
    cache: u64,
    id: u64,
    rows: usize,
    cols: usize,
}

impl PreparedMatrix {
    /// Cache-assigned id
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Row count of the prepared matrix
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Column count (required vector length)
    pub const fn cols(&self) -> usize {
        self.cols
    }
}

/// Store of block partitions keyed by handle
#[derive(Debug)]
pub struct MatrixCache {
    instance: u64,
    entries: RwLock<HashMap<u64, Arc<BlockPartition>>>,
    next_id: AtomicU64,
}

impl Default for MatrixCache {
    fn default() -> Self {
        Self {
            instance: NEXT_CACHE_ID.fetch_add(1, Ordering::Relaxed),
            entries: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }
}

impl MatrixCache {
    /// Empty cache with a process-unique instance id
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `handle` was issued by this cache
    pub fn owns(&self, handle: PreparedMatrix) -> bool {
        handle.cache == self.instance
    }

    /// Partition `matrix` and retain it
    pub fn prepare(&self, matrix: &Matrix) -> PreparedMatrix {
        let partition = BlockPartition::new(matrix);
        let (row_blocks, col_blocks) = partition.grid();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.write().insert(id, Arc::new(partition));
        info!(
            "Prepared matrix #{id}: {}×{} in {row_blocks}×{col_blocks} blocks",
            matrix.rows(),
            matrix.cols()
        );
        PreparedMatrix {
            cache: self.instance,
            id,
            rows: matrix.rows(),
            cols: matrix.cols(),
        }
    }

    /// Shared partition behind `handle`
    ///
    /// # Errors
    ///
    /// Returns `NotBound` if the handle was released or came from another cache.
    pub fn partition(&self, handle: PreparedMatrix) -> Result<Arc<BlockPartition>> {
        if !self.owns(handle) {
            return Err(AccelError::not_bound(format!(
                "prepared matrix #{} belongs to another accelerator",
                handle.id
            )));
        }
        self.entries
            .read()
            .get(&handle.id)
            .cloned()
            .ok_or_else(|| AccelError::not_bound(format!("prepared matrix #{} is not cached", handle.id)))
    }

    /// `matrix · x` against the cached partition
    ///
    /// # Errors
    ///
    /// Returns `NotBound` for an unknown handle and `InvalidShape` if
    /// `x.len()` differs from the matrix column count.
    pub fn compute(&self, handle: PreparedMatrix, x: &[f32]) -> Result<Vec<f32>> {
        let partition = self.partition(handle)?;
        debug!("Computing with prepared matrix #{} ({} inputs)", handle.id, x.len());
        partition.multiply(x)
    }

    /// Drop the entry behind `handle`; returns whether it existed.
    /// Handles from another cache are never released here.
    pub fn release(&self, handle: PreparedMatrix) -> bool {
        if !self.owns(handle) {
            warn!("Release of prepared matrix #{} from another cache", handle.id);
            return false;
        }
        let removed = self.entries.write().remove(&handle.id).is_some();
        if removed {
            info!("Released prepared matrix #{}", handle.id);
        } else {
            warn!("Release of unknown prepared matrix #{}", handle.id);
        }
        removed
    }

    /// Number of cached partitions
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True if nothing is cached
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
