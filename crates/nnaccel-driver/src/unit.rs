//! Compute units and the unit pool
//!
//! Each unit owns its own copy of whatever was last written to it, and
//! counts how many times it has been bound or cleared. A vector remembers
//! the generation it was bound at; once another bind or a clear moves the
//! unit on, that vector no longer owns it. The pool
//! guards every unit with its own lock, so operations on disjoint unit pairs
//! never contend; there is no pool-wide lock.

use crate::buffer::LaneBuffer;
use crate::error::{AccelError, Result};
use nnaccel_chip::units::{is_valid_unit, UNIT_COUNT};
use parking_lot::{Mutex, MutexGuard};
use std::fmt;

/// Validated compute-unit id in `0..256`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitId(u16);

impl UnitId {
    /// Validate a raw id
    ///
    /// # Errors
    ///
    /// Returns `InvalidUnitId` if `id >= 256`.
    pub fn new(id: usize) -> Result<Self> {
        if is_valid_unit(id) {
            #[allow(clippy::cast_possible_truncation)]
            Ok(Self(id as u16))
        } else {
            Err(AccelError::InvalidUnitId {
                id,
                count: UNIT_COUNT,
            })
        }
    }

    /// Raw id
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unit({})", self.0)
    }
}

impl TryFrom<usize> for UnitId {
    type Error = AccelError;

    fn try_from(id: usize) -> Result<Self> {
        Self::new(id)
    }
}

/// One hardware-lane slot; idle until first written
#[derive(Debug)]
pub struct ComputeUnit {
    id: UnitId,
    storage: Option<LaneBuffer>,
    generation: u64,
}

impl ComputeUnit {
    fn idle(id: UnitId) -> Self {
        Self {
            id,
            storage: None,
            generation: 0,
        }
    }

    /// Unit id
    pub fn id(&self) -> UnitId {
        self.id
    }

    /// True until the unit is first written
    pub fn is_idle(&self) -> bool {
        self.storage.is_none()
    }

    /// Borrow the stored buffer
    ///
    /// # Errors
    ///
    /// Returns `UnboundUnit` if the unit has never been written.
    pub fn contents(&self) -> Result<&LaneBuffer> {
        self.storage.as_ref().ok_or(AccelError::UnboundUnit {
            unit: self.id.index(),
        })
    }

    /// Bind/clear counter; starts at 0
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Store `buffer` as a new binding and return its generation
    pub(crate) fn bind(&mut self, buffer: LaneBuffer) -> u64 {
        self.store(buffer);
        self.generation += 1;
        self.generation
    }

    /// Replace the stored buffer
    pub fn store(&mut self, buffer: LaneBuffer) {
        if let Some(prev) = &self.storage {
            if prev.len() != buffer.len() {
                tracing::warn!(
                    "{}: overwriting {} elements with {}",
                    self.id,
                    prev.len(),
                    buffer.len()
                );
            }
        }
        self.storage = Some(buffer);
    }

    /// Return to idle, releasing any vector bound here
    pub fn clear(&mut self) {
        self.storage = None;
        self.generation += 1;
    }
}

/// Fixed pool of [`UNIT_COUNT`] units, each behind its own lock
#[derive(Debug)]
pub(crate) struct UnitPool {
    units: Box<[Mutex<ComputeUnit>]>,
}

/// Locked view of the units an operation touches
pub(crate) enum UnitGuards<'a> {
    /// Source and target are the same unit
    Same(MutexGuard<'a, ComputeUnit>),
    /// Distinct source and target
    Pair {
        source: MutexGuard<'a, ComputeUnit>,
        target: MutexGuard<'a, ComputeUnit>,
    },
}

impl UnitPool {
    pub(crate) fn new() -> Self {
        let units = (0..UNIT_COUNT)
            .map(|i| {
                #[allow(clippy::cast_possible_truncation)]
                let id = UnitId(i as u16);
                Mutex::new(ComputeUnit::idle(id))
            })
            .collect();
        Self { units }
    }

    pub(crate) fn lock(&self, id: UnitId) -> MutexGuard<'_, ComputeUnit> {
        self.units[id.index()].lock()
    }

    /// Lock source and target, lower id first so concurrent callers
    /// addressing the same pair cannot deadlock.
    pub(crate) fn lock_pair(&self, source: UnitId, target: UnitId) -> UnitGuards<'_> {
        if source == target {
            return UnitGuards::Same(self.lock(source));
        }
        if source < target {
            let source = self.lock(source);
            let target = self.lock(target);
            UnitGuards::Pair { source, target }
        } else {
            let target = self.lock(target);
            let source = self.lock(source);
            UnitGuards::Pair { source, target }
        }
    }

    pub(crate) fn populated(&self) -> Vec<UnitId> {
        self.units
            .iter()
            .filter_map(|slot| {
                let unit = slot.lock();
                (!unit.is_idle()).then_some(unit.id())
            })
            .collect()
    }
}
