//! Vectors and their unit binding

use crate::buffer::LaneBuffer;
use crate::error::{AccelError, Result};
use crate::unit::UnitId;
use std::fmt;

/// Lane-aligned vector with an optional compute-unit binding
///
/// An unbound vector is valid and inert. Binding is recorded by
/// `Accelerator::bind_to_unit`, which copies the data into the unit; later
/// edits to the vector do not reach the unit until it is bound again. A
/// binding goes stale once another vector is bound to the same unit or the
/// unit is cleared.
#[derive(Debug, Clone, PartialEq)]
pub struct Vector {
    buffer: LaneBuffer,
    binding: Option<Binding>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Binding {
    unit: UnitId,
    generation: u64,
}

impl Vector {
    /// Build from raw values
    ///
    /// # Errors
    ///
    /// Returns `InvalidShape` if the length is zero or not a multiple of 16.
    pub fn from_slice(values: &[f32]) -> Result<Self> {
        Ok(Self::from_buffer(LaneBuffer::from_slice(values)?))
    }

    /// Zero vector of `len` elements
    ///
    /// # Errors
    ///
    /// Returns `InvalidShape` if the length is zero or not a multiple of 16.
    pub fn zeros(len: usize) -> Result<Self> {
        Ok(Self::from_buffer(LaneBuffer::zeros(len)?))
    }

    /// Wrap an existing buffer (unbound)
    pub fn from_buffer(buffer: LaneBuffer) -> Self {
        Self {
            buffer,
            binding: None,
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Always false
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Element at `index`
    pub fn get(&self, index: usize) -> Option<f32> {
        self.buffer.as_slice().get(index).copied()
    }

    /// Overwrite element at `index`
    ///
    /// # Errors
    ///
    /// Returns `InvalidShape` if `index` is out of range.
    pub fn set(&mut self, index: usize, value: f32) -> Result<()> {
        let len = self.len();
        let slot = self.buffer.as_mut_slice().get_mut(index).ok_or_else(|| {
            AccelError::invalid_shape(format!("index {index} out of range for length {len}"))
        })?;
        *slot = value;
        Ok(())
    }

    /// Borrow the backing buffer
    pub fn buffer(&self) -> &LaneBuffer {
        &self.buffer
    }

    /// Borrow the elements
    pub fn as_slice(&self) -> &[f32] {
        self.buffer.as_slice()
    }

    /// Export the elements
    pub fn to_vec(&self) -> Vec<f32> {
        self.buffer.to_vec()
    }

    /// Bound unit, if any
    pub fn binding(&self) -> Option<UnitId> {
        self.binding.map(|b| b.unit)
    }

    /// True if bound to a unit
    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// Bound unit, or `NotBound`
    ///
    /// # Errors
    ///
    /// Returns `NotBound` if the vector was never bound.
    pub fn require_binding(&self) -> Result<UnitId> {
        self.binding
            .map(|b| b.unit)
            .ok_or_else(|| AccelError::not_bound(format!("vector of length {} has no unit", self.len())))
    }

    /// Generation of the unit this vector was bound at
    pub(crate) fn binding_generation(&self) -> Option<u64> {
        self.binding.map(|b| b.generation)
    }

    pub(crate) fn set_binding(&mut self, unit: UnitId, generation: u64) {
        self.binding = Some(Binding { unit, generation });
    }

    pub(crate) fn replace_buffer(&mut self, buffer: LaneBuffer) {
        self.buffer = buffer;
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.binding() {
            Some(unit) => write!(f, "Vector(len={}, {unit})", self.len()),
            None => write!(f, "Vector(len={}, unbound)", self.len()),
        }
    }
}
