//! Lane-aligned f32 storage
//!
//! [`LaneBuffer`] is the unit of storage for vectors and unit slots. Its
//! length is always a non-zero multiple of [`LANE_WIDTH`]; a misaligned
//! length is rejected at construction, never padded or truncated.

use crate::error::{AccelError, Result};
use nnaccel_chip::lanes::{is_lane_aligned, lanes_in, LANE_WIDTH};

/// Owned f32 buffer whose length is `k × 16`, `k ≥ 1`
#[derive(Debug, Clone, PartialEq)]
pub struct LaneBuffer {
    data: Vec<f32>,
}

impl LaneBuffer {
    /// Wrap an owned vector
    ///
    /// # Errors
    ///
    /// Returns `InvalidShape` if the length is zero or not a multiple of 16.
    pub fn new(data: Vec<f32>) -> Result<Self> {
        check_len(data.len())?;
        Ok(Self { data })
    }

    /// Copy a slice into a new buffer
    ///
    /// # Errors
    ///
    /// Returns `InvalidShape` if the length is zero or not a multiple of 16.
    pub fn from_slice(values: &[f32]) -> Result<Self> {
        check_len(values.len())?;
        Ok(Self {
            data: values.to_vec(),
        })
    }

    /// Zero-filled buffer of `len` elements
    ///
    /// # Errors
    ///
    /// Returns `InvalidShape` if the length is zero or not a multiple of 16.
    pub fn zeros(len: usize) -> Result<Self> {
        check_len(len)?;
        Ok(Self {
            data: vec![0.0; len],
        })
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false; kept for the `len`/`is_empty` pair
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of 16-element lanes
    pub fn lanes(&self) -> usize {
        lanes_in(self.data.len())
    }

    /// Iterate over lanes
    pub fn lane_chunks(&self) -> std::slice::ChunksExact<'_, f32> {
        self.data.chunks_exact(LANE_WIDTH)
    }

    /// Borrow the elements
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Borrow the elements mutably (length stays fixed)
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Copy the elements out
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.clone()
    }

    /// Take the elements
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// New buffer with `f` applied to every element
    #[must_use]
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Self {
        Self {
            data: self.data.iter().map(|&x| f(x)).collect(),
        }
    }

    /// Combine `other` into `self` element-wise: `self[i] = f(self[i], other[i])`
    ///
    /// # Errors
    ///
    /// Returns `InvalidShape` if the lengths differ; `self` is untouched.
    pub fn zip_apply(&mut self, other: &Self, f: impl Fn(f32, f32) -> f32) -> Result<()> {
        ensure_same_len(self.len(), other.len())?;
        for (a, &b) in self.data.iter_mut().zip(other.data.iter()) {
            *a = f(*a, b);
        }
        Ok(())
    }
}

impl TryFrom<Vec<f32>> for LaneBuffer {
    type Error = AccelError;

    fn try_from(data: Vec<f32>) -> Result<Self> {
        Self::new(data)
    }
}

impl AsRef<[f32]> for LaneBuffer {
    fn as_ref(&self) -> &[f32] {
        &self.data
    }
}

fn check_len(len: usize) -> Result<()> {
    if is_lane_aligned(len) {
        Ok(())
    } else {
        Err(AccelError::invalid_shape(format!(
            "length {len} is not a non-zero multiple of {LANE_WIDTH}"
        )))
    }
}

pub(crate) fn ensure_same_len(left: usize, right: usize) -> Result<()> {
    if left == right {
        Ok(())
    } else {
        Err(AccelError::invalid_shape(format!(
            "operand lengths differ: {left} vs {right}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn rejects_misaligned_lengths() {
        for len in [0, 1, 15, 17, 31, 33] {
            let err = LaneBuffer::zeros(len).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidShape, "len {len}");
        }
        assert!(LaneBuffer::new(vec![1.0; 48]).is_ok());
    }

    #[test]
    fn lanes_and_chunks() {
        let buf = LaneBuffer::from_slice(&(0..32).map(|i| i as f32).collect::<Vec<_>>()).unwrap();
        assert_eq!(buf.lanes(), 2);
        let firsts: Vec<f32> = buf.lane_chunks().map(|lane| lane[0]).collect();
        assert_eq!(firsts, vec![0.0, 16.0]);
    }

    #[test]
    fn map_does_not_mutate_source() {
        let buf = LaneBuffer::new(vec![-1.0; 16]).unwrap();
        let doubled = buf.map(|x| x * 2.0);
        assert!(buf.as_slice().iter().all(|&x| x == -1.0));
        assert!(doubled.as_slice().iter().all(|&x| x == -2.0));
    }

    #[test]
    fn zip_apply_checks_length_first() {
        let mut a = LaneBuffer::new(vec![1.0; 16]).unwrap();
        let b = LaneBuffer::new(vec![1.0; 32]).unwrap();
        assert!(a.zip_apply(&b, |x, y| x + y).is_err());
        assert!(a.as_slice().iter().all(|&x| x == 1.0));

        let c = LaneBuffer::new(vec![2.0; 16]).unwrap();
        a.zip_apply(&c, |x, y| x + y).unwrap();
        assert!(a.as_slice().iter().all(|&x| x == 3.0));
    }
}
