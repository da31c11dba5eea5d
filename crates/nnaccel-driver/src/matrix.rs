//! Dense row-major matrices and their raw on-disk layout
//!
//! ## Persisted layout
//!
//! ```text
//! [row 0: cols × f32 LE][row 1: cols × f32 LE] ... [row rows-1]
//! ```
//!
//! No header. The reader must supply `rows` and `cols`; a blob whose size
//! disagrees with them is rejected.

use crate::error::{AccelError, Result};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fs;
use std::path::Path;
use tracing::debug;

const F32_BYTES: usize = std::mem::size_of::<f32>();

/// Dense f32 matrix, row-major
///
/// Dimensions need not be multiples of 16; block partitioning zero-pads
/// the trailing edge blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Matrix {
    /// Build from a flat row-major array
    ///
    /// # Errors
    ///
    /// Returns `InvalidShape` if either dimension is zero or
    /// `data.len() != rows × cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self> {
        check_dims(rows, cols)?;
        if data.len() != rows * cols {
            return Err(AccelError::invalid_shape(format!(
                "{} values cannot fill a {rows}×{cols} matrix",
                data.len()
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Build from a flat row-major slice
    ///
    /// # Errors
    ///
    /// Same as [`Matrix::from_vec`].
    pub fn from_slice(rows: usize, cols: usize, data: &[f32]) -> Result<Self> {
        Self::from_vec(rows, cols, data.to_vec())
    }

    /// Build from nested rows
    ///
    /// # Errors
    ///
    /// Returns `InvalidShape` if there are no rows, the rows are empty, or
    /// the rows are ragged.
    pub fn from_rows<R: AsRef<[f32]>>(rows: &[R]) -> Result<Self> {
        let cols = rows.first().map_or(0, |r| r.as_ref().len());
        check_dims(rows.len(), cols)?;
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(AccelError::invalid_shape(format!(
                    "row {i} has {} columns, expected {cols}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    /// Zero matrix
    ///
    /// # Errors
    ///
    /// Returns `InvalidShape` if either dimension is zero.
    pub fn zeros(rows: usize, cols: usize) -> Result<Self> {
        check_dims(rows, cols)?;
        Ok(Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        })
    }

    /// `n × n` identity
    ///
    /// # Errors
    ///
    /// Returns `InvalidShape` if `n` is zero.
    pub fn identity(n: usize) -> Result<Self> {
        let mut m = Self::zeros(n, n)?;
        for i in 0..n {
            m.data[i * n + i] = 1.0;
        }
        Ok(m)
    }

    /// Row count
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Column count
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Element at `(row, col)`
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        (row < self.rows && col < self.cols).then(|| self.data[row * self.cols + col])
    }

    /// Overwrite element at `(row, col)`
    ///
    /// # Errors
    ///
    /// Returns `InvalidShape` if the position is out of range.
    pub fn set(&mut self, row: usize, col: usize, value: f32) -> Result<()> {
        if row >= self.rows || col >= self.cols {
            return Err(AccelError::invalid_shape(format!(
                "({row}, {col}) outside {}×{}",
                self.rows, self.cols
            )));
        }
        self.data[row * self.cols + col] = value;
        Ok(())
    }

    /// Borrow one row
    pub fn row(&self, row: usize) -> Option<&[f32]> {
        (row < self.rows).then(|| &self.data[row * self.cols..(row + 1) * self.cols])
    }

    /// Borrow the flat row-major data
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Export the flat row-major data
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.clone()
    }

    /// Export as nested rows
    pub fn to_rows(&self) -> Vec<Vec<f32>> {
        self.data.chunks_exact(self.cols).map(<[f32]>::to_vec).collect()
    }

    /// New matrix with `f` applied to every element
    #[must_use]
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&x| f(x)).collect(),
        }
    }

    /// Straightforward row-by-row product, used as the reference the
    /// block-partitioned path is checked against
    ///
    /// # Errors
    ///
    /// Returns `InvalidShape` if `x.len() != cols`.
    pub fn dense_mul(&self, x: &[f32]) -> Result<Vec<f32>> {
        if x.len() != self.cols {
            return Err(AccelError::invalid_shape(format!(
                "vector length {} does not match {} columns",
                x.len(),
                self.cols
            )));
        }
        Ok(self
            .data
            .chunks_exact(self.cols)
            .map(|row| row.iter().zip(x).map(|(a, b)| a * b).sum())
            .collect())
    }

    /// Encode in the raw persisted layout
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.data.len() * F32_BYTES);
        for &v in &self.data {
            buf.put_f32_le(v);
        }
        buf.freeze()
    }

    /// Decode the raw persisted layout
    ///
    /// # Errors
    ///
    /// Returns `InvalidShape` for zero dimensions and `BlobSizeMismatch` if
    /// the byte count disagrees with `rows × cols`.
    pub fn from_bytes(rows: usize, cols: usize, mut bytes: Bytes) -> Result<Self> {
        check_dims(rows, cols)?;
        let expected = rows * cols * F32_BYTES;
        if bytes.len() != expected {
            return Err(AccelError::BlobSizeMismatch {
                path: "<memory>".into(),
                expected,
                actual: bytes.len(),
            });
        }
        let mut data = Vec::with_capacity(rows * cols);
        while bytes.has_remaining() {
            data.push(bytes.get_f32_le());
        }
        Ok(Self { rows, cols, data })
    }

    /// Write the raw layout to `path`
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be written.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_bytes())?;
        debug!("Saved {}×{} matrix to {}", self.rows, self.cols, path.display());
        Ok(())
    }

    /// Read the raw layout from `path`
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read and `BlobSizeMismatch` if
    /// its size disagrees with `rows × cols`.
    pub fn load_from(path: impl AsRef<Path>, rows: usize, cols: usize) -> Result<Self> {
        let path = path.as_ref();
        let bytes = Bytes::from(fs::read(path)?);
        let m = Self::from_bytes(rows, cols, bytes).map_err(|e| match e {
            AccelError::BlobSizeMismatch {
                expected, actual, ..
            } => AccelError::BlobSizeMismatch {
                path: path.to_path_buf(),
                expected,
                actual,
            },
            other => other,
        })?;
        debug!("Loaded {rows}×{cols} matrix from {}", path.display());
        Ok(m)
    }
}

fn check_dims(rows: usize, cols: usize) -> Result<()> {
    if rows == 0 || cols == 0 {
        Err(AccelError::invalid_shape(format!(
            "matrix dimensions must be non-zero, got {rows}×{cols}"
        )))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    #[test]
    fn shape_validation() {
        assert!(Matrix::from_vec(2, 3, vec![0.0; 6]).is_ok());
        assert_eq!(
            Matrix::from_vec(2, 3, vec![0.0; 5]).unwrap_err().kind(),
            ErrorKind::InvalidShape
        );
        assert!(Matrix::zeros(0, 4).is_err());
        assert!(Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]).is_err());
        let empty: [Vec<f32>; 0] = [];
        assert!(Matrix::from_rows(&empty).is_err());
    }

    #[test]
    fn nested_rows_round_trip() {
        let rows = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let m = Matrix::from_rows(&rows).unwrap();
        assert_eq!(m.shape(), (3, 2));
        assert_eq!(m.get(2, 1), Some(6.0));
        assert_eq!(m.row(1), Some(&[3.0, 4.0][..]));
        assert_eq!(m.to_rows(), rows);
    }

    #[test]
    fn dense_product() {
        let m = Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(m.dense_mul(&[1.0, 1.0]).unwrap(), vec![3.0, 7.0]);
        assert!(m.dense_mul(&[1.0]).is_err());
    }

    #[test]
    fn byte_layout_is_row_major_le() {
        let m = Matrix::from_vec(1, 2, vec![1.0, -2.0]).unwrap();
        let bytes = m.to_bytes();
        assert_eq!(&bytes[0..4], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[4..8], &(-2.0f32).to_le_bytes());
    }

    #[test]
    fn file_round_trip_and_size_check() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("w.f32");
        let m = Matrix::from_vec(2, 16, (0..32).map(|i| i as f32 * 0.5).collect()).unwrap();
        m.save_to(&path).unwrap();

        assert_eq!(Matrix::load_from(&path, 2, 16).unwrap(), m);
        // Same byte count, different shape: accepted by size, values reinterpreted.
        assert_eq!(Matrix::load_from(&path, 4, 8).unwrap().shape(), (4, 8));

        let err = Matrix::load_from(&path, 3, 16).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.to_string().contains("w.f32"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = Matrix::load_from(dir.path().join("nope.f32"), 1, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
