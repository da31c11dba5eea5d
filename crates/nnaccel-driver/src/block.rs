// SPDX-License-Identifier: AGPL-3.0-only

//! 16×16 block partitioning for matrix-vector products
//!
//! A matrix is cut into `⌈rows/16⌉ × ⌈cols/16⌉` blocks stored in row-major
//! block order. Edge blocks of a non-aligned matrix are stored zero-padded
//! to a full 16×16 tile with their used extent recorded; padded lanes add
//! zero to every accumulation and are never written to the result.
//!
//! ```text
//! y[block-row r] = Σ_c  B[r][c] · x[block-col c]
//! ```

use crate::error::{AccelError, Result};
use crate::matrix::Matrix;
use nnaccel_chip::lanes::{block_extent, blocks_along, BLOCK_DIM, BLOCK_ELEMS};

/// Position of a block in the partition grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockIndex {
    /// Block row
    pub row: usize,
    /// Block column
    pub col: usize,
}

impl BlockIndex {
    /// Create a block index
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// One zero-padded 16×16 tile
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixBlock {
    data: Box<[f32; BLOCK_ELEMS]>,
    rows_used: usize,
    cols_used: usize,
}

impl MatrixBlock {
    fn cut(matrix: &Matrix, index: BlockIndex) -> Self {
        let rows_used = block_extent(matrix.rows(), index.row);
        let cols_used = block_extent(matrix.cols(), index.col);
        let mut data = Box::new([0.0f32; BLOCK_ELEMS]);
        let col0 = index.col * BLOCK_DIM;
        for r in 0..rows_used {
            if let Some(src) = matrix.row(index.row * BLOCK_DIM + r) {
                data[r * BLOCK_DIM..r * BLOCK_DIM + cols_used]
                    .copy_from_slice(&src[col0..col0 + cols_used]);
            }
        }
        Self {
            data,
            rows_used,
            cols_used,
        }
    }

    /// Rows of real data (≤ 16)
    pub fn rows_used(&self) -> usize {
        self.rows_used
    }

    /// Columns of real data (≤ 16)
    pub fn cols_used(&self) -> usize {
        self.cols_used
    }

    /// True if the block is a full 16×16 tile
    pub fn is_full(&self) -> bool {
        self.rows_used == BLOCK_DIM && self.cols_used == BLOCK_DIM
    }

    /// Element at local `(row, col)`; padding reads as zero
    pub fn get(&self, row: usize, col: usize) -> f32 {
        if row < BLOCK_DIM && col < BLOCK_DIM {
            self.data[row * BLOCK_DIM + col]
        } else {
            0.0
        }
    }

    /// `acc += self · segment` over the full padded tile
    #[inline]
    fn accumulate(&self, segment: &[f32; BLOCK_DIM], acc: &mut [f32; BLOCK_DIM]) {
        for (row, out) in self.data.chunks_exact(BLOCK_DIM).zip(acc.iter_mut()) {
            *out += row.iter().zip(segment).map(|(a, b)| a * b).sum::<f32>();
        }
    }
}

/// A matrix cut into blocks, owning a copy of the source values
#[derive(Debug, Clone, PartialEq)]
pub struct BlockPartition {
    rows: usize,
    cols: usize,
    row_blocks: usize,
    col_blocks: usize,
    blocks: Vec<MatrixBlock>,
}

impl BlockPartition {
    /// Partition `matrix` into 16×16 blocks (copying its values)
    pub fn new(matrix: &Matrix) -> Self {
        let row_blocks = blocks_along(matrix.rows());
        let col_blocks = blocks_along(matrix.cols());
        let mut blocks = Vec::with_capacity(row_blocks * col_blocks);
        for r in 0..row_blocks {
            for c in 0..col_blocks {
                blocks.push(MatrixBlock::cut(matrix, BlockIndex::new(r, c)));
            }
        }
        Self {
            rows: matrix.rows(),
            cols: matrix.cols(),
            row_blocks,
            col_blocks,
            blocks,
        }
    }

    /// Source row count
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Source column count
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(block rows, block cols)`
    pub fn grid(&self) -> (usize, usize) {
        (self.row_blocks, self.col_blocks)
    }

    /// Total number of blocks
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Block at `index`
    pub fn block(&self, index: BlockIndex) -> Option<&MatrixBlock> {
        if index.row < self.row_blocks && index.col < self.col_blocks {
            self.blocks.get(index.row * self.col_blocks + index.col)
        } else {
            None
        }
    }

    /// `matrix · x`, accumulated block by block
    ///
    /// # Errors
    ///
    /// Returns `InvalidShape` if `x.len() != cols`.
    pub fn multiply(&self, x: &[f32]) -> Result<Vec<f32>> {
        if x.len() != self.cols {
            return Err(AccelError::invalid_shape(format!(
                "vector length {} does not match {} columns",
                x.len(),
                self.cols
            )));
        }

        let mut y = vec![0.0f32; self.rows];
        let mut segment = [0.0f32; BLOCK_DIM];
        for (br, block_row) in self.blocks.chunks_exact(self.col_blocks).enumerate() {
            let mut acc = [0.0f32; BLOCK_DIM];
            for (bc, block) in block_row.iter().enumerate() {
                let start = bc * BLOCK_DIM;
                let used = block.cols_used;
                segment[..used].copy_from_slice(&x[start..start + used]);
                segment[used..].fill(0.0);
                block.accumulate(&segment, &mut acc);
            }
            let start = br * BLOCK_DIM;
            let used = block_extent(self.rows, br);
            y[start..start + used].copy_from_slice(&acc[..used]);
        }
        Ok(y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(rows: usize, cols: usize) -> Matrix {
        let data = (0..rows * cols).map(|i| (i % 7) as f32 - 3.0).collect();
        Matrix::from_vec(rows, cols, data).unwrap()
    }

    #[test]
    fn aligned_grid() {
        let p = BlockPartition::new(&ramp(32, 48));
        assert_eq!(p.grid(), (2, 3));
        assert_eq!(p.block_count(), 6);
        assert!(p.block(BlockIndex::new(1, 2)).unwrap().is_full());
        assert!(p.block(BlockIndex::new(2, 0)).is_none());
    }

    #[test]
    fn partial_edge_blocks_are_padded() {
        let m = ramp(20, 18);
        let p = BlockPartition::new(&m);
        assert_eq!(p.grid(), (2, 2));
        let corner = p.block(BlockIndex::new(1, 1)).unwrap();
        assert_eq!(corner.rows_used(), 4);
        assert_eq!(corner.cols_used(), 2);
        assert_eq!(corner.get(0, 0), m.get(16, 16).unwrap());
        assert_eq!(corner.get(3, 1), m.get(19, 17).unwrap());
        assert_eq!(corner.get(4, 0), 0.0);
        assert_eq!(corner.get(0, 2), 0.0);
    }

    #[test]
    fn block_order_is_row_major() {
        let m = ramp(32, 32);
        let p = BlockPartition::new(&m);
        let b = p.block(BlockIndex::new(0, 1)).unwrap();
        assert_eq!(b.get(0, 0), m.get(0, 16).unwrap());
        let b = p.block(BlockIndex::new(1, 0)).unwrap();
        assert_eq!(b.get(0, 0), m.get(16, 0).unwrap());
    }

    #[test]
    fn identity_times_ones() {
        let p = BlockPartition::new(&Matrix::identity(32).unwrap());
        let y = p.multiply(&[1.0; 32]).unwrap();
        assert_eq!(y, vec![1.0; 32]);
    }

    #[test]
    fn matches_dense_for_ragged_shape() {
        let m = ramp(37, 21);
        let x: Vec<f32> = (0..21).map(|i| 0.1 * i as f32).collect();
        let blocked = BlockPartition::new(&m).multiply(&x).unwrap();
        let dense = m.dense_mul(&x).unwrap();
        assert_eq!(blocked.len(), 37);
        for (a, b) in blocked.iter().zip(&dense) {
            assert!((a - b).abs() <= 1e-3 * b.abs().max(1.0), "{a} vs {b}");
        }
    }

    #[test]
    fn wrong_vector_length() {
        let p = BlockPartition::new(&ramp(16, 16));
        assert!(p.multiply(&[0.0; 15]).is_err());
    }
}
