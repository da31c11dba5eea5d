//! Lane width and block geometry.
//!
//! Every buffer the fabric moves is a whole number of 16-element lanes.
//! Matrices are tiled into 16×16 blocks; edge blocks may be partial.

/// Parallel lane width of the fabric (elements per lane).
pub const LANE_WIDTH: usize = 16;

/// Edge length of a square matrix block.
pub const BLOCK_DIM: usize = 16;

/// Elements in one full block (`BLOCK_DIM²`).
pub const BLOCK_ELEMS: usize = BLOCK_DIM * BLOCK_DIM;

/// True when `len` is a non-zero multiple of [`LANE_WIDTH`].
#[must_use]
pub const fn is_lane_aligned(len: usize) -> bool {
    len != 0 && len % LANE_WIDTH == 0
}

/// Number of lanes occupied by an aligned buffer of `len` elements.
#[must_use]
pub const fn lanes_in(len: usize) -> usize {
    len / LANE_WIDTH
}

/// Number of blocks needed to cover `dim` elements along one axis
/// (partial trailing block included).
#[must_use]
pub const fn blocks_along(dim: usize) -> usize {
    dim.div_ceil(BLOCK_DIM)
}

/// Used extent of block `index` along an axis of length `dim`.
///
/// Full blocks report [`BLOCK_DIM`]; the trailing block of a non-aligned
/// axis reports the remainder. Out-of-range indices report 0.
#[must_use]
pub const fn block_extent(dim: usize, index: usize) -> usize {
    let start = index * BLOCK_DIM;
    if start >= dim {
        0
    } else if dim - start >= BLOCK_DIM {
        BLOCK_DIM
    } else {
        dim - start
    }
}
