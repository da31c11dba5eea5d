//! Simulated fixed-width vector/matrix accelerator.
//!
//! A pool of 256 compute units, each holding one lane-aligned f32 buffer,
//! plus a block-partitioned matrix-vector engine, a numeric-format
//! quantizer and a raw on-disk matrix store. Everything runs on the host;
//! lane geometry and unit count come from `nnaccel-chip`.
//!
//! # Layout
//!
//! ```text
//! Accelerator
//!   ├── UnitPool      256 × Mutex<ComputeUnit>   bind / execute / read
//!   ├── MatrixCache   RwLock<id → BlockPartition> prepare / compute / release
//!   └── Quantizer     full | trinary | fixed_point_1s31
//! MatrixStore         <dir>/<name>.f32            save / load / list
//! ```
//!
//! # Quick start
//!
//! ```
//! use nnaccel_driver::prelude::*;
//!
//! # fn main() -> nnaccel_driver::Result<()> {
//! let acc = Accelerator::new();
//!
//! let mut v = Vector::from_slice(&[-1.0; 16])?;
//! acc.bind_to_unit(&mut v, 0)?;
//! acc.execute(UnitOp::RELU, 0, 1)?;
//! assert_eq!(acc.read_unit(1)?.as_slice(), &[0.0; 16]);
//!
//! let m = Matrix::identity(20)?;
//! let x = Vector::from_slice(&[2.0; 32])?;
//! assert!(acc.compute_matrix_vector_multiply(&m, &x).is_err());
//!
//! let handle = acc.prepare(&Matrix::identity(32)?);
//! assert_eq!(acc.compute_with_prepared(handle, &x)?, vec![2.0; 32]);
//! # Ok(())
//! # }
//! ```
//!
//! # Lengths
//!
//! | Object | Constraint |
//! |--------|------------|
//! | `Vector` / `LaneBuffer` | non-zero multiple of 16 |
//! | `Matrix` | any non-zero rows × cols; edge blocks are zero-padded |

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![deny(unsafe_code)]

mod accelerator;
pub mod block;
mod buffer;
pub mod cache;
pub mod config;
mod error;
mod matrix;
pub mod ops;
pub mod quantize;
mod stats;
pub mod store;
mod unit;
mod vector;

/// Lane and unit geometry (re-exported from nnaccel-chip).
pub mod geometry {
    pub use nnaccel_chip::formats::TERNARY_THRESHOLD;
    pub use nnaccel_chip::lanes::{BLOCK_DIM, BLOCK_ELEMS, LANE_WIDTH};
    pub use nnaccel_chip::units::UNIT_COUNT;
}

pub use accelerator::{Accelerator, AcceleratorStatus};
pub use block::{BlockIndex, BlockPartition, MatrixBlock};
pub use buffer::LaneBuffer;
pub use cache::{MatrixCache, PreparedMatrix};
pub use config::AcceleratorConfig;
pub use error::{AccelError, ErrorKind, Result};
pub use matrix::Matrix;
pub use ops::{Activation, UnitOp, VectorOp};
pub use quantize::{ConversionKind, QuantizedData, Quantizer};
pub use stats::OperationStats;
pub use store::MatrixStore;
pub use unit::{ComputeUnit, UnitId};
pub use vector::Vector;

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        AccelError, Accelerator, AcceleratorConfig, Activation, ConversionKind, ErrorKind,
        LaneBuffer, Matrix, MatrixStore, PreparedMatrix, Quantizer, Result, UnitId, UnitOp,
        Vector, VectorOp,
    };
}
