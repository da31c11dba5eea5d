// SPDX-License-Identifier: AGPL-3.0-only

//! Numeric-format conversion
//!
//! Three formats, chosen with [`ConversionKind`]:
//!
//! | Kind | Encoded as | Read back as |
//! |------|------------|--------------|
//! | `full` | f32 | identical f32 |
//! | `trinary` | packed 2-bit trits | -1.0, 0.0 or 1.0 |
//! | `fixed_point_1s31` | i32, scale 2^31, saturating | raw / 2^31 |
//!
//! Conversion is element-wise; matrices follow exactly the same rules per
//! entry. `convert` is `decode(encode(x))` and keeps the f32 storage type.

use crate::buffer::LaneBuffer;
use crate::error::{AccelError, Result};
use crate::matrix::Matrix;
use crate::vector::Vector;
use bytes::{BufMut, Bytes, BytesMut};
use nnaccel_chip::formats::{
    trit, FIXED_1S31_RAW_MAX, FIXED_1S31_RAW_MIN, FIXED_1S31_SCALE, TERNARY_THRESHOLD,
};
use std::fmt;
use std::str::FromStr;

/// Target format of a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionKind {
    /// Full-precision identity
    Full,
    /// Ternary {-1, 0, 1}
    Trinary,
    /// Signed 1s.31 fixed point
    FixedPoint1s31,
}

impl ConversionKind {
    /// Tag used in string form
    pub const fn name(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Trinary => "trinary",
            Self::FixedPoint1s31 => "fixed_point_1s31",
        }
    }
}

impl FromStr for ConversionKind {
    type Err = AccelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "trinary" | "ternary" => Ok(Self::Trinary),
            "fixed_point_1s31" | "1s31" => Ok(Self::FixedPoint1s31),
            _ => Err(AccelError::unsupported_conversion(s)),
        }
    }
}

impl fmt::Display for ConversionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Encoded values in their storage format
#[derive(Debug, Clone, PartialEq)]
pub enum QuantizedData {
    /// Unchanged f32 values
    Full(Vec<f32>),
    /// 2-bit trits, four per byte, low bits first
    Trinary {
        /// Packed codes
        packed: Bytes,
        /// Number of trits
        len: usize,
    },
    /// Raw 1s.31 words
    FixedPoint1s31(Vec<i32>),
}

impl QuantizedData {
    /// Format of the payload
    pub fn kind(&self) -> ConversionKind {
        match self {
            Self::Full(_) => ConversionKind::Full,
            Self::Trinary { .. } => ConversionKind::Trinary,
            Self::FixedPoint1s31(_) => ConversionKind::FixedPoint1s31,
        }
    }

    /// Number of encoded values
    pub fn len(&self) -> usize {
        match self {
            Self::Full(v) => v.len(),
            Self::Trinary { len, .. } => *len,
            Self::FixedPoint1s31(v) => v.len(),
        }
    }

    /// True if nothing is encoded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Payload size in bytes
    pub fn storage_bytes(&self) -> usize {
        match self {
            Self::Full(v) => v.len() * std::mem::size_of::<f32>(),
            Self::Trinary { packed, .. } => packed.len(),
            Self::FixedPoint1s31(v) => v.len() * std::mem::size_of::<i32>(),
        }
    }

    /// Read back as f32 (lossless only for `Full`)
    pub fn decode(&self) -> Vec<f32> {
        match self {
            Self::Full(v) => v.clone(),
            Self::Trinary { packed, len } => unpack_trits(packed, *len)
                .into_iter()
                .map(f32::from)
                .collect(),
            Self::FixedPoint1s31(v) => v.iter().map(|&raw| from_fixed_1s31(raw)).collect(),
        }
    }
}

/// Converts buffers and matrices between formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantizer {
    ternary_threshold: f32,
}

impl Default for Quantizer {
    fn default() -> Self {
        Self {
            ternary_threshold: TERNARY_THRESHOLD,
        }
    }
}

impl Quantizer {
    /// Quantizer with a custom ternary threshold
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` unless `0 < threshold < 1`.
    pub fn new(ternary_threshold: f32) -> Result<Self> {
        if ternary_threshold > 0.0 && ternary_threshold < 1.0 {
            Ok(Self { ternary_threshold })
        } else {
            Err(AccelError::invalid_config(format!(
                "ternary threshold {ternary_threshold} must lie in (0, 1)"
            )))
        }
    }

    /// Magnitude below which values become 0
    pub fn ternary_threshold(&self) -> f32 {
        self.ternary_threshold
    }

    /// Convert one value (encode then read back)
    #[inline]
    pub fn convert_value(&self, x: f32, kind: ConversionKind) -> f32 {
        match kind {
            ConversionKind::Full => x,
            ConversionKind::Trinary => f32::from(trinarize(x, self.ternary_threshold)),
            ConversionKind::FixedPoint1s31 => from_fixed_1s31(to_fixed_1s31(x)),
        }
    }

    /// Encode into the storage format of `kind`
    pub fn encode(&self, values: &[f32], kind: ConversionKind) -> QuantizedData {
        match kind {
            ConversionKind::Full => QuantizedData::Full(values.to_vec()),
            ConversionKind::Trinary => {
                let trits: Vec<i8> = values
                    .iter()
                    .map(|&x| trinarize(x, self.ternary_threshold))
                    .collect();
                QuantizedData::Trinary {
                    packed: pack_trits(&trits),
                    len: trits.len(),
                }
            }
            ConversionKind::FixedPoint1s31 => {
                QuantizedData::FixedPoint1s31(values.iter().map(|&x| to_fixed_1s31(x)).collect())
            }
        }
    }

    /// Convert a buffer; the result has the same length
    pub fn convert_buffer(&self, buffer: &LaneBuffer, kind: ConversionKind) -> LaneBuffer {
        buffer.map(|x| self.convert_value(x, kind))
    }

    /// Convert a vector; the result is unbound
    pub fn convert_vector(&self, vector: &Vector, kind: ConversionKind) -> Vector {
        Vector::from_buffer(self.convert_buffer(vector.buffer(), kind))
    }

    /// Convert every matrix entry independently
    pub fn convert_matrix(&self, matrix: &Matrix, kind: ConversionKind) -> Matrix {
        matrix.map(|x| self.convert_value(x, kind))
    }
}

/// Map to {-1, 0, 1}: `|x| < threshold` → 0, otherwise `sign(x)`. NaN → 0.
#[inline]
pub fn trinarize(x: f32, threshold: f32) -> i8 {
    if x.is_nan() || x.abs() < threshold {
        0
    } else if x > 0.0 {
        1
    } else {
        -1
    }
}

/// Scale by 2^31, round to nearest, saturate to the i32 range. NaN → 0.
#[inline]
#[allow(clippy::cast_possible_truncation)]
pub fn to_fixed_1s31(x: f32) -> i32 {
    if x.is_nan() {
        return 0;
    }
    let scaled = (f64::from(x) * FIXED_1S31_SCALE).round();
    scaled.clamp(f64::from(FIXED_1S31_RAW_MIN), f64::from(FIXED_1S31_RAW_MAX)) as i32
}

/// Inverse of [`to_fixed_1s31`]: divide by 2^31
#[inline]
#[allow(clippy::cast_possible_truncation)]
pub fn from_fixed_1s31(raw: i32) -> f32 {
    (f64::from(raw) / FIXED_1S31_SCALE) as f32
}

/// Pack trits into 2-bit codes, four per byte
pub fn pack_trits(trits: &[i8]) -> Bytes {
    let mut out = BytesMut::with_capacity(trits.len().div_ceil(trit::PER_BYTE));
    for chunk in trits.chunks(trit::PER_BYTE) {
        let mut byte = 0u8;
        for (i, &t) in chunk.iter().enumerate() {
            let code = match t {
                1 => trit::POS,
                -1 => trit::NEG,
                _ => trit::ZERO,
            };
            byte |= code << (2 * i);
        }
        out.put_u8(byte);
    }
    out.freeze()
}

/// Unpack `len` trits from 2-bit codes; the unused code 0b10 reads as 0
pub fn unpack_trits(packed: &[u8], len: usize) -> Vec<i8> {
    packed
        .iter()
        .flat_map(|&byte| (0..trit::PER_BYTE).map(move |i| (byte >> (2 * i)) & 0b11))
        .take(len)
        .map(|bits| {
            #[allow(clippy::cast_possible_wrap)]
            let nz = (bits & 1) as i8;
            #[allow(clippy::cast_possible_wrap)]
            let sg = ((bits >> 1) & 1) as i8;
            nz - 2 * (nz & sg)
        })
        .collect()
}
