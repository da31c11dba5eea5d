//! Numeric formats accepted by the compute units.
//!
//! ## 1s.31 fixed point
//!
//! One sign bit, 31 fractional bits, stored in an `i32`. The representable
//! range is `[-1.0, 1.0 - 2^-31]`; conversion saturates at the ends.
//!
//! ## Ternary
//!
//! Values in {-1, 0, +1}. Packed storage uses 2-bit codes, four per byte,
//! low bits first:
//!
//! ```text
//!  0 -> 0b00
//! +1 -> 0b01
//! -1 -> 0b11
//! 0b10 is unused and decodes as 0
//! ```

/// Fractional bits of the 1s.31 format.
pub const FIXED_1S31_FRACTIONAL_BITS: u32 = 31;

/// Scale factor of the 1s.31 format (`2^31`).
#[allow(clippy::cast_precision_loss)]
pub const FIXED_1S31_SCALE: f64 = (1u64 << FIXED_1S31_FRACTIONAL_BITS) as f64;

/// Largest raw 1s.31 value (`2^31 - 1`, i.e. `1.0 - 2^-31`).
pub const FIXED_1S31_RAW_MAX: i32 = i32::MAX;

/// Smallest raw 1s.31 value (`-2^31`, i.e. `-1.0`).
pub const FIXED_1S31_RAW_MIN: i32 = i32::MIN;

/// Default magnitude below which a value quantizes to ternary 0.
///
/// Must stay inside (0, 1) so that -1, 0 and +1 map to themselves.
pub const TERNARY_THRESHOLD: f32 = 0.5;

/// Packed 2-bit ternary codes.
pub mod trit {
    /// Code for 0.
    pub const ZERO: u8 = 0b00;
    /// Code for +1.
    pub const POS: u8 = 0b01;
    /// Code for -1.
    pub const NEG: u8 = 0b11;
    /// Trits per packed byte.
    pub const PER_BYTE: usize = 4;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_scale_is_two_pow_31() {
        assert!((FIXED_1S31_SCALE - 2_147_483_648.0).abs() < f64::EPSILON);
        assert_eq!(FIXED_1S31_RAW_MAX, 2_147_483_647);
        assert_eq!(FIXED_1S31_RAW_MIN, -2_147_483_648);
    }

    #[test]
    fn ternary_threshold_keeps_trits_fixed() {
        assert!(TERNARY_THRESHOLD > 0.0 && TERNARY_THRESHOLD < 1.0);
    }

    #[test]
    fn trit_codes_distinct() {
        assert_ne!(trit::ZERO, trit::POS);
        assert_ne!(trit::POS, trit::NEG);
        assert_eq!(trit::NEG & 1, 1, "non-zero flag in low bit");
        assert_eq!(trit::POS >> 1, 0, "sign flag clear for +1");
    }
}
