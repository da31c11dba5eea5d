//! Compute-unit pool geometry.
//!
//! The fabric exposes a fixed pool of independently addressable unit
//! slots. Each slot holds one lane-aligned buffer at a time.

/// Number of compute units in the pool. Valid ids are `0..UNIT_COUNT`.
pub const UNIT_COUNT: usize = 256;

/// True when `id` addresses a unit that exists.
#[must_use]
pub const fn is_valid_unit(id: usize) -> bool {
    id < UNIT_COUNT
}
