//! Silicon model for the simulated lane accelerator.
//!
//! This crate has **no dependencies** and **no hardware access**. It is a
//! pure model of the fabric the driver simulates: lane width, matrix block
//! geometry, the compute-unit pool and the numeric formats the units accept.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`lanes`] | Lane width (16) and 16×16 block geometry helpers |
//! | [`units`] | Compute-unit pool size (256) and id range checks |
//! | [`formats`] | 1s.31 fixed-point geometry, ternary codes and threshold |

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod formats;
pub mod lanes;
pub mod units;
