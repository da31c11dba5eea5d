//! Operation tags
//!
//! Callers that speak in strings (`"add"`, `"relu"`, ...) parse them into
//! these closed enums at the boundary; unknown tags fail there with
//! `UnsupportedOperation` and never reach the engine.

use crate::error::{AccelError, Result};
use std::fmt;
use std::str::FromStr;

/// Element-wise activation functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Activation {
    /// `max(x, 0)`
    Relu,
    /// Hyperbolic tangent
    Tanh,
    /// Logistic `1 / (1 + e^-x)`
    Sigmoid,
}

impl Activation {
    /// Apply to a single value
    #[inline]
    pub fn apply(self, x: f32) -> f32 {
        match self {
            Self::Relu => x.max(0.0),
            Self::Tanh => x.tanh(),
            Self::Sigmoid => 1.0 / (1.0 + (-x).exp()),
        }
    }

    /// Tag used in string form
    pub const fn name(self) -> &'static str {
        match self {
            Self::Relu => "relu",
            Self::Tanh => "tanh",
            Self::Sigmoid => "sigmoid",
        }
    }
}

/// Unit-to-unit operations issued through `Accelerator::execute`
///
/// Binary ops combine into the target: `target ← target ∘ source`.
/// Activations read the source and write the target: `target ← f(source)`,
/// so `execute(Relu, u, u)` activates unit `u` in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitOp {
    /// `target ← source`
    Copy,
    /// `target ← target + source`
    Add,
    /// `target ← target - source`
    Sub,
    /// `target ← target · source` (element-wise)
    Mul,
    /// `target ← f(source)`
    Activate(Activation),
}

impl UnitOp {
    /// Shorthand for `Activate(Relu)`
    pub const RELU: Self = Self::Activate(Activation::Relu);
    /// Shorthand for `Activate(Tanh)`
    pub const TANH: Self = Self::Activate(Activation::Tanh);
    /// Shorthand for `Activate(Sigmoid)`
    pub const SIGMOID: Self = Self::Activate(Activation::Sigmoid);

    /// True if the op reads the target's current contents
    pub const fn reads_target(self) -> bool {
        matches!(self, Self::Add | Self::Sub | Self::Mul)
    }

    /// Tag used in string form
    pub const fn name(self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Activate(a) => a.name(),
        }
    }
}

/// Direct operations on an unbound vector (`Accelerator::compute_vector`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VectorOp {
    /// `x + 1`
    Add,
    /// `x · 2`
    Mul,
    /// `x²`
    Square,
    /// Element-wise activation
    Activate(Activation),
}

impl VectorOp {
    /// Shorthand for `Activate(Relu)`
    pub const RELU: Self = Self::Activate(Activation::Relu);
    /// Shorthand for `Activate(Tanh)`
    pub const TANH: Self = Self::Activate(Activation::Tanh);
    /// Shorthand for `Activate(Sigmoid)`
    pub const SIGMOID: Self = Self::Activate(Activation::Sigmoid);

    /// Apply to a single value
    #[inline]
    pub fn apply(self, x: f32) -> f32 {
        match self {
            Self::Add => x + 1.0,
            Self::Mul => x * 2.0,
            Self::Square => x * x,
            Self::Activate(a) => a.apply(x),
        }
    }

    /// Tag used in string form
    pub const fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Mul => "mul",
            Self::Square => "square",
            Self::Activate(a) => a.name(),
        }
    }
}

impl FromStr for Activation {
    type Err = AccelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relu" => Ok(Self::Relu),
            "tanh" => Ok(Self::Tanh),
            "sigmoid" => Ok(Self::Sigmoid),
            _ => Err(AccelError::unsupported_operation(s)),
        }
    }
}

impl FromStr for UnitOp {
    type Err = AccelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "copy" => Ok(Self::Copy),
            "add" => Ok(Self::Add),
            "sub" => Ok(Self::Sub),
            "mul" => Ok(Self::Mul),
            _ => s.parse::<Activation>().map(Self::Activate),
        }
    }
}

impl FromStr for VectorOp {
    type Err = AccelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "add" => Ok(Self::Add),
            "mul" => Ok(Self::Mul),
            "square" => Ok(Self::Square),
            _ => s.parse::<Activation>().map(Self::Activate),
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for UnitOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for VectorOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn parse_unit_ops() {
        assert_eq!("copy".parse::<UnitOp>().unwrap(), UnitOp::Copy);
        assert_eq!("ADD".parse::<UnitOp>().unwrap(), UnitOp::Add);
        assert_eq!(" relu ".parse::<UnitOp>().unwrap(), UnitOp::RELU);
        assert_eq!("tanh".parse::<UnitOp>().unwrap(), UnitOp::TANH);
        let err = "square".parse::<UnitOp>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
    }

    #[test]
    fn parse_vector_ops() {
        assert_eq!("mul".parse::<VectorOp>().unwrap(), VectorOp::Mul);
        assert_eq!("sigmoid".parse::<VectorOp>().unwrap(), VectorOp::SIGMOID);
        assert!("copy".parse::<VectorOp>().is_err());
    }

    #[test]
    fn display_round_trips_tags() {
        for op in [UnitOp::Copy, UnitOp::Add, UnitOp::Sub, UnitOp::Mul, UnitOp::RELU, UnitOp::TANH] {
            assert_eq!(op.to_string().parse::<UnitOp>().unwrap(), op);
        }
    }

    #[test]
    fn vector_op_values() {
        assert_eq!(VectorOp::Add.apply(1.5), 2.5);
        assert_eq!(VectorOp::Mul.apply(-3.0), -6.0);
        assert_eq!(VectorOp::Square.apply(-3.0), 9.0);
        assert_eq!(VectorOp::RELU.apply(-0.1), 0.0);
        assert!((VectorOp::SIGMOID.apply(0.0) - 0.5).abs() < 1e-7);
    }

    #[test]
    fn only_binary_ops_read_target() {
        assert!(UnitOp::Add.reads_target());
        assert!(UnitOp::Mul.reads_target());
        assert!(!UnitOp::Copy.reads_target());
        assert!(!UnitOp::RELU.reads_target());
    }
}
