//! Error types for accelerator operations

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for accelerator operations
pub type Result<T> = std::result::Result<T, AccelError>;

/// Errors that can occur during accelerator operations
///
/// Every failure is raised at the offending call, before any unit or
/// buffer state is touched.
#[derive(Debug, Error)]
pub enum AccelError {
    /// Length or dimension is not lane-aligned, or operand shapes disagree
    #[error("Invalid shape: {reason}")]
    InvalidShape {
        /// What was wrong with the shape
        reason: String,
    },

    /// Unit id outside the pool
    #[error("Unit id {id} out of range (pool has {count} units)")]
    InvalidUnitId {
        /// Requested id
        id: usize,
        /// Number of units in the pool
        count: usize,
    },

    /// Operation needs a binding or prepared handle that is absent
    #[error("Not bound: {what}")]
    NotBound {
        /// What was expected to be bound
        what: String,
    },

    /// Unit has never been written
    #[error("Unit {unit} is empty")]
    UnboundUnit {
        /// Empty unit id
        unit: usize,
    },

    /// Unknown quantization kind
    #[error("Unsupported conversion: {kind}")]
    UnsupportedConversion {
        /// Tag that was rejected
        kind: String,
    },

    /// Unknown operation tag
    #[error("Unsupported operation: {name}")]
    UnsupportedOperation {
        /// Tag that was rejected
        name: String,
    },

    /// Configuration value out of range
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Reason for rejection
        reason: String,
    },

    /// I/O error while persisting or restoring a matrix
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },

    /// Persisted blob does not match the requested dimensions
    #[error("Blob {path} holds {actual} bytes, expected {expected}")]
    BlobSizeMismatch {
        /// Blob location
        path: PathBuf,
        /// Byte count implied by rows × cols
        expected: usize,
        /// Byte count found on disk
        actual: usize,
    },
}

/// Coarse error category, one per failure class callers handle differently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`AccelError::InvalidShape`]
    InvalidShape,
    /// See [`AccelError::InvalidUnitId`]
    InvalidUnitId,
    /// See [`AccelError::NotBound`]
    NotBound,
    /// See [`AccelError::UnboundUnit`]
    UnboundUnit,
    /// See [`AccelError::UnsupportedConversion`]
    UnsupportedConversion,
    /// See [`AccelError::UnsupportedOperation`]
    UnsupportedOperation,
    /// See [`AccelError::InvalidConfig`]
    InvalidConfig,
    /// Persistence failures, including blob size mismatches
    Io,
}

impl AccelError {
    /// Create an invalid shape error
    pub fn invalid_shape(reason: impl Into<String>) -> Self {
        Self::InvalidShape {
            reason: reason.into(),
        }
    }

    /// Create a not bound error
    pub fn not_bound(what: impl Into<String>) -> Self {
        Self::NotBound { what: what.into() }
    }

    /// Create an unsupported conversion error
    pub fn unsupported_conversion(kind: impl Into<String>) -> Self {
        Self::UnsupportedConversion { kind: kind.into() }
    }

    /// Create an unsupported operation error
    pub fn unsupported_operation(name: impl Into<String>) -> Self {
        Self::UnsupportedOperation { name: name.into() }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidShape { .. } => ErrorKind::InvalidShape,
            Self::InvalidUnitId { .. } => ErrorKind::InvalidUnitId,
            Self::NotBound { .. } => ErrorKind::NotBound,
            Self::UnboundUnit { .. } => ErrorKind::UnboundUnit,
            Self::UnsupportedConversion { .. } => ErrorKind::UnsupportedConversion,
            Self::UnsupportedOperation { .. } => ErrorKind::UnsupportedOperation,
            Self::InvalidConfig { .. } => ErrorKind::InvalidConfig,
            Self::Io { .. } | Self::BlobSizeMismatch { .. } => ErrorKind::Io,
        }
    }

    /// True for runtime-state failures (missing binding or empty unit),
    /// false for argument validation failures
    pub fn is_state_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::NotBound | ErrorKind::UnboundUnit)
    }
}
