//! Accelerator configuration
//!
//! Defaults suit the simulator; two environment variables override them:
//!
//! - `NNACCEL_STORE_DIR`: directory holding persisted matrices
//! - `NNACCEL_TERNARY_THRESHOLD`: magnitude below which ternary conversion yields 0

use crate::error::{AccelError, Result};
use nnaccel_chip::formats::TERNARY_THRESHOLD;
use std::path::{Path, PathBuf};

/// Environment variable overriding [`AcceleratorConfig::store_dir`]
pub const ENV_STORE_DIR: &str = "NNACCEL_STORE_DIR";

/// Environment variable overriding [`AcceleratorConfig::ternary_threshold`]
pub const ENV_TERNARY_THRESHOLD: &str = "NNACCEL_TERNARY_THRESHOLD";

/// Default matrix store directory, relative to the working directory
pub const DEFAULT_STORE_DIR: &str = "matrices";

/// Accelerator configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AcceleratorConfig {
    /// Ternary conversion threshold, in `(0, 1)`
    pub ternary_threshold: f32,
    /// Directory for `save`/`load`
    pub store_dir: PathBuf,
}

impl Default for AcceleratorConfig {
    fn default() -> Self {
        Self {
            ternary_threshold: TERNARY_THRESHOLD,
            store_dir: PathBuf::from(DEFAULT_STORE_DIR),
        }
    }
}

impl AcceleratorConfig {
    /// Set the ternary threshold
    #[must_use]
    pub fn with_ternary_threshold(mut self, threshold: f32) -> Self {
        self.ternary_threshold = threshold;
        self
    }

    /// Set the matrix store directory
    #[must_use]
    pub fn with_store_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.store_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Defaults overridden by `NNACCEL_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if an override fails to parse or validate.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(dir) = std::env::var_os(ENV_STORE_DIR) {
            tracing::debug!("{ENV_STORE_DIR} override: {}", Path::new(&dir).display());
            config.store_dir = PathBuf::from(dir);
        }

        if let Ok(raw) = std::env::var(ENV_TERNARY_THRESHOLD) {
            config.ternary_threshold = raw.trim().parse().map_err(|e| {
                AccelError::invalid_config(format!("{ENV_TERNARY_THRESHOLD}={raw}: {e}"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for a threshold outside `(0, 1)` or an empty
    /// store directory.
    pub fn validate(&self) -> Result<()> {
        let t = self.ternary_threshold;
        if !(t > 0.0 && t < 1.0) {
            return Err(AccelError::invalid_config(format!(
                "ternary threshold {t} must lie in (0, 1)"
            )));
        }
        if self.store_dir.as_os_str().is_empty() {
            return Err(AccelError::invalid_config("store directory is empty"));
        }
        Ok(())
    }
}
