//! Named matrix persistence
//!
//! A [`MatrixStore`] is a directory of raw blobs, one per name:
//!
//! ```text
//! <root>/
//!   weights.f32      rows × cols little-endian f32, row-major, no header
//!   bias.f32
//! ```
//!
//! Shape is not recorded; `load` takes it from the caller and checks it
//! against the blob size.

use crate::config::AcceleratorConfig;
use crate::error::Result;
use crate::matrix::Matrix;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File extension of persisted blobs
pub const BLOB_EXTENSION: &str = "f32";

/// Directory-backed matrix store
#[derive(Debug, Clone)]
pub struct MatrixStore {
    root: PathBuf,
}

impl MatrixStore {
    /// Open (creating if needed) a store rooted at `root`
    ///
    /// # Errors
    ///
    /// Returns `Io` if the directory cannot be created.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        info!("Matrix store: {}", root.display());
        Ok(Self { root })
    }

    /// Open the store named by `config.store_dir`
    ///
    /// # Errors
    ///
    /// Returns `Io` if the directory cannot be created.
    pub fn from_config(config: &AcceleratorConfig) -> Result<Self> {
        Self::new(&config.store_dir)
    }

    /// Store directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the blob for `name`
    ///
    /// # Errors
    ///
    /// Returns `Io` (`InvalidInput`) for names that would escape the store.
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(format!("{name}.{BLOB_EXTENSION}")))
    }

    /// Persist `matrix` under `name`, replacing any previous blob
    ///
    /// # Errors
    ///
    /// Returns `Io` for an invalid name or a failed write.
    pub fn save(&self, name: &str, matrix: &Matrix) -> Result<PathBuf> {
        let path = self.path_for(name)?;
        matrix.save_to(&path)?;
        info!(
            "Saved '{name}' ({}×{}) to {}",
            matrix.rows(),
            matrix.cols(),
            path.display()
        );
        Ok(path)
    }

    /// Restore the blob stored under `name` as a `rows × cols` matrix
    ///
    /// # Errors
    ///
    /// Returns `Io` if the blob is missing or unreadable, `BlobSizeMismatch`
    /// if its size disagrees with the requested shape, and `InvalidShape`
    /// for zero dimensions.
    pub fn load(&self, name: &str, rows: usize, cols: usize) -> Result<Matrix> {
        let path = self.path_for(name)?;
        Matrix::load_from(&path, rows, cols)
    }

    /// True if a blob exists under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.path_for(name).is_ok_and(|p| p.is_file())
    }

    /// Names of all stored blobs, sorted
    ///
    /// # Errors
    ///
    /// Returns `Io` if the directory cannot be read.
    pub fn list(&self) -> Result<Vec<String>> {
        debug!("Scanning matrix store...");
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(BLOB_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Delete the blob stored under `name`; false if there was none
    ///
    /// # Errors
    ///
    /// Returns `Io` for an invalid name or a failed delete.
    pub fn remove(&self, name: &str) -> Result<bool> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                info!("Removed '{name}' from matrix store");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

fn validate_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name.contains("..")
        || name.contains(['/', '\\'])
        || name.contains('\0');
    if bad {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid matrix name '{name}'"),
        )
        .into());
    }
    Ok(())
}
