use std::path::{Path, PathBuf};
use anyhow::{Result, Context};
use log::{info, debug};

use crate::utils::file_utils;
use super::types::CourseCatalog;

/// A scraped catalog kept on disk as JSON
#[derive(Debug)]
pub struct CatalogStorage {
    /// Path to the catalog file
    path: PathBuf,
}

impl CatalogStorage {
    /// Create a new catalog storage with the given path
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Load the catalog from disk
    pub fn load(&self) -> Result<CourseCatalog> {
        let path = &self.path;
        debug!("Loading catalog from {}", path.display());

        let content = file_utils::read_file_to_string(path)
            .with_context(|| format!("Failed to read catalog file {}", path.display()))?;

        let catalog: CourseCatalog = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse catalog file {}", path.display()))?;

        info!("Loaded catalog with {} courses for {}", catalog.courses.len(), catalog.semester);
        Ok(catalog)
    }

    /// Save the catalog to disk
    pub fn save(&self, catalog: &CourseCatalog) -> Result<()> {
        let content = serde_json::to_string_pretty(catalog)
            .context("Failed to serialize catalog")?;

        file_utils::write_string_to_file(&self.path, &content)?;

        info!("Saved catalog with {} courses to {}", catalog.courses.len(), self.path.display());
        Ok(())
    }

    /// Check if the catalog file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Get the path to the catalog file
    pub fn path(&self) -> &Path {
        &self.path
    }
}
