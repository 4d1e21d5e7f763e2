//! The fixed city catalog a collection job works through.
//!
//! The catalog is loaded once at process start and never changes afterwards;
//! every collection job computes its remaining work as the set difference
//! between this catalog and the cities already persisted for the user.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Identifier of a single city, as used by the remote weather service.
///
/// The id is opaque to this crate; it is only ever compared, ordered by its
/// position in the catalog, and passed through to the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CityId(pub u32);

impl fmt::Display for CityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read city catalog '{0}'")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse city catalog '{0}'")]
    Parse(PathBuf, #[source] serde_json::Error),

    #[error("City catalog '{0}' contains no cities")]
    Empty(PathBuf),
}

/// The ordered set of cities to collect, fixed for the process lifetime.
///
/// Construction de-duplicates ids while preserving first-occurrence order, so
/// iteration order is stable and every id appears exactly once.
#[derive(Debug, Clone)]
pub struct CityCatalog {
    ids: Vec<CityId>,
    index: HashSet<CityId>,
}

impl CityCatalog {
    /// Builds a catalog from an explicit list of ids.
    ///
    /// Duplicate ids are dropped, keeping the first occurrence.
    pub fn from_ids<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = CityId>,
    {
        let mut ordered = Vec::new();
        let mut index = HashSet::new();
        for id in ids {
            if index.insert(id) {
                ordered.push(id);
            }
        }
        Self {
            ids: ordered,
            index,
        }
    }

    /// Loads a catalog from a JSON file containing an array of integer city ids,
    /// e.g. `[2643743, 2950159, 5128581]`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] if the file cannot be read,
    /// [`CatalogError::Parse`] if it is not a JSON array of integers, and
    /// [`CatalogError::Empty`] if the array holds no ids.
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = fs::read(path)
            .await
            .map_err(|e| CatalogError::Io(path.to_path_buf(), e))?;
        let ids: Vec<CityId> = serde_json::from_slice(&raw)
            .map_err(|e| CatalogError::Parse(path.to_path_buf(), e))?;
        if ids.is_empty() {
            return Err(CatalogError::Empty(path.to_path_buf()));
        }
        Ok(Self::from_ids(ids))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: CityId) -> bool {
        self.index.contains(&id)
    }

    /// Iterates over the catalog in its fixed order.
    pub fn ids(&self) -> impl Iterator<Item = CityId> + '_ {
        self.ids.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn from_ids_deduplicates_preserving_order() {
        let catalog =
            CityCatalog::from_ids([CityId(300), CityId(100), CityId(300), CityId(200)]);
        let ids: Vec<CityId> = catalog.ids().collect();
        assert_eq!(ids, [CityId(300), CityId(100), CityId(200)]);
        assert_eq!(catalog.len(), 3);
        assert!(catalog.contains(CityId(100)));
        assert!(!catalog.contains(CityId(999)));
    }

    #[tokio::test]
    async fn loads_catalog_from_json_file() -> Result<(), CatalogError> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[2643743, 2950159, 5128581]").unwrap();

        let catalog = CityCatalog::from_json_file(file.path()).await?;
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.ids().next(), Some(CityId(2643743)));
        Ok(())
    }

    #[tokio::test]
    async fn rejects_empty_catalog_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[]").unwrap();

        let err = CityCatalog::from_json_file(file.path()).await.unwrap_err();
        assert!(matches!(err, CatalogError::Empty(_)));
    }

    #[tokio::test]
    async fn rejects_malformed_catalog_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\"cities\": 1}}").unwrap();

        let err = CityCatalog::from_json_file(file.path()).await.unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_, _)));
    }

    #[tokio::test]
    async fn missing_catalog_file_is_an_io_error() {
        let err = CityCatalog::from_json_file("/definitely/not/here.json")
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Io(_, _)));
    }
}
