use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::store::StoreError;
use thiserror::Error;

/// Errors surfaced by the [`crate::Skyharvest`] entry points. Faults inside a
/// running job stay within [`crate::CollectError`]; the job task logs them
/// rather than returning them here.
#[derive(Debug, Error)]
pub enum SkyharvestError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("No collection state found for user '{0}'")]
    UserNotFound(String),
}
