mod catalog;
mod collection;
mod config;
mod error;
mod fetch;
mod rate_limit;
mod skyharvest;
mod store;

pub use error::SkyharvestError;
pub use skyharvest::*;

pub use catalog::{CatalogError, CityCatalog, CityId};
pub use collection::collector::{BatchCollector, CollectError};
pub use collection::registry::CollectionJobRegistry;
pub use collection::state::CollectionState;
pub use config::{CollectorConfig, ConfigError, API_KEY_ENV, DEFAULT_BASE_URL};
pub use fetch::error::FetchError;
pub use fetch::observation::Observation;
pub use fetch::openweather::OpenWeatherFetcher;
pub use fetch::Fetcher;
pub use rate_limit::RateLimiter;
pub use store::{KvStore, MemoryStore, ProgressStore, StoreError};
