pub mod error;
pub mod observation;
pub mod openweather;

use crate::catalog::CityId;
use crate::fetch::error::FetchError;
use crate::fetch::observation::Observation;
use async_trait::async_trait;

/// One remote lookup for one city on behalf of one user.
///
/// Implementations perform exactly one upstream call per invocation; callers
/// are responsible for acquiring a rate-limit permit first. The trait exists
/// so the batch collector can be driven against scripted fetchers in tests.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, city: CityId, user: &str) -> Result<Observation, FetchError>;
}
