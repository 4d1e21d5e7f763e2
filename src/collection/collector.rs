//! The batch collection engine.
//!
//! One [`BatchCollector::run`] call is one end-to-end job for one user:
//! resume from persisted state, walk the outstanding part of the catalog in
//! fixed-size batches, fetch each batch concurrently behind the shared rate
//! limiter, and persist after every batch so a crash never loses more than
//! the batch in flight.

use crate::catalog::{CityCatalog, CityId};
use crate::collection::state::CollectionState;
use crate::fetch::observation::Observation;
use crate::fetch::Fetcher;
use crate::rate_limit::RateLimiter;
use crate::store::{ProgressStore, StoreError};
use futures_util::future::join_all;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Faults that abort a whole job, as opposed to per-city fetch failures
/// which only drop that city from the run.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Drives collection jobs against one catalog, fetcher, limiter and store.
///
/// The collector itself is stateless between runs; all durable progress lives
/// in the [`ProgressStore`], which is what makes re-invocation idempotent.
pub struct BatchCollector {
    catalog: Arc<CityCatalog>,
    fetcher: Arc<dyn Fetcher>,
    limiter: Arc<RateLimiter>,
    store: ProgressStore,
    batch_size: usize,
    inter_batch_delay: Duration,
}

impl BatchCollector {
    pub fn new(
        catalog: Arc<CityCatalog>,
        fetcher: Arc<dyn Fetcher>,
        limiter: Arc<RateLimiter>,
        store: ProgressStore,
        batch_size: usize,
        inter_batch_delay: Duration,
    ) -> Self {
        Self {
            catalog,
            fetcher,
            limiter,
            store,
            batch_size: batch_size.max(1),
            inter_batch_delay,
        }
    }

    /// Runs one collection job for `user` to completion, returning the total
    /// number of observations persisted for the user afterwards.
    ///
    /// Cities whose fetch fails are logged and left outstanding; they are
    /// only attempted again on a future, externally triggered run. Storage
    /// faults abort the job.
    pub async fn run(&self, user: &str) -> Result<usize, CollectError> {
        info!("Starting collection job for user {user}");

        let mut state = self.store.load(user).await?.unwrap_or_default();
        if !state.is_empty() {
            info!(
                "Resuming user {user} from {} previously collected cities",
                state.len()
            );
        }

        let remaining: Vec<CityId> = self
            .catalog
            .ids()
            .filter(|city| !state.contains(*city))
            .collect();
        let total_batches = remaining.len().div_ceil(self.batch_size);

        for (index, batch) in remaining.chunks(self.batch_size).enumerate() {
            info!(
                "Processing batch {} of {} for user {user}",
                index + 1,
                total_batches
            );
            let fetched = self.run_batch(batch, user).await;
            state.merge(fetched);

            // Durability boundary: the next batch must not start before this
            // state is on disk.
            self.store.save(user, &state).await?;
            info!(
                "Progress for user {user}: {}/{} cities collected",
                state.len(),
                self.catalog.len()
            );

            if index + 1 < total_batches {
                debug!(
                    "Waiting {:?} before the next batch for user {user}",
                    self.inter_batch_delay
                );
                tokio::time::sleep(self.inter_batch_delay).await;
            }
        }

        info!(
            "Collection job for user {user} finished with {} observations",
            state.len()
        );
        Ok(state.len())
    }

    /// Fetches one batch concurrently. Each fetch independently awaits a
    /// rate-limit permit, so job throughput is bounded by the limiter no
    /// matter how large the batch is. Failed cities are dropped with a log.
    async fn run_batch(&self, batch: &[CityId], user: &str) -> Vec<Observation> {
        let fetches = batch.iter().copied().map(|city| {
            let fetcher = Arc::clone(&self.fetcher);
            let limiter = Arc::clone(&self.limiter);
            async move {
                limiter.acquire().await;
                match fetcher.fetch(city, user).await {
                    Ok(observation) => Some(observation),
                    Err(err) => {
                        warn!("Dropping city {city} from this run: {err}");
                        None
                    }
                }
            }
        });
        join_all(fetches).await.into_iter().flatten().collect()
    }
}
