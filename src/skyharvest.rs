//! This module provides the main entry point for the collection engine.
//! A [`Skyharvest`] instance owns the catalog, the process-wide rate limiter
//! and job registry, and the progress store, and exposes the two operations
//! callers need: start (or resume) a collection job for a user, and query how
//! far that user's collection has progressed.

use crate::catalog::CityCatalog;
use crate::collection::collector::BatchCollector;
use crate::collection::registry::CollectionJobRegistry;
use crate::config::CollectorConfig;
use crate::error::SkyharvestError;
use crate::fetch::openweather::OpenWeatherFetcher;
use crate::fetch::Fetcher;
use crate::rate_limit::RateLimiter;
use crate::store::{KvStore, ProgressStore};
use bon::bon;
use log::{error, info};
use std::sync::Arc;

/// Outcome of a start-collection request. All three are success values; a
/// duplicate or redundant start is reported, not raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartStatus {
    /// A job was registered and is now running in the background.
    /// `resumed_from` is how many cities were already persisted at start,
    /// zero for a brand-new user.
    Started { resumed_from: usize },
    /// A job for this user is already in flight; nothing was started.
    AlreadyRunning,
    /// The persisted state already covers the full catalog; nothing to do.
    AlreadyComplete,
}

/// Collected-versus-catalog progress for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub collected: usize,
    pub total: usize,
}

impl Progress {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.collected as f64 / self.total as f64 * 100.0
        }
    }
}

/// The collection engine for one process.
///
/// The rate limiter and job registry are deliberately owned here and shared
/// across every job: the call limit is imposed by the remote service for the
/// whole process, and the registry is what stops two jobs racing on one
/// user's persisted state.
///
/// # Examples
///
/// ```no_run
/// use skyharvest::{CityCatalog, CollectorConfig, MemoryStore, Skyharvest, StartStatus};
/// use std::sync::Arc;
///
/// # async fn run() -> Result<(), skyharvest::SkyharvestError> {
/// let catalog = CityCatalog::from_json_file("cities.json").await?;
/// let engine = Skyharvest::builder()
///     .catalog(catalog)
///     .kv_store(Arc::new(MemoryStore::new()))
///     .config(CollectorConfig::from_env()?)
///     .build();
///
/// match engine.start_collection("alice").await? {
///     StartStatus::Started { resumed_from } => {
///         println!("collection running, {resumed_from} cities already done")
///     }
///     StartStatus::AlreadyRunning => println!("still in progress"),
///     StartStatus::AlreadyComplete => println!("nothing left to collect"),
/// }
///
/// let progress = engine.progress("alice").await?;
/// println!("{:.1}% collected", progress.percent());
/// # Ok(())
/// # }
/// ```
pub struct Skyharvest {
    catalog: Arc<CityCatalog>,
    collector: Arc<BatchCollector>,
    registry: Arc<CollectionJobRegistry>,
    store: ProgressStore,
}

#[bon]
impl Skyharvest {
    /// Assembles an engine from a catalog, a key-value backend and a
    /// configuration. A custom [`Fetcher`] may be supplied for testing or for
    /// alternative weather services; by default requests go to OpenWeather
    /// as configured.
    #[builder]
    pub fn new(
        catalog: CityCatalog,
        kv_store: Arc<dyn KvStore>,
        config: CollectorConfig,
        fetcher: Option<Arc<dyn Fetcher>>,
    ) -> Self {
        let catalog = Arc::new(catalog);
        let fetcher = fetcher.unwrap_or_else(|| Arc::new(OpenWeatherFetcher::new(&config)));
        let limiter = Arc::new(RateLimiter::new(
            config.rate_limit_calls,
            config.rate_limit_window,
        ));
        let store = ProgressStore::new(kv_store);
        let collector = Arc::new(BatchCollector::new(
            Arc::clone(&catalog),
            fetcher,
            limiter,
            store.clone(),
            config.batch_size,
            config.inter_batch_delay,
        ));
        Self {
            catalog,
            collector,
            registry: Arc::new(CollectionJobRegistry::new()),
            store,
        }
    }

    /// Starts or resumes collection for `user`, returning immediately.
    ///
    /// If the persisted state already covers the catalog, or a job for this
    /// user is already in flight, no work is started and the corresponding
    /// [`StartStatus`] is returned. Otherwise the job runs as a background
    /// task whose handle stays attached to the engine; a job failure is
    /// logged and simply leaves the unfinished cities outstanding for the
    /// next request.
    ///
    /// # Errors
    ///
    /// Returns [`SkyharvestError::Store`] if the persisted state cannot be
    /// read to decide whether work remains.
    pub async fn start_collection(&self, user: &str) -> Result<StartStatus, SkyharvestError> {
        let state = self.store.load(user).await?;
        if let Some(state) = &state {
            if state.is_complete(&self.catalog) {
                info!("Collection already complete for user {user}");
                return Ok(StartStatus::AlreadyComplete);
            }
        }

        if !self.registry.try_start(user).await {
            info!("Collection already in progress for user {user}");
            return Ok(StartStatus::AlreadyRunning);
        }

        let resumed_from = state.map(|s| s.len()).unwrap_or(0);
        let collector = Arc::clone(&self.collector);
        let registry = Arc::clone(&self.registry);
        let user = user.to_string();
        let handle = tokio::spawn(async move {
            match collector.run(&user).await {
                Ok(count) => {
                    info!("Collection job for user {user} completed with {count} observations")
                }
                Err(err) => error!("Collection job for user {user} failed: {err}"),
            }
            registry.finish(&user).await;
        });
        self.registry.attach(handle).await;

        Ok(StartStatus::Started { resumed_from })
    }

    /// Reports progress for `user` against the catalog, reflecting only
    /// batches that have been durably persisted. Observations for cities no
    /// longer in the catalog are not counted, so the report stays within
    /// 0–100% even when old state outlives a catalog change.
    ///
    /// # Errors
    ///
    /// Returns [`SkyharvestError::UserNotFound`] if no state was ever
    /// persisted for `user`.
    pub async fn progress(&self, user: &str) -> Result<Progress, SkyharvestError> {
        let state = self
            .store
            .load(user)
            .await?
            .ok_or_else(|| SkyharvestError::UserNotFound(user.to_string()))?;
        Ok(Progress {
            collected: state.collected_in(&self.catalog),
            total: self.catalog.len(),
        })
    }

    /// Awaits every background job started so far. Mainly useful for tests
    /// and for orderly shutdown.
    pub async fn wait_idle(&self) {
        self.registry.wait_idle().await;
    }
}
