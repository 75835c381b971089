//! The cache controller: one versioned generation, stale-while-revalidate
//! fetch handling, offline fallback for navigations.

use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, trace, warn};

use scout_common::{Result, ScoutError};

use crate::config::SwConfig;
use crate::fetch::{FetchRequest, FetchResponse};
use crate::lifecycle::{LifecycleEvent, SwEvent, WorkerPhase};
use crate::net::Network;
use crate::store::{CacheEntry, CacheStorage};

/// The cache controller.
///
/// Owns exactly one named cache generation and mediates every intercepted
/// GET request. Driven by [`LifecycleEvent`]s for install/activate and by
/// [`handle_fetch`](CacheController::handle_fetch) per request.
pub struct CacheController {
    config: SwConfig,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    phase: RwLock<WorkerPhase>,
    event_tx: mpsc::UnboundedSender<SwEvent>,
}

impl CacheController {
    /// Create a controller and the receiver for its notifications.
    pub fn new(
        config: SwConfig,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SwEvent>)> {
        config.validate()?;
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Ok((
            Self {
                config,
                storage,
                network,
                phase: RwLock::new(WorkerPhase::Parsed),
                event_tx,
            },
            event_rx,
        ))
    }

    /// Current lifecycle phase.
    pub async fn phase(&self) -> WorkerPhase {
        *self.phase.read().await
    }

    /// The configuration this controller was built with.
    pub fn config(&self) -> &SwConfig {
        &self.config
    }

    /// Drive the lifecycle state machine.
    pub async fn dispatch(&self, event: LifecycleEvent) -> Result<()> {
        match event {
            LifecycleEvent::Install => self.install().await,
            LifecycleEvent::Activate => self.activate().await,
        }
    }

    /// Install phase: populate the new generation from the precache manifest.
    ///
    /// Atomic: every manifest entry is fetched before anything is stored. Any
    /// failed fetch (or non-200) aborts the whole install and the previous
    /// generation stays authoritative.
    pub async fn install(&self) -> Result<()> {
        self.set_phase(WorkerPhase::Installing).await;
        info!(
            generation = %self.config.cache_name,
            entries = self.config.precache.len(),
            "installing"
        );

        let mut fetched = Vec::with_capacity(self.config.precache.len());
        for path in &self.config.precache {
            let url = match self.config.resource_url(path) {
                Ok(url) => url,
                Err(e) => return self.abort_install(e).await,
            };
            let request = FetchRequest::get(url.clone());
            match self.network.fetch(&request).await {
                Ok(response) if response.status == 200 => {
                    fetched.push(CacheEntry::from_response(url.as_str(), &response));
                }
                Ok(response) => {
                    return self
                        .abort_install(ScoutError::install(format!(
                            "precache fetch for {} returned status {}",
                            url, response.status
                        )))
                        .await;
                }
                Err(e) => {
                    return self
                        .abort_install(ScoutError::install_with_source(
                            format!("precache fetch for {} failed", url),
                            e,
                        ))
                        .await;
                }
            }
        }

        if let Err(e) = self.store_precache(fetched).await {
            // Remove the partially populated generation so it can never
            // become current.
            if let Err(del) = self.storage.delete(&self.config.cache_name).await {
                warn!(error = %del, "failed to remove partial generation");
            }
            return self.abort_install(e).await;
        }

        self.set_phase(WorkerPhase::Installed).await;
        info!(generation = %self.config.cache_name, "installed, skipping waiting");
        Ok(())
    }

    async fn store_precache(&self, entries: Vec<CacheEntry>) -> Result<()> {
        self.storage.open(&self.config.cache_name).await?;
        for entry in entries {
            self.storage.put(&self.config.cache_name, entry).await?;
        }
        Ok(())
    }

    async fn abort_install(&self, error: ScoutError) -> Result<()> {
        warn!(generation = %self.config.cache_name, error = %error, "install aborted");
        self.set_phase(WorkerPhase::Redundant).await;
        Err(error)
    }

    /// Activate phase: purge every generation except the current one, then
    /// claim all open pages.
    pub async fn activate(&self) -> Result<()> {
        self.set_phase(WorkerPhase::Activating).await;

        let names = self.storage.keys().await?;
        for name in names {
            if name != self.config.cache_name {
                if self.storage.delete(&name).await? {
                    debug!(generation = %name, "purged stale generation");
                    let _ = self.event_tx.send(SwEvent::GenerationPurged { name });
                }
            }
        }

        self.set_phase(WorkerPhase::Activated).await;
        let _ = self.event_tx.send(SwEvent::ClientsClaimed);
        info!(generation = %self.config.cache_name, "activated, clients claimed");
        Ok(())
    }

    /// Fetch phase: stale-while-revalidate.
    ///
    /// Non-GET requests go straight to the network and are never cached. For
    /// GET, a cached entry is returned immediately while a background task
    /// refreshes the cache; on a miss the network result is awaited, cached
    /// on a 200, and a failing navigation falls back to the offline document.
    pub async fn handle_fetch(&self, request: FetchRequest) -> Result<FetchResponse> {
        if !request.is_get() {
            trace!(method = %request.method, url = %request.url, "passing through");
            return self.network.fetch(&request).await;
        }

        let url = request.url.to_string();
        let cached = match self
            .storage
            .match_entry(&self.config.cache_name, &url)
            .await
        {
            Ok(cached) => cached,
            Err(e) => {
                // Lookup failure degrades to a miss; caching is an
                // optimization, not a correctness requirement.
                warn!(url = %url, error = %e, "cache lookup failed");
                None
            }
        };

        match cached {
            Some(entry) => {
                trace!(url = %url, "cache hit, revalidating in background");
                self.spawn_revalidate(request);
                Ok(entry.into_response())
            }
            None => match self.network.fetch(&request).await {
                Ok(response) => {
                    if response.status == 200 {
                        let entry = CacheEntry::from_response(&url, &response);
                        if let Err(e) = self.storage.put(&self.config.cache_name, entry).await {
                            warn!(url = %url, error = %e, "cache write failed");
                        }
                    }
                    Ok(response)
                }
                Err(error) => {
                    if request.is_navigation() {
                        if let Some(fallback) = self.offline_fallback().await {
                            debug!(url = %url, "serving offline fallback");
                            return Ok(fallback);
                        }
                    }
                    Err(error)
                }
            },
        }
    }

    /// Refresh a cached identity from the network without blocking the
    /// caller. Failures here are dropped: the caller already has a response.
    fn spawn_revalidate(&self, request: FetchRequest) {
        let network = Arc::clone(&self.network);
        let storage = Arc::clone(&self.storage);
        let cache_name = self.config.cache_name.clone();
        tokio::spawn(async move {
            let url = request.url.to_string();
            match network.fetch(&request).await {
                Ok(response) if response.status == 200 => {
                    let entry = CacheEntry::from_response(&url, &response);
                    if let Err(e) = storage.put(&cache_name, entry).await {
                        warn!(url = %url, error = %e, "revalidation cache write failed");
                    }
                }
                Ok(response) => {
                    trace!(url = %url, status = response.status, "revalidation skipped");
                }
                Err(e) => {
                    trace!(url = %url, error = %e, "revalidation fetch failed");
                }
            }
        });
    }

    async fn offline_fallback(&self) -> Option<FetchResponse> {
        let offline_url = self.config.offline_url().ok()?;
        match self
            .storage
            .match_entry(&self.config.cache_name, offline_url.as_str())
            .await
        {
            Ok(Some(entry)) => Some(entry.into_response()),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "offline fallback lookup failed");
                None
            }
        }
    }

    async fn set_phase(&self, phase: WorkerPhase) {
        *self.phase.write().await = phase;
        let _ = self.event_tx.send(SwEvent::PhaseChange { phase });
    }
}
