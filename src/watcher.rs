//! Feed watch loop.
//!
//! Each cycle fetches the feed, ranks it against the stored watermark and
//! notifies at most one new entry. Cycles run back to back with a fixed sleep
//! in between until the shutdown future resolves.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::feed::{FeedFetcher, FeedSource};
use crate::notify::{HttpNotifier, Notifier};
use crate::select::{normalize_link, pick_newest_eligible};
use crate::watermark::WatermarkStore;

/// Whether a watermark has been established yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// No watermark persisted; the next cycle primes it.
    Unprimed,
    /// Watermark known; cycles look for strictly newer entries.
    Primed(u64),
}

impl WatchState {
    /// Derive the state from the persisted watermark.
    pub fn from_watermark(watermark: Option<u64>) -> Self {
        match watermark {
            Some(id) => WatchState::Primed(id),
            None => WatchState::Unprimed,
        }
    }
}

/// What a single cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Watermark initialised from the feed.
    Primed {
        /// Id written as the first watermark.
        id: u64,
        /// Whether the entry was also delivered.
        notified: bool,
    },
    /// No watermark yet and no candidate to prime it with.
    NothingToPrime,
    /// New entry delivered and watermark advanced.
    Notified {
        /// Id delivered and stored.
        id: u64,
        /// Watermark before this cycle.
        previous: u64,
    },
    /// No eligible entry above the watermark.
    NoCandidate,
    /// Ranker returned an entry that is not above the watermark.
    NotNewer {
        /// Id of the returned entry.
        id: u64,
        /// Current watermark.
        watermark: u64,
    },
    /// Delivery failed; watermark left unchanged for a retry next cycle.
    DeliveryFailed {
        /// Id that could not be delivered.
        id: u64,
        /// Error reported by the notifier.
        reason: String,
    },
}

/// Settings that shape notifications.
#[derive(Debug, Clone)]
pub struct WatchSettings {
    /// Domain used in normalized links.
    pub link_domain: String,
    /// Account used in normalized links.
    pub account: String,
    /// Deliver the priming entry too.
    pub notify_on_prime: bool,
    /// Sleep between cycles.
    pub poll_interval: Duration,
}

impl WatchSettings {
    /// Build settings from the loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            link_domain: config.notify.link_domain.clone(),
            account: config.notify.account.clone(),
            notify_on_prime: config.notify.notify_on_prime,
            poll_interval: Duration::from_secs(config.feed.poll_interval_secs),
        }
    }
}

/// Single-feed watcher.
pub struct Watcher {
    source: Box<dyn FeedSource>,
    notifier: Box<dyn Notifier>,
    store: WatermarkStore,
    settings: WatchSettings,
}

impl Watcher {
    /// Create a watcher from its collaborators.
    pub fn new(
        source: Box<dyn FeedSource>,
        notifier: Box<dyn Notifier>,
        store: WatermarkStore,
        settings: WatchSettings,
    ) -> Self {
        Self {
            source,
            notifier,
            store,
            settings,
        }
    }

    /// Create a watcher that fetches and posts over HTTP.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            Box::new(FeedFetcher::new(&config.feed)?),
            Box::new(HttpNotifier::new(&config.notify)?),
            WatermarkStore::new(&config.state.path),
            WatchSettings::from_config(config),
        ))
    }

    /// Current state as seen from the persisted watermark.
    pub fn state(&self) -> WatchState {
        WatchState::from_watermark(self.store.read())
    }

    /// Get the watermark store.
    pub fn store(&self) -> &WatermarkStore {
        &self.store
    }

    fn link_for(&self, id: u64) -> String {
        normalize_link(&self.settings.link_domain, &self.settings.account, id)
    }

    /// Run one fetch, rank and notify cycle.
    ///
    /// Feed errors, watermark write errors and a failed priming delivery are
    /// returned as `Err`. A failed steady-state delivery is reported as
    /// [`CycleOutcome::DeliveryFailed`].
    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        let snapshot = self.source.fetch().await?;
        debug!(
            "Fetched {} entries from {:?}",
            snapshot.entries.len(),
            snapshot.title
        );
        let watermark = self.store.read();
        let candidate = pick_newest_eligible(&snapshot.entries, watermark);

        let current = match WatchState::from_watermark(watermark) {
            WatchState::Unprimed => return self.prime(candidate.map(|c| c.id)).await,
            WatchState::Primed(id) => id,
        };

        let Some(candidate) = candidate else {
            debug!("No new eligible post");
            return Ok(CycleOutcome::NoCandidate);
        };

        if candidate.id <= current {
            info!("Eligible post found but not newer than cache");
            return Ok(CycleOutcome::NotNewer {
                id: candidate.id,
                watermark: current,
            });
        }

        let link = self.link_for(candidate.id);
        info!(
            "New post detected (id {} > {}): {} -> {} (published: {})",
            candidate.id, current, candidate.title, link, candidate.published
        );

        match self.notifier.notify(&link).await {
            Ok(()) => {
                info!("Posted {}", link);
                self.store.write(candidate.id)?;
                Ok(CycleOutcome::Notified {
                    id: candidate.id,
                    previous: current,
                })
            }
            Err(e) => {
                error!("Delivery of {} failed, will retry: {}", link, e);
                Ok(CycleOutcome::DeliveryFailed {
                    id: candidate.id,
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn prime(&self, newest: Option<u64>) -> Result<CycleOutcome> {
        let Some(id) = newest else {
            info!("No eligible entries to prime");
            return Ok(CycleOutcome::NothingToPrime);
        };

        self.store.write(id)?;
        info!(
            "Primed cache with id {} (notify_on_prime={})",
            id, self.settings.notify_on_prime
        );

        if !self.settings.notify_on_prime {
            return Ok(CycleOutcome::Primed {
                id,
                notified: false,
            });
        }

        let link = self.link_for(id);
        self.notifier.notify(&link).await?;
        info!("Posted (first run): {}", link);

        Ok(CycleOutcome::Primed { id, notified: true })
    }

    /// Run cycles until `shutdown` resolves.
    ///
    /// Errors never end the loop; they are logged and the next cycle starts
    /// after the usual sleep. Shutdown is honoured mid-fetch, mid-delivery
    /// and mid-sleep.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!(
            "Watcher started (poll interval: {} seconds, state: {:?})",
            self.settings.poll_interval.as_secs(),
            self.state()
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Stopping watcher");
                    return;
                }
                _ = self.tick() => {}
            }
        }
    }

    async fn tick(&self) {
        match self.run_cycle().await {
            Ok(outcome) => debug!("Cycle finished: {:?}", outcome),
            Err(e) if e.is_feed_error() => warn!("Feed unavailable ({}): {}", e.kind(), e),
            Err(e) => error!("Cycle failed ({}): {}", e.kind(), e),
        }
        sleep(self.settings.poll_interval).await;
    }
}
