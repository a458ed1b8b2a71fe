//! Site Client Cache
//!
//! One provider client per site, built lazily from the site's credential.
//!
//! Each site gets its own once-cell inside a sharded map. Concurrent first
//! callers for a site share one construction; callers for other sites never
//! wait on it. Map guards are dropped before any await. A failed construction
//! removes its empty cell so the next call tries again from scratch.

use super::credentials::CredentialResolver;
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::model::AnalyticsRequest;
use crate::provider::{ProviderTransport, TransportFactory};
use crate::query::{NormalizedResult, QueryTranslator};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;

/// A ready-to-use client bound to one site
pub struct SiteClient {
    site_id: String,
    application_name: String,
    transport: Arc<dyn ProviderTransport>,
    translator: QueryTranslator,
    created_at: Instant,
}

impl SiteClient {
    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub fn application_name(&self) -> &str {
        &self.application_name
    }

    pub fn translator(&self) -> &QueryTranslator {
        &self.translator
    }

    /// Time since the client was built
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Run `request` against this site's provider
    pub async fn query(&self, request: &AnalyticsRequest) -> AnalyticsResult<NormalizedResult> {
        self.translator
            .translate(request, self.transport.as_ref())
            .await
    }
}

/// Decides when a cached client must be rebuilt
pub trait EvictionPolicy: Send + Sync {
    fn is_stale(&self, client: &SiteClient) -> bool;
}

/// Keep clients for the life of the cache
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverEvict;

impl EvictionPolicy for NeverEvict {
    fn is_stale(&self, _client: &SiteClient) -> bool {
        false
    }
}

/// Rebuild clients older than the given age
#[derive(Debug, Clone, Copy)]
pub struct MaxAge(pub Duration);

impl EvictionPolicy for MaxAge {
    fn is_stale(&self, client: &SiteClient) -> bool {
        client.age() >= self.0
    }
}

type Slot = Arc<OnceCell<Arc<SiteClient>>>;

/// Per-site client cache
pub struct SiteClientCache {
    resolver: Arc<dyn CredentialResolver>,
    factory: Arc<dyn TransportFactory>,
    translator: QueryTranslator,
    eviction: Box<dyn EvictionPolicy>,
    entries: DashMap<String, Slot>,
}

impl SiteClientCache {
    pub fn new(
        resolver: Arc<dyn CredentialResolver>,
        factory: Arc<dyn TransportFactory>,
        translator: QueryTranslator,
    ) -> Self {
        Self {
            resolver,
            factory,
            translator,
            eviction: Box::new(NeverEvict),
            entries: DashMap::new(),
        }
    }

    /// Replace the eviction policy
    pub fn with_eviction(mut self, policy: impl EvictionPolicy + 'static) -> Self {
        self.eviction = Box::new(policy);
        self
    }

    /// The client for `site_id`, building it on first use
    pub async fn get_client(&self, site_id: &str) -> AnalyticsResult<Arc<SiteClient>> {
        let mut slot = self.slot(site_id);

        if let Some(existing) = slot.get() {
            if !self.eviction.is_stale(existing) {
                return Ok(Arc::clone(existing));
            }
            tracing::warn!(
                site_id,
                age_secs = existing.age().as_secs(),
                "Evicting stale site client"
            );
            let stale = Arc::clone(&slot);
            self.entries
                .remove_if(site_id, |_, current| Arc::ptr_eq(current, &stale));
            slot = self.slot(site_id);
        }

        match slot.get_or_try_init(|| self.build(site_id)).await {
            Ok(client) => Ok(Arc::clone(client)),
            Err(e) => {
                // Site ids are caller-supplied; failed ones keep no entry
                self.entries.remove_if(site_id, |_, current| {
                    Arc::ptr_eq(current, &slot) && !current.initialized()
                });
                Err(e)
            }
        }
    }

    /// Drop the cached client for `site_id`; returns whether one was cached
    pub fn invalidate(&self, site_id: &str) -> bool {
        self.entries.remove(site_id).is_some()
    }

    /// Whether a built client is cached for `site_id`
    pub fn contains(&self, site_id: &str) -> bool {
        self.entries
            .get(site_id)
            .map(|slot| slot.initialized())
            .unwrap_or(false)
    }

    /// Number of built clients
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn translator(&self) -> &QueryTranslator {
        &self.translator
    }

    fn slot(&self, site_id: &str) -> Slot {
        if let Some(slot) = self.entries.get(site_id) {
            return Arc::clone(slot.value());
        }
        let entry = self.entries.entry(site_id.to_string()).or_default();
        Arc::clone(entry.value())
    }

    async fn build(&self, site_id: &str) -> AnalyticsResult<Arc<SiteClient>> {
        let credential = self
            .resolver
            .resolve(site_id)
            .await
            .map_err(|e| AnalyticsError::client_init(site_id, e))?
            .ok_or_else(|| AnalyticsError::CredentialMissing {
                site_id: site_id.to_string(),
            })?;

        let transport = self.factory.create(site_id, &credential)?;

        tracing::info!(
            site_id,
            application = credential.application_name(),
            dialect = %self.translator.dialect(),
            "Built site client"
        );

        Ok(Arc::new(SiteClient {
            site_id: site_id.to_string(),
            application_name: credential.application_name().to_string(),
            transport,
            translator: self.translator,
            created_at: Instant::now(),
        }))
    }
}
