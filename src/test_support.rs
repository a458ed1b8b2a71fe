//! Fakes shared by unit tests

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::provider::data_api::RunReportResponse;
use crate::provider::{
    ProviderRequest, ProviderResponse, ProviderTransport, TransportError, TransportFactory,
};
use crate::sites::{CredentialError, CredentialResolver, SiteCredential, StaticCredentialResolver};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Key material the counting factory refuses to build from
pub const BAD_KEY: &[u8] = b"not-a-key";

/// Transport that records requests and answers with a fixed response
pub struct CannedTransport {
    response: Option<ProviderResponse>,
    fail_status: u16,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl CannedTransport {
    pub fn responding(response: ProviderResponse) -> Self {
        Self {
            response: Some(response),
            fail_status: 0,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fails every call with an API error carrying `status`
    pub fn failing(status: u16) -> Self {
        Self {
            response: None,
            fail_status: status,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProviderTransport for CannedTransport {
    async fn execute(&self, request: &ProviderRequest) -> Result<ProviderResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.response {
            Some(response) => Ok(response.clone()),
            None => Err(TransportError::Api {
                status: self.fail_status,
                message: "canned failure".to_string(),
            }),
        }
    }
}

/// Factory that counts builds and rejects [`BAD_KEY`]
#[derive(Default)]
pub struct CountingFactory {
    builds: AtomicUsize,
}

impl CountingFactory {
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl TransportFactory for CountingFactory {
    fn create(
        &self,
        site_id: &str,
        credential: &SiteCredential,
    ) -> AnalyticsResult<Arc<dyn ProviderTransport>> {
        if credential.key_material() == BAD_KEY {
            return Err(AnalyticsError::client_init(site_id, "malformed key"));
        }
        self.builds.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(CannedTransport::responding(ProviderResponse::Data(
            RunReportResponse::default(),
        ))))
    }
}

/// Resolver with a per-call delay and an optional gate on one site
#[derive(Default)]
pub struct SlowResolver {
    pub inner: StaticCredentialResolver,
    delay: Duration,
    gate: Option<(String, Arc<Notify>)>,
    resolves: AtomicUsize,
}

impl SlowResolver {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    /// Resolving `site_id` blocks until `gate` is notified
    pub fn gated(site_id: &str, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some((site_id.to_string(), gate)),
            ..Default::default()
        }
    }

    pub fn resolves(&self) -> usize {
        self.resolves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialResolver for SlowResolver {
    async fn resolve(&self, site_id: &str) -> Result<Option<SiteCredential>, CredentialError> {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        if let Some((gated, gate)) = &self.gate {
            if gated == site_id {
                gate.notified().await;
            }
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.resolve(site_id).await
    }
}

/// A credential the counting factory accepts
pub fn good_key() -> Vec<u8> {
    br#"{"type":"service_account"}"#.to_vec()
}
