//! HTTP Transport
//!
//! `reqwest` client for the three provider generations. Credentials arrive as
//! a service-account JSON key; turning that key into a bearer token is the
//! job of an [`AccessTokenProvider`] supplied by the host.

use super::{
    ProviderRequest, ProviderResponse, ProviderTransport, TransportError, TransportFactory,
};
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::sites::SiteCredential;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Base URLs for each generation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Endpoints {
    #[serde(default = "default_core_reporting")]
    pub core_reporting: String,
    #[serde(default = "default_reporting_v4")]
    pub reporting_v4: String,
    #[serde(default = "default_data_api")]
    pub data_api: String,
}

fn default_core_reporting() -> String {
    "https://www.googleapis.com/analytics/v3/data/ga".to_string()
}

fn default_reporting_v4() -> String {
    "https://analyticsreporting.googleapis.com/v4/reports:batchGet".to_string()
}

fn default_data_api() -> String {
    "https://analyticsdata.googleapis.com/v1beta".to_string()
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            core_reporting: default_core_reporting(),
            reporting_v4: default_reporting_v4(),
            data_api: default_data_api(),
        }
    }
}

/// The fields of a service-account JSON key the transport relies on
#[derive(Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type")]
    pub key_type: String,
    pub project_id: Option<String>,
    pub private_key_id: Option<String>,
    pub private_key: SecretString,
    pub client_email: String,
    pub token_uri: Option<String>,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("key_type", &self.key_type)
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

impl ServiceAccountKey {
    /// Parse and sanity-check raw key material
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, String> {
        let key: ServiceAccountKey =
            serde_json::from_slice(bytes).map_err(|e| format!("unparsable key: {}", e))?;

        if key.key_type != "service_account" {
            return Err(format!(
                "expected a service_account key, got '{}'",
                key.key_type
            ));
        }
        if key.client_email.trim().is_empty() {
            return Err("key has no client_email".to_string());
        }
        if key.private_key.expose_secret().trim().is_empty() {
            return Err("key has no private_key".to_string());
        }

        Ok(key)
    }
}

/// Supplies bearer tokens for a service account
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self, key: &ServiceAccountKey) -> Result<SecretString, TransportError>;
}

/// Serves one fixed token regardless of the key
pub struct StaticTokenProvider {
    token: SecretString,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::new(token.into()),
        }
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self, _key: &ServiceAccountKey) -> Result<SecretString, TransportError> {
        Ok(SecretString::new(self.token.expose_secret().clone()))
    }
}

/// Transport bound to one site's service account
pub struct HttpTransport {
    client: Client,
    endpoints: Endpoints,
    key: ServiceAccountKey,
    tokens: Arc<dyn AccessTokenProvider>,
}

impl HttpTransport {
    pub fn new(
        client: Client,
        endpoints: Endpoints,
        key: ServiceAccountKey,
        tokens: Arc<dyn AccessTokenProvider>,
    ) -> Self {
        Self {
            client,
            endpoints,
            key,
            tokens,
        }
    }

    /// The service account this transport authenticates as
    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, TransportError> {
        let token = self.tokens.access_token(&self.key).await?;

        let response = request
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            let text = response.text().await.unwrap_or_default();
            return Err(TransportError::Auth(format!("{}: {}", status, text)));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(TransportError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}

fn classify(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::Unavailable
    } else {
        TransportError::Request(e)
    }
}

#[async_trait]
impl ProviderTransport for HttpTransport {
    async fn execute(&self, request: &ProviderRequest) -> Result<ProviderResponse, TransportError> {
        match request {
            ProviderRequest::CoreReporting(r) => {
                let builder = self.client.get(&self.endpoints.core_reporting).query(r);
                Ok(ProviderResponse::CoreReporting(self.send(builder).await?))
            }
            ProviderRequest::ReportingV4(r) => {
                let builder = self.client.post(&self.endpoints.reporting_v4).json(r);
                Ok(ProviderResponse::ReportingV4(self.send(builder).await?))
            }
            ProviderRequest::Data(r) => {
                let property_id = r.property.trim_start_matches("properties/");
                let url = format!(
                    "{}/properties/{}:runReport",
                    self.endpoints.data_api.trim_end_matches('/'),
                    urlencoding::encode(property_id)
                );
                let builder = self.client.post(url).json(r);
                Ok(ProviderResponse::Data(self.send(builder).await?))
            }
        }
    }
}

/// Builds an [`HttpTransport`] per site, sharing one connection pool
pub struct HttpTransportFactory {
    client: Client,
    endpoints: Endpoints,
    tokens: Arc<dyn AccessTokenProvider>,
}

impl HttpTransportFactory {
    pub fn new(
        endpoints: Endpoints,
        tokens: Arc<dyn AccessTokenProvider>,
        request_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("site-analytics/", env!("CARGO_PKG_VERSION")))
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            client,
            endpoints,
            tokens,
        })
    }
}

impl TransportFactory for HttpTransportFactory {
    fn create(
        &self,
        site_id: &str,
        credential: &SiteCredential,
    ) -> AnalyticsResult<Arc<dyn ProviderTransport>> {
        let key = ServiceAccountKey::from_bytes(credential.key_material())
            .map_err(|reason| AnalyticsError::client_init(site_id, reason))?;

        tracing::debug!(
            site_id,
            application = credential.application_name(),
            client_email = %key.client_email,
            "Built HTTP transport"
        );

        Ok(Arc::new(HttpTransport::new(
            self.client.clone(),
            self.endpoints.clone(),
            key,
            Arc::clone(&self.tokens),
        )))
    }
}
