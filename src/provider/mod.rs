//! Analytics Providers
//!
//! Wire shapes for each provider generation and the transport seam used to
//! execute them:
//!
//! - **core_reporting**: Core Reporting API v3
//! - **reporting_v4**: Analytics Reporting API v4
//! - **data_api**: Analytics Data API v1beta
//! - **http**: `reqwest` transport for all three
//!
//! The core never speaks HTTP itself. It hands a [`ProviderRequest`] to a
//! [`ProviderTransport`] and gets a [`ProviderResponse`] back.

pub mod core_reporting;
pub mod data_api;
mod http;
pub mod reporting_v4;

pub use http::{
    AccessTokenProvider, Endpoints, HttpTransport, HttpTransportFactory, ServiceAccountKey,
    StaticTokenProvider,
};

use crate::error::AnalyticsResult;
use crate::sites::SiteCredential;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// A request in the native shape of one provider generation
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderRequest {
    CoreReporting(core_reporting::CoreReportingRequest),
    ReportingV4(reporting_v4::BatchGetRequest),
    Data(data_api::RunReportRequest),
}

/// A response in the native shape of one provider generation
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderResponse {
    CoreReporting(core_reporting::CoreReportingResponse),
    ReportingV4(reporting_v4::BatchGetResponse),
    Data(data_api::RunReportResponse),
}

impl ProviderResponse {
    /// Reduce the response to positional rows plus metadata.
    ///
    /// `dimension_count` is used to split rows for generations whose rows do
    /// not separate dimensions from metrics and whose headers are missing.
    pub fn into_raw(self, dimension_count: usize) -> RawReport {
        match self {
            Self::CoreReporting(r) => r.into_raw(dimension_count),
            Self::ReportingV4(r) => r.into_raw(),
            Self::Data(r) => r.into_raw(),
        }
    }

    pub(crate) fn generation(&self) -> &'static str {
        match self {
            Self::CoreReporting(_) => "core_reporting_v3",
            Self::ReportingV4(_) => "reporting_v4",
            Self::Data(_) => "data_v1beta",
        }
    }
}

/// Provider-neutral view of a response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawReport {
    pub rows: Vec<RawRow>,
    pub row_count: Option<u64>,
    pub currency_code: Option<String>,
    pub time_zone: Option<String>,
    pub next_page_token: Option<String>,
}

/// One result row with positional values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    pub dimension_values: Vec<String>,
    pub metric_values: Vec<String>,
}

/// Executes provider requests
#[async_trait]
pub trait ProviderTransport: Send + Sync {
    /// Execute one request against the provider
    async fn execute(&self, request: &ProviderRequest) -> Result<ProviderResponse, TransportError>;
}

/// Builds a transport from a site's credential
pub trait TransportFactory: Send + Sync {
    /// Build a transport for `site_id`.
    ///
    /// Malformed key material or construction failure must be reported as
    /// [`crate::AnalyticsError::ClientInit`].
    fn create(
        &self,
        site_id: &str,
        credential: &SiteCredential,
    ) -> AnalyticsResult<Arc<dyn ProviderTransport>>;
}

/// Errors raised while talking to the provider
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Request timeout")]
    Timeout,

    #[error("Provider unavailable")]
    Unavailable,

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode provider response: {0}")]
    Decode(String),
}
