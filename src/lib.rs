//! # Site Analytics
//!
//! Multi-site web analytics query adapter. Callers describe a report once,
//! in provider-agnostic terms; the crate translates it for the configured
//! analytics API generation, runs it with the site's own credential and
//! returns flat name/value rows.
//!
//! ## Features
//!
//! - **Three API generations**: Core Reporting v3, Reporting v4 and the Data
//!   API v1beta behind one [`query::Dialect`] switch
//! - **Per-site clients**: built lazily, once, from each site's credential
//! - **Normalized results**: every row keyed by the requested field names
//!
//! ## Modules
//!
//! - [`model`]: Request model, filters and the REST body DTO
//! - [`query`]: Dialects, filter expressions and the translator
//! - [`provider`]: Native wire types and the HTTP transport
//! - [`sites`]: Credentials and the per-site client cache
//! - [`service`]: Caller-facing entry point
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use site_analytics::{AnalyticsRequest, AnalyticsService, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let service = AnalyticsService::from_config(&config)?;
//!
//!     let request = AnalyticsRequest::new("123456789")?
//!         .with_metrics(&["sessions", "activeUsers"])
//!         .with_dimensions(&["date"])
//!         .with_date_range("2026-02-09", "2026-02-16");
//!
//!     let result = service.query("blog", &request).await?;
//!     for row in &result.rows {
//!         println!("{:?}: {:?}", row.get("date"), row.get("sessions"));
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod query;
pub mod service;
pub mod sites;

#[cfg(test)]
mod test_support;

// Re-export top-level types for convenience
pub use error::{AnalyticsError, AnalyticsResult};

pub use model::{AnalyticsRequest, FilterOperator, FilterRequest, QueryRequestDto};

pub use query::{
    Dialect, FieldPolicy, NormalizedResult, QueryTranslator, ResponseMetadata, ResultRow,
};

pub use provider::{
    HttpTransportFactory, ProviderRequest, ProviderResponse, ProviderTransport, TransportError,
    TransportFactory,
};

pub use sites::{
    CredentialError, CredentialResolver, EvictionPolicy, MaxAge, NeverEvict, SiteClient,
    SiteClientCache, SiteCredential,
};

pub use service::AnalyticsService;

pub use config::{generate_default_config, Config, ConfigError};
