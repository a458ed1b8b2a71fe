//! Analytics Service
//!
//! Caller-facing entry point: resolve the site's client, translate, execute.

use crate::config::Config;
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::model::{AnalyticsRequest, QueryRequestDto};
use crate::provider::{HttpTransportFactory, StaticTokenProvider, TransportFactory};
use crate::query::{NormalizedResult, QueryTranslator};
use crate::sites::{ConfigCredentialResolver, CredentialResolver, MaxAge, SiteClientCache};
use secrecy::ExposeSecret;
use std::sync::Arc;

/// Runs analytics queries on behalf of sites
pub struct AnalyticsService {
    cache: SiteClientCache,
}

impl AnalyticsService {
    pub fn new(cache: SiteClientCache) -> Self {
        Self { cache }
    }

    /// Wire a service from configuration: sites from `[sites]`, HTTP
    /// transports against `[provider]`.
    pub fn from_config(config: &Config) -> AnalyticsResult<Self> {
        let token = config
            .provider
            .access_token
            .as_ref()
            .map(|t| t.expose_secret().clone())
            .unwrap_or_default();

        let factory = HttpTransportFactory::new(
            config.provider.endpoints.clone(),
            Arc::new(StaticTokenProvider::new(token)),
            config.provider.request_timeout(),
        )
        .map_err(|e| AnalyticsError::InvalidArgument(format!("HTTP client: {}", e)))?;

        let resolver: Arc<dyn CredentialResolver> =
            Arc::new(ConfigCredentialResolver::new(config.sites.clone()));
        let factory: Arc<dyn TransportFactory> = Arc::new(factory);
        let translator =
            QueryTranslator::new(config.provider.dialect, config.provider.field_policy());

        let mut cache = SiteClientCache::new(resolver, factory, translator);
        if let Some(max_age) = config.cache.max_age() {
            cache = cache.with_eviction(MaxAge(max_age));
        }

        Ok(Self::new(cache))
    }

    /// Run `request` for `site_id`
    pub async fn query(
        &self,
        site_id: &str,
        request: &AnalyticsRequest,
    ) -> AnalyticsResult<NormalizedResult> {
        let client = self.cache.get_client(site_id).await?;
        client.query(request).await
    }

    /// Run a request given in REST body form
    pub async fn query_dto(
        &self,
        site_id: &str,
        dto: QueryRequestDto,
    ) -> AnalyticsResult<NormalizedResult> {
        let request = dto.into_request()?;
        self.query(site_id, &request).await
    }

    pub fn cache(&self) -> &SiteClientCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::data_api::RunReportResponse;
    use crate::provider::{ProviderResponse, ProviderTransport};
    use crate::sites::{SiteCredential, StaticCredentialResolver};
    use crate::test_support::{good_key, CannedTransport};

    struct FixedFactory(Arc<CannedTransport>);

    impl TransportFactory for FixedFactory {
        fn create(
            &self,
            _site_id: &str,
            _credential: &SiteCredential,
        ) -> AnalyticsResult<Arc<dyn ProviderTransport>> {
            Ok(self.0.clone())
        }
    }

    fn service() -> (AnalyticsService, Arc<CannedTransport>) {
        let response: RunReportResponse = serde_json::from_value(serde_json::json!({
            "rows": [
                {"dimensionValues": [{"value": "Chile"}], "metricValues": [{"value": "12"}]},
                {"dimensionValues": [{"value": "Peru"}], "metricValues": [{"value": "5"}]}
            ],
            "rowCount": 2
        }))
        .unwrap();
        let transport = Arc::new(CannedTransport::responding(ProviderResponse::Data(response)));

        let resolver = StaticCredentialResolver::new();
        resolver.insert("blog", "Blog", good_key());

        let cache = SiteClientCache::new(
            Arc::new(resolver),
            Arc::new(FixedFactory(transport.clone())),
            QueryTranslator::default(),
        );
        (AnalyticsService::new(cache), transport)
    }

    #[tokio::test]
    async fn test_query() {
        let (service, transport) = service();
        let request = AnalyticsRequest::new("987")
            .unwrap()
            .with_metrics(&["sessions"])
            .with_dimensions(&["country"]);

        let result = service.query("blog", &request).await.unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.rows[1].get("country"), Some("Peru"));
        assert_eq!(result.rows[1].get("sessions"), Some("5"));
        assert_eq!(transport.requests().len(), 1);
        assert!(service.cache().contains("blog"));
    }

    #[tokio::test]
    async fn test_unknown_site() {
        let (service, transport) = service();
        let request = AnalyticsRequest::new("987").unwrap();

        let err = service.query("shop", &request).await.unwrap_err();
        assert_eq!(err.code(), "CREDENTIAL_MISSING");
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_query_dto() {
        let (service, _) = service();
        let dto: QueryRequestDto = serde_json::from_value(serde_json::json!({
            "propertyId": "987",
            "startDate": "2026-02-01",
            "endDate": "2026-02-07",
            "metrics": ["sessions"],
            "dimensions": ["country"],
            "maxResults": 0
        }))
        .unwrap();

        let result = service.query_dto("blog", dto).await.unwrap();
        assert_eq!(result.rows[0].get("country"), Some("Chile"));
    }

    #[tokio::test]
    async fn test_query_dto_requires_property() {
        let (service, transport) = service();
        let dto: QueryRequestDto =
            serde_json::from_value(serde_json::json!({"metrics": ["sessions"]})).unwrap();

        let err = service.query_dto("blog", dto).await.unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidArgument(_)));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.cache.max_age_secs = Some(60);
        let service = AnalyticsService::from_config(&config).unwrap();
        assert!(service.cache().is_empty());
    }
}
