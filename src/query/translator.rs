//! Query Translator
//!
//! Turns an [`AnalyticsRequest`] into the native request of one provider
//! generation, runs it through a transport and flattens the answer.
//!
//! # Pipeline
//!
//! ```text
//! AnalyticsRequest → QueryPlan → ProviderRequest → transport → ProviderResponse → NormalizedResult
//! ```

use super::dialect::Dialect;
use super::plan::{FieldPolicy, QueryPlan};
use super::result::{flatten_rows, NormalizedResult};
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::model::AnalyticsRequest;
use crate::provider::{
    core_reporting, data_api, reporting_v4, ProviderRequest, ProviderResponse, ProviderTransport,
};
use std::time::Instant;
use tracing::Instrument;

/// Stateless translator for one dialect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryTranslator {
    dialect: Dialect,
    policy: FieldPolicy,
}

impl QueryTranslator {
    pub fn new(dialect: Dialect, policy: FieldPolicy) -> Self {
        Self { dialect, policy }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn policy(&self) -> FieldPolicy {
        self.policy
    }

    /// Dialect-neutral plan for `request`
    pub fn plan(&self, request: &AnalyticsRequest) -> AnalyticsResult<QueryPlan> {
        QueryPlan::build(request, self.dialect, self.policy)
    }

    /// Native request for `request`
    pub fn build_request(&self, request: &AnalyticsRequest) -> AnalyticsResult<ProviderRequest> {
        let plan = self.plan(request)?;
        self.render(&plan)
    }

    fn render(&self, plan: &QueryPlan) -> AnalyticsResult<ProviderRequest> {
        let native = match self.dialect {
            Dialect::CoreReportingV3 => ProviderRequest::CoreReporting(core_reporting::build(plan)?),
            Dialect::ReportingV4 => ProviderRequest::ReportingV4(reporting_v4::build(plan)?),
            Dialect::DataV1Beta => ProviderRequest::Data(data_api::build(plan)?),
        };

        tracing::debug!(dialect = %self.dialect, request = ?native, "Built provider request");
        Ok(native)
    }

    /// Flatten a provider response into name/value rows
    pub fn flatten(
        &self,
        request: &AnalyticsRequest,
        response: ProviderResponse,
    ) -> AnalyticsResult<NormalizedResult> {
        let plan = self.plan(request)?;
        self.flatten_plan(&plan, response)
    }

    fn flatten_plan(
        &self,
        plan: &QueryPlan,
        response: ProviderResponse,
    ) -> AnalyticsResult<NormalizedResult> {
        let generation = response.generation();
        if generation != self.dialect.to_string() {
            return Err(AnalyticsError::Translation(format!(
                "{} response cannot be read as {}",
                generation, self.dialect
            )));
        }

        let raw = response.into_raw(plan.dimensions.len());
        Ok(flatten_rows(
            &plan.requested_dimensions,
            &plan.requested_metrics,
            raw,
        ))
    }

    /// Build, execute and flatten in one step
    pub async fn translate(
        &self,
        request: &AnalyticsRequest,
        transport: &dyn ProviderTransport,
    ) -> AnalyticsResult<NormalizedResult> {
        let query_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!(
            "query",
            %query_id,
            target_id = request.target_id(),
            dialect = %self.dialect
        );

        async move {
            let start = Instant::now();
            let plan = self.plan(request)?;
            let native = self.render(&plan)?;

            let response = transport.execute(&native).await?;
            let result = self.flatten_plan(&plan, response)?;

            tracing::debug!(
                rows = result.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Query complete"
            );
            Ok(result)
        }
        .instrument(span)
        .await
    }
}
