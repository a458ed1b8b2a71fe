//! Request DTO
//!
//! The JSON body accepted by the host application's query endpoint:
//!
//! ```json
//! {
//!   "propertyId": "123456789",
//!   "startDate": "2026-02-09",
//!   "endDate": "2026-02-16",
//!   "metrics": ["sessions", "activeUsers"],
//!   "dimensions": ["date"],
//!   "filters": { "dimension": [{ "field": "country", "value": "Chile" }] },
//!   "maxResults": 100
//! }
//! ```

use super::filter::FilterRequest;
use super::request::AnalyticsRequest;
use crate::error::{AnalyticsError, AnalyticsResult};
use serde::{Deserialize, Serialize};

/// Query body as sent by callers
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequestDto {
    pub property_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default)]
    pub metrics: Vec<String>,
    #[serde(default)]
    pub dimensions: Vec<String>,
    pub filters: Option<FiltersDto>,
    pub sort: Option<String>,
    pub max_results: Option<i64>,
    pub page_token: Option<String>,
    pub start_index: Option<u32>,
}

/// Dimension and metric filter lists
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FiltersDto {
    #[serde(default)]
    pub dimension: Vec<FilterDto>,
    #[serde(default)]
    pub metric: Vec<FilterDto>,
}

/// A single filter
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilterDto {
    pub field: String,
    pub operator: Option<String>,
    #[serde(default)]
    pub value: String,
}

impl FilterDto {
    fn to_filter(&self) -> AnalyticsResult<FilterRequest> {
        FilterRequest::new(self.field.clone(), self.operator.clone(), self.value.clone())
    }
}

impl QueryRequestDto {
    /// Convert into a query model.
    ///
    /// `propertyId` is required; `maxResults` is only applied when positive.
    pub fn into_request(self) -> AnalyticsResult<AnalyticsRequest> {
        let property_id = self
            .property_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AnalyticsError::InvalidArgument("propertyId is required".to_string()))?;

        let mut request = AnalyticsRequest::new(property_id)?;

        if let Some(start) = self.start_date {
            request.set_start_date(start);
        }
        if let Some(end) = self.end_date {
            request.set_end_date(end);
        }
        if !self.metrics.is_empty() {
            request.set_metrics(self.metrics);
        }
        if !self.dimensions.is_empty() {
            request.set_dimensions(self.dimensions);
        }

        if let Some(filters) = self.filters {
            for filter in &filters.dimension {
                request.add_dimension_filter(filter.to_filter()?);
            }
            for filter in &filters.metric {
                request.add_metric_filter(filter.to_filter()?);
            }
        }

        if let Some(sort) = self.sort {
            request.set_sort(sort);
        }
        if let Some(max) = self.max_results.filter(|m| *m > 0) {
            request.set_max_results(u32::try_from(max).unwrap_or(u32::MAX));
        }
        if let Some(token) = self.page_token {
            request.set_page_token(token);
        }
        if let Some(index) = self.start_index {
            #[allow(deprecated)]
            request.set_start_index(index);
        }

        Ok(request)
    }
}
