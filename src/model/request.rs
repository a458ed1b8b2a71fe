//! Analytics Request
//!
//! The version-agnostic query model. It captures everything a caller may ask
//! for and applies defaults on read:
//!
//! - no metrics → [`DEFAULT_METRIC`]
//! - no start/end date → today, computed at the time of the call
//!
//! Setters only store values. Provider-specific limits (for example the
//! legacy "at most 10 metrics and 7 dimensions") are left to the provider.

use super::filter::FilterRequest;
use crate::error::{AnalyticsError, AnalyticsResult};
use chrono::{Local, NaiveDate};

/// Date format expected by every supported provider generation
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Metric queried when the caller asks for none
pub const DEFAULT_METRIC: &str = "sessions";

/// A query against one analytics property/profile
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsRequest {
    target_id: String,
    metrics: Vec<String>,
    dimensions: Vec<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    sort: Option<String>,
    segment: Option<String>,
    filters_expression: Option<String>,
    dimension_filters: Vec<FilterRequest>,
    metric_filters: Vec<FilterRequest>,
    start_index: u32,
    page_token: Option<String>,
    max_results: Option<u32>,
}

impl AnalyticsRequest {
    /// Create a request for the given property/profile id.
    ///
    /// Fails with [`AnalyticsError::InvalidArgument`] when the id is empty.
    pub fn new(target_id: impl Into<String>) -> AnalyticsResult<Self> {
        let target_id = target_id.into();
        if target_id.trim().is_empty() {
            return Err(AnalyticsError::InvalidArgument(
                "target id cannot be null or empty".to_string(),
            ));
        }

        Ok(Self {
            target_id,
            metrics: Vec::new(),
            dimensions: Vec::new(),
            start_date: None,
            end_date: None,
            sort: None,
            segment: None,
            filters_expression: None,
            dimension_filters: Vec::new(),
            metric_filters: Vec::new(),
            start_index: 0,
            page_token: None,
            max_results: None,
        })
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// Requested metrics, or the single default metric when none were set
    pub fn metrics(&self) -> Vec<String> {
        if self.metrics.is_empty() {
            vec![DEFAULT_METRIC.to_string()]
        } else {
            self.metrics.clone()
        }
    }

    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    /// Start date, or today in [`DATE_FORMAT`]
    pub fn start_date(&self) -> String {
        self.start_date_with(DATE_FORMAT)
    }

    /// End date, or today in [`DATE_FORMAT`]
    pub fn end_date(&self) -> String {
        self.end_date_with(DATE_FORMAT)
    }

    /// Start date, or today rendered with `format`
    pub fn start_date_with(&self, format: &str) -> String {
        resolve_date(self.start_date.as_deref(), format, today())
    }

    /// End date, or today rendered with `format`
    pub fn end_date_with(&self, format: &str) -> String {
        resolve_date(self.end_date.as_deref(), format, today())
    }

    pub fn sort(&self) -> Option<&str> {
        self.sort.as_deref()
    }

    pub fn segment(&self) -> Option<&str> {
        self.segment.as_deref()
    }

    pub fn filters_expression(&self) -> Option<&str> {
        self.filters_expression.as_deref()
    }

    pub fn dimension_filters(&self) -> &[FilterRequest] {
        &self.dimension_filters
    }

    pub fn metric_filters(&self) -> &[FilterRequest] {
        &self.metric_filters
    }

    /// Zero-based row offset
    #[deprecated(note = "use page_token for providers that support it")]
    pub fn start_index(&self) -> u32 {
        self.start_index
    }

    pub fn page_token(&self) -> Option<&str> {
        self.page_token.as_deref()
    }

    /// Page size, `None` meaning the provider default
    pub fn max_results(&self) -> Option<u32> {
        self.max_results
    }

    pub(crate) fn offset(&self) -> u32 {
        self.start_index
    }

    // ---- setters ----

    pub fn set_metrics<I, S>(&mut self, metrics: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metrics = metrics.into_iter().map(Into::into).collect();
    }

    /// Set metrics from a comma-separated list
    pub fn set_metrics_csv(&mut self, metrics: &str) {
        self.metrics = split_csv(metrics);
    }

    pub fn set_dimensions<I, S>(&mut self, dimensions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dimensions = dimensions.into_iter().map(Into::into).collect();
    }

    /// Set dimensions from a comma-separated list
    pub fn set_dimensions_csv(&mut self, dimensions: &str) {
        self.dimensions = split_csv(dimensions);
    }

    pub fn set_start_date(&mut self, date: impl Into<String>) {
        self.start_date = Some(date.into());
    }

    pub fn set_end_date(&mut self, date: impl Into<String>) {
        self.end_date = Some(date.into());
    }

    pub fn set_sort(&mut self, sort: impl Into<String>) {
        self.sort = Some(sort.into()).filter(|s: &String| !s.is_empty());
    }

    pub fn set_segment(&mut self, segment: impl Into<String>) {
        self.segment = Some(segment.into()).filter(|s: &String| !s.is_empty());
    }

    pub fn set_filters_expression(&mut self, expression: impl Into<String>) {
        self.filters_expression = Some(expression.into()).filter(|s: &String| !s.is_empty());
    }

    pub fn add_dimension_filter(&mut self, filter: FilterRequest) {
        self.dimension_filters.push(filter);
    }

    pub fn add_metric_filter(&mut self, filter: FilterRequest) {
        self.metric_filters.push(filter);
    }

    #[deprecated(note = "use set_page_token for providers that support it")]
    pub fn set_start_index(&mut self, start_index: u32) {
        self.start_index = start_index;
    }

    pub fn set_page_token(&mut self, token: impl Into<String>) {
        self.page_token = Some(token.into()).filter(|s: &String| !s.is_empty());
    }

    pub fn set_max_results(&mut self, max_results: u32) {
        self.max_results = Some(max_results);
    }

    // ---- chaining ----

    /// Set metrics, builder style
    pub fn with_metrics(mut self, metrics: &[&str]) -> Self {
        self.set_metrics(metrics.iter().copied());
        self
    }

    /// Set dimensions, builder style
    pub fn with_dimensions(mut self, dimensions: &[&str]) -> Self {
        self.set_dimensions(dimensions.iter().copied());
        self
    }

    /// Set the date range, builder style
    pub fn with_date_range(mut self, start: &str, end: &str) -> Self {
        self.set_start_date(start);
        self.set_end_date(end);
        self
    }

    /// Set the descending sort field, builder style
    pub fn with_sort(mut self, sort: &str) -> Self {
        self.set_sort(sort);
        self
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Stored date when present and non-empty, otherwise `today` in `format`
fn resolve_date(value: Option<&str>, format: &str, today: NaiveDate) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => today.format(format).to_string(),
    }
}

fn split_csv(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
