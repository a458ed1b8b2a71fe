//! Core Reporting API v3
//!
//! Requests are flat query strings (`ids=ga:123&metrics=ga:sessions&...`).
//! Filters are a single string of `;`-joined (AND) conditions such as
//! `ga:country==Chile;ga:sessions>10`. Rows come back as positional string
//! arrays described by `columnHeaders`.

use super::{RawReport, RawRow};
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::model::FilterOperator;
use crate::query::{FilterExpression, Paging, QueryPlan};
use serde::{Deserialize, Serialize};

/// `GET /analytics/v3/data/ga` query parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreReportingRequest {
    pub ids: String,
    #[serde(rename = "start-date")]
    pub start_date: String,
    #[serde(rename = "end-date")]
    pub end_date: String,
    pub metrics: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,
    /// 1-based
    #[serde(rename = "start-index")]
    pub start_index: u32,
    #[serde(rename = "max-results")]
    pub max_results: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreReportingResponse {
    #[serde(default)]
    pub column_headers: Vec<ColumnHeader>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
    pub total_results: Option<u64>,
    pub next_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnHeader {
    pub name: String,
    /// `DIMENSION` or `METRIC`
    pub column_type: String,
}

/// Render a plan as a v3 request
pub fn build(plan: &QueryPlan) -> AnalyticsResult<CoreReportingRequest> {
    let (start_index, max_results) = match &plan.paging {
        Paging::Offset { offset, page_size } => (offset.saturating_add(1), *page_size),
        Paging::Token { .. } => {
            return Err(AnalyticsError::Translation(
                "page tokens are not supported by core_reporting_v3".to_string(),
            ))
        }
    };

    let mut conditions = Vec::new();
    if let Some(expr) = &plan.filters_expression {
        conditions.push(expr.clone());
    }
    if let Some(expr) = &plan.dimension_filter {
        conditions.push(render_filters(expr)?);
    }
    if let Some(expr) = &plan.metric_filter {
        conditions.push(render_filters(expr)?);
    }

    Ok(CoreReportingRequest {
        ids: format!("ga:{}", plan.target_id.trim_start_matches("ga:")),
        start_date: plan.start_date.clone(),
        end_date: plan.end_date.clone(),
        metrics: plan.metrics.join(","),
        dimensions: (!plan.dimensions.is_empty()).then(|| plan.dimensions.join(",")),
        sort: plan.order_by.as_ref().map(|o| format!("-{}", o.field)),
        filters: (!conditions.is_empty()).then(|| conditions.join(";")),
        segment: plan.segment.clone(),
        start_index,
        max_results,
    })
}

/// `;`-joined conditions for every match in the expression
fn render_filters(expr: &FilterExpression) -> AnalyticsResult<String> {
    let conditions = expr
        .matches()
        .into_iter()
        .map(|m| {
            let op = FilterOperator::parse_or_err(&m.operator)?;
            let (symbol, operand) = match op {
                FilterOperator::Exact | FilterOperator::Equal => ("==", m.value.clone()),
                FilterOperator::Contains => ("=@", m.value.clone()),
                FilterOperator::PartialRegexp => ("=~", m.value.clone()),
                FilterOperator::FullRegexp => ("=~", format!("^(?:{})$", m.value)),
                FilterOperator::BeginsWith => ("=~", format!("^{}", escape_regex(&m.value))),
                FilterOperator::EndsWith => ("=~", format!("{}$", escape_regex(&m.value))),
                FilterOperator::LessThan => ("<", m.value.clone()),
                FilterOperator::LessThanOrEqual => ("<=", m.value.clone()),
                FilterOperator::GreaterThan => (">", m.value.clone()),
                FilterOperator::GreaterThanOrEqual => (">=", m.value.clone()),
            };
            Ok(format!("{}{}{}", m.field, symbol, escape_value(&operand)))
        })
        .collect::<AnalyticsResult<Vec<_>>>()?;

    Ok(conditions.join(";"))
}

/// Escape the characters the v3 filter grammar reserves
fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, ',' | ';') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn escape_regex(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if "\\.+*?()|[]{}^$".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

impl CoreReportingResponse {
    pub(crate) fn into_raw(self, dimension_count: usize) -> RawReport {
        let is_dimension: Vec<bool> = if self.column_headers.is_empty() {
            Vec::new()
        } else {
            self.column_headers
                .iter()
                .map(|h| h.column_type.eq_ignore_ascii_case("DIMENSION"))
                .collect()
        };

        let rows = self
            .rows
            .into_iter()
            .map(|cells| {
                let mut row = RawRow::default();
                for (i, cell) in cells.into_iter().enumerate() {
                    let dimension = match is_dimension.get(i) {
                        Some(flag) => *flag,
                        None => i < dimension_count,
                    };
                    if dimension {
                        row.dimension_values.push(cell);
                    } else {
                        row.metric_values.push(cell);
                    }
                }
                row
            })
            .collect();

        RawReport {
            rows,
            row_count: self.total_results,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnalyticsRequest, FilterRequest};
    use crate::query::{Dialect, FieldPolicy};

    fn plan(request: &AnalyticsRequest) -> QueryPlan {
        QueryPlan::build(request, Dialect::CoreReportingV3, FieldPolicy::Strict).unwrap()
    }

    #[test]
    fn test_build_basic_request() {
        let request = AnalyticsRequest::new("12345")
            .unwrap()
            .with_metrics(&["sessions", "ga:users"])
            .with_dimensions(&["date"])
            .with_date_range("2026-02-01", "2026-02-07")
            .with_sort("sessions");

        let native = build(&plan(&request)).unwrap();
        assert_eq!(native.ids, "ga:12345");
        assert_eq!(native.metrics, "ga:sessions,ga:users");
        assert_eq!(native.dimensions.as_deref(), Some("ga:date"));
        assert_eq!(native.sort.as_deref(), Some("-ga:sessions"));
        assert_eq!(native.start_index, 1);
        assert_eq!(native.max_results, 1_000);
        assert!(native.filters.is_none());
    }

    #[test]
    fn test_start_index_is_one_based() {
        let mut request = AnalyticsRequest::new("12345").unwrap();
        #[allow(deprecated)]
        request.set_start_index(100);
        request.set_max_results(50);

        let native = build(&plan(&request)).unwrap();
        assert_eq!(native.start_index, 101);
        assert_eq!(native.max_results, 50);
    }

    #[test]
    fn test_filters_string() {
        let mut request = AnalyticsRequest::new("12345").unwrap();
        request.set_filters_expression("ga:medium==organic");
        request.add_dimension_filter(FilterRequest::exact("country", "Chile").unwrap());
        request.add_dimension_filter(
            FilterRequest::new("pagePath", Some("BEGINS_WITH".into()), "/blog.v2").unwrap(),
        );
        request.add_metric_filter(
            FilterRequest::new("sessions", Some("GREATER_THAN".into()), "10").unwrap(),
        );

        let native = build(&plan(&request)).unwrap();
        assert_eq!(
            native.filters.as_deref(),
            Some("ga:medium==organic;ga:country==Chile;ga:pagePath=~^/blog\\.v2;ga:sessions>10")
        );
    }

    #[test]
    fn test_reserved_characters_escaped() {
        assert_eq!(escape_value("a,b;c"), "a\\,b\\;c");
    }

    #[test]
    fn test_unknown_operator_fails() {
        let mut request = AnalyticsRequest::new("12345").unwrap();
        request.add_dimension_filter(
            FilterRequest::new("country", Some("SOUNDS_LIKE".into()), "x").unwrap(),
        );
        assert!(matches!(
            build(&plan(&request)),
            Err(AnalyticsError::Translation(_))
        ));
    }

    #[test]
    fn test_into_raw_splits_by_headers() {
        let response: CoreReportingResponse = serde_json::from_value(serde_json::json!({
            "columnHeaders": [
                {"name": "ga:date", "columnType": "DIMENSION"},
                {"name": "ga:sessions", "columnType": "METRIC"}
            ],
            "rows": [["20260201", "42"], ["20260202", "17"]],
            "totalResults": 2
        }))
        .unwrap();

        let raw = response.into_raw(5);
        assert_eq!(raw.row_count, Some(2));
        assert_eq!(raw.rows[1].dimension_values, vec!["20260202"]);
        assert_eq!(raw.rows[1].metric_values, vec!["17"]);
    }

    #[test]
    fn test_into_raw_without_headers_uses_dimension_count() {
        let response = CoreReportingResponse {
            rows: vec![vec!["20260201".into(), "mobile".into(), "42".into()]],
            ..Default::default()
        };

        let raw = response.into_raw(2);
        assert_eq!(raw.rows[0].dimension_values, vec!["20260201", "mobile"]);
        assert_eq!(raw.rows[0].metric_values, vec!["42"]);
    }
}
