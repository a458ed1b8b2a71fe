//! Analytics Reporting API v4
//!
//! `reports:batchGet` takes a list of report requests; one is sent per query.
//! Filters are clause lists combined with `AND`. Paging uses `pageToken`,
//! which for this API is the row offset as a decimal string.

use super::{RawReport, RawRow};
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::model::FilterOperator;
use crate::query::{FilterExpression, Paging, QueryPlan};
use serde::{Deserialize, Serialize};

/// Dimension the API requires whenever segments are requested
const SEGMENT_DIMENSION: &str = "ga:segment";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGetRequest {
    pub report_requests: Vec<ReportRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub view_id: String,
    pub date_ranges: Vec<DateRange>,
    pub metrics: Vec<Metric>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dimensions: Vec<Dimension>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_bys: Vec<OrderBy>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dimension_filter_clauses: Vec<DimensionFilterClause>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metric_filter_clauses: Vec<MetricFilterClause>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters_expression: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub segments: Vec<Segment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
    pub page_size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub expression: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBy {
    pub field_name: String,
    pub sort_order: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionFilterClause {
    pub operator: String,
    pub filters: Vec<DimensionFilter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionFilter {
    pub dimension_name: String,
    pub operator: String,
    pub expressions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricFilterClause {
    pub operator: String,
    pub filters: Vec<MetricFilter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricFilter {
    pub metric_name: String,
    pub operator: String,
    pub comparison_value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub segment_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchGetResponse {
    #[serde(default)]
    pub reports: Vec<Report>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(default)]
    pub data: ReportData,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    #[serde(default)]
    pub rows: Vec<ReportRow>,
    pub row_count: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(default)]
    pub dimensions: Vec<String>,
    /// One entry per date range
    #[serde(default)]
    pub metrics: Vec<DateRangeValues>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRangeValues {
    #[serde(default)]
    pub values: Vec<String>,
}

/// Render a plan as a v4 batch request
pub fn build(plan: &QueryPlan) -> AnalyticsResult<BatchGetRequest> {
    let (page_token, page_size) = match &plan.paging {
        Paging::Token { token, page_size } => (Some(token.clone()), *page_size),
        Paging::Offset { offset, page_size } => {
            ((*offset > 0).then(|| offset.to_string()), *page_size)
        }
    };

    let mut dimensions: Vec<Dimension> = plan
        .dimensions
        .iter()
        .map(|name| Dimension { name: name.clone() })
        .collect();
    let segments = match &plan.segment {
        Some(id) => {
            if !plan.dimensions.iter().any(|d| d == SEGMENT_DIMENSION) {
                dimensions.push(Dimension {
                    name: SEGMENT_DIMENSION.to_string(),
                });
            }
            vec![Segment {
                segment_id: id.clone(),
            }]
        }
        None => Vec::new(),
    };

    let dimension_filter_clauses = match &plan.dimension_filter {
        Some(expr) => vec![DimensionFilterClause {
            operator: "AND".to_string(),
            filters: dimension_filters(expr)?,
        }],
        None => Vec::new(),
    };
    let metric_filter_clauses = match &plan.metric_filter {
        Some(expr) => vec![MetricFilterClause {
            operator: "AND".to_string(),
            filters: metric_filters(expr)?,
        }],
        None => Vec::new(),
    };

    let request = ReportRequest {
        view_id: plan.target_id.trim_start_matches("ga:").to_string(),
        date_ranges: vec![DateRange {
            start_date: plan.start_date.clone(),
            end_date: plan.end_date.clone(),
        }],
        metrics: plan
            .metrics
            .iter()
            .map(|m| Metric {
                expression: m.clone(),
            })
            .collect(),
        dimensions,
        order_bys: plan
            .order_by
            .iter()
            .map(|o| OrderBy {
                field_name: o.field.clone(),
                sort_order: "DESCENDING".to_string(),
            })
            .collect(),
        dimension_filter_clauses,
        metric_filter_clauses,
        filters_expression: plan.filters_expression.clone(),
        segments,
        page_token,
        page_size,
    };

    Ok(BatchGetRequest {
        report_requests: vec![request],
    })
}

fn dimension_filters(expr: &FilterExpression) -> AnalyticsResult<Vec<DimensionFilter>> {
    expr.matches()
        .into_iter()
        .map(|m| {
            let op = FilterOperator::parse_or_err(&m.operator)?;
            let (operator, expression) = match op {
                FilterOperator::Exact => ("EXACT", m.value.clone()),
                FilterOperator::BeginsWith => ("BEGINS_WITH", m.value.clone()),
                FilterOperator::EndsWith => ("ENDS_WITH", m.value.clone()),
                FilterOperator::Contains => ("PARTIAL", m.value.clone()),
                FilterOperator::PartialRegexp => ("REGEXP", m.value.clone()),
                FilterOperator::FullRegexp => ("REGEXP", format!("^(?:{})$", m.value)),
                FilterOperator::Equal => ("NUMERIC_EQUAL", m.value.clone()),
                FilterOperator::LessThan => ("NUMERIC_LESS_THAN", m.value.clone()),
                FilterOperator::GreaterThan => ("NUMERIC_GREATER_THAN", m.value.clone()),
                other => return Err(unsupported(other, "dimension")),
            };
            Ok(DimensionFilter {
                dimension_name: m.field.clone(),
                operator: operator.to_string(),
                expressions: vec![expression],
            })
        })
        .collect()
}

fn metric_filters(expr: &FilterExpression) -> AnalyticsResult<Vec<MetricFilter>> {
    expr.matches()
        .into_iter()
        .map(|m| {
            let operator = match FilterOperator::parse_or_err(&m.operator)? {
                FilterOperator::Exact | FilterOperator::Equal => "EQUAL",
                FilterOperator::LessThan => "LESS_THAN",
                FilterOperator::GreaterThan => "GREATER_THAN",
                other => return Err(unsupported(other, "metric")),
            };
            Ok(MetricFilter {
                metric_name: m.field.clone(),
                operator: operator.to_string(),
                comparison_value: m.value.clone(),
            })
        })
        .collect()
}

fn unsupported(op: FilterOperator, kind: &str) -> AnalyticsError {
    AnalyticsError::Translation(format!(
        "operator {} is not supported for {} filters by reporting_v4",
        op, kind
    ))
}

impl BatchGetResponse {
    pub(crate) fn into_raw(self) -> RawReport {
        let Some(report) = self.reports.into_iter().next() else {
            return RawReport::default();
        };

        let rows = report
            .data
            .rows
            .into_iter()
            .map(|row| RawRow {
                dimension_values: row.dimensions,
                metric_values: row
                    .metrics
                    .into_iter()
                    .next()
                    .map(|m| m.values)
                    .unwrap_or_default(),
            })
            .collect();

        RawReport {
            rows,
            row_count: report.data.row_count,
            next_page_token: report.next_page_token,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnalyticsRequest, FilterRequest};
    use crate::query::{Dialect, FieldPolicy};

    fn build_for(request: &AnalyticsRequest) -> AnalyticsResult<ReportRequest> {
        let plan = QueryPlan::build(request, Dialect::ReportingV4, FieldPolicy::Strict)?;
        Ok(build(&plan)?.report_requests.remove(0))
    }

    #[test]
    fn test_build_basic_request() {
        let request = AnalyticsRequest::new("ga:998877")
            .unwrap()
            .with_metrics(&["sessions"])
            .with_dimensions(&["country"])
            .with_sort("sessions");

        let native = build_for(&request).unwrap();
        assert_eq!(native.view_id, "998877");
        assert_eq!(native.metrics[0].expression, "ga:sessions");
        assert_eq!(native.dimensions[0].name, "ga:country");
        assert_eq!(native.order_bys[0].sort_order, "DESCENDING");
        assert_eq!(native.page_token, None);
        assert_eq!(native.page_size, 1_000);
    }

    #[test]
    fn test_offset_becomes_page_token() {
        let mut request = AnalyticsRequest::new("1").unwrap();
        #[allow(deprecated)]
        request.set_start_index(2_000);
        let native = build_for(&request).unwrap();
        assert_eq!(native.page_token.as_deref(), Some("2000"));
    }

    #[test]
    fn test_explicit_page_token_wins_over_start_index() {
        let mut request = AnalyticsRequest::new("1").unwrap();
        #[allow(deprecated)]
        request.set_start_index(2_000);
        request.set_page_token("next-page");
        let native = build_for(&request).unwrap();
        assert_eq!(native.page_token.as_deref(), Some("next-page"));
    }

    #[test]
    fn test_filter_clauses() {
        let mut request = AnalyticsRequest::new("1").unwrap();
        request.add_dimension_filter(
            FilterRequest::new("pagePath", Some("CONTAINS".into()), "blog").unwrap(),
        );
        request.add_metric_filter(FilterRequest::exact("sessions", "3").unwrap());

        let native = build_for(&request).unwrap();
        let dim = &native.dimension_filter_clauses[0];
        assert_eq!(dim.operator, "AND");
        assert_eq!(dim.filters[0].operator, "PARTIAL");
        assert_eq!(dim.filters[0].expressions, vec!["blog"]);

        let metric = &native.metric_filter_clauses[0].filters[0];
        assert_eq!(metric.metric_name, "ga:sessions");
        assert_eq!(metric.operator, "EQUAL");
        assert_eq!(metric.comparison_value, "3");
    }

    #[test]
    fn test_unsupported_metric_operator() {
        let mut request = AnalyticsRequest::new("1").unwrap();
        request.add_metric_filter(
            FilterRequest::new("sessions", Some("LESS_THAN_OR_EQUAL".into()), "3").unwrap(),
        );
        assert!(matches!(
            build_for(&request),
            Err(AnalyticsError::Translation(_))
        ));
    }

    #[test]
    fn test_segment_adds_segment_dimension() {
        let mut request = AnalyticsRequest::new("1").unwrap().with_dimensions(&["date"]);
        request.set_segment("gaid::-3");

        let native = build_for(&request).unwrap();
        assert_eq!(native.segments[0].segment_id, "gaid::-3");
        let names: Vec<_> = native.dimensions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["ga:date", "ga:segment"]);
    }

    #[test]
    fn test_into_raw() {
        let response: BatchGetResponse = serde_json::from_value(serde_json::json!({
            "reports": [{
                "columnHeader": {"dimensions": ["ga:date"]},
                "data": {
                    "rows": [{"dimensions": ["20260210"], "metrics": [{"values": ["42", "7"]}]}],
                    "rowCount": 1
                },
                "nextPageToken": "1000"
            }]
        }))
        .unwrap();

        let raw = response.into_raw();
        assert_eq!(raw.rows[0].dimension_values, vec!["20260210"]);
        assert_eq!(raw.rows[0].metric_values, vec!["42", "7"]);
        assert_eq!(raw.row_count, Some(1));
        assert_eq!(raw.next_page_token.as_deref(), Some("1000"));
    }

    #[test]
    fn test_into_raw_empty() {
        assert_eq!(BatchGetResponse::default().into_raw(), RawReport::default());
    }
}
