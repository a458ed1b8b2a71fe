//! Analytics Data API v1beta
//!
//! `properties/{id}:runReport` with expression-tree filters and 0-based
//! `offset`/`limit` paging. Metric filters are numeric; dimension filters are
//! string matches unless a numeric operator is requested.

use super::{RawReport, RawRow};
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::model::FilterOperator;
use crate::query::{FieldKind, FilterMatch, Paging, QueryPlan};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReportRequest {
    /// `properties/<id>`
    pub property: String,
    pub date_ranges: Vec<DateRange>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dimensions: Vec<Dimension>,
    pub metrics: Vec<Metric>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension_filter: Option<FilterExpression>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_filter: Option<FilterExpression>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_bys: Vec<OrderBy>,
    pub offset: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
}

/// Wire form of a filter expression: exactly one field is set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterExpression {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub and_group: Option<FilterExpressionList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterExpressionList {
    pub expressions: Vec<FilterExpression>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub field_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string_filter: Option<StringFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric_filter: Option<NumericFilter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StringFilter {
    pub match_type: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericFilter {
    pub operation: String,
    pub value: NumericValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub int64_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub double_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<MetricOrderBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<DimensionOrderBy>,
    pub desc: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricOrderBy {
    pub metric_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionOrderBy {
    pub dimension_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReportResponse {
    #[serde(default)]
    pub rows: Vec<Row>,
    pub row_count: Option<u64>,
    pub metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    #[serde(default)]
    pub dimension_values: Vec<Value>,
    #[serde(default)]
    pub metric_values: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Value {
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub currency_code: Option<String>,
    pub time_zone: Option<String>,
}

/// Render a plan as a run-report request
pub fn build(plan: &QueryPlan) -> AnalyticsResult<RunReportRequest> {
    let (offset, limit) = match &plan.paging {
        Paging::Offset { offset, page_size } => (*offset, *page_size),
        Paging::Token { .. } => {
            return Err(AnalyticsError::Translation(
                "page tokens are not supported by data_v1beta".to_string(),
            ))
        }
    };

    let dimension_filter = plan
        .dimension_filter
        .as_ref()
        .map(|e| render(e, FieldKind::Dimension))
        .transpose()?;
    let metric_filter = plan
        .metric_filter
        .as_ref()
        .map(|e| render(e, FieldKind::Metric))
        .transpose()?;

    let order_bys = plan
        .order_by
        .iter()
        .map(|o| match o.kind {
            FieldKind::Metric => OrderBy {
                metric: Some(MetricOrderBy {
                    metric_name: o.field.clone(),
                }),
                dimension: None,
                desc: true,
            },
            FieldKind::Dimension => OrderBy {
                metric: None,
                dimension: Some(DimensionOrderBy {
                    dimension_name: o.field.clone(),
                }),
                desc: true,
            },
        })
        .collect();

    Ok(RunReportRequest {
        property: format!("properties/{}", plan.target_id.trim_start_matches("properties/")),
        date_ranges: vec![DateRange {
            start_date: plan.start_date.clone(),
            end_date: plan.end_date.clone(),
        }],
        dimensions: plan
            .dimensions
            .iter()
            .map(|name| Dimension { name: name.clone() })
            .collect(),
        metrics: plan
            .metrics
            .iter()
            .map(|name| Metric { name: name.clone() })
            .collect(),
        dimension_filter,
        metric_filter,
        order_bys,
        offset,
        limit,
    })
}

fn render(expr: &crate::query::FilterExpression, kind: FieldKind) -> AnalyticsResult<FilterExpression> {
    match expr {
        crate::query::FilterExpression::Match(m) => Ok(FilterExpression {
            and_group: None,
            filter: Some(render_filter(m, kind)?),
        }),
        crate::query::FilterExpression::And(children) => Ok(FilterExpression {
            and_group: Some(FilterExpressionList {
                expressions: children
                    .iter()
                    .map(|c| render(c, kind))
                    .collect::<AnalyticsResult<Vec<_>>>()?,
            }),
            filter: None,
        }),
    }
}

fn render_filter(m: &FilterMatch, kind: FieldKind) -> AnalyticsResult<Filter> {
    let op = FilterOperator::parse_or_err(&m.operator)?;
    let numeric = match (kind, op) {
        (FieldKind::Metric, FilterOperator::Exact) => Some(FilterOperator::Equal),
        (FieldKind::Metric, op) if !op.is_numeric() => {
            return Err(AnalyticsError::Translation(format!(
                "metric filter on '{}' needs a numeric operator, got {}",
                m.field, op
            )))
        }
        (_, op) if op.is_numeric() => Some(op),
        _ => None,
    };

    Ok(match numeric {
        Some(op) => Filter {
            field_name: m.field.clone(),
            string_filter: None,
            numeric_filter: Some(NumericFilter {
                operation: op.to_string(),
                value: numeric_value(&m.field, &m.value)?,
            }),
        },
        None => Filter {
            field_name: m.field.clone(),
            string_filter: Some(StringFilter {
                match_type: op.to_string(),
                value: m.value.clone(),
            }),
            numeric_filter: None,
        },
    })
}

fn numeric_value(field: &str, value: &str) -> AnalyticsResult<NumericValue> {
    let value = value.trim();
    if let Ok(int) = value.parse::<i64>() {
        return Ok(NumericValue {
            int64_value: Some(int.to_string()),
            double_value: None,
        });
    }
    value
        .parse::<f64>()
        .map(|double| NumericValue {
            int64_value: None,
            double_value: Some(double),
        })
        .map_err(|_| {
            AnalyticsError::Translation(format!(
                "filter value '{}' for '{}' is not a number",
                value, field
            ))
        })
}

impl RunReportResponse {
    pub(crate) fn into_raw(self) -> RawReport {
        let rows = self
            .rows
            .into_iter()
            .map(|row| RawRow {
                dimension_values: row.dimension_values.into_iter().map(|v| v.value).collect(),
                metric_values: row.metric_values.into_iter().map(|v| v.value).collect(),
            })
            .collect();
        let metadata = self.metadata.unwrap_or_default();

        RawReport {
            rows,
            row_count: self.row_count,
            currency_code: metadata.currency_code,
            time_zone: metadata.time_zone,
            next_page_token: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnalyticsRequest, FilterRequest};
    use crate::query::{Dialect, FieldPolicy};

    fn build_for(request: &AnalyticsRequest) -> AnalyticsResult<RunReportRequest> {
        let plan = QueryPlan::build(request, Dialect::DataV1Beta, FieldPolicy::Strict)?;
        build(&plan)
    }

    #[test]
    fn test_build_basic_request() {
        let request = AnalyticsRequest::new("123456789")
            .unwrap()
            .with_metrics(&["sessions", "activeUsers"])
            .with_dimensions(&["date"])
            .with_date_range("2026-02-09", "2026-02-16")
            .with_sort("activeUsers");

        let native = build_for(&request).unwrap();
        assert_eq!(native.property, "properties/123456789");
        assert_eq!(native.date_ranges.len(), 1);
        assert_eq!(native.metrics.len(), 2);
        assert_eq!(native.metrics[1].name, "activeUsers");
        assert_eq!(native.dimensions[0].name, "date");
        assert_eq!(
            native.order_bys[0].metric.as_ref().unwrap().metric_name,
            "activeUsers"
        );
        assert!(native.order_bys[0].desc);
        assert_eq!(native.offset, 0);
        assert_eq!(native.limit, 10_000);
    }

    #[test]
    fn test_dimension_sort() {
        let request = AnalyticsRequest::new("1")
            .unwrap()
            .with_dimensions(&["date"])
            .with_sort("date");
        let native = build_for(&request).unwrap();
        assert_eq!(
            native.order_bys[0].dimension.as_ref().unwrap().dimension_name,
            "date"
        );
        assert!(native.order_bys[0].metric.is_none());
    }

    #[test]
    fn test_single_dimension_filter() {
        let mut request = AnalyticsRequest::new("1").unwrap();
        request.add_dimension_filter(FilterRequest::exact("country", "Chile").unwrap());

        let native = build_for(&request).unwrap();
        let expr = native.dimension_filter.unwrap();
        assert!(expr.and_group.is_none());
        let filter = expr.filter.unwrap();
        assert_eq!(filter.field_name, "country");
        let string = filter.string_filter.unwrap();
        assert_eq!(string.match_type, "EXACT");
        assert_eq!(string.value, "Chile");
    }

    #[test]
    fn test_dimension_and_group_uses_dimension_filters() {
        let mut request = AnalyticsRequest::new("1").unwrap();
        request.add_dimension_filter(FilterRequest::exact("country", "Chile").unwrap());
        request.add_dimension_filter(
            FilterRequest::new("city", Some("BEGINS_WITH".into()), "San").unwrap(),
        );
        request.add_metric_filter(
            FilterRequest::new("sessions", Some("GREATER_THAN".into()), "10").unwrap(),
        );

        let native = build_for(&request).unwrap();
        let group = native.dimension_filter.unwrap().and_group.unwrap();
        let fields: Vec<_> = group
            .expressions
            .iter()
            .map(|e| e.filter.as_ref().unwrap().field_name.as_str())
            .collect();
        assert_eq!(fields, vec!["country", "city"]);

        let metric = native.metric_filter.unwrap().filter.unwrap();
        let numeric = metric.numeric_filter.unwrap();
        assert_eq!(numeric.operation, "GREATER_THAN");
        assert_eq!(numeric.value.int64_value.as_deref(), Some("10"));
    }

    #[test]
    fn test_exact_metric_filter_is_numeric_equal() {
        let mut request = AnalyticsRequest::new("1").unwrap();
        request.add_metric_filter(FilterRequest::exact("bounceRate", "0.5").unwrap());

        let native = build_for(&request).unwrap();
        let numeric = native.metric_filter.unwrap().filter.unwrap().numeric_filter.unwrap();
        assert_eq!(numeric.operation, "EQUAL");
        assert_eq!(numeric.value.double_value, Some(0.5));
    }

    #[test]
    fn test_metric_filter_rejects_string_operator_and_bad_number() {
        let mut request = AnalyticsRequest::new("1").unwrap();
        request.add_metric_filter(
            FilterRequest::new("sessions", Some("CONTAINS".into()), "1").unwrap(),
        );
        assert!(matches!(build_for(&request), Err(AnalyticsError::Translation(_))));

        let mut request = AnalyticsRequest::new("1").unwrap();
        request.add_metric_filter(FilterRequest::exact("sessions", "many").unwrap());
        assert!(matches!(build_for(&request), Err(AnalyticsError::Translation(_))));
    }

    #[test]
    fn test_serialized_shape() {
        let mut request = AnalyticsRequest::new("1")
            .unwrap()
            .with_date_range("2026-02-09", "2026-02-16");
        request.add_dimension_filter(FilterRequest::exact("country", "Chile").unwrap());

        let json = serde_json::to_value(build_for(&request).unwrap()).unwrap();
        assert_eq!(json["dateRanges"][0]["startDate"], "2026-02-09");
        assert_eq!(json["metrics"][0]["name"], "sessions");
        assert_eq!(
            json["dimensionFilter"]["filter"]["stringFilter"]["matchType"],
            "EXACT"
        );
        assert!(json.get("dimensions").is_none());
        assert!(json.get("metricFilter").is_none());
    }

    #[test]
    fn test_into_raw_with_metadata() {
        let response: RunReportResponse = serde_json::from_value(serde_json::json!({
            "dimensionHeaders": [{"name": "date"}],
            "metricHeaders": [{"name": "sessions", "type": "TYPE_INTEGER"}],
            "rows": [{
                "dimensionValues": [{"value": "20260210"}],
                "metricValues": [{"value": "42"}]
            }],
            "rowCount": 1,
            "metadata": {"currencyCode": "USD", "timeZone": "America/Santiago"},
            "kind": "analyticsData#runReport"
        }))
        .unwrap();

        let raw = response.into_raw();
        assert_eq!(raw.rows[0].dimension_values, vec!["20260210"]);
        assert_eq!(raw.rows[0].metric_values, vec!["42"]);
        assert_eq!(raw.currency_code.as_deref(), Some("USD"));
        assert_eq!(raw.time_zone.as_deref(), Some("America/Santiago"));
    }
}
