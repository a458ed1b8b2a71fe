//! Query Plan
//!
//! Dialect-neutral form of a request after defaults, field qualification and
//! the unsupported-field policy have been applied. Provider modules render a
//! plan into their native request.

use super::dialect::Dialect;
use super::expression::{build_expression, FilterExpression};
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::model::AnalyticsRequest;
use serde::{Deserialize, Serialize};

/// What to do with request fields the target generation cannot express
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldPolicy {
    /// Fail with a translation error
    #[default]
    Strict,
    /// Drop the field and log a warning
    Lenient,
}

/// A request ready to be rendered for one dialect
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub dialect: Dialect,
    pub target_id: String,
    pub start_date: String,
    pub end_date: String,
    /// Provider-side metric names, in request order
    pub metrics: Vec<String>,
    /// Provider-side dimension names, in request order
    pub dimensions: Vec<String>,
    /// Metric names as the caller asked for them; these key result rows
    pub requested_metrics: Vec<String>,
    /// Dimension names as the caller asked for them; these key result rows
    pub requested_dimensions: Vec<String>,
    pub order_by: Option<OrderBy>,
    pub dimension_filter: Option<FilterExpression>,
    pub metric_filter: Option<FilterExpression>,
    pub segment: Option<String>,
    pub filters_expression: Option<String>,
    pub paging: Paging,
}

/// Descending order-by on one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Dimension,
    Metric,
}

/// Paging after token/offset precedence is resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Paging {
    Token { token: String, page_size: u32 },
    Offset { offset: u32, page_size: u32 },
}

impl Paging {
    pub fn page_size(&self) -> u32 {
        match self {
            Self::Token { page_size, .. } | Self::Offset { page_size, .. } => *page_size,
        }
    }
}

impl QueryPlan {
    /// Build the plan for `request` targeting `dialect`
    pub fn build(
        request: &AnalyticsRequest,
        dialect: Dialect,
        policy: FieldPolicy,
    ) -> AnalyticsResult<Self> {
        let format = dialect.date_format();
        let requested_metrics = request.metrics();
        let requested_dimensions = request.dimensions().to_vec();
        let metrics: Vec<String> = requested_metrics.iter().map(|m| dialect.qualify(m)).collect();
        let dimensions: Vec<String> = requested_dimensions
            .iter()
            .map(|d| dialect.qualify(d))
            .collect();

        let order_by = request.sort().map(|sort| {
            let field = dialect.qualify(sort);
            let kind = if dimensions.contains(&field) {
                FieldKind::Dimension
            } else {
                FieldKind::Metric
            };
            OrderBy { field, kind }
        });

        let dimension_filter = (!request.dimension_filters().is_empty())
            .then(|| qualify_expression(build_expression(request.dimension_filters()), dialect));
        let metric_filter = (!request.metric_filters().is_empty())
            .then(|| qualify_expression(build_expression(request.metric_filters()), dialect));

        let segment = supported(
            request.segment(),
            dialect.supports_segment(),
            "segment",
            dialect,
            policy,
        )?;
        let filters_expression = supported(
            request.filters_expression(),
            dialect.supports_filters_expression(),
            "filters expression",
            dialect,
            policy,
        )?;
        let page_token = supported(
            request.page_token(),
            dialect.supports_page_token(),
            "page token",
            dialect,
            policy,
        )?;

        let page_size = request
            .max_results()
            .unwrap_or_else(|| dialect.default_page_size());
        let paging = match page_token {
            Some(token) => Paging::Token { token, page_size },
            None => Paging::Offset {
                offset: request.offset(),
                page_size,
            },
        };

        Ok(Self {
            dialect,
            target_id: request.target_id().to_string(),
            start_date: request.start_date_with(format),
            end_date: request.end_date_with(format),
            metrics,
            dimensions,
            requested_metrics,
            requested_dimensions,
            order_by,
            dimension_filter,
            metric_filter,
            segment,
            filters_expression,
            paging,
        })
    }
}

/// Keep `value` when the dialect supports it, otherwise apply `policy`
fn supported(
    value: Option<&str>,
    is_supported: bool,
    what: &str,
    dialect: Dialect,
    policy: FieldPolicy,
) -> AnalyticsResult<Option<String>> {
    match value {
        None => Ok(None),
        Some(v) if is_supported => Ok(Some(v.to_string())),
        Some(v) => match policy {
            FieldPolicy::Strict => Err(AnalyticsError::Translation(format!(
                "{} is not supported by {}",
                what, dialect
            ))),
            FieldPolicy::Lenient => {
                tracing::warn!(
                    dialect = %dialect,
                    field = what,
                    value = v,
                    "Dropping field the provider cannot express"
                );
                Ok(None)
            }
        },
    }
}

fn qualify_expression(expr: FilterExpression, dialect: Dialect) -> FilterExpression {
    match expr {
        FilterExpression::Match(mut m) => {
            m.field = dialect.qualify(&m.field);
            FilterExpression::Match(m)
        }
        FilterExpression::And(children) => FilterExpression::And(
            children
                .into_iter()
                .map(|c| qualify_expression(c, dialect))
                .collect(),
        ),
    }
}
