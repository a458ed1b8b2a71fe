//! Normalized Results
//!
//! Every provider generation is reduced to the same shape: a list of rows,
//! each a map from requested field name to string value.

use crate::provider::RawReport;
use indexmap::IndexMap;
use serde::Serialize;

/// Result of a translated query
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedResult {
    /// Dimension names as requested, whatever the provider calls them
    pub dimensions: Vec<String>,
    /// Metric names as requested, whatever the provider calls them
    pub metrics: Vec<String>,
    pub rows: Vec<ResultRow>,
    /// Total rows reported by the provider, when it reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_count: Option<u64>,
    pub metadata: ResponseMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

impl NormalizedResult {
    /// Get the number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A single result row, keyed by field name in request order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResultRow(IndexMap<String, String>);

impl ResultRow {
    /// Get a value by field name
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Field names in insertion order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

/// Zip requested names against positional values.
///
/// Extra names or extra values are dropped; a row never has more entries
/// than the shorter side provides.
pub(crate) fn flatten_rows(
    dimensions: &[String],
    metrics: &[String],
    report: RawReport,
) -> NormalizedResult {
    let rows = report
        .rows
        .into_iter()
        .map(|raw| {
            let mut values = IndexMap::new();
            for (name, value) in dimensions.iter().zip(raw.dimension_values) {
                values.insert(name.clone(), value);
            }
            for (name, value) in metrics.iter().zip(raw.metric_values) {
                values.insert(name.clone(), value);
            }
            ResultRow(values)
        })
        .collect();

    NormalizedResult {
        dimensions: dimensions.to_vec(),
        metrics: metrics.to_vec(),
        rows,
        row_count: report.row_count,
        metadata: ResponseMetadata {
            currency_code: report.currency_code,
            time_zone: report.time_zone,
        },
        next_page_token: report.next_page_token,
    }
}
