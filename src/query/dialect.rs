//! Provider Dialects
//!
//! Each analytics API generation has its own request shape, paging
//! convention and filter encoding. A [`Dialect`] names the generation and
//! answers the questions the translator needs to ask about it.

use serde::{Deserialize, Serialize};

/// A provider generation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// Core Reporting API v3 (query-string requests, 1-based start index)
    CoreReportingV3,
    /// Analytics Reporting API v4 (batch requests, page tokens)
    ReportingV4,
    /// Analytics Data API v1beta (run-report requests, offset + limit)
    #[default]
    #[serde(rename = "data_v1beta")]
    DataV1Beta,
}

/// How a generation pages through results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingStyle {
    /// `start-index` counted from 1
    OneBasedIndex,
    /// Opaque continuation token
    PageToken,
    /// `offset` counted from 0 plus `limit`
    ZeroBasedOffset,
}

/// How a generation encodes filters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterShape {
    /// `;`-joined filter string
    ExpressionString,
    /// Filter clauses combined with an operator
    Clauses,
    /// Nested expression tree
    ExpressionTree,
}

impl Dialect {
    /// Date format for date-range clauses
    pub fn date_format(&self) -> &'static str {
        "%Y-%m-%d"
    }

    pub fn paging_style(&self) -> PagingStyle {
        match self {
            Self::CoreReportingV3 => PagingStyle::OneBasedIndex,
            Self::ReportingV4 => PagingStyle::PageToken,
            Self::DataV1Beta => PagingStyle::ZeroBasedOffset,
        }
    }

    pub fn filter_shape(&self) -> FilterShape {
        match self {
            Self::CoreReportingV3 => FilterShape::ExpressionString,
            Self::ReportingV4 => FilterShape::Clauses,
            Self::DataV1Beta => FilterShape::ExpressionTree,
        }
    }

    /// Rows per page when the request does not say
    pub fn default_page_size(&self) -> u32 {
        match self {
            Self::CoreReportingV3 | Self::ReportingV4 => 1_000,
            Self::DataV1Beta => 10_000,
        }
    }

    pub fn supports_segment(&self) -> bool {
        !matches!(self, Self::DataV1Beta)
    }

    pub fn supports_filters_expression(&self) -> bool {
        !matches!(self, Self::DataV1Beta)
    }

    pub fn supports_page_token(&self) -> bool {
        self.paging_style() == PagingStyle::PageToken
    }

    /// Provider-side name of a metric or dimension.
    ///
    /// Legacy generations namespace fields with `ga:`.
    pub fn qualify(&self, field: &str) -> String {
        match self {
            Self::CoreReportingV3 | Self::ReportingV4 if !field.starts_with("ga:") => {
                format!("ga:{}", field)
            }
            _ => field.to_string(),
        }
    }

    /// Parse a dialect name as used in configuration
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "core_reporting_v3" | "v3" | "ua" => Some(Self::CoreReportingV3),
            "reporting_v4" | "v4" => Some(Self::ReportingV4),
            "data_v1beta" | "data" | "ga4" => Some(Self::DataV1Beta),
            _ => None,
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CoreReportingV3 => write!(f, "core_reporting_v3"),
            Self::ReportingV4 => write!(f, "reporting_v4"),
            Self::DataV1Beta => write!(f, "data_v1beta"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paging_styles() {
        assert_eq!(Dialect::CoreReportingV3.paging_style(), PagingStyle::OneBasedIndex);
        assert_eq!(Dialect::ReportingV4.paging_style(), PagingStyle::PageToken);
        assert_eq!(Dialect::DataV1Beta.paging_style(), PagingStyle::ZeroBasedOffset);
        assert!(Dialect::ReportingV4.supports_page_token());
        assert!(!Dialect::DataV1Beta.supports_page_token());
    }

    #[test]
    fn test_qualify() {
        assert_eq!(Dialect::CoreReportingV3.qualify("sessions"), "ga:sessions");
        assert_eq!(Dialect::ReportingV4.qualify("ga:users"), "ga:users");
        assert_eq!(Dialect::DataV1Beta.qualify("activeUsers"), "activeUsers");
    }

    #[test]
    fn test_parse_and_display() {
        for dialect in [Dialect::CoreReportingV3, Dialect::ReportingV4, Dialect::DataV1Beta] {
            assert_eq!(Dialect::parse(&dialect.to_string()), Some(dialect));
        }
        assert_eq!(Dialect::parse("GA4"), Some(Dialect::DataV1Beta));
        assert_eq!(Dialect::parse("v2"), None);
        assert_eq!(Dialect::default(), Dialect::DataV1Beta);
    }
}
