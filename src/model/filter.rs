//! Filter requests
//!
//! A filter is a `(field, operator, value)` triple. The operator is kept as
//! the caller supplied it; it is only interpreted when a request is rendered
//! for a concrete provider generation.

use crate::error::{AnalyticsError, AnalyticsResult};
use serde::{Deserialize, Serialize};

/// Operator name used when a filter does not specify one
pub const DEFAULT_OPERATOR: &str = "EXACT";

/// One field/operator/value filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRequest {
    field: String,
    operator: Option<String>,
    value: String,
}

impl FilterRequest {
    /// Create a filter. Fails when `field` is empty.
    pub fn new(
        field: impl Into<String>,
        operator: Option<String>,
        value: impl Into<String>,
    ) -> AnalyticsResult<Self> {
        let field = field.into();
        if field.trim().is_empty() {
            return Err(AnalyticsError::InvalidArgument(
                "filter field cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            field,
            operator: operator.filter(|op| !op.trim().is_empty()),
            value: value.into(),
        })
    }

    /// Create an exact-match filter
    pub fn exact(field: impl Into<String>, value: impl Into<String>) -> AnalyticsResult<Self> {
        Self::new(field, None, value)
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// The operator as supplied, `None` when the caller left it out
    pub fn operator(&self) -> Option<&str> {
        self.operator.as_deref()
    }

    /// The operator with the exact-match default applied
    pub fn operator_or_default(&self) -> &str {
        self.operator.as_deref().unwrap_or(DEFAULT_OPERATOR)
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Operators understood across provider generations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Exact,
    BeginsWith,
    EndsWith,
    Contains,
    FullRegexp,
    PartialRegexp,
    Equal,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl FilterOperator {
    /// Parse an operator name (case-insensitive)
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "EXACT" => Some(Self::Exact),
            "BEGINS_WITH" => Some(Self::BeginsWith),
            "ENDS_WITH" => Some(Self::EndsWith),
            "CONTAINS" => Some(Self::Contains),
            "FULL_REGEXP" => Some(Self::FullRegexp),
            "PARTIAL_REGEXP" => Some(Self::PartialRegexp),
            "EQUAL" => Some(Self::Equal),
            "LESS_THAN" => Some(Self::LessThan),
            "LESS_THAN_OR_EQUAL" => Some(Self::LessThanOrEqual),
            "GREATER_THAN" => Some(Self::GreaterThan),
            "GREATER_THAN_OR_EQUAL" => Some(Self::GreaterThanOrEqual),
            _ => None,
        }
    }

    /// Parse an operator name, failing with a translation error
    pub fn parse_or_err(name: &str) -> AnalyticsResult<Self> {
        Self::parse(name)
            .ok_or_else(|| AnalyticsError::Translation(format!("unknown filter operator '{}'", name)))
    }

    /// Whether the operator compares numbers rather than strings
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Equal
                | Self::LessThan
                | Self::LessThanOrEqual
                | Self::GreaterThan
                | Self::GreaterThanOrEqual
        )
    }
}

impl std::fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Exact => "EXACT",
            Self::BeginsWith => "BEGINS_WITH",
            Self::EndsWith => "ENDS_WITH",
            Self::Contains => "CONTAINS",
            Self::FullRegexp => "FULL_REGEXP",
            Self::PartialRegexp => "PARTIAL_REGEXP",
            Self::Equal => "EQUAL",
            Self::LessThan => "LESS_THAN",
            Self::LessThanOrEqual => "LESS_THAN_OR_EQUAL",
            Self::GreaterThan => "GREATER_THAN",
            Self::GreaterThanOrEqual => "GREATER_THAN_OR_EQUAL",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_requires_field() {
        assert!(matches!(
            FilterRequest::new("", None, "x"),
            Err(AnalyticsError::InvalidArgument(_))
        ));
        assert!(FilterRequest::new("  ", Some("EXACT".into()), "x").is_err());
    }

    #[test]
    fn test_operator_defaults_to_exact() {
        let filter = FilterRequest::new("country", None, "Chile").unwrap();
        assert_eq!(filter.operator(), None);
        assert_eq!(filter.operator_or_default(), "EXACT");

        // Blank operators count as absent
        let filter = FilterRequest::new("country", Some(" ".into()), "Chile").unwrap();
        assert_eq!(filter.operator_or_default(), "EXACT");
    }

    #[test]
    fn test_value_is_not_validated() {
        let filter = FilterRequest::exact("pagePath", "").unwrap();
        assert_eq!(filter.value(), "");
    }

    #[test]
    fn test_operator_parse() {
        assert_eq!(FilterOperator::parse("contains"), Some(FilterOperator::Contains));
        assert_eq!(
            FilterOperator::parse("GREATER_THAN"),
            Some(FilterOperator::GreaterThan)
        );
        assert_eq!(FilterOperator::parse("LIKE"), None);
        assert!(FilterOperator::GreaterThan.is_numeric());
        assert!(!FilterOperator::Exact.is_numeric());
        assert_eq!(FilterOperator::BeginsWith.to_string(), "BEGINS_WITH");
    }

    #[test]
    fn test_unknown_operator_is_translation_error() {
        assert!(matches!(
            FilterOperator::parse_or_err("NOT_A_THING"),
            Err(AnalyticsError::Translation(_))
        ));
    }
}
