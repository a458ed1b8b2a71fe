//! Filter Expressions
//!
//! Turns an ordered list of filters into a single boolean expression: the
//! filter itself when there is one, an AND-group otherwise. OR and negation
//! are not supported.

use crate::model::FilterRequest;

/// A provider-neutral filter expression tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterExpression {
    /// A single field/operator/value match
    Match(FilterMatch),
    /// All children must match
    And(Vec<FilterExpression>),
}

/// Leaf of a filter expression, operator default already applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterMatch {
    pub field: String,
    pub operator: String,
    pub value: String,
}

impl From<&FilterRequest> for FilterMatch {
    fn from(filter: &FilterRequest) -> Self {
        Self {
            field: filter.field().to_string(),
            operator: filter.operator_or_default().to_string(),
            value: filter.value().to_string(),
        }
    }
}

impl FilterExpression {
    /// The leaves of the expression, in order
    pub fn matches(&self) -> Vec<&FilterMatch> {
        match self {
            Self::Match(m) => vec![m],
            Self::And(children) => children.iter().flat_map(|c| c.matches()).collect(),
        }
    }
}

/// Build one expression from `filters`.
///
/// Callers check for an empty list first; an empty slice yields an empty
/// AND-group.
pub fn build_expression(filters: &[FilterRequest]) -> FilterExpression {
    match filters {
        [single] => FilterExpression::Match(single.into()),
        many => FilterExpression::And(
            many.iter()
                .map(|f| FilterExpression::Match(f.into()))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_filter_is_a_match() {
        let filter = FilterRequest::new("country", Some("CONTAINS".into()), "Chi").unwrap();
        let expr = build_expression(&[filter]);

        assert_eq!(
            expr,
            FilterExpression::Match(FilterMatch {
                field: "country".into(),
                operator: "CONTAINS".into(),
                value: "Chi".into(),
            })
        );
    }

    #[test]
    fn test_missing_operator_defaults_to_exact() {
        let expr = build_expression(&[FilterRequest::exact("city", "Lima").unwrap()]);
        assert_eq!(expr.matches()[0].operator, "EXACT");
    }

    #[test]
    fn test_many_filters_form_ordered_and_group() {
        let filters = vec![
            FilterRequest::exact("country", "Chile").unwrap(),
            FilterRequest::new("city", Some("BEGINS_WITH".into()), "San").unwrap(),
            FilterRequest::exact("deviceCategory", "mobile").unwrap(),
        ];

        match build_expression(&filters) {
            FilterExpression::And(children) => {
                assert_eq!(children.len(), filters.len());
                for (child, filter) in children.iter().zip(&filters) {
                    match child {
                        FilterExpression::Match(m) => {
                            assert_eq!(m.field, filter.field());
                            assert_eq!(m.operator, filter.operator_or_default());
                            assert_eq!(m.value, filter.value());
                        }
                        other => panic!("expected match, got {:?}", other),
                    }
                }
            }
            other => panic!("expected and-group, got {:?}", other),
        }
    }

    #[test]
    fn test_input_not_mutated() {
        let filters = vec![
            FilterRequest::exact("a", "1").unwrap(),
            FilterRequest::exact("b", "2").unwrap(),
        ];
        let before = filters.clone();
        let _ = build_expression(&filters);
        assert_eq!(filters, before);
    }
}
