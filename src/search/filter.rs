//! Non-scoring filter trees
//!
//! Filters restrict which documents a search returns without affecting their
//! relevance score. The same tree is translated into the engine's query DSL by
//! [`crate::search::translate`] and evaluated in-process by [`Filter::matches`].

use crate::error::{AppError, Result};
use crate::search::value::FieldValue;
use serde_json::Value;
use std::cmp::Ordering;
use strum::{Display, EnumString};

/// One-sided range operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum RangeDirection {
    #[strum(serialize = ">")]
    GreaterThan,
    #[strum(serialize = ">=")]
    GreaterThanOrEqual,
    #[strum(serialize = "<")]
    LessThan,
    #[strum(serialize = "<=")]
    LessThanOrEqual,
}

impl RangeDirection {
    /// Parse an operator such as `">="`
    pub fn parse(op: &str) -> Result<Self> {
        op.trim()
            .parse()
            .map_err(|_| AppError::Validation(format!("Unrecognized range direction: {:?}", op)))
    }
}

/// A range endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct RangeBound {
    pub value: FieldValue,
    pub inclusive: bool,
}

impl RangeBound {
    pub fn inclusive(value: impl Into<FieldValue>) -> Self {
        Self {
            value: value.into(),
            inclusive: true,
        }
    }

    pub fn exclusive(value: impl Into<FieldValue>) -> Self {
        Self {
            value: value.into(),
            inclusive: false,
        }
    }
}

/// Range restriction on a single field; a missing bound is unbounded
#[derive(Debug, Clone, PartialEq)]
pub struct RangeFilter {
    pub field: String,
    pub lower: Option<RangeBound>,
    pub upper: Option<RangeBound>,
}

impl RangeFilter {
    /// One-sided range built from an operator
    pub fn directional(
        field: impl Into<String>,
        value: impl Into<FieldValue>,
        direction: RangeDirection,
    ) -> Self {
        let field = field.into();
        match direction {
            RangeDirection::GreaterThan => Self {
                field,
                lower: Some(RangeBound::exclusive(value)),
                upper: None,
            },
            RangeDirection::GreaterThanOrEqual => Self {
                field,
                lower: Some(RangeBound::inclusive(value)),
                upper: None,
            },
            RangeDirection::LessThan => Self {
                field,
                lower: None,
                upper: Some(RangeBound::exclusive(value)),
            },
            RangeDirection::LessThanOrEqual => Self {
                field,
                lower: None,
                upper: Some(RangeBound::inclusive(value)),
            },
        }
    }

    /// Inclusive range; `None` leaves that side open
    pub fn between(
        field: impl Into<String>,
        from: Option<FieldValue>,
        to: Option<FieldValue>,
    ) -> Self {
        Self {
            field: field.into(),
            lower: from.map(|value| RangeBound {
                value,
                inclusive: true,
            }),
            upper: to.map(|value| RangeBound {
                value,
                inclusive: true,
            }),
        }
    }

    fn contains(&self, candidate: &Value) -> bool {
        let above = match &self.lower {
            None => true,
            Some(bound) => match bound.value.compare_json(candidate) {
                Some(Ordering::Less) => true,
                Some(Ordering::Equal) => bound.inclusive,
                _ => false,
            },
        };
        let below = match &self.upper {
            None => true,
            Some(bound) => match bound.value.compare_json(candidate) {
                Some(Ordering::Greater) => true,
                Some(Ordering::Equal) => bound.inclusive,
                _ => false,
            },
        };
        above && below
    }
}

/// A node of the filter tree
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Exact match on an unanalyzed field
    Term { field: String, value: FieldValue },

    Range(RangeFilter),

    /// Every child must match; an empty group matches everything
    And(Vec<Filter>),

    /// At least one child must match; an empty group matches nothing
    Or(Vec<Filter>),

    /// `filter` must hold within a single element of the object array at `path`
    Nested { path: String, filter: Box<Filter> },
}

impl Filter {
    pub fn term(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Filter::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn directional(
        field: impl Into<String>,
        value: impl Into<FieldValue>,
        direction: RangeDirection,
    ) -> Self {
        Filter::Range(RangeFilter::directional(field, value, direction))
    }

    pub fn between(
        field: impl Into<String>,
        from: impl Into<FieldValue>,
        to: impl Into<FieldValue>,
    ) -> Self {
        Filter::Range(RangeFilter::between(
            field,
            Some(from.into()),
            Some(to.into()),
        ))
    }

    pub fn and(children: impl IntoIterator<Item = Filter>) -> Self {
        Filter::And(children.into_iter().collect())
    }

    pub fn or(children: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Or(children.into_iter().collect())
    }

    pub fn nested(path: impl Into<String>, filter: Filter) -> Self {
        Filter::Nested {
            path: path.into(),
            filter: Box::new(filter),
        }
    }

    /// Conjoin `other` onto this filter, extending an existing AND group in place
    pub fn conjoin(self, other: Filter) -> Self {
        match self {
            Filter::And(mut children) => {
                children.push(other);
                Filter::And(children)
            }
            filter => Filter::And(vec![filter, other]),
        }
    }

    /// Evaluate the filter against a JSON document
    pub fn matches(&self, document: &Value) -> bool {
        match self {
            Filter::Term { field, value } => values_at(document, field)
                .into_iter()
                .any(|candidate| value.matches_json(candidate)),
            Filter::Range(range) => values_at(document, &range.field)
                .into_iter()
                .any(|candidate| range.contains(candidate)),
            Filter::And(children) => children.iter().all(|child| child.matches(document)),
            Filter::Or(children) => children.iter().any(|child| child.matches(document)),
            Filter::Nested { path, filter } => values_at(document, path)
                .into_iter()
                .filter(|element| element.is_object())
                .any(|element| filter.matches(&scoped(path, element))),
        }
    }
}

/// Values reachable at a dotted `path`, flattening arrays along the way.
///
/// A trailing `raw` segment that does not resolve falls back to the parent
/// field, mirroring an unanalyzed keyword subfield.
pub(crate) fn values_at<'a>(document: &'a Value, path: &str) -> Vec<&'a Value> {
    let segments: Vec<&str> = path.split('.').collect();
    let found = resolve(document, &segments);
    if found.is_empty() && segments.len() > 1 && segments.last() == Some(&"raw") {
        return resolve(document, &segments[..segments.len() - 1]);
    }
    found
}

fn resolve<'a>(document: &'a Value, segments: &[&str]) -> Vec<&'a Value> {
    let mut current = vec![document];
    for segment in segments {
        let mut next = Vec::new();
        for value in current {
            if let Some(child) = value.get(*segment) {
                match child {
                    Value::Array(items) => next.extend(items.iter()),
                    Value::Null => {}
                    other => next.push(other),
                }
            }
        }
        current = next;
    }
    current
}

/// Rebuild a single array element under its own path so nested field names resolve
fn scoped(path: &str, element: &Value) -> Value {
    path.rsplit('.').fold(element.clone(), |inner, segment| {
        let mut wrapper = serde_json::Map::new();
        wrapper.insert(segment.to_string(), inner);
        Value::Object(wrapper)
    })
}
