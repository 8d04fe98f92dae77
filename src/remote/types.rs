//! Remote store contracts
//!
//! The validators never talk HTTP themselves. They go through these two
//! traits, so the cache logic can be exercised against any store.

use crate::error::Result;
use crate::model::{Observation, StreamRef};
use crate::types::JsonValue;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;

/// Property holding the observation time on the server
pub const PHENOMENON_TIME: &str = "phenomenonTime";

// ============================================================================
// Filters
// ============================================================================

/// Comparison operator in a filter expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ge,
    Le,
    Gt,
    Lt,
}

impl Comparison {
    fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ge => "ge",
            Self::Le => "le",
            Self::Gt => "gt",
            Self::Lt => "lt",
        }
    }
}

/// Value on the right-hand side of a comparison
///
/// Times render with as many fractional digits as they carry, so `eq` and
/// `le` bounds match sub-millisecond timestamps exactly.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Time(DateTime<Utc>),
    Json(JsonValue),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Time(t) => f.write_str(&t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Self::Json(JsonValue::String(s)) => write!(f, "'{}'", s.replace('\'', "''")),
            Self::Json(JsonValue::Null) => f.write_str("null"),
            Self::Json(other) => write!(f, "{other}"),
        }
    }
}

/// Filter predicate, rendered as an OData `$filter` expression
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Compare {
        path: String,
        op: Comparison,
        value: Literal,
    },
    And(Vec<Filter>),
}

impl Filter {
    /// `path op value`
    pub fn compare(path: impl Into<String>, op: Comparison, value: Literal) -> Self {
        Self::Compare {
            path: path.into(),
            op,
            value,
        }
    }

    /// `phenomenonTime op t`
    pub fn time(op: Comparison, t: DateTime<Utc>) -> Self {
        Self::compare(PHENOMENON_TIME, op, Literal::Time(t))
    }

    /// `path eq value`
    pub fn field_eq(path: impl Into<String>, value: JsonValue) -> Self {
        Self::compare(path, Comparison::Eq, Literal::Json(value))
    }

    /// Conjunction of this filter and another
    #[must_use]
    pub fn and(self, other: Filter) -> Self {
        match self {
            Self::And(mut parts) => {
                parts.push(other);
                Self::And(parts)
            }
            first => Self::And(vec![first, other]),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compare { path, op, value } => write!(f, "{path} {} {value}", op.as_str()),
            Self::And(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" and ")?;
                    }
                    match part {
                        Self::And(_) => write!(f, "({part})")?,
                        Self::Compare { .. } => write!(f, "{part}")?,
                    }
                }
                Ok(())
            }
        }
    }
}

// ============================================================================
// Queries
// ============================================================================

/// Sort direction on `phenomenonTime`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    /// `$orderby` value
    pub fn as_order_by(self) -> String {
        match self {
            Self::Ascending => format!("{PHENOMENON_TIME} asc"),
            Self::Descending => format!("{PHENOMENON_TIME} desc"),
        }
    }
}

/// A single page request against a stream's observations
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub filter: Option<Filter>,
    pub order: SortOrder,
    pub top: usize,
    pub skip: usize,
}

impl Query {
    /// Create a query returning at most `top` records
    pub fn new(top: usize) -> Self {
        Self {
            filter: None,
            order: SortOrder::Ascending,
            top,
            skip: 0,
        }
    }

    /// Set the filter
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Set the sort order
    #[must_use]
    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    /// Skip the first `skip` records
    #[must_use]
    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }
}

// ============================================================================
// Collaborator Traits
// ============================================================================

/// Read access to the observations stored on the server
///
/// Returned observations must have at least id, time and result populated.
/// Failures must be reported as errors, never as an empty result.
#[async_trait]
pub trait ObservationSource: Send + Sync {
    /// Fetch one page of a stream's observations
    async fn query(&self, stream: &StreamRef, query: &Query) -> Result<Vec<Observation>>;

    /// Fetch the first observation of a stream matching `filter`
    async fn first_match(&self, stream: &StreamRef, filter: &Filter)
        -> Result<Option<Observation>>;
}

/// Deletion of stored observations
#[async_trait]
pub trait ObservationSink: Send + Sync {
    /// Delete observations, `batch_size` requests at a time
    ///
    /// Best effort: a record that fails to delete is logged and skipped.
    /// Returns the number of records deleted.
    async fn delete(&self, observations: &[Observation], batch_size: usize) -> Result<usize>;
}
