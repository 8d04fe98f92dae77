//! In-memory observation store
//!
//! Implements both store traits over a vector of observations. Used for dry
//! runs and tests; it also records every query so fetch behaviour can be
//! inspected.

use super::types::{
    Comparison, Filter, Literal, ObservationSink, ObservationSource, Query, SortOrder,
    PHENOMENON_TIME,
};
use crate::error::{Error, Result};
use crate::model::{EntityId, Observation, StreamRef};
use crate::types::JsonValue;
use async_trait::async_trait;
use std::cmp::Ordering;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Inner {
    records: Vec<(StreamRef, Observation)>,
    queries: Vec<(StreamRef, Query)>,
    deleted: Vec<EntityId>,
    failing: bool,
    next_id: i64,
}

/// Observation store held in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an observation, assigning an id if it has none
    pub async fn insert(&self, stream: &StreamRef, observation: Observation) -> EntityId {
        let mut inner = self.inner.write().await;
        let id = match observation.id.clone() {
            Some(id) => id,
            None => {
                inner.next_id += 1;
                EntityId::Int(inner.next_id)
            }
        };
        let mut observation = observation.with_stream(stream);
        observation.id = Some(id.clone());
        inner.records.push((stream.clone(), observation));
        id
    }

    /// Make every subsequent call fail (or succeed again)
    pub async fn set_failing(&self, failing: bool) {
        self.inner.write().await.failing = failing;
    }

    /// Number of stored observations
    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Queries issued so far, in order (first-match lookups included)
    pub async fn queries(&self) -> Vec<(StreamRef, Query)> {
        self.inner.read().await.queries.clone()
    }

    /// Number of queries issued so far
    pub async fn query_count(&self) -> usize {
        self.inner.read().await.queries.len()
    }

    /// Ids deleted so far
    pub async fn deleted(&self) -> Vec<EntityId> {
        self.inner.read().await.deleted.clone()
    }
}

#[async_trait]
impl ObservationSource for MemoryStore {
    async fn query(&self, stream: &StreamRef, query: &Query) -> Result<Vec<Observation>> {
        let mut inner = self.inner.write().await;
        inner.queries.push((stream.clone(), query.clone()));
        if inner.failing {
            return Err(Error::remote("memory store is set to fail"));
        }

        let mut matching: Vec<Observation> = inner
            .records
            .iter()
            .filter(|(s, obs)| {
                s == stream && query.filter.as_ref().map_or(true, |f| matches(f, obs))
            })
            .map(|(_, obs)| obs.clone())
            .collect();

        matching.sort_by_key(Observation::time_key);
        if query.order == SortOrder::Descending {
            matching.reverse();
        }

        Ok(matching
            .into_iter()
            .skip(query.skip)
            .take(query.top)
            .collect())
    }

    async fn first_match(
        &self,
        stream: &StreamRef,
        filter: &Filter,
    ) -> Result<Option<Observation>> {
        let query = Query::new(1).filter(filter.clone());
        Ok(self.query(stream, &query).await?.into_iter().next())
    }
}

#[async_trait]
impl ObservationSink for MemoryStore {
    async fn delete(&self, observations: &[Observation], _batch_size: usize) -> Result<usize> {
        let mut inner = self.inner.write().await;
        if inner.failing {
            return Err(Error::remote("memory store is set to fail"));
        }

        let mut deleted = 0;
        for id in observations.iter().filter_map(|obs| obs.id.clone()) {
            let before = inner.records.len();
            inner.records.retain(|(_, obs)| obs.id.as_ref() != Some(&id));
            if inner.records.len() < before {
                deleted += 1;
                inner.deleted.push(id);
            }
        }
        Ok(deleted)
    }
}

static NULL: JsonValue = JsonValue::Null;

/// Evaluate a filter against an observation
fn matches(filter: &Filter, observation: &Observation) -> bool {
    match filter {
        Filter::And(parts) => parts.iter().all(|part| matches(part, observation)),
        Filter::Compare { path, op, value } => match value {
            Literal::Time(t) if path == PHENOMENON_TIME => {
                holds(*op, observation.time_key().cmp(t))
            }
            Literal::Json(expected) => {
                let Ok(json) = serde_json::to_value(observation) else {
                    return false;
                };
                let actual = path
                    .split('/')
                    .try_fold(&json, |node, segment| node.get(segment))
                    .unwrap_or(&NULL);
                compare_json(actual, expected).is_some_and(|ordering| holds(*op, ordering))
            }
            Literal::Time(_) => false,
        },
    }
}

fn compare_json(actual: &JsonValue, expected: &JsonValue) -> Option<Ordering> {
    match (actual, expected) {
        (JsonValue::Number(a), JsonValue::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (JsonValue::String(a), JsonValue::String(b)) => Some(a.cmp(b)),
        (a, b) if a == b => Some(Ordering::Equal),
        _ => None,
    }
}

fn holds(op: Comparison, ordering: Ordering) -> bool {
    match op {
        Comparison::Eq => ordering == Ordering::Equal,
        Comparison::Ge => ordering != Ordering::Less,
        Comparison::Le => ordering != Ordering::Greater,
        Comparison::Gt => ordering == Ordering::Greater,
        Comparison::Lt => ordering == Ordering::Less,
    }
}
