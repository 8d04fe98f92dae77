//! Duplicate detection by phenomenon time
//!
//! An observation is a duplicate when the server already holds a record of
//! the same stream at the same time with the same result. Remote records are
//! read through a [`TimeWindowCache`] so that a run of observations costs a
//! handful of queries instead of one per observation.

use super::types::{Outcome, Validator};
use crate::cache::{StreamIdentityGuard, TimeWindowCache};
use crate::compare::values_equal;
use crate::error::Result;
use crate::model::{Observation, StreamRef};
use crate::remote::{Comparison, Filter, ObservationSink, ObservationSource};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Number of delete requests sent at a time for superseded duplicates
pub const DELETE_BATCH_SIZE: usize = 10;

/// Lifecycle of the validator's cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Not bound to any stream yet
    Uninitialized,
    /// Bound to a stream, nothing fetched
    CacheCold,
    /// Holding a fetched window
    CacheWarm,
}

/// Validator rejecting observations that already exist at the same time
pub struct DuplicateValidator {
    source: Arc<dyn ObservationSource>,
    sink: Arc<dyn ObservationSink>,
    cache: TimeWindowCache,
    guard: StreamIdentityGuard,
    update: bool,
    cache_observations: bool,
    admit_duplicates: bool,
}

impl DuplicateValidator {
    /// Create a validator with the default policy: cache on, reject
    /// duplicates and conflicting values, no deletions
    pub fn new(source: Arc<dyn ObservationSource>, sink: Arc<dyn ObservationSink>) -> Self {
        Self {
            source,
            sink,
            cache: TimeWindowCache::new(),
            guard: StreamIdentityGuard::new(),
            update: false,
            cache_observations: true,
            admit_duplicates: false,
        }
    }

    /// Turn conflicting values into updates of the existing record
    #[must_use]
    pub fn update(mut self, enabled: bool) -> Self {
        self.update = enabled;
        self
    }

    /// Read remote records through the cache (default) or query per observation
    #[must_use]
    pub fn cache_observations(mut self, enabled: bool) -> Self {
        self.cache_observations = enabled;
        self
    }

    /// Delete remote records that duplicate another record's time
    #[must_use]
    pub fn delete_duplicates(mut self, enabled: bool) -> Self {
        self.cache = self.cache.with_delete_duplicates(enabled);
        self
    }

    /// Admit exact duplicates instead of rejecting them
    #[must_use]
    pub fn admit_duplicates(mut self, enabled: bool) -> Self {
        self.admit_duplicates = enabled;
        self
    }

    /// Set the cache fetch page size
    #[must_use]
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.cache = self.cache.with_page_size(page_size);
        self
    }

    /// Current cache lifecycle state
    pub fn state(&self) -> CacheState {
        if self.guard.current().is_none() {
            CacheState::Uninitialized
        } else if self.cache.start().is_none() {
            CacheState::CacheCold
        } else {
            CacheState::CacheWarm
        }
    }

    /// The cache, for inspection
    pub fn cache(&self) -> &TimeWindowCache {
        &self.cache
    }

    async fn find_existing(
        &mut self,
        stream: &StreamRef,
        time: DateTime<Utc>,
    ) -> Result<Option<Observation>> {
        if !self.cache_observations {
            return self
                .source
                .first_match(stream, &Filter::time(Comparison::Eq, time))
                .await;
        }

        self.guard.check_and_maybe_clear(stream, &mut self.cache);
        let existing = self
            .cache
            .get_or_fetch(time, stream, self.source.as_ref())
            .await?;
        self.delete_superseded().await;
        Ok(existing)
    }

    /// Delete the duplicates found by the last fetch
    ///
    /// Best effort: a failed batch is logged and dropped, never retried.
    async fn delete_superseded(&mut self) {
        let superseded = self.cache.take_superseded();
        if superseded.is_empty() {
            return;
        }

        match self.sink.delete(&superseded, DELETE_BATCH_SIZE).await {
            Ok(deleted) => info!(
                found = superseded.len(),
                deleted, "Deleted duplicate observations from server"
            ),
            Err(e) => warn!(
                found = superseded.len(),
                error = %e,
                "Failed to delete duplicate observations, skipping"
            ),
        }
    }
}

#[async_trait]
impl Validator for DuplicateValidator {
    fn name(&self) -> &'static str {
        "by_phenomenon_time"
    }

    async fn validate(&mut self, observation: &mut Observation) -> Result<Outcome> {
        let stream = observation.stream()?;
        let time = observation.time_key();

        let outcome = match self.find_existing(&stream, time).await? {
            None => Outcome::New,
            Some(existing) if values_equal(&observation.result, &existing.result) => {
                if self.admit_duplicates {
                    Outcome::AdmittedDuplicate
                } else {
                    Outcome::Duplicate
                }
            }
            Some(existing) if self.update => {
                observation.id = existing.id;
                Outcome::Update
            }
            Some(_) => Outcome::Conflict,
        };

        if self.cache_observations && matches!(outcome, Outcome::New | Outcome::Update) {
            self.cache.put(time, observation.clone());
        }

        debug!(
            stream = %stream,
            time = %time,
            outcome = %outcome,
            "Validated observation"
        );
        Ok(outcome)
    }
}

impl std::fmt::Debug for DuplicateValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuplicateValidator")
            .field("update", &self.update)
            .field("cache_observations", &self.cache_observations)
            .field("admit_duplicates", &self.admit_duplicates)
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}
