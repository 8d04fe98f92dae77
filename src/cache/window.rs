//! Time-window cache of remote observations
//!
//! Holds the observations of one stream keyed by time, together with a
//! watermark (`start`) below which nothing is known. The window is filled
//! lazily: the first lookup fetches forward from the requested time, and a
//! lookup earlier than the watermark pulls in the missing history between
//! the two. The watermark never moves forward until `clear()`.

use crate::error::Result;
use crate::model::{Observation, StreamRef};
use crate::remote::{Comparison, Filter, ObservationSource, Query};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Maximum number of observations requested per fetch
pub const FETCH_PAGE_SIZE: usize = 1000;

/// Cache of remote observations for a single stream
#[derive(Debug, Clone)]
pub struct TimeWindowCache {
    entries: BTreeMap<DateTime<Utc>, Observation>,
    /// Every remote record at or after this time (and before `covered_until`) is cached
    start: Option<DateTime<Utc>>,
    /// Set when the last forward fetch hit the page cap; `None` means open-ended
    covered_until: Option<DateTime<Utc>>,
    page_size: usize,
    delete_duplicates: bool,
    superseded: Vec<Observation>,
}

impl Default for TimeWindowCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeWindowCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            start: None,
            covered_until: None,
            page_size: FETCH_PAGE_SIZE,
            delete_duplicates: false,
            superseded: Vec::new(),
        }
    }

    /// Set the fetch page size
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Collect remote duplicates for deletion when merging fetched records
    #[must_use]
    pub fn with_delete_duplicates(mut self, enabled: bool) -> Self {
        self.delete_duplicates = enabled;
        self
    }

    /// Check if no entries are held
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The watermark, if set
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.start
    }

    /// Upper coverage bound, if the last forward fetch was truncated
    pub fn covered_until(&self) -> Option<DateTime<Utc>> {
        self.covered_until
    }

    /// Drop all entries and reset the window
    pub fn clear(&mut self) {
        self.entries.clear();
        self.start = None;
        self.covered_until = None;
        self.superseded.clear();
    }

    /// Check if `t` lies before the watermark (false while it is unset)
    pub fn is_before_start(&self, t: DateTime<Utc>) -> bool {
        self.start.is_some_and(|start| t < start)
    }

    /// Look up the entry at exactly `key`, without fetching
    pub fn get(&self, key: DateTime<Utc>) -> Option<&Observation> {
        self.entries.get(&key)
    }

    /// Insert or replace an entry, returning the previous one
    pub fn put(&mut self, key: DateTime<Utc>, observation: Observation) -> Option<Observation> {
        if self.start.is_none() {
            self.start = Some(observation.time_key());
        }
        self.entries.insert(key, observation)
    }

    /// Remove and return the duplicates collected by previous fetches
    pub fn take_superseded(&mut self) -> Vec<Observation> {
        std::mem::take(&mut self.superseded)
    }

    /// Return the entry at `check_time`, fetching from `source` when the
    /// window does not cover that time yet
    ///
    /// On error the cache is left untouched.
    pub async fn get_or_fetch(
        &mut self,
        check_time: DateTime<Utc>,
        stream: &StreamRef,
        source: &dyn ObservationSource,
    ) -> Result<Option<Observation>> {
        if self.is_empty() {
            let (records, bound) = self
                .fetch_forward(source, stream, check_time, check_time)
                .await?;
            debug!(
                stream = %stream,
                from = %check_time,
                fetched = records.len(),
                "Filled empty observation cache"
            );
            self.covered_until = bound;
            self.absorb(records);
            self.lower_start(check_time);
        } else if let Some(start) = self.start.filter(|start| check_time < *start) {
            let records = self.fetch_range(source, stream, check_time, start).await?;
            debug!(
                stream = %stream,
                from = %check_time,
                until = %start,
                fetched = records.len(),
                "Extended observation cache backward"
            );
            self.absorb(records);
            self.lower_start(check_time);
        } else if let Some(limit) = self.covered_until.filter(|limit| check_time >= *limit) {
            let (records, bound) = self.fetch_forward(source, stream, limit, check_time).await?;
            debug!(
                stream = %stream,
                from = %limit,
                until = %check_time,
                fetched = records.len(),
                "Extended observation cache forward"
            );
            self.covered_until = bound;
            self.absorb(records);
        }

        Ok(self.entries.get(&check_time).cloned())
    }

    /// Merge fetched records into the cache
    ///
    /// A cached entry that is replaced by a record with a different id is a
    /// duplicate on the server; with duplicate deletion enabled the old entry
    /// is returned so it can be deleted. Unpersisted local entries are simply
    /// replaced.
    pub fn merge_fetched(&mut self, records: Vec<Observation>) -> Vec<Observation> {
        let mut superseded = Vec::new();

        for record in records {
            let key = record.time_key();
            if self.start.map_or(true, |start| key < start) {
                self.start = Some(key);
            }

            let new_id = record.id.clone();
            if let Some(old) = self.entries.insert(key, record) {
                let is_duplicate = old.id.is_some() && old.id != new_id;
                if is_duplicate && self.delete_duplicates {
                    debug!(
                        kept = ?new_id,
                        dropped = %old.label(),
                        time = %key,
                        "Found duplicate observation"
                    );
                    superseded.push(old);
                }
            }
        }

        superseded
    }

    fn absorb(&mut self, records: Vec<Observation>) {
        let superseded = self.merge_fetched(records);
        self.superseded.extend(superseded);
    }

    fn lower_start(&mut self, t: DateTime<Utc>) {
        if self.start.map_or(true, |start| t < start) {
            self.start = Some(t);
        }
    }

    /// Coverage bound after a forward page fetched from `from`
    fn forward_bound(&self, page: &[Observation], from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if page.len() < self.page_size {
            return None;
        }
        match page.last().map(Observation::time_key) {
            Some(last) if last > from => Some(last),
            _ => {
                warn!(
                    from = %from,
                    page_size = self.page_size,
                    "Full page of observations sharing one time, treating window as complete"
                );
                None
            }
        }
    }

    async fn fetch_page(
        &self,
        source: &dyn ObservationSource,
        stream: &StreamRef,
        filter: Filter,
    ) -> Result<Vec<Observation>> {
        source
            .query(stream, &Query::new(self.page_size).filter(filter))
            .await
    }

    /// Fetch pages forward from `from` until the window covers `target`
    ///
    /// Returns the records and the new coverage bound.
    async fn fetch_forward(
        &self,
        source: &dyn ObservationSource,
        stream: &StreamRef,
        from: DateTime<Utc>,
        target: DateTime<Utc>,
    ) -> Result<(Vec<Observation>, Option<DateTime<Utc>>)> {
        let mut records = Vec::new();
        let mut lower = from;

        loop {
            let page = self
                .fetch_page(source, stream, Filter::time(Comparison::Ge, lower))
                .await?;
            let bound = self.forward_bound(&page, lower);
            records.extend(page);

            // Records at the bound itself may continue on the next page
            match bound {
                Some(next) if next <= target => lower = next,
                _ => return Ok((records, bound)),
            }
        }
    }

    /// Fetch every record in `[from, until]`, page by page
    async fn fetch_range(
        &self,
        source: &dyn ObservationSource,
        stream: &StreamRef,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Observation>> {
        let mut records = Vec::new();
        let mut lower = from;

        loop {
            let filter = Filter::time(Comparison::Ge, lower)
                .and(Filter::time(Comparison::Le, until));
            let page = self.fetch_page(source, stream, filter).await?;
            let full = page.len() >= self.page_size;
            let last = page.last().map(Observation::time_key);
            records.extend(page);

            match last {
                Some(last) if full && last > lower => lower = last,
                Some(_) if full => {
                    warn!(
                        from = %lower,
                        page_size = self.page_size,
                        "Full page of observations sharing one time, stopping backward fetch"
                    );
                    break;
                }
                _ => break,
            }
        }

        Ok(records)
    }
}
