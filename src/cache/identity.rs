//! Stream identity tracking for the observation cache
//!
//! A cache is only meaningful for the stream it was filled from. The guard
//! remembers that stream and clears the cache when observations for another
//! stream arrive.

use super::window::TimeWindowCache;
use crate::model::{EntityId, StreamKind, StreamRef};
use tracing::{debug, info};

/// Remembers which stream a cache was built for
///
/// There is one slot per stream kind. Binding one slot resets the other,
/// so the cache never mixes Datastream and MultiDatastream observations.
#[derive(Debug, Clone, Default)]
pub struct StreamIdentityGuard {
    datastream: Option<EntityId>,
    multi_datastream: Option<EntityId>,
}

impl StreamIdentityGuard {
    /// Create a guard not bound to any stream
    pub fn new() -> Self {
        Self::default()
    }

    /// The stream the cache is currently bound to
    pub fn current(&self) -> Option<StreamRef> {
        self.datastream
            .clone()
            .map(StreamRef::Datastream)
            .or_else(|| self.multi_datastream.clone().map(StreamRef::MultiDatastream))
    }

    /// Bind to `stream`, clearing `cache` if it was built for anything else
    ///
    /// Returns true when the cache was cleared.
    pub fn check_and_maybe_clear(&mut self, stream: &StreamRef, cache: &mut TimeWindowCache) -> bool {
        let (slot, other) = match stream.kind() {
            StreamKind::Datastream => (&mut self.datastream, &mut self.multi_datastream),
            StreamKind::MultiDatastream => (&mut self.multi_datastream, &mut self.datastream),
        };

        if slot.as_ref() == Some(stream.id()) {
            return false;
        }

        if slot.is_some() || other.is_some() {
            info!(stream = %stream, cached = cache.len(), "Stream changed, clearing observation cache");
        } else {
            debug!(stream = %stream, "Binding observation cache to stream");
        }

        cache.clear();
        *slot = Some(stream.id().clone());
        *other = None;
        true
    }

    /// Forget the bound stream
    pub fn reset(&mut self) {
        self.datastream = None;
        self.multi_datastream = None;
    }
}
