//! Observation cache
//!
//! Keeps a window of a stream's remote observations in memory so that each
//! incoming observation can be checked without a round trip.
//!
//! # Overview
//!
//! - `TimeWindowCache` - time-keyed observations plus the covered window
//! - `StreamIdentityGuard` - clears the cache when the stream changes

mod identity;
mod window;

pub use identity::StreamIdentityGuard;
pub use window::{TimeWindowCache, FETCH_PAGE_SIZE};
