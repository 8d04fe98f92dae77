//! Remote observation stores
//!
//! # Overview
//!
//! - `ObservationSource` / `ObservationSink` - the store contracts
//! - `SensorThingsClient` - SensorThings API over HTTP
//! - `MemoryStore` - in-memory store for dry runs and tests

mod memory;
mod sensorthings;
mod types;

pub use memory::MemoryStore;
pub use sensorthings::SensorThingsClient;
pub use types::{
    Comparison, Filter, Literal, ObservationSink, ObservationSource, Query, SortOrder,
    PHENOMENON_TIME,
};
