//! Observation data model
//!
//! Observations as exchanged with a SensorThings server, plus the value
//! types needed to compare results across numeric representations.
//!
//! # Overview
//!
//! - `Observation` - id, time, result, parameters and owning stream
//! - `TimeValue` - instant or interval `phenomenonTime`
//! - `ResultValue` - tagged result (null, bool, int, decimal, text, sequence, object)
//! - `Decimal` - arbitrary-precision decimal that keeps its scale
//! - `StreamRef` - Datastream or MultiDatastream reference

mod decimal;
mod observation;
mod value;

pub use decimal::Decimal;
pub use observation::{EntityId, EntityRef, Observation, StreamKind, StreamRef, TimeValue};
pub use value::ResultValue;
