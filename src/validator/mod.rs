//! Observation validators
//!
//! A validator classifies each incoming observation before upload.
//!
//! # Validators
//!
//! - `NullValidator` - admits everything
//! - `DuplicateValidator` - duplicates by phenomenon time, cache backed
//! - `ParameterValidator` - duplicates by a parameter value
//! - `IntervalValidator` - interval length check

mod duplicate;
mod interval;
mod null;
mod parameter;
mod types;

pub use duplicate::{CacheState, DuplicateValidator, DELETE_BATCH_SIZE};
pub use interval::IntervalValidator;
pub use null::NullValidator;
pub use parameter::ParameterValidator;
pub use types::{Outcome, Validator};
