// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # sta-validator
//!
//! Duplicate detection and validation for importers that push observations
//! into an OGC SensorThings API server.
//!
//! ## Features
//!
//! - **Duplicate Detection**: By phenomenon time or by a parameter value
//! - **Update In Place**: Adopt the id of an existing record whose result differs
//! - **Time-Window Cache**: A few paged queries instead of one per observation
//! - **Interval Checks**: ISO-8601 durations, calendar and DST aware
//! - **Remote Cleanup**: Optional deletion of duplicates already on the server
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sta_validator::{load_config, Outcome};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> sta_validator::Result<()> {
//!     let config = load_config("importer.yaml")?;
//!     let store = Arc::new(config.server.connect()?);
//!     let mut validator = config.validator.build(store.clone(), store)?;
//!
//!     let mut observation = serde_json::from_str(r#"{
//!         "phenomenonTime": "2024-01-01T10:00:00Z",
//!         "result": 21.5,
//!         "Datastream": {"@iot.id": 7}
//!     }"#)?;
//!     if validator.validate(&mut observation).await?.is_valid() {
//!         // upload
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                       Validator trait                         │
//! │  validate(&mut Observation) → Outcome                         │
//! └───────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────────┬───────────────┴──┬──────────────┬──────────────┐
//! │ By time      │ By parameter     │ Interval     │ Null         │
//! │ cache+guard  │ first match      │ ISO duration │              │
//! └──────┬───────┴────────┬─────────┴──────────────┴──────────────┘
//!        │                │
//! ┌──────┴────────────────┴───────────────────────────────────────┐
//! │ ObservationSource / ObservationSink                           │
//! │ SensorThingsClient (HTTP, auth, retry, rate limit) │ Memory   │
//! └───────────────────────────────────────────────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Observations, times and result values
pub mod model;

/// Result value equality
pub mod compare;

/// ISO-8601 durations
pub mod duration;

/// Time-window observation cache
pub mod cache;

/// Observation validators
pub mod validator;

/// Remote observation stores
pub mod remote;

/// Authentication for the SensorThings server
pub mod auth;

/// HTTP client with retry and rate limiting
pub mod http;

/// Importer configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::{load_config, load_config_from_str, ImporterConfig, ValidatorConfig};
pub use model::{Observation, ResultValue, StreamRef, TimeValue};
pub use remote::{MemoryStore, ObservationSink, ObservationSource, SensorThingsClient};
pub use validator::{Outcome, Validator};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
