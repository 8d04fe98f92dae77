//! Authentication module
//!
//! Supports: None, Basic, Bearer, API Key
//!
//! The `Authenticator` applies the configured credentials to every request
//! sent to the SensorThings server.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::{AuthConfig, Location};
