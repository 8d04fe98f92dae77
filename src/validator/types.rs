//! Validator trait and outcomes

use crate::error::Result;
use crate::model::Observation;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of an incoming observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Admitted without any check
    Unchecked,
    /// No matching record on the server; insert it
    New,
    /// A record with a different result exists; the observation now carries
    /// its id so the upload becomes an update
    Update,
    /// An identical record exists but duplicates are admitted by policy
    AdmittedDuplicate,
    /// An identical record already exists
    Duplicate,
    /// A record with a different result exists and updates are disabled
    Conflict,
    /// The observation time is a single instant where an interval is required
    NotAnInterval,
    /// The interval length does not match the configured duration
    IntervalMismatch,
    /// The parameter the validator keys on is absent
    MissingParameter,
}

impl Outcome {
    /// Check if the observation should be uploaded
    pub fn is_valid(self) -> bool {
        matches!(
            self,
            Self::Unchecked | Self::New | Self::Update | Self::AdmittedDuplicate
        )
    }

    /// Snake-case name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unchecked => "unchecked",
            Self::New => "new",
            Self::Update => "update",
            Self::AdmittedDuplicate => "admitted_duplicate",
            Self::Duplicate => "duplicate",
            Self::Conflict => "conflict",
            Self::NotAnInterval => "not_an_interval",
            Self::IntervalMismatch => "interval_mismatch",
            Self::MissingParameter => "missing_parameter",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides whether an observation should be uploaded
///
/// Calls must be made one at a time, in time order within a stream where
/// possible. A validator may change the observation (adopting the id of an
/// existing record) and may have remote side effects.
#[async_trait]
pub trait Validator: Send {
    /// Validator name, as used in configuration
    fn name(&self) -> &'static str;

    /// Classify one observation
    async fn validate(&mut self, observation: &mut Observation) -> Result<Outcome>;
}

#[cfg(test)]
mod type_tests {
    use super::*;

    #[test]
    fn test_outcome_validity() {
        assert!(Outcome::New.is_valid());
        assert!(Outcome::Update.is_valid());
        assert!(Outcome::AdmittedDuplicate.is_valid());
        assert!(!Outcome::Duplicate.is_valid());
        assert!(!Outcome::Conflict.is_valid());
        assert!(!Outcome::IntervalMismatch.is_valid());
    }

    #[test]
    fn test_outcome_names_match_serde() {
        for outcome in [Outcome::AdmittedDuplicate, Outcome::NotAnInterval, Outcome::New] {
            let json = serde_json::to_value(outcome).unwrap();
            assert_eq!(json, serde_json::Value::String(outcome.to_string()));
        }
    }
}
