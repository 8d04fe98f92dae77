//! Interval length validation
//!
//! Checks that an observation covers exactly the configured duration, for
//! example that hourly aggregates really span one hour.

use super::types::{Outcome, Validator};
use crate::duration::IsoDuration;
use crate::error::Result;
use crate::model::{Observation, TimeValue};
use async_trait::async_trait;
use tracing::debug;

/// Validator checking `end - start` of interval observations
#[derive(Debug, Clone)]
pub struct IntervalValidator {
    duration: IsoDuration,
}

impl IntervalValidator {
    /// Create a validator from an ISO-8601 duration such as `PT1H`
    pub fn new(duration: &str) -> Result<Self> {
        Ok(Self {
            duration: duration.parse()?,
        })
    }

    /// Create a validator from a parsed duration
    pub fn from_duration(duration: IsoDuration) -> Self {
        Self { duration }
    }

    /// The expected duration
    pub fn duration(&self) -> IsoDuration {
        self.duration
    }

    /// Check a time value
    ///
    /// The expected end is the start moved by the duration on its own wall
    /// clock, resolved with the start's or the end's UTC offset, so a day
    /// that crosses a daylight saving change still ends at midnight.
    pub fn check(&self, time: &TimeValue) -> Outcome {
        let TimeValue::Interval { start, end } = time else {
            return Outcome::NotAnInterval;
        };

        let matches = [*start.offset(), *end.offset()]
            .into_iter()
            .filter_map(|offset| self.duration.add_in_offset(start, offset))
            .any(|expected| expected == *end);

        if matches {
            Outcome::New
        } else {
            Outcome::IntervalMismatch
        }
    }
}

#[async_trait]
impl Validator for IntervalValidator {
    fn name(&self) -> &'static str {
        "check_time_interval"
    }

    async fn validate(&mut self, observation: &mut Observation) -> Result<Outcome> {
        let outcome = self.check(&observation.phenomenon_time);
        debug!(
            time = %observation.phenomenon_time,
            expected = %self.duration,
            outcome = %outcome,
            "Checked observation interval"
        );
        Ok(outcome)
    }
}
