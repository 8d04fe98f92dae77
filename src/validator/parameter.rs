//! Duplicate detection by parameter value
//!
//! An observation is a duplicate when a record of the same stream already
//! carries the same value for a configured parameter, for instance an
//! external measurement id. Each call is a single remote lookup.

use super::types::{Outcome, Validator};
use crate::error::{Error, Result};
use crate::model::Observation;
use crate::remote::{Filter, ObservationSource};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Validator looking up existing records by a parameter value
pub struct ParameterValidator {
    source: Arc<dyn ObservationSource>,
    parameter_name: String,
    filter_path: String,
    update: bool,
}

impl ParameterValidator {
    /// Create a validator keyed on `parameter_name`
    ///
    /// The server is filtered on `parameters/<parameter_name>` unless a
    /// different path is set with [`Self::filter_path`].
    pub fn new(source: Arc<dyn ObservationSource>, parameter_name: impl Into<String>) -> Result<Self> {
        let parameter_name = parameter_name.into();
        if parameter_name.trim().is_empty() {
            return Err(Error::missing_field("parameter_name"));
        }

        Ok(Self {
            source,
            filter_path: format!("parameters/{parameter_name}"),
            parameter_name,
            update: false,
        })
    }

    /// Set the server-side property path compared against the parameter
    #[must_use]
    pub fn filter_path(mut self, path: impl Into<String>) -> Self {
        self.filter_path = path.into();
        self
    }

    /// Turn matches into updates of the existing record
    #[must_use]
    pub fn update(mut self, enabled: bool) -> Self {
        self.update = enabled;
        self
    }
}

#[async_trait]
impl Validator for ParameterValidator {
    fn name(&self) -> &'static str {
        "by_parameter"
    }

    async fn validate(&mut self, observation: &mut Observation) -> Result<Outcome> {
        let stream = observation.stream()?;
        let Some(value) = observation.parameters.get(&self.parameter_name) else {
            debug!(
                parameter = %self.parameter_name,
                observation = %observation.label(),
                "Observation lacks the key parameter"
            );
            return Ok(Outcome::MissingParameter);
        };

        let filter = Filter::field_eq(self.filter_path.as_str(), value.clone());
        let outcome = match self.source.first_match(&stream, &filter).await? {
            None => Outcome::New,
            Some(existing) if self.update => {
                observation.id = existing.id;
                Outcome::Update
            }
            Some(_) => Outcome::Conflict,
        };

        debug!(stream = %stream, filter = %filter, outcome = %outcome, "Validated observation");
        Ok(outcome)
    }
}

impl std::fmt::Debug for ParameterValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterValidator")
            .field("parameter_name", &self.parameter_name)
            .field("filter_path", &self.filter_path)
            .field("update", &self.update)
            .finish_non_exhaustive()
    }
}
