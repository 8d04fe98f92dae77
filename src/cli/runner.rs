//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::{load_config, ImporterConfig};
use crate::error::{Error, Result, ResultExt};
use crate::model::Observation;
use crate::remote::SensorThingsClient;
use crate::types::JsonValue;
use crate::validator::{Outcome, Validator};
use serde_json::json;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Counts collected while validating a batch of observations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationSummary {
    /// Observations per outcome
    pub outcomes: BTreeMap<Outcome, usize>,
    /// Lines that could not be validated
    pub errors: usize,
}

impl ValidationSummary {
    /// Number of observations classified as valid
    pub fn valid(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(outcome, _)| outcome.is_valid())
            .map(|(_, count)| count)
            .sum()
    }

    /// Number of observations classified as invalid
    pub fn invalid(&self) -> usize {
        self.outcomes.values().sum::<usize>() - self.valid()
    }

    fn record(&mut self, outcome: Outcome) {
        *self.outcomes.entry(outcome).or_default() += 1;
    }
}

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = load_config(&self.cli.config)
            .with_context(|| format!("loading {}", self.cli.config.display()))?;

        match &self.cli.command {
            Commands::Check { connect } => self.check(&config, *connect).await,
            Commands::Validate { input, fail_fast } => {
                let file = File::open(input).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        Error::FileNotFound {
                            path: input.display().to_string(),
                        }
                    } else {
                        Error::Io(e)
                    }
                })?;

                let mut validator = build_validator(&config)?;
                let stdout = std::io::stdout();
                let summary = validate_lines(
                    validator.as_mut(),
                    BufReader::new(file),
                    &mut stdout.lock(),
                    *fail_fast,
                )
                .await?;

                if summary.errors > 0 {
                    warn!(errors = summary.errors, "Some observations could not be validated");
                }
                Ok(())
            }
        }
    }

    /// Check the configuration, optionally reaching the server
    async fn check(&self, config: &ImporterConfig, connect: bool) -> Result<()> {
        let validator = build_validator(config)?;
        info!(
            validator = validator.name(),
            server = %config.server.base_url,
            auth = config.server.auth.kind(),
            "Configuration is valid"
        );

        if connect {
            let http = config.server.http_client()?;
            let root: JsonValue = http.get_json(http.base_url().clone()).await?;
            let entity_sets = root
                .get("value")
                .and_then(JsonValue::as_array)
                .map_or(0, Vec::len);
            info!(entity_sets, "Server is reachable");
        }

        Ok(())
    }
}

/// Build the configured validator over the configured server
pub fn build_validator(config: &ImporterConfig) -> Result<Box<dyn Validator>> {
    let store: Arc<SensorThingsClient> = Arc::new(config.server.connect()?);
    config.validator.build(store.clone(), store)
}

/// Validate observations read as JSON lines, writing one JSON result line
/// per observation
///
/// Blank lines are skipped. Unparseable lines and validation errors are
/// reported as `{"line", "error"}`; with `fail_fast` the first of them is
/// returned as an error instead.
pub async fn validate_lines<R: BufRead, W: Write>(
    validator: &mut dyn Validator,
    reader: R,
    out: &mut W,
    fail_fast: bool,
) -> Result<ValidationSummary> {
    let started = Instant::now();
    let mut summary = ValidationSummary::default();

    for (index, line) in reader.lines().enumerate() {
        let number = index + 1;
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let result = match serde_json::from_str::<Observation>(&line) {
            Ok(mut observation) => validator
                .validate(&mut observation)
                .await
                .map(|outcome| (outcome, observation)),
            Err(e) => Err(Error::JsonParse(e)),
        };

        let message = match result {
            Ok((outcome, observation)) => {
                summary.record(outcome);
                json!({
                    "line": number,
                    "outcome": outcome,
                    "valid": outcome.is_valid(),
                    "id": observation.id,
                })
            }
            Err(e) if fail_fast => {
                return Err(Error::Other(format!("line {number}: {e}")));
            }
            Err(e) => {
                summary.errors += 1;
                warn!(line = number, error = %e, "Failed to validate observation");
                json!({ "line": number, "error": e.to_string() })
            }
        };
        writeln!(out, "{message}")?;
    }

    info!(
        validator = validator.name(),
        valid = summary.valid(),
        invalid = summary.invalid(),
        errors = summary.errors,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Validation finished"
    );
    Ok(summary)
}
