//! Observations, their time attribute and stream references
//!
//! The JSON form follows the SensorThings entity layout (`@iot.id`,
//! `phenomenonTime`, `result`, `parameters`, `Datastream`, `MultiDatastream`).

use super::value::ResultValue;
use crate::error::{Error, Result};
use crate::types::JsonObject;
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Entity Ids
// ============================================================================

/// Server-assigned entity id (`@iot.id`), numeric or textual
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Int(i64),
    Text(String),
}

impl EntityId {
    /// Render as an OData key segment: `5` or `'abc'`
    pub fn to_key_segment(&self) -> String {
        match self {
            Self::Int(id) => id.to_string(),
            Self::Text(id) => format!("'{}'", id.replace('\'', "''")),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

impl From<i32> for EntityId {
    fn from(id: i32) -> Self {
        Self::Int(i64::from(id))
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_string())
    }
}

/// Navigation link to a parent entity: `{"@iot.id": 5}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    #[serde(rename = "@iot.id")]
    pub id: EntityId,
}

// ============================================================================
// Streams
// ============================================================================

/// The kind of time series an observation belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Datastream,
    MultiDatastream,
}

impl StreamKind {
    /// Entity set name on the server
    pub fn entity_set(self) -> &'static str {
        match self {
            Self::Datastream => "Datastreams",
            Self::MultiDatastream => "MultiDatastreams",
        }
    }
}

/// Reference to the single- or multi-result stream owning an observation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StreamRef {
    Datastream(EntityId),
    MultiDatastream(EntityId),
}

impl StreamRef {
    /// Stream kind
    pub fn kind(&self) -> StreamKind {
        match self {
            Self::Datastream(_) => StreamKind::Datastream,
            Self::MultiDatastream(_) => StreamKind::MultiDatastream,
        }
    }

    /// Stream id
    pub fn id(&self) -> &EntityId {
        match self {
            Self::Datastream(id) | Self::MultiDatastream(id) => id,
        }
    }

    /// Path of the stream's observation collection, relative to the service root
    pub fn observations_path(&self) -> String {
        format!(
            "{}({})/Observations",
            self.kind().entity_set(),
            self.id().to_key_segment()
        )
    }
}

impl fmt::Display for StreamRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({})",
            self.kind().entity_set(),
            self.id().to_key_segment()
        )
    }
}

// ============================================================================
// Time
// ============================================================================

/// The `phenomenonTime` of an observation: an instant or a closed interval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TimeValue {
    Instant(DateTime<FixedOffset>),
    Interval {
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    },
}

impl TimeValue {
    /// Create an interval, rejecting an end before the start
    pub fn interval(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Result<Self> {
        if end < start {
            return Err(Error::invalid_time(
                format!("{}/{}", format_time(&start), format_time(&end)),
                "interval ends before it starts",
            ));
        }
        Ok(Self::Interval { start, end })
    }

    /// Parse `<instant>` or `<start>/<end>` (RFC 3339)
    pub fn parse(text: &str) -> Result<Self> {
        let parse_one = |s: &str| {
            DateTime::parse_from_rfc3339(s.trim())
                .map_err(|e| Error::invalid_time(text, e.to_string()))
        };

        match text.split_once('/') {
            Some((start, end)) => Self::interval(parse_one(start)?, parse_one(end)?),
            None => Ok(Self::Instant(parse_one(text)?)),
        }
    }

    /// The instant, or the interval start
    pub fn start(&self) -> DateTime<FixedOffset> {
        match self {
            Self::Instant(t) => *t,
            Self::Interval { start, .. } => *start,
        }
    }

    /// Cache key: the start normalized to UTC
    pub fn key(&self) -> DateTime<Utc> {
        self.start().with_timezone(&Utc)
    }

    /// Check if this is an interval
    pub fn is_interval(&self) -> bool {
        matches!(self, Self::Interval { .. })
    }
}

impl From<DateTime<Utc>> for TimeValue {
    fn from(t: DateTime<Utc>) -> Self {
        Self::Instant(t.fixed_offset())
    }
}

impl TryFrom<String> for TimeValue {
    type Error = Error;

    fn try_from(text: String) -> Result<Self> {
        Self::parse(&text)
    }
}

impl From<TimeValue> for String {
    fn from(time: TimeValue) -> Self {
        time.to_string()
    }
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instant(t) => f.write_str(&format_time(t)),
            Self::Interval { start, end } => {
                write!(f, "{}/{}", format_time(start), format_time(end))
            }
        }
    }
}

fn format_time(t: &DateTime<FixedOffset>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

// ============================================================================
// Observation
// ============================================================================

/// A single timestamped measurement tied to one stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Unset until the observation has been persisted
    #[serde(rename = "@iot.id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,

    #[serde(rename = "phenomenonTime")]
    pub phenomenon_time: TimeValue,

    #[serde(default)]
    pub result: ResultValue,

    #[serde(default, skip_serializing_if = "JsonObject::is_empty")]
    pub parameters: JsonObject,

    #[serde(rename = "Datastream", default, skip_serializing_if = "Option::is_none")]
    pub datastream: Option<EntityRef>,

    #[serde(
        rename = "MultiDatastream",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub multi_datastream: Option<EntityRef>,
}

impl Observation {
    /// Create an unpersisted observation
    pub fn new(phenomenon_time: impl Into<TimeValue>, result: impl Into<ResultValue>) -> Self {
        Self {
            id: None,
            phenomenon_time: phenomenon_time.into(),
            result: result.into(),
            parameters: JsonObject::new(),
            datastream: None,
            multi_datastream: None,
        }
    }

    /// Set the id
    #[must_use]
    pub fn with_id(mut self, id: impl Into<EntityId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Attach to a stream, replacing any previous stream reference
    #[must_use]
    pub fn with_stream(mut self, stream: &StreamRef) -> Self {
        self.set_stream(stream);
        self
    }

    /// Add a named parameter
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    /// Attach to a stream, replacing any previous stream reference
    pub fn set_stream(&mut self, stream: &StreamRef) {
        let link = Some(EntityRef {
            id: stream.id().clone(),
        });
        match stream.kind() {
            StreamKind::Datastream => {
                self.datastream = link;
                self.multi_datastream = None;
            }
            StreamKind::MultiDatastream => {
                self.multi_datastream = link;
                self.datastream = None;
            }
        }
    }

    /// Resolve the owning stream
    pub fn stream(&self) -> Result<StreamRef> {
        match (&self.datastream, &self.multi_datastream) {
            (Some(ds), None) => Ok(StreamRef::Datastream(ds.id.clone())),
            (None, Some(mds)) => Ok(StreamRef::MultiDatastream(mds.id.clone())),
            (None, None) => Err(Error::MissingStreamReference {
                observation: self.label(),
            }),
            (Some(_), Some(_)) => Err(Error::invalid_observation(format!(
                "observation {} references both a Datastream and a MultiDatastream",
                self.label()
            ))),
        }
    }

    /// Cache key of this observation's time
    pub fn time_key(&self) -> DateTime<Utc> {
        self.phenomenon_time.key()
    }

    /// Human-readable identifier for logs and errors
    pub fn label(&self) -> String {
        match &self.id {
            Some(id) => id.to_string(),
            None => format!("(new @ {})", self.phenomenon_time),
        }
    }
}
