//! Integration tests using a mock SensorThings server
//!
//! Tests the full flow: YAML config → validator → OData requests → outcomes

use serde_json::{json, Value};
use sta_validator::config::load_config_from_str;
use sta_validator::model::EntityId;
use sta_validator::{Observation, Outcome, SensorThingsClient, Validator};
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Helpers
// ============================================================================

fn validator_for(server: &MockServer, validator_yaml: &str) -> Box<dyn Validator> {
    let yaml = format!(
        r#"
server:
  base_url: "{}/v1.1"
  http:
    max_retries: 0
    requests_per_second: 0
validator:
{validator_yaml}
"#,
        server.uri()
    );
    let config = load_config_from_str(&yaml).unwrap();
    let store: Arc<SensorThingsClient> = Arc::new(config.server.connect().unwrap());
    config.validator.build(store.clone(), store).unwrap()
}

fn observation(datastream: i64, time: &str, result: Value) -> Observation {
    serde_json::from_value(json!({
        "phenomenonTime": time,
        "result": result,
        "Datastream": {"@iot.id": datastream}
    }))
    .unwrap()
}

fn record(id: i64, time: &str, result: Value) -> Value {
    json!({"@iot.id": id, "phenomenonTime": time, "result": result})
}

fn page(records: &[Value]) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "value": records }))
}

// ============================================================================
// Duplicate Detection by Phenomenon Time
// ============================================================================

#[tokio::test]
async fn test_duplicates_updates_and_new_from_one_fetch() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1.1/Datastreams(7)/Observations"))
        .and(query_param(
            "$filter",
            "phenomenonTime ge 2024-01-01T10:00:00Z",
        ))
        .and(query_param("$orderby", "phenomenonTime asc"))
        .and(query_param("$top", "1000"))
        .respond_with(page(&[
            record(100, "2024-01-01T10:00:00Z", json!(1)),
            record(101, "2024-01-01T10:05:00Z", json!(2.5)),
        ]))
        .expect(1)
        .mount(&server)
        .await;

    let mut validator = validator_for(&server, "  type: by_phenomenon_time\n  update: true");

    let mut same = observation(7, "2024-01-01T10:00:00Z", json!(1.0));
    assert_eq!(validator.validate(&mut same).await.unwrap(), Outcome::Duplicate);

    let mut changed = observation(7, "2024-01-01T10:05:00Z", json!(3));
    assert_eq!(validator.validate(&mut changed).await.unwrap(), Outcome::Update);
    assert_eq!(changed.id, Some(EntityId::Int(101)));

    let mut fresh = observation(7, "2024-01-01T10:10:00Z", json!(4));
    assert_eq!(validator.validate(&mut fresh).await.unwrap(), Outcome::New);

    // Re-sending what was just admitted is caught locally
    let mut again = observation(7, "2024-01-01T10:10:00Z", json!(4));
    assert_eq!(validator.validate(&mut again).await.unwrap(), Outcome::Duplicate);
}

#[tokio::test]
async fn test_conflict_without_update() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1.1/Datastreams(7)/Observations"))
        .respond_with(page(&[record(100, "2024-01-01T10:00:00Z", json!("on"))]))
        .mount(&server)
        .await;

    let mut validator = validator_for(&server, "  type: by_phenomenon_time");

    let mut obs = observation(7, "2024-01-01T10:00:00Z", json!("off"));
    assert_eq!(validator.validate(&mut obs).await.unwrap(), Outcome::Conflict);
    assert!(obs.id.is_none());
}

#[tokio::test]
async fn test_earlier_observation_extends_window_backward() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1.1/Datastreams(7)/Observations"))
        .and(query_param(
            "$filter",
            "phenomenonTime ge 2024-01-01T10:05:00Z",
        ))
        .respond_with(page(&[]))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1.1/Datastreams(7)/Observations"))
        .and(query_param(
            "$filter",
            "phenomenonTime ge 2024-01-01T10:00:00Z and phenomenonTime le 2024-01-01T10:05:00Z",
        ))
        .respond_with(page(&[record(100, "2024-01-01T10:00:00Z", json!(1))]))
        .expect(1)
        .mount(&server)
        .await;

    let mut validator = validator_for(&server, "  type: by_phenomenon_time");

    let mut later = observation(7, "2024-01-01T10:05:00Z", json!(2));
    assert_eq!(validator.validate(&mut later).await.unwrap(), Outcome::New);

    let mut earlier = observation(7, "2024-01-01T10:00:00Z", json!(1));
    assert_eq!(validator.validate(&mut earlier).await.unwrap(), Outcome::Duplicate);
}

#[tokio::test]
async fn test_stream_switch_refetches() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1.1/Datastreams(1)/Observations"))
        .respond_with(page(&[record(10, "2024-01-01T10:00:00Z", json!(1))]))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1.1/Datastreams(2)/Observations"))
        .respond_with(page(&[]))
        .expect(1)
        .mount(&server)
        .await;

    let mut validator = validator_for(&server, "  type: by_phenomenon_time");

    for (datastream, expected) in [
        (1, Outcome::Duplicate),
        (2, Outcome::New),
        (1, Outcome::Duplicate),
    ] {
        let mut obs = observation(datastream, "2024-01-01T10:00:00Z", json!(1));
        assert_eq!(validator.validate(&mut obs).await.unwrap(), expected);
    }
}

#[tokio::test]
async fn test_remote_duplicates_are_deleted() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1.1/Datastreams(7)/Observations"))
        .respond_with(page(&[
            record(1, "2024-01-01T10:00:00Z", json!(1)),
            record(2, "2024-01-01T10:00:00Z", json!(1)),
        ]))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/v1.1/Observations(1)"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut validator = validator_for(
        &server,
        "  type: by_phenomenon_time\n  delete_duplicates: true",
    );

    let mut obs = observation(7, "2024-01-01T10:00:00Z", json!(1));
    assert_eq!(validator.validate(&mut obs).await.unwrap(), Outcome::Duplicate);
}

#[tokio::test]
async fn test_uncached_lookup_per_observation() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1.1/Datastreams(7)/Observations"))
        .and(query_param(
            "$filter",
            "phenomenonTime eq 2024-01-01T10:00:00Z",
        ))
        .and(query_param("$top", "1"))
        .respond_with(page(&[record(1, "2024-01-01T10:00:00Z", json!(1))]))
        .expect(2)
        .mount(&server)
        .await;

    let mut validator = validator_for(
        &server,
        "  type: by_phenomenon_time\n  cache_observations: false\n  admit_duplicates: true",
    );

    for _ in 0..2 {
        let mut obs = observation(7, "2024-01-01T10:00:00Z", json!(1));
        assert_eq!(
            validator.validate(&mut obs).await.unwrap(),
            Outcome::AdmittedDuplicate
        );
    }
}

#[tokio::test]
async fn test_server_failure_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut validator = validator_for(&server, "  type: by_phenomenon_time");

    let mut obs = observation(7, "2024-01-01T10:00:00Z", json!(1));
    let err = validator.validate(&mut obs).await.unwrap_err();
    assert!(err.is_remote_failure());
}

// ============================================================================
// Other Validators
// ============================================================================

#[tokio::test]
async fn test_parameter_validator() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1.1/Datastreams(7)/Observations"))
        .and(query_param("$filter", "parameters/source_id eq 'abc'"))
        .and(query_param("$top", "1"))
        .respond_with(page(&[record(55, "2024-01-01T09:00:00Z", json!(1))]))
        .expect(1)
        .mount(&server)
        .await;

    let mut validator = validator_for(
        &server,
        "  type: by_parameter\n  parameter_name: source_id\n  update: true",
    );

    let mut obs = observation(7, "2024-01-01T10:00:00Z", json!(2));
    obs.parameters.insert("source_id".to_string(), json!("abc"));
    assert_eq!(validator.validate(&mut obs).await.unwrap(), Outcome::Update);
    assert_eq!(obs.id, Some(EntityId::Int(55)));
}

#[tokio::test]
async fn test_interval_validator_never_calls_server() {
    let server = MockServer::start().await;
    let mut validator = validator_for(&server, "  type: check_time_interval\n  duration: PT1H");

    let mut hourly = observation(7, "2024-01-01T10:00:00Z/2024-01-01T11:00:00Z", json!(1));
    let mut long = observation(7, "2024-01-01T10:00:00Z/2024-01-01T11:00:01Z", json!(1));
    let mut instant = observation(7, "2024-01-01T10:00:00Z", json!(1));

    assert_eq!(validator.validate(&mut hourly).await.unwrap(), Outcome::New);
    assert_eq!(
        validator.validate(&mut long).await.unwrap(),
        Outcome::IntervalMismatch
    );
    assert_eq!(
        validator.validate(&mut instant).await.unwrap(),
        Outcome::NotAnInterval
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}
