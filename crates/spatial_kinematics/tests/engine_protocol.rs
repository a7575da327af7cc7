//! End-to-end tests of the JSON request protocol against an in-process engine

use serde_json::{json, Value};
use spatial_kinematics::{EngineConfig, KinematicsEngine};

/// Sends one JSON request and returns the JSON response.
fn exchange(engine: &mut KinematicsEngine, request: Value) -> Value {
    let envelope = engine.handle_value(request);
    serde_json::to_value(&envelope).unwrap()
}

fn ready_engine() -> KinematicsEngine {
    let mut engine = KinematicsEngine::new(EngineConfig::default());
    let ack = exchange(&mut engine, json!({"type": "init", "cellSize": 100, "token": "init"}));
    assert_eq!(ack["type"], "processed-ack");
    assert_eq!(ack["count"], 0);
    assert_eq!(ack["token"], "init");
    engine
}

#[test]
fn test_empty_grid_query_returns_nothing() {
    let mut engine = ready_engine();
    let response = exchange(
        &mut engine,
        json!({"type": "spatial-query", "center": {"x": 0, "y": 0, "z": 0}, "radius": 1000}),
    );
    assert_eq!(response, json!({"type": "query-result", "results": []}));
}

#[test]
fn test_full_session() {
    let mut engine = ready_engine();

    let ack = exchange(
        &mut engine,
        json!({
            "type": "process-entities",
            "token": "ingest",
            "entities": [
                {"id": "left", "position": {"x": -10, "y": 0, "z": 0}, "velocity": {"x": 1, "y": 0, "z": 0}},
                {"id": "right", "position": {"x": 10, "y": 0, "z": 0}, "velocity": {"x": -1, "y": 0, "z": 0}},
                {"id": "far", "position": {"x": 900, "y": 900, "z": 900}, "lastUpdated": 17}
            ]
        }),
    );
    assert_eq!(ack, json!({"type": "processed-ack", "count": 3, "token": "ingest"}));

    let trajectories = exchange(
        &mut engine,
        json!({"type": "calculate-trajectories", "entityIds": ["left", "ghost"], "steps": 2, "dt": 1.0}),
    );
    assert_eq!(
        trajectories["trajectories"],
        json!({"left": [{"x": -9.0, "y": 0.0, "z": 0.0}, {"x": -8.0, "y": 0.0, "z": 0.0}]})
    );

    let collisions = exchange(
        &mut engine,
        json!({"type": "predict-collisions", "timeWindow": 20, "timeStep": 1}),
    );
    assert_eq!(
        collisions["collisions"],
        json!([{"entity1": "left", "entity2": "right", "timeToCollision": 9.0}])
    );

    let path = exchange(
        &mut engine,
        json!({
            "type": "calculate-path",
            "start": {"x": 0, "y": 0, "z": 0},
            "end": {"x": 100, "y": 0, "z": 0}
        }),
    );
    assert_eq!(
        path["path"],
        json!([{"x": 0.0, "y": 0.0, "z": 0.0}, {"x": 100.0, "y": 0.0, "z": 0.0}])
    );

    let scores = exchange(
        &mut engine,
        json!({
            "type": "calculate-efficiency",
            "entityIds": ["left", "far"],
            "targets": {"left": {"x": 50, "y": 0, "z": 0}}
        }),
    );
    assert_eq!(scores["scores"], json!({"left": 100.0, "far": 100.0}));

    let removed = exchange(&mut engine, json!({"type": "remove-entities", "entityIds": ["far", "nobody"]}));
    assert_eq!(removed["count"], 1);

    let stats = exchange(&mut engine, json!({"type": "get-stats"}));
    assert_eq!(stats["type"], "stats-result");
    assert_eq!(stats["stats"]["initialized"], true);
    assert_eq!(stats["stats"]["grid"]["entitiesTracked"], 2);
    assert_eq!(stats["stats"]["grid"]["removals"], 1);
}

#[test]
fn test_every_non_init_request_fails_before_init() {
    let mut engine = KinematicsEngine::new(EngineConfig::default());
    let requests = [
        json!({"type": "process-entities", "entities": []}),
        json!({"type": "remove-entities", "entityIds": []}),
        json!({"type": "calculate-trajectories", "entityIds": [], "steps": 1, "dt": 1}),
        json!({"type": "spatial-query", "center": {"x": 0, "y": 0, "z": 0}, "radius": 1}),
        json!({"type": "predict-collisions", "timeWindow": 1, "timeStep": 1}),
        json!({"type": "calculate-path", "start": {"x": 0, "y": 0, "z": 0}, "end": {"x": 1, "y": 0, "z": 0}}),
        json!({"type": "calculate-efficiency", "entityIds": []}),
    ];

    for (i, mut request) in requests.into_iter().enumerate() {
        request["token"] = json!(format!("t{i}"));
        let response = exchange(&mut engine, request);
        assert_eq!(response["type"], "error");
        assert_eq!(response["token"], format!("t{i}"));
    }

    let stats = exchange(&mut engine, json!({"type": "get-stats"}));
    assert_eq!(stats["stats"]["initialized"], false);
    assert_eq!(stats["stats"]["requestsFailed"], 7);
}

#[test]
fn test_unknown_kind_is_named_in_error() {
    let mut engine = ready_engine();
    let response = exchange(&mut engine, json!({"type": "warp-drive", "token": "w"}));

    assert_eq!(response["type"], "error");
    assert_eq!(response["token"], "w");
    assert!(response["error"].as_str().unwrap().contains("warp-drive"));
}

#[test]
fn test_invalid_numbers_are_rejected() {
    let mut engine = ready_engine();
    let requests = [
        json!({"type": "init", "cellSize": 0}),
        json!({"type": "spatial-query", "center": {"x": 0, "y": 0, "z": 0}, "radius": -1}),
        json!({"type": "predict-collisions", "timeWindow": 10, "timeStep": 0}),
        json!({"type": "calculate-trajectories", "entityIds": [], "steps": 5, "dt": -0.5}),
        json!({"type": "calculate-path", "start": {"x": 0, "y": 0, "z": 0}, "end": {"x": 1, "y": 0, "z": 0}, "clearance": -3}),
    ];

    for request in requests {
        let response = exchange(&mut engine, request.clone());
        assert_eq!(response["type"], "error", "{request} should be rejected");
    }

    // The failed init must not have discarded the existing grid
    let stats = exchange(&mut engine, json!({"type": "get-stats"}));
    assert_eq!(stats["stats"]["cellSize"], 100.0);
}

#[test]
fn test_failed_batch_is_not_partially_applied() {
    let mut engine = ready_engine();
    let response = exchange(
        &mut engine,
        json!({
            "type": "process-entities",
            "entities": [
                {"id": "ok", "position": {"x": 0, "y": 0, "z": 0}},
                {"id": "", "position": {"x": 1, "y": 0, "z": 0}}
            ]
        }),
    );
    assert_eq!(response["type"], "error");

    let query = exchange(
        &mut engine,
        json!({"type": "spatial-query", "center": {"x": 0, "y": 0, "z": 0}, "radius": 50}),
    );
    assert_eq!(query["results"], json!([]));
}
