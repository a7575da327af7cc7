//! # Engine Façade
//!
//! [`KinematicsEngine`] owns the spatial grid and services one request at a
//! time. It is a plain value: whoever hosts it (normally the worker thread
//! started by [`crate::EngineBridge`]) owns it exclusively and drives it by
//! calling [`KinematicsEngine::handle`].
//!
//! ## Lifecycle
//!
//! The engine starts **uninitialized** and only accepts `init` (plus the
//! read-only `get-stats`). After the first `init` it is **ready** and
//! accepts every request; a later `init` rebuilds the grid from scratch.
//!
//! ## Failure handling
//!
//! Every request is validated in full before the grid is touched, so a
//! rejected request never leaves a partially applied batch behind. Errors
//! and panics are caught at the dispatch boundary and turned into `error`
//! responses that still carry the request's token.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::kinematics::{self, PathPlanner};
use crate::protocol::{EngineRequest, EngineResponse, RequestEnvelope, RequestToken, ResponseEnvelope};
use crate::spatial::{SpatialGrid, SpatialStats};
use crate::types::{EntityId, KinematicEntity, Vec3};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, info, warn};

/// Engine-level statistics reported by `get-stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStats {
    /// Whether an `init` request has been processed
    pub initialized: bool,
    /// Cell size of the current grid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_size: Option<f64>,
    /// Requests serviced, successful or not
    pub requests_handled: u64,
    /// Requests answered with an error
    pub requests_failed: u64,
    /// Panics caught at the dispatch boundary
    pub panics_caught: u64,
    /// Grid counters, once initialized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<SpatialStats>,
}

/// Spatial grid plus kinematics, driven by typed requests.
#[derive(Debug)]
pub struct KinematicsEngine {
    config: EngineConfig,
    /// `None` until the first `init`
    grid: Option<SpatialGrid>,
    requests_handled: u64,
    requests_failed: u64,
    panics_caught: u64,
}

impl KinematicsEngine {
    /// Creates an uninitialized engine.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            grid: None,
            requests_handled: 0,
            requests_failed: 0,
            panics_caught: 0,
        }
    }

    /// The configuration the engine was created with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Whether an `init` request has been processed.
    pub fn is_initialized(&self) -> bool {
        self.grid.is_some()
    }

    /// Read access to the grid, once initialized.
    pub fn grid(&self) -> Option<&SpatialGrid> {
        self.grid.as_ref()
    }

    /// Current statistics.
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            initialized: self.grid.is_some(),
            cell_size: self.grid.as_ref().map(SpatialGrid::cell_size),
            requests_handled: self.requests_handled,
            requests_failed: self.requests_failed,
            panics_caught: self.panics_caught,
            grid: self.grid.as_ref().map(SpatialGrid::stats),
        }
    }

    /// Services one typed request and returns its response.
    ///
    /// Never panics and never fails: every problem becomes an `error`
    /// response echoing the request's token.
    pub fn handle(&mut self, envelope: RequestEnvelope) -> ResponseEnvelope {
        let RequestEnvelope { token, request } = envelope;
        let kind = request.kind();
        debug!("servicing {} request (token: {:?})", kind, token);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(request)));
        self.requests_handled += 1;

        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!("{} request rejected: {}", kind, e);
                self.requests_failed += 1;
                EngineResponse::error(e)
            }
            Err(payload) => {
                let fault = EngineError::Internal(panic_message(payload.as_ref()));
                error!("❌ {} request panicked: {}", kind, fault);
                self.requests_failed += 1;
                self.panics_caught += 1;
                EngineResponse::error(fault)
            }
        };

        ResponseEnvelope { token, response }
    }

    /// Services one request given as raw JSON text.
    pub fn handle_json(&mut self, raw: &str) -> ResponseEnvelope {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => self.handle_value(value),
            Err(e) => self.reject(None, EngineError::MalformedRequest(e.to_string())),
        }
    }

    /// Services one request given as a JSON value.
    ///
    /// Unrecognized kinds are answered with an error naming the kind, and
    /// payloads that fail to decode with an error naming kind and reason.
    /// The token is echoed whenever it can be read as a string.
    pub fn handle_value(&mut self, value: Value) -> ResponseEnvelope {
        let token = value
            .get("token")
            .and_then(Value::as_str)
            .map(RequestToken::from);

        let kind = match value.get("type") {
            Some(Value::String(kind)) => kind.clone(),
            Some(other) => {
                return self.reject(
                    token,
                    EngineError::MalformedRequest(format!("request type must be a string, got {other}")),
                )
            }
            None => {
                return self.reject(
                    token,
                    EngineError::MalformedRequest("missing request type".to_string()),
                )
            }
        };

        if !EngineRequest::is_known_kind(&kind) {
            return self.reject(token, EngineError::UnknownRequest(kind));
        }

        match serde_json::from_value::<RequestEnvelope>(value) {
            Ok(envelope) => self.handle(envelope),
            Err(e) => self.reject(
                token,
                EngineError::MalformedPayload {
                    kind,
                    reason: e.to_string(),
                },
            ),
        }
    }

    fn reject(&mut self, token: Option<RequestToken>, e: EngineError) -> ResponseEnvelope {
        warn!("request rejected before dispatch: {}", e);
        self.requests_handled += 1;
        self.requests_failed += 1;
        ResponseEnvelope {
            token,
            response: EngineResponse::error(e),
        }
    }

    fn dispatch(&mut self, request: EngineRequest) -> Result<EngineResponse, EngineError> {
        let kind = request.kind();

        match request {
            EngineRequest::Init { cell_size } => self.init(cell_size),
            EngineRequest::GetStats => Ok(EngineResponse::StatsResult { stats: self.stats() }),
            EngineRequest::ProcessEntities { entities } => {
                let grid = self.ready_grid_mut(kind)?;
                process_entities(grid, entities)
            }
            EngineRequest::RemoveEntities { entity_ids } => {
                let grid = self.ready_grid_mut(kind)?;
                let removed = entity_ids.iter().filter(|id| grid.remove_entity(id)).count();
                debug!("removed {} of {} requested entities", removed, entity_ids.len());
                Ok(EngineResponse::ProcessedAck {
                    count: removed,
                    message: None,
                })
            }
            EngineRequest::CalculateTrajectories { entity_ids, steps, dt } => {
                let max_steps = self.config.max_prediction_steps;
                let grid = self.ready_grid(kind)?;
                calculate_trajectories(grid, &entity_ids, steps, dt, max_steps)
            }
            EngineRequest::SpatialQuery { center, radius } => {
                let grid = self.ready_grid(kind)?;
                ensure_finite_vec("center", center)?;
                ensure_non_negative("radius", radius)?;

                let mut results: Vec<EntityId> = grid.find_in_radius(center, radius).into_iter().collect();
                results.sort();
                Ok(EngineResponse::QueryResult { results })
            }
            EngineRequest::PredictCollisions { time_window, time_step } => {
                let grid = self.ready_grid(kind)?;
                predict_collisions(grid, &self.config, time_window, time_step)
            }
            EngineRequest::CalculatePath {
                start,
                end,
                obstacle_ids,
                clearance,
            } => {
                let grid = self.ready_grid(kind)?;
                ensure_finite_vec("start", start)?;
                ensure_finite_vec("end", end)?;
                let clearance = clearance.unwrap_or(self.config.path_clearance);
                ensure_non_negative("clearance", clearance)?;

                let obstacles: Vec<Vec3> = obstacle_ids
                    .iter()
                    .filter_map(|id| grid.get_entity(id))
                    .map(|entity| entity.position)
                    .collect();

                let planner = PathPlanner::new(clearance, self.config.max_path_depth);
                Ok(EngineResponse::PathResult {
                    path: planner.plan(start, end, &obstacles),
                })
            }
            EngineRequest::CalculateEfficiency { entity_ids, targets } => {
                let grid = self.ready_grid(kind)?;
                for (id, target) in &targets {
                    ensure_finite_vec(&format!("target for '{id}'"), *target)?;
                }

                let scores = entity_ids
                    .iter()
                    .filter_map(|id| grid.get_entity(id))
                    .map(|entity| {
                        let target = targets.get(&entity.id).copied();
                        (entity.id.clone(), kinematics::efficiency_score(entity, target))
                    })
                    .collect();
                Ok(EngineResponse::EfficiencyResult { scores })
            }
        }
    }

    fn init(&mut self, cell_size: Option<f64>) -> Result<EngineResponse, EngineError> {
        let cell_size = cell_size.unwrap_or(self.config.default_cell_size);
        ensure_positive("cellSize", cell_size)?;

        let replaced = self.grid.replace(SpatialGrid::new(cell_size));
        match replaced {
            Some(old) => info!(
                "🔄 Spatial grid rebuilt with cell size {} ({} entities dropped)",
                cell_size,
                old.entity_count()
            ),
            None => info!("🗺️ Spatial grid initialized with cell size {}", cell_size),
        }

        Ok(EngineResponse::ProcessedAck {
            count: 0,
            message: Some(format!("Spatial grid initialized with cell size {cell_size}")),
        })
    }

    fn ready_grid(&self, kind: &str) -> Result<&SpatialGrid, EngineError> {
        self.grid
            .as_ref()
            .ok_or_else(|| EngineError::NotInitialized(kind.to_string()))
    }

    fn ready_grid_mut(&mut self, kind: &str) -> Result<&mut SpatialGrid, EngineError> {
        self.grid
            .as_mut()
            .ok_or_else(|| EngineError::NotInitialized(kind.to_string()))
    }
}

// ============================================================================
// Request handlers
// ============================================================================

fn process_entities(
    grid: &mut SpatialGrid,
    entities: Vec<KinematicEntity>,
) -> Result<EngineResponse, EngineError> {
    // Validate the whole batch first; the grid is only touched once every record passes.
    for entity in &entities {
        if entity.id.as_str().is_empty() {
            return Err(EngineError::InvalidArgument("entity id must not be empty".to_string()));
        }
        if !entity.is_finite() {
            return Err(EngineError::InvalidArgument(format!(
                "entity '{}' has non-finite kinematics",
                entity.id
            )));
        }
    }

    let count = entities.len();
    for entity in entities {
        grid.update_entity(entity);
    }
    debug!("ingested {} entities ({} tracked)", count, grid.entity_count());

    Ok(EngineResponse::ProcessedAck { count, message: None })
}

fn calculate_trajectories(
    grid: &SpatialGrid,
    entity_ids: &[EntityId],
    steps: usize,
    dt: f64,
    max_steps: usize,
) -> Result<EngineResponse, EngineError> {
    if steps == 0 || steps > max_steps {
        return Err(EngineError::InvalidArgument(format!(
            "steps must be between 1 and {max_steps}, got {steps}"
        )));
    }
    ensure_positive("dt", dt)?;

    // Unknown IDs are skipped so the rest of the batch still gets results.
    let trajectories: HashMap<EntityId, Vec<Vec3>> = entity_ids
        .iter()
        .filter_map(|id| grid.get_entity(id))
        .map(|entity| (entity.id.clone(), kinematics::extrapolate(entity, steps, dt)))
        .collect();

    Ok(EngineResponse::TrajectoriesResult { trajectories })
}

fn predict_collisions(
    grid: &SpatialGrid,
    config: &EngineConfig,
    time_window: f64,
    time_step: f64,
) -> Result<EngineResponse, EngineError> {
    ensure_non_negative("timeWindow", time_window)?;
    ensure_positive("timeStep", time_step)?;
    let steps = kinematics::prediction_steps(time_window, time_step);
    if steps > config.max_prediction_steps {
        return Err(EngineError::InvalidArgument(format!(
            "timeWindow / timeStep needs {steps} steps, more than the limit of {}",
            config.max_prediction_steps
        )));
    }

    let mut entities: Vec<&KinematicEntity> = grid.entities().collect();
    entities.sort_by(|a, b| a.id.cmp(&b.id));

    let collisions = kinematics::predict_collisions(&entities, time_window, time_step, config.collision_radius);
    debug!(
        "predicted {} collisions across {} entities over {} steps",
        collisions.len(),
        entities.len(),
        steps
    );
    Ok(EngineResponse::CollisionResult { collisions })
}

// ============================================================================
// Validation helpers
// ============================================================================

fn ensure_positive(name: &str, value: f64) -> Result<(), EngineError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(EngineError::InvalidArgument(format!(
            "{name} must be positive and finite, got {value}"
        )))
    }
}

fn ensure_non_negative(name: &str, value: f64) -> Result<(), EngineError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(EngineError::InvalidArgument(format!(
            "{name} must be non-negative and finite, got {value}"
        )))
    }
}

fn ensure_finite_vec(name: &str, value: Vec3) -> Result<(), EngineError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(EngineError::InvalidArgument(format!("{name} must be finite, got {value:?}")))
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ready_engine() -> KinematicsEngine {
        let mut engine = KinematicsEngine::new(EngineConfig::default());
        let response = engine.handle(RequestEnvelope {
            token: None,
            request: EngineRequest::Init { cell_size: Some(100.0) },
        });
        assert!(!response.response.is_error());
        engine
    }

    fn send(engine: &mut KinematicsEngine, request: EngineRequest) -> EngineResponse {
        engine
            .handle(RequestEnvelope::new(RequestToken::from("t"), request))
            .response
    }

    fn ingest(engine: &mut KinematicsEngine, entities: Vec<KinematicEntity>) {
        let response = send(engine, EngineRequest::ProcessEntities { entities });
        assert!(matches!(response, EngineResponse::ProcessedAck { .. }));
    }

    #[test]
    fn test_uninitialized_engine_only_accepts_init() {
        let mut engine = KinematicsEngine::new(EngineConfig::default());
        let response = send(
            &mut engine,
            EngineRequest::SpatialQuery {
                center: Vec3::ZERO,
                radius: 1.0,
            },
        );

        match response {
            EngineResponse::Error { error } => assert!(error.contains("not initialized")),
            other => panic!("expected error, got {other:?}"),
        }
        assert!(!engine.is_initialized());
    }

    #[test]
    fn test_init_acknowledges_with_zero_count() {
        let mut engine = KinematicsEngine::new(EngineConfig::default());
        let response = send(&mut engine, EngineRequest::Init { cell_size: Some(25.0) });

        match response {
            EngineResponse::ProcessedAck { count, message } => {
                assert_eq!(count, 0);
                assert!(message.unwrap().contains("25"));
            }
            other => panic!("unexpected response {other:?}"),
        }
        assert_eq!(engine.grid().unwrap().cell_size(), 25.0);
    }

    #[test]
    fn test_init_without_cell_size_uses_config_default() {
        let mut engine = KinematicsEngine::new(EngineConfig {
            default_cell_size: 12.5,
            ..EngineConfig::default()
        });
        send(&mut engine, EngineRequest::Init { cell_size: None });
        assert_eq!(engine.grid().unwrap().cell_size(), 12.5);
    }

    #[test]
    fn test_init_rejects_bad_cell_size() {
        let mut engine = KinematicsEngine::new(EngineConfig::default());
        let response = send(&mut engine, EngineRequest::Init { cell_size: Some(-4.0) });
        assert!(response.is_error());
        assert!(!engine.is_initialized());
    }

    #[test]
    fn test_reinit_discards_entities() {
        let mut engine = ready_engine();
        ingest(&mut engine, vec![KinematicEntity::new("a", Vec3::ZERO)]);
        send(&mut engine, EngineRequest::Init { cell_size: Some(10.0) });

        let grid = engine.grid().unwrap();
        assert_eq!(grid.entity_count(), 0);
        assert_eq!(grid.cell_size(), 10.0);
    }

    #[test]
    fn test_invalid_batch_leaves_grid_untouched() {
        let mut engine = ready_engine();
        ingest(&mut engine, vec![KinematicEntity::new("keep", Vec3::ZERO)]);

        let response = send(
            &mut engine,
            EngineRequest::ProcessEntities {
                entities: vec![
                    KinematicEntity::new("new", Vec3::new(1.0, 1.0, 1.0)),
                    KinematicEntity::new("keep", Vec3::new(f64::NAN, 0.0, 0.0)),
                ],
            },
        );

        assert!(response.is_error());
        let grid = engine.grid().unwrap();
        assert_eq!(grid.entity_count(), 1);
        assert_eq!(grid.get_entity(&"keep".into()).unwrap().position, Vec3::ZERO);
    }

    #[test]
    fn test_trajectories_skip_missing_ids() {
        let mut engine = ready_engine();
        ingest(
            &mut engine,
            vec![KinematicEntity::new("known", Vec3::ZERO).with_velocity(Vec3::new(1.0, 0.0, 0.0))],
        );

        let response = send(
            &mut engine,
            EngineRequest::CalculateTrajectories {
                entity_ids: vec!["known".into(), "missing".into()],
                steps: 3,
                dt: 1.0,
            },
        );

        match response {
            EngineResponse::TrajectoriesResult { trajectories } => {
                assert_eq!(trajectories.len(), 1);
                assert_eq!(
                    trajectories[&EntityId::from("known")],
                    vec![
                        Vec3::new(1.0, 0.0, 0.0),
                        Vec3::new(2.0, 0.0, 0.0),
                        Vec3::new(3.0, 0.0, 0.0),
                    ]
                );
            }
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[test]
    fn test_trajectories_reject_bad_steps() {
        let mut engine = ready_engine();
        for (steps, dt) in [(0usize, 1.0), (1, 0.0), (1, -1.0), (1_000_000, 0.1)] {
            let response = send(
                &mut engine,
                EngineRequest::CalculateTrajectories {
                    entity_ids: vec![],
                    steps,
                    dt,
                },
            );
            assert!(response.is_error(), "steps={steps} dt={dt} should be rejected");
        }
    }

    #[test]
    fn test_spatial_query_sorted_results() {
        let mut engine = ready_engine();
        ingest(
            &mut engine,
            vec![
                KinematicEntity::new("charlie", Vec3::new(1.0, 0.0, 0.0)),
                KinematicEntity::new("alpha", Vec3::new(0.0, 1.0, 0.0)),
                KinematicEntity::new("bravo", Vec3::new(0.0, 0.0, 1.0)),
                KinematicEntity::new("zulu", Vec3::new(500.0, 0.0, 0.0)),
            ],
        );

        let response = send(
            &mut engine,
            EngineRequest::SpatialQuery {
                center: Vec3::ZERO,
                radius: 5.0,
            },
        );
        assert_eq!(
            response,
            EngineResponse::QueryResult {
                results: vec!["alpha".into(), "bravo".into(), "charlie".into()],
            }
        );
    }

    #[test]
    fn test_collisions_enumerated_by_sorted_id() {
        let mut engine = ready_engine();
        ingest(
            &mut engine,
            vec![
                KinematicEntity::new("b", Vec3::new(10.0, 0.0, 0.0)).with_velocity(Vec3::new(-1.0, 0.0, 0.0)),
                KinematicEntity::new("a", Vec3::new(-10.0, 0.0, 0.0)).with_velocity(Vec3::new(1.0, 0.0, 0.0)),
            ],
        );

        let response = send(
            &mut engine,
            EngineRequest::PredictCollisions {
                time_window: 20.0,
                time_step: 1.0,
            },
        );
        match response {
            EngineResponse::CollisionResult { collisions } => {
                assert_eq!(collisions.len(), 1);
                assert_eq!(collisions[0].entity1, "a".into());
                assert_eq!(collisions[0].entity2, "b".into());
            }
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[test]
    fn test_collision_step_limit() {
        let mut engine = ready_engine();
        let response = send(
            &mut engine,
            EngineRequest::PredictCollisions {
                time_window: 1.0e9,
                time_step: 1.0,
            },
        );
        assert!(response.is_error());
    }

    #[test]
    fn test_path_ignores_unknown_obstacles() {
        let mut engine = ready_engine();
        ingest(&mut engine, vec![KinematicEntity::new("rock", Vec3::new(5.0, 0.0, 0.0))]);

        let response = send(
            &mut engine,
            EngineRequest::CalculatePath {
                start: Vec3::ZERO,
                end: Vec3::new(10.0, 0.0, 0.0),
                obstacle_ids: vec!["ghost".into()],
                clearance: Some(1.0),
            },
        );
        assert_eq!(
            response,
            EngineResponse::PathResult {
                path: vec![Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0)],
            }
        );

        let response = send(
            &mut engine,
            EngineRequest::CalculatePath {
                start: Vec3::ZERO,
                end: Vec3::new(10.0, 0.0, 0.0),
                obstacle_ids: vec!["rock".into(), "ghost".into()],
                clearance: Some(1.0),
            },
        );
        match response {
            EngineResponse::PathResult { path } => assert_eq!(path.len(), 3),
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[test]
    fn test_efficiency_skips_missing_and_uses_targets() {
        let mut engine = ready_engine();
        ingest(
            &mut engine,
            vec![
                KinematicEntity::new("fwd", Vec3::ZERO).with_velocity(Vec3::new(1.0, 0.0, 0.0)),
                KinematicEntity::new("back", Vec3::ZERO).with_velocity(Vec3::new(-1.0, 0.0, 0.0)),
            ],
        );

        let target = Vec3::new(10.0, 0.0, 0.0);
        let response = send(
            &mut engine,
            EngineRequest::CalculateEfficiency {
                entity_ids: vec!["fwd".into(), "back".into(), "nobody".into()],
                targets: HashMap::from([("fwd".into(), target), ("back".into(), target)]),
            },
        );

        match response {
            EngineResponse::EfficiencyResult { scores } => {
                assert_eq!(scores.len(), 2);
                assert_eq!(scores[&EntityId::from("fwd")], 100.0);
                assert_eq!(scores[&EntityId::from("back")], 40.0);
            }
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[test]
    fn test_remove_entities_counts_only_known() {
        let mut engine = ready_engine();
        ingest(&mut engine, vec![KinematicEntity::new("a", Vec3::ZERO)]);

        let response = send(
            &mut engine,
            EngineRequest::RemoveEntities {
                entity_ids: vec!["a".into(), "b".into()],
            },
        );
        assert_eq!(
            response,
            EngineResponse::ProcessedAck {
                count: 1,
                message: None
            }
        );
        assert_eq!(engine.grid().unwrap().entity_count(), 0);
    }

    #[test]
    fn test_unknown_kind_names_kind_and_echoes_token() {
        let mut engine = ready_engine();
        let envelope = engine.handle_value(json!({"type": "teleport", "token": "tok-42"}));

        assert_eq!(envelope.token, Some(RequestToken::from("tok-42")));
        match envelope.response {
            EngineResponse::Error { error } => assert!(error.contains("teleport")),
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[test]
    fn test_malformed_payload_is_reported() {
        let mut engine = ready_engine();
        let envelope = engine.handle_json(r#"{"type":"spatial-query","radius":"far","token":"m"}"#);

        assert_eq!(envelope.token, Some(RequestToken::from("m")));
        match envelope.response {
            EngineResponse::Error { error } => assert!(error.contains("spatial-query")),
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[test]
    fn test_non_json_and_missing_type() {
        let mut engine = ready_engine();
        assert!(engine.handle_json("not json").response.is_error());
        assert!(engine.handle_value(json!({"radius": 1})).response.is_error());
        assert!(engine.handle_value(json!({"type": 7})).response.is_error());
    }

    #[test]
    fn test_raw_request_round_trip() {
        let mut engine = KinematicsEngine::new(EngineConfig::default());
        engine.handle_json(r#"{"type":"init","cellSize":100}"#);
        engine.handle_json(
            r#"{"type":"process-entities","entities":[
                {"id":"a","position":{"x":0,"y":0,"z":0}},
                {"id":"b","position":{"x":500,"y":0,"z":0}}
            ]}"#,
        );

        let envelope = engine.handle_json(
            r#"{"type":"spatial-query","center":{"x":0,"y":0,"z":0},"radius":10,"token":"q"}"#,
        );
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value, json!({"type": "query-result", "results": ["a"], "token": "q"}));
    }

    #[test]
    fn test_stats_count_requests_and_failures() {
        let mut engine = ready_engine();
        engine.handle_value(json!({"type": "bogus"}));
        ingest(&mut engine, vec![KinematicEntity::new("a", Vec3::ZERO)]);

        let stats = engine.stats();
        assert!(stats.initialized);
        assert_eq!(stats.cell_size, Some(100.0));
        assert_eq!(stats.requests_handled, 3);
        assert_eq!(stats.requests_failed, 1);
        assert_eq!(stats.grid.unwrap().entities_tracked, 1);
    }

    #[test]
    fn test_panic_message_extraction() {
        let from_str: Box<dyn std::any::Any + Send> = Box::new("boom");
        let from_string: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(from_str.as_ref()), "boom");
        assert_eq!(panic_message(from_string.as_ref()), "bang");
    }
}
