//! # Engine Wire Protocol
//!
//! Typed request and response messages exchanged with the engine. Messages
//! are JSON objects internally tagged by `type` (kebab-case kind names) with
//! camelCase fields, plus an optional opaque `token` that the engine echoes
//! back unchanged:
//!
//! ```json
//! {"type": "spatial-query", "center": {"x": 0, "y": 0, "z": 0}, "radius": 10, "token": "q-1"}
//! {"type": "query-result", "results": ["a"], "token": "q-1"}
//! ```
//!
//! ## Request kinds
//!
//! | Request | Response |
//! |---|---|
//! | `init` | `processed-ack` |
//! | `process-entities` | `processed-ack` |
//! | `remove-entities` | `processed-ack` |
//! | `calculate-trajectories` | `trajectories-result` |
//! | `spatial-query` | `query-result` |
//! | `predict-collisions` | `collision-result` |
//! | `calculate-path` | `path-result` |
//! | `calculate-efficiency` | `efficiency-result` |
//! | `get-stats` | `stats-result` |
//!
//! Any failure, including an unrecognized kind, is answered with an
//! `error` response carrying a human-readable message.

use crate::engine::EngineStats;
use crate::types::{CollisionCandidate, EntityId, KinematicEntity, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

// ============================================================================
// Correlation tokens
// ============================================================================

/// Opaque correlation token attached to a request and echoed in its response.
///
/// The bridge generates UUID v4 tokens; external producers may use any
/// string they like.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestToken(pub String);

impl RequestToken {
    /// Generates a fresh random token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrows the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RequestToken {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl std::fmt::Display for RequestToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Requests
// ============================================================================

/// A request to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum EngineRequest {
    /// (Re)builds the spatial grid, discarding every tracked entity
    Init {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cell_size: Option<f64>,
    },
    /// Inserts or replaces a batch of entity snapshots
    ProcessEntities { entities: Vec<KinematicEntity> },
    /// Stops tracking a batch of entities
    RemoveEntities { entity_ids: Vec<EntityId> },
    /// Extrapolates the trajectories of the named entities
    CalculateTrajectories {
        entity_ids: Vec<EntityId>,
        steps: usize,
        dt: f64,
    },
    /// Finds entities within `radius` of `center`
    SpatialQuery { center: Vec3, radius: f64 },
    /// Predicts close approaches between all tracked entities
    PredictCollisions { time_window: f64, time_step: f64 },
    /// Plans a path around the positions of the named obstacle entities
    CalculatePath {
        start: Vec3,
        end: Vec3,
        #[serde(default)]
        obstacle_ids: Vec<EntityId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        clearance: Option<f64>,
    },
    /// Scores how efficiently the named entities move toward optional targets
    CalculateEfficiency {
        entity_ids: Vec<EntityId>,
        #[serde(default)]
        targets: HashMap<EntityId, Vec3>,
    },
    /// Reports engine and grid statistics
    GetStats,
}

impl EngineRequest {
    /// Every recognized request kind, as it appears in the `type` field.
    pub const KINDS: &'static [&'static str] = &[
        "init",
        "process-entities",
        "remove-entities",
        "calculate-trajectories",
        "spatial-query",
        "predict-collisions",
        "calculate-path",
        "calculate-efficiency",
        "get-stats",
    ];

    /// The wire name of this request's kind.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineRequest::Init { .. } => "init",
            EngineRequest::ProcessEntities { .. } => "process-entities",
            EngineRequest::RemoveEntities { .. } => "remove-entities",
            EngineRequest::CalculateTrajectories { .. } => "calculate-trajectories",
            EngineRequest::SpatialQuery { .. } => "spatial-query",
            EngineRequest::PredictCollisions { .. } => "predict-collisions",
            EngineRequest::CalculatePath { .. } => "calculate-path",
            EngineRequest::CalculateEfficiency { .. } => "calculate-efficiency",
            EngineRequest::GetStats => "get-stats",
        }
    }

    /// Whether `kind` names a recognized request kind.
    pub fn is_known_kind(kind: &str) -> bool {
        Self::KINDS.contains(&kind)
    }
}

// ============================================================================
// Responses
// ============================================================================

/// A response from the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum EngineResponse {
    /// Acknowledges `init`, `process-entities` and `remove-entities`
    ProcessedAck {
        count: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Projected positions per entity; unknown entities are omitted
    TrajectoriesResult {
        trajectories: HashMap<EntityId, Vec<Vec3>>,
    },
    /// Entities within the queried radius, sorted by ID
    QueryResult { results: Vec<EntityId> },
    /// Predicted collisions in pair enumeration order
    CollisionResult { collisions: Vec<CollisionCandidate> },
    /// Waypoints from start to end
    PathResult { path: Vec<Vec3> },
    /// Efficiency score per entity; unknown entities are omitted
    EfficiencyResult { scores: HashMap<EntityId, f64> },
    /// Engine and grid statistics
    StatsResult { stats: EngineStats },
    /// The request could not be serviced
    Error { error: String },
}

impl EngineResponse {
    /// The wire name of this response's kind.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineResponse::ProcessedAck { .. } => "processed-ack",
            EngineResponse::TrajectoriesResult { .. } => "trajectories-result",
            EngineResponse::QueryResult { .. } => "query-result",
            EngineResponse::CollisionResult { .. } => "collision-result",
            EngineResponse::PathResult { .. } => "path-result",
            EngineResponse::EfficiencyResult { .. } => "efficiency-result",
            EngineResponse::StatsResult { .. } => "stats-result",
            EngineResponse::Error { .. } => "error",
        }
    }

    /// Builds an error response from anything displayable.
    pub fn error(message: impl std::fmt::Display) -> Self {
        EngineResponse::Error {
            error: message.to_string(),
        }
    }

    /// Whether this is an `error` response.
    pub fn is_error(&self) -> bool {
        matches!(self, EngineResponse::Error { .. })
    }
}

// ============================================================================
// Envelopes
// ============================================================================

/// A request together with its correlation token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<RequestToken>,
    #[serde(flatten)]
    pub request: EngineRequest,
}

impl RequestEnvelope {
    /// Wraps a request with a token.
    pub fn new(token: RequestToken, request: EngineRequest) -> Self {
        Self {
            token: Some(token),
            request,
        }
    }
}

/// A response together with the token of the request that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<RequestToken>,
    #[serde(flatten)]
    pub response: EngineResponse,
}
