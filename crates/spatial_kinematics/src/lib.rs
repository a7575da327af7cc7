//! # Spatial Kinematics
//!
//! A spatial-partitioning and kinematic-prediction engine for moving
//! entities. Entity snapshots (position, velocity, acceleration) are bucketed
//! into a uniform 3D grid and the engine answers questions about them:
//! who is near a point, where each entity will be, which pairs are about to
//! collide, how to route around obstacles and how efficiently each entity is
//! moving.
//!
//! ## Core Features
//!
//! - **Uniform Grid Index**: Constant-time updates and exact radius queries
//! - **Trajectory Extrapolation**: Semi-implicit Euler projection of each entity
//! - **Collision Prediction**: Pairwise close-approach detection over a time window
//! - **Path Planning**: Bounded recursive detours around obstacle entities
//! - **Efficiency Scoring**: 0-100 heuristic of heading alignment and smoothness
//! - **Async Bridge**: Token-correlated requests to an engine on its own thread
//!
//! ## Architecture Overview
//!
//! The crate is layered bottom-up:
//!
//! ### Geometry and records ([`types`])
//! `Vec3`, `EntityId`, `KinematicEntity` and `CollisionCandidate`.
//!
//! ### Spatial index ([`spatial`])
//! `SpatialGrid` maps every tracked entity to exactly one `CellKey`.
//!
//! ### Kinematics ([`kinematics`])
//! Pure functions over entity records, with no access to the grid.
//!
//! ### Engine ([`engine`], [`protocol`])
//! `KinematicsEngine` validates and dispatches typed requests, one at a
//! time, and answers each with a typed response.
//!
//! ### Bridge ([`bridge`])
//! `EngineBridge` hosts the engine on a dedicated thread and correlates
//! async producers with responses through a pending-request table.
//!
//! ## Quick Start Example
//!
//! ```rust
//! use spatial_kinematics::*;
//!
//! let mut engine = KinematicsEngine::new(EngineConfig::default());
//! engine.handle_json(r#"{"type":"init","cellSize":100}"#);
//! engine.handle_json(
//!     r#"{"type":"process-entities","entities":[
//!         {"id":"a","position":{"x":0,"y":0,"z":0}},
//!         {"id":"b","position":{"x":500,"y":0,"z":0}}
//!     ]}"#,
//! );
//!
//! let reply = engine.handle_json(
//!     r#"{"type":"spatial-query","center":{"x":0,"y":0,"z":0},"radius":10,"token":"q-1"}"#,
//! );
//! assert_eq!(
//!     reply.response,
//!     EngineResponse::QueryResult { results: vec![EntityId::from("a")] }
//! );
//! ```

pub mod bridge;
pub mod config;
pub mod engine;
pub mod error;
pub mod kinematics;
pub mod protocol;
pub mod spatial;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use bridge::{EngineBridge, PendingResponse, DEFAULT_REQUEST_TIMEOUT};
pub use config::EngineConfig;
pub use engine::{EngineStats, KinematicsEngine};
pub use error::{BridgeError, EngineError};
pub use kinematics::{PathPlanner, DEFAULT_CLEARANCE, DEFAULT_COLLISION_RADIUS};
pub use protocol::{EngineRequest, EngineResponse, RequestEnvelope, RequestToken, ResponseEnvelope};
pub use spatial::{CellKey, RadiusQuery, SpatialGrid, SpatialStats};
pub use types::{CollisionCandidate, EntityId, KinematicEntity, Vec3};
pub use utils::current_timestamp_millis;
