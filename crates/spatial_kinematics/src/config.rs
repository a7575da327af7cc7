//! Engine configuration.
//!
//! Tunables that the wire protocol does not carry per request: the fallback
//! cell size for `init`, the collision radius used by prediction, the
//! default path clearance and the work bounds that keep a single request
//! from running away.

use crate::kinematics::{DEFAULT_CLEARANCE, DEFAULT_COLLISION_RADIUS, DEFAULT_MAX_PATH_DEPTH};
use serde::{Deserialize, Serialize};

/// Largest accepted path recursion depth
pub const MAX_PATH_DEPTH_LIMIT: u32 = 16;

fn default_cell_size() -> f64 {
    100.0
}

fn default_collision_radius() -> f64 {
    DEFAULT_COLLISION_RADIUS
}

fn default_path_clearance() -> f64 {
    DEFAULT_CLEARANCE
}

fn default_max_path_depth() -> u32 {
    DEFAULT_MAX_PATH_DEPTH
}

fn default_max_prediction_steps() -> usize {
    10_000
}

/// Configuration for a [`crate::KinematicsEngine`].
///
/// Every field has a serde default so partial TOML sections load cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Cell size used when an `init` request does not name one
    #[serde(default = "default_cell_size")]
    pub default_cell_size: f64,
    /// Combined radius below which two projected positions count as a collision
    #[serde(default = "default_collision_radius")]
    pub collision_radius: f64,
    /// Clearance used when a path request does not name one
    #[serde(default = "default_path_clearance")]
    pub path_clearance: f64,
    /// Bound on path planner recursion
    #[serde(default = "default_max_path_depth")]
    pub max_path_depth: u32,
    /// Upper bound on extrapolation steps for one trajectory or prediction request
    #[serde(default = "default_max_prediction_steps")]
    pub max_prediction_steps: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_cell_size: default_cell_size(),
            collision_radius: default_collision_radius(),
            path_clearance: default_path_clearance(),
            max_path_depth: default_max_path_depth(),
            max_prediction_steps: default_max_prediction_steps(),
        }
    }
}

impl EngineConfig {
    /// Validates the configuration for consistency.
    ///
    /// # Returns
    ///
    /// `Ok(())` if the configuration is valid, or an error string describing the issue.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.default_cell_size > 0.0) || !self.default_cell_size.is_finite() {
            return Err(format!(
                "default_cell_size must be positive and finite, got {}",
                self.default_cell_size
            ));
        }
        if !(self.collision_radius >= 0.0) || !self.collision_radius.is_finite() {
            return Err(format!(
                "collision_radius must be non-negative and finite, got {}",
                self.collision_radius
            ));
        }
        if !(self.path_clearance >= 0.0) || !self.path_clearance.is_finite() {
            return Err(format!(
                "path_clearance must be non-negative and finite, got {}",
                self.path_clearance
            ));
        }
        if self.max_path_depth > MAX_PATH_DEPTH_LIMIT {
            return Err(format!(
                "max_path_depth must be at most {MAX_PATH_DEPTH_LIMIT}, got {}",
                self.max_path_depth
            ));
        }
        if self.max_prediction_steps == 0 {
            return Err("max_prediction_steps must be at least 1".to_string());
        }
        Ok(())
    }
}
