//! Kinematic computations over tracked entities
//!
//! Pure functions with no access to the grid: trajectory extrapolation,
//! pairwise collision prediction, obstacle-avoiding path planning and
//! movement efficiency scoring. The engine resolves entity IDs to records
//! before calling into this module.

mod collision;
mod efficiency;
mod path;
mod trajectory;

pub use collision::{prediction_steps, predict_collisions, DEFAULT_COLLISION_RADIUS};
pub use efficiency::{score as efficiency_score, MAX_SCORE};
pub use path::{plan_path, PathPlanner, DEFAULT_CLEARANCE, DEFAULT_MAX_PATH_DEPTH};
pub use trajectory::extrapolate;
