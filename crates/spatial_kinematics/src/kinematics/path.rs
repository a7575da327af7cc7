//! # Path Planning
//!
//! Computes waypoint paths that detour around point obstacles by recursive
//! subdivision. Each blocked segment gets a single "dodge" waypoint at its
//! midpoint, pushed sideways in the horizontal (x/z) plane, and both halves
//! are planned again.
//!
//! Recursion is bounded by [`PathPlanner::max_depth`]. A segment that is
//! still blocked at the depth limit is returned as a straight segment, so
//! planning always terminates and always produces the same path for the
//! same inputs.

use crate::types::Vec3;
use tracing::debug;

/// Default minimum distance between a path and any obstacle
pub const DEFAULT_CLEARANCE: f64 = 5.0;
/// Default bound on dodge-waypoint recursion
pub const DEFAULT_MAX_PATH_DEPTH: u32 = 8;

/// Obstacle-avoiding path planner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPlanner {
    /// Minimum allowed distance between a segment and an obstacle
    pub clearance: f64,
    /// Maximum subdivision depth before falling back to a direct segment
    pub max_depth: u32,
}

impl Default for PathPlanner {
    fn default() -> Self {
        Self {
            clearance: DEFAULT_CLEARANCE,
            max_depth: DEFAULT_MAX_PATH_DEPTH,
        }
    }
}

impl PathPlanner {
    /// Creates a planner with the given clearance and depth bound.
    pub fn new(clearance: f64, max_depth: u32) -> Self {
        Self { clearance, max_depth }
    }

    /// Plans a path from `start` to `end` around `obstacles`.
    ///
    /// The returned path always begins with `start` and ends with `end`.
    /// With no blocking obstacle the path is exactly `[start, end]`.
    pub fn plan(&self, start: Vec3, end: Vec3, obstacles: &[Vec3]) -> Vec<Vec3> {
        self.plan_segment(start, end, obstacles, 0)
    }

    fn plan_segment(&self, start: Vec3, end: Vec3, obstacles: &[Vec3], depth: u32) -> Vec<Vec3> {
        let segment = end - start;
        let length = segment.length();
        if !(length > 0.0) || !length.is_finite() {
            return vec![start, end];
        }
        let direction = segment * (1.0 / length);

        let nearest_blocker = obstacles
            .iter()
            .filter(|obstacle| distance_to_segment(**obstacle, start, direction, length) < self.clearance)
            .min_by(|a, b| {
                a.distance_squared(start)
                    .partial_cmp(&b.distance_squared(start))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

        let Some(&blocker) = nearest_blocker else {
            return vec![start, end];
        };

        if depth >= self.max_depth {
            debug!(
                "path segment still blocked at depth {}, falling back to direct segment",
                depth
            );
            return vec![start, end];
        }

        let dodge = self.dodge_point(start, segment, direction, blocker);

        let mut path = self.plan_segment(start, dodge, obstacles, depth + 1);
        let tail = self.plan_segment(dodge, end, obstacles, depth + 1);
        path.extend(tail.into_iter().skip(1));
        path
    }

    /// Midpoint of the segment pushed `2 * clearance` sideways in the x/z
    /// plane, away from the blocking obstacle.
    fn dodge_point(&self, start: Vec3, segment: Vec3, direction: Vec3, blocker: Vec3) -> Vec3 {
        let midpoint = start + segment * 0.5;

        let mut perpendicular = Vec3::new(-direction.z, 0.0, direction.x).normalized();
        if perpendicular == Vec3::ZERO {
            // Vertical segment: any horizontal axis is perpendicular.
            perpendicular = Vec3::new(1.0, 0.0, 0.0);
        }

        let side = if (blocker - midpoint).dot(perpendicular) > 0.0 { -1.0 } else { 1.0 };
        midpoint + perpendicular * (side * 2.0 * self.clearance)
    }
}

/// Convenience wrapper around [`PathPlanner::plan`].
pub fn plan_path(start: Vec3, end: Vec3, obstacles: &[Vec3], clearance: f64) -> Vec<Vec3> {
    PathPlanner {
        clearance,
        ..PathPlanner::default()
    }
    .plan(start, end, obstacles)
}

/// Distance from `point` to the segment starting at `start` along unit
/// `direction` for `length` units, using the clamped parametric projection.
fn distance_to_segment(point: Vec3, start: Vec3, direction: Vec3, length: f64) -> f64 {
    let t = (point - start).dot(direction).clamp(0.0, length);
    point.distance(start + direction * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_clear(path: &[Vec3], obstacles: &[Vec3], clearance: f64) {
        for pair in path.windows(2) {
            let segment = pair[1] - pair[0];
            let length = segment.length();
            if length == 0.0 {
                continue;
            }
            let direction = segment * (1.0 / length);
            for obstacle in obstacles {
                assert!(
                    distance_to_segment(*obstacle, pair[0], direction, length) >= clearance,
                    "segment {:?} -> {:?} passes within clearance of {:?}",
                    pair[0],
                    pair[1],
                    obstacle
                );
            }
        }
    }

    #[test]
    fn test_no_obstacles_direct_path() {
        let start = Vec3::ZERO;
        let end = Vec3::new(10.0, 0.0, 0.0);
        assert_eq!(plan_path(start, end, &[], DEFAULT_CLEARANCE), vec![start, end]);
    }

    #[test]
    fn test_distant_obstacle_is_ignored() {
        let start = Vec3::ZERO;
        let end = Vec3::new(10.0, 0.0, 0.0);
        let obstacles = [Vec3::new(5.0, 0.0, 50.0), Vec3::new(-20.0, 0.0, 0.0)];
        assert_eq!(plan_path(start, end, &obstacles, 5.0), vec![start, end]);
    }

    #[test]
    fn test_single_obstacle_gets_one_dodge() {
        let start = Vec3::ZERO;
        let end = Vec3::new(10.0, 0.0, 0.0);
        let obstacles = [Vec3::new(5.0, 0.0, 0.0)];

        let path = plan_path(start, end, &obstacles, 1.0);

        assert_eq!(path, vec![start, Vec3::new(5.0, 0.0, 2.0), end]);
        assert_clear(&path, &obstacles, 1.0);
    }

    #[test]
    fn test_dodge_moves_away_from_obstacle() {
        let start = Vec3::ZERO;
        let end = Vec3::new(10.0, 0.0, 0.0);
        let obstacles = [Vec3::new(5.0, 0.0, 0.5)];

        let path = plan_path(start, end, &obstacles, 1.0);

        assert_eq!(path.len(), 3);
        assert!(path[1].z < 0.0);
    }

    #[test]
    fn test_vertical_segment_dodges_horizontally() {
        let start = Vec3::ZERO;
        let end = Vec3::new(0.0, 10.0, 0.0);
        let obstacles = [Vec3::new(0.0, 5.0, 0.0)];

        let path = plan_path(start, end, &obstacles, 1.0);

        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&end));
        assert_eq!(path[1], Vec3::new(2.0, 5.0, 0.0));
    }

    #[test]
    fn test_dense_cluster_terminates_with_exact_endpoints() {
        let start = Vec3::new(-50.0, 0.0, 0.0);
        let end = Vec3::new(50.0, 0.0, 0.0);
        let obstacles: Vec<Vec3> = (-10..=10)
            .flat_map(|x| (-10..=10).map(move |z| Vec3::new(x as f64 * 3.0, 0.0, z as f64 * 3.0)))
            .collect();

        let planner = PathPlanner::new(5.0, 6);
        let path = planner.plan(start, end, &obstacles);

        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&end));
        assert!(path.len() <= (1 << 6) + 1);
        assert_eq!(path, planner.plan(start, end, &obstacles));
    }

    #[test]
    fn test_zero_depth_falls_back_to_direct() {
        let start = Vec3::ZERO;
        let end = Vec3::new(10.0, 0.0, 0.0);
        let planner = PathPlanner::new(1.0, 0);
        assert_eq!(planner.plan(start, end, &[Vec3::new(5.0, 0.0, 0.0)]), vec![start, end]);
    }

    #[test]
    fn test_degenerate_segment() {
        let point = Vec3::new(1.0, 1.0, 1.0);
        assert_eq!(plan_path(point, point, &[point], 5.0), vec![point, point]);
    }
}
