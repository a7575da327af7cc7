/// Movement efficiency scoring
use crate::types::{KinematicEntity, Vec3};

/// Score of a perfectly efficient mover
pub const MAX_SCORE: f64 = 100.0;
/// Penalty weight for heading misalignment; exact opposition costs twice this
const ALIGNMENT_WEIGHT: f64 = 30.0;
/// Penalty per unit of acceleration magnitude
const SMOOTHNESS_WEIGHT: f64 = 10.0;
/// Upper bound on the smoothness penalty
const MAX_SMOOTHNESS_PENALTY: f64 = 20.0;

/// Heuristic 0-100 score of how directly and smoothly an entity moves.
///
/// Starts at 100. When a `target` is given and the entity is moving, the
/// heading is compared with the direction to the target and
/// `(1 - cos θ) * 30` is subtracted, so heading straight at the target
/// costs nothing and heading straight away costs 60. Independently,
/// `min(20, |acceleration| * 10)` is subtracted as a smoothness penalty.
/// The result is clamped to `[0, 100]`.
pub fn score(record: &KinematicEntity, target: Option<Vec3>) -> f64 {
    let mut score = MAX_SCORE;

    if let Some(target) = target {
        let to_target = (target - record.position).normalized();
        let heading = record.velocity.normalized();

        // Standing on the target or standing still leaves alignment undefined.
        if to_target != Vec3::ZERO && heading != Vec3::ZERO {
            let alignment = to_target.dot(heading).clamp(-1.0, 1.0);
            score -= (1.0 - alignment) * ALIGNMENT_WEIGHT;
        }
    }

    score -= (record.acceleration.length() * SMOOTHNESS_WEIGHT).min(MAX_SMOOTHNESS_PENALTY);

    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, MAX_SCORE)
}
