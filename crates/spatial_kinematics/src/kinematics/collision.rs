/// Pairwise collision prediction
use super::trajectory::extrapolate;
use crate::types::{CollisionCandidate, KinematicEntity};

/// Default combined radius below which two projected positions count as a collision
pub const DEFAULT_COLLISION_RADIUS: f64 = 2.0;

/// Number of extrapolation steps needed to cover `time_window` at `time_step`.
pub fn prediction_steps(time_window: f64, time_step: f64) -> usize {
    (time_window / time_step).ceil().max(0.0) as usize
}

/// Predicts close approaches between every pair of entities.
///
/// Both trajectories of a pair are advanced for
/// `ceil(time_window / time_step)` steps. At each synchronized step index
/// `s` the projected positions are compared; the first index with a
/// distance below `collision_radius` produces one candidate with
/// `time_to_collision = s * time_step` and the rest of that pair is
/// skipped.
///
/// Pairs are enumerated with outer index `i` ascending and inner index
/// `j > i` ascending, which fixes the result order. Cost is
/// O(n² × steps); each trajectory is computed once and shared by every
/// pair it takes part in.
pub fn predict_collisions(
    entities: &[&KinematicEntity],
    time_window: f64,
    time_step: f64,
    collision_radius: f64,
) -> Vec<CollisionCandidate> {
    let steps = prediction_steps(time_window, time_step);
    let trajectories: Vec<_> = entities
        .iter()
        .map(|entity| extrapolate(entity, steps, time_step))
        .collect();

    let mut collisions = Vec::new();

    for i in 0..entities.len() {
        for j in (i + 1)..entities.len() {
            let first_contact = trajectories[i]
                .iter()
                .zip(&trajectories[j])
                .position(|(a, b)| a.distance(*b) < collision_radius);

            if let Some(step) = first_contact {
                collisions.push(CollisionCandidate {
                    entity1: entities[i].id.clone(),
                    entity2: entities[j].id.clone(),
                    time_to_collision: step as f64 * time_step,
                });
            }
        }
    }

    collisions
}
