/// Trajectory extrapolation
use crate::types::{KinematicEntity, Vec3};

/// Advances an entity's kinematic state `steps` times by `dt` seconds.
///
/// Each step applies semi-implicit Euler integration in a fixed order: velocity
/// is advanced by `acceleration * dt` first, then position by the updated
/// `velocity * dt`. The position after each step is emitted, so the first
/// point is one step ahead of the input and the input position itself is
/// never part of the output.
///
/// The result always holds exactly `steps` points and depends only on the
/// arguments.
///
/// # Examples
///
/// ```rust
/// use spatial_kinematics::kinematics::extrapolate;
/// use spatial_kinematics::{KinematicEntity, Vec3};
///
/// let probe = KinematicEntity::new("probe", Vec3::ZERO).with_velocity(Vec3::new(1.0, 0.0, 0.0));
/// let path = extrapolate(&probe, 3, 1.0);
/// assert_eq!(path[2], Vec3::new(3.0, 0.0, 0.0));
/// ```
pub fn extrapolate(record: &KinematicEntity, steps: usize, dt: f64) -> Vec<Vec3> {
    let mut position = record.position;
    let mut velocity = record.velocity;
    let acceleration = record.acceleration;

    let mut points = Vec::with_capacity(steps);
    for _ in 0..steps {
        velocity += acceleration * dt;
        position += velocity * dt;
        points.push(position);
    }
    points
}
