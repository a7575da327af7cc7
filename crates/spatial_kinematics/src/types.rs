//! # Core Type Definitions
//!
//! This module contains the fundamental types shared by every part of the
//! kinematics engine: vectors, entity identifiers, kinematic records and the
//! collision candidates produced by prediction.
//!
//! ## Key Types
//!
//! - [`Vec3`] - 3D vector used for positions, velocities and accelerations
//! - [`EntityId`] - Opaque identifier for a tracked entity
//! - [`KinematicEntity`] - Snapshot of one entity's kinematic state
//! - [`CollisionCandidate`] - A predicted close approach between two entities
//!
//! ## Design Principles
//!
//! - **Type Safety**: Wrapper types keep entity IDs apart from arbitrary strings
//! - **Precision**: Double-precision floats throughout
//! - **Serialization**: All types use the camelCase JSON shape of the wire protocol

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Sub};

// ============================================================================
// Vectors
// ============================================================================

/// A 3D vector with double precision components.
///
/// Used interchangeably for positions, velocities, accelerations and
/// obstacle coordinates. No invariant is enforced beyond what callers
/// validate (see [`Vec3::is_finite`]).
///
/// # Examples
///
/// ```rust
/// use spatial_kinematics::Vec3;
///
/// let a = Vec3::new(1.0, 2.0, 2.0);
/// assert_eq!(a.length(), 3.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// X coordinate
    pub x: f64,
    /// Y coordinate (vertical axis)
    pub y: f64,
    /// Z coordinate
    pub z: f64,
}

impl Vec3 {
    /// The zero vector.
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    /// Creates a new vector with the specified components.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Dot product.
    pub fn dot(&self, other: Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Squared Euclidean length.
    pub fn length_squared(&self) -> f64 {
        self.dot(*self)
    }

    /// Euclidean length.
    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: Vec3) -> f64 {
        (*self - other).length()
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Prefer this for threshold comparisons on hot paths.
    pub fn distance_squared(&self, other: Vec3) -> f64 {
        (*self - other).length_squared()
    }

    /// Returns the unit vector in the same direction.
    ///
    /// A zero-length vector stays zero instead of producing NaN components.
    pub fn normalized(&self) -> Vec3 {
        let len = self.length();
        if len > 0.0 {
            *self * (1.0 / len)
        } else {
            Vec3::ZERO
        }
    }

    /// Whether every component is finite (neither NaN nor infinite).
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Vec3) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f64) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

// ============================================================================
// Identifiers
// ============================================================================

/// Unique, opaque identifier for a tracked entity.
///
/// The engine never interprets the contents; it only requires that the same
/// logical entity keeps the same ID across snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Creates an entity ID from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrows the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Kinematic records
// ============================================================================

/// Snapshot of one tracked entity's kinematic state.
///
/// Records are replaced wholesale on every update; fields are never merged
/// with a previous snapshot. Upstream snapshots that omit velocity or
/// acceleration deserialize with the zero vector, and a missing timestamp
/// is filled with the ingest time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KinematicEntity {
    /// Stable identifier of the entity
    pub id: EntityId,
    /// Current position
    pub position: Vec3,
    /// Current velocity in units per second
    #[serde(default)]
    pub velocity: Vec3,
    /// Current acceleration in units per second squared
    #[serde(default)]
    pub acceleration: Vec3,
    /// Milliseconds since the Unix epoch at which the snapshot was taken
    #[serde(default = "crate::utils::current_timestamp_millis")]
    pub last_updated: u64,
}

impl KinematicEntity {
    /// Creates a stationary entity at `position`, stamped with the current time.
    pub fn new(id: impl Into<EntityId>, position: Vec3) -> Self {
        Self {
            id: id.into(),
            position,
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            last_updated: crate::utils::current_timestamp_millis(),
        }
    }

    /// Sets the velocity.
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    /// Sets the acceleration.
    pub fn with_acceleration(mut self, acceleration: Vec3) -> Self {
        self.acceleration = acceleration;
        self
    }

    /// Whether position, velocity and acceleration are all finite.
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite() && self.acceleration.is_finite()
    }

    /// Current speed (length of the velocity vector).
    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }
}

/// A projected close approach between two entities.
///
/// The engine enumerates tracked entities sorted by ID, so `entity1` is
/// always the smaller ID of the pair regardless of the order the entities
/// were ingested in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollisionCandidate {
    /// First entity of the pair (lower enumeration index)
    pub entity1: EntityId,
    /// Second entity of the pair
    pub entity2: EntityId,
    /// Seconds until the first in-range step
    pub time_to_collision: f64,
}
