use std::fmt;

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

/// Stable, scene-unique name of a combatant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Index of a movable wall obstacle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WallId(pub usize);

impl fmt::Display for WallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Wall_{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Team {
    Party,
    Boss,
}

impl Team {
    pub fn opposes(self, other: Team) -> bool {
        self != other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Boss,
    PartyMember,
}

impl EntityKind {
    pub fn team(self) -> Team {
        match self {
            EntityKind::Boss => Team::Boss,
            EntityKind::PartyMember => Team::Party,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HazardKind {
    Lava,
    Void,
}

/// Symbolic classification of whatever a ray ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitTag {
    None,
    Agent,
    Wall,
    Lava,
    Void,
}

impl HitTag {
    pub fn code(self) -> u8 {
        match self {
            HitTag::None => 0,
            HitTag::Agent => 1,
            HitTag::Wall => 2,
            HitTag::Lava => 3,
            HitTag::Void => 4,
        }
    }
}

/// Position on the arena floor plus yaw in degrees.
///
/// Yaw 0 faces +Y and grows clockwise, so turning right adds to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec2,
    pub yaw: f32,
}

impl Pose {
    pub fn new(x: f32, y: f32, yaw: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            yaw: wrap_degrees(yaw),
        }
    }

    pub fn forward(&self) -> Vec2 {
        direction_from_yaw(self.yaw)
    }

    pub fn right(&self) -> Vec2 {
        let rad = self.yaw.to_radians();
        Vec2::new(rad.cos(), -rad.sin())
    }

    /// Express a world-space point in this pose's frame (x = right, y = forward).
    pub fn to_local(&self, point: Vec2) -> Vec2 {
        let delta = point - self.position;
        Vec2::new(delta.dot(self.right()), delta.dot(self.forward()))
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

pub fn direction_from_yaw(yaw_degrees: f32) -> Vec2 {
    let rad = yaw_degrees.to_radians();
    Vec2::new(rad.sin(), rad.cos())
}

/// Wrap an angle into `[0, 360)`.
pub fn wrap_degrees(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Unsigned angle in degrees between two directions, `0..=180`.
pub fn angle_between(a: Vec2, b: Vec2) -> f32 {
    let a = a.normalize_or_zero();
    let b = b.normalize_or_zero();
    if a == Vec2::ZERO || b == Vec2::ZERO {
        return 0.0;
    }
    a.dot(b).clamp(-1.0, 1.0).acos().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_follows_clockwise_yaw() {
        let north = Pose::new(0.0, 0.0, 0.0).forward();
        assert!((north - Vec2::Y).length() < 1e-6);

        let east = Pose::new(0.0, 0.0, 90.0).forward();
        assert!((east - Vec2::X).length() < 1e-6);

        let south = Pose::new(0.0, 0.0, 180.0).forward();
        assert!((south + Vec2::Y).length() < 1e-5);
    }

    #[test]
    fn test_to_local_frame() {
        let pose = Pose::new(1.0, 1.0, 90.0);
        // Facing +X: a point further along +X is straight ahead.
        let local = pose.to_local(Vec2::new(3.0, 1.0));
        assert!((local.x).abs() < 1e-5);
        assert!((local.y - 2.0).abs() < 1e-5);

        // A point at -Y is on the right when facing +X.
        let local = pose.to_local(Vec2::new(1.0, 0.0));
        assert!((local.x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_wrap_degrees() {
        assert!((wrap_degrees(370.0) - 10.0).abs() < 1e-4);
        assert!((wrap_degrees(-90.0) - 270.0).abs() < 1e-4);
        assert_eq!(wrap_degrees(0.0), 0.0);
    }

    #[test]
    fn test_angle_between() {
        assert!((angle_between(Vec2::Y, Vec2::X) - 90.0).abs() < 1e-4);
        assert!((angle_between(Vec2::Y, -Vec2::Y) - 180.0).abs() < 1e-3);
        assert_eq!(angle_between(Vec2::ZERO, Vec2::X), 0.0);
    }

    #[test]
    fn test_team_opposition() {
        assert!(Team::Party.opposes(Team::Boss));
        assert!(!Team::Party.opposes(Team::Party));
        assert_eq!(EntityKind::Boss.team(), Team::Boss);
    }
}
