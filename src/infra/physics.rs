//! Boundary to the world/physics collaborator.
//!
//! The simulation core never integrates collisions itself. It asks the world
//! for ray hits, reads and writes poses, requests displacements and receives
//! hazard contact edges once per step.

use bevy::math::Vec2;

use super::types::{EntityId, HazardKind, HitTag, Pose, WallId};

/// Anything the world tracks a pose for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Body {
    Agent(EntityId),
    Wall(WallId),
}

/// What a ray ran into.
#[derive(Debug, Clone, PartialEq)]
pub enum HitTarget {
    Agent(EntityId),
    Wall(WallId),
    Hazard(HazardKind),
    /// Arena enclosure or any other static geometry.
    Boundary,
}

impl HitTarget {
    pub fn tag(&self) -> HitTag {
        match self {
            HitTarget::Agent(_) => HitTag::Agent,
            HitTarget::Wall(_) => HitTag::Wall,
            HitTarget::Hazard(HazardKind::Lava) => HitTag::Lava,
            HitTarget::Hazard(HazardKind::Void) => HitTag::Void,
            HitTarget::Boundary => HitTag::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RayHit {
    pub point: Vec2,
    pub distance: f32,
    pub target: HitTarget,
}

/// Hazard trigger edge reported by the world.
#[derive(Debug, Clone, PartialEq)]
pub enum ContactEvent {
    Entered { entity: EntityId, hazard: HazardKind },
    Exited { entity: EntityId, hazard: HazardKind },
}

pub trait PhysicsWorld {
    /// Every hit along the ray up to `max_distance`, nearest first.
    fn raycast_all(&self, origin: Vec2, direction: Vec2, max_distance: f32) -> Vec<RayHit>;

    /// Nearest hit along the ray.
    fn raycast(&self, origin: Vec2, direction: Vec2, max_distance: f32) -> Option<RayHit> {
        self.raycast_all(origin, direction, max_distance)
            .into_iter()
            .next()
    }

    fn pose(&self, body: &Body) -> Option<Pose>;

    /// Teleport a body, bypassing collision.
    fn set_pose(&mut self, body: &Body, pose: Pose);

    /// Request a displacement; the world resolves collisions.
    fn move_body(&mut self, body: &Body, displacement: Vec2);

    /// Hide or restore a body. Disabled bodies are not hit, collided or reported.
    fn set_enabled(&mut self, body: &Body, enabled: bool);

    /// Advance one fixed step and report hazard enter/exit edges.
    fn step(&mut self, dt: f32) -> Vec<ContactEvent>;
}
