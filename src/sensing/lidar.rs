//! Radial distance sensor.
//!
//! Rays are cast from the agent centre at equal angular steps starting at the
//! facing direction. Ray 0 is cut off at the agent's attack range and doubles
//! as the "forward ray" that attacks and wall pickups aim with.

use bevy::math::Vec2;

use crate::infra::{HitTag, HitTarget, PhysicsWorld, RayHit, Team, direction_from_yaw};
use crate::state::{Arena, Entity};

/// One ray's worth of sensor output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayReading {
    /// Hit distance over the ray's cutoff, 1.0 when nothing was hit
    pub distance: f32,
    pub tag: HitTag,
    /// Team of the agent hit, if any
    pub team: Option<Team>,
}

impl RayReading {
    pub const MISS: RayReading = RayReading {
        distance: 1.0,
        tag: HitTag::None,
        team: None,
    };

    /// Append `[distance, hit code, team code]`.
    pub fn encode_into(&self, out: &mut Vec<f32>) {
        out.push(self.distance);
        out.push(self.tag.code() as f32 / 4.0);
        out.push(match self.team {
            None => 0.0,
            Some(Team::Party) => 0.5,
            Some(Team::Boss) => 1.0,
        });
    }
}

/// Whether a hit is the observer itself or the wall it is carrying.
pub fn is_own_hit(observer: &Entity, target: &HitTarget) -> bool {
    match target {
        HitTarget::Agent(id) => id == &observer.id,
        HitTarget::Wall(wall) => observer.carrying == Some(*wall),
        _ => false,
    }
}

/// Nearest hit along a ray that does not belong to the observer.
pub fn first_foreign_hit<P: PhysicsWorld>(
    arena: &Arena<P>,
    observer: &Entity,
    origin: Vec2,
    direction: Vec2,
    range: f32,
) -> Option<RayHit> {
    arena
        .physics
        .raycast_all(origin, direction, range)
        .into_iter()
        .find(|hit| !is_own_hit(observer, &hit.target))
}

/// What the forward (ray 0) ray currently touches within `range`.
pub fn forward_hit<P: PhysicsWorld>(arena: &Arena<P>, index: usize, range: f32) -> Option<RayHit> {
    let observer = arena.entities.get(index)?;
    let pose = arena.pose_of(index)?;
    first_foreign_hit(arena, observer, pose.position, pose.forward(), range)
}

/// Cast every ray for the entity at `index`.
pub fn scan<P: PhysicsWorld>(arena: &Arena<P>, index: usize) -> Vec<RayReading> {
    let sensor = &arena.config.sensor;
    let count = sensor.ray_count;
    let (Some(observer), Some(pose)) = (arena.entities.get(index), arena.pose_of(index)) else {
        return vec![RayReading::MISS; count];
    };
    let attack_range = observer.attack_range(&arena.config.roles);
    let step = 360.0 / count.max(1) as f32;

    (0..count)
        .map(|i| {
            let range = if i == 0 { attack_range } else { sensor.ray_range };
            let direction = direction_from_yaw(pose.yaw + step * i as f32);
            match first_foreign_hit(arena, observer, pose.position, direction, range) {
                Some(hit) => {
                    let team = match &hit.target {
                        HitTarget::Agent(id) => arena.entity(id).map(Entity::team),
                        _ => None,
                    };
                    RayReading {
                        distance: (hit.distance / range).clamp(0.0, 1.0),
                        tag: hit.target.tag(),
                        team,
                    }
                }
                None => RayReading::MISS,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArenaConfig;
    use crate::infra::{EntityId, EntityKind, FlatArena, HazardKind, Pose};

    fn arena() -> Arena<FlatArena> {
        let mut physics = FlatArena::new(10.0);
        physics.add_agent(EntityId::new("P"), Pose::new(0.0, 0.0, 0.0), 0.5);
        physics.add_agent(EntityId::new("Boss"), Pose::new(0.0, 2.0, 180.0), 1.0);
        physics.add_hazard(HazardKind::Void, Vec2::new(0.0, -4.0), Vec2::splat(1.0));

        let mut arena = Arena::new(physics, ArenaConfig::default());
        arena.add_entity(EntityId::new("P"), EntityKind::PartyMember, Pose::new(0.0, 0.0, 0.0));
        arena.add_entity(EntityId::new("Boss"), EntityKind::Boss, Pose::new(0.0, 2.0, 180.0));
        arena
    }

    #[test]
    fn test_scan_excludes_self_and_labels_hits() {
        let arena = arena();
        let readings = scan(&arena, 0);
        assert_eq!(readings.len(), 30);

        // Forward ray: boss surface at 1.0 within attack range 2.0.
        assert_eq!(readings[0].tag, HitTag::Agent);
        assert_eq!(readings[0].team, Some(Team::Boss));
        assert!((readings[0].distance - 0.5).abs() < 1e-5);

        // Ray 15 points straight back into the void zone at distance 3.
        assert_eq!(readings[15].tag, HitTag::Void);
        assert!((readings[15].distance - 0.3).abs() < 1e-5);
    }

    #[test]
    fn test_forward_hit_ignores_own_body() {
        let arena = arena();
        let hit = forward_hit(&arena, 0, 2.0).map(|h| h.target);
        assert_eq!(hit, Some(HitTarget::Agent(EntityId::new("Boss"))));
    }

    #[test]
    fn test_encode_reading() {
        let mut out = Vec::new();
        RayReading::MISS.encode_into(&mut out);
        assert_eq!(out, vec![1.0, 0.0, 0.0]);
    }
}
