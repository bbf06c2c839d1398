//! Sensor encoder - turns arena state into a fixed-size observation vector
//!
//! Layout: self segment, then `ray_count` radial readings, then the agent
//! slots, then the wall slots. Unused and masked slots are zero-filled so the
//! vector length never changes.

use std::ops::Range;

use bevy::math::Vec2;

use crate::config::SensorConfig;
use crate::infra::{EntityKind, PhysicsWorld, Pose};
use crate::state::{Arena, Entity, Role};

use super::lidar;
use super::visibility::is_visible;

/// position (2), yaw (1), health (1), class (1), threat (1),
/// attack/heal/boost ready (3), in hazard / burning / dead (3)
pub const SELF_FEATURES: usize = 12;
/// distance, hit code, team code
pub const RAY_FEATURES: usize = 3;
/// relative x/y (2), distance, speed, health, class, threat, present
pub const AGENT_SLOT_FEATURES: usize = 8;
/// relative x/y (2), distance, speed, size x/y (2), carried, present
pub const WALL_SLOT_FEATURES: usize = 8;

/// Encoded observation plus the per-slot visibility mask.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Observation {
    pub values: Vec<f32>,
    /// Agent slots first, then wall slots; false for empty or masked slots
    pub mask: Vec<bool>,
}

#[derive(Debug, Clone)]
pub struct SensorEncoder {
    config: SensorConfig,
}

impl SensorEncoder {
    pub fn new(config: SensorConfig) -> Self {
        Self { config }
    }

    pub fn ray_size(&self) -> usize {
        self.config.ray_count * RAY_FEATURES
    }

    pub fn obs_size(&self) -> usize {
        SELF_FEATURES
            + self.ray_size()
            + self.config.max_agent_slots * AGENT_SLOT_FEATURES
            + self.config.max_wall_slots * WALL_SLOT_FEATURES
    }

    pub fn agent_slot_range(&self, slot: usize) -> Range<usize> {
        let start = SELF_FEATURES + self.ray_size() + slot * AGENT_SLOT_FEATURES;
        start..start + AGENT_SLOT_FEATURES
    }

    pub fn wall_slot_range(&self, slot: usize) -> Range<usize> {
        let start = SELF_FEATURES
            + self.ray_size()
            + self.config.max_agent_slots * AGENT_SLOT_FEATURES
            + slot * WALL_SLOT_FEATURES;
        start..start + WALL_SLOT_FEATURES
    }

    #[tracing::instrument(level = "trace", skip(self, arena))]
    pub fn encode<P: PhysicsWorld>(&self, arena: &Arena<P>, index: usize) -> Observation {
        let mut values = Vec::with_capacity(self.obs_size());
        let mut mask = Vec::with_capacity(self.config.max_agent_slots + self.config.max_wall_slots);

        let Some(observer) = arena.entities.get(index) else {
            return Observation {
                values: vec![0.0; self.obs_size()],
                mask: vec![false; self.config.max_agent_slots + self.config.max_wall_slots],
            };
        };
        let pose = arena.pose_of(index).unwrap_or(observer.spawn);

        self.encode_self(arena, observer, &pose, &mut values);

        for reading in lidar::scan(arena, index) {
            reading.encode_into(&mut values);
        }

        // Agents
        let mut agent_count = 0;
        for (i, other) in arena.entities.iter().enumerate() {
            if agent_count >= self.config.max_agent_slots {
                break;
            }
            if i == index || other.health.is_despawned() {
                continue;
            }
            let Some(other_pose) = arena.pose_of(i) else {
                continue;
            };
            let visible = is_visible(
                arena,
                index,
                &pose,
                other_pose.position,
                None,
                self.config.vision_cone_degrees,
            );
            if visible {
                self.encode_agent(arena, &pose, other, &other_pose, &mut values);
            } else {
                values.extend_from_slice(&[0.0; AGENT_SLOT_FEATURES]);
            }
            mask.push(visible);
            agent_count += 1;
        }
        while agent_count < self.config.max_agent_slots {
            values.extend_from_slice(&[0.0; AGENT_SLOT_FEATURES]);
            mask.push(false);
            agent_count += 1;
        }

        // Walls
        let mut wall_count = 0;
        for wall in &arena.walls {
            if wall_count >= self.config.max_wall_slots {
                break;
            }
            let Some(wall_pose) = arena.wall_pose(wall.id) else {
                continue;
            };
            let visible = is_visible(
                arena,
                index,
                &pose,
                wall_pose.position,
                Some(wall.id),
                self.config.vision_cone_degrees,
            );
            if visible {
                let local = pose.to_local(wall_pose.position);
                let distance = wall_pose.position.distance(pose.position);
                values.push(local.x / self.config.distance_scale);
                values.push(local.y / self.config.distance_scale);
                values.push((distance / self.config.distance_scale).clamp(0.0, 1.0));
                values.push(self.speed_feature(arena, wall.speed));
                values.push(wall.half_size.x * 2.0 / self.config.size_scale);
                values.push(wall.half_size.y * 2.0 / self.config.size_scale);
                values.push(if wall.is_carried() { 1.0 } else { 0.0 });
                values.push(1.0);
            } else {
                values.extend_from_slice(&[0.0; WALL_SLOT_FEATURES]);
            }
            mask.push(visible);
            wall_count += 1;
        }
        while wall_count < self.config.max_wall_slots {
            values.extend_from_slice(&[0.0; WALL_SLOT_FEATURES]);
            mask.push(false);
            wall_count += 1;
        }

        debug_assert_eq!(values.len(), self.obs_size());
        Observation { values, mask }
    }

    fn encode_self<P: PhysicsWorld>(
        &self,
        arena: &Arena<P>,
        observer: &Entity,
        pose: &Pose,
        obs: &mut Vec<f32>,
    ) {
        let now = arena.clock.tick();
        let roles = &arena.config.roles;
        let flag = |b: bool| if b { 1.0 } else { 0.0 };

        obs.push(pose.position.x / self.config.position_scale);
        obs.push(pose.position.y / self.config.position_scale);
        obs.push(pose.yaw / 360.0);
        obs.push(observer.health.fraction());
        obs.push(observer.class_code() as f32 / 4.0);
        obs.push(self.threat_feature(arena, observer));

        let party = observer.kind == EntityKind::PartyMember;
        obs.push(flag(
            observer.attack_damage(roles) > 0.0 && observer.abilities.attack.ready(now),
        ));
        obs.push(flag(
            party && observer.role() == Role::Healer && observer.abilities.heal.ready(now),
        ));
        obs.push(flag(
            party && observer.role() == Role::Tank && observer.abilities.threat_boost.ready(now),
        ));

        obs.push(flag(observer.health.in_hazard()));
        obs.push(flag(observer.health.is_burning()));
        obs.push(flag(observer.health.is_dead()));
    }

    fn encode_agent<P: PhysicsWorld>(
        &self,
        arena: &Arena<P>,
        pose: &Pose,
        other: &Entity,
        other_pose: &Pose,
        obs: &mut Vec<f32>,
    ) {
        let local: Vec2 = pose.to_local(other_pose.position);
        let distance = other_pose.position.distance(pose.position);
        obs.push(local.x / self.config.distance_scale);
        obs.push(local.y / self.config.distance_scale);
        obs.push((distance / self.config.distance_scale).clamp(0.0, 1.0));
        obs.push(self.speed_feature(arena, other.speed));
        obs.push(other.health.fraction());
        obs.push(other.class_code() as f32 / 4.0);
        obs.push(self.threat_feature(arena, other));
        obs.push(1.0);
    }

    fn threat_feature<P: PhysicsWorld>(&self, arena: &Arena<P>, entity: &Entity) -> f32 {
        let normalizer = arena.config.threat.normalizer;
        if normalizer <= 0.0 {
            return 0.0;
        }
        (arena.threat.threat(&entity.id) / normalizer).clamp(0.0, 1.0)
    }

    fn speed_feature<P: PhysicsWorld>(&self, arena: &Arena<P>, speed: f32) -> f32 {
        let max = arena.config.movement.move_speed;
        if max <= 0.0 {
            return 0.0;
        }
        (speed / max).clamp(0.0, 1.0)
    }
}

impl Default for SensorEncoder {
    fn default() -> Self {
        Self::new(SensorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArenaConfig;
    use crate::infra::{EntityId, FlatArena, WallId};

    fn arena() -> Arena<FlatArena> {
        let agents = [
            ("Boss", EntityKind::Boss, Pose::new(0.0, 6.0, 180.0), 1.0),
            ("Front", EntityKind::PartyMember, Pose::new(0.0, 0.0, 0.0), 0.5),
            ("Behind", EntityKind::PartyMember, Pose::new(0.0, -3.0, 0.0), 0.5),
        ];
        let mut physics = FlatArena::new(10.0);
        for (name, _, pose, radius) in agents {
            physics.add_agent(EntityId::new(name), pose, radius);
        }
        physics.add_wall(WallId(0), Pose::new(2.0, 3.0, 0.0), Vec2::splat(0.5));

        let mut arena = Arena::new(physics, ArenaConfig::default());
        for (name, kind, pose, _) in agents {
            arena.add_entity(EntityId::new(name), kind, pose);
        }
        arena.add_wall(Pose::new(2.0, 3.0, 0.0), Vec2::splat(0.5));
        arena
    }

    #[test]
    fn test_obs_size_is_fixed() {
        let encoder = SensorEncoder::default();
        assert_eq!(encoder.obs_size(), 12 + 90 + 32 + 24);

        let arena = arena();
        for i in 0..arena.entities.len() {
            let obs = encoder.encode(&arena, i);
            assert_eq!(obs.values.len(), encoder.obs_size());
            assert_eq!(obs.mask.len(), 7);
        }
    }

    #[test]
    fn test_ally_behind_is_masked_whole_slot() {
        let encoder = SensorEncoder::default();
        let arena = arena();
        let obs = encoder.encode(&arena, 1);

        // Slot 0 is the boss straight ahead, slot 1 the ally directly behind.
        assert!(obs.mask[0]);
        assert_eq!(obs.values[encoder.agent_slot_range(0)][7], 1.0);
        assert!(!obs.mask[1]);
        assert!(obs.values[encoder.agent_slot_range(1)].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_unused_slots_zero_filled() {
        let encoder = SensorEncoder::default();
        let arena = arena();
        let obs = encoder.encode(&arena, 1);
        for slot in 2..4 {
            assert!(!obs.mask[slot]);
            assert!(obs.values[encoder.agent_slot_range(slot)].iter().all(|v| *v == 0.0));
        }
        for slot in 1..3 {
            assert!(obs.values[encoder.wall_slot_range(slot)].iter().all(|v| *v == 0.0));
        }
    }

    #[test]
    fn test_self_segment() {
        let encoder = SensorEncoder::default();
        let mut arena = arena();
        arena.entities[1].role.set(Role::Healer);
        arena.threat.add_threat(&EntityId::new("Front"), 50.0);

        let obs = encoder.encode(&arena, 1);
        assert_eq!(obs.values[3], 1.0); // full health
        assert!((obs.values[4] - 0.25).abs() < 1e-6); // healer class code 1
        assert!((obs.values[5] - 0.5).abs() < 1e-6); // threat 50 / 100
        assert_eq!(&obs.values[6..9], &[1.0, 1.0, 0.0]);

        let boss_obs = encoder.encode(&arena, 0);
        assert_eq!(boss_obs.values[4], 1.0);
        assert!((boss_obs.values[2] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_dead_agents_leave_slots() {
        let encoder = SensorEncoder::default();
        let mut arena = arena();
        arena.entities[0].health.kill();
        let obs = encoder.encode(&arena, 1);
        // Only the ally behind remains, masked.
        assert!(!obs.mask[0]);
        assert!(obs.values[encoder.agent_slot_range(0)].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_wall_slot_visible_in_cone() {
        let encoder = SensorEncoder::default();
        let arena = arena();
        let obs = encoder.encode(&arena, 1);
        // Wall at (2, 3) is ahead and to the right, inside the cone.
        assert!(obs.mask[4]);
        let slot = &obs.values[encoder.wall_slot_range(0)];
        assert!((slot[0] - 0.1).abs() < 1e-5);
        assert!((slot[1] - 0.15).abs() < 1e-5);
        assert_eq!(slot[7], 1.0);
    }
}
