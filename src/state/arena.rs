use bevy::math::Vec2;

use crate::config::ArenaConfig;
use crate::infra::{Body, EntityId, EntityKind, PhysicsWorld, Pose, WallId};

use super::entity::Entity;
use super::threat::ThreatLedger;
use super::wall::Wall;

/// Fixed-step simulation clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimClock {
    tick: u64,
    tick_rate: u32,
}

impl SimClock {
    pub fn new(tick_rate: u32) -> Self {
        Self {
            tick: 0,
            tick_rate: tick_rate.max(1),
        }
    }

    /// Completed steps since the arena was created.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn dt(&self) -> f32 {
        1.0 / self.tick_rate as f32
    }

    pub fn secs_between(&self, from_tick: u64, to_tick: u64) -> f32 {
        to_tick.saturating_sub(from_tick) as f32 / self.tick_rate as f32
    }

    pub fn advance(&mut self) {
        self.tick += 1;
    }
}

/// Every combatant, wall and shared ledger of one arena instance.
pub struct Arena<P: PhysicsWorld> {
    pub physics: P,
    pub entities: Vec<Entity>,
    pub walls: Vec<Wall>,
    pub threat: ThreatLedger,
    pub clock: SimClock,
    pub config: ArenaConfig,
}

impl<P: PhysicsWorld> Arena<P> {
    pub fn new(physics: P, config: ArenaConfig) -> Self {
        Self {
            physics,
            entities: Vec::new(),
            walls: Vec::new(),
            threat: ThreatLedger::new(&config.threat),
            clock: SimClock::new(config.tick_rate),
            config,
        }
    }

    /// Register a combatant; its body must already exist in the physics world.
    pub fn add_entity(&mut self, id: EntityId, kind: EntityKind, spawn: Pose) -> usize {
        if self.index_of(&id).is_some() {
            tracing::warn!("entity {} registered twice", id);
        }
        self.entities
            .push(Entity::new(id, kind, spawn, &self.config));
        self.entities.len() - 1
    }

    pub fn add_wall(&mut self, spawn: Pose, half_size: Vec2) -> WallId {
        let id = WallId(self.walls.len());
        self.walls.push(Wall::new(id, spawn, half_size));
        id
    }

    pub fn index_of(&self, id: &EntityId) -> Option<usize> {
        self.entities.iter().position(|e| &e.id == id)
    }

    pub fn entity(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| &e.id == id)
    }

    pub fn entity_mut(&mut self, id: &EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| &e.id == id)
    }

    pub fn wall(&self, id: WallId) -> Option<&Wall> {
        self.walls.iter().find(|w| w.id == id)
    }

    pub fn boss(&self) -> Option<&Entity> {
        self.entities.iter().find(|e| e.is_boss())
    }

    pub fn party(&self) -> impl Iterator<Item = &Entity> {
        self.entities
            .iter()
            .filter(|e| e.kind == EntityKind::PartyMember)
    }

    pub fn pose_of(&self, index: usize) -> Option<Pose> {
        let entity = self.entities.get(index)?;
        self.physics.pose(&Body::Agent(entity.id.clone()))
    }

    pub fn wall_pose(&self, id: WallId) -> Option<Pose> {
        self.physics.pose(&Body::Wall(id))
    }

    /// Hide a freshly killed entity and let go of anything it carried.
    pub fn despawn(&mut self, index: usize) {
        let Some(entity) = self.entities.get_mut(index) else {
            return;
        };
        entity.health.despawn();
        entity.intents.reset();
        let carried = entity.carrying.take();
        let body = Body::Agent(entity.id.clone());
        self.physics.set_enabled(&body, false);
        if let Some(wall) = carried {
            self.release_wall(wall);
        }
    }

    pub fn release_wall(&mut self, id: WallId) {
        if let Some(wall) = self.walls.iter_mut().find(|w| w.id == id) {
            wall.carried_by = None;
            wall.speed = 0.0;
        }
        for entity in &mut self.entities {
            if entity.carrying == Some(id) {
                entity.carrying = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::FlatArena;

    #[test]
    fn test_clock() {
        let mut clock = SimClock::new(50);
        for _ in 0..25 {
            clock.advance();
        }
        assert_eq!(clock.tick(), 25);
        assert!((clock.secs_between(5, 55) - 1.0).abs() < 1e-6);
        assert_eq!(clock.secs_between(55, 5), 0.0);
    }

    #[test]
    fn test_despawn_drops_wall_and_disables_body() {
        let mut physics = FlatArena::new(10.0);
        let boss_id = EntityId::new("Boss");
        physics.add_agent(boss_id.clone(), Pose::default(), 1.0);
        physics.add_wall(WallId(0), Pose::new(0.0, 3.0, 0.0), Vec2::splat(0.5));

        let mut arena = Arena::new(physics, ArenaConfig::default());
        let boss = arena.add_entity(boss_id.clone(), EntityKind::Boss, Pose::default());
        let wall = arena.add_wall(Pose::new(0.0, 3.0, 0.0), Vec2::splat(0.5));
        arena.entities[boss].carrying = Some(wall);
        arena.walls[0].carried_by = Some(boss_id.clone());

        arena.despawn(boss);
        assert_eq!(arena.entities[boss].carrying, None);
        assert!(!arena.walls[0].is_carried());
        assert!(
            arena
                .physics
                .raycast_all(Vec2::new(0.0, -5.0), Vec2::Y, 4.0)
                .is_empty()
        );
    }
}
