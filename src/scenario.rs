//! Standard arena layout: one boss, four party members, three movable walls,
//! two lava pools and two void pits.

use bevy::math::Vec2;

use crate::config::ArenaConfig;
use crate::infra::{EntityId, EntityKind, FlatArena, HazardKind, Pose};
use crate::state::Arena;

pub const HALF_EXTENT: f32 = 10.0;
pub const BOSS_ID: &str = "Boss";
pub const PARTY_SIZE: usize = 4;
pub const BOSS_RADIUS: f32 = 1.0;
pub const PARTY_RADIUS: f32 = 0.5;
pub const WALL_HALF_SIZE: f32 = 0.5;

pub fn party_id(slot: usize) -> EntityId {
    EntityId::new(format!("Party_{slot}"))
}

pub fn boss_spawn() -> Pose {
    Pose::new(0.0, 6.0, 180.0)
}

pub fn party_spawn(slot: usize) -> Pose {
    Pose::new(-3.0 + 2.0 * slot as f32, -6.0, 0.0)
}

pub fn wall_spawns() -> [Pose; 3] {
    [
        Pose::new(-4.0, 0.0, 0.0),
        Pose::new(0.0, 1.0, 0.0),
        Pose::new(4.0, 0.0, 0.0),
    ]
}

/// `(kind, centre, half size)` of every hazard zone.
pub fn hazards() -> [(HazardKind, Vec2, Vec2); 4] {
    [
        (HazardKind::Lava, Vec2::new(-6.0, -2.0), Vec2::splat(1.5)),
        (HazardKind::Lava, Vec2::new(6.0, -2.0), Vec2::splat(1.5)),
        (HazardKind::Void, Vec2::new(-8.0, 8.0), Vec2::splat(1.0)),
        (HazardKind::Void, Vec2::new(8.0, 8.0), Vec2::splat(1.0)),
    ]
}

/// Build the physics world and register every entity with the arena.
pub fn standard_arena(config: ArenaConfig) -> Arena<FlatArena> {
    let mut physics = FlatArena::new(HALF_EXTENT);
    let boss_id = EntityId::new(BOSS_ID);
    physics.add_agent(boss_id.clone(), boss_spawn(), BOSS_RADIUS);
    for slot in 0..PARTY_SIZE {
        physics.add_agent(party_id(slot), party_spawn(slot), PARTY_RADIUS);
    }
    for (kind, centre, half_size) in hazards() {
        physics.add_hazard(kind, centre, half_size);
    }

    let mut arena = Arena::new(physics, config);
    arena.add_entity(boss_id, EntityKind::Boss, boss_spawn());
    for slot in 0..PARTY_SIZE {
        arena.add_entity(party_id(slot), EntityKind::PartyMember, party_spawn(slot));
    }
    for spawn in wall_spawns() {
        let id = arena.add_wall(spawn, Vec2::splat(WALL_HALF_SIZE));
        arena.physics.add_wall(id, spawn, Vec2::splat(WALL_HALF_SIZE));
    }

    tracing::debug!(
        "standard arena: {} entities, {} walls",
        arena.entities.len(),
        arena.walls.len()
    );
    arena
}
