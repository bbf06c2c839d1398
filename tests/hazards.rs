mod common;

use bossfight_arena::abilities::ArenaEvent;
use bossfight_arena::control::IdlePolicy;
use bossfight_arena::infra::{Body, PhysicsWorld, Pose};
use bossfight_arena::{ArenaConfig, EntityId};

use common::{Script, simulation};

#[test]
fn test_lava_damages_once_per_second() {
    let mut sim = simulation(ArenaConfig::default());
    sim.set_spawn_positions([(EntityId::new("Party_0"), Pose::new(-6.0, -2.0, 0.0))]);
    let party = sim.arena().index_of(&EntityId::new("Party_0")).unwrap();

    for _ in 0..50 {
        sim.tick(&mut IdlePolicy);
    }
    assert!(sim.arena().entities[party].health.in_hazard());
    assert_eq!(sim.arena().entities[party].health.current(), 100.0);

    sim.tick(&mut IdlePolicy);
    assert_eq!(sim.arena().entities[party].health.current(), 92.0);
}

#[test]
fn test_leaving_lava_starts_burn() {
    let mut sim = simulation(ArenaConfig::default());
    // Facing +X on the pool's right edge; one step forward leaves it.
    sim.set_spawn_positions([(EntityId::new("Party_0"), Pose::new(-4.55, -2.0, 90.0))]);
    let party = sim.arena().index_of(&EntityId::new("Party_0")).unwrap();

    sim.tick(&mut IdlePolicy);
    assert!(sim.arena().entities[party].health.in_hazard());

    // Walk out well after the respawn grace.
    for _ in 0..20 {
        sim.tick(&mut IdlePolicy);
    }
    let mut walk = Script::default().with("Party_0", vec![1, 0, 0, 0, 0, 4]);
    sim.tick(&mut walk);
    let mut stop = Script::default().with("Party_0", vec![0, 0, 0, 0, 0, 4]);
    sim.tick(&mut stop);

    let health = &sim.arena().entities[party].health;
    assert!(!health.in_hazard());
    assert!(health.is_burning());
}

#[test]
fn test_void_ignored_during_grace_then_lethal() {
    let mut sim = simulation(ArenaConfig::default());
    sim.set_spawn_positions([
        // Spawned inside a pit: the entry edge falls inside the grace window.
        (EntityId::new("Party_1"), Pose::new(-7.2, 8.5, 0.0)),
        // Walks north into the same pit after about 21 ticks.
        (EntityId::new("Party_0"), Pose::new(-8.0, 5.0, 0.0)),
    ]);
    let mut walk = Script::default().with("Party_0", vec![1, 0, 0, 0, 0, 4]);

    let mut deaths = Vec::new();
    for _ in 0..40 {
        let report = sim.tick(&mut walk);
        deaths.extend(report.events.into_iter().filter_map(|e| match e {
            ArenaEvent::Died { entity } => Some(entity),
            _ => None,
        }));
    }

    assert_eq!(deaths, vec![EntityId::new("Party_0")]);
    let arena = sim.arena();
    let walker = arena.entity(&EntityId::new("Party_0")).unwrap();
    assert!(walker.health.is_dead());
    assert!(walker.health.is_despawned());
    assert!(arena.entity(&EntityId::new("Party_1")).unwrap().health.is_alive());
    assert!(sim.controller().is_active());

    // Despawned bodies stay where they fell.
    let pose = arena.physics.pose(&Body::Agent(EntityId::new("Party_0"))).unwrap();
    assert!(pose.position.y > 7.0);
}
