//! Ability execution: attack, heal, threat boost, wall handling and role choice.
//!
//! Every ability re-checks liveness, role and cooldown at execution time, so
//! actions injected by a replay obey exactly the same rules as live ones.

use crate::infra::{Body, EntityId, EntityKind, HitTarget, PhysicsWorld, WallId};
use crate::sensing::{lidar, visibility};
use crate::state::{Arena, Role};

/// Observable outcome of one simulation tick's combat.
#[derive(Debug, Clone, PartialEq)]
pub enum ArenaEvent {
    Attacked {
        attacker: EntityId,
        target: EntityId,
        damage: f32,
    },
    Healed {
        healer: EntityId,
        target: EntityId,
        amount: f32,
    },
    ThreatBoosted {
        agent: EntityId,
        amount: f32,
    },
    RoleSelected {
        agent: EntityId,
        role: Role,
    },
    Died {
        entity: EntityId,
    },
    WallPickedUp {
        agent: EntityId,
        wall: WallId,
    },
    WallPlaced {
        agent: EntityId,
        wall: WallId,
    },
}

/// Kill bookkeeping shared by every damage source.
pub fn handle_death<P: PhysicsWorld>(arena: &mut Arena<P>, index: usize, events: &mut Vec<ArenaEvent>) {
    arena.despawn(index);
    let Some(id) = arena.entities.get(index).map(|e| e.id.clone()) else {
        return;
    };
    tracing::debug!("{} died", id);
    events.push(ArenaEvent::Died { entity: id });
}

pub fn try_attack<P: PhysicsWorld>(arena: &mut Arena<P>, index: usize, events: &mut Vec<ArenaEvent>) {
    let now = arena.clock.tick();
    let roles = &arena.config.roles;
    let Some(attacker) = arena.entities.get(index) else {
        return;
    };
    if attacker.health.is_dead() || !attacker.abilities.attack.ready(now) {
        return;
    }
    let damage = attacker.attack_damage(roles);
    if damage <= 0.0 {
        tracing::trace!("{} has no attack damage", attacker.id);
        return;
    }
    let range = attacker.attack_range(roles);
    let team = attacker.team();

    let Some(hit) = lidar::forward_hit(arena, index, range) else {
        return;
    };
    let HitTarget::Agent(target_id) = hit.target else {
        return;
    };
    let Some(target_index) = arena.index_of(&target_id) else {
        tracing::debug!("attack target {} is not tracked", target_id);
        return;
    };
    let target = &arena.entities[target_index];
    if !team.opposes(target.team()) || target.health.is_dead() {
        return;
    }

    let outcome = arena.entities[target_index].take_damage(damage, &arena.config.roles);
    let attacker = &mut arena.entities[index];
    attacker.abilities.attack.trigger(now);
    let attacker_id = attacker.id.clone();
    if attacker.kind == EntityKind::PartyMember {
        arena.threat.add_threat_from_damage(&attacker_id, outcome.applied);
    }

    events.push(ArenaEvent::Attacked {
        attacker: attacker_id,
        target: target_id,
        damage: outcome.applied,
    });
    if outcome.killed {
        handle_death(arena, target_index, events);
    }
}

pub fn try_heal<P: PhysicsWorld>(arena: &mut Arena<P>, index: usize, events: &mut Vec<ArenaEvent>) {
    let now = arena.clock.tick();
    let Some(healer) = arena.entities.get(index) else {
        return;
    };
    if healer.health.is_dead() || healer.role() != Role::Healer || !healer.abilities.heal.ready(now) {
        return;
    }

    let roles = &arena.config.roles;
    let (amount, range, cone) = (roles.heal_amount, roles.heal_range, roles.heal_cone_degrees);
    let healer_id = healer.id.clone();

    let mut healed_any = false;
    for target in visibility::cone_allies(arena, index, range, cone) {
        let ally = &mut arena.entities[target];
        if ally.health.current() >= ally.health.max() {
            continue;
        }
        let restored = ally.health.heal(amount);
        if restored > 0.0 {
            healed_any = true;
            events.push(ArenaEvent::Healed {
                healer: healer_id.clone(),
                target: ally.id.clone(),
                amount: restored,
            });
        }
    }

    if healed_any {
        arena.entities[index].abilities.heal.trigger(now);
        let baseline = arena.config.threat.baseline;
        arena.threat.add_threat_from_heal(&healer_id, baseline);
    } else {
        tracing::trace!("{} found nobody to heal", healer_id);
    }
}

pub fn try_threat_boost<P: PhysicsWorld>(
    arena: &mut Arena<P>,
    index: usize,
    events: &mut Vec<ArenaEvent>,
) {
    let now = arena.clock.tick();
    let Some(tank) = arena.entities.get_mut(index) else {
        return;
    };
    if tank.health.is_dead() || tank.role() != Role::Tank || !tank.abilities.threat_boost.ready(now) {
        return;
    }
    tank.abilities.threat_boost.trigger(now);
    let agent = tank.id.clone();

    let before = arena.threat.threat(&agent);
    arena.threat.add_threat_boost(&agent, arena.config.threat.baseline);
    let amount = arena.threat.threat(&agent) - before;
    events.push(ArenaEvent::ThreatBoosted { agent, amount });
}

pub fn try_pickup_wall<P: PhysicsWorld>(
    arena: &mut Arena<P>,
    index: usize,
    events: &mut Vec<ArenaEvent>,
) {
    let Some(boss) = arena.entities.get(index) else {
        return;
    };
    if boss.health.is_dead() || !boss.is_boss() || boss.carrying.is_some() {
        return;
    }
    let range = boss.attack_range(&arena.config.roles);
    let Some(HitTarget::Wall(wall_id)) = lidar::forward_hit(arena, index, range).map(|h| h.target)
    else {
        return;
    };
    let agent = boss.id.clone();
    let Some(wall) = arena.walls.iter_mut().find(|w| w.id == wall_id) else {
        return;
    };
    if wall.is_carried() {
        return;
    }
    wall.carried_by = Some(agent.clone());
    arena.entities[index].carrying = Some(wall_id);
    events.push(ArenaEvent::WallPickedUp {
        agent,
        wall: wall_id,
    });
}

pub fn place_wall<P: PhysicsWorld>(arena: &mut Arena<P>, index: usize, events: &mut Vec<ArenaEvent>) {
    let Some(boss) = arena.entities.get(index) else {
        return;
    };
    let Some(wall) = boss.carrying else {
        return;
    };
    let agent = boss.id.clone();
    arena.release_wall(wall);
    events.push(ArenaEvent::WallPlaced { agent, wall });
}

pub fn try_select_role<P: PhysicsWorld>(
    arena: &mut Arena<P>,
    index: usize,
    role: Role,
    events: &mut Vec<ArenaEvent>,
) {
    let Some(entity) = arena.entities.get_mut(index) else {
        return;
    };
    if entity.health.is_dead() || entity.kind != EntityKind::PartyMember {
        return;
    }
    if entity.role.set(role) {
        events.push(ArenaEvent::RoleSelected {
            agent: entity.id.clone(),
            role,
        });
    }
}

/// Keep a carried wall in front of its carrier.
pub fn carry_walls<P: PhysicsWorld>(arena: &mut Arena<P>, dt: f32) {
    let offset = arena.config.roles.wall_carry_offset;
    for i in 0..arena.entities.len() {
        let Some(wall_id) = arena.entities[i].carrying else {
            continue;
        };
        let Some(carrier) = arena.pose_of(i) else {
            continue;
        };
        let body = Body::Wall(wall_id);
        let Some(previous) = arena.physics.pose(&body) else {
            continue;
        };
        let mut pose = previous;
        pose.position = carrier.position + carrier.forward() * offset;
        pose.yaw = carrier.yaw;
        arena.physics.set_pose(&body, pose);
        if let Some(wall) = arena.walls.iter_mut().find(|w| w.id == wall_id) {
            wall.speed = previous.position.distance(pose.position) / dt;
        }
    }
}
