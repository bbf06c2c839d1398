use crate::config::{ArenaConfig, RoleConfig};
use crate::control::{ActionBranch, Intents};
use crate::infra::{EntityId, EntityKind, Pose, Team, WallId};

use super::cooldown::AbilityTimers;
use super::health::{DamageOutcome, HealthModel, HealthTiming};
use super::role::{BOSS_CLASS_CODE, Role, RoleLatch};

/// A boss or party member.
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub health: HealthModel,
    /// Stays unassigned for the boss
    pub role: RoleLatch,
    pub abilities: AbilityTimers,
    pub intents: Intents,
    /// Pose restored at every episode start
    pub spawn: Pose,
    /// Wall currently held (boss only)
    pub carrying: Option<WallId>,
    /// Distance covered during the last step divided by dt
    pub speed: f32,
}

impl Entity {
    pub fn new(id: EntityId, kind: EntityKind, spawn: Pose, config: &ArenaConfig) -> Self {
        Self {
            id,
            kind,
            health: HealthModel::new(HealthTiming::from_config(config)),
            role: RoleLatch::new(),
            abilities: AbilityTimers::for_kind(kind, config),
            intents: Intents::default(),
            spawn,
            carrying: None,
            speed: 0.0,
        }
    }

    pub fn team(&self) -> Team {
        self.kind.team()
    }

    pub fn is_boss(&self) -> bool {
        self.kind == EntityKind::Boss
    }

    pub fn role(&self) -> Role {
        self.role.role()
    }

    /// Role name as persisted in episode records.
    pub fn role_name(&self) -> &'static str {
        match self.kind {
            EntityKind::Boss => "Boss",
            EntityKind::PartyMember => self.role().as_str(),
        }
    }

    pub fn class_code(&self) -> i32 {
        match self.kind {
            EntityKind::Boss => BOSS_CLASS_CODE,
            EntityKind::PartyMember => self.role().class_code(),
        }
    }

    pub fn attack_damage(&self, roles: &RoleConfig) -> f32 {
        match self.kind {
            EntityKind::Boss => roles.boss_damage,
            EntityKind::PartyMember => roles.attack_damage(self.role()),
        }
    }

    pub fn attack_range(&self, roles: &RoleConfig) -> f32 {
        roles.attack_range(self.role())
    }

    pub fn damage_reduction(&self, roles: &RoleConfig) -> f32 {
        roles.damage_reduction(self.role())
    }

    pub fn take_damage(&mut self, amount: f32, roles: &RoleConfig) -> DamageOutcome {
        let reduction = self.damage_reduction(roles);
        self.health.take_damage(amount, reduction)
    }

    /// Dispatch one decoded branch value into this entity's intents.
    ///
    /// Dead entities and branches of the other agent kind are ignored.
    pub fn apply_action(&mut self, branch: ActionBranch, value: i32) {
        if self.health.is_dead() {
            return;
        }
        if !branch.applies_to(self.kind) {
            tracing::debug!("{} ignores branch {}", self.id, branch);
            return;
        }
        self.intents.apply(branch, value, self.role.is_locked());
    }

    /// Respawn with a fresh grace window and forget per-episode state.
    pub fn reset_for_episode(&mut self, now_tick: u64) {
        self.health.respawn();
        self.health.start_grace(now_tick);
        self.role.reset_for_episode();
        self.abilities.reset();
        self.intents.reset();
        self.carrying = None;
        self.speed = 0.0;
    }
}
