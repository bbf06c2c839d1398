use crate::config::ArenaConfig;
use crate::infra::EntityKind;

/// Ability cooldown counted in whole simulation ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cooldown {
    duration_ticks: u64,
    last_used: Option<u64>,
}

impl Cooldown {
    pub fn new(duration_ticks: u64) -> Self {
        Self {
            duration_ticks,
            last_used: None,
        }
    }

    pub fn duration_ticks(&self) -> u64 {
        self.duration_ticks
    }

    /// Usable iff `now >= last_used + duration`; never used counts as ready.
    pub fn ready(&self, now_tick: u64) -> bool {
        self.last_used
            .is_none_or(|last| now_tick >= last + self.duration_ticks)
    }

    pub fn remaining(&self, now_tick: u64) -> u64 {
        self.last_used.map_or(0, |last| {
            (last + self.duration_ticks).saturating_sub(now_tick)
        })
    }

    pub fn trigger(&mut self, now_tick: u64) {
        self.last_used = Some(now_tick);
    }

    pub fn reset(&mut self) {
        self.last_used = None;
    }
}

/// Ability cooldowns owned by one combatant.
#[derive(Debug, Clone)]
pub struct AbilityTimers {
    pub attack: Cooldown,
    pub heal: Cooldown,
    pub threat_boost: Cooldown,
}

impl AbilityTimers {
    pub fn for_kind(kind: EntityKind, config: &ArenaConfig) -> Self {
        let roles = &config.roles;
        let attack = match kind {
            EntityKind::Boss => roles.boss_attack_cooldown_secs,
            EntityKind::PartyMember => roles.attack_cooldown_secs,
        };
        Self {
            attack: Cooldown::new(config.ticks(attack)),
            heal: Cooldown::new(config.ticks(roles.heal_cooldown_secs)),
            threat_boost: Cooldown::new(config.ticks(roles.threat_boost_cooldown_secs)),
        }
    }

    pub fn reset(&mut self) {
        self.attack.reset();
        self.heal.reset();
        self.threat_boost.reset();
    }
}
