use serde::{Deserialize, Serialize};

use crate::config::RoleConfig;

/// Party specialisation chosen once per episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Role {
    #[default]
    None,
    Tank,
    Healer,
    #[serde(rename = "RangedDPS")]
    RangedDps,
    #[serde(rename = "MeleeDPS")]
    MeleeDps,
}

impl Role {
    pub const SELECTABLE: [Role; 4] = [Role::Tank, Role::Healer, Role::RangedDps, Role::MeleeDps];

    /// Class-selection branch value to role; anything outside `0..=3` is no selection.
    pub fn from_selection(value: i32) -> Option<Role> {
        usize::try_from(value)
            .ok()
            .and_then(|i| Self::SELECTABLE.get(i).copied())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::None => "None",
            Role::Tank => "Tank",
            Role::Healer => "Healer",
            Role::RangedDps => "RangedDPS",
            Role::MeleeDps => "MeleeDPS",
        }
    }

    pub fn from_name(name: &str) -> Option<Role> {
        match name {
            "None" => Some(Role::None),
            "Tank" => Some(Role::Tank),
            "Healer" => Some(Role::Healer),
            "RangedDPS" => Some(Role::RangedDps),
            "MeleeDPS" => Some(Role::MeleeDps),
            _ => None,
        }
    }

    /// Ordinal class code used in observations: None -1, Tank 0 .. MeleeDPS 3.
    pub fn class_code(self) -> i32 {
        match self {
            Role::None => -1,
            Role::Tank => 0,
            Role::Healer => 1,
            Role::RangedDps => 2,
            Role::MeleeDps => 3,
        }
    }
}

/// Class code the boss reports, one past the last party role.
pub const BOSS_CLASS_CODE: i32 = 4;

/// One-way role latch: unassigned until the first valid selection, then locked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleLatch {
    role: Role,
    locked: bool,
}

impl RoleLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Lock in `role`. Fails if already locked or `role` is `None`.
    pub fn set(&mut self, role: Role) -> bool {
        if self.locked || role == Role::None {
            return false;
        }
        self.role = role;
        self.locked = true;
        true
    }

    pub fn reset_for_episode(&mut self) {
        self.role = Role::None;
        self.locked = false;
    }
}

impl RoleConfig {
    /// Attack damage for a party role, zero while unassigned.
    pub fn attack_damage(&self, role: Role) -> f32 {
        match role {
            Role::None => 0.0,
            Role::Tank => self.tank_damage,
            Role::Healer => self.healer_damage,
            Role::RangedDps => self.ranged_damage,
            Role::MeleeDps => self.melee_damage,
        }
    }

    pub fn damage_reduction(&self, role: Role) -> f32 {
        match role {
            Role::Tank => self.tank_damage_reduction,
            _ => 0.0,
        }
    }

    pub fn range_multiplier(&self, role: Role) -> f32 {
        match role {
            Role::RangedDps => self.ranged_range_multiplier,
            _ => 1.0,
        }
    }

    pub fn attack_range(&self, role: Role) -> f32 {
        self.base_attack_range * self.range_multiplier(role)
    }
}
