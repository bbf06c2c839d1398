//! Fixed discrete action interface.
//!
//! A boss consumes five integers per decode and a party member six. Movement
//! and rotation are level intents that persist until the next decode; every
//! other branch is an edge trigger consumed by the next actuation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::infra::EntityKind;
use crate::state::Role;

/// Class-selection value meaning "keep the current choice".
pub const NO_CLASS_SELECTION: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionBranch {
    Movement,
    Rotation,
    Attack,
    WallPickup,
    WallPlace,
    Heal,
    ThreatBoost,
    ClassSelection,
}

pub const BOSS_BRANCHES: [ActionBranch; 5] = [
    ActionBranch::Movement,
    ActionBranch::Rotation,
    ActionBranch::Attack,
    ActionBranch::WallPickup,
    ActionBranch::WallPlace,
];

pub const PARTY_BRANCHES: [ActionBranch; 6] = [
    ActionBranch::Movement,
    ActionBranch::Rotation,
    ActionBranch::Attack,
    ActionBranch::Heal,
    ActionBranch::ThreatBoost,
    ActionBranch::ClassSelection,
];

impl ActionBranch {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionBranch::Movement => "movement",
            ActionBranch::Rotation => "rotation",
            ActionBranch::Attack => "attack",
            ActionBranch::WallPickup => "wall_pickup",
            ActionBranch::WallPlace => "wall_place",
            ActionBranch::Heal => "heal",
            ActionBranch::ThreatBoost => "threat_boost",
            ActionBranch::ClassSelection => "class_selection",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [BOSS_BRANCHES.as_slice(), PARTY_BRANCHES.as_slice()]
            .concat()
            .into_iter()
            .find(|b| b.as_str() == name)
    }

    pub fn applies_to(self, kind: EntityKind) -> bool {
        branches_for(kind).contains(&self)
    }

    /// Number of discrete values the branch accepts.
    pub fn cardinality(self) -> i32 {
        match self {
            ActionBranch::Movement | ActionBranch::Rotation => 3,
            ActionBranch::ClassSelection => 5,
            _ => 2,
        }
    }
}

impl fmt::Display for ActionBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn branches_for(kind: EntityKind) -> &'static [ActionBranch] {
    match kind {
        EntityKind::Boss => &BOSS_BRANCHES,
        EntityKind::PartyMember => &PARTY_BRANCHES,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("action vector too short: expected {expected} branches, got {actual}")]
    TooShort { expected: usize, actual: usize },
}

/// Pair every branch of `kind` with its value from `values`.
///
/// Extra trailing values are ignored; a short vector is rejected whole.
pub fn decode_vector(
    kind: EntityKind,
    values: &[i32],
) -> Result<Vec<(ActionBranch, i32)>, DecodeError> {
    let branches = branches_for(kind);
    if values.len() < branches.len() {
        return Err(DecodeError::TooShort {
            expected: branches.len(),
            actual: values.len(),
        });
    }
    Ok(branches.iter().copied().zip(values.iter().copied()).collect())
}

/// Decoded intent state of one agent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Intents {
    /// +1 forward, -1 back
    pub movement: f32,
    /// +1 right (clockwise), -1 left
    pub rotation: f32,
    pub attack: bool,
    pub heal: bool,
    pub threat_boost: bool,
    pub wall_pickup: bool,
    pub wall_place: bool,
    pub class_selection: Option<Role>,
}

/// Edge-triggered part of [`Intents`], taken once per actuation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Triggers {
    pub attack: bool,
    pub heal: bool,
    pub threat_boost: bool,
    pub wall_pickup: bool,
    pub wall_place: bool,
    pub class_selection: Option<Role>,
}

impl Intents {
    /// Write one branch value. `role_locked` suppresses class selection.
    pub fn apply(&mut self, branch: ActionBranch, value: i32, role_locked: bool) {
        match branch {
            ActionBranch::Movement => {
                self.movement = match value {
                    1 => 1.0,
                    2 => -1.0,
                    _ => 0.0,
                }
            }
            ActionBranch::Rotation => {
                self.rotation = match value {
                    1 => -1.0,
                    2 => 1.0,
                    _ => 0.0,
                }
            }
            ActionBranch::Attack => self.attack |= value == 1,
            ActionBranch::Heal => self.heal |= value == 1,
            ActionBranch::ThreatBoost => self.threat_boost |= value == 1,
            ActionBranch::WallPickup => self.wall_pickup |= value == 1,
            ActionBranch::WallPlace => self.wall_place |= value == 1,
            ActionBranch::ClassSelection => {
                if !role_locked && let Some(role) = Role::from_selection(value) {
                    self.class_selection = Some(role);
                }
            }
        }
    }

    pub fn take_triggers(&mut self) -> Triggers {
        Triggers {
            attack: std::mem::take(&mut self.attack),
            heal: std::mem::take(&mut self.heal),
            threat_boost: std::mem::take(&mut self.threat_boost),
            wall_pickup: std::mem::take(&mut self.wall_pickup),
            wall_place: std::mem::take(&mut self.wall_place),
            class_selection: self.class_selection.take(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_counts() {
        assert_eq!(branches_for(EntityKind::Boss).len(), 5);
        assert_eq!(branches_for(EntityKind::PartyMember).len(), 6);
        assert!(ActionBranch::WallPickup.applies_to(EntityKind::Boss));
        assert!(!ActionBranch::WallPickup.applies_to(EntityKind::PartyMember));
        assert!(!ActionBranch::Heal.applies_to(EntityKind::Boss));
    }

    #[test]
    fn test_branch_names() {
        for branch in PARTY_BRANCHES.iter().chain(BOSS_BRANCHES.iter()) {
            assert_eq!(ActionBranch::from_name(branch.as_str()), Some(*branch));
        }
        assert_eq!(ActionBranch::from_name("dance"), None);
    }

    #[test]
    fn test_decode_short_vector_is_error() {
        let err = decode_vector(EntityKind::PartyMember, &[1, 0, 0]).unwrap_err();
        assert_eq!(
            err,
            DecodeError::TooShort {
                expected: 6,
                actual: 3
            }
        );
    }

    #[test]
    fn test_decode_ignores_extra_values() {
        let decoded = decode_vector(EntityKind::Boss, &[1, 2, 0, 0, 1, 9, 9]).unwrap();
        assert_eq!(decoded.len(), 5);
        assert_eq!(decoded[4], (ActionBranch::WallPlace, 1));
    }

    #[test]
    fn test_movement_and_rotation_levels() {
        let mut intents = Intents::default();
        intents.apply(ActionBranch::Movement, 1, false);
        intents.apply(ActionBranch::Rotation, 1, false);
        assert_eq!(intents.movement, 1.0);
        assert_eq!(intents.rotation, -1.0);

        intents.apply(ActionBranch::Movement, 2, false);
        intents.apply(ActionBranch::Rotation, 2, false);
        assert_eq!(intents.movement, -1.0);
        assert_eq!(intents.rotation, 1.0);

        intents.apply(ActionBranch::Movement, 7, false);
        assert_eq!(intents.movement, 0.0);

        // Levels survive taking the triggers.
        intents.take_triggers();
        assert_eq!(intents.rotation, 1.0);
    }

    #[test]
    fn test_triggers_fire_once() {
        let mut intents = Intents::default();
        intents.apply(ActionBranch::Attack, 1, false);
        intents.apply(ActionBranch::Attack, 0, false);
        assert!(intents.take_triggers().attack);
        assert!(!intents.take_triggers().attack);
    }

    #[test]
    fn test_class_selection_rules() {
        let mut intents = Intents::default();
        intents.apply(ActionBranch::ClassSelection, NO_CLASS_SELECTION, false);
        assert_eq!(intents.class_selection, None);
        intents.apply(ActionBranch::ClassSelection, -3, false);
        assert_eq!(intents.class_selection, None);
        intents.apply(ActionBranch::ClassSelection, 1, true);
        assert_eq!(intents.class_selection, None);
        intents.apply(ActionBranch::ClassSelection, 1, false);
        assert_eq!(intents.class_selection, Some(Role::Healer));
    }
}
