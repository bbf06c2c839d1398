use bevy::math::Vec2;

use crate::infra::{EntityId, Pose, WallId};

/// Movable wall obstacle the boss can carry.
#[derive(Debug, Clone)]
pub struct Wall {
    pub id: WallId,
    pub spawn: Pose,
    pub half_size: Vec2,
    pub carried_by: Option<EntityId>,
    pub speed: f32,
}

impl Wall {
    pub fn new(id: WallId, spawn: Pose, half_size: Vec2) -> Self {
        Self {
            id,
            spawn,
            half_size,
            carried_by: None,
            speed: 0.0,
        }
    }

    pub fn is_carried(&self) -> bool {
        self.carried_by.is_some()
    }
}
