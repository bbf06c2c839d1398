//! Vision cone and wall occlusion tests

use bevy::math::Vec2;

use crate::infra::{HitTarget, PhysicsWorld, Pose, WallId, angle_between};
use crate::state::Arena;

use super::lidar::is_own_hit;

/// Whether `point` lies within the forward cone of `pose` (full opening angle).
pub fn in_cone(pose: &Pose, point: Vec2, cone_degrees: f32) -> bool {
    let to_point = point - pose.position;
    if to_point.length_squared() < 1e-8 {
        return true;
    }
    angle_between(pose.forward(), to_point) <= cone_degrees * 0.5
}

/// Line of sight from the observer to `point`, blocked only by walls.
///
/// `target_wall` is the wall being looked at, which never occludes itself.
pub fn line_of_sight<P: PhysicsWorld>(
    arena: &Arena<P>,
    observer: usize,
    from: Vec2,
    point: Vec2,
    target_wall: Option<WallId>,
) -> bool {
    let Some(entity) = arena.entities.get(observer) else {
        return false;
    };
    let delta = point - from;
    let distance = delta.length();
    if distance < 1e-6 {
        return true;
    }
    !arena
        .physics
        .raycast_all(from, delta, distance)
        .iter()
        .any(|hit| match &hit.target {
            HitTarget::Wall(wall) => Some(*wall) != target_wall && !is_own_hit(entity, &hit.target),
            _ => false,
        })
}

/// Cone test followed by the occlusion test.
pub fn is_visible<P: PhysicsWorld>(
    arena: &Arena<P>,
    observer: usize,
    pose: &Pose,
    point: Vec2,
    target_wall: Option<WallId>,
    cone_degrees: f32,
) -> bool {
    in_cone(pose, point, cone_degrees)
        && line_of_sight(arena, observer, pose.position, point, target_wall)
}

/// Living teammates within `range` inside the observer's forward cone.
pub fn cone_allies<P: PhysicsWorld>(
    arena: &Arena<P>,
    observer: usize,
    range: f32,
    cone_degrees: f32,
) -> Vec<usize> {
    let (Some(entity), Some(pose)) = (arena.entities.get(observer), arena.pose_of(observer)) else {
        return Vec::new();
    };
    let team = entity.team();

    arena
        .entities
        .iter()
        .enumerate()
        .filter(|(i, other)| *i != observer && other.team() == team && other.health.is_alive())
        .filter_map(|(i, _)| arena.pose_of(i).map(|p| (i, p.position)))
        .filter(|(_, position)| position.distance(pose.position) <= range)
        .filter(|(_, position)| is_visible(arena, observer, &pose, *position, None, cone_degrees))
        .map(|(i, _)| i)
        .collect()
}
