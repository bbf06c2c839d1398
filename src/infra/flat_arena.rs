//! Headless 2D stand-in for the physics collaborator.
//!
//! Agents are circles, walls and hazard zones are axis-aligned boxes, and the
//! arena is a square enclosure centred on the origin. Everything is
//! deterministic so recorded episodes replay exactly.

use bevy::math::Vec2;

use super::physics::{Body, ContactEvent, HitTarget, PhysicsWorld, RayHit};
use super::types::{EntityId, HazardKind, Pose, WallId};

const CONTACT_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone)]
struct AgentBody {
    id: EntityId,
    pose: Pose,
    radius: f32,
    enabled: bool,
    in_lava: bool,
    in_void: bool,
}

#[derive(Debug, Clone)]
struct WallBody {
    id: WallId,
    pose: Pose,
    half_size: Vec2,
    enabled: bool,
}

#[derive(Debug, Clone)]
struct HazardZone {
    kind: HazardKind,
    min: Vec2,
    max: Vec2,
}

impl HazardZone {
    fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }
}

#[derive(Debug, Clone)]
pub struct FlatArena {
    half_extent: f32,
    agents: Vec<AgentBody>,
    walls: Vec<WallBody>,
    zones: Vec<HazardZone>,
}

impl FlatArena {
    pub fn new(half_extent: f32) -> Self {
        Self {
            half_extent,
            agents: Vec::new(),
            walls: Vec::new(),
            zones: Vec::new(),
        }
    }

    pub fn half_extent(&self) -> f32 {
        self.half_extent
    }

    pub fn add_agent(&mut self, id: EntityId, pose: Pose, radius: f32) {
        self.agents.push(AgentBody {
            id,
            pose,
            radius,
            enabled: true,
            in_lava: false,
            in_void: false,
        });
    }

    pub fn add_wall(&mut self, id: WallId, pose: Pose, half_size: Vec2) {
        self.walls.push(WallBody {
            id,
            pose,
            half_size,
            enabled: true,
        });
    }

    pub fn add_hazard(&mut self, kind: HazardKind, center: Vec2, half_size: Vec2) {
        self.zones.push(HazardZone {
            kind,
            min: center - half_size,
            max: center + half_size,
        });
    }

    fn agent_index(&self, id: &EntityId) -> Option<usize> {
        self.agents.iter().position(|a| &a.id == id)
    }

    fn wall_index(&self, id: WallId) -> Option<usize> {
        self.walls.iter().position(|w| w.id == id)
    }

    fn overlaps_anything(&self, index: usize, center: Vec2, radius: f32) -> Vec<Overlap> {
        let mut overlaps = Vec::new();
        let limit = self.half_extent - radius;
        if center.x.abs() > limit + CONTACT_EPSILON || center.y.abs() > limit + CONTACT_EPSILON {
            overlaps.push(Overlap::Boundary);
        }
        for (i, wall) in self.walls.iter().enumerate() {
            if wall.enabled && circle_overlaps_box(center, radius, wall.pose.position, wall.half_size) {
                overlaps.push(Overlap::Wall(i));
            }
        }
        for (i, other) in self.agents.iter().enumerate() {
            if i == index || !other.enabled {
                continue;
            }
            let reach = radius + other.radius - CONTACT_EPSILON;
            if center.distance_squared(other.pose.position) < reach * reach {
                overlaps.push(Overlap::Agent(i));
            }
        }
        overlaps
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Overlap {
    Boundary,
    Wall(usize),
    Agent(usize),
}

fn circle_overlaps_box(center: Vec2, radius: f32, box_center: Vec2, half_size: Vec2) -> bool {
    let closest = center.clamp(box_center - half_size, box_center + half_size);
    let reach = radius - CONTACT_EPSILON;
    reach > 0.0 && center.distance_squared(closest) < reach * reach
}

/// Distance along a unit ray to a circle, `Some(0.0)` when starting inside.
fn ray_circle(origin: Vec2, direction: Vec2, center: Vec2, radius: f32) -> Option<f32> {
    let offset = origin - center;
    let b = offset.dot(direction);
    let c = offset.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let t = -b - discriminant.sqrt();
    if t >= 0.0 { Some(t) } else { None }
}

/// Slab test returning `(t_enter, t_exit)` for a unit ray against a box.
fn ray_box(origin: Vec2, direction: Vec2, min: Vec2, max: Vec2) -> Option<(f32, f32)> {
    let mut t_min = f32::NEG_INFINITY;
    let mut t_max = f32::INFINITY;
    for axis in 0..2 {
        let (o, d, lo, hi) = (origin[axis], direction[axis], min[axis], max[axis]);
        if d.abs() < 1e-9 {
            if o < lo || o > hi {
                return None;
            }
            continue;
        }
        let t1 = (lo - o) / d;
        let t2 = (hi - o) / d;
        t_min = t_min.max(t1.min(t2));
        t_max = t_max.min(t1.max(t2));
    }
    if t_max < t_min || t_max < 0.0 {
        None
    } else {
        Some((t_min, t_max))
    }
}

impl PhysicsWorld for FlatArena {
    fn raycast_all(&self, origin: Vec2, direction: Vec2, max_distance: f32) -> Vec<RayHit> {
        let direction = direction.normalize_or_zero();
        if direction == Vec2::ZERO || max_distance <= 0.0 {
            return Vec::new();
        }

        let mut hits = Vec::new();
        let mut push = |distance: f32, target: HitTarget| {
            if distance <= max_distance {
                hits.push(RayHit {
                    point: origin + direction * distance,
                    distance,
                    target,
                });
            }
        };

        for agent in self.agents.iter().filter(|a| a.enabled) {
            if let Some(t) = ray_circle(origin, direction, agent.pose.position, agent.radius) {
                push(t, HitTarget::Agent(agent.id.clone()));
            }
        }
        for wall in self.walls.iter().filter(|w| w.enabled) {
            let center = wall.pose.position;
            if let Some((enter, _)) =
                ray_box(origin, direction, center - wall.half_size, center + wall.half_size)
            {
                push(enter.max(0.0), HitTarget::Wall(wall.id));
            }
        }
        for zone in &self.zones {
            // Rays only register a hazard surface when arriving from outside.
            if let Some((enter, _)) = ray_box(origin, direction, zone.min, zone.max)
                && enter > 0.0
            {
                push(enter, HitTarget::Hazard(zone.kind));
            }
        }
        let extent = Vec2::splat(self.half_extent);
        if let Some((_, exit)) = ray_box(origin, direction, -extent, extent) {
            push(exit.max(0.0), HitTarget::Boundary);
        }

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    fn pose(&self, body: &Body) -> Option<Pose> {
        match body {
            Body::Agent(id) => self.agent_index(id).map(|i| self.agents[i].pose),
            Body::Wall(id) => self.wall_index(*id).map(|i| self.walls[i].pose),
        }
    }

    fn set_pose(&mut self, body: &Body, pose: Pose) {
        match body {
            Body::Agent(id) => {
                if let Some(i) = self.agent_index(id) {
                    self.agents[i].pose = pose;
                }
            }
            Body::Wall(id) => {
                if let Some(i) = self.wall_index(*id) {
                    self.walls[i].pose = pose;
                }
            }
        }
    }

    fn move_body(&mut self, body: &Body, displacement: Vec2) {
        match body {
            Body::Agent(id) => {
                let Some(i) = self.agent_index(id) else {
                    return;
                };
                let agent = &self.agents[i];
                if !agent.enabled {
                    return;
                }
                let from = agent.pose.position;
                let to = from + displacement;
                let before = self.overlaps_anything(i, from, agent.radius);
                let after = self.overlaps_anything(i, to, agent.radius);
                // Only contacts created by this move block it, so bodies that
                // start out overlapping can still separate.
                if after.iter().all(|o| before.contains(o)) {
                    self.agents[i].pose.position = to;
                } else {
                    tracing::trace!("move of {} blocked", id);
                }
            }
            Body::Wall(id) => {
                if let Some(i) = self.wall_index(*id) {
                    self.walls[i].pose.position += displacement;
                }
            }
        }
    }

    fn set_enabled(&mut self, body: &Body, enabled: bool) {
        match body {
            Body::Agent(id) => {
                if let Some(i) = self.agent_index(id) {
                    let agent = &mut self.agents[i];
                    agent.enabled = enabled;
                    if !enabled {
                        agent.in_lava = false;
                        agent.in_void = false;
                    }
                }
            }
            Body::Wall(id) => {
                if let Some(i) = self.wall_index(*id) {
                    self.walls[i].enabled = enabled;
                }
            }
        }
    }

    fn step(&mut self, _dt: f32) -> Vec<ContactEvent> {
        let mut events = Vec::new();
        for agent in self.agents.iter_mut().filter(|a| a.enabled) {
            let position = agent.pose.position;
            let in_lava = self
                .zones
                .iter()
                .any(|z| z.kind == HazardKind::Lava && z.contains(position));
            let in_void = self
                .zones
                .iter()
                .any(|z| z.kind == HazardKind::Void && z.contains(position));

            for (was, now, hazard) in [
                (agent.in_lava, in_lava, HazardKind::Lava),
                (agent.in_void, in_void, HazardKind::Void),
            ] {
                if now && !was {
                    events.push(ContactEvent::Entered {
                        entity: agent.id.clone(),
                        hazard,
                    });
                } else if was && !now {
                    events.push(ContactEvent::Exited {
                        entity: agent.id.clone(),
                        hazard,
                    });
                }
            }
            agent.in_lava = in_lava;
            agent.in_void = in_void;
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena_with_two_agents() -> FlatArena {
        let mut arena = FlatArena::new(10.0);
        arena.add_agent(EntityId::new("a"), Pose::new(0.0, 0.0, 0.0), 0.5);
        arena.add_agent(EntityId::new("b"), Pose::new(0.0, 4.0, 180.0), 0.5);
        arena
    }

    #[test]
    fn test_raycast_sorted_and_includes_origin_body() {
        let arena = arena_with_two_agents();
        let hits = arena.raycast_all(Vec2::ZERO, Vec2::Y, 10.0);

        assert_eq!(hits[0].target, HitTarget::Agent(EntityId::new("a")));
        assert_eq!(hits[0].distance, 0.0);
        assert_eq!(hits[1].target, HitTarget::Agent(EntityId::new("b")));
        assert!((hits[1].distance - 3.5).abs() < 1e-5);
        assert_eq!(hits.last().map(|h| h.target.clone()), Some(HitTarget::Boundary));
    }

    #[test]
    fn test_raycast_respects_max_distance() {
        let arena = arena_with_two_agents();
        let hits = arena.raycast_all(Vec2::ZERO, Vec2::Y, 2.0);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_raycast_wall_and_hazard() {
        let mut arena = FlatArena::new(10.0);
        arena.add_wall(WallId(0), Pose::new(3.0, 0.0, 0.0), Vec2::splat(0.5));
        arena.add_hazard(HazardKind::Lava, Vec2::new(6.0, 0.0), Vec2::splat(1.0));

        let hits = arena.raycast_all(Vec2::ZERO, Vec2::X, 10.0);
        assert_eq!(hits[0].target, HitTarget::Wall(WallId(0)));
        assert!((hits[0].distance - 2.5).abs() < 1e-5);
        assert_eq!(hits[1].target, HitTarget::Hazard(HazardKind::Lava));
        assert!((hits[1].distance - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_hazard_not_hit_from_inside() {
        let mut arena = FlatArena::new(10.0);
        arena.add_hazard(HazardKind::Lava, Vec2::ZERO, Vec2::splat(2.0));
        let hits = arena.raycast_all(Vec2::ZERO, Vec2::X, 5.0);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_move_blocked_by_wall_and_boundary() {
        let mut arena = FlatArena::new(10.0);
        let id = EntityId::new("a");
        arena.add_agent(id.clone(), Pose::new(0.0, 0.0, 0.0), 0.5);
        arena.add_wall(WallId(0), Pose::new(0.0, 1.5, 0.0), Vec2::splat(0.5));

        let body = Body::Agent(id.clone());
        arena.move_body(&body, Vec2::new(0.0, 0.6));
        assert_eq!(arena.pose(&body).map(|p| p.position), Some(Vec2::ZERO));

        arena.move_body(&body, Vec2::new(9.6, 0.0));
        assert_eq!(arena.pose(&body).map(|p| p.position), Some(Vec2::ZERO));

        arena.move_body(&body, Vec2::new(2.0, 0.0));
        assert_eq!(arena.pose(&body).map(|p| p.position), Some(Vec2::new(2.0, 0.0)));
    }

    #[test]
    fn test_overlapping_bodies_can_separate() {
        let mut arena = FlatArena::new(10.0);
        let id = EntityId::new("a");
        arena.add_agent(id.clone(), Pose::new(0.0, 0.0, 0.0), 0.5);
        arena.add_wall(WallId(0), Pose::new(0.0, 0.5, 0.0), Vec2::splat(0.5));

        let body = Body::Agent(id);
        arena.move_body(&body, Vec2::new(0.0, -1.0));
        assert_eq!(arena.pose(&body).map(|p| p.position), Some(Vec2::new(0.0, -1.0)));
    }

    #[test]
    fn test_hazard_edges() {
        let mut arena = FlatArena::new(10.0);
        let id = EntityId::new("a");
        arena.add_agent(id.clone(), Pose::new(0.0, 0.0, 0.0), 0.5);
        arena.add_hazard(HazardKind::Lava, Vec2::new(3.0, 0.0), Vec2::splat(1.0));

        assert!(arena.step(0.02).is_empty());

        let body = Body::Agent(id.clone());
        arena.set_pose(&body, Pose::new(3.0, 0.0, 0.0));
        assert_eq!(
            arena.step(0.02),
            vec![ContactEvent::Entered {
                entity: id.clone(),
                hazard: HazardKind::Lava
            }]
        );
        assert!(arena.step(0.02).is_empty());

        arena.set_pose(&body, Pose::new(0.0, 0.0, 0.0));
        assert_eq!(
            arena.step(0.02),
            vec![ContactEvent::Exited {
                entity: id,
                hazard: HazardKind::Lava
            }]
        );
    }

    #[test]
    fn test_disabled_agent_invisible() {
        let mut arena = arena_with_two_agents();
        arena.set_enabled(&Body::Agent(EntityId::new("b")), false);
        let hits = arena.raycast_all(Vec2::new(0.0, 1.0), Vec2::Y, 10.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].target, HitTarget::Boundary);
    }
}
