mod arena_observer;
mod composite_observer;
mod default_observer;
mod flat_arena;
mod physics;
mod types;

pub use arena_observer::ArenaObserver;
pub use composite_observer::CompositeObserver;
pub use default_observer::DefaultObserver;
pub use flat_arena::FlatArena;
pub use physics::{Body, ContactEvent, HitTarget, PhysicsWorld, RayHit};
pub use types::{
    EntityId, EntityKind, HazardKind, HitTag, Pose, Team, WallId, angle_between,
    direction_from_yaw, wrap_degrees,
};
