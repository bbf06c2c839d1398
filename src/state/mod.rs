mod arena;
mod cooldown;
mod entity;
mod health;
mod role;
mod threat;
mod wall;

pub use arena::{Arena, SimClock};
pub use cooldown::{AbilityTimers, Cooldown};
pub use entity::Entity;
pub use health::{DamageOutcome, HealthModel, HealthTiming};
pub use role::{BOSS_CLASS_CODE, Role, RoleLatch};
pub use threat::ThreatLedger;
pub use wall::Wall;
