pub mod abilities;
pub mod config;
pub mod control;
pub mod episode;
pub mod infra;
pub mod scenario;
pub mod sensing;
pub mod sim;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ArenaConfig;
pub use infra::{EntityId, FlatArena, PhysicsWorld};
pub use sim::{Simulation, TickReport};
