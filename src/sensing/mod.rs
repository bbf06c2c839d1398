mod encoder;
pub mod lidar;
pub mod visibility;

pub use encoder::{
    AGENT_SLOT_FEATURES, Observation, RAY_FEATURES, SELF_FEATURES, SensorEncoder,
    WALL_SLOT_FEATURES,
};
pub use lidar::RayReading;
