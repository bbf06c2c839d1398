//! Arena tunables with environment overrides

use std::env;
use std::str::FromStr;

use crate::episode::RecordFormat;

/// Hit points and hazard timing
#[derive(Debug, Clone)]
pub struct HealthConfig {
    /// Maximum (and respawn) health
    pub max_health: f32,
    /// Damage per lava tick while standing in lava
    pub lava_damage: f32,
    /// Seconds between lava ticks
    pub lava_interval_secs: f32,
    /// Damage per burn tick after leaving lava
    pub burn_damage: f32,
    /// Seconds between burn ticks
    pub burn_interval_secs: f32,
    /// How long the burn lasts after leaving lava
    pub burn_duration_secs: f32,
    /// Post-respawn window during which the void cannot kill
    pub void_grace_secs: f32,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            lava_damage: 8.0,
            lava_interval_secs: 1.0,
            burn_damage: 3.0,
            burn_interval_secs: 1.0,
            burn_duration_secs: 5.0,
            void_grace_secs: 0.2,
        }
    }
}

/// Aggro accounting
#[derive(Debug, Clone)]
pub struct ThreatConfig {
    /// Baseline ability value used for heal and boost threat
    pub baseline: f32,
    /// Heal threat = baseline * this
    pub heal_multiplier: f32,
    /// Threat boost = baseline * this
    pub boost_multiplier: f32,
    /// Threat value that maps to 1.0 in observations
    pub normalizer: f32,
    /// Linear decay of every score over time
    pub decay_enabled: bool,
    /// Threat lost per second when decay is enabled
    pub decay_rate: f32,
}

impl Default for ThreatConfig {
    fn default() -> Self {
        Self {
            baseline: 5.0,
            heal_multiplier: 3.0,
            boost_multiplier: 5.0,
            normalizer: 100.0,
            decay_enabled: false,
            decay_rate: 0.5,
        }
    }
}

/// Per-role combat values and ability timings
#[derive(Debug, Clone)]
pub struct RoleConfig {
    pub tank_damage: f32,
    pub healer_damage: f32,
    pub ranged_damage: f32,
    pub melee_damage: f32,
    /// Fraction of incoming damage a Tank ignores
    pub tank_damage_reduction: f32,
    /// Attack range multiplier for RangedDPS
    pub ranged_range_multiplier: f32,
    /// Attack range before role multipliers
    pub base_attack_range: f32,
    pub attack_cooldown_secs: f32,
    pub heal_amount: f32,
    pub heal_range: f32,
    /// Full opening angle of the forward heal cone
    pub heal_cone_degrees: f32,
    pub heal_cooldown_secs: f32,
    pub threat_boost_cooldown_secs: f32,
    pub boss_damage: f32,
    pub boss_attack_cooldown_secs: f32,
    /// Distance in front of the boss a carried wall is held at
    pub wall_carry_offset: f32,
}

impl Default for RoleConfig {
    fn default() -> Self {
        Self {
            tank_damage: 2.0,
            healer_damage: 2.0,
            ranged_damage: 5.0,
            melee_damage: 10.0,
            tank_damage_reduction: 0.4,
            ranged_range_multiplier: 3.0,
            base_attack_range: 2.0,
            attack_cooldown_secs: 1.0,
            heal_amount: 10.0,
            heal_range: 5.0,
            heal_cone_degrees: 30.0,
            heal_cooldown_secs: 3.0,
            threat_boost_cooldown_secs: 5.0,
            boss_damage: 100.0,
            boss_attack_cooldown_secs: 1.0,
            wall_carry_offset: 1.7,
        }
    }
}

/// Observation layout and normalisation
#[derive(Debug, Clone)]
pub struct SensorConfig {
    /// Number of radial rays
    pub ray_count: usize,
    /// Cutoff of every ray except ray 0
    pub ray_range: f32,
    /// Full opening angle of the vision cone
    pub vision_cone_degrees: f32,
    pub max_agent_slots: usize,
    pub max_wall_slots: usize,
    /// World distance that maps to 1.0 for absolute positions
    pub position_scale: f32,
    /// World distance that maps to 1.0 for relative positions
    pub distance_scale: f32,
    /// Wall extent that maps to 1.0
    pub size_scale: f32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            ray_count: 30,
            ray_range: 10.0,
            vision_cone_degrees: 90.0,
            max_agent_slots: 4,
            max_wall_slots: 3,
            position_scale: 10.0,
            distance_scale: 20.0,
            size_scale: 5.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MovementConfig {
    /// Units per second at full forward/back intent
    pub move_speed: f32,
    /// Degrees per second at full rotation intent
    pub turn_rate_degrees: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            turn_rate_degrees: 180.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EpisodeConfig {
    /// Episodes end in a timeout after this many seconds
    pub max_episode_secs: f32,
    /// Delay between a terminal condition and the next episode
    pub restart_delay_secs: f32,
    /// Reward for every member of the winning side
    pub win_reward: f32,
    /// Reward for every member of the losing side
    pub loss_reward: f32,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            max_episode_secs: 300.0,
            restart_delay_secs: 0.1,
            win_reward: 1.0,
            loss_reward: -1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Record live episodes at all
    pub enabled: bool,
    /// Encoding of persisted records
    pub format: RecordFormat,
    /// Keep only every n-th episode
    pub save_every: u32,
    /// Also record actions fed in by a replay
    pub record_replays: bool,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            format: RecordFormat::Json,
            save_every: 1,
            record_replays: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArenaConfig {
    /// Fixed simulation ticks per second
    pub tick_rate: u32,
    pub health: HealthConfig,
    pub threat: ThreatConfig,
    pub roles: RoleConfig,
    pub sensor: SensorConfig,
    pub movement: MovementConfig,
    pub episode: EpisodeConfig,
    pub recorder: RecorderConfig,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            tick_rate: 50,
            health: HealthConfig::default(),
            threat: ThreatConfig::default(),
            roles: RoleConfig::default(),
            sensor: SensorConfig::default(),
            movement: MovementConfig::default(),
            episode: EpisodeConfig::default(),
            recorder: RecorderConfig::default(),
        }
    }
}

fn get_env_var<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|val| val.parse::<T>().ok())
}

impl ArenaConfig {
    /// Defaults overlaid with `ARENA_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(rate) = get_env_var::<u32>("ARENA_TICK_RATE").filter(|r| *r > 0) {
            config.tick_rate = rate;
        }
        if let Some(secs) = get_env_var("ARENA_MAX_EPISODE_SECS") {
            config.episode.max_episode_secs = secs;
        }
        if let Some(secs) = get_env_var("ARENA_RESTART_DELAY_SECS") {
            config.episode.restart_delay_secs = secs;
        }
        if let Some(enabled) = get_env_var("ARENA_THREAT_DECAY") {
            config.threat.decay_enabled = enabled;
        }
        if let Some(format) = get_env_var("ARENA_RECORD_FORMAT") {
            config.recorder.format = format;
        }
        if let Some(every) = get_env_var::<u32>("ARENA_SAVE_EVERY").filter(|n| *n > 0) {
            config.recorder.save_every = every;
        }

        config
    }

    /// Length of one fixed step in seconds.
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_rate as f32
    }

    /// Whole number of ticks covering `secs`, at least one.
    pub fn ticks(&self, secs: f32) -> u64 {
        ((secs * self.tick_rate as f32).round() as u64).max(1)
    }
}
