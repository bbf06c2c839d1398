//! Hit points, hazard status and death/respawn for one combatant.
//!
//! All timers count fixed simulation ticks, so hazard and burn damage land on
//! exact tick boundaries regardless of float accumulation.

use crate::config::ArenaConfig;

/// Hazard timing converted from seconds into ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthTiming {
    pub max_health: f32,
    pub lava_damage: f32,
    pub lava_interval: u64,
    pub burn_damage: f32,
    pub burn_interval: u64,
    pub burn_duration: u64,
    pub void_grace: u64,
    /// Grace for the lava-exit burn. One tick longer than the void grace so an
    /// exit edge produced by the step that follows a respawn teleport is still
    /// covered.
    pub lava_grace: u64,
}

impl HealthTiming {
    pub fn from_config(config: &ArenaConfig) -> Self {
        let health = &config.health;
        let void_grace = config.ticks(health.void_grace_secs);
        Self {
            max_health: health.max_health,
            lava_damage: health.lava_damage,
            lava_interval: config.ticks(health.lava_interval_secs),
            burn_damage: health.burn_damage,
            burn_interval: config.ticks(health.burn_interval_secs),
            burn_duration: config.ticks(health.burn_duration_secs),
            void_grace,
            lava_grace: void_grace + 1,
        }
    }
}

impl Default for HealthTiming {
    fn default() -> Self {
        Self::from_config(&ArenaConfig::default())
    }
}

/// Result of a single damage application.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DamageOutcome {
    /// Health actually removed after reduction and clamping
    pub applied: f32,
    /// True only for the hit that brought health to zero
    pub killed: bool,
}

#[derive(Debug, Clone)]
pub struct HealthModel {
    timing: HealthTiming,
    current: f32,
    dead: bool,
    despawned: bool,
    in_hazard: bool,
    burning: bool,
    burn_remaining: u64,
    hazard_timer: u64,
    burn_timer: u64,
    void_grace_until: u64,
    lava_grace_until: u64,
}

impl HealthModel {
    pub fn new(timing: HealthTiming) -> Self {
        Self {
            timing,
            current: timing.max_health,
            dead: false,
            despawned: false,
            in_hazard: false,
            burning: false,
            burn_remaining: 0,
            hazard_timer: 0,
            burn_timer: 0,
            void_grace_until: 0,
            lava_grace_until: 0,
        }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.timing.max_health
    }

    pub fn fraction(&self) -> f32 {
        if self.timing.max_health > 0.0 {
            self.current / self.timing.max_health
        } else {
            0.0
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn is_despawned(&self) -> bool {
        self.despawned
    }

    pub fn in_hazard(&self) -> bool {
        self.in_hazard
    }

    pub fn is_burning(&self) -> bool {
        self.burning
    }

    /// Ticks of burn left.
    pub fn burn_remaining(&self) -> u64 {
        self.burn_remaining
    }

    pub fn void_grace_active(&self, now: u64) -> bool {
        now < self.void_grace_until
    }

    pub fn lava_grace_active(&self, now: u64) -> bool {
        now < self.lava_grace_until
    }

    /// Subtract `amount * (1 - reduction)`, clamped at zero.
    pub fn take_damage(&mut self, amount: f32, reduction: f32) -> DamageOutcome {
        if self.dead || amount <= 0.0 {
            return DamageOutcome::default();
        }
        let scaled = amount * (1.0 - reduction.clamp(0.0, 1.0));
        let applied = scaled.min(self.current);
        self.current = (self.current - scaled).max(0.0);

        let killed = self.current <= 0.0;
        if killed {
            self.die();
        }
        DamageOutcome { applied, killed }
    }

    /// Add health up to the maximum; returns the amount restored.
    pub fn heal(&mut self, amount: f32) -> f32 {
        if self.dead || amount <= 0.0 {
            return 0.0;
        }
        let before = self.current;
        self.current = (self.current + amount).min(self.timing.max_health);
        self.current - before
    }

    /// Instantly lethal, ignoring damage reduction.
    pub fn kill(&mut self) -> DamageOutcome {
        if self.dead {
            return DamageOutcome::default();
        }
        let applied = self.current;
        self.current = 0.0;
        self.die();
        DamageOutcome {
            applied,
            killed: true,
        }
    }

    fn die(&mut self) {
        self.dead = true;
        self.in_hazard = false;
        self.burning = false;
        self.burn_remaining = 0;
        self.despawn();
    }

    pub fn despawn(&mut self) {
        self.despawned = true;
    }

    /// Edge-triggered hazard status. Leaving starts a burn unless the
    /// post-respawn grace is active; entering cancels any burn.
    pub fn set_in_hazard(&mut self, in_hazard: bool, now: u64) {
        if self.dead || in_hazard == self.in_hazard {
            return;
        }
        self.in_hazard = in_hazard;
        self.hazard_timer = 0;

        if in_hazard {
            self.burning = false;
            self.burn_remaining = 0;
            self.burn_timer = 0;
        } else if !self.lava_grace_active(now) {
            self.burning = true;
            self.burn_remaining = self.timing.burn_duration;
            self.burn_timer = 0;
        }
    }

    /// Void contact: lethal unless the post-respawn grace is active.
    pub fn enter_void(&mut self, now: u64) -> DamageOutcome {
        if self.void_grace_active(now) {
            tracing::debug!("void contact ignored during respawn grace");
            return DamageOutcome::default();
        }
        self.kill()
    }

    /// Advance hazard and burn timers by one tick.
    pub fn tick(&mut self, reduction: f32) -> DamageOutcome {
        if self.dead {
            return DamageOutcome::default();
        }

        if self.in_hazard {
            self.hazard_timer += 1;
            if self.hazard_timer >= self.timing.lava_interval {
                self.hazard_timer = 0;
                return self.take_damage(self.timing.lava_damage, reduction);
            }
        } else if self.burning {
            self.burn_remaining = self.burn_remaining.saturating_sub(1);
            self.burn_timer += 1;
            let mut outcome = DamageOutcome::default();
            if self.burn_timer >= self.timing.burn_interval {
                self.burn_timer = 0;
                outcome = self.take_damage(self.timing.burn_damage, reduction);
            }
            if self.burn_remaining == 0 {
                self.burning = false;
                self.burn_timer = 0;
            }
            return outcome;
        }

        DamageOutcome::default()
    }

    /// Restore full health and clear every status. Safe to repeat.
    pub fn respawn(&mut self) {
        self.current = self.timing.max_health;
        self.dead = false;
        self.despawned = false;
        self.in_hazard = false;
        self.burning = false;
        self.burn_remaining = 0;
        self.hazard_timer = 0;
        self.burn_timer = 0;
    }

    /// Open the post-respawn grace windows starting at tick `now`.
    pub fn start_grace(&mut self, now: u64) {
        self.void_grace_until = now + self.timing.void_grace;
        self.lava_grace_until = now + self.timing.lava_grace;
    }
}

impl Default for HealthModel {
    fn default() -> Self {
        Self::new(HealthTiming::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing() -> HealthTiming {
        HealthTiming::default()
    }

    #[test]
    fn test_timing_from_defaults() {
        let t = timing();
        assert_eq!(t.lava_interval, 50);
        assert_eq!(t.burn_duration, 250);
        assert_eq!(t.void_grace, 10);
        assert_eq!(t.lava_grace, 11);
    }

    #[test]
    fn test_damage_clamps_and_kills_once() {
        let mut health = HealthModel::default();
        let outcome = health.take_damage(30.0, 0.0);
        assert_eq!(outcome.applied, 30.0);
        assert!(!outcome.killed);
        assert_eq!(health.current(), 70.0);

        let outcome = health.take_damage(500.0, 0.0);
        assert!(outcome.killed);
        assert_eq!(outcome.applied, 70.0);
        assert_eq!(health.current(), 0.0);
        assert!(health.is_dead());
        assert!(health.is_despawned());

        let again = health.take_damage(10.0, 0.0);
        assert!(!again.killed);
        assert_eq!(again.applied, 0.0);
    }

    #[test]
    fn test_tank_reduction() {
        let mut health = HealthModel::default();
        health.take_damage(10.0, 0.4);
        assert!((health.current() - 94.0).abs() < 1e-5);
    }

    #[test]
    fn test_heal_clamps_to_max() {
        let mut health = HealthModel::default();
        health.take_damage(5.0, 0.0);
        assert_eq!(health.heal(10.0), 5.0);
        assert_eq!(health.current(), 100.0);
    }

    #[test]
    fn test_heal_ignored_when_dead() {
        let mut health = HealthModel::default();
        health.kill();
        assert_eq!(health.heal(50.0), 0.0);
        assert_eq!(health.current(), 0.0);
    }

    #[test]
    fn test_lava_ticks_at_interval() {
        let mut health = HealthModel::default();
        health.set_in_hazard(true, 0);
        for _ in 0..49 {
            health.tick(0.0);
        }
        assert_eq!(health.current(), 100.0);
        health.tick(0.0);
        assert_eq!(health.current(), 92.0);
        for _ in 0..50 {
            health.tick(0.0);
        }
        assert_eq!(health.current(), 84.0);
    }

    #[test]
    fn test_leaving_lava_burns_for_duration() {
        let mut health = HealthModel::default();
        health.set_in_hazard(true, 0);
        health.set_in_hazard(false, 100);
        assert!(health.is_burning());
        assert_eq!(health.burn_remaining(), 250);

        let mut burning_ticks = 0;
        while health.is_burning() {
            health.tick(0.0);
            burning_ticks += 1;
        }
        assert_eq!(burning_ticks, 250);
        assert!((health.current() - 85.0).abs() < 1e-5);
    }

    #[test]
    fn test_entering_lava_cancels_burn() {
        let mut health = HealthModel::default();
        health.set_in_hazard(true, 0);
        health.set_in_hazard(false, 100);
        health.set_in_hazard(true, 101);
        assert!(!health.is_burning());
        assert!(health.in_hazard());
    }

    #[test]
    fn test_edge_triggered_repeats_ignored() {
        let mut health = HealthModel::default();
        health.set_in_hazard(false, 100);
        assert!(!health.is_burning());
    }

    #[test]
    fn test_grace_suppresses_burn_and_void() {
        let mut health = HealthModel::default();
        health.start_grace(100);
        health.set_in_hazard(true, 100);
        health.set_in_hazard(false, 110);
        assert!(!health.is_burning());

        let outcome = health.enter_void(109);
        assert!(!outcome.killed);
        assert!(health.is_alive());

        let outcome = health.enter_void(110);
        assert!(outcome.killed);
        assert!(health.is_dead());
    }

    #[test]
    fn test_respawn_is_idempotent() {
        let mut health = HealthModel::default();
        health.set_in_hazard(true, 0);
        health.kill();
        health.respawn();
        health.respawn();
        assert!(health.is_alive());
        assert!(!health.is_despawned());
        assert!(!health.in_hazard());
        assert_eq!(health.current(), 100.0);
    }
}
