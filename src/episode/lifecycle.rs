//! Episode state machine: reset, termination checks, rewards and restart.

use std::collections::HashMap;

use crate::infra::{Body, EntityId, PhysicsWorld, Pose};
use crate::state::Arena;

use super::record::WinCondition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodePhase {
    /// No episode has been started yet
    Idle,
    Active,
    /// Ended; the next episode starts at `restart_at`
    Terminating { restart_at: u64 },
}

/// Result of one finished episode.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeOutcome {
    pub episode: u32,
    pub win: WinCondition,
    /// Simulated seconds from start to termination
    pub duration: f32,
    pub rewards: Vec<(EntityId, f32)>,
}

impl EpisodeOutcome {
    pub fn reward(&self, id: &EntityId) -> f32 {
        self.rewards
            .iter()
            .find(|(agent, _)| agent == id)
            .map_or(0.0, |(_, reward)| *reward)
    }
}

pub struct EpisodeController {
    phase: EpisodePhase,
    episode: u32,
    start_tick: u64,
    win: WinCondition,
    spawns: HashMap<EntityId, Pose>,
    last_outcome: Option<EpisodeOutcome>,
}

impl EpisodeController {
    pub fn new() -> Self {
        Self {
            phase: EpisodePhase::Idle,
            episode: 0,
            start_tick: 0,
            win: WinCondition::None,
            spawns: HashMap::new(),
            last_outcome: None,
        }
    }

    pub fn phase(&self) -> EpisodePhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == EpisodePhase::Active
    }

    /// Number of the running (or last finished) episode, 1-based.
    pub fn episode(&self) -> u32 {
        self.episode
    }

    pub fn win_condition(&self) -> WinCondition {
        self.win
    }

    pub fn start_tick(&self) -> u64 {
        self.start_tick
    }

    pub fn last_outcome(&self) -> Option<&EpisodeOutcome> {
        self.last_outcome.as_ref()
    }

    /// Reward the agent received at the end of the last finished episode.
    pub fn reward(&self, id: &EntityId) -> f32 {
        self.last_outcome.as_ref().map_or(0.0, |o| o.reward(id))
    }

    /// Override spawn poses; entities not listed keep the pose they were
    /// registered with.
    pub fn set_spawn_positions(&mut self, spawns: impl IntoIterator<Item = (EntityId, Pose)>) {
        self.spawns.extend(spawns);
    }

    /// Whether the next tick must begin with [`start_episode`](Self::start_episode).
    pub fn start_due(&self, now_tick: u64) -> bool {
        match self.phase {
            EpisodePhase::Idle => true,
            EpisodePhase::Active => false,
            EpisodePhase::Terminating { restart_at } => now_tick >= restart_at,
        }
    }

    /// Reset every entity, wall and the threat ledger, then go active.
    pub fn start_episode<P: PhysicsWorld>(&mut self, arena: &mut Arena<P>) {
        let now = arena.clock.tick();

        for index in 0..arena.walls.len() {
            let id = arena.walls[index].id;
            arena.release_wall(id);
            let body = Body::Wall(id);
            arena.physics.set_enabled(&body, true);
            arena.physics.set_pose(&body, arena.walls[index].spawn);
        }

        for entity in &mut arena.entities {
            if let Some(spawn) = self.spawns.get(&entity.id) {
                entity.spawn = *spawn;
            }
            entity.reset_for_episode(now);
            let body = Body::Agent(entity.id.clone());
            arena.physics.set_enabled(&body, true);
            arena.physics.set_pose(&body, entity.spawn);
        }

        arena.threat.clear_all();

        self.episode += 1;
        self.start_tick = now;
        self.win = WinCondition::None;
        self.phase = EpisodePhase::Active;
        tracing::info!("episode {} started at tick {}", self.episode, now);
    }

    /// Check the terminal conditions in priority order. Returns the outcome
    /// the one time an episode ends.
    pub fn evaluate<P: PhysicsWorld>(&mut self, arena: &Arena<P>) -> Option<EpisodeOutcome> {
        if !self.is_active() {
            return None;
        }

        let now = arena.clock.tick();
        let elapsed = arena.clock.secs_between(self.start_tick, now);
        let boss_dead = arena.boss().is_some_and(|b| b.health.is_dead());
        let mut party = arena.party().peekable();
        let party_wiped = party.peek().is_some() && party.all(|p| p.health.is_dead());

        let win = if boss_dead {
            WinCondition::Party
        } else if party_wiped {
            WinCondition::Boss
        } else if elapsed >= arena.config.episode.max_episode_secs {
            WinCondition::Timeout
        } else {
            return None;
        };

        let settings = &arena.config.episode;
        let rewards = arena
            .entities
            .iter()
            .map(|e| {
                let won = match win {
                    WinCondition::Party => Some(!e.is_boss()),
                    WinCondition::Boss => Some(e.is_boss()),
                    _ => None,
                };
                let reward = match won {
                    Some(true) => settings.win_reward,
                    Some(false) => settings.loss_reward,
                    None => 0.0,
                };
                (e.id.clone(), reward)
            })
            .collect();

        let restart_at = now + arena.config.ticks(settings.restart_delay_secs);
        self.win = win;
        self.phase = EpisodePhase::Terminating { restart_at };

        let outcome = EpisodeOutcome {
            episode: self.episode,
            win,
            duration: elapsed,
            rewards,
        };
        tracing::info!(
            "episode {} ended: {} after {:.2}s",
            self.episode,
            win,
            elapsed
        );
        self.last_outcome = Some(outcome.clone());
        Some(outcome)
    }
}

impl Default for EpisodeController {
    fn default() -> Self {
        Self::new()
    }
}
