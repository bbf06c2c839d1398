use crate::abilities::ArenaEvent;
use crate::control::DecodeError;
use crate::episode::EpisodeOutcome;
use crate::infra::EntityId;

/// Trait for observing arena events during a run
pub trait ArenaObserver {
    /// Called after the arena has been reset for a new episode
    fn on_episode_start(&mut self, episode: u32, tick: u64);

    /// Called once when an episode reaches a terminal condition
    fn on_episode_end(&mut self, outcome: &EpisodeOutcome);

    /// Called for every combat, role or wall event
    fn on_event(&mut self, _event: &ArenaEvent) {
        // Default implementation does nothing
    }

    /// Called when an agent's action vector could not be decoded
    fn on_decode_error(&mut self, _agent: &EntityId, _error: &DecodeError) {}

    /// Called when a replay has played its last frame
    fn on_replay_finished(&mut self, _episode: u32) {}
}
