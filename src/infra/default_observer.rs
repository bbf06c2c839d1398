use tracing::{debug, info, warn};

use crate::abilities::ArenaEvent;
use crate::control::DecodeError;
use crate::episode::{EpisodeOutcome, WinCondition};
use crate::infra::{ArenaObserver, EntityId};

/// Logs lifecycle and combat events.
pub struct DefaultObserver;

impl ArenaObserver for DefaultObserver {
    fn on_episode_start(&mut self, episode: u32, tick: u64) {
        debug!("Episode {} started (tick {})", episode, tick);
    }

    fn on_episode_end(&mut self, outcome: &EpisodeOutcome) {
        let winner = match outcome.win {
            WinCondition::Party => "party wins",
            WinCondition::Boss => "boss wins",
            WinCondition::Timeout => "timeout",
            WinCondition::None => "no result",
        };
        info!(
            "Episode {} finished: {} after {:.1}s",
            outcome.episode, winner, outcome.duration
        );
        for (agent, reward) in &outcome.rewards {
            debug!("- {}: reward {:+.1}", agent, reward);
        }
    }

    fn on_event(&mut self, event: &ArenaEvent) {
        match event {
            ArenaEvent::Attacked {
                attacker,
                target,
                damage,
            } => debug!("{} hit {} for {:.1}", attacker, target, damage),
            ArenaEvent::Healed {
                healer,
                target,
                amount,
            } => debug!("{} healed {} for {:.1}", healer, target, amount),
            ArenaEvent::ThreatBoosted { agent, amount } => {
                debug!("{} boosted threat by {:.1}", agent, amount)
            }
            ArenaEvent::RoleSelected { agent, role } => info!("{} chose {}", agent, role.as_str()),
            ArenaEvent::Died { entity } => info!("{} died", entity),
            ArenaEvent::WallPickedUp { agent, wall } => info!("{} picked up {}", agent, wall),
            ArenaEvent::WallPlaced { agent, wall } => info!("{} placed {}", agent, wall),
        }
    }

    fn on_decode_error(&mut self, agent: &EntityId, error: &DecodeError) {
        warn!("Skipping actions of {}: {}", agent, error);
    }

    fn on_replay_finished(&mut self, episode: u32) {
        info!("Replay of episode {} finished", episode);
    }
}
