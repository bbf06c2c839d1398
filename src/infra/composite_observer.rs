use crate::abilities::ArenaEvent;
use crate::control::DecodeError;
use crate::episode::EpisodeOutcome;
use crate::infra::{ArenaObserver, EntityId};

pub struct CompositeObserver {
    observers: Vec<Box<dyn ArenaObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Box<dyn ArenaObserver>>) -> Self {
        Self { observers }
    }

    pub fn push(&mut self, observer: Box<dyn ArenaObserver>) {
        self.observers.push(observer);
    }
}

impl ArenaObserver for CompositeObserver {
    fn on_episode_start(&mut self, episode: u32, tick: u64) {
        for observer in &mut self.observers {
            observer.on_episode_start(episode, tick);
        }
    }

    fn on_episode_end(&mut self, outcome: &EpisodeOutcome) {
        for observer in &mut self.observers {
            observer.on_episode_end(outcome);
        }
    }

    fn on_event(&mut self, event: &ArenaEvent) {
        for observer in &mut self.observers {
            observer.on_event(event);
        }
    }

    fn on_decode_error(&mut self, agent: &EntityId, error: &DecodeError) {
        for observer in &mut self.observers {
            observer.on_decode_error(agent, error);
        }
    }

    fn on_replay_finished(&mut self, episode: u32) {
        for observer in &mut self.observers {
            observer.on_replay_finished(episode);
        }
    }
}
