//! Dense per-frame action log of the running episode.

use crate::config::RecorderConfig;
use crate::control::ActionBranch;
use crate::infra::EntityId;

use super::record::{ActionEntry, AgentRole, EpisodeRecord, WinCondition};

/// Appends every decoded branch value under the current frame number and
/// turns the log into an [`EpisodeRecord`] when the episode ends.
#[derive(Debug)]
pub struct ActionRecorder {
    config: RecorderConfig,
    episode: u32,
    frame: u64,
    actions: Vec<ActionEntry>,
    paused: bool,
    completed: Vec<EpisodeRecord>,
}

impl ActionRecorder {
    pub fn new(config: RecorderConfig) -> Self {
        Self {
            config,
            episode: 0,
            frame: 0,
            actions: Vec::new(),
            paused: false,
            completed: Vec::new(),
        }
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Frame number the next recorded entry will carry.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn episode(&self) -> u32 {
        self.episode
    }

    /// Entries logged so far in the running episode.
    pub fn actions(&self) -> &[ActionEntry] {
        &self.actions
    }

    pub fn is_recording(&self) -> bool {
        self.config.enabled && !self.paused
    }

    /// Suspend logging, e.g. while a replay drives the decoders.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Start a fresh log at frame 0.
    pub fn begin_episode(&mut self, episode: u32) {
        if !self.actions.is_empty() {
            tracing::debug!(
                "discarding {} unfinished entries of episode {}",
                self.actions.len(),
                self.episode
            );
        }
        self.episode = episode;
        self.frame = 0;
        self.actions.clear();
    }

    pub fn record(&mut self, agent_id: &EntityId, branch: ActionBranch, value: i32) {
        if !self.is_recording() {
            return;
        }
        self.actions.push(ActionEntry {
            frame: self.frame,
            agent_id: agent_id.clone(),
            branch,
            value,
        });
    }

    pub fn advance_frame(&mut self) {
        self.frame += 1;
    }

    /// Close the running log. Every `save_every`-th episode is queued for
    /// persistence; the returned record is the one that was queued, if any.
    pub fn end_episode(
        &mut self,
        win_condition: WinCondition,
        duration: f32,
        agents: Vec<AgentRole>,
    ) -> Option<EpisodeRecord> {
        let actions = std::mem::take(&mut self.actions);
        let every = self.config.save_every.max(1);
        if !self.is_recording() || self.episode % every != 0 {
            return None;
        }

        tracing::debug!(
            "episode {} logged {} entries over {} frames",
            self.episode,
            actions.len(),
            self.frame
        );
        let record = EpisodeRecord {
            episode: self.episode,
            win_condition,
            duration,
            agents,
            actions,
        };
        self.completed.push(record.clone());
        Some(record)
    }

    /// Drain the records waiting to be written.
    pub fn take_completed(&mut self) -> Vec<EpisodeRecord> {
        std::mem::take(&mut self.completed)
    }
}
