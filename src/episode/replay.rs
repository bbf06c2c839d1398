//! Deterministic playback of a recorded episode.
//!
//! The player only decides which recorded frame is due on each tick; the
//! simulation feeds that frame's entries into the decoders in place of a
//! live policy.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::infra::{EntityId, PhysicsWorld};
use crate::state::Arena;

use super::record::{ActionEntry, EpisodeRecord, ReplayError};

/// Rational playback multiplier, `num / den`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackSpeed {
    num: u32,
    den: u32,
}

impl PlaybackSpeed {
    pub const NORMAL: PlaybackSpeed = PlaybackSpeed { num: 1, den: 1 };

    pub fn new(num: u32, den: u32) -> Option<Self> {
        (num > 0 && den > 0).then_some(Self { num, den })
    }

    pub fn as_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }

    pub fn is_fast(self) -> bool {
        self.num > self.den
    }

    pub fn is_slow(self) -> bool {
        self.num < self.den
    }

    /// Whole frames skipped per tick when fast-forwarding.
    fn frames_per_tick(self) -> u64 {
        (self.num / self.den).max(1) as u64
    }
}

impl Default for PlaybackSpeed {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl fmt::Display for PlaybackSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}x", self.num)
        } else {
            write!(f, "{}/{}x", self.num, self.den)
        }
    }
}

impl FromStr for PlaybackSpeed {
    type Err = ReplayError;

    /// Accepts `"n"` or `"n/d"` with positive integers.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ReplayError::InvalidSpeed(s.to_string());
        let (num, den) = match s.trim().split_once('/') {
            Some((n, d)) => (
                n.trim().parse().map_err(|_| invalid())?,
                d.trim().parse().map_err(|_| invalid())?,
            ),
            None => (s.trim().parse().map_err(|_| invalid())?, 1),
        };
        Self::new(num, den).ok_or_else(invalid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayState {
    Stopped,
    Playing,
    Paused,
    Finished,
}

pub struct ReplayPlayer {
    record: EpisodeRecord,
    frames: BTreeMap<u64, Vec<ActionEntry>>,
    max_frame: u64,
    cursor: u64,
    last_executed: Option<u64>,
    speed: PlaybackSpeed,
    state: ReplayState,
    pending_step: bool,
    /// Real seconds banked towards the next frame in slow motion
    banked: f64,
    frame_dt: f64,
    bindings: HashMap<EntityId, usize>,
}

impl ReplayPlayer {
    pub fn new(record: EpisodeRecord) -> Self {
        let mut frames: BTreeMap<u64, Vec<ActionEntry>> = BTreeMap::new();
        for entry in &record.actions {
            frames.entry(entry.frame).or_default().push(entry.clone());
        }
        let max_frame = frames.keys().next_back().copied().unwrap_or(0);

        Self {
            record,
            frames,
            max_frame,
            cursor: 0,
            last_executed: None,
            speed: PlaybackSpeed::NORMAL,
            state: ReplayState::Stopped,
            pending_step: false,
            banked: 0.0,
            frame_dt: 0.02,
            bindings: HashMap::new(),
        }
    }

    /// Load a `.json` or `.bin` record.
    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let record = EpisodeRecord::load(path)?;
        tracing::info!(
            "loaded episode {} ({} actions, {} frames) from {}",
            record.episode,
            record.actions.len(),
            record.actions.iter().map(|a| a.frame).max().map_or(0, |f| f + 1),
            path.display()
        );
        Ok(Self::new(record))
    }

    pub fn record(&self) -> &EpisodeRecord {
        &self.record
    }

    pub fn state(&self) -> ReplayState {
        self.state
    }

    pub fn speed(&self) -> PlaybackSpeed {
        self.speed
    }

    pub fn set_speed(&mut self, speed: PlaybackSpeed) {
        self.speed = speed;
        self.banked = 0.0;
    }

    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn max_frame(&self) -> u64 {
        self.max_frame
    }

    /// Map every agent id in the log to a live entity by exact name.
    pub fn bind<P: PhysicsWorld>(&mut self, arena: &Arena<P>) {
        self.bindings.clear();
        let mut unknown: Vec<&EntityId> = Vec::new();
        for entry in &self.record.actions {
            if self.bindings.contains_key(&entry.agent_id) || unknown.contains(&&entry.agent_id) {
                continue;
            }
            match arena.index_of(&entry.agent_id) {
                Some(index) => {
                    self.bindings.insert(entry.agent_id.clone(), index);
                }
                None => unknown.push(&entry.agent_id),
            }
        }
        for id in unknown {
            tracing::warn!("replay agent '{}' has no live entity, skipping its actions", id);
        }
    }

    pub fn bound_index(&self, id: &EntityId) -> Option<usize> {
        self.bindings.get(id).copied()
    }

    /// Rewind to frame 0 and start playing. `frame_dt` is the simulated
    /// duration of one frame.
    pub fn start(&mut self, frame_dt: f32) {
        self.cursor = 0;
        self.last_executed = None;
        self.pending_step = false;
        self.banked = 0.0;
        self.frame_dt = frame_dt as f64;
        self.state = ReplayState::Playing;
    }

    pub fn pause(&mut self) {
        if self.state == ReplayState::Playing {
            self.state = ReplayState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == ReplayState::Paused {
            self.state = ReplayState::Playing;
        }
    }

    pub fn stop(&mut self) {
        self.state = ReplayState::Stopped;
        self.pending_step = false;
    }

    /// While paused, let exactly one frame through on the next tick.
    pub fn step_frame(&mut self) {
        if self.state == ReplayState::Paused && self.cursor <= self.max_frame {
            self.pending_step = true;
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state == ReplayState::Playing
    }

    pub fn is_paused(&self) -> bool {
        self.state == ReplayState::Paused
    }

    /// Paused with a single-frame step queued.
    pub fn step_pending(&self) -> bool {
        self.pending_step
    }

    pub fn is_finished(&self) -> bool {
        self.state == ReplayState::Finished
    }

    /// Fraction of the log played so far.
    pub fn progress(&self) -> f32 {
        if self.max_frame == 0 {
            return if self.cursor > 0 { 1.0 } else { 0.0 };
        }
        (self.cursor as f32 / self.max_frame as f32).min(1.0)
    }

    /// Entries recorded for `frame`, in recording order.
    pub fn entries(&self, frame: u64) -> &[ActionEntry] {
        self.frames.get(&frame).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Decide which recorded frame, if any, is applied on this tick and move
    /// the cursor according to the playback speed. `real_dt` is the wall-clock
    /// time since the previous call; only slow motion consumes it.
    pub fn next_frame(&mut self, real_dt: f32) -> Option<u64> {
        match self.state {
            ReplayState::Paused if self.pending_step => {
                self.pending_step = false;
                let frame = self.cursor;
                self.last_executed = Some(frame);
                self.cursor += 1;
                self.finish_if_done();
                Some(frame)
            }
            ReplayState::Playing => {
                let due = (self.last_executed != Some(self.cursor)
                    && self.cursor <= self.max_frame)
                    .then_some(self.cursor);
                if let Some(frame) = due {
                    self.last_executed = Some(frame);
                }

                if self.speed.is_fast() {
                    self.cursor += self.speed.frames_per_tick();
                } else if self.speed.is_slow() {
                    self.banked += real_dt as f64;
                    let interval = self.frame_dt / self.speed.as_f64();
                    if self.banked + 1e-9 >= interval {
                        self.banked -= interval;
                        self.cursor += 1;
                    }
                } else {
                    self.cursor += 1;
                }

                self.finish_if_done();
                due
            }
            _ => None,
        }
    }

    fn finish_if_done(&mut self) {
        if self.cursor > self.max_frame {
            self.state = ReplayState::Finished;
            tracing::info!(
                "replay of episode {} completed at frame {}",
                self.record.episode,
                self.max_frame
            );
        }
    }
}
