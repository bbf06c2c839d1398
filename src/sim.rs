//! Fixed-order tick loop tying every service of one arena together.
//!
//! Each tick runs: episode start (when due), physics step with hazard
//! bookkeeping, sensing, decoding, ability actuation, lifecycle evaluation and
//! finally the recorder's frame advance. A replay replaces sensing and the
//! live action source with the recorded entries of the due frame.

use crate::abilities::{self, ArenaEvent};
use crate::control::{ActionSource, AgentView, decode_vector};
use crate::episode::{ActionRecorder, AgentRole, EpisodeController, EpisodeOutcome, ReplayPlayer};
use crate::infra::{
    ArenaObserver, Body, ContactEvent, DefaultObserver, EntityId, HazardKind, PhysicsWorld, Pose,
};
use crate::sensing::{Observation, SensorEncoder};
use crate::state::Arena;

/// What happened during one call to [`Simulation::tick`].
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// Recorder frame this tick decoded under
    pub frame: u64,
    /// Episode started at the beginning of this tick
    pub started: Option<u32>,
    pub outcome: Option<EpisodeOutcome>,
    pub events: Vec<ArenaEvent>,
    /// Recorded frame applied by the replay, if any
    pub replay_frame: Option<u64>,
    pub replay_finished: bool,
    /// The world did not advance because the replay is paused
    pub frozen: bool,
}

pub struct Simulation<P: PhysicsWorld> {
    arena: Arena<P>,
    encoder: SensorEncoder,
    controller: EpisodeController,
    recorder: ActionRecorder,
    replay: Option<ReplayPlayer>,
    observer: Box<dyn ArenaObserver>,
    observations: Vec<Option<Observation>>,
}

impl<P: PhysicsWorld> Simulation<P> {
    pub fn new(arena: Arena<P>) -> Self {
        let encoder = SensorEncoder::new(arena.config.sensor.clone());
        let recorder = ActionRecorder::new(arena.config.recorder.clone());
        Self {
            arena,
            encoder,
            controller: EpisodeController::new(),
            recorder,
            replay: None,
            observer: Box::new(DefaultObserver),
            observations: Vec::new(),
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn ArenaObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn arena(&self) -> &Arena<P> {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut Arena<P> {
        &mut self.arena
    }

    pub fn controller(&self) -> &EpisodeController {
        &self.controller
    }

    pub fn recorder(&self) -> &ActionRecorder {
        &self.recorder
    }

    pub fn recorder_mut(&mut self) -> &mut ActionRecorder {
        &mut self.recorder
    }

    pub fn encoder(&self) -> &SensorEncoder {
        &self.encoder
    }

    pub fn replay(&self) -> Option<&ReplayPlayer> {
        self.replay.as_ref()
    }

    pub fn replay_mut(&mut self) -> Option<&mut ReplayPlayer> {
        self.replay.as_mut()
    }

    pub fn is_replaying(&self) -> bool {
        self.replay.is_some()
    }

    /// Last observation encoded for the entity at `index` (live mode only).
    pub fn observation(&self, index: usize) -> Option<&Observation> {
        self.observations.get(index)?.as_ref()
    }

    pub fn set_spawn_positions(&mut self, spawns: impl IntoIterator<Item = (EntityId, Pose)>) {
        self.controller.set_spawn_positions(spawns);
    }

    /// Reset the arena and begin a new episode right away.
    pub fn start_episode(&mut self) -> u32 {
        self.controller.start_episode(&mut self.arena);
        let episode = self.controller.episode();
        self.recorder.begin_episode(episode);
        self.observations.clear();
        self.observer.on_episode_start(episode, self.arena.clock.tick());
        episode
    }

    /// Reset the arena and hand decoding over to `player`.
    pub fn start_replay(&mut self, mut player: ReplayPlayer) {
        let record_replays = self.recorder.config().record_replays;
        self.recorder.set_paused(!record_replays);
        self.start_episode();
        player.bind(&self.arena);
        player.start(self.arena.clock.dt());
        tracing::info!(
            "replaying episode {} at {}",
            player.record().episode,
            player.speed()
        );
        self.replay = Some(player);
    }

    /// Leave replay mode; entities keep whatever intents they last received.
    pub fn stop_replay(&mut self) -> Option<ReplayPlayer> {
        let mut player = self.replay.take()?;
        player.stop();
        self.recorder.set_paused(false);
        Some(player)
    }

    /// Run one fixed simulation step, taking one step of simulated time as the
    /// real time elapsed since the previous tick.
    pub fn tick(&mut self, source: &mut dyn ActionSource) -> TickReport {
        let dt = self.arena.clock.dt();
        self.tick_with_real_dt(source, dt)
    }

    /// Run one fixed simulation step. `real_dt` is the wall-clock time since the
    /// previous tick; slow-motion replay only advances on accumulated real time.
    pub fn tick_with_real_dt(&mut self, source: &mut dyn ActionSource, real_dt: f32) -> TickReport {
        let mut report = TickReport {
            frame: self.recorder.frame(),
            ..TickReport::default()
        };

        if let Some(player) = &self.replay
            && player.is_paused()
            && !player.step_pending()
        {
            report.frozen = true;
            return report;
        }

        if self.replay.is_none() && self.controller.start_due(self.arena.clock.tick()) {
            report.started = Some(self.start_episode());
            report.frame = self.recorder.frame();
        }

        if !self.controller.is_active() {
            self.arena.clock.advance();
            self.recorder.advance_frame();
            return report;
        }

        let mut events = Vec::new();
        self.step_world(&mut events);

        if self.replay.is_some() {
            report.replay_frame = self.decode_replay(real_dt);
        } else {
            self.sense();
            self.decode_live(source, report.frame);
        }

        self.actuate(&mut events);

        if let Some(outcome) = self.controller.evaluate(&self.arena) {
            let roles = self
                .arena
                .entities
                .iter()
                .map(|e| AgentRole {
                    agent_id: e.id.clone(),
                    role: e.role_name().to_string(),
                })
                .collect();
            self.recorder.end_episode(outcome.win, outcome.duration, roles);
            self.observer.on_episode_end(&outcome);
            report.outcome = Some(outcome);
        }

        self.recorder.advance_frame();

        if self.replay.as_ref().is_some_and(ReplayPlayer::is_finished) {
            if let Some(player) = self.stop_replay() {
                self.observer.on_replay_finished(player.record().episode);
            }
            report.replay_finished = true;
        }

        for event in &events {
            self.observer.on_event(event);
        }
        report.events = events;
        report
    }

    /// Apply motion intents, move carried walls, step physics and run the
    /// health model for the new tick.
    fn step_world(&mut self, events: &mut Vec<ArenaEvent>) {
        let dt = self.arena.clock.dt();
        let movement = self.arena.config.movement.clone();

        let mut previous = Vec::with_capacity(self.arena.entities.len());
        for index in 0..self.arena.entities.len() {
            let pose = self.arena.pose_of(index);
            previous.push(pose.map(|p| p.position));
            let entity = &self.arena.entities[index];
            let (Some(pose), false) = (pose, entity.health.is_dead()) else {
                continue;
            };
            let body = Body::Agent(entity.id.clone());
            let (turn, advance) = (entity.intents.rotation, entity.intents.movement);

            if turn != 0.0 {
                let yaw = pose.yaw + turn * movement.turn_rate_degrees * dt;
                self.arena
                    .physics
                    .set_pose(&body, Pose::new(pose.position.x, pose.position.y, yaw));
            }
            if advance != 0.0 {
                let forward = self
                    .arena
                    .physics
                    .pose(&body)
                    .map_or(pose.forward(), |p| p.forward());
                self.arena
                    .physics
                    .move_body(&body, forward * advance * movement.move_speed * dt);
            }
        }

        abilities::carry_walls(&mut self.arena, dt);
        let contacts = self.arena.physics.step(dt);
        self.arena.clock.advance();
        let now = self.arena.clock.tick();

        for index in 0..self.arena.entities.len() {
            let reduction = self.arena.entities[index].damage_reduction(&self.arena.config.roles);
            if self.arena.entities[index].health.tick(reduction).killed {
                handle_hazard_death(&mut self.arena, index, events);
            }
        }

        for contact in contacts {
            let (ContactEvent::Entered { entity, hazard } | ContactEvent::Exited { entity, hazard }) =
                &contact;
            let Some(index) = self.arena.index_of(entity) else {
                continue;
            };
            let health = &mut self.arena.entities[index].health;
            let killed = match (&contact, hazard) {
                (ContactEvent::Entered { .. }, HazardKind::Lava) => {
                    health.set_in_hazard(true, now);
                    false
                }
                (ContactEvent::Exited { .. }, HazardKind::Lava) => {
                    health.set_in_hazard(false, now);
                    false
                }
                (ContactEvent::Entered { .. }, HazardKind::Void) => health.enter_void(now).killed,
                (ContactEvent::Exited { .. }, HazardKind::Void) => false,
            };
            if killed {
                handle_hazard_death(&mut self.arena, index, events);
            }
        }

        for (index, from) in previous.into_iter().enumerate() {
            let to = self.arena.pose_of(index).map(|p| p.position);
            let speed = match (from, to) {
                (Some(from), Some(to)) if dt > 0.0 => from.distance(to) / dt,
                _ => 0.0,
            };
            self.arena.entities[index].speed = speed;
        }
    }

    fn sense(&mut self) {
        self.observations = (0..self.arena.entities.len())
            .map(|index| {
                let entity = &self.arena.entities[index];
                (!entity.health.is_dead()).then(|| self.encoder.encode(&self.arena, index))
            })
            .collect();
    }

    fn decode_live(&mut self, source: &mut dyn ActionSource, frame: u64) {
        let empty = Observation::default();
        for index in 0..self.arena.entities.len() {
            let entity = &self.arena.entities[index];
            if entity.health.is_dead() {
                continue;
            }
            let view = AgentView {
                id: &entity.id,
                kind: entity.kind,
                role: entity.role(),
            };
            let obs = self
                .observations
                .get(index)
                .and_then(Option::as_ref)
                .unwrap_or(&empty);
            let values = source.actions(frame, &view, obs);

            match decode_vector(entity.kind, &values) {
                Ok(decoded) => {
                    let entity = &mut self.arena.entities[index];
                    for (branch, value) in decoded {
                        entity.apply_action(branch, value);
                        self.recorder.record(&entity.id, branch, value);
                    }
                }
                Err(e) => {
                    let id = entity.id.clone();
                    tracing::warn!("frame {}: dropping actions of {}: {}", frame, id, e);
                    self.observer.on_decode_error(&id, &e);
                }
            }
        }
    }

    fn decode_replay(&mut self, real_dt: f32) -> Option<u64> {
        let player = self.replay.as_mut()?;
        let frame = player.next_frame(real_dt)?;

        for entry in player.entries(frame) {
            let Some(entity) = player
                .bound_index(&entry.agent_id)
                .and_then(|index| self.arena.entities.get_mut(index))
            else {
                tracing::debug!("frame {}: no entity for '{}'", frame, entry.agent_id);
                continue;
            };
            entity.apply_action(entry.branch, entry.value);
            self.recorder.record(&entity.id, entry.branch, entry.value);
        }
        Some(frame)
    }

    fn actuate(&mut self, events: &mut Vec<ArenaEvent>) {
        let triggers: Vec<_> = self
            .arena
            .entities
            .iter_mut()
            .map(|e| e.intents.take_triggers())
            .collect();

        for (index, fired) in triggers.into_iter().enumerate() {
            if fired.attack {
                abilities::try_attack(&mut self.arena, index, events);
            }
            if fired.heal {
                abilities::try_heal(&mut self.arena, index, events);
            }
            if fired.threat_boost {
                abilities::try_threat_boost(&mut self.arena, index, events);
            }
            if fired.wall_pickup {
                abilities::try_pickup_wall(&mut self.arena, index, events);
            }
            if fired.wall_place {
                abilities::place_wall(&mut self.arena, index, events);
            }
            if let Some(role) = fired.class_selection {
                abilities::try_select_role(&mut self.arena, index, role, events);
            }
        }

        if self.arena.config.threat.decay_enabled {
            let dt = self.arena.clock.dt();
            self.arena.threat.decay(dt);
        }
    }
}

fn handle_hazard_death<P: PhysicsWorld>(
    arena: &mut Arena<P>,
    index: usize,
    events: &mut Vec<ArenaEvent>,
) {
    if let Some(entity) = arena.entities.get(index) {
        tracing::debug!("{} killed by a hazard", entity.id);
    }
    abilities::handle_death(arena, index, events);
}
