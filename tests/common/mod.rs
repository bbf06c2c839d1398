#![allow(dead_code)]

use std::collections::HashMap;

use bossfight_arena::control::{ActionSource, AgentView, IdlePolicy};
use bossfight_arena::sensing::Observation;
use bossfight_arena::{ArenaConfig, FlatArena, Simulation, TickReport, scenario};

/// Fixed action vectors per agent name; everyone else idles.
#[derive(Default)]
pub struct Script {
    vectors: HashMap<String, Vec<i32>>,
}

impl Script {
    pub fn with(mut self, agent: &str, vector: Vec<i32>) -> Self {
        self.vectors.insert(agent.to_string(), vector);
        self
    }
}

impl ActionSource for Script {
    fn actions(&mut self, frame: u64, agent: &AgentView<'_>, obs: &Observation) -> Vec<i32> {
        match self.vectors.get(agent.id.as_str()) {
            Some(vector) => vector.clone(),
            None => IdlePolicy.actions(frame, agent, obs),
        }
    }
}

pub fn simulation(config: ArenaConfig) -> Simulation<FlatArena> {
    Simulation::new(scenario::standard_arena(config))
}

/// Tick until an episode ends or `limit` ticks have run.
pub fn run_until_outcome(
    sim: &mut Simulation<FlatArena>,
    source: &mut dyn ActionSource,
    limit: usize,
) -> Option<(usize, TickReport)> {
    for n in 0..limit {
        let report = sim.tick(source);
        if report.outcome.is_some() {
            return Some((n, report));
        }
    }
    None
}
