//! Action sources feeding the decoder in live mode.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::infra::{EntityId, EntityKind};
use crate::sensing::Observation;
use crate::state::Role;

use super::action_space::{ActionBranch, NO_CLASS_SELECTION, branches_for};

/// What a policy knows about the agent it is deciding for.
#[derive(Debug, Clone, Copy)]
pub struct AgentView<'a> {
    pub id: &'a EntityId,
    pub kind: EntityKind,
    pub role: Role,
}

/// Produces one raw action vector per agent per decode.
pub trait ActionSource {
    fn actions(&mut self, frame: u64, agent: &AgentView<'_>, obs: &Observation) -> Vec<i32>;
}

/// Stands still and never picks a class.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdlePolicy;

impl ActionSource for IdlePolicy {
    fn actions(&mut self, _frame: u64, agent: &AgentView<'_>, _obs: &Observation) -> Vec<i32> {
        branches_for(agent.kind)
            .iter()
            .map(|branch| match branch {
                ActionBranch::ClassSelection => NO_CLASS_SELECTION,
                _ => 0,
            })
            .collect()
    }
}

/// Uniformly random values over every branch's cardinality.
pub struct RandomPolicy {
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl ActionSource for RandomPolicy {
    fn actions(&mut self, _frame: u64, agent: &AgentView<'_>, obs: &Observation) -> Vec<i32> {
        let unseen_agents = obs.mask.iter().filter(|visible| !**visible).count();
        tracing::trace!(agent = %agent.id, unseen_agents, "sampling random action");

        branches_for(agent.kind)
            .iter()
            .map(|branch| self.rng.random_range(0..branch.cardinality()))
            .collect()
    }
}
