mod action_space;
mod policy;

pub use action_space::{
    ActionBranch, BOSS_BRANCHES, DecodeError, Intents, NO_CLASS_SELECTION, PARTY_BRANCHES,
    Triggers, branches_for, decode_vector,
};
pub use policy::{ActionSource, AgentView, IdlePolicy, RandomPolicy};
