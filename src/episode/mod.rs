mod lifecycle;
mod metrics;
mod record;
mod recorder;
mod replay;

pub use lifecycle::{EpisodeController, EpisodeOutcome, EpisodePhase};
pub use metrics::{EpisodeAnalysis, MovingAverage, RoleStats, TrainingMetrics};
pub use record::{
    ActionEntry, ActionEntryMessage, AgentRole, AgentRoleMessage, EpisodeRecord,
    EpisodeRecordMessage, RecordFormat, ReplayError, WinCondition, load_records_dir,
    session_directory,
};
pub use recorder::ActionRecorder;
pub use replay::{PlaybackSpeed, ReplayPlayer, ReplayState};
