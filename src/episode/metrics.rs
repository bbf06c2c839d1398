//! Live training metrics and offline analysis of recorded episodes.

use std::collections::{BTreeMap, VecDeque};
use std::time::Instant;

use crate::control::{ActionBranch, NO_CLASS_SELECTION};
use crate::infra::ArenaObserver;

use super::lifecycle::EpisodeOutcome;
use super::record::{EpisodeRecord, WinCondition};

/// Moving average calculator
#[derive(Debug, Clone)]
pub struct MovingAverage {
    values: VecDeque<f32>,
    window_size: usize,
    sum: f32,
}

impl MovingAverage {
    pub fn new(window_size: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(window_size),
            window_size: window_size.max(1),
            sum: 0.0,
        }
    }

    pub fn push(&mut self, value: f32) {
        if self.values.len() >= self.window_size
            && let Some(old) = self.values.pop_front()
        {
            self.sum -= old;
        }
        self.values.push_back(value);
        self.sum += value;
    }

    pub fn average(&self) -> f32 {
        if self.values.is_empty() {
            0.0
        } else {
            self.sum / self.values.len() as f32
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Rolling outcome statistics of the live loop.
#[derive(Debug)]
pub struct TrainingMetrics {
    /// Party win rate
    pub party_wins: MovingAverage,
    /// Boss win rate
    pub boss_wins: MovingAverage,
    /// Episode duration in simulated seconds
    pub durations: MovingAverage,
    /// Episodes finished so far
    pub episodes: usize,
    /// Log every n episodes (0 disables logging)
    log_every: usize,
    start_time: Instant,
}

impl TrainingMetrics {
    pub fn new(window_size: usize, log_every: usize) -> Self {
        Self {
            party_wins: MovingAverage::new(window_size),
            boss_wins: MovingAverage::new(window_size),
            durations: MovingAverage::new(window_size),
            episodes: 0,
            log_every,
            start_time: Instant::now(),
        }
    }

    pub fn record_episode(&mut self, win: WinCondition, duration: f32) {
        self.party_wins.push(if win == WinCondition::Party { 1.0 } else { 0.0 });
        self.boss_wins.push(if win == WinCondition::Boss { 1.0 } else { 0.0 });
        self.durations.push(duration);
        self.episodes += 1;
    }

    /// Episodes per wall-clock second
    pub fn episodes_per_second(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.episodes as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn log_to_console(&self) {
        tracing::info!(
            "Episodes {} | party win {:.1}% | boss win {:.1}% | duration {:.1}s | {:.2} eps/s",
            self.episodes,
            self.party_wins.average() * 100.0,
            self.boss_wins.average() * 100.0,
            self.durations.average(),
            self.episodes_per_second()
        );
    }
}

impl ArenaObserver for TrainingMetrics {
    fn on_episode_start(&mut self, _episode: u32, _tick: u64) {}

    fn on_episode_end(&mut self, outcome: &EpisodeOutcome) {
        self.record_episode(outcome.win, outcome.duration);
        if self.log_every > 0 && self.episodes % self.log_every == 0 {
            self.log_to_console();
        }
    }
}

/// Per-role aggregates over recorded episodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoleStats {
    pub episodes: usize,
    pub wins: usize,
    pub attacks: usize,
    pub heals: usize,
    pub threat_boosts: usize,
}

impl RoleStats {
    pub fn win_rate(&self) -> f32 {
        if self.episodes == 0 {
            0.0
        } else {
            self.wins as f32 / self.episodes as f32
        }
    }
}

/// Summary of a set of persisted episode records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EpisodeAnalysis {
    pub episodes: usize,
    pub wins: BTreeMap<WinCondition, usize>,
    pub mean_duration: f32,
    pub min_duration: f32,
    pub max_duration: f32,
    /// Times each role string appears across episodes
    pub role_counts: BTreeMap<String, usize>,
    pub action_counts: BTreeMap<ActionBranch, usize>,
    pub total_actions: usize,
    /// Non-zero entries other than "no selection" class choices
    pub real_actions: usize,
    pub role_stats: BTreeMap<String, RoleStats>,
}

fn is_real_action(branch: ActionBranch, value: i32) -> bool {
    value != 0
        && !(branch == ActionBranch::ClassSelection
            && (value == -1 || value == NO_CLASS_SELECTION))
}

impl EpisodeAnalysis {
    pub fn from_records(records: &[EpisodeRecord]) -> Self {
        let mut analysis = Self {
            episodes: records.len(),
            ..Self::default()
        };
        if records.is_empty() {
            return analysis;
        }

        let durations: Vec<f32> = records.iter().map(|r| r.duration).collect();
        analysis.mean_duration = durations.iter().sum::<f32>() / durations.len() as f32;
        analysis.min_duration = durations.iter().copied().fold(f32::INFINITY, f32::min);
        analysis.max_duration = durations.iter().copied().fold(f32::NEG_INFINITY, f32::max);

        for record in records {
            *analysis.wins.entry(record.win_condition).or_default() += 1;

            for entry in &record.actions {
                *analysis.action_counts.entry(entry.branch).or_default() += 1;
                if is_real_action(entry.branch, entry.value) {
                    analysis.real_actions += 1;
                }
            }
            analysis.total_actions += record.actions.len();

            for agent in &record.agents {
                *analysis.role_counts.entry(agent.role.clone()).or_default() += 1;

                let stats = analysis.role_stats.entry(agent.role.clone()).or_default();
                stats.episodes += 1;
                let won = match record.win_condition {
                    WinCondition::Party => agent.role != "Boss",
                    WinCondition::Boss => agent.role == "Boss",
                    _ => false,
                };
                if won {
                    stats.wins += 1;
                }
                for entry in record
                    .actions
                    .iter()
                    .filter(|a| a.agent_id == agent.agent_id && a.value == 1)
                {
                    match entry.branch {
                        ActionBranch::Attack => stats.attacks += 1,
                        ActionBranch::Heal => stats.heals += 1,
                        ActionBranch::ThreatBoost => stats.threat_boosts += 1,
                        _ => {}
                    }
                }
            }
        }

        analysis
    }

    pub fn log_summary(&self) {
        tracing::info!("Analyzed {} episodes", self.episodes);
        if self.episodes == 0 {
            return;
        }
        for (win, count) in &self.wins {
            let label = if *win == WinCondition::None { "unfinished" } else { win.as_str() };
            tracing::info!(
                "- {}: {} ({:.1}%)",
                label,
                count,
                *count as f32 / self.episodes as f32 * 100.0
            );
        }
        tracing::info!(
            "Duration: mean {:.1}s, min {:.1}s, max {:.1}s",
            self.mean_duration,
            self.min_duration,
            self.max_duration
        );
        tracing::info!(
            "Actions: {} total, {} real",
            self.total_actions,
            self.real_actions
        );
        for (branch, count) in &self.action_counts {
            tracing::info!("- {}: {}", branch, count);
        }
        for (role, stats) in &self.role_stats {
            tracing::info!(
                "{}: {} episodes, win rate {:.1}%, attacks {}, heals {}, threat boosts {}",
                role,
                stats.episodes,
                stats.win_rate() * 100.0,
                stats.attacks,
                stats.heals,
                stats.threat_boosts
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::episode::{ActionEntry, AgentRole};
    use crate::infra::EntityId;

    #[test]
    fn test_moving_average_window() {
        let mut avg = MovingAverage::new(3);
        assert_eq!(avg.average(), 0.0);
        for v in [1.0, 2.0, 3.0, 4.0] {
            avg.push(v);
        }
        assert_eq!(avg.len(), 3);
        assert!((avg.average() - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_training_metrics_rates() {
        let mut metrics = TrainingMetrics::new(10, 0);
        metrics.record_episode(WinCondition::Party, 10.0);
        metrics.record_episode(WinCondition::Boss, 20.0);
        metrics.record_episode(WinCondition::Timeout, 30.0);
        metrics.record_episode(WinCondition::Party, 40.0);
        assert_eq!(metrics.episodes, 4);
        assert!((metrics.party_wins.average() - 0.5).abs() < 1e-6);
        assert!((metrics.boss_wins.average() - 0.25).abs() < 1e-6);
        assert!((metrics.durations.average() - 25.0).abs() < 1e-6);
    }

    fn entry(frame: u64, agent: &str, branch: ActionBranch, value: i32) -> ActionEntry {
        ActionEntry {
            frame,
            agent_id: EntityId::new(agent),
            branch,
            value,
        }
    }

    fn role(agent: &str, role: &str) -> AgentRole {
        AgentRole {
            agent_id: EntityId::new(agent),
            role: role.to_string(),
        }
    }

    #[test]
    fn test_analysis_counts() {
        let records = vec![
            EpisodeRecord {
                episode: 1,
                win_condition: WinCondition::Party,
                duration: 10.0,
                agents: vec![role("Boss", "Boss"), role("Party_0", "Healer")],
                actions: vec![
                    entry(0, "Party_0", ActionBranch::ClassSelection, 1),
                    entry(0, "Party_0", ActionBranch::Heal, 1),
                    entry(1, "Party_0", ActionBranch::ClassSelection, NO_CLASS_SELECTION),
                    entry(1, "Party_0", ActionBranch::Heal, 0),
                    entry(1, "Boss", ActionBranch::Attack, 1),
                ],
            },
            EpisodeRecord {
                episode: 2,
                win_condition: WinCondition::Timeout,
                duration: 30.0,
                agents: vec![role("Boss", "Boss"), role("Party_0", "None")],
                actions: vec![entry(0, "Party_0", ActionBranch::ClassSelection, -1)],
            },
        ];

        let analysis = EpisodeAnalysis::from_records(&records);
        assert_eq!(analysis.episodes, 2);
        assert_eq!(analysis.wins.get(&WinCondition::Party), Some(&1));
        assert_eq!(analysis.wins.get(&WinCondition::Timeout), Some(&1));
        assert!((analysis.mean_duration - 20.0).abs() < 1e-6);
        assert_eq!(analysis.min_duration, 10.0);
        assert_eq!(analysis.max_duration, 30.0);
        assert_eq!(analysis.total_actions, 6);
        assert_eq!(analysis.real_actions, 3);
        assert_eq!(analysis.action_counts.get(&ActionBranch::ClassSelection), Some(&3));
        assert_eq!(analysis.role_counts.get("Boss"), Some(&2));

        let healer = &analysis.role_stats["Healer"];
        assert_eq!(healer.wins, 1);
        assert_eq!(healer.heals, 1);
        let boss = &analysis.role_stats["Boss"];
        assert_eq!(boss.episodes, 2);
        assert_eq!(boss.wins, 0);
        assert_eq!(boss.attacks, 1);
    }
}
