//! Aggro ledger shared by every party member.

use crate::config::ThreatConfig;
use crate::infra::EntityId;

/// Per-agent threat scores in first-insertion order.
#[derive(Debug, Clone)]
pub struct ThreatLedger {
    entries: Vec<(EntityId, f32)>,
    heal_multiplier: f32,
    boost_multiplier: f32,
    decay_rate: Option<f32>,
}

impl ThreatLedger {
    pub fn new(config: &ThreatConfig) -> Self {
        Self {
            entries: Vec::new(),
            heal_multiplier: config.heal_multiplier,
            boost_multiplier: config.boost_multiplier,
            decay_rate: config.decay_enabled.then_some(config.decay_rate),
        }
    }

    /// Add a non-negative amount; negative input is ignored.
    pub fn add_threat(&mut self, agent: &EntityId, amount: f32) {
        if amount.is_nan() || amount <= 0.0 {
            return;
        }
        match self.entries.iter_mut().find(|(id, _)| id == agent) {
            Some((_, score)) => *score += amount,
            None => self.entries.push((agent.clone(), amount)),
        }
        tracing::trace!("threat {} +{:.1} -> {:.1}", agent, amount, self.threat(agent));
    }

    pub fn add_threat_from_damage(&mut self, agent: &EntityId, damage: f32) {
        self.add_threat(agent, damage);
    }

    pub fn add_threat_from_heal(&mut self, agent: &EntityId, baseline: f32) {
        self.add_threat(agent, baseline * self.heal_multiplier);
    }

    pub fn add_threat_boost(&mut self, agent: &EntityId, baseline: f32) {
        self.add_threat(agent, baseline * self.boost_multiplier);
    }

    pub fn threat(&self, agent: &EntityId) -> f32 {
        self.entries
            .iter()
            .find(|(id, _)| id == agent)
            .map_or(0.0, |(_, score)| *score)
    }

    /// Agent with the strictly greatest positive score; earliest wins ties.
    pub fn highest_threat_agent(&self) -> Option<&EntityId> {
        let mut best: Option<&(EntityId, f32)> = None;
        for entry in &self.entries {
            if entry.1 > best.map_or(0.0, |b| b.1) {
                best = Some(entry);
            }
        }
        best.map(|(id, _)| id)
    }

    /// All tracked agents, descending by score, insertion order on ties.
    pub fn ranked_agents(&self) -> Vec<(EntityId, f32)> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }

    pub fn clear(&mut self, agent: &EntityId) {
        self.entries.retain(|(id, _)| id != agent);
    }

    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    /// Linear decay towards zero, no-op unless enabled.
    pub fn decay(&mut self, dt: f32) {
        let Some(rate) = self.decay_rate else {
            return;
        };
        for (_, score) in &mut self.entries {
            *score = (*score - rate * dt).max(0.0);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ThreatLedger {
    fn default() -> Self {
        Self::new(&ThreatConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> EntityId {
        EntityId::new(name)
    }

    #[test]
    fn test_highest_threat() {
        let mut ledger = ThreatLedger::default();
        ledger.add_threat(&id("A"), 20.0);
        ledger.add_threat(&id("B"), 50.0);
        assert_eq!(ledger.highest_threat_agent(), Some(&id("B")));
    }

    #[test]
    fn test_highest_none_when_empty_or_zero() {
        let mut ledger = ThreatLedger::default();
        assert_eq!(ledger.highest_threat_agent(), None);
        ledger.add_threat(&id("A"), 0.0);
        assert_eq!(ledger.highest_threat_agent(), None);
    }

    #[test]
    fn test_multipliers() {
        let mut ledger = ThreatLedger::default();
        ledger.add_threat_from_heal(&id("H"), 5.0);
        assert_eq!(ledger.threat(&id("H")), 15.0);
        ledger.add_threat_boost(&id("T"), 5.0);
        assert_eq!(ledger.threat(&id("T")), 25.0);
        ledger.add_threat_from_damage(&id("T"), 2.0);
        assert_eq!(ledger.threat(&id("T")), 27.0);
    }

    #[test]
    fn test_negative_ignored() {
        let mut ledger = ThreatLedger::default();
        ledger.add_threat(&id("A"), 10.0);
        ledger.add_threat(&id("A"), -50.0);
        ledger.add_threat(&id("A"), f32::NAN);
        assert_eq!(ledger.threat(&id("A")), 10.0);
    }

    #[test]
    fn test_ranking_is_stable_on_ties() {
        let mut ledger = ThreatLedger::default();
        ledger.add_threat(&id("first"), 10.0);
        ledger.add_threat(&id("second"), 30.0);
        ledger.add_threat(&id("third"), 10.0);
        let ranked: Vec<String> = ledger
            .ranked_agents()
            .into_iter()
            .map(|(id, _)| id.to_string())
            .collect();
        assert_eq!(ranked, vec!["second", "first", "third"]);
        assert_eq!(ledger.highest_threat_agent(), Some(&id("second")));
    }

    #[test]
    fn test_clear() {
        let mut ledger = ThreatLedger::default();
        ledger.add_threat(&id("A"), 10.0);
        ledger.add_threat(&id("B"), 10.0);
        ledger.clear(&id("A"));
        assert_eq!(ledger.threat(&id("A")), 0.0);
        assert_eq!(ledger.len(), 1);
        ledger.clear_all();
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_decay() {
        let config = ThreatConfig {
            decay_enabled: true,
            ..ThreatConfig::default()
        };
        let mut ledger = ThreatLedger::new(&config);
        ledger.add_threat(&id("A"), 1.0);
        ledger.decay(1.0);
        assert!((ledger.threat(&id("A")) - 0.5).abs() < 1e-6);
        ledger.decay(10.0);
        assert_eq!(ledger.threat(&id("A")), 0.0);

        let mut disabled = ThreatLedger::default();
        disabled.add_threat(&id("A"), 1.0);
        disabled.decay(1.0);
        assert_eq!(disabled.threat(&id("A")), 1.0);
    }
}
