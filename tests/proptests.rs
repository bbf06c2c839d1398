use proptest::prelude::*;

use bossfight_arena::EntityId;
use bossfight_arena::config::ThreatConfig;
use bossfight_arena::control::{ActionBranch, Intents, branches_for, decode_vector};
use bossfight_arena::infra::EntityKind;
use bossfight_arena::state::{HealthModel, ThreatLedger};

#[derive(Debug, Clone)]
enum HealthOp {
    Damage(f32, f32),
    Heal(f32),
    Tick,
    Respawn,
}

fn health_op() -> impl Strategy<Value = HealthOp> {
    prop_oneof![
        (0.0f32..250.0, 0.0f32..1.0).prop_map(|(a, r)| HealthOp::Damage(a, r)),
        (0.0f32..250.0).prop_map(HealthOp::Heal),
        Just(HealthOp::Tick),
        Just(HealthOp::Respawn),
    ]
}

proptest! {
    /// Health never leaves [0, max] and death is sticky until respawn.
    #[test]
    fn test_health_stays_clamped(ops in prop::collection::vec(health_op(), 0..200)) {
        let mut health = HealthModel::default();
        for op in ops {
            let was_dead = health.is_dead();
            match op {
                HealthOp::Damage(amount, reduction) => { health.take_damage(amount, reduction); }
                HealthOp::Heal(amount) => {
                    health.heal(amount);
                    prop_assert_eq!(health.is_dead(), was_dead);
                }
                HealthOp::Tick => { health.tick(0.0); }
                HealthOp::Respawn => health.respawn(),
            }
            prop_assert!(health.current() >= 0.0);
            prop_assert!(health.current() <= health.max());
            if health.is_dead() {
                prop_assert_eq!(health.current(), 0.0);
            }
        }
    }

    /// Ranking is descending and keeps first-insertion order on ties.
    #[test]
    fn test_threat_ranking_is_stable(adds in prop::collection::vec((0usize..6, 0u8..4), 0..60)) {
        let mut ledger = ThreatLedger::new(&ThreatConfig::default());
        let mut first_seen: Vec<usize> = Vec::new();
        for (agent, amount) in &adds {
            ledger.add_threat(&EntityId::new(format!("Party_{agent}")), *amount as f32 * 5.0);
            if *amount > 0 && !first_seen.contains(agent) {
                first_seen.push(*agent);
            }
        }

        let ranked = ledger.ranked_agents();
        prop_assert_eq!(ranked.len(), first_seen.len());
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].1 >= pair[1].1);
            if pair[0].1 == pair[1].1 {
                let order = |id: &EntityId| {
                    first_seen.iter().position(|a| id.as_str() == format!("Party_{a}"))
                };
                prop_assert!(order(&pair[0].0) < order(&pair[1].0));
            }
        }
        prop_assert!(ranked.iter().all(|(_, score)| *score >= 0.0));
    }

    /// Any vector decodes or is rejected whole, and any value is safe to apply.
    #[test]
    fn test_decode_arbitrary_vectors(
        boss in any::<bool>(),
        values in prop::collection::vec(any::<i32>(), 0..10),
        locked in any::<bool>(),
    ) {
        let kind = if boss { EntityKind::Boss } else { EntityKind::PartyMember };
        let expected = branches_for(kind).len();

        match decode_vector(kind, &values) {
            Ok(decoded) => {
                prop_assert!(values.len() >= expected);
                prop_assert_eq!(decoded.len(), expected);
                let mut intents = Intents::default();
                for (branch, value) in decoded {
                    intents.apply(branch, value, locked);
                }
                prop_assert!([-1.0, 0.0, 1.0].contains(&intents.movement));
                prop_assert!([-1.0, 0.0, 1.0].contains(&intents.rotation));
                if locked {
                    prop_assert_eq!(intents.class_selection, None);
                }
                if boss {
                    prop_assert!(!intents.heal && !intents.threat_boost);
                } else {
                    prop_assert!(!intents.wall_pickup && !intents.wall_place);
                }
            }
            Err(_) => prop_assert!(values.len() < expected),
        }
    }

    /// Branch names survive the text form used by the binary record.
    #[test]
    fn test_branch_name_lookup(index in 0usize..8) {
        let all = [
            ActionBranch::Movement,
            ActionBranch::Rotation,
            ActionBranch::Attack,
            ActionBranch::WallPickup,
            ActionBranch::WallPlace,
            ActionBranch::Heal,
            ActionBranch::ThreatBoost,
            ActionBranch::ClassSelection,
        ];
        let branch = all[index];
        prop_assert_eq!(ActionBranch::from_name(branch.as_str()), Some(branch));
    }
}
