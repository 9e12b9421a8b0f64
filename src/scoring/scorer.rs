use crate::core::config::DetectionConfig;
use crate::graph::builder::Graph;
use crate::graph::cycle_detection::FraudRing;
use crate::graph::intern::NodeId;
use crate::scoring::flag::Flag;
use std::collections::{HashMap, HashSet};

/// Per-account scoring result, over the union of cycle members,
/// smurfing-flagged, and shell-flagged accounts.
#[derive(Debug, Clone)]
pub struct ScoredAccount {
    pub node: NodeId,
    pub score: u32,
    pub flags: Vec<Flag>,
    pub connected_rings: Vec<usize>,
}

/// Combine detector outputs into per-account suspicion scores.
///
/// Every weight is additive and configurable (see `DetectionConfig`);
/// the final score is clamped to `[0, 100]`. Fan-in and fan-out
/// smurfing are independent checks over the same flagged set, so a
/// pure pass-through node can legitimately receive both +30 weights.
pub fn score_accounts(
    graph: &Graph,
    rings: &[FraudRing],
    smurfing: &HashSet<NodeId>,
    shell: &HashSet<NodeId>,
    config: &DetectionConfig,
) -> Vec<ScoredAccount> {
    let mut ring_membership: HashMap<NodeId, Vec<usize>> = HashMap::new();
    for (idx, ring) in rings.iter().enumerate() {
        for &member in &ring.members {
            ring_membership.entry(member).or_default().push(idx);
        }
    }

    let mut candidates: HashSet<NodeId> = HashSet::new();
    candidates.extend(ring_membership.keys().copied());
    candidates.extend(smurfing.iter().copied());
    candidates.extend(shell.iter().copied());

    let mut results = Vec::new();
    for node in graph.nodes_in_order() {
        if !candidates.contains(&node) {
            continue;
        }

        let stats = &graph.stats[&node];
        let mut score: u32 = 0;
        let mut flags = Vec::new();
        let connected_rings = ring_membership.get(&node).cloned().unwrap_or_default();

        if !connected_rings.is_empty() {
            score += config.score_cycle_member;
            flags.push(Flag::CycleMember);
        }

        if smurfing.contains(&node) {
            if stats.in_degree >= config.min_fan_degree {
                score += config.score_fan_in_smurfing;
                flags.push(Flag::FanInSmurfing);
            }
            if stats.out_degree >= config.min_fan_degree {
                score += config.score_fan_out_smurfing;
                flags.push(Flag::FanOutSmurfing);
            }
        }

        if shell.contains(&node) {
            score += config.score_shell_account;
            flags.push(Flag::ShellAccount);
        }

        if is_high_velocity(graph, node, config) {
            score += config.score_high_velocity;
            flags.push(Flag::HighVelocity);
        }

        if has_below_threshold_structuring(graph, node, config) {
            score += config.score_below_threshold;
            flags.push(Flag::BelowThresholdStructuring);
        }

        if config.enhanced && matches_high_risk_pattern(graph, node, config) {
            score += config.score_high_risk_pattern;
            flags.push(Flag::HighRiskPattern);
        }

        if flags.len() >= 3 {
            score += config.score_multiple_patterns;
            flags.push(Flag::MultiplePatterns);
        }

        results.push(ScoredAccount {
            node,
            score: score.min(100),
            flags,
            connected_rings,
        });
    }

    results
}

fn is_high_velocity(graph: &Graph, node: NodeId, config: &DetectionConfig) -> bool {
    let stats = &graph.stats[&node];
    if stats.first_tx == stats.last_tx {
        return true;
    }
    let span_days = (stats.last_tx - stats.first_tx).num_seconds() as f64 / 86_400.0;
    if span_days <= 0.0 {
        return true;
    }
    let tx_per_day = stats.transaction_count() as f64 / span_days;
    tx_per_day > config.tx_per_day_threshold
}

fn has_below_threshold_structuring(graph: &Graph, node: NodeId, config: &DetectionConfig) -> bool {
    let adjacent: Vec<usize> = graph
        .outgoing(node)
        .iter()
        .chain(graph.incoming(node).iter())
        .copied()
        .collect();
    if adjacent.len() < config.min_fan_degree {
        return false;
    }
    let below = adjacent
        .iter()
        .filter(|&&idx| graph.edge(idx).amount < config.smurfing_threshold)
        .count();
    below as f64 / adjacent.len() as f64 >= config.below_threshold_structuring_ratio
}

fn matches_high_risk_pattern(graph: &Graph, node: NodeId, config: &DetectionConfig) -> bool {
    let account = graph.interner.resolve(node).as_str().to_uppercase();
    config
        .high_risk_patterns
        .iter()
        .any(|pattern| account.contains(pattern.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::account::AccountId;
    use crate::core::edge::Edge;
    use crate::graph::cycle_detection::detect_cycles;
    use crate::graph::shell::detect_shell_accounts;
    use crate::graph::smurfing::detect_smurfing;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn ts(h: i64) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(h)
    }

    #[test]
    fn cycle_members_score_at_least_fifty() {
        let edges = vec![
            Edge::new("T1", AccountId::new("A"), AccountId::new("B"), dec!(100), ts(0)),
            Edge::new("T2", AccountId::new("B"), AccountId::new("C"), dec!(100), ts(1)),
            Edge::new("T3", AccountId::new("C"), AccountId::new("A"), dec!(100), ts(2)),
        ];
        let graph = Graph::build(edges);
        let config = DetectionConfig::default();
        let rings = detect_cycles(&graph, &config);
        let smurfing = detect_smurfing(&graph, &config);
        let shell = detect_shell_accounts(&graph, &config);
        let scored = score_accounts(&graph, &rings, &smurfing, &shell, &config);

        assert_eq!(scored.len(), 3);
        for account in &scored {
            assert!(account.score >= 50);
            assert!(account.flags.contains(&Flag::CycleMember));
            assert_eq!(account.connected_rings, vec![0]);
        }
    }

    #[test]
    fn fan_in_and_fan_out_smurfing_can_stack() {
        // X both receives from and sends to 6 distinct counterparties
        // within the window — both smurfing weights apply.
        let mut edges = Vec::new();
        for i in 0..6 {
            edges.push(Edge::new(
                format!("IN{i}"),
                AccountId::new(format!("S{i}")),
                AccountId::new("X"),
                dec!(9000),
                ts(i),
            ));
        }
        for i in 0..6 {
            edges.push(Edge::new(
                format!("OUT{i}"),
                AccountId::new("X"),
                AccountId::new(format!("R{i}")),
                dec!(9000),
                ts(10 + i),
            ));
        }
        let graph = Graph::build(edges);
        let config = DetectionConfig::default();
        let rings = detect_cycles(&graph, &config);
        let smurfing = detect_smurfing(&graph, &config);
        let shell = detect_shell_accounts(&graph, &config);
        let scored = score_accounts(&graph, &rings, &smurfing, &shell, &config);

        let x = graph.interner.lookup(&AccountId::new("X")).unwrap();
        let x_score = scored.iter().find(|a| a.node == x).unwrap();
        assert!(x_score.flags.contains(&Flag::FanInSmurfing));
        assert!(x_score.flags.contains(&Flag::FanOutSmurfing));
    }

    #[test]
    fn score_never_exceeds_one_hundred() {
        let edges = vec![
            Edge::new("T1", AccountId::new("A"), AccountId::new("B"), dec!(100), ts(0)),
            Edge::new("T2", AccountId::new("B"), AccountId::new("C"), dec!(100), ts(1)),
            Edge::new("T3", AccountId::new("C"), AccountId::new("A"), dec!(100), ts(2)),
        ];
        let graph = Graph::build(edges);
        let config = DetectionConfig::default();
        let rings = detect_cycles(&graph, &config);
        let smurfing = detect_smurfing(&graph, &config);
        let shell = detect_shell_accounts(&graph, &config);
        let scored = score_accounts(&graph, &rings, &smurfing, &shell, &config);
        assert!(scored.iter().all(|a| a.score <= 100));
    }
}
