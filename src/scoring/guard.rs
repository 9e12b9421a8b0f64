use crate::core::config::DetectionConfig;
use crate::graph::builder::Graph;
use crate::graph::intern::NodeId;
use crate::scoring::scorer::ScoredAccount;
use rust_decimal::prelude::ToPrimitive;

/// Sequential suppression rules over scored accounts. An account
/// survives only if it passes every rule; rules short-circuit on the
/// first match.
pub fn filter_false_positives(
    scored: Vec<ScoredAccount>,
    graph: &Graph,
    config: &DetectionConfig,
) -> Vec<ScoredAccount> {
    scored
        .into_iter()
        .filter(|account| !is_false_positive(account, graph, config))
        .collect()
}

fn is_false_positive(account: &ScoredAccount, graph: &Graph, config: &DetectionConfig) -> bool {
    if account.score < config.min_suspicion_score {
        return true;
    }
    if config.enhanced && is_whitelisted(account.node, graph, config) {
        return true;
    }
    let in_cycle = !account.connected_rings.is_empty();
    if !in_cycle && is_merchant(account.node, graph, config) {
        return true;
    }
    if is_payroll(account.node, graph, config) {
        return true;
    }
    if !in_cycle && is_exchange_hub(account.node, graph, config) {
        return true;
    }
    false
}

fn is_whitelisted(node: NodeId, graph: &Graph, config: &DetectionConfig) -> bool {
    let account = graph.interner.resolve(node).as_str().to_uppercase();
    config.whitelisted_accounts.contains(&account)
        || config
            .known_merchants
            .iter()
            .any(|m| account.contains(m.as_str()))
        || config
            .known_payroll_providers
            .iter()
            .any(|p| account.contains(p.as_str()))
}

fn is_merchant(node: NodeId, graph: &Graph, config: &DetectionConfig) -> bool {
    let stats = &graph.stats[&node];
    if stats.transaction_count() < config.merchant_min_tx {
        return false;
    }
    if stats.in_degree < config.merchant_min_in_degree {
        return false;
    }
    let diversity = stats.unique_senders.len() as f64 / stats.in_degree as f64;
    diversity >= config.merchant_diversity_ratio
}

fn is_payroll(node: NodeId, graph: &Graph, config: &DetectionConfig) -> bool {
    let stats = &graph.stats[&node];
    if stats.out_degree < config.payroll_min_tx {
        return false;
    }

    let mut timestamps: Vec<_> = graph
        .outgoing(node)
        .iter()
        .map(|&i| graph.edge(i).timestamp)
        .collect();
    timestamps.sort();

    if timestamps.len() < 2 {
        return false;
    }

    let mut regular = 0usize;
    let total = timestamps.len() - 1;
    for window in timestamps.windows(2) {
        let days = (window[1] - window[0]).num_days().unsigned_abs();
        let weekly = (6..=8).contains(&days);
        let biweekly = (13..=15).contains(&days);
        let monthly = config.enhanced && (27..=32).contains(&days);
        if weekly || biweekly || monthly {
            regular += 1;
        }
    }

    (regular as f64 / total as f64) > config.payroll_regularity
}

fn is_exchange_hub(node: NodeId, graph: &Graph, config: &DetectionConfig) -> bool {
    let stats = &graph.stats[&node];
    if stats.in_degree < config.exchange_min_degree || stats.out_degree < config.exchange_min_degree
    {
        return false;
    }
    if stats.total_received.is_zero() {
        return true;
    }
    let ratio = match (stats.total_sent.to_f64(), stats.total_received.to_f64()) {
        (Some(sent), Some(received)) if received != 0.0 => sent / received,
        _ => return false,
    };
    ratio >= config.exchange_flow_ratio_min && ratio <= config.exchange_flow_ratio_max
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::account::AccountId;
    use crate::core::edge::Edge;
    use crate::scoring::flag::Flag;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn ts(h: i64) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(h)
    }

    #[test]
    fn scenario_c_merchant_suppression() {
        let mut edges = Vec::new();
        for i in 0..60 {
            edges.push(Edge::new(
                format!("T{i}"),
                AccountId::new(format!("CUST{i}")),
                AccountId::new("AMAZON_STORE"),
                dec!(9000),
                ts(i),
            ));
        }
        let graph = Graph::build(edges);
        let config = DetectionConfig::default();
        let node = graph.interner.lookup(&AccountId::new("AMAZON_STORE")).unwrap();
        let scored = vec![ScoredAccount {
            node,
            score: 50,
            flags: vec![Flag::FanInSmurfing],
            connected_rings: vec![],
        }];
        let retained = filter_false_positives(scored, &graph, &config);
        assert!(retained.is_empty());
    }

    #[test]
    fn below_cutoff_is_dropped() {
        let edges = vec![Edge::new(
            "T1",
            AccountId::new("A"),
            AccountId::new("B"),
            dec!(100),
            ts(0),
        )];
        let graph = Graph::build(edges);
        let config = DetectionConfig::default();
        let node = graph.interner.lookup(&AccountId::new("A")).unwrap();
        let scored = vec![ScoredAccount {
            node,
            score: 10,
            flags: vec![],
            connected_rings: vec![],
        }];
        assert!(filter_false_positives(scored, &graph, &config).is_empty());
    }

    #[test]
    fn cycle_members_are_not_suppressed_by_merchant_rule() {
        let mut edges = Vec::new();
        for i in 0..60 {
            edges.push(Edge::new(
                format!("T{i}"),
                AccountId::new(format!("CUST{i}")),
                AccountId::new("HUB"),
                dec!(9000),
                ts(i),
            ));
        }
        let graph = Graph::build(edges);
        let config = DetectionConfig::default();
        let node = graph.interner.lookup(&AccountId::new("HUB")).unwrap();
        let scored = vec![ScoredAccount {
            node,
            score: 80,
            flags: vec![Flag::CycleMember],
            connected_rings: vec![0],
        }];
        let retained = filter_false_positives(scored, &graph, &config);
        assert_eq!(retained.len(), 1);
    }
}
