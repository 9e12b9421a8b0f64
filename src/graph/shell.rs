use crate::core::config::DetectionConfig;
use crate::graph::builder::Graph;
use crate::graph::intern::NodeId;
use rust_decimal::prelude::ToPrimitive;
use std::collections::{HashMap, HashSet};

/// Flag pass-through intermediaries: accounts whose money in roughly
/// equals money out, which sit inside a long-enough chain of transfers,
/// and which turn funds over quickly.
pub fn detect_shell_accounts(graph: &Graph, config: &DetectionConfig) -> HashSet<NodeId> {
    let mut flagged = HashSet::new();
    // Shared across the whole run: forward- and backward-chain depth rarely
    // differ between accounts that share graph structure, so caching each
    // direction here avoids the exponential blowup of recomputing a fresh
    // DFS per candidate account. The two directions get separate memos —
    // a node's best downstream reach and its best upstream reach are
    // different quantities and must not collide in the same cache.
    let mut forward_memo: HashMap<NodeId, usize> = HashMap::new();
    let mut backward_memo: HashMap<NodeId, usize> = HashMap::new();

    for node in graph.nodes_in_order() {
        let stats = match graph.stats.get(&node) {
            Some(s) => s,
            None => continue,
        };
        if stats.in_degree == 0 || stats.out_degree == 0 {
            continue;
        }

        if !passes_balance_test(graph, node, config) {
            continue;
        }

        // Chain length is the longest directed path (in nodes) that passes
        // through this node: the best upstream reach, plus this node, plus
        // the best downstream reach.
        let mut on_path = HashSet::new();
        let upstream = backward_chain_depth(node, graph, &mut backward_memo, &mut on_path, 9);
        on_path.clear();
        let downstream = forward_chain_depth(node, graph, &mut forward_memo, &mut on_path, 9);
        let chain_length = 1 + upstream + downstream;
        if chain_length < config.min_chain_length {
            continue;
        }

        if !passes_velocity_test(graph, node, config) {
            continue;
        }

        flagged.insert(node);
    }

    flagged
}

fn passes_balance_test(graph: &Graph, node: NodeId, config: &DetectionConfig) -> bool {
    let stats = &graph.stats[&node];
    if stats.total_received.is_zero() {
        return false;
    }
    let ratio = match (stats.total_sent.to_f64(), stats.total_received.to_f64()) {
        (Some(sent), Some(received)) if received != 0.0 => sent / received,
        _ => return false,
    };
    ratio >= config.pass_through_ratio_min && ratio <= config.pass_through_ratio_max
}

fn passes_velocity_test(graph: &Graph, node: NodeId, config: &DetectionConfig) -> bool {
    let incoming_mean = mean_timestamp_secs(graph.incoming(node), graph);
    let outgoing_mean = mean_timestamp_secs(graph.outgoing(node), graph);
    let (Some(in_mean), Some(out_mean)) = (incoming_mean, outgoing_mean) else {
        return false;
    };
    let diff_hours = (out_mean - in_mean).abs() / 3600.0;
    diff_hours < config.velocity_threshold_hours
}

fn mean_timestamp_secs(edge_indices: &[usize], graph: &Graph) -> Option<f64> {
    if edge_indices.is_empty() {
        return None;
    }
    let sum: i64 = edge_indices
        .iter()
        .map(|&i| graph.edge(i).timestamp.timestamp())
        .sum();
    Some(sum as f64 / edge_indices.len() as f64)
}

/// Longest simple forward path (in edges) reachable from `node`,
/// bounded at `remaining` hops. `on_path` guards against revisiting a
/// node already active in the current search branch (cycle avoidance);
/// `memo` caches completed subtrees across the whole detector run.
fn forward_chain_depth(
    node: NodeId,
    graph: &Graph,
    memo: &mut HashMap<NodeId, usize>,
    on_path: &mut HashSet<NodeId>,
    remaining: usize,
) -> usize {
    if remaining == 0 {
        return 0;
    }
    if let Some(&depth) = memo.get(&node) {
        return depth;
    }
    if on_path.contains(&node) {
        return 0;
    }
    on_path.insert(node);

    let mut best = 0;
    let mut seen_next = HashSet::new();
    for &edge_idx in graph.outgoing(node) {
        let next = {
            let receiver = &graph.edge(edge_idx).receiver_id;
            graph.interner.lookup(receiver).expect("interned receiver")
        };
        if !seen_next.insert(next) {
            continue;
        }
        let depth = 1 + forward_chain_depth(next, graph, memo, on_path, remaining - 1);
        best = best.max(depth);
    }

    on_path.remove(&node);
    memo.insert(node, best);
    best
}

/// Longest simple backward path (in edges) that reaches `node` — the
/// mirror of `forward_chain_depth` walking `graph.incoming` instead of
/// `graph.outgoing`. Combined with `forward_chain_depth`, this gives the
/// length of the longest directed path passing through `node` in either
/// direction, which is what spec's chain test ("some incoming edge whose
/// sender begins a directed path that reaches this node") actually asks
/// for — not just how far the chain continues past this node.
fn backward_chain_depth(
    node: NodeId,
    graph: &Graph,
    memo: &mut HashMap<NodeId, usize>,
    on_path: &mut HashSet<NodeId>,
    remaining: usize,
) -> usize {
    if remaining == 0 {
        return 0;
    }
    if let Some(&depth) = memo.get(&node) {
        return depth;
    }
    if on_path.contains(&node) {
        return 0;
    }
    on_path.insert(node);

    let mut best = 0;
    let mut seen_prev = HashSet::new();
    for &edge_idx in graph.incoming(node) {
        let prev = {
            let sender = &graph.edge(edge_idx).sender_id;
            graph.interner.lookup(sender).expect("interned sender")
        };
        if !seen_prev.insert(prev) {
            continue;
        }
        let depth = 1 + backward_chain_depth(prev, graph, memo, on_path, remaining - 1);
        best = best.max(depth);
    }

    on_path.remove(&node);
    memo.insert(node, best);
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::account::AccountId;
    use crate::core::edge::Edge;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn ts(m: i64) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(m)
    }

    #[test]
    fn scenario_d_pass_through_chain() {
        let edges = vec![
            Edge::new("T1", AccountId::new("A"), AccountId::new("B"), dec!(100), ts(0)),
            Edge::new("T2", AccountId::new("B"), AccountId::new("C"), dec!(100), ts(10)),
            Edge::new("T3", AccountId::new("C"), AccountId::new("D"), dec!(100), ts(20)),
        ];
        let graph = Graph::build(edges);
        let config = DetectionConfig::default();
        let flagged = detect_shell_accounts(&graph, &config);

        let b = graph.interner.lookup(&AccountId::new("B")).unwrap();
        let c = graph.interner.lookup(&AccountId::new("C")).unwrap();
        let a = graph.interner.lookup(&AccountId::new("A")).unwrap();
        let d = graph.interner.lookup(&AccountId::new("D")).unwrap();

        assert!(flagged.contains(&b));
        assert!(flagged.contains(&c));
        assert!(!flagged.contains(&a));
        assert!(!flagged.contains(&d));
    }

    #[test]
    fn unbalanced_accounts_are_not_flagged() {
        let edges = vec![
            Edge::new("T1", AccountId::new("A"), AccountId::new("B"), dec!(100), ts(0)),
            Edge::new("T2", AccountId::new("B"), AccountId::new("C"), dec!(10), ts(10)),
            Edge::new("T3", AccountId::new("C"), AccountId::new("D"), dec!(10), ts(20)),
        ];
        let graph = Graph::build(edges);
        let flagged = detect_shell_accounts(&graph, &DetectionConfig::default());
        let b = graph.interner.lookup(&AccountId::new("B")).unwrap();
        assert!(!flagged.contains(&b));
    }

    #[test]
    fn chain_too_short_is_not_flagged() {
        // A->B->C is a 3-node path through B, which meets the default
        // MIN_CHAIN_LENGTH (3) exactly, since any account with both
        // incoming and outgoing edges sits in a path of at least 3 nodes.
        // Raise the bar to exercise a chain that falls genuinely short.
        let edges = vec![
            Edge::new("T1", AccountId::new("A"), AccountId::new("B"), dec!(100), ts(0)),
            Edge::new("T2", AccountId::new("B"), AccountId::new("C"), dec!(100), ts(10)),
        ];
        let graph = Graph::build(edges);
        let mut config = DetectionConfig::default();
        config.min_chain_length = 5;
        let flagged = detect_shell_accounts(&graph, &config);
        let b = graph.interner.lookup(&AccountId::new("B")).unwrap();
        assert!(!flagged.contains(&b));
    }

    #[test]
    fn backward_reach_alone_can_satisfy_the_chain_test() {
        // A->B->C->D->E: D has only one hop of forward reach (D->E) but
        // three hops of backward reach (A->B->C->D), so the combined
        // chain length must come from upstream depth, not just downstream.
        let edges = vec![
            Edge::new("T1", AccountId::new("A"), AccountId::new("B"), dec!(100), ts(0)),
            Edge::new("T2", AccountId::new("B"), AccountId::new("C"), dec!(100), ts(10)),
            Edge::new("T3", AccountId::new("C"), AccountId::new("D"), dec!(100), ts(20)),
            Edge::new("T4", AccountId::new("D"), AccountId::new("E"), dec!(100), ts(30)),
        ];
        let graph = Graph::build(edges);
        let mut config = DetectionConfig::default();
        config.min_chain_length = 5;
        let flagged = detect_shell_accounts(&graph, &config);
        let d = graph.interner.lookup(&AccountId::new("D")).unwrap();
        assert!(flagged.contains(&d));
    }
}
