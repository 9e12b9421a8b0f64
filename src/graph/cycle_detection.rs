use crate::core::config::DetectionConfig;
use crate::graph::builder::Graph;
use crate::graph::intern::NodeId;
use crate::graph::scc::{find_sccs, StronglyConnectedComponent};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::HashSet;

/// A detected fraud ring: a closed loop of accounts along which funds
/// circulate back to the originator.
#[derive(Debug, Clone)]
pub struct FraudRing {
    /// Rotation-canonical member list (starts at the lexicographically
    /// smallest account id; reverse rotations are a distinct ring).
    pub members: Vec<NodeId>,
    pub total_flow: Decimal,
    pub transaction_count: usize,
    pub risk_score: u32,
    pub cycle_length: usize,
}

/// Find fraud rings: discover SCCs, admit the smallest 20, enumerate
/// bounded simple cycles within each, canonicalize and dedup, score, and
/// sort by risk descending.
///
/// This function is a total function over `(graph, config)` — it never
/// fails. The caller is responsible for the wall-clock deadline (see
/// `pipeline::run`); on timeout the caller simply never gets a result
/// and substitutes an empty list.
pub fn detect_cycles(graph: &Graph, config: &DetectionConfig) -> Vec<FraudRing> {
    let mut sccs = find_sccs(graph);
    // (b) smaller clusters first: cheaper to enumerate, likelier to be
    // true rings. `sort_by` is stable, so SCC discovery order (which
    // itself follows input order) breaks ties.
    sccs.sort_by_key(|scc| scc.len());
    sccs.truncate(config.max_sccs);

    let mut seen: HashSet<Vec<NodeId>> = HashSet::new();
    let mut rings = Vec::new();

    'sccs: for scc in &sccs {
        let raw = enumerate_cycles_in_scc(graph, scc, config);
        for cycle in raw {
            let canonical = canonical_form(graph, &cycle);
            if !seen.insert(canonical.clone()) {
                continue;
            }
            rings.push(build_ring(graph, canonical, config));
            if rings.len() >= config.max_results {
                break 'sccs;
            }
        }
    }

    rings.sort_by(|a, b| b.risk_score.cmp(&a.risk_score));
    rings.truncate(config.max_results);
    rings
}

/// (c) Bounded simple-cycle enumeration within one SCC.
fn enumerate_cycles_in_scc(
    graph: &Graph,
    scc: &StronglyConnectedComponent,
    config: &DetectionConfig,
) -> Vec<Vec<NodeId>> {
    let membership: HashSet<NodeId> = scc.members.iter().copied().collect();

    let mut starts: Vec<NodeId> = scc.members.clone();
    starts.sort_by(|a, b| graph.interner.resolve(*a).cmp(graph.interner.resolve(*b)));
    starts.truncate(config.max_cycle_starts_per_scc);

    let mut raw_cycles = Vec::new();
    for start in starts {
        if raw_cycles.len() >= config.max_raw_cycles_per_scc {
            break;
        }
        let mut path = vec![start];
        let mut path_set: HashSet<NodeId> = HashSet::new();
        path_set.insert(start);
        dfs_find_cycles(
            start,
            start,
            &membership,
            graph,
            config,
            &mut path,
            &mut path_set,
            &mut raw_cycles,
        );
    }
    raw_cycles
}

#[allow(clippy::too_many_arguments)]
fn dfs_find_cycles(
    current: NodeId,
    start: NodeId,
    membership: &HashSet<NodeId>,
    graph: &Graph,
    config: &DetectionConfig,
    path: &mut Vec<NodeId>,
    path_set: &mut HashSet<NodeId>,
    raw_cycles: &mut Vec<Vec<NodeId>>,
) {
    if raw_cycles.len() >= config.max_raw_cycles_per_scc {
        return;
    }

    let mut seen_next: HashSet<NodeId> = HashSet::new();
    for &edge_idx in graph.outgoing(current) {
        let next = {
            let receiver = &graph.edge(edge_idx).receiver_id;
            graph.interner.lookup(receiver).expect("interned receiver")
        };
        if !membership.contains(&next) || !seen_next.insert(next) {
            continue;
        }

        if next == start {
            if path.len() >= config.min_cycle_length && path.len() <= config.max_cycle_length {
                raw_cycles.push(path.clone());
                if raw_cycles.len() >= config.max_raw_cycles_per_scc {
                    return;
                }
            }
            continue;
        }

        if path.len() >= config.max_cycle_length || path_set.contains(&next) {
            continue;
        }

        path.push(next);
        path_set.insert(next);
        dfs_find_cycles(
            next, start, membership, graph, config, path, path_set, raw_cycles,
        );
        path.pop();
        path_set.remove(&next);

        if raw_cycles.len() >= config.max_raw_cycles_per_scc {
            return;
        }
    }
}

/// (d) Rotate to the lexicographically smallest member. Reverse
/// rotations are deliberately treated as distinct rings — edge
/// direction encodes the direction funds actually flowed.
fn canonical_form(graph: &Graph, members: &[NodeId]) -> Vec<NodeId> {
    let n = members.len();
    let mut best = members.to_vec();
    for i in 1..n {
        let rotated: Vec<NodeId> = members[i..]
            .iter()
            .chain(members[..i].iter())
            .copied()
            .collect();
        if compare_by_account(graph, &rotated, &best) == Ordering::Less {
            best = rotated;
        }
    }
    best
}

fn compare_by_account(graph: &Graph, a: &[NodeId], b: &[NodeId]) -> Ordering {
    for (&x, &y) in a.iter().zip(b.iter()) {
        let ord = graph.interner.resolve(x).cmp(graph.interner.resolve(y));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// (e) Per-cycle risk score.
fn build_ring(graph: &Graph, members: Vec<NodeId>, config: &DetectionConfig) -> FraudRing {
    let n = members.len();
    let mut amounts: Vec<Decimal> = Vec::new();
    let mut total_flow = Decimal::ZERO;

    for i in 0..n {
        let from = members[i];
        let to = members[(i + 1) % n];
        for &edge_idx in graph.edges_between(from, to) {
            let amount = graph.edge(edge_idx).amount;
            amounts.push(amount);
            total_flow += amount;
        }
    }

    let transaction_count = amounts.len();
    let mut risk: u32 = 50;

    if transaction_count > 0 {
        let mean: f64 =
            amounts.iter().filter_map(|a| a.to_f64()).sum::<f64>() / transaction_count as f64;
        if mean > 0.0 {
            let variance: f64 = amounts
                .iter()
                .filter_map(|a| a.to_f64())
                .map(|a| {
                    let d = a - mean;
                    d * d
                })
                .sum::<f64>()
                / (transaction_count as f64 * mean * mean);
            if variance < config.cycle_variance_threshold {
                risk += 20;
            }
        }
    }

    if transaction_count > 2 * n {
        risk += 15;
    }
    if n >= 4 {
        risk += 10;
    }
    risk = risk.min(100);

    FraudRing {
        members,
        total_flow,
        transaction_count,
        risk_score: risk,
        cycle_length: n,
    }
}
