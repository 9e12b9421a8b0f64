use crate::core::config::DetectionConfig;
use crate::core::edge::Edge;
use crate::graph::builder::Graph;
use crate::graph::intern::NodeId;
use chrono::Duration;
use std::collections::HashSet;

/// Flag accounts exhibiting dense, below-threshold fan-in or fan-out
/// inside a rolling time window — the structuring ("smurfing") pattern.
///
/// Returns the union of fan-in-flagged and fan-out-flagged accounts;
/// the scorer (not this function) is responsible for deciding which of
/// the two weights apply to a given flagged account, since a node can
/// independently qualify on both sides.
pub fn detect_smurfing(graph: &Graph, config: &DetectionConfig) -> HashSet<NodeId> {
    let mut flagged = HashSet::new();

    for node in graph.nodes_in_order() {
        let stats = match graph.stats.get(&node) {
            Some(s) => s,
            None => continue,
        };

        if stats.out_degree >= config.min_fan_degree
            && has_smurfing_window(graph.outgoing(node), graph, config)
        {
            flagged.insert(node);
        }
        if stats.in_degree >= config.min_fan_degree
            && has_smurfing_window(graph.incoming(node), graph, config)
        {
            flagged.insert(node);
        }
    }

    flagged
}

fn has_smurfing_window(edge_indices: &[usize], graph: &Graph, config: &DetectionConfig) -> bool {
    let mut edges: Vec<&Edge> = edge_indices.iter().map(|&i| graph.edge(i)).collect();
    edges.sort_by_key(|e| e.timestamp);

    let window = Duration::hours(config.time_window_hours);
    for i in 0..edges.len() {
        let window_end = edges[i].timestamp + window;
        let in_window: Vec<&&Edge> = edges[i..]
            .iter()
            .take_while(|e| e.timestamp <= window_end)
            .collect();

        if in_window.len() >= config.min_fan_degree {
            let below = in_window
                .iter()
                .filter(|e| e.amount < config.smurfing_threshold)
                .count();
            if below as f64 >= config.below_threshold_ratio * in_window.len() as f64 {
                return true;
            }
        }
    }
    false
}
