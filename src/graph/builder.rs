use crate::core::edge::Edge;
use crate::graph::intern::{Interner, NodeId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};

/// Per-account aggregates derived while building the graph.
#[derive(Debug, Clone)]
pub struct NodeStats {
    pub total_sent: Decimal,
    pub total_received: Decimal,
    pub in_degree: usize,
    pub out_degree: usize,
    pub unique_senders: HashSet<NodeId>,
    pub unique_receivers: HashSet<NodeId>,
    pub first_tx: DateTime<Utc>,
    pub last_tx: DateTime<Utc>,
}

impl NodeStats {
    fn new(ts: DateTime<Utc>) -> Self {
        Self {
            total_sent: Decimal::ZERO,
            total_received: Decimal::ZERO,
            in_degree: 0,
            out_degree: 0,
            unique_senders: HashSet::new(),
            unique_receivers: HashSet::new(),
            first_tx: ts,
            last_tx: ts,
        }
    }

    pub fn transaction_count(&self) -> usize {
        self.in_degree + self.out_degree
    }

    fn touch(&mut self, ts: DateTime<Utc>) {
        if ts < self.first_tx {
            self.first_tx = ts;
        }
        if ts > self.last_tx {
            self.last_tx = ts;
        }
    }
}

/// The directed multigraph of accounts, the only structure shared
/// across every downstream detection stage.
///
/// Built in a single linear pass over a validated edge list. Nothing
/// about a `Graph` is mutated once construction finishes; every
/// detector stage below holds only shared references into it.
#[derive(Debug, Clone)]
pub struct Graph {
    pub interner: Interner,
    /// All edges in input order. Index into this vector is the stable
    /// "edge id" used by `adjacency` / `reverse_adjacency` / `edge_index`.
    pub edges: Vec<Edge>,
    /// sender -> outgoing edge indices, insertion order.
    pub adjacency: HashMap<NodeId, Vec<usize>>,
    /// receiver -> incoming edge indices, insertion order.
    pub reverse_adjacency: HashMap<NodeId, Vec<usize>>,
    /// (sender, receiver) -> edge indices between that ordered pair.
    pub edge_index: HashMap<(NodeId, NodeId), Vec<usize>>,
    pub stats: HashMap<NodeId, NodeStats>,
}

impl Graph {
    /// Build the graph from an already-validated edge list (see
    /// `io::validation`). The builder itself has no failure mode beyond
    /// what `debug_assert` catches in development; a truly empty edge
    /// list is rejected upstream by validation, not here.
    pub fn build(edges: Vec<Edge>) -> Self {
        let mut interner = Interner::new();
        let mut adjacency: HashMap<NodeId, Vec<usize>> = HashMap::new();
        let mut reverse_adjacency: HashMap<NodeId, Vec<usize>> = HashMap::new();
        let mut edge_index: HashMap<(NodeId, NodeId), Vec<usize>> = HashMap::new();
        let mut stats: HashMap<NodeId, NodeStats> = HashMap::new();

        for (i, edge) in edges.iter().enumerate() {
            let sender = interner.intern(edge.sender_id.clone());
            let receiver = interner.intern(edge.receiver_id.clone());

            adjacency.entry(sender).or_default().push(i);
            reverse_adjacency.entry(receiver).or_default().push(i);
            edge_index.entry((sender, receiver)).or_default().push(i);

            let sender_stats = stats
                .entry(sender)
                .or_insert_with(|| NodeStats::new(edge.timestamp));
            sender_stats.total_sent += edge.amount;
            sender_stats.out_degree += 1;
            sender_stats.unique_receivers.insert(receiver);
            sender_stats.touch(edge.timestamp);

            let receiver_stats = stats
                .entry(receiver)
                .or_insert_with(|| NodeStats::new(edge.timestamp));
            receiver_stats.total_received += edge.amount;
            receiver_stats.in_degree += 1;
            receiver_stats.unique_senders.insert(sender);
            receiver_stats.touch(edge.timestamp);
        }

        Self {
            interner,
            edges,
            adjacency,
            reverse_adjacency,
            edge_index,
            stats,
        }
    }

    /// All nodes, in first-seen (input) order — the iteration order
    /// every downstream stage must use for determinism.
    pub fn nodes_in_order(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.interner.len() as u32).map(NodeId)
    }

    pub fn outgoing(&self, node: NodeId) -> &[usize] {
        self.adjacency.get(&node).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn incoming(&self, node: NodeId) -> &[usize] {
        self.reverse_adjacency
            .get(&node)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn edges_between(&self, from: NodeId, to: NodeId) -> &[usize] {
        self.edge_index
            .get(&(from, to))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn edge(&self, idx: usize) -> &Edge {
        &self.edges[idx]
    }

    pub fn node_count(&self) -> usize {
        self.interner.len()
    }

    pub fn transaction_count(&self) -> usize {
        self.edges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::account::AccountId;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn ts(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap()
    }

    #[test]
    fn single_pass_builds_adjacency_and_stats() {
        let edges = vec![
            Edge::new("T1", AccountId::new("A"), AccountId::new("B"), dec!(100), ts(0)),
            Edge::new("T2", AccountId::new("B"), AccountId::new("C"), dec!(50), ts(1)),
        ];
        let graph = Graph::build(edges);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.transaction_count(), 2);

        let a = graph.interner.lookup(&AccountId::new("A")).unwrap();
        let b = graph.interner.lookup(&AccountId::new("B")).unwrap();
        assert_eq!(graph.outgoing(a).len(), 1);
        assert_eq!(graph.incoming(b).len(), 1);
        assert_eq!(graph.stats[&a].out_degree, 1);
        assert_eq!(graph.stats[&b].in_degree, 1);
        assert_eq!(graph.stats[&b].out_degree, 1);
    }

    #[test]
    fn multi_edge_pairs_retain_every_edge() {
        let edges = vec![
            Edge::new("T1", AccountId::new("A"), AccountId::new("B"), dec!(100), ts(0)),
            Edge::new("T2", AccountId::new("A"), AccountId::new("B"), dec!(50), ts(1)),
        ];
        let graph = Graph::build(edges);
        let a = graph.interner.lookup(&AccountId::new("A")).unwrap();
        let b = graph.interner.lookup(&AccountId::new("B")).unwrap();
        assert_eq!(graph.edges_between(a, b).len(), 2);
        assert_eq!(graph.stats[&a].total_sent, dec!(150));
    }

    #[test]
    fn first_and_last_tx_are_monotonic() {
        let edges = vec![
            Edge::new("T1", AccountId::new("A"), AccountId::new("B"), dec!(10), ts(5)),
            Edge::new("T2", AccountId::new("A"), AccountId::new("C"), dec!(10), ts(1)),
            Edge::new("T3", AccountId::new("A"), AccountId::new("D"), dec!(10), ts(9)),
        ];
        let graph = Graph::build(edges);
        let a = graph.interner.lookup(&AccountId::new("A")).unwrap();
        assert_eq!(graph.stats[&a].first_tx, ts(1));
        assert_eq!(graph.stats[&a].last_tx, ts(9));
    }
}
