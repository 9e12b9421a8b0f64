use crate::graph::builder::Graph;
use crate::graph::intern::NodeId;
use std::collections::{HashMap, HashSet};

/// A strongly connected component of size >= 2 — a cluster of accounts
/// each reachable from every other, and therefore a candidate host for
/// a laundering cycle.
#[derive(Debug, Clone)]
pub struct StronglyConnectedComponent {
    pub members: Vec<NodeId>,
}

impl StronglyConnectedComponent {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// One stack frame of the iterative Tarjan traversal: the node being
/// visited and how far through its neighbor list we've gotten.
struct Frame {
    node: NodeId,
    next_neighbor: usize,
}

/// Find every strongly connected component of size >= 2, using Tarjan's
/// algorithm with an explicit work stack rather than recursion —
/// financial graphs can have long dependency chains, and call-stack
/// recursion risks overflow on the largest inputs.
///
/// Iterates starting nodes in input order (`Graph::nodes_in_order`) so
/// that output is deterministic for a given input.
pub fn find_sccs(graph: &Graph) -> Vec<StronglyConnectedComponent> {
    let mut state = TarjanState {
        counter: 0,
        indices: HashMap::new(),
        lowlink: HashMap::new(),
        on_stack: HashSet::new(),
        stack: Vec::new(),
        result: Vec::new(),
    };

    for node in graph.nodes_in_order() {
        if !state.indices.contains_key(&node) {
            run_from(node, graph, &mut state);
        }
    }

    state
        .result
        .into_iter()
        .filter(|members| members.len() >= 2)
        .map(|members| StronglyConnectedComponent { members })
        .collect()
}

struct TarjanState {
    counter: usize,
    indices: HashMap<NodeId, usize>,
    lowlink: HashMap<NodeId, usize>,
    on_stack: HashSet<NodeId>,
    stack: Vec<NodeId>,
    result: Vec<Vec<NodeId>>,
}

fn neighbors_of(graph: &Graph, node: NodeId) -> Vec<NodeId> {
    graph
        .outgoing(node)
        .iter()
        .map(|&edge_idx| {
            let receiver = &graph.edge(edge_idx).receiver_id;
            graph.interner.lookup(receiver).expect("interned receiver")
        })
        .collect()
}

fn run_from(start: NodeId, graph: &Graph, state: &mut TarjanState) {
    state.indices.insert(start, state.counter);
    state.lowlink.insert(start, state.counter);
    state.counter += 1;
    state.stack.push(start);
    state.on_stack.insert(start);

    let mut work = vec![Frame {
        node: start,
        next_neighbor: 0,
    }];
    // Cache each frame's neighbor list so we don't recompute it on every
    // resume; indexed in parallel with `work`.
    let mut neighbor_cache = vec![neighbors_of(graph, start)];

    while let Some(frame_idx) = work.len().checked_sub(1) {
        let v = work[frame_idx].node;
        let i = work[frame_idx].next_neighbor;
        let neighbors = &neighbor_cache[frame_idx];

        if i < neighbors.len() {
            let w = neighbors[i];
            work[frame_idx].next_neighbor += 1;

            if !state.indices.contains_key(&w) {
                state.indices.insert(w, state.counter);
                state.lowlink.insert(w, state.counter);
                state.counter += 1;
                state.stack.push(w);
                state.on_stack.insert(w);
                work.push(Frame {
                    node: w,
                    next_neighbor: 0,
                });
                neighbor_cache.push(neighbors_of(graph, w));
            } else if state.on_stack.contains(&w) {
                let idx_w = state.indices[&w];
                let low_v = state.lowlink[&v];
                state.lowlink.insert(v, low_v.min(idx_w));
            }
        } else {
            work.pop();
            neighbor_cache.pop();

            if let Some(parent_frame) = work.last() {
                let parent = parent_frame.node;
                let low_v = state.lowlink[&v];
                let low_p = state.lowlink[&parent];
                state.lowlink.insert(parent, low_p.min(low_v));
            }

            if state.lowlink[&v] == state.indices[&v] {
                let mut component = Vec::new();
                loop {
                    let w = state.stack.pop().expect("tarjan stack non-empty");
                    state.on_stack.remove(&w);
                    component.push(w);
                    if w == v {
                        break;
                    }
                }
                state.result.push(component);
            }
        }
    }
}
