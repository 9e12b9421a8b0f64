use chrono::{DateTime, TimeZone, Utc};
use laundering_detector::core::account::AccountId;
use laundering_detector::core::config::DetectionConfig;
use laundering_detector::core::edge::Edge;
use laundering_detector::graph::builder::Graph;
use laundering_detector::graph::cycle_detection::detect_cycles;
use laundering_detector::graph::shell::detect_shell_accounts;
use laundering_detector::graph::smurfing::detect_smurfing;
use laundering_detector::scoring::guard::filter_false_positives;
use laundering_detector::scoring::scorer::score_accounts;
use proptest::prelude::*;
use rust_decimal::Decimal;

/// A small pool of account names, to keep cycle/fan-out probability high
/// in randomly generated batches.
fn arb_account() -> impl Strategy<Value = AccountId> {
    prop::sample::select(vec!["A", "B", "C", "D", "E", "F"]).prop_map(AccountId::new)
}

fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1u64..50_000u64).prop_map(Decimal::from)
}

fn base_ts() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// A random edge with distinct endpoints, offset `hours` from a fixed
/// base timestamp.
fn arb_edge(id: usize) -> impl Strategy<Value = Option<Edge>> {
    (arb_account(), arb_account(), arb_amount(), 0i64..500).prop_map(
        move |(sender, receiver, amount, hours)| {
            if sender == receiver {
                None
            } else {
                Some(Edge::new(
                    format!("T{id}"),
                    sender,
                    receiver,
                    amount,
                    base_ts() + chrono::Duration::hours(hours),
                ))
            }
        },
    )
}

fn arb_edges() -> impl Strategy<Value = Vec<Edge>> {
    (1usize..40).prop_flat_map(|n| {
        (0..n)
            .map(arb_edge)
            .collect::<Vec<_>>()
            .prop_map(|edges| edges.into_iter().flatten().collect())
    })
}

proptest! {
    // ===================================================================
    // INVARIANT 1: Every suspicion score is clamped to [0, 100].
    // ===================================================================
    #[test]
    fn scores_stay_in_bounds(edges in arb_edges()) {
        let graph = Graph::build(edges);
        let config = DetectionConfig::default();
        let rings = detect_cycles(&graph, &config);
        let smurfing = detect_smurfing(&graph, &config);
        let shell = detect_shell_accounts(&graph, &config);
        let scored = score_accounts(&graph, &rings, &smurfing, &shell, &config);
        for account in &scored {
            prop_assert!(account.score <= 100);
        }
    }

    // ===================================================================
    // INVARIANT 2: Every ring risk score is clamped to [0, 100] and its
    // cycle length falls within the configured bounds.
    // ===================================================================
    #[test]
    fn ring_risk_and_length_stay_in_bounds(edges in arb_edges()) {
        let graph = Graph::build(edges);
        let config = DetectionConfig::default();
        let rings = detect_cycles(&graph, &config);
        for ring in &rings {
            prop_assert!(ring.risk_score <= 100);
            prop_assert!(ring.cycle_length >= config.min_cycle_length);
            prop_assert!(ring.cycle_length <= config.max_cycle_length);
        }
    }

    // ===================================================================
    // INVARIANT 3: The false-positive guard only ever removes accounts;
    // it never adds one, and never changes a surviving account's score.
    // ===================================================================
    #[test]
    fn guard_is_a_subset_with_unchanged_scores(edges in arb_edges()) {
        let graph = Graph::build(edges);
        let config = DetectionConfig::default();
        let rings = detect_cycles(&graph, &config);
        let smurfing = detect_smurfing(&graph, &config);
        let shell = detect_shell_accounts(&graph, &config);
        let scored = score_accounts(&graph, &rings, &smurfing, &shell, &config);
        let before: std::collections::HashMap<_, _> =
            scored.iter().map(|a| (a.node, a.score)).collect();
        let retained = filter_false_positives(scored, &graph, &config);
        prop_assert!(retained.len() <= before.len());
        for account in &retained {
            prop_assert_eq!(before[&account.node], account.score);
        }
    }

    // ===================================================================
    // INVARIANT 4: Cycle detection is deterministic — running it twice
    // over the same graph yields the same rings in the same order.
    // ===================================================================
    #[test]
    fn cycle_detection_is_deterministic(edges in arb_edges()) {
        let graph = Graph::build(edges);
        let config = DetectionConfig::default();
        let first = detect_cycles(&graph, &config);
        let second = detect_cycles(&graph, &config);
        prop_assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            prop_assert_eq!(&a.members, &b.members);
            prop_assert_eq!(a.risk_score, b.risk_score);
        }
    }

    // ===================================================================
    // INVARIANT 5: A ring's total flow equals the sum of the amounts on
    // the edges directly connecting its consecutive members.
    // ===================================================================
    #[test]
    fn ring_total_flow_matches_member_edges(edges in arb_edges()) {
        let graph = Graph::build(edges);
        let config = DetectionConfig::default();
        let rings = detect_cycles(&graph, &config);
        for ring in &rings {
            let n = ring.members.len();
            let mut expected = Decimal::ZERO;
            for i in 0..n {
                let from = ring.members[i];
                let to = ring.members[(i + 1) % n];
                for &idx in graph.edges_between(from, to) {
                    expected += graph.edge(idx).amount;
                }
            }
            prop_assert_eq!(expected, ring.total_flow);
        }
    }

    // ===================================================================
    // INVARIANT 6: Every node referenced anywhere in the detector output
    // (rings, smurfing, shell) is an actual node of the source graph.
    // ===================================================================
    #[test]
    fn detector_outputs_only_reference_real_nodes(edges in arb_edges()) {
        let graph = Graph::build(edges);
        let config = DetectionConfig::default();
        let node_count = graph.node_count() as u32;
        let rings = detect_cycles(&graph, &config);
        let smurfing = detect_smurfing(&graph, &config);
        let shell = detect_shell_accounts(&graph, &config);

        for ring in &rings {
            for member in &ring.members {
                prop_assert!(member.0 < node_count);
            }
        }
        for node in smurfing.iter().chain(shell.iter()) {
            prop_assert!(node.0 < node_count);
        }
    }
}
