use crate::graph::builder::Graph;
use crate::graph::cycle_detection::FraudRing;
use crate::scoring::scorer::ScoredAccount;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuspiciousAccount {
    pub account_id: String,
    pub suspicion_score: u32,
    pub flags: Vec<String>,
    pub connected_rings: Vec<String>,
    pub in_degree: usize,
    pub out_degree: usize,
    pub total_sent: Decimal,
    pub total_received: Decimal,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudRingOutput {
    pub ring_id: String,
    pub member_accounts: Vec<String>,
    pub total_flow: Decimal,
    pub transaction_count: usize,
    pub risk_score: u32,
    pub cycle_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub total_nodes: usize,
    pub total_transactions: usize,
    pub suspicious_accounts_flagged: usize,
    pub fraud_rings_detected: usize,
    pub total_flagged_volume: Decimal,
    pub processing_time_seconds: f64,
    pub analysis_timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeEcho {
    pub transaction_id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEcho {
    pub nodes: Vec<String>,
    pub edges: Vec<EdgeEcho>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResult {
    pub suspicious_accounts: Vec<SuspiciousAccount>,
    pub fraud_rings: Vec<FraudRingOutput>,
    pub summary: Summary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph_data: Option<GraphEcho>,
}

/// Shape detector outputs into the public response object. Ring
/// identifiers are stable: the i-th ring in the (already risk-sorted)
/// list carries `RING_{i:03}`.
pub fn build_output(
    graph: &Graph,
    mut scored: Vec<ScoredAccount>,
    rings: &[FraudRing],
    processing_time_seconds: f64,
    include_graph: bool,
) -> DetectionResult {
    scored.sort_by(|a, b| b.score.cmp(&a.score));

    let ring_ids: Vec<String> = (0..rings.len()).map(|i| format!("RING_{i:03}")).collect();

    let suspicious_accounts: Vec<SuspiciousAccount> = scored
        .iter()
        .map(|account| {
            let stats = &graph.stats[&account.node];
            SuspiciousAccount {
                account_id: graph.interner.resolve(account.node).to_string(),
                suspicion_score: account.score,
                flags: account.flags.iter().map(|f| f.as_str().to_string()).collect(),
                connected_rings: account
                    .connected_rings
                    .iter()
                    .map(|&i| ring_ids[i].clone())
                    .collect(),
                in_degree: stats.in_degree,
                out_degree: stats.out_degree,
                total_sent: stats.total_sent,
                total_received: stats.total_received,
                transaction_count: stats.transaction_count(),
            }
        })
        .collect();

    let fraud_rings: Vec<FraudRingOutput> = rings
        .iter()
        .enumerate()
        .map(|(i, ring)| FraudRingOutput {
            ring_id: ring_ids[i].clone(),
            member_accounts: ring
                .members
                .iter()
                .map(|&n| graph.interner.resolve(n).to_string())
                .collect(),
            total_flow: ring.total_flow,
            transaction_count: ring.transaction_count,
            risk_score: ring.risk_score,
            cycle_length: ring.cycle_length,
        })
        .collect();

    let total_flagged_volume: Decimal = scored
        .iter()
        .map(|account| {
            let stats = &graph.stats[&account.node];
            stats.total_sent + stats.total_received
        })
        .sum();

    let graph_data = include_graph.then(|| GraphEcho {
        nodes: graph
            .nodes_in_order()
            .map(|n| graph.interner.resolve(n).to_string())
            .collect(),
        edges: graph
            .edges
            .iter()
            .map(|e| EdgeEcho {
                transaction_id: e.transaction_id.clone(),
                sender_id: e.sender_id.to_string(),
                receiver_id: e.receiver_id.to_string(),
                amount: e.amount,
                timestamp: e.timestamp,
            })
            .collect(),
    });

    DetectionResult {
        suspicious_accounts,
        fraud_rings,
        summary: Summary {
            total_nodes: graph.node_count(),
            total_transactions: graph.transaction_count(),
            suspicious_accounts_flagged: suspicious_accounts_count(&scored),
            fraud_rings_detected: rings.len(),
            total_flagged_volume,
            processing_time_seconds,
            analysis_timestamp: Utc::now(),
        },
        graph_data,
    }
}

fn suspicious_accounts_count(scored: &[ScoredAccount]) -> usize {
    scored.len()
}
