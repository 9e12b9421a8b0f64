use crate::core::account::AccountId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single, immutable transaction between two distinct accounts.
///
/// Mirrors one row of the input CSV after validation. `transaction_id`
/// is guaranteed unique across a batch by the validation stage, not by
/// this type itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub transaction_id: String,
    pub sender_id: AccountId,
    pub receiver_id: AccountId,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl Edge {
    /// Construct an edge. Panics if the invariants in the data model
    /// (positive amount, distinct endpoints) are violated — callers in
    /// this crate only ever build edges from already-validated rows.
    pub fn new(
        transaction_id: impl Into<String>,
        sender_id: AccountId,
        receiver_id: AccountId,
        amount: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        assert!(amount > Decimal::ZERO, "edge amount must be positive");
        assert_ne!(sender_id, receiver_id, "self-loops are not valid edges");
        Self {
            transaction_id: transaction_id.into(),
            sender_id,
            receiver_id,
            amount,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    #[should_panic(expected = "positive")]
    fn rejects_non_positive_amount() {
        Edge::new(
            "T1",
            AccountId::new("A"),
            AccountId::new("B"),
            dec!(0),
            ts(),
        );
    }

    #[test]
    #[should_panic(expected = "self-loop")]
    fn rejects_self_loop() {
        Edge::new(
            "T1",
            AccountId::new("A"),
            AccountId::new("A"),
            dec!(10),
            ts(),
        );
    }
}
