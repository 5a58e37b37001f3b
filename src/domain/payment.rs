//! Payment ledger entity and its status state machine

use crate::shared::types::PaymentIntent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payment lifecycle states.
///
/// `(none) -> Pending -> { Confirmed | Failed }` terminal. `Expired` is
/// written only by the out-of-band sweep over stale pending rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Confirmed,
    Failed,
    Expired,
}

impl PaymentStatus {
    /// Terminal states never transition again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

/// Persisted payment row, keyed by the unique transaction signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub user_id: String,
    pub course_id: String,
    pub amount: u64,
    pub currency: String,
    pub signature: String,
    pub status: PaymentStatus,
    pub transaction_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Create a pending row at submission time; the signature is known
    /// before confirmation.
    pub fn new_pending(intent: &PaymentIntent, signature: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: intent.user_id.clone(),
            course_id: intent.course_id.clone(),
            amount: intent.amount,
            currency: intent.currency.clone(),
            signature,
            status: PaymentStatus::Pending,
            transaction_hash: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_pending_is_non_terminal() {
        assert!(!PaymentStatus::Pending.is_terminal());
        assert!(PaymentStatus::Confirmed.is_terminal());
        assert!(PaymentStatus::Failed.is_terminal());
        assert!(PaymentStatus::Expired.is_terminal());
    }

    #[test]
    fn test_new_pending_row() {
        let intent = PaymentIntent {
            user_id: "user-1".to_string(),
            course_id: "course-1".to_string(),
            amount: 5_000_000,
            currency: "USDC".to_string(),
        };
        let payment = Payment::new_pending(&intent, "sig".to_string());
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.signature, "sig");
        assert!(payment.transaction_hash.is_none());
    }
}
