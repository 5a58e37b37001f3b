//! Payment reconciler - maps a transaction signature to the persisted
//! payment row and records the on-chain outcome.

use crate::domain::payment::PaymentStatus;
use crate::infrastructure::payment_store::{PaymentStore, UpdateOutcome};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct PaymentReconciler {
    store: Arc<dyn PaymentStore>,
}

impl PaymentReconciler {
    pub fn new(store: Arc<dyn PaymentStore>) -> Self {
        Self { store }
    }

    /// Record an outcome for the payment keyed by `signature`.
    ///
    /// A missing row is a no-op: validation can race ahead of row creation
    /// in some call paths, and that gap is accepted rather than treated as
    /// an error. Terminal rows are never rewritten.
    pub async fn reconcile(
        &self,
        signature: &str,
        status: PaymentStatus,
        transaction_hash: Option<String>,
    ) {
        match self
            .store
            .update_status(signature, status, transaction_hash)
            .await
        {
            Ok(UpdateOutcome::Updated) => {
                info!("Payment {} reconciled to {:?}", signature, status);
            }
            Ok(UpdateOutcome::AlreadyTerminal) => {
                debug!("Payment {} already terminal, ignoring {:?}", signature, status);
            }
            Ok(UpdateOutcome::NotFound) => {
                debug!("No payment row for {}, nothing to reconcile", signature);
            }
            Err(e) => {
                // Reconciliation is best-effort; the out-of-band sweep will
                // catch rows left pending.
                warn!("Reconciliation write failed for {}: {}", signature, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::Payment;
    use crate::infrastructure::payment_store::InMemoryPaymentStore;
    use crate::shared::types::PaymentIntent;

    fn intent() -> PaymentIntent {
        PaymentIntent {
            user_id: "user-1".to_string(),
            course_id: "course-1".to_string(),
            amount: 1_000,
            currency: "USDC".to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_row_is_a_noop() {
        let store = Arc::new(InMemoryPaymentStore::new());
        let reconciler = PaymentReconciler::new(store.clone());
        // Must not panic or create a row.
        reconciler
            .reconcile("ghost", PaymentStatus::Confirmed, None)
            .await;
        assert!(store.find_by_signature("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_out_of_order_and_duplicate_delivery() {
        let store = Arc::new(InMemoryPaymentStore::new());
        store
            .upsert(Payment::new_pending(&intent(), "sig".to_string()))
            .await
            .unwrap();
        let reconciler = PaymentReconciler::new(store.clone());

        reconciler
            .reconcile("sig", PaymentStatus::Failed, None)
            .await;
        // Late or duplicate confirmations must not resurrect the row.
        reconciler
            .reconcile("sig", PaymentStatus::Confirmed, Some("hash".to_string()))
            .await;
        reconciler
            .reconcile("sig", PaymentStatus::Failed, None)
            .await;

        let row = store.find_by_signature("sig").await.unwrap().unwrap();
        assert_eq!(row.status, PaymentStatus::Failed);
        assert!(row.transaction_hash.is_none());
    }
}
