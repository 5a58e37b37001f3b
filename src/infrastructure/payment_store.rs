//! Payment persistence seam
//!
//! The pipeline only ever upserts by unique signature and updates by the
//! same key; no ad-hoc queries. The in-memory implementation ships as the
//! default backend and doubles as the test store; a row-store backend plugs
//! in behind the same trait.

use crate::domain::payment::{Payment, PaymentStatus};
use crate::shared::errors::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Result of an update-by-signature call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    /// The row is already in a terminal state; the write was ignored.
    AlreadyTerminal,
    /// No row matches the signature. Validation may race ahead of row
    /// creation in some call paths, so this is expected, not an error.
    NotFound,
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Insert or replace the row keyed by `payment.signature`.
    async fn upsert(&self, payment: Payment) -> Result<(), AppError>;

    /// Update status (and optionally transaction hash) by signature.
    /// Terminal rows are never modified.
    async fn update_status(
        &self,
        signature: &str,
        status: PaymentStatus,
        transaction_hash: Option<String>,
    ) -> Result<UpdateOutcome, AppError>;

    async fn find_by_signature(&self, signature: &str) -> Result<Option<Payment>, AppError>;

    /// Sweep pending rows created before the cutoff to Expired; returns the
    /// number of rows swept.
    async fn expire_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, AppError>;
}

/// In-memory payment store keyed by signature
#[derive(Default)]
pub struct InMemoryPaymentStore {
    rows: RwLock<HashMap<String, Payment>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn upsert(&self, payment: Payment) -> Result<(), AppError> {
        let mut rows = self.rows.write().await;
        rows.insert(payment.signature.clone(), payment);
        Ok(())
    }

    async fn update_status(
        &self,
        signature: &str,
        status: PaymentStatus,
        transaction_hash: Option<String>,
    ) -> Result<UpdateOutcome, AppError> {
        let mut rows = self.rows.write().await;
        let Some(payment) = rows.get_mut(signature) else {
            return Ok(UpdateOutcome::NotFound);
        };
        if payment.status.is_terminal() {
            return Ok(UpdateOutcome::AlreadyTerminal);
        }
        payment.status = status;
        if transaction_hash.is_some() {
            payment.transaction_hash = transaction_hash;
        }
        payment.updated_at = Utc::now();
        Ok(UpdateOutcome::Updated)
    }

    async fn find_by_signature(&self, signature: &str) -> Result<Option<Payment>, AppError> {
        let rows = self.rows.read().await;
        Ok(rows.get(signature).cloned())
    }

    async fn expire_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, AppError> {
        let mut rows = self.rows.write().await;
        let mut swept = 0;
        for payment in rows.values_mut() {
            if payment.status == PaymentStatus::Pending && payment.created_at < cutoff {
                payment.status = PaymentStatus::Expired;
                payment.updated_at = Utc::now();
                swept += 1;
            }
        }
        Ok(swept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::types::PaymentIntent;
    use chrono::Duration;

    fn intent() -> PaymentIntent {
        PaymentIntent {
            user_id: "user-1".to_string(),
            course_id: "course-1".to_string(),
            amount: 10_000_000,
            currency: "USDC".to_string(),
        }
    }

    #[tokio::test]
    async fn test_update_missing_row_is_not_found() {
        let store = InMemoryPaymentStore::new();
        let outcome = store
            .update_status("nope", PaymentStatus::Confirmed, None)
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_terminal_rows_are_immutable() {
        let store = InMemoryPaymentStore::new();
        store
            .upsert(Payment::new_pending(&intent(), "sig-1".to_string()))
            .await
            .unwrap();

        let outcome = store
            .update_status("sig-1", PaymentStatus::Confirmed, Some("hash".to_string()))
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::Updated);

        // Any later write, in-order or duplicate, is absorbed.
        for status in [
            PaymentStatus::Failed,
            PaymentStatus::Pending,
            PaymentStatus::Confirmed,
            PaymentStatus::Expired,
        ] {
            let outcome = store
                .update_status("sig-1", status, None)
                .await
                .unwrap();
            assert_eq!(outcome, UpdateOutcome::AlreadyTerminal);
        }

        let row = store.find_by_signature("sig-1").await.unwrap().unwrap();
        assert_eq!(row.status, PaymentStatus::Confirmed);
        assert_eq!(row.transaction_hash.as_deref(), Some("hash"));
    }

    #[tokio::test]
    async fn test_expiry_sweep_only_touches_stale_pending() {
        let store = InMemoryPaymentStore::new();

        let mut stale = Payment::new_pending(&intent(), "stale".to_string());
        stale.created_at = Utc::now() - Duration::hours(2);
        store.upsert(stale).await.unwrap();

        store
            .upsert(Payment::new_pending(&intent(), "fresh".to_string()))
            .await
            .unwrap();

        let mut done = Payment::new_pending(&intent(), "done".to_string());
        done.created_at = Utc::now() - Duration::hours(2);
        store.upsert(done).await.unwrap();
        store
            .update_status("done", PaymentStatus::Confirmed, None)
            .await
            .unwrap();

        let swept = store
            .expire_older_than(Utc::now() - Duration::minutes(30))
            .await
            .unwrap();
        assert_eq!(swept, 1);

        let stale = store.find_by_signature("stale").await.unwrap().unwrap();
        assert_eq!(stale.status, PaymentStatus::Expired);
        let fresh = store.find_by_signature("fresh").await.unwrap().unwrap();
        assert_eq!(fresh.status, PaymentStatus::Pending);
        let done = store.find_by_signature("done").await.unwrap().unwrap();
        assert_eq!(done.status, PaymentStatus::Confirmed);
    }
}
