//! Submission & confirmation
//!
//! Decodes the client-signed wire transaction, records the pending payment
//! row, sends with bounded retries, and confirms on a detached task so the
//! HTTP response never waits on confirmation latency.

use crate::domain::payment::{Payment, PaymentStatus};
use crate::domain::reconciler::PaymentReconciler;
use crate::infrastructure::payment_store::PaymentStore;
use crate::infrastructure::rpc::ChainRpc;
use crate::shared::config::SubmissionConfig;
use crate::shared::errors::SubmitError;
use crate::shared::types::{PaymentIntent, SignatureOutcome};
use crate::shared::utils::decode_wire_transaction;
use solana_sdk::signature::Signature;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

pub struct TransactionSubmitter {
    rpc: Arc<dyn ChainRpc>,
    reconciler: Arc<PaymentReconciler>,
    store: Arc<dyn PaymentStore>,
    config: SubmissionConfig,
}

impl TransactionSubmitter {
    pub fn new(
        rpc: Arc<dyn ChainRpc>,
        store: Arc<dyn PaymentStore>,
        config: SubmissionConfig,
    ) -> Self {
        Self {
            rpc,
            reconciler: Arc::new(PaymentReconciler::new(store.clone())),
            store,
            config,
        }
    }

    /// Submit a fully-signed wire transaction. Returns the signature as
    /// soon as the send is accepted; confirmation and reconciliation run on
    /// a detached task.
    pub async fn submit(
        &self,
        wire_transaction: &str,
        intent: Option<&PaymentIntent>,
    ) -> Result<Signature, SubmitError> {
        let transaction = decode_wire_transaction(wire_transaction)
            .map_err(|e| SubmitError::MalformedTransaction(e.to_string()))?;

        // Extract the signature before sending so a failing send can still
        // mark the payment failed instead of leaving it pending forever.
        let signature = *transaction
            .signatures
            .first()
            .ok_or_else(|| SubmitError::MalformedTransaction("no signatures".to_string()))?;

        if let Some(intent) = intent {
            self.store
                .upsert(Payment::new_pending(intent, signature.to_string()))
                .await
                .map_err(|e| SubmitError::Store(e.to_string()))?;
        }

        match self.rpc.send(&transaction).await {
            Ok(observed) => {
                info!("Transaction {} accepted, confirming in background", observed);
                self.spawn_confirmation(observed);
                Ok(observed)
            }
            Err(e) => {
                warn!("Send failed for {}: {}", signature, e);
                self.reconciler
                    .reconcile(&signature.to_string(), PaymentStatus::Failed, None)
                    .await;
                Err(SubmitError::SendFailed {
                    signature: Some(signature.to_string()),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Detached confirmation poll with a bounded attempt count. Errors are
    /// logged, never propagated to the submit caller.
    fn spawn_confirmation(&self, signature: Signature) {
        let rpc = self.rpc.clone();
        let reconciler = self.reconciler.clone();
        let attempts = self.config.confirm_attempts;
        let interval = Duration::from_millis(self.config.confirm_interval_ms);

        tokio::spawn(async move {
            for _ in 0..attempts {
                match rpc.signature_status(&signature).await {
                    Ok(SignatureOutcome::Confirmed) => {
                        reconciler
                            .reconcile(
                                &signature.to_string(),
                                PaymentStatus::Confirmed,
                                Some(signature.to_string()),
                            )
                            .await;
                        return;
                    }
                    Ok(SignatureOutcome::Failed(err)) => {
                        warn!("Transaction {} failed on-chain: {}", signature, err);
                        reconciler
                            .reconcile(&signature.to_string(), PaymentStatus::Failed, None)
                            .await;
                        return;
                    }
                    Ok(SignatureOutcome::Unconfirmed) => {}
                    Err(e) => {
                        error!("Status poll failed for {}: {}", signature, e);
                    }
                }
                tokio::time::sleep(interval).await;
            }
            // Leave the row pending; the expiry sweep owns stale payments.
            warn!(
                "Confirmation window exhausted for {}, leaving payment pending",
                signature
            );
        });
    }
}
