//! Payment pipeline service - the API exposed upward to the web layer

use crate::domain::{
    ComputeBudgetPreparer, HoldingsReader, InstructionBuilder, TransactionAssembler,
    TransactionSubmitter,
};
use crate::infrastructure::fee_estimator::PriorityFeeEstimator;
use crate::infrastructure::payment_store::PaymentStore;
use crate::infrastructure::price_api::PriceApi;
use crate::infrastructure::rpc::ChainRpc;
use crate::infrastructure::swap_api::SwapApi;
use crate::shared::config::ServiceConfig;
use crate::shared::errors::AppError;
use crate::shared::types::{
    PaymentIntent, PricedTokenHolding, PriorityLevel, TransactionRequest,
};
use chrono::{Duration, Utc};
use solana_sdk::{pubkey::Pubkey, signature::Signature};
use std::sync::Arc;
use tracing::info;

/// Orchestrates build -> prepare -> assemble, submission, and the holdings
/// read path. All collaborators are injected; there are no module-level
/// singletons.
pub struct PaymentService {
    builder: InstructionBuilder,
    preparer: ComputeBudgetPreparer,
    assembler: TransactionAssembler,
    submitter: TransactionSubmitter,
    holdings: HoldingsReader,
    store: Arc<dyn PaymentStore>,
    config: ServiceConfig,
}

impl PaymentService {
    pub fn new(
        rpc: Arc<dyn ChainRpc>,
        fee_estimator: Arc<dyn PriorityFeeEstimator>,
        swap_api: Arc<dyn SwapApi>,
        price_api: Arc<dyn PriceApi>,
        store: Arc<dyn PaymentStore>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            builder: InstructionBuilder::new(rpc.clone(), swap_api),
            preparer: ComputeBudgetPreparer::new(rpc.clone(), fee_estimator),
            assembler: TransactionAssembler::new(rpc.clone()),
            submitter: TransactionSubmitter::new(rpc.clone(), store.clone(), config.submission.clone()),
            holdings: HoldingsReader::new(rpc, price_api),
            store,
            config,
        }
    }

    /// Build, fee-prioritize and assemble an unsigned wire transaction for
    /// the client to sign.
    pub async fn build_transaction(
        &self,
        request: &TransactionRequest,
        priority_level: Option<PriorityLevel>,
    ) -> Result<String, AppError> {
        let payer = *request.signer();
        let built = self.builder.build(request).await?;
        let prepared = self
            .preparer
            .prepare(&built.instructions, &payer, priority_level)
            .await;
        let wire = self
            .assembler
            .assemble(&prepared, &built.lookup_tables, &payer)
            .await?;
        info!("Built wire transaction with {} instructions", prepared.len());
        Ok(wire)
    }

    /// Submit a client-signed wire transaction; returns the signature
    /// immediately while confirmation proceeds detached.
    pub async fn submit_transaction(
        &self,
        wire_transaction: &str,
        intent: Option<&PaymentIntent>,
    ) -> Result<Signature, AppError> {
        Ok(self.submitter.submit(wire_transaction, intent).await?)
    }

    /// Priced holdings for a wallet (read path, shares only the RPC).
    pub async fn list_holdings(&self, owner: &Pubkey) -> Result<Vec<PricedTokenHolding>, AppError> {
        self.holdings.list_holdings(owner).await
    }

    /// Sweep pending payments older than the configured expiry window.
    pub async fn expire_stale_payments(&self) -> Result<usize, AppError> {
        let cutoff = Utc::now() - Duration::minutes(self.config.payments.expiry_minutes);
        let swept = self.store.expire_older_than(cutoff).await?;
        if swept > 0 {
            info!("Expired {} stale pending payments", swept);
        }
        Ok(swept)
    }
}
