//! Single authenticated transport to the chain node.
//!
//! Every other component talks to the chain through the [`ChainRpc`] trait
//! so unit tests can substitute a deterministic fake.

use crate::shared::errors::AppError;
use crate::shared::types::{OwnedTokenAccount, SignatureOutcome, SimulationStats};
use async_trait::async_trait;
use solana_account_decoder::UiAccountData;
use solana_client::{
    nonblocking::rpc_client::RpcClient,
    rpc_config::{RpcSendTransactionConfig, RpcSimulateTransactionConfig},
    rpc_request::TokenAccountsFilter,
};
use solana_sdk::{
    commitment_config::{CommitmentConfig, CommitmentLevel},
    hash::Hash,
    pubkey::Pubkey,
    signature::Signature,
    transaction::VersionedTransaction,
};
use std::str::FromStr;
use std::time::Duration;

/// Chain access seam used by the builder, preparer, assembler, submitter
/// and holdings reader.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    async fn latest_blockhash(&self) -> Result<Hash, AppError>;

    async fn account_exists(&self, address: &Pubkey) -> Result<bool, AppError>;

    /// Raw account data for a batch of addresses; None for missing accounts.
    async fn get_multiple_account_data(
        &self,
        addresses: &[Pubkey],
    ) -> Result<Vec<Option<Vec<u8>>>, AppError>;

    async fn token_accounts_by_owner(
        &self,
        owner: &Pubkey,
    ) -> Result<Vec<OwnedTokenAccount>, AppError>;

    async fn lamport_balance(&self, address: &Pubkey) -> Result<u64, AppError>;

    /// Simulate with signature verification disabled; the transaction may
    /// carry a placeholder blockhash and empty signatures.
    async fn simulate(&self, tx: &VersionedTransaction) -> Result<SimulationStats, AppError>;

    async fn send(&self, tx: &VersionedTransaction) -> Result<Signature, AppError>;

    async fn signature_status(&self, signature: &Signature) -> Result<SignatureOutcome, AppError>;
}

/// JSON-RPC gateway over the configured node endpoint
pub struct RpcGateway {
    client: RpcClient,
    commitment: CommitmentConfig,
    max_send_retries: usize,
}

impl RpcGateway {
    pub fn new(rpc_url: String, timeout_ms: u64, max_send_retries: usize) -> Self {
        let commitment = CommitmentConfig::confirmed();
        Self {
            client: RpcClient::new_with_timeout_and_commitment(
                rpc_url,
                Duration::from_millis(timeout_ms),
                commitment,
            ),
            commitment,
            max_send_retries,
        }
    }
}

#[async_trait]
impl ChainRpc for RpcGateway {
    async fn latest_blockhash(&self) -> Result<Hash, AppError> {
        self.client
            .get_latest_blockhash()
            .await
            .map_err(|e| AppError::RpcError(format!("Failed to get latest blockhash: {}", e)))
    }

    async fn account_exists(&self, address: &Pubkey) -> Result<bool, AppError> {
        let response = self
            .client
            .get_account_with_commitment(address, self.commitment)
            .await
            .map_err(|e| AppError::RpcError(format!("Failed to get account {}: {}", address, e)))?;
        Ok(response.value.is_some())
    }

    async fn get_multiple_account_data(
        &self,
        addresses: &[Pubkey],
    ) -> Result<Vec<Option<Vec<u8>>>, AppError> {
        let accounts = self
            .client
            .get_multiple_accounts(addresses)
            .await
            .map_err(|e| AppError::RpcError(format!("Failed to get multiple accounts: {}", e)))?;
        Ok(accounts
            .into_iter()
            .map(|opt| opt.map(|acc| acc.data))
            .collect())
    }

    async fn token_accounts_by_owner(
        &self,
        owner: &Pubkey,
    ) -> Result<Vec<OwnedTokenAccount>, AppError> {
        let keyed_accounts = self
            .client
            .get_token_accounts_by_owner(owner, TokenAccountsFilter::ProgramId(spl_token::id()))
            .await
            .map_err(|e| AppError::RpcError(format!("Failed to get token accounts: {}", e)))?;

        let mut result = Vec::with_capacity(keyed_accounts.len());
        for keyed in keyed_accounts {
            let UiAccountData::Json(parsed) = &keyed.account.data else {
                continue;
            };
            let info = &parsed.parsed["info"];
            let Some(mint) = info["mint"].as_str().and_then(|m| Pubkey::from_str(m).ok()) else {
                continue;
            };
            let amount = info["tokenAmount"]["amount"]
                .as_str()
                .and_then(|a| a.parse::<u64>().ok())
                .unwrap_or(0);
            let decimals = info["tokenAmount"]["decimals"].as_u64().unwrap_or(0) as u8;
            let Ok(token_account) = Pubkey::from_str(&keyed.pubkey) else {
                continue;
            };
            result.push(OwnedTokenAccount {
                token_account,
                mint,
                amount,
                decimals,
            });
        }
        Ok(result)
    }

    async fn lamport_balance(&self, address: &Pubkey) -> Result<u64, AppError> {
        self.client
            .get_balance(address)
            .await
            .map_err(|e| AppError::RpcError(format!("Failed to get balance: {}", e)))
    }

    async fn simulate(&self, tx: &VersionedTransaction) -> Result<SimulationStats, AppError> {
        let config = RpcSimulateTransactionConfig {
            sig_verify: false,
            replace_recent_blockhash: true,
            commitment: Some(self.commitment),
            ..Default::default()
        };
        let response = self
            .client
            .simulate_transaction_with_config(tx, config)
            .await
            .map_err(|e| AppError::RpcError(format!("Simulation request failed: {}", e)))?;

        Ok(SimulationStats {
            units_consumed: response.value.units_consumed,
            err: response.value.err.map(|e| e.to_string()),
        })
    }

    async fn send(&self, tx: &VersionedTransaction) -> Result<Signature, AppError> {
        let config = RpcSendTransactionConfig {
            skip_preflight: true,
            preflight_commitment: Some(CommitmentLevel::Confirmed),
            max_retries: Some(self.max_send_retries),
            ..Default::default()
        };
        self.client
            .send_transaction_with_config(tx, config)
            .await
            .map_err(|e| AppError::SubmissionFailure(format!("Failed to send transaction: {}", e)))
    }

    async fn signature_status(&self, signature: &Signature) -> Result<SignatureOutcome, AppError> {
        let response = self
            .client
            .get_signature_statuses(&[*signature])
            .await
            .map_err(|e| AppError::RpcError(format!("Failed to get signature status: {}", e)))?;

        let Some(Some(status)) = response.value.into_iter().next() else {
            return Ok(SignatureOutcome::Unconfirmed);
        };
        if let Some(err) = status.err {
            return Ok(SignatureOutcome::Failed(err.to_string()));
        }
        if status.satisfies_commitment(self.commitment) {
            Ok(SignatureOutcome::Confirmed)
        } else {
            Ok(SignatureOutcome::Unconfirmed)
        }
    }
}
