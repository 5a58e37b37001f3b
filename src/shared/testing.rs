//! Deterministic fakes for the external collaborator seams.

use crate::infrastructure::fee_estimator::PriorityFeeEstimator;
use crate::infrastructure::price_api::PriceApi;
use crate::infrastructure::rpc::ChainRpc;
use crate::infrastructure::swap_api::{SwapApi, SwapInstructionBundle, SwapQuote};
use crate::shared::errors::AppError;
use crate::shared::types::{
    OwnedTokenAccount, PriorityLevel, SignatureOutcome, SimulationStats, TokenDisplayMetadata,
    UsdPrice,
};
use async_trait::async_trait;
use solana_sdk::program_pack::Pack;
use solana_sdk::{
    hash::Hash, pubkey::Pubkey, signature::Signature, transaction::VersionedTransaction,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

/// Pack a mint account body carrying the given decimal count.
pub fn mint_account_data(decimals: u8) -> Vec<u8> {
    let mint = spl_token::state::Mint {
        decimals,
        is_initialized: true,
        ..Default::default()
    };
    let mut data = vec![0u8; spl_token::state::Mint::LEN];
    spl_token::state::Mint::pack(mint, &mut data).unwrap();
    data
}

#[derive(Default)]
pub struct FakeChainRpc {
    pub blockhash: Hash,
    pub existing_accounts: Mutex<HashSet<Pubkey>>,
    pub account_data: Mutex<HashMap<Pubkey, Vec<u8>>>,
    pub token_accounts: Mutex<Vec<OwnedTokenAccount>>,
    pub lamports: Mutex<HashMap<Pubkey, u64>>,
    pub sim_units: Mutex<Option<u64>>,
    pub sim_err: Mutex<Option<String>>,
    pub sim_transport_fail: Mutex<bool>,
    pub send_error: Mutex<Option<String>>,
    pub statuses: Mutex<VecDeque<SignatureOutcome>>,
}

impl FakeChainRpc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_existing_account(self, address: Pubkey) -> Self {
        self.existing_accounts.lock().unwrap().insert(address);
        self
    }

    pub fn with_account_data(self, address: Pubkey, data: Vec<u8>) -> Self {
        self.account_data.lock().unwrap().insert(address, data);
        self
    }

    pub fn with_sim_units(self, units: u64) -> Self {
        *self.sim_units.lock().unwrap() = Some(units);
        self
    }

    pub fn with_sim_error(self, err: &str) -> Self {
        *self.sim_err.lock().unwrap() = Some(err.to_string());
        self
    }

    pub fn with_send_error(self, err: &str) -> Self {
        *self.send_error.lock().unwrap() = Some(err.to_string());
        self
    }

    pub fn with_statuses(self, outcomes: Vec<SignatureOutcome>) -> Self {
        *self.statuses.lock().unwrap() = outcomes.into();
        self
    }

    pub fn with_token_account(self, account: OwnedTokenAccount) -> Self {
        self.token_accounts.lock().unwrap().push(account);
        self
    }
}

#[async_trait]
impl ChainRpc for FakeChainRpc {
    async fn latest_blockhash(&self) -> Result<Hash, AppError> {
        Ok(self.blockhash)
    }

    async fn account_exists(&self, address: &Pubkey) -> Result<bool, AppError> {
        Ok(self.existing_accounts.lock().unwrap().contains(address))
    }

    async fn get_multiple_account_data(
        &self,
        addresses: &[Pubkey],
    ) -> Result<Vec<Option<Vec<u8>>>, AppError> {
        let data = self.account_data.lock().unwrap();
        Ok(addresses.iter().map(|a| data.get(a).cloned()).collect())
    }

    async fn token_accounts_by_owner(
        &self,
        _owner: &Pubkey,
    ) -> Result<Vec<OwnedTokenAccount>, AppError> {
        Ok(self.token_accounts.lock().unwrap().clone())
    }

    async fn lamport_balance(&self, address: &Pubkey) -> Result<u64, AppError> {
        Ok(*self.lamports.lock().unwrap().get(address).unwrap_or(&0))
    }

    async fn simulate(&self, _tx: &VersionedTransaction) -> Result<SimulationStats, AppError> {
        if *self.sim_transport_fail.lock().unwrap() {
            return Err(AppError::RpcError("simulation transport down".to_string()));
        }
        Ok(SimulationStats {
            units_consumed: *self.sim_units.lock().unwrap(),
            err: self.sim_err.lock().unwrap().clone(),
        })
    }

    async fn send(&self, tx: &VersionedTransaction) -> Result<Signature, AppError> {
        if let Some(err) = self.send_error.lock().unwrap().clone() {
            return Err(AppError::SubmissionFailure(err));
        }
        Ok(tx.signatures.first().copied().unwrap_or_default())
    }

    async fn signature_status(&self, _signature: &Signature) -> Result<SignatureOutcome, AppError> {
        Ok(self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(SignatureOutcome::Unconfirmed))
    }
}

/// Fee estimator fake; `None` simulates an estimator outage.
#[derive(Default)]
pub struct FakeFeeEstimator {
    pub response: Option<u64>,
}

impl FakeFeeEstimator {
    pub fn responding(value: u64) -> Self {
        Self {
            response: Some(value),
        }
    }

    pub fn failing() -> Self {
        Self { response: None }
    }
}

#[async_trait]
impl PriorityFeeEstimator for FakeFeeEstimator {
    async fn estimate(
        &self,
        _wire_transaction: &str,
        _level: PriorityLevel,
    ) -> Result<u64, AppError> {
        self.response
            .ok_or_else(|| AppError::ExternalServiceError("estimator down".to_string()))
    }
}

#[derive(Default)]
pub struct FakeSwapApi {
    pub bundle: Option<SwapInstructionBundle>,
    pub quote_error: Option<String>,
}

#[async_trait]
impl SwapApi for FakeSwapApi {
    async fn get_quote(
        &self,
        input_mint: &Pubkey,
        output_mint: &Pubkey,
        amount: u64,
        _slippage_bps: u16,
    ) -> Result<SwapQuote, AppError> {
        if let Some(err) = &self.quote_error {
            return Err(AppError::ExternalServiceError(err.clone()));
        }
        Ok(SwapQuote {
            input_mint: *input_mint,
            output_mint: *output_mint,
            in_amount: amount,
            out_amount: amount,
            raw: serde_json::json!({}),
        })
    }

    async fn get_swap_instructions(
        &self,
        _quote: &SwapQuote,
        _user: &Pubkey,
    ) -> Result<SwapInstructionBundle, AppError> {
        self.bundle
            .clone()
            .ok_or_else(|| AppError::ExternalServiceError("no bundle configured".to_string()))
    }
}

#[derive(Default)]
pub struct FakePriceApi {
    pub prices: HashMap<Pubkey, f64>,
    pub metadata_failures: HashSet<Pubkey>,
}

impl FakePriceApi {
    pub fn with_price(mut self, mint: Pubkey, value: f64) -> Self {
        self.prices.insert(mint, value);
        self
    }

    pub fn with_metadata_failure(mut self, mint: Pubkey) -> Self {
        self.metadata_failures.insert(mint);
        self
    }
}

#[async_trait]
impl PriceApi for FakePriceApi {
    async fn usd_prices(&self, mints: &[Pubkey]) -> Result<HashMap<Pubkey, UsdPrice>, AppError> {
        Ok(mints
            .iter()
            .filter_map(|mint| {
                self.prices.get(mint).map(|value| {
                    (
                        *mint,
                        UsdPrice {
                            value: *value,
                            update_unix_time: 1_700_000_000,
                        },
                    )
                })
            })
            .collect())
    }

    async fn display_metadata(&self, mint: &Pubkey) -> Result<TokenDisplayMetadata, AppError> {
        if self.metadata_failures.contains(mint) {
            return Err(AppError::ExternalServiceError(format!(
                "metadata unavailable for {}",
                mint
            )));
        }
        Ok(TokenDisplayMetadata {
            symbol: "FAKE".to_string(),
            name: "Fake Token".to_string(),
            logo_uri: None,
            website: None,
        })
    }
}
