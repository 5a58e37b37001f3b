//! Swap aggregator client (Jupiter-style quote + swap-instructions API)
//!
//! The aggregator returns instructions in a wire-neutral shape
//! `{ programId, accounts[], data(base64) }`; this module deserializes them
//! into native [`Instruction`] objects for message compilation.

use crate::shared::errors::AppError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Fixed allow-list of venues a quote may route through.
pub const ALLOWED_VENUES: &[&str] = &["Whirlpool", "Raydium", "Raydium CLMM", "Meteora DLMM"];

/// Quote response, kept verbatim for the follow-up swap-instructions call.
#[derive(Debug, Clone)]
pub struct SwapQuote {
    pub input_mint: Pubkey,
    pub output_mint: Pubkey,
    pub in_amount: u64,
    pub out_amount: u64,
    /// Raw quote payload forwarded to the swap-instructions endpoint.
    pub raw: serde_json::Value,
}

/// Wire-neutral instruction payload as returned by the aggregator.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionPayload {
    pub program_id: String,
    pub accounts: Vec<AccountMetaPayload>,
    pub data: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountMetaPayload {
    pub pubkey: String,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl InstructionPayload {
    /// Deserialize into the chain's native instruction representation.
    pub fn into_instruction(self) -> Result<Instruction, AppError> {
        let program_id = Pubkey::from_str(&self.program_id)
            .map_err(|e| AppError::ExternalServiceError(format!("Invalid program id: {}", e)))?;
        let mut accounts = Vec::with_capacity(self.accounts.len());
        for meta in self.accounts {
            let pubkey = Pubkey::from_str(&meta.pubkey).map_err(|e| {
                AppError::ExternalServiceError(format!("Invalid account pubkey: {}", e))
            })?;
            accounts.push(AccountMeta {
                pubkey,
                is_signer: meta.is_signer,
                is_writable: meta.is_writable,
            });
        }
        let data = BASE64
            .decode(&self.data)
            .map_err(|e| AppError::ExternalServiceError(format!("Invalid instruction data: {}", e)))?;
        Ok(Instruction {
            program_id,
            accounts,
            data,
        })
    }
}

/// Instruction payloads for one swap, in execution order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapInstructionBundle {
    #[serde(default)]
    pub setup_instructions: Vec<InstructionPayload>,
    pub swap_instruction: InstructionPayload,
    #[serde(default)]
    pub cleanup_instruction: Option<InstructionPayload>,
    #[serde(default)]
    pub address_lookup_table_addresses: Vec<String>,
}

impl SwapInstructionBundle {
    /// Flatten into an ordered native instruction list: setup, swap, cleanup.
    pub fn into_instructions(self) -> Result<Vec<Instruction>, AppError> {
        let mut instructions = Vec::with_capacity(self.setup_instructions.len() + 2);
        for payload in self.setup_instructions {
            instructions.push(payload.into_instruction()?);
        }
        instructions.push(self.swap_instruction.into_instruction()?);
        if let Some(cleanup) = self.cleanup_instruction {
            instructions.push(cleanup.into_instruction()?);
        }
        Ok(instructions)
    }

    pub fn lookup_tables(&self) -> Result<Vec<Pubkey>, AppError> {
        self.address_lookup_table_addresses
            .iter()
            .map(|addr| {
                Pubkey::from_str(addr).map_err(|e| {
                    AppError::ExternalServiceError(format!("Invalid lookup table address: {}", e))
                })
            })
            .collect()
    }
}

/// Swap aggregator seam
#[async_trait]
pub trait SwapApi: Send + Sync {
    async fn get_quote(
        &self,
        input_mint: &Pubkey,
        output_mint: &Pubkey,
        amount: u64,
        slippage_bps: u16,
    ) -> Result<SwapQuote, AppError>;

    async fn get_swap_instructions(
        &self,
        quote: &SwapQuote,
        user: &Pubkey,
    ) -> Result<SwapInstructionBundle, AppError>;
}

/// Jupiter aggregator HTTP client
pub struct JupiterSwapClient {
    http_client: Client,
    base_url: String,
    timeout: Duration,
}

impl JupiterSwapClient {
    pub fn new(base_url: String, timeout_ms: u64) -> Self {
        Self {
            http_client: Client::new(),
            base_url,
            timeout: Duration::from_millis(timeout_ms),
        }
    }
}

#[async_trait]
impl SwapApi for JupiterSwapClient {
    async fn get_quote(
        &self,
        input_mint: &Pubkey,
        output_mint: &Pubkey,
        amount: u64,
        slippage_bps: u16,
    ) -> Result<SwapQuote, AppError> {
        let response = self
            .http_client
            .get(format!("{}/quote", self.base_url))
            .query(&[
                ("inputMint", input_mint.to_string()),
                ("outputMint", output_mint.to_string()),
                ("amount", amount.to_string()),
                ("slippageBps", slippage_bps.to_string()),
                ("swapMode", "ExactOut".to_string()),
                ("dexes", ALLOWED_VENUES.join(",")),
            ])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Quote request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "Quote service returned status {}",
                response.status()
            )));
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Quote parse error: {}", e)))?;

        if let Some(err) = raw.get("error") {
            return Err(AppError::ExternalServiceError(format!(
                "Quote service error: {}",
                err
            )));
        }

        let in_amount = raw["inAmount"]
            .as_str()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(amount);
        let out_amount = raw["outAmount"]
            .as_str()
            .and_then(|v| v.parse::<u64>().ok())
            .ok_or_else(|| {
                AppError::ExternalServiceError("Quote missing outAmount".to_string())
            })?;

        info!(
            "Quote {} -> {}: in {} out {}",
            input_mint, output_mint, in_amount, out_amount
        );

        Ok(SwapQuote {
            input_mint: *input_mint,
            output_mint: *output_mint,
            in_amount,
            out_amount,
            raw,
        })
    }

    async fn get_swap_instructions(
        &self,
        quote: &SwapQuote,
        user: &Pubkey,
    ) -> Result<SwapInstructionBundle, AppError> {
        let url = format!("{}/swap-instructions", self.base_url);
        let body = json!({
            "quoteResponse": quote.raw,
            "userPublicKey": user.to_string(),
        });

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalServiceError(format!("Swap instructions request failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "Swap instructions service returned status {}",
                response.status()
            )));
        }

        let raw: serde_json::Value = response.json().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Swap instructions parse error: {}", e))
        })?;

        if let Some(err) = raw.get("error") {
            return Err(AppError::ExternalServiceError(format!(
                "Swap instructions error: {}",
                err
            )));
        }

        serde_json::from_value(raw).map_err(|e| {
            AppError::ExternalServiceError(format!("Swap instructions shape error: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_payload_deserializes_to_native() {
        let program = Pubkey::new_unique();
        let account = Pubkey::new_unique();
        let payload = InstructionPayload {
            program_id: program.to_string(),
            accounts: vec![AccountMetaPayload {
                pubkey: account.to_string(),
                is_signer: true,
                is_writable: false,
            }],
            data: BASE64.encode([1u8, 2, 3]),
        };

        let ix = payload.into_instruction().unwrap();
        assert_eq!(ix.program_id, program);
        assert_eq!(ix.accounts.len(), 1);
        assert!(ix.accounts[0].is_signer);
        assert!(!ix.accounts[0].is_writable);
        assert_eq!(ix.data, vec![1, 2, 3]);
    }

    #[test]
    fn test_bundle_order_is_setup_swap_cleanup() {
        let make = |data: &[u8]| InstructionPayload {
            program_id: Pubkey::new_unique().to_string(),
            accounts: vec![],
            data: BASE64.encode(data),
        };
        let bundle = SwapInstructionBundle {
            setup_instructions: vec![make(&[0]), make(&[1])],
            swap_instruction: make(&[2]),
            cleanup_instruction: Some(make(&[3])),
            address_lookup_table_addresses: vec![Pubkey::new_unique().to_string()],
        };

        assert_eq!(bundle.lookup_tables().unwrap().len(), 1);
        let instructions = bundle.into_instructions().unwrap();
        let order: Vec<u8> = instructions.iter().map(|ix| ix.data[0]).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_bad_program_id_is_rejected() {
        let payload = InstructionPayload {
            program_id: "not-a-pubkey".to_string(),
            accounts: vec![],
            data: BASE64.encode([0u8]),
        };
        assert!(payload.into_instruction().is_err());
    }
}
