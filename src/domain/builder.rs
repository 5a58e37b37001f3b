//! Instruction builder - converts a typed request into an ordered
//! instruction list.

use crate::infrastructure::rpc::ChainRpc;
use crate::infrastructure::swap_api::SwapApi;
use crate::shared::errors::BuildError;
use crate::shared::types::{BuiltInstructions, TransactionRequest};
use solana_sdk::program_pack::Pack;
use solana_sdk::{pubkey::Pubkey, system_instruction};
use spl_associated_token_account::{
    get_associated_token_address, instruction::create_associated_token_account_idempotent,
};
use std::sync::Arc;
use tracing::info;

/// Builds chain instructions for transfers and swaps
pub struct InstructionBuilder {
    rpc: Arc<dyn ChainRpc>,
    swap_api: Arc<dyn SwapApi>,
}

impl InstructionBuilder {
    pub fn new(rpc: Arc<dyn ChainRpc>, swap_api: Arc<dyn SwapApi>) -> Self {
        Self { rpc, swap_api }
    }

    /// Build the ordered instruction list for a request. Validation happens
    /// before any network call.
    pub async fn build(
        &self,
        request: &TransactionRequest,
    ) -> Result<BuiltInstructions, BuildError> {
        match request {
            TransactionRequest::Transfer {
                signer,
                to,
                amount,
                mint,
            } => {
                if *amount == 0 {
                    return Err(BuildError::Validation(
                        "transfer amount must be positive".to_string(),
                    ));
                }
                if signer == to {
                    return Err(BuildError::Validation(
                        "transfer recipient must differ from signer".to_string(),
                    ));
                }
                match mint {
                    None => Ok(self.build_native_transfer(signer, to, *amount)),
                    Some(mint) if *mint == spl_token::native_mint::id() => {
                        Ok(self.build_native_transfer(signer, to, *amount))
                    }
                    Some(mint) => self.build_token_transfer(signer, to, *amount, mint).await,
                }
            }
            TransactionRequest::Swap {
                signer,
                input_mint,
                output_mint,
                amount,
                slippage_bps,
            } => {
                if *amount == 0 {
                    return Err(BuildError::Validation(
                        "swap amount must be positive".to_string(),
                    ));
                }
                if input_mint == output_mint {
                    return Err(BuildError::Validation(
                        "swap input and output mints must differ".to_string(),
                    ));
                }
                self.build_swap(signer, input_mint, output_mint, *amount, *slippage_bps)
                    .await
            }
        }
    }

    fn build_native_transfer(&self, signer: &Pubkey, to: &Pubkey, amount: u64) -> BuiltInstructions {
        info!("Building native transfer of {} lamports", amount);
        BuiltInstructions::new(vec![system_instruction::transfer(signer, to, amount)])
    }

    /// Token transfer: derive both associated token accounts, create the
    /// destination one when missing, then transfer with a decimals check.
    async fn build_token_transfer(
        &self,
        signer: &Pubkey,
        to: &Pubkey,
        amount: u64,
        mint: &Pubkey,
    ) -> Result<BuiltInstructions, BuildError> {
        let source_ata = get_associated_token_address(signer, mint);
        let destination_ata = get_associated_token_address(to, mint);

        let destination_exists = self
            .rpc
            .account_exists(&destination_ata)
            .await
            .map_err(|e| BuildError::ExternalService(e.to_string()))?;

        let decimals = self.mint_decimals(mint).await?;

        let mut instructions = Vec::with_capacity(2);
        if !destination_exists {
            info!("Destination ATA {} missing, prepending creation", destination_ata);
            instructions.push(create_associated_token_account_idempotent(
                signer,
                to,
                mint,
                &spl_token::id(),
            ));
        }

        let transfer = spl_token::instruction::transfer_checked(
            &spl_token::id(),
            &source_ata,
            mint,
            &destination_ata,
            signer,
            &[],
            amount,
            decimals,
        )
        .map_err(|e| BuildError::Validation(format!("transfer_checked: {}", e)))?;
        instructions.push(transfer);

        Ok(BuiltInstructions::new(instructions))
    }

    async fn build_swap(
        &self,
        signer: &Pubkey,
        input_mint: &Pubkey,
        output_mint: &Pubkey,
        amount: u64,
        slippage_bps: u16,
    ) -> Result<BuiltInstructions, BuildError> {
        let quote = self
            .swap_api
            .get_quote(input_mint, output_mint, amount, slippage_bps)
            .await
            .map_err(|e| BuildError::ExternalService(e.to_string()))?;

        let bundle = self
            .swap_api
            .get_swap_instructions(&quote, signer)
            .await
            .map_err(|e| BuildError::ExternalService(e.to_string()))?;

        let lookup_tables = bundle
            .lookup_tables()
            .map_err(|e| BuildError::ExternalService(e.to_string()))?;
        let instructions = bundle
            .into_instructions()
            .map_err(|e| BuildError::ExternalService(e.to_string()))?;

        info!(
            "Built swap with {} instructions, {} lookup tables",
            instructions.len(),
            lookup_tables.len()
        );

        Ok(BuiltInstructions {
            instructions,
            lookup_tables,
        })
    }

    /// Read the mint's decimal count from its account body.
    async fn mint_decimals(&self, mint: &Pubkey) -> Result<u8, BuildError> {
        let accounts = self
            .rpc
            .get_multiple_account_data(&[*mint])
            .await
            .map_err(|e| BuildError::ExternalService(e.to_string()))?;

        let data = accounts
            .into_iter()
            .next()
            .flatten()
            .ok_or_else(|| BuildError::UnknownMint(mint.to_string()))?;

        if data.len() < spl_token::state::Mint::LEN {
            return Err(BuildError::UnknownMint(mint.to_string()));
        }
        let unpacked = spl_token::state::Mint::unpack(&data[..spl_token::state::Mint::LEN])
            .map_err(|_| BuildError::UnknownMint(mint.to_string()))?;
        Ok(unpacked.decimals)
    }
}
