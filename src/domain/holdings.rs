//! Holdings reader - prices every token position in a wallet.
//!
//! One token-accounts read, then mint decimals and USD prices fetched as
//! two concurrent batch calls (never N+1). A single mint's lookup failure
//! skips that mint only; cosmetic metadata is fetched last and a failure
//! there just leaves `metadata` empty.

use crate::infrastructure::price_api::PriceApi;
use crate::infrastructure::rpc::ChainRpc;
use crate::shared::errors::AppError;
use crate::shared::types::PricedTokenHolding;
use crate::shared::utils::{format_token_amount, ui_amount};
use solana_sdk::program_pack::Pack;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Positions worth less than this many USD are dropped from the listing.
pub const MIN_VALUE_USD: f64 = 1.0;

pub struct HoldingsReader {
    rpc: Arc<dyn ChainRpc>,
    price_api: Arc<dyn PriceApi>,
}

impl HoldingsReader {
    pub fn new(rpc: Arc<dyn ChainRpc>, price_api: Arc<dyn PriceApi>) -> Self {
        Self { rpc, price_api }
    }

    /// List the wallet's priced holdings: native SOL plus every SPL token
    /// account, filtered by the materiality threshold.
    pub async fn list_holdings(&self, owner: &Pubkey) -> Result<Vec<PricedTokenHolding>, AppError> {
        let token_accounts = self.rpc.token_accounts_by_owner(owner).await?;

        let mut mints: Vec<Pubkey> = token_accounts.iter().map(|a| a.mint).collect();
        let native_mint = spl_token::native_mint::id();
        if !mints.contains(&native_mint) {
            mints.push(native_mint);
        }
        mints.sort();
        mints.dedup();

        // Decimals and prices are independent batch lookups.
        let (mint_data, prices) = tokio::join!(
            self.rpc.get_multiple_account_data(&mints),
            self.price_api.usd_prices(&mints)
        );

        let decimals_by_mint: HashMap<Pubkey, u8> = match mint_data {
            Ok(data) => mints
                .iter()
                .zip(data)
                .filter_map(|(mint, body)| Some((*mint, unpack_mint_decimals(body?)?)))
                .collect(),
            Err(e) => {
                warn!("Mint metadata batch failed, falling back to parsed decimals: {}", e);
                HashMap::new()
            }
        };
        let prices = prices?;

        let mut holdings = Vec::new();

        // Native SOL balance rides along with the SPL positions.
        match self.rpc.lamport_balance(owner).await {
            Ok(lamports) if lamports > 0 => {
                if let Some(price) = prices.get(&native_mint) {
                    let value_usd = ui_amount(lamports, 9) * price.value;
                    if value_usd >= MIN_VALUE_USD {
                        holdings.push(PricedTokenHolding {
                            mint: native_mint,
                            token_account: *owner,
                            amount_ui: format_token_amount(lamports, 9),
                            value_usd,
                            decimals: 9,
                            metadata: None,
                        });
                    }
                }
            }
            Ok(_) => {}
            Err(e) => warn!("SOL balance lookup failed for {}: {}", owner, e),
        }

        for account in token_accounts {
            let Some(price) = prices.get(&account.mint) else {
                debug!("No price for mint {}, skipping", account.mint);
                continue;
            };
            let decimals = decimals_by_mint
                .get(&account.mint)
                .copied()
                .unwrap_or(account.decimals);
            let value_usd = ui_amount(account.amount, decimals) * price.value;
            if value_usd < MIN_VALUE_USD {
                debug!(
                    "Dropping {} worth {:.4} USD (below threshold)",
                    account.mint, value_usd
                );
                continue;
            }
            holdings.push(PricedTokenHolding {
                mint: account.mint,
                token_account: account.token_account,
                amount_ui: format_token_amount(account.amount, decimals),
                value_usd,
                decimals,
                metadata: None,
            });
        }

        // Cosmetic metadata only for surviving entries; sequential is fine
        // here and a failure never disturbs the other entries.
        for holding in &mut holdings {
            match self.price_api.display_metadata(&holding.mint).await {
                Ok(metadata) => holding.metadata = Some(metadata),
                Err(e) => warn!("Metadata fetch failed for {}: {}", holding.mint, e),
            }
        }

        info!("Listed {} priced holdings for {}", holdings.len(), owner);
        Ok(holdings)
    }
}

fn unpack_mint_decimals(data: Vec<u8>) -> Option<u8> {
    if data.len() < spl_token::state::Mint::LEN {
        return None;
    }
    spl_token::state::Mint::unpack(&data[..spl_token::state::Mint::LEN])
        .ok()
        .map(|mint| mint.decimals)
}
