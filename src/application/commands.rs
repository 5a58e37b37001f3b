//! CLI surface for operating the pipeline by hand

use crate::application::services::PaymentService;
use crate::infrastructure::{
    BirdeyePriceClient, HeliusFeeEstimator, InMemoryPaymentStore, JupiterSwapClient, RpcGateway,
};
use crate::shared::config::{ConfigLoader, ServiceConfig};
use crate::shared::errors::AppError;
use crate::shared::types::{PaymentIntent, TransactionRequest};
use anyhow::Result;
use clap::{Parser, Subcommand};
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(version, about = "On-chain payment pipeline CLI for the course marketplace")]
pub struct Cli {
    /// Path to config file (defaults to Config.toml)
    #[arg(long)]
    pub config: Option<String>,

    /// RPC endpoint URL (overrides config)
    #[arg(long)]
    pub rpc_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build an unsigned wire transaction from a JSON request
    Build {
        /// Transaction request as inline JSON
        request: String,
    },
    /// Submit a signed wire transaction
    Submit {
        /// Base64 wire transaction
        wire: String,
        /// User id for the payment row
        #[arg(long)]
        user_id: Option<String>,
        /// Course id for the payment row
        #[arg(long)]
        course_id: Option<String>,
        /// Amount in base units
        #[arg(long)]
        amount: Option<u64>,
        /// Currency label
        #[arg(long, default_value = "USDC")]
        currency: String,
    },
    /// List a wallet's priced holdings
    Holdings {
        /// Owner address
        owner: String,
    },
    /// Sweep stale pending payments to expired
    ExpireStale,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let mut config = ConfigLoader::load_config(self.config.as_deref())
            .unwrap_or_else(|_| ServiceConfig::default());
        if let Some(rpc_url) = self.rpc_url {
            config.network.rpc_url = rpc_url;
        }

        let service = build_service(&config);

        match self.command {
            Commands::Build { request } => {
                let request: TransactionRequest = serde_json::from_str(&request)
                    .map_err(|e| AppError::ValidationError(format!("Invalid request JSON: {}", e)))?;
                let wire = service.build_transaction(&request, None).await?;
                println!("{}", wire);
            }
            Commands::Submit {
                wire,
                user_id,
                course_id,
                amount,
                currency,
            } => {
                let intent = match (user_id, course_id, amount) {
                    (Some(user_id), Some(course_id), Some(amount)) => Some(PaymentIntent {
                        user_id,
                        course_id,
                        amount,
                        currency,
                    }),
                    _ => None,
                };
                let signature = service.submit_transaction(&wire, intent.as_ref()).await?;
                println!("{}", signature);
            }
            Commands::Holdings { owner } => {
                let owner = Pubkey::from_str(&owner)
                    .map_err(|e| AppError::ValidationError(format!("Invalid owner: {}", e)))?;
                let holdings = service.list_holdings(&owner).await?;
                for holding in &holdings {
                    let symbol = holding
                        .metadata
                        .as_ref()
                        .map(|m| m.symbol.clone())
                        .unwrap_or_else(|| holding.mint.to_string());
                    println!("{}  {}  ${:.2}", symbol, holding.amount_ui, holding.value_usd);
                }
                info!("{} holdings listed", holdings.len());
            }
            Commands::ExpireStale => {
                let swept = service.expire_stale_payments().await?;
                println!("expired {} payments", swept);
            }
        }
        Ok(())
    }
}

fn build_service(config: &ServiceConfig) -> PaymentService {
    let rpc = Arc::new(RpcGateway::new(
        config.network.rpc_url.clone(),
        config.network.timeout_ms,
        config.submission.max_send_retries,
    ));
    let fee_estimator = Arc::new(HeliusFeeEstimator::new(
        config.services.fee_estimator_url.clone(),
        config.services.http_timeout_ms,
    ));
    let swap_api = Arc::new(JupiterSwapClient::new(
        config.services.swap_api_url.clone(),
        config.services.http_timeout_ms,
    ));
    let price_api = Arc::new(BirdeyePriceClient::new(
        config.services.price_api_url.clone(),
        config.services.price_api_key.clone(),
        config.services.http_timeout_ms,
    ));
    let store = Arc::new(InMemoryPaymentStore::new());

    PaymentService::new(rpc, fee_estimator, swap_api, price_api, store, config.clone())
}
