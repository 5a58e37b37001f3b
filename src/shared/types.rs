//! Common types used across the payment pipeline

use serde::{Deserialize, Serialize};
use solana_sdk::{instruction::Instruction, pubkey::Pubkey};

/// A typed payment operation requested by the web layer.
///
/// Amounts are always integers in the asset's smallest unit (lamports for
/// SOL, base units for SPL tokens). Floating-point major units are never
/// accepted here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TransactionRequest {
    #[serde(rename_all = "camelCase")]
    Transfer {
        signer: Pubkey,
        to: Pubkey,
        amount: u64,
        /// None means a native SOL transfer.
        mint: Option<Pubkey>,
    },
    #[serde(rename_all = "camelCase")]
    Swap {
        signer: Pubkey,
        input_mint: Pubkey,
        output_mint: Pubkey,
        amount: u64,
        slippage_bps: u16,
    },
}

impl TransactionRequest {
    pub fn signer(&self) -> &Pubkey {
        match self {
            TransactionRequest::Transfer { signer, .. } => signer,
            TransactionRequest::Swap { signer, .. } => signer,
        }
    }
}

/// Ordered instruction list produced by the builder, plus any address
/// lookup tables a swap quote referenced. Order matters: setup first, then
/// the payload, then cleanup.
#[derive(Debug, Clone, Default)]
pub struct BuiltInstructions {
    pub instructions: Vec<Instruction>,
    pub lookup_tables: Vec<Pubkey>,
}

impl BuiltInstructions {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self {
            instructions,
            lookup_tables: Vec::new(),
        }
    }
}

/// Raw simulation stats as returned by the RPC node.
#[derive(Debug, Clone, Default)]
pub struct SimulationStats {
    pub units_consumed: Option<u64>,
    pub err: Option<String>,
}

/// One SPL token account owned by a wallet, as parsed from the
/// `getTokenAccountsByOwner` jsonParsed response.
#[derive(Debug, Clone)]
pub struct OwnedTokenAccount {
    pub token_account: Pubkey,
    pub mint: Pubkey,
    pub amount: u64,
    pub decimals: u8,
}

/// Confirmation state of a submitted signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureOutcome {
    /// Not yet visible at the requested commitment.
    Unconfirmed,
    Confirmed,
    /// The transaction landed but errored on-chain.
    Failed(String),
}

/// Priority level forwarded to the fee estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriorityLevel {
    Min,
    Low,
    #[default]
    Medium,
    High,
    VeryHigh,
}

impl PriorityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityLevel::Min => "MIN",
            PriorityLevel::Low => "LOW",
            PriorityLevel::Medium => "MEDIUM",
            PriorityLevel::High => "HIGH",
            PriorityLevel::VeryHigh => "VERY_HIGH",
        }
    }
}

/// Cosmetic token metadata from the market-data service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenDisplayMetadata {
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub logo_uri: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

/// USD price quote for a single mint.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct UsdPrice {
    pub value: f64,
    #[serde(rename = "updateUnixTime")]
    pub update_unix_time: i64,
}

/// One priced token position in a wallet. Derived, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct PricedTokenHolding {
    pub mint: Pubkey,
    pub token_account: Pubkey,
    pub amount_ui: String,
    pub value_usd: f64,
    pub decimals: u8,
    pub metadata: Option<TokenDisplayMetadata>,
}

/// Off-chain payment context attached to a submission, used to create the
/// ledger row before confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub user_id: String,
    pub course_id: String,
    pub amount: u64,
    pub currency: String,
}
