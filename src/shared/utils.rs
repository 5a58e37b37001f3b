//! Utility functions and helpers

use crate::shared::errors::AppError;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use solana_sdk::transaction::VersionedTransaction;

/// Serialize a versioned transaction to the base64 wire form exchanged
/// with the signing client.
pub fn encode_wire_transaction(tx: &VersionedTransaction) -> Result<String, AppError> {
    let bytes = bincode::serialize(tx)
        .map_err(|e| AppError::ValidationError(format!("Failed to serialize transaction: {}", e)))?;
    Ok(BASE64.encode(bytes))
}

/// Decode a base64 wire transaction back into its native representation.
pub fn decode_wire_transaction(wire: &str) -> Result<VersionedTransaction, AppError> {
    let bytes = BASE64
        .decode(wire.trim())
        .map_err(|e| AppError::ValidationError(format!("Invalid base64 transaction: {}", e)))?;
    bincode::deserialize(&bytes)
        .map_err(|e| AppError::ValidationError(format!("Invalid wire transaction: {}", e)))
}

/// Format a raw token amount as a human-readable decimal string, with
/// trailing zeros trimmed.
pub fn format_token_amount(amount: u64, decimals: u8) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    let divisor = 10u64.pow(decimals as u32);
    let whole = amount / divisor;
    let frac = amount % divisor;
    if frac == 0 {
        whole.to_string()
    } else {
        let frac_str = format!("{:0>width$}", frac, width = decimals as usize);
        format!("{}.{}", whole, frac_str.trim_end_matches('0'))
    }
}

/// Convert a raw amount to a floating-point UI value for pricing math.
pub fn ui_amount(amount: u64, decimals: u8) -> f64 {
    amount as f64 / 10f64.powi(decimals as i32)
}
