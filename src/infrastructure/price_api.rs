//! Market price and token metadata client (Birdeye-style API)

use crate::shared::errors::AppError;
use crate::shared::types::{TokenDisplayMetadata, UsdPrice};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

/// Market data seam: batch USD prices and per-mint display metadata.
#[async_trait]
pub trait PriceApi: Send + Sync {
    /// Batch price lookup; mints missing from the response are simply
    /// absent from the returned map.
    async fn usd_prices(&self, mints: &[Pubkey]) -> Result<HashMap<Pubkey, UsdPrice>, AppError>;

    /// Cosmetic metadata (symbol, logo, links) for one mint.
    async fn display_metadata(&self, mint: &Pubkey) -> Result<TokenDisplayMetadata, AppError>;
}

/// Birdeye HTTP client
pub struct BirdeyePriceClient {
    http_client: Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl BirdeyePriceClient {
    pub fn new(base_url: String, api_key: Option<String>, timeout_ms: u64) -> Self {
        Self {
            http_client: Client::new(),
            base_url,
            api_key,
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    async fn get_json(&self, url: &str) -> Result<Value, AppError> {
        let mut request = self.http_client.get(url).timeout(self.timeout);
        if let Some(key) = &self.api_key {
            request = request.header("X-API-KEY", key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Price request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "Price service returned status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Price parse error: {}", e)))
    }
}

#[async_trait]
impl PriceApi for BirdeyePriceClient {
    async fn usd_prices(&self, mints: &[Pubkey]) -> Result<HashMap<Pubkey, UsdPrice>, AppError> {
        if mints.is_empty() {
            return Ok(HashMap::new());
        }
        let list = mints
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}/defi/multi_price?list_address={}", self.base_url, list);
        let body = self.get_json(&url).await?;

        let Some(data) = body.get("data").and_then(|d| d.as_object()) else {
            return Err(AppError::ExternalServiceError(
                "Price response missing data".to_string(),
            ));
        };

        let mut prices = HashMap::new();
        for (mint_str, entry) in data {
            let Ok(mint) = Pubkey::from_str(mint_str) else {
                continue;
            };
            // Unpriced mints come back as null entries; skip them.
            if let Ok(price) = serde_json::from_value::<UsdPrice>(entry.clone()) {
                prices.insert(mint, price);
            }
        }
        Ok(prices)
    }

    async fn display_metadata(&self, mint: &Pubkey) -> Result<TokenDisplayMetadata, AppError> {
        let url = format!(
            "{}/defi/v3/token/meta-data/single?address={}",
            self.base_url, mint
        );
        let body = self.get_json(&url).await?;
        let data = body.get("data").cloned().ok_or_else(|| {
            AppError::ExternalServiceError("Metadata response missing data".to_string())
        })?;

        Ok(TokenDisplayMetadata {
            symbol: data["symbol"].as_str().unwrap_or("UNKNOWN").to_string(),
            name: data["name"].as_str().unwrap_or("Unknown Token").to_string(),
            logo_uri: data["logo_uri"].as_str().map(str::to_string),
            website: data
                .pointer("/extensions/website")
                .and_then(|v| v.as_str())
                .map(str::to_string),
        })
    }
}
