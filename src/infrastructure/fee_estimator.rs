//! Priority-fee estimator client (Helius `getPriorityFeeEstimate` extension)

use crate::shared::errors::AppError;
use crate::shared::types::PriorityLevel;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Slots of recent fee history the estimator considers.
pub const FEE_LOOKBACK_SLOTS: u32 = 150;

/// Micro-lamports-per-compute-unit estimate seam.
#[async_trait]
pub trait PriorityFeeEstimator: Send + Sync {
    /// Estimate a priority fee for the given base64 wire transaction.
    async fn estimate(&self, wire_transaction: &str, level: PriorityLevel)
        -> Result<u64, AppError>;
}

#[derive(Debug, Deserialize)]
struct FeeEstimateResponse {
    result: Option<FeeEstimateResult>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct FeeEstimateResult {
    #[serde(rename = "priorityFeeEstimate")]
    priority_fee_estimate: f64,
}

/// Helius-style JSON-RPC fee estimator client
pub struct HeliusFeeEstimator {
    http_client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HeliusFeeEstimator {
    pub fn new(endpoint: String, timeout_ms: u64) -> Self {
        Self {
            http_client: Client::new(),
            endpoint,
            timeout: Duration::from_millis(timeout_ms),
        }
    }
}

#[async_trait]
impl PriorityFeeEstimator for HeliusFeeEstimator {
    async fn estimate(
        &self,
        wire_transaction: &str,
        level: PriorityLevel,
    ) -> Result<u64, AppError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getPriorityFeeEstimate",
            "params": [{
                "transaction": wire_transaction,
                "options": {
                    "priorityLevel": level.as_str(),
                    "lookbackSlots": FEE_LOOKBACK_SLOTS,
                    "recommended": true,
                }
            }]
        });

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Fee estimator request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "Fee estimator returned status {}",
                response.status()
            )));
        }

        let parsed: FeeEstimateResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Fee estimator parse error: {}", e)))?;

        if let Some(err) = parsed.error {
            return Err(AppError::ExternalServiceError(format!(
                "Fee estimator error payload: {}",
                err
            )));
        }

        let estimate = parsed
            .result
            .map(|r| r.priority_fee_estimate)
            .ok_or_else(|| {
                AppError::ExternalServiceError("Fee estimator returned no result".to_string())
            })?;

        debug!("Priority fee estimate ({}): {}", level.as_str(), estimate);
        Ok(estimate.round() as u64)
    }
}
