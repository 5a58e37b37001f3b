use crate::shared::errors::AppError;
use serde::{Deserialize, Serialize};
use std::fs;

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub rpc_url: String,
    pub commitment: String,
    pub timeout_ms: u64,
}

/// External market-data and aggregator endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    pub fee_estimator_url: String,
    pub swap_api_url: String,
    pub price_api_url: String,
    pub price_api_key: Option<String>,
    pub http_timeout_ms: u64,
}

/// Submission and confirmation knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionConfig {
    pub max_send_retries: usize,
    pub confirm_attempts: u32,
    pub confirm_interval_ms: u64,
}

/// Payment ledger knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentsConfig {
    /// Pending rows older than this are swept to Expired.
    pub expiry_minutes: i64,
}

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub network: NetworkConfig,
    pub services: ServicesConfig,
    pub submission: SubmissionConfig,
    pub payments: PaymentsConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig {
                rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
                commitment: "confirmed".to_string(),
                timeout_ms: 30000,
            },
            services: ServicesConfig {
                fee_estimator_url: "https://mainnet.helius-rpc.com".to_string(),
                swap_api_url: "https://quote-api.jup.ag/v6".to_string(),
                price_api_url: "https://public-api.birdeye.so".to_string(),
                price_api_key: None,
                http_timeout_ms: 15000,
            },
            submission: SubmissionConfig {
                max_send_retries: 3,
                confirm_attempts: 30,
                confirm_interval_ms: 2000,
            },
            payments: PaymentsConfig { expiry_minutes: 30 },
        }
    }
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file, defaulting to Config.toml
    pub fn load_config(path: Option<&str>) -> Result<ServiceConfig, AppError> {
        let path = path.unwrap_or("Config.toml");
        let config_content = fs::read_to_string(path)
            .map_err(|e| AppError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config: ServiceConfig = toml::from_str(&config_content)
            .map_err(|e| AppError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }
}
