//! Infrastructure layer - chain transport, external HTTP services, persistence

pub mod rpc;
pub mod fee_estimator;
pub mod swap_api;
pub mod price_api;
pub mod payment_store;

pub use fee_estimator::{HeliusFeeEstimator, PriorityFeeEstimator};
pub use payment_store::{InMemoryPaymentStore, PaymentStore, UpdateOutcome};
pub use price_api::{BirdeyePriceClient, PriceApi};
pub use rpc::{ChainRpc, RpcGateway};
pub use swap_api::{JupiterSwapClient, SwapApi};
