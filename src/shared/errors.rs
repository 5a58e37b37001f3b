//! Error handling for the payment pipeline

use thiserror::Error;

/// Instruction building errors
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Unknown mint: {0}")]
    UnknownMint(String),

    #[error("External service failed: {0}")]
    ExternalService(String),
}

/// Submission and confirmation errors
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("Malformed wire transaction: {0}")]
    MalformedTransaction(String),

    #[error("Payment store error: {0}")]
    Store(String),

    #[error("Send failed for {signature:?}: {reason}")]
    SendFailed {
        signature: Option<String>,
        reason: String,
    },
}

impl SubmitError {
    /// Signature recovered before the failing step, if any. A known
    /// signature lets the reconciler mark the payment failed instead of
    /// leaving it pending forever.
    pub fn signature(&self) -> Option<&str> {
        match self {
            SubmitError::SendFailed { signature, .. } => signature.as_deref(),
            _ => None,
        }
    }
}

/// General application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Simulation failure: {0}")]
    SimulationFailure(String),

    #[error("Submission failure: {0}")]
    SubmissionFailure(String),

    #[error("Store error: {0}")]
    StoreError(String),
}

impl From<BuildError> for AppError {
    fn from(err: BuildError) -> Self {
        match err {
            BuildError::Validation(msg) => AppError::ValidationError(msg),
            BuildError::UnsupportedOperation(msg) => AppError::ValidationError(msg),
            BuildError::UnknownMint(mint) => {
                AppError::ValidationError(format!("unknown mint {}", mint))
            }
            BuildError::ExternalService(msg) => AppError::ExternalServiceError(msg),
        }
    }
}

impl From<SubmitError> for AppError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::MalformedTransaction(msg) => AppError::ValidationError(msg),
            SubmitError::Store(msg) => AppError::StoreError(msg),
            SubmitError::SendFailed { .. } => AppError::SubmissionFailure(err.to_string()),
        }
    }
}
