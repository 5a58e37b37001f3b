//! Coursepay - on-chain payment pipeline for a Solana course marketplace
//! Built with Domain-Driven Design principles

pub mod domain;
pub mod infrastructure;
pub mod application;
pub mod shared;

// Re-export main types for convenience
pub use application::PaymentService;
pub use domain::payment::{Payment, PaymentStatus};
pub use domain::{
    ComputeBudgetPreparer, HoldingsReader, InstructionBuilder, PaymentReconciler,
    TransactionAssembler, TransactionSubmitter,
};
pub use shared::types::{PaymentIntent, PricedTokenHolding, PriorityLevel, TransactionRequest};
