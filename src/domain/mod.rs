//! Domain layer - core payment pipeline logic

pub mod payment;
pub mod builder;
pub mod fees;
pub mod assembler;
pub mod submitter;
pub mod reconciler;
pub mod holdings;

pub use assembler::TransactionAssembler;
pub use builder::InstructionBuilder;
pub use fees::ComputeBudgetPreparer;
pub use holdings::HoldingsReader;
pub use reconciler::PaymentReconciler;
pub use submitter::TransactionSubmitter;
