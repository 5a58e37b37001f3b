//! Compute budget & fee preparer
//!
//! Simulates the candidate instruction list to learn compute-unit
//! consumption and asks the fee estimator for a priority fee, then prepends
//! the two governance instructions. Both lookups are advisory: each
//! degrades independently to a named fallback instead of failing the build.

use crate::infrastructure::fee_estimator::PriorityFeeEstimator;
use crate::infrastructure::rpc::ChainRpc;
use crate::shared::types::PriorityLevel;
use crate::shared::utils::encode_wire_transaction;
use solana_sdk::{
    compute_budget::ComputeBudgetInstruction,
    hash::Hash,
    instruction::Instruction,
    message::{v0, VersionedMessage},
    pubkey::Pubkey,
    signature::Signature,
    transaction::VersionedTransaction,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Network ceiling on per-transaction compute units.
pub const MAX_COMPUTE_UNITS: u32 = 1_400_000;
/// Headroom applied on top of the simulated consumption.
pub const COMPUTE_UNIT_SAFETY_FACTOR: f64 = 1.1;
/// Minimum priority fee in micro-lamports per compute unit; anything lower
/// risks a stuck transaction.
pub const PRIORITY_FEE_FLOOR: u64 = 10_000;

/// Create ComputeBudget instruction to set compute unit limit
pub fn create_compute_unit_limit_instruction(compute_units: u32) -> Instruction {
    ComputeBudgetInstruction::set_compute_unit_limit(compute_units)
}

/// Create ComputeBudget instruction to set priority fee
pub fn create_compute_unit_price_instruction(micro_lamports: u64) -> Instruction {
    ComputeBudgetInstruction::set_compute_unit_price(micro_lamports)
}

/// Scale simulated consumption by the safety factor, capped at the network
/// ceiling. Zero consumption means the simulation told us nothing, so the
/// ceiling applies.
pub fn scaled_compute_units(units_consumed: u64) -> u32 {
    if units_consumed == 0 {
        return MAX_COMPUTE_UNITS;
    }
    let scaled = (units_consumed as f64 * COMPUTE_UNIT_SAFETY_FACTOR).ceil();
    if scaled >= MAX_COMPUTE_UNITS as f64 {
        MAX_COMPUTE_UNITS
    } else {
        scaled as u32
    }
}

/// Prepares compute-budget governance instructions for a candidate
/// instruction list
pub struct ComputeBudgetPreparer {
    rpc: Arc<dyn ChainRpc>,
    fee_estimator: Arc<dyn PriorityFeeEstimator>,
}

impl ComputeBudgetPreparer {
    pub fn new(rpc: Arc<dyn ChainRpc>, fee_estimator: Arc<dyn PriorityFeeEstimator>) -> Self {
        Self { rpc, fee_estimator }
    }

    /// Return the instruction list with `[set_compute_unit_limit,
    /// set_compute_unit_price]` prepended in that order.
    ///
    /// The simulation and the fee estimate are independent, so they run
    /// concurrently.
    pub async fn prepare(
        &self,
        instructions: &[Instruction],
        payer: &Pubkey,
        priority_level: Option<PriorityLevel>,
    ) -> Vec<Instruction> {
        let level = priority_level.unwrap_or_default();

        let (compute_units, priority_fee) = match self.throwaway_transaction(instructions, payer) {
            Some(tx) => {
                let (units, fee) =
                    tokio::join!(self.simulate_units(&tx), self.estimate_fee(&tx, level));
                (units, fee)
            }
            None => {
                warn!("Could not compile throwaway message, using fallback budget");
                (MAX_COMPUTE_UNITS, PRIORITY_FEE_FLOOR)
            }
        };

        info!(
            "Compute budget prepared: {} CU, {} micro-lamports/CU",
            compute_units, priority_fee
        );

        let mut prepared = Vec::with_capacity(instructions.len() + 2);
        prepared.push(create_compute_unit_limit_instruction(compute_units));
        prepared.push(create_compute_unit_price_instruction(priority_fee));
        prepared.extend_from_slice(instructions);
        prepared
    }

    /// Unsigned transaction over a placeholder blockhash, good enough for
    /// simulation (sig-verify off) and fee estimation.
    fn throwaway_transaction(
        &self,
        instructions: &[Instruction],
        payer: &Pubkey,
    ) -> Option<VersionedTransaction> {
        let message = v0::Message::try_compile(payer, instructions, &[], Hash::default()).ok()?;
        let num_signatures = message.header.num_required_signatures as usize;
        Some(VersionedTransaction {
            signatures: vec![Signature::default(); num_signatures],
            message: VersionedMessage::V0(message),
        })
    }

    async fn simulate_units(&self, tx: &VersionedTransaction) -> u32 {
        match self.rpc.simulate(tx).await {
            Ok(stats) => {
                if let Some(err) = stats.err {
                    warn!("Simulation reported error, using CU ceiling: {}", err);
                    return MAX_COMPUTE_UNITS;
                }
                scaled_compute_units(stats.units_consumed.unwrap_or(0))
            }
            Err(e) => {
                warn!("Simulation request failed, using CU ceiling: {}", e);
                MAX_COMPUTE_UNITS
            }
        }
    }

    async fn estimate_fee(&self, tx: &VersionedTransaction, level: PriorityLevel) -> u64 {
        let wire = match encode_wire_transaction(tx) {
            Ok(wire) => wire,
            Err(e) => {
                warn!("Could not encode transaction for fee estimate: {}", e);
                return PRIORITY_FEE_FLOOR;
            }
        };
        match self.fee_estimator.estimate(&wire, level).await {
            Ok(estimate) => estimate.max(PRIORITY_FEE_FLOOR),
            Err(e) => {
                warn!("Fee estimator failed, using floor: {}", e);
                PRIORITY_FEE_FLOOR
            }
        }
    }
}
