//! Transaction assembler - binds fee payer and blockhash, compiles the
//! versioned message and encodes the wire transaction handed to the client
//! for signing.

use crate::infrastructure::rpc::ChainRpc;
use crate::shared::errors::AppError;
use crate::shared::utils::encode_wire_transaction;
use solana_sdk::{
    address_lookup_table::{state::AddressLookupTable, AddressLookupTableAccount},
    instruction::Instruction,
    message::{v0, VersionedMessage},
    pubkey::Pubkey,
    signature::Signature,
    transaction::VersionedTransaction,
};
use std::sync::Arc;
use tracing::{info, warn};

pub struct TransactionAssembler {
    rpc: Arc<dyn ChainRpc>,
}

impl TransactionAssembler {
    pub fn new(rpc: Arc<dyn ChainRpc>) -> Self {
        Self { rpc }
    }

    /// Compile the final unsigned transaction and return its base64 wire
    /// form.
    pub async fn assemble(
        &self,
        instructions: &[Instruction],
        lookup_tables: &[Pubkey],
        payer: &Pubkey,
    ) -> Result<String, AppError> {
        let blockhash = self.rpc.latest_blockhash().await?;
        let tables = self.resolve_lookup_tables(lookup_tables).await?;

        let message = v0::Message::try_compile(payer, instructions, &tables, blockhash)
            .map_err(|e| AppError::ValidationError(format!("Message compile failed: {}", e)))?;
        let num_signatures = message.header.num_required_signatures as usize;
        let transaction = VersionedTransaction {
            signatures: vec![Signature::default(); num_signatures],
            message: VersionedMessage::V0(message),
        };

        info!(
            "Assembled transaction: {} instructions, {} lookup tables",
            instructions.len(),
            tables.len()
        );
        encode_wire_transaction(&transaction)
    }

    /// Fetch and deserialize the referenced lookup tables. A table that
    /// cannot be resolved is skipped; compilation then simply uses full
    /// account addresses.
    async fn resolve_lookup_tables(
        &self,
        addresses: &[Pubkey],
    ) -> Result<Vec<AddressLookupTableAccount>, AppError> {
        if addresses.is_empty() {
            return Ok(Vec::new());
        }
        let accounts = self.rpc.get_multiple_account_data(addresses).await?;

        let mut tables = Vec::with_capacity(addresses.len());
        for (address, data) in addresses.iter().zip(accounts) {
            let Some(data) = data else {
                warn!("Lookup table {} not found, skipping", address);
                continue;
            };
            match AddressLookupTable::deserialize(&data) {
                Ok(table) => tables.push(AddressLookupTableAccount {
                    key: *address,
                    addresses: table.addresses.to_vec(),
                }),
                Err(e) => warn!("Lookup table {} undecodable, skipping: {}", address, e),
            }
        }
        Ok(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::testing::FakeChainRpc;
    use crate::shared::utils::decode_wire_transaction;
    use solana_sdk::system_instruction;

    #[tokio::test]
    async fn test_assemble_produces_decodable_unsigned_wire() {
        let payer = Pubkey::new_unique();
        let instructions = vec![system_instruction::transfer(
            &payer,
            &Pubkey::new_unique(),
            1_000,
        )];
        let assembler = TransactionAssembler::new(Arc::new(FakeChainRpc::new()));

        let wire = assembler
            .assemble(&instructions, &[], &payer)
            .await
            .unwrap();
        assert!(!wire.is_empty());

        let tx = decode_wire_transaction(&wire).unwrap();
        assert_eq!(tx.signatures.len(), 1);
        assert_eq!(tx.signatures[0], Signature::default());
        assert_eq!(tx.message.instructions().len(), 1);
    }

    #[tokio::test]
    async fn test_unresolvable_lookup_tables_are_skipped() {
        let payer = Pubkey::new_unique();
        let instructions = vec![system_instruction::transfer(
            &payer,
            &Pubkey::new_unique(),
            1_000,
        )];
        let assembler = TransactionAssembler::new(Arc::new(FakeChainRpc::new()));

        // Table account does not exist in the fake; assembly still succeeds.
        let wire = assembler
            .assemble(&instructions, &[Pubkey::new_unique()], &payer)
            .await
            .unwrap();
        assert!(decode_wire_transaction(&wire).is_ok());
    }
}
