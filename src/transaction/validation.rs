use crate::crypto::{parse_invocation_script, parse_verification_script, verify_signature};
use crate::error::ConsoleError;
use crate::signer::Signer;
use crate::transaction::types::{Transaction, MAX_TRANSACTION_ATTRIBUTES, MAX_TRANSACTION_SIZE};
use std::collections::HashSet;

/// The ledger rejects transactions naming the same signer twice.
pub fn validate_unique_signers(signers: &[Signer]) -> Result<(), ConsoleError> {
    let mut seen = HashSet::with_capacity(signers.len());
    for signer in signers {
        if !seen.insert(signer.account) {
            return Err(ConsoleError::InvalidOperation(format!(
                "Duplicate signer {}",
                signer.account
            )));
        }
    }
    Ok(())
}

pub fn validate_size(tx: &Transaction) -> Result<(), ConsoleError> {
    let size = tx.size()?;
    if size > MAX_TRANSACTION_SIZE {
        return Err(ConsoleError::InvalidOperation(format!(
            "Transaction too large: {} bytes (max: {})",
            size, MAX_TRANSACTION_SIZE
        )));
    }
    if tx.attributes.len() > MAX_TRANSACTION_ATTRIBUTES {
        return Err(ConsoleError::InvalidOperation(format!(
            "Too many attributes: {} (max: {})",
            tx.attributes.len(),
            MAX_TRANSACTION_ATTRIBUTES
        )));
    }
    Ok(())
}

/// One witness per signer, in signer order, each hashing to its signer's
/// account and carrying a valid signature over the signing data.
pub fn validate_witnesses(tx: &Transaction, network_magic: u32) -> Result<(), ConsoleError> {
    if tx.witnesses.len() != tx.signers.len() {
        return Err(ConsoleError::InvalidOperation(format!(
            "Expected {} witnesses, found {}",
            tx.signers.len(),
            tx.witnesses.len()
        )));
    }

    let message = tx.signing_data(network_magic);
    for (signer, witness) in tx.signers.iter().zip(&tx.witnesses) {
        if witness.account() != signer.account {
            return Err(ConsoleError::InvalidOperation(format!(
                "Witness does not belong to signer {}",
                signer.account
            )));
        }
        let public_key = parse_verification_script(&witness.verification_script).ok_or_else(|| {
            ConsoleError::InvalidOperation(format!(
                "Unsupported verification script for {}",
                signer.account
            ))
        })?;
        let signature = parse_invocation_script(&witness.invocation_script).ok_or_else(|| {
            ConsoleError::InvalidOperation(format!("Malformed invocation script for {}", signer.account))
        })?;
        verify_signature(&public_key, &message, signature)
            .map_err(|e| ConsoleError::InvalidOperation(format!("{}: {}", signer.account, e)))?;
    }
    Ok(())
}

/// Everything a signed transaction must satisfy before it is offered for relay.
pub fn validate_signed(tx: &Transaction, network_magic: u32) -> Result<(), ConsoleError> {
    if tx.signers.is_empty() {
        return Err(ConsoleError::InvalidOperation("Transaction has no signers".to_string()));
    }
    if tx.script.is_empty() {
        return Err(ConsoleError::InvalidOperation("Transaction has no script".to_string()));
    }
    validate_unique_signers(&tx.signers)?;
    validate_size(tx)?;
    validate_witnesses(tx, network_magic)
}
