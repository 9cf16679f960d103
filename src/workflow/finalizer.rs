use crate::crypto::AccountId;
use crate::engine::{ExecutionReport, LedgerEngine, Snapshot};
use crate::error::{ConsoleError, Result};
use crate::signer::Signer;
use crate::transaction::{validate_signed, Transaction};
use crate::wallet::{SharedWallet, TransactionRequest};
use tracing::debug;

/// Turns a dry-run script into a signed transaction through the wallet.
///
/// Fees, validity window and sender inference are the wallet's job; the
/// finalizer only guards the handoff. It refuses scripts that were not
/// dry-run, or whose dry-run faulted unless the operator acknowledged the
/// fault. It holds the wallet lock for the duration of `make_transaction`
/// only, and checks what comes back before anyone is asked to relay it.
pub struct Finalizer {
    wallet: Option<SharedWallet>,
    network_magic: u32,
    fault_acknowledged: bool,
}

impl Finalizer {
    pub fn new(wallet: Option<SharedWallet>, network_magic: u32) -> Self {
        Finalizer {
            wallet,
            network_magic,
            fault_acknowledged: false,
        }
    }

    /// The operator chose to sign despite a faulting dry-run.
    pub fn with_fault_acknowledged(mut self, acknowledged: bool) -> Self {
        self.fault_acknowledged = acknowledged;
        self
    }

    pub fn finalize(
        &self,
        engine: &dyn LedgerEngine,
        snapshot: &Snapshot,
        script: &[u8],
        sender: Option<AccountId>,
        signers: &[Signer],
        dry_run: &ExecutionReport,
    ) -> Result<Transaction> {
        let wallet = self
            .wallet
            .as_ref()
            .ok_or_else(|| ConsoleError::InvalidOperation("No wallet is open".to_string()))?;

        if dry_run.script.as_slice() != script {
            return Err(ConsoleError::InvalidOperation(
                "Script must be dry-run before it is finalized".to_string(),
            ));
        }
        if dry_run.is_fault() && !self.fault_acknowledged {
            return Err(ConsoleError::InvalidOperation(
                "Dry-run faulted and the fault was not acknowledged".to_string(),
            ));
        }

        let tx = {
            let mut guard = wallet.lock();
            if !guard.is_open() {
                return Err(ConsoleError::InvalidOperation("Wallet is not open".to_string()));
            }
            guard.make_transaction(&TransactionRequest {
                script,
                sender,
                signers,
                engine,
                snapshot,
                fault_acknowledged: self.fault_acknowledged,
            })?
        };

        if tx.script.as_slice() != script {
            return Err(ConsoleError::InvalidOperation(
                "Wallet returned a transaction for a different script".to_string(),
            ));
        }
        if let Some(sender) = sender {
            if tx.sender() != Some(sender) {
                return Err(ConsoleError::InvalidOperation(format!(
                    "Sender {} is not the first signer",
                    sender
                )));
            }
        }
        validate_signed(&tx, self.network_magic)?;

        debug!(hash = %tx.hash_str(), signers = tx.signers.len(), "transaction finalized");
        Ok(tx)
    }
}
