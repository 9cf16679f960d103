use crate::crypto::AccountId;
use crate::engine::{LedgerEngine, Snapshot};
use crate::error::Result;
use crate::wallet::SharedWallet;
use tracing::debug;

/// Per-command context handed to a command's plan.
///
/// The ledger snapshot is acquired on first use and dropped with the scope,
/// so one command sees one point-in-time view and no two commands share it.
pub struct CommandScope<'a> {
    engine: &'a dyn LedgerEngine,
    wallet: Option<SharedWallet>,
    sender: Option<AccountId>,
    snapshot: Option<Snapshot>,
}

impl<'a> CommandScope<'a> {
    pub fn new(
        engine: &'a dyn LedgerEngine,
        wallet: Option<SharedWallet>,
        sender: Option<AccountId>,
    ) -> Self {
        CommandScope {
            engine,
            wallet,
            sender,
            snapshot: None,
        }
    }

    pub fn engine(&self) -> &'a dyn LedgerEngine {
        self.engine
    }

    pub fn snapshot(&mut self) -> Result<&Snapshot> {
        let snapshot = match self.snapshot.take() {
            Some(snapshot) => snapshot,
            None => {
                let snapshot = self.engine.snapshot()?;
                debug!(height = snapshot.height, "snapshot acquired");
                snapshot
            }
        };
        Ok(self.snapshot.insert(snapshot))
    }

    /// The explicit sender, else the open wallet's default account.
    pub fn sender(&self) -> Option<AccountId> {
        self.sender.or_else(|| {
            self.wallet
                .as_ref()
                .and_then(|w| w.lock().default_account())
        })
    }
}
