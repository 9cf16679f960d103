use crate::engine::{BroadcastResult, LedgerEngine};
use crate::error::{ConsoleError, Result};
use crate::transaction::{Transaction, TxHash};
use tracing::info;

pub const RELAY_PROMPT: &str = "Relay tx(no|yes)";

/// The only answer that confirms a relay.
pub const AFFIRMATIVE: &str = "yes";

/// `Drafted -> Confirmed -> Relayed`, or `Drafted -> Aborted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Drafted,
    Confirmed,
    Relayed,
    Aborted,
}

/// Only the exact line `yes` confirms; the line terminator is not part of
/// the answer. `y`, `YES`, an empty line or anything else means no.
pub fn is_affirmative(answer: &str) -> bool {
    answer.trim_end_matches(['\n', '\r']) == AFFIRMATIVE
}

/// Holds a signed transaction until the operator has decided its fate.
#[derive(Debug)]
pub struct RelayGate {
    tx: Transaction,
    state: RelayState,
}

impl RelayGate {
    pub fn new(tx: Transaction) -> Self {
        RelayGate {
            tx,
            state: RelayState::Drafted,
        }
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }

    pub fn into_transaction(self) -> Transaction {
        self.tx
    }

    /// Asks once. Has no effect outside `Drafted`.
    pub fn confirm<F>(&mut self, ask: F) -> RelayState
    where
        F: FnOnce(&str) -> bool,
    {
        if self.state == RelayState::Drafted {
            self.state = if ask(RELAY_PROMPT) {
                RelayState::Confirmed
            } else {
                RelayState::Aborted
            };
        }
        self.state
    }

    /// Broadcasts a confirmed transaction. A rejection leaves the gate in
    /// `Confirmed`; the signed transaction is not rebuilt or retried.
    pub fn relay(&mut self, engine: &dyn LedgerEngine) -> Result<TxHash> {
        if self.state != RelayState::Confirmed {
            return Err(ConsoleError::InvalidOperation(format!(
                "Cannot relay a transaction in state {:?}",
                self.state
            )));
        }
        match engine.broadcast(&self.tx)? {
            BroadcastResult::Accepted(hash) => {
                self.state = RelayState::Relayed;
                info!(hash = %format!("0x{}", hex::encode(hash)), "transaction relayed");
                Ok(hash)
            }
            BroadcastResult::Rejected(reason) => Err(ConsoleError::Relay(reason)),
        }
    }
}
