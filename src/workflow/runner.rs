use super::finalizer::Finalizer;
use super::relay::{RelayGate, RelayState};
use crate::crypto::AccountId;
use crate::engine::{simulate, ExecutionReport, LedgerEngine, Snapshot};
use crate::error::{ConsoleError, Result};
use crate::script::{assemble, InvocationStep};
use crate::signer::{normalize, WitnessScope};
use crate::transaction::{Transaction, TxHash};
use crate::wallet::SharedWallet;
use tracing::warn;

/// Asked after a faulting dry-run, before anything is signed.
pub const CONTINUE_AFTER_FAULT_PROMPT: &str = "Dry-run faulted. Sign anyway?(no|yes)";

/// What to do when the dry-run faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaultPolicy {
    /// Show the fault and let the operator decide whether to sign.
    #[default]
    Continue,
    /// Stop after showing the fault.
    Refuse,
}

/// Progress reported to whoever is driving the workflow.
#[derive(Debug)]
pub enum WorkflowEvent<'a> {
    ScriptAssembled(&'a [u8]),
    DryRun(&'a ExecutionReport),
    Finalized(&'a Transaction),
    Relayed(TxHash),
    RelayFailed(&'a str),
    Aborted,
}

/// The human (or test) at the console.
pub trait Operator {
    fn notify(&mut self, event: WorkflowEvent<'_>);

    /// Yes/no question; `true` only for an explicit yes.
    fn confirm(&mut self, question: &str) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InvocationRequest {
    pub steps: Vec<InvocationStep>,
    pub sender: Option<AccountId>,
    pub accounts: Option<Vec<AccountId>>,
    pub scope: WitnessScope,
    pub fault_policy: FaultPolicy,
}

impl InvocationRequest {
    pub fn new(steps: Vec<InvocationStep>) -> Self {
        InvocationRequest {
            steps,
            ..Default::default()
        }
    }

    pub fn with_sender(mut self, sender: Option<AccountId>) -> Self {
        self.sender = sender;
        self
    }

    pub fn with_accounts(mut self, accounts: Option<Vec<AccountId>>) -> Self {
        self.accounts = accounts;
        self
    }

    pub fn with_scope(mut self, scope: WitnessScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_fault_policy(mut self, policy: FaultPolicy) -> Self {
        self.fault_policy = policy;
        self
    }
}

#[derive(Debug)]
pub enum WorkflowOutcome {
    /// No wallet open: the dry-run is all there is.
    Simulated(ExecutionReport),
    /// The dry-run faulted under [`FaultPolicy::Refuse`].
    Refused(ExecutionReport),
    /// The operator said no: to signing after a fault (`tx` is `None`)
    /// or to the relay.
    Aborted {
        report: ExecutionReport,
        tx: Option<Transaction>,
    },
    Relayed {
        report: ExecutionReport,
        tx: Transaction,
        hash: TxHash,
    },
    /// Confirmed and signed, but the node did not take it.
    RelayFailed {
        report: ExecutionReport,
        tx: Transaction,
        reason: String,
    },
}

impl WorkflowOutcome {
    pub fn report(&self) -> &ExecutionReport {
        match self {
            WorkflowOutcome::Simulated(report) | WorkflowOutcome::Refused(report) => report,
            WorkflowOutcome::Aborted { report, .. }
            | WorkflowOutcome::Relayed { report, .. }
            | WorkflowOutcome::RelayFailed { report, .. } => report,
        }
    }

    pub fn transaction(&self) -> Option<&Transaction> {
        match self {
            WorkflowOutcome::Simulated(_) | WorkflowOutcome::Refused(_) => None,
            WorkflowOutcome::Aborted { tx, .. } => tx.as_ref(),
            WorkflowOutcome::Relayed { tx, .. } | WorkflowOutcome::RelayFailed { tx, .. } => Some(tx),
        }
    }

    /// Where the relay gate ended up, if a transaction reached it.
    pub fn relay_state(&self) -> Option<RelayState> {
        match self {
            WorkflowOutcome::Simulated(_) | WorkflowOutcome::Refused(_) => None,
            WorkflowOutcome::Aborted { .. } => Some(RelayState::Aborted),
            WorkflowOutcome::Relayed { .. } => Some(RelayState::Relayed),
            WorkflowOutcome::RelayFailed { .. } => Some(RelayState::Confirmed),
        }
    }
}

/// Normalize, assemble, dry-run, then (with a wallet) finalize and gate the relay.
pub struct InvocationWorkflow<'a> {
    engine: &'a dyn LedgerEngine,
    wallet: Option<SharedWallet>,
    network_magic: u32,
}

impl<'a> InvocationWorkflow<'a> {
    pub fn new(engine: &'a dyn LedgerEngine, wallet: Option<SharedWallet>, network_magic: u32) -> Self {
        InvocationWorkflow {
            engine,
            wallet,
            network_magic,
        }
    }

    pub fn wallet_open(&self) -> bool {
        self.wallet.as_ref().is_some_and(|w| w.lock().is_open())
    }

    /// Acquires a fresh snapshot and runs [`execute_at`](Self::execute_at).
    pub fn execute(
        &self,
        request: InvocationRequest,
        operator: &mut dyn Operator,
    ) -> Result<WorkflowOutcome> {
        let snapshot = self.engine.snapshot()?;
        self.execute_at(request, &snapshot, operator)
    }

    pub fn execute_at(
        &self,
        request: InvocationRequest,
        snapshot: &Snapshot,
        operator: &mut dyn Operator,
    ) -> Result<WorkflowOutcome> {
        let wallet_open = self.wallet_open();
        let signers = normalize(
            request.sender,
            request.accounts.as_deref(),
            wallet_open,
            request.scope,
        );

        let script = assemble(&request.steps)?;
        operator.notify(WorkflowEvent::ScriptAssembled(&script));

        let draft = Transaction::draft(script.clone(), signers.clone());
        let report = simulate(self.engine, &script, snapshot, Some(&draft))?;
        operator.notify(WorkflowEvent::DryRun(&report));

        if report.is_fault() && request.fault_policy == FaultPolicy::Refuse {
            return Ok(WorkflowOutcome::Refused(report));
        }
        if !wallet_open {
            return Ok(WorkflowOutcome::Simulated(report));
        }

        let fault_acknowledged = report.is_fault();
        if fault_acknowledged && !operator.confirm(CONTINUE_AFTER_FAULT_PROMPT) {
            operator.notify(WorkflowEvent::Aborted);
            return Ok(WorkflowOutcome::Aborted { report, tx: None });
        }

        let tx = Finalizer::new(self.wallet.clone(), self.network_magic)
            .with_fault_acknowledged(fault_acknowledged)
            .finalize(self.engine, snapshot, &script, request.sender, &signers, &report)?;
        operator.notify(WorkflowEvent::Finalized(&tx));

        let mut gate = RelayGate::new(tx);
        if gate.confirm(|question| operator.confirm(question)) == RelayState::Aborted {
            operator.notify(WorkflowEvent::Aborted);
            return Ok(WorkflowOutcome::Aborted {
                report,
                tx: Some(gate.into_transaction()),
            });
        }

        match gate.relay(self.engine) {
            Ok(hash) => {
                operator.notify(WorkflowEvent::Relayed(hash));
                Ok(WorkflowOutcome::Relayed {
                    report,
                    tx: gate.into_transaction(),
                    hash,
                })
            }
            Err(e) => {
                let reason = match e {
                    ConsoleError::Relay(reason) => reason,
                    other => other.to_string(),
                };
                warn!(reason = %reason, "relay failed");
                operator.notify(WorkflowEvent::RelayFailed(&reason));
                Ok(WorkflowOutcome::RelayFailed {
                    report,
                    tx: gate.into_transaction(),
                    reason,
                })
            }
        }
    }

    /// Dry-run only, for read-only commands.
    pub fn preview(&self, steps: &[InvocationStep], snapshot: &Snapshot) -> Result<ExecutionReport> {
        let script = assemble(steps)?;
        simulate(self.engine, &script, snapshot, None)
    }
}
