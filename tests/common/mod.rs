#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use trinity_console::crypto::{signature_invocation_script, AccountId, KeyPair};
use trinity_console::engine::{
    BroadcastResult, ExecutionReport, LedgerEngine, Snapshot, StackItem, VmState,
};
use trinity_console::error::{ConsoleError, Result};
use trinity_console::signer::Signer;
use trinity_console::transaction::{Transaction, Witness};
use trinity_console::wallet::{TransactionRequest, Wallet};
use trinity_console::workflow::{is_affirmative, Operator, WorkflowEvent};

pub const MAGIC: u32 = 0x5452_4E59;

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Ledger engine that answers by the method names found in a script.
pub struct MockEngine {
    pub height: u32,
    pub decimals: i128,
    pub balance: i128,
    pub gas_per_run: i64,
    /// Any script mentioning this method faults.
    pub fault_on: Option<&'static str>,
    pub broadcast_result: BroadcastResult,
    pub runs: RefCell<Vec<Vec<u8>>>,
    pub broadcasts: RefCell<Vec<Transaction>>,
    pub snapshots: Cell<usize>,
}

impl Default for MockEngine {
    fn default() -> Self {
        MockEngine {
            height: 100,
            decimals: 8,
            balance: 1_000_000_000_000,
            gas_per_run: 1_000_000,
            fault_on: None,
            broadcast_result: BroadcastResult::Accepted([0xAA; 32]),
            runs: RefCell::new(Vec::new()),
            broadcasts: RefCell::new(Vec::new()),
            snapshots: Cell::new(0),
        }
    }
}

impl MockEngine {
    pub fn faulting_on(method: &'static str) -> Self {
        MockEngine {
            fault_on: Some(method),
            ..Default::default()
        }
    }

    pub fn run_count(&self) -> usize {
        self.runs.borrow().len()
    }

    pub fn broadcast_count(&self) -> usize {
        self.broadcasts.borrow().len()
    }

    fn answer(&self, script: &[u8]) -> Vec<StackItem> {
        let calls = |method: &str| contains(script, method.as_bytes());
        if calls("decimals") {
            vec![StackItem::Integer(self.decimals)]
        } else if calls("symbol") {
            vec![StackItem::ByteString(b"TKN".to_vec())]
        } else if calls("balanceOf") {
            vec![StackItem::Integer(self.balance)]
        } else if calls("getFeePerByte") {
            vec![StackItem::Integer(1000)]
        } else if calls("getBlockedAccounts") {
            vec![StackItem::Array(vec![StackItem::ByteString(vec![0x42; 20])])]
        } else {
            vec![StackItem::Boolean(true)]
        }
    }
}

impl LedgerEngine for MockEngine {
    fn snapshot(&self) -> Result<Snapshot> {
        self.snapshots.set(self.snapshots.get() + 1);
        Ok(Snapshot::at_height(self.height))
    }

    fn run(
        &self,
        script: &[u8],
        _snapshot: &Snapshot,
        _container: Option<&Transaction>,
    ) -> Result<ExecutionReport> {
        self.runs.borrow_mut().push(script.to_vec());
        let faulted = self
            .fault_on
            .is_some_and(|method| contains(script, method.as_bytes()));

        Ok(ExecutionReport {
            state: if faulted { VmState::Fault } else { VmState::Halt },
            gas_consumed: self.gas_per_run,
            stack: if faulted { Vec::new() } else { self.answer(script) },
            notifications: Vec::new(),
            exception: faulted.then(|| "ASSERT is executed with false result.".to_string()),
            script: Vec::new(),
        })
    }

    fn broadcast(&self, tx: &Transaction) -> Result<BroadcastResult> {
        self.broadcasts.borrow_mut().push(tx.clone());
        Ok(self.broadcast_result.clone())
    }
}

/// Signs whatever it is given, faulting dry-run or not.
pub struct MockWallet {
    pub keys: Vec<KeyPair>,
    pub open: bool,
    pub calls: usize,
}

impl MockWallet {
    pub fn with_accounts(count: usize) -> Self {
        MockWallet {
            keys: (0..count).map(|_| KeyPair::generate().unwrap()).collect(),
            open: true,
            calls: 0,
        }
    }

    pub fn account(&self, index: usize) -> AccountId {
        self.keys[index].account_id()
    }
}

impl Wallet for MockWallet {
    fn is_open(&self) -> bool {
        self.open
    }

    fn default_account(&self) -> Option<AccountId> {
        self.keys.first().map(KeyPair::account_id)
    }

    fn accounts(&self) -> Vec<AccountId> {
        self.keys.iter().map(KeyPair::account_id).collect()
    }

    fn make_transaction(&mut self, request: &TransactionRequest<'_>) -> Result<Transaction> {
        self.calls += 1;
        if !self.open {
            return Err(ConsoleError::InvalidOperation("Wallet is not open".to_string()));
        }
        let sender = request
            .sender
            .or_else(|| self.default_account())
            .ok_or_else(|| ConsoleError::InvalidOperation("no sender".to_string()))?;
        let mut signers = vec![Signer::called_by_entry(sender)];
        signers.extend(request.signers.iter().filter(|s| s.account != sender).copied());

        let mut tx = Transaction::draft(request.script.to_vec(), signers);
        tx.valid_until_block = request.snapshot.height + 10;
        let message = tx.signing_data(MAGIC);
        for signer in &tx.signers.clone() {
            let key = self
                .keys
                .iter()
                .find(|k| k.account_id() == signer.account)
                .ok_or_else(|| ConsoleError::InvalidOperation("unknown signer".to_string()))?;
            tx.witnesses.push(Witness {
                invocation_script: signature_invocation_script(&key.sign(&message)?),
                verification_script: key.verification_script(),
            });
        }
        Ok(tx)
    }
}

/// Answers prompts from a queue and records every event.
#[derive(Default)]
pub struct ScriptedOperator {
    pub answers: VecDeque<String>,
    pub questions: Vec<String>,
    pub scripts: Vec<Vec<u8>>,
    pub dry_runs: Vec<ExecutionReport>,
    pub finalized: usize,
    pub relayed: usize,
    pub aborted: usize,
    pub relay_failures: Vec<String>,
}

impl ScriptedOperator {
    pub fn answering(answers: &[&str]) -> Self {
        ScriptedOperator {
            answers: answers.iter().map(|a| a.to_string()).collect(),
            ..Default::default()
        }
    }
}

impl Operator for ScriptedOperator {
    fn notify(&mut self, event: WorkflowEvent<'_>) {
        match event {
            WorkflowEvent::ScriptAssembled(script) => self.scripts.push(script.to_vec()),
            WorkflowEvent::DryRun(report) => self.dry_runs.push(report.clone()),
            WorkflowEvent::Finalized(_) => self.finalized += 1,
            WorkflowEvent::Relayed(_) => self.relayed += 1,
            WorkflowEvent::RelayFailed(reason) => self.relay_failures.push(reason.to_string()),
            WorkflowEvent::Aborted => self.aborted += 1,
        }
    }

    fn confirm(&mut self, question: &str) -> bool {
        self.questions.push(question.to_string());
        let answer = self.answers.pop_front().unwrap_or_default();
        is_affirmative(&answer)
    }
}
