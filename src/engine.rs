//! Ledger engine collaborator and the dry-run executor.
//!
//! The console never executes scripts itself. Everything that touches ledger
//! state goes through a [`LedgerEngine`]: point-in-time snapshots, read-only
//! script runs, and broadcasting signed transactions.

use crate::crypto::AccountId;
use crate::error::{ConsoleError, Result};
use crate::script::{assemble, ContractParameter, InvocationStep};
use crate::transaction::{Transaction, TxHash};
use chrono::{DateTime, Utc};
use std::fmt;
use tracing::{debug, warn};

/// Read-only, point-in-time view of the ledger. Acquired once per command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Height of the last persisted block.
    pub height: u32,
    pub acquired_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn at_height(height: u32) -> Self {
        Snapshot {
            height,
            acquired_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmState {
    Halt,
    Fault,
}

impl fmt::Display for VmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmState::Halt => write!(f, "HALT"),
            VmState::Fault => write!(f, "FAULT"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackItem {
    Any,
    Boolean(bool),
    Integer(i128),
    ByteString(Vec<u8>),
    Buffer(Vec<u8>),
    Array(Vec<StackItem>),
    Struct(Vec<StackItem>),
    Map(Vec<(StackItem, StackItem)>),
    Pointer(u32),
    InteropInterface,
}

impl StackItem {
    pub fn type_name(&self) -> &'static str {
        match self {
            StackItem::Any => "Any",
            StackItem::Boolean(_) => "Boolean",
            StackItem::Integer(_) => "Integer",
            StackItem::ByteString(_) => "ByteString",
            StackItem::Buffer(_) => "Buffer",
            StackItem::Array(_) => "Array",
            StackItem::Struct(_) => "Struct",
            StackItem::Map(_) => "Map",
            StackItem::Pointer(_) => "Pointer",
            StackItem::InteropInterface => "InteropInterface",
        }
    }

    /// Integer view, following the VM's conversions: booleans are 0/1 and
    /// byte strings are little-endian two's complement.
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            StackItem::Integer(i) => Some(*i),
            StackItem::Boolean(b) => Some(*b as i128),
            StackItem::ByteString(bytes) | StackItem::Buffer(bytes) => {
                if bytes.is_empty() {
                    return Some(0);
                }
                if bytes.len() > 16 {
                    return None;
                }
                let fill = if bytes[bytes.len() - 1] & 0x80 != 0 { 0xFF } else { 0x00 };
                let mut buf = [fill; 16];
                buf[..bytes.len()].copy_from_slice(bytes);
                Some(i128::from_le_bytes(buf))
            }
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            StackItem::ByteString(bytes) | StackItem::Buffer(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<String> {
        self.as_bytes()
            .and_then(|bytes| String::from_utf8(bytes.to_vec()).ok())
    }

    pub fn as_account(&self) -> Option<AccountId> {
        self.as_bytes().and_then(|bytes| AccountId::from_slice(bytes).ok())
    }

    pub fn as_array(&self) -> Option<&[StackItem]> {
        match self {
            StackItem::Array(items) | StackItem::Struct(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for StackItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackItem::Any => write!(f, "null"),
            StackItem::Boolean(b) => write!(f, "{}", b),
            StackItem::Integer(i) => write!(f, "{}", i),
            StackItem::ByteString(bytes) | StackItem::Buffer(bytes) => {
                match std::str::from_utf8(bytes) {
                    Ok(s) if !s.is_empty() && s.chars().all(|c| !c.is_control()) => {
                        write!(f, "\"{}\"", s)
                    }
                    _ => write!(f, "0x{}", hex::encode(bytes)),
                }
            }
            StackItem::Array(items) | StackItem::Struct(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            StackItem::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            StackItem::Pointer(p) => write!(f, "Pointer({})", p),
            StackItem::InteropInterface => write!(f, "InteropInterface"),
        }
    }
}

/// Event emitted by a contract during execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub contract: AccountId,
    pub event_name: String,
    pub state: StackItem,
}

/// Outcome of a dry-run. A fault is a normal result, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    pub state: VmState,
    pub gas_consumed: i64,
    pub stack: Vec<StackItem>,
    pub notifications: Vec<Notification>,
    pub exception: Option<String>,
    /// The script that produced this report.
    pub script: Vec<u8>,
}

impl ExecutionReport {
    pub fn is_fault(&self) -> bool {
        self.state == VmState::Fault
    }

    pub fn result(&self) -> Option<&StackItem> {
        self.stack.first()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastResult {
    Accepted(TxHash),
    Rejected(String),
}

/// The blockchain execution engine, reached only through this interface.
pub trait LedgerEngine {
    fn snapshot(&self) -> Result<Snapshot>;

    /// Executes `script` against `snapshot` without persisting anything.
    /// `container` is the transaction the script would run inside, if any.
    fn run(
        &self,
        script: &[u8],
        snapshot: &Snapshot,
        container: Option<&Transaction>,
    ) -> Result<ExecutionReport>;

    fn broadcast(&self, tx: &Transaction) -> Result<BroadcastResult>;
}

/// Dry-runs `script`. Faults come back inside the report; only an
/// unreachable or misbehaving engine is an error.
pub fn simulate(
    engine: &dyn LedgerEngine,
    script: &[u8],
    snapshot: &Snapshot,
    container: Option<&Transaction>,
) -> Result<ExecutionReport> {
    let mut report = engine.run(script, snapshot, container)?;
    report.script = script.to_vec();

    if report.is_fault() {
        warn!(
            height = snapshot.height,
            exception = report.exception.as_deref().unwrap_or("unknown"),
            "dry-run faulted"
        );
    } else {
        debug!(height = snapshot.height, gas = report.gas_consumed, "dry-run halted");
    }
    Ok(report)
}

/// Runs a single read-only call and returns the top of the result stack.
pub fn call_read_only(
    engine: &dyn LedgerEngine,
    snapshot: &Snapshot,
    contract: AccountId,
    method: &str,
    args: Vec<ContractParameter>,
) -> Result<StackItem> {
    let script = assemble(&[InvocationStep::new(contract, method, args)])?;
    let report = simulate(engine, &script, snapshot, None)?;
    if report.is_fault() {
        return Err(ConsoleError::Engine(format!(
            "{}.{} faulted: {}",
            contract,
            method,
            report.exception.unwrap_or_else(|| "unknown".to_string())
        )));
    }
    report.stack.into_iter().next().ok_or_else(|| {
        ConsoleError::Engine(format!("{}.{} returned nothing", contract, method))
    })
}
