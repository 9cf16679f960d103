//! [`LedgerEngine`] over a running node's JSON-RPC interface.

use crate::config::RpcConfig;
use crate::crypto::AccountId;
use crate::engine::{
    BroadcastResult, ExecutionReport, LedgerEngine, Notification, Snapshot, StackItem, VmState,
};
use crate::error::{ConsoleError, Result};
use crate::signer::Signer;
use crate::transaction::{Transaction, TxHash};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Clone)]
pub struct RpcLedger {
    url: String,
    agent: ureq::Agent,
}

impl RpcLedger {
    pub fn new(url: &str, timeout: Duration) -> Self {
        RpcLedger {
            url: url.to_string(),
            agent: ureq::AgentBuilder::new()
                .timeout(timeout)
                .timeout_connect(timeout)
                .build(),
        }
    }

    pub fn from_config(config: &RpcConfig) -> Self {
        Self::new(&config.url, Duration::from_secs(config.timeout_secs))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn request(&self, method: &str, params: Value) -> Result<RpcResponse> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        debug!(method, url = %self.url, "rpc request");

        self.agent
            .post(&self.url)
            .set("Content-Type", "application/json")
            .send_json(&body)
            .map_err(|e| ConsoleError::Engine(format!("{} request failed: {}", method, e)))?
            .into_json()
            .map_err(|e| ConsoleError::Engine(format!("{} returned malformed JSON: {}", method, e)))
    }

    fn call(&self, method: &str, params: Value) -> Result<Value> {
        let response = self.request(method, params)?;
        if let Some(error) = response.error {
            return Err(ConsoleError::Engine(format!(
                "{} failed ({}): {}",
                method, error.code, error.message
            )));
        }
        response
            .result
            .ok_or_else(|| ConsoleError::Engine(format!("{} returned no result", method)))
    }
}

impl LedgerEngine for RpcLedger {
    fn snapshot(&self) -> Result<Snapshot> {
        let count = self
            .call("getblockcount", json!([]))?
            .as_u64()
            .ok_or_else(|| ConsoleError::Engine("getblockcount returned a non-integer".to_string()))?;
        let height = u32::try_from(count.saturating_sub(1))
            .map_err(|_| ConsoleError::Engine(format!("Block count {} out of range", count)))?;
        Ok(Snapshot::at_height(height))
    }

    fn run(
        &self,
        script: &[u8],
        _snapshot: &Snapshot,
        container: Option<&Transaction>,
    ) -> Result<ExecutionReport> {
        let signers = container.map(|tx| signers_json(&tx.signers)).unwrap_or_else(|| json!([]));
        let result = self.call("invokescript", json!([BASE64.encode(script), signers]))?;
        parse_report(&result)
    }

    fn broadcast(&self, tx: &Transaction) -> Result<BroadcastResult> {
        let raw = BASE64.encode(tx.to_bytes()?);
        let response = self.request("sendrawtransaction", json!([raw]))?;
        Ok(parse_broadcast(response.result, response.error.map(|e| e.message)))
    }
}

pub fn signers_json(signers: &[Signer]) -> Value {
    Value::Array(
        signers
            .iter()
            .map(|s| json!({ "account": s.account.to_string(), "scopes": s.scope.as_str() }))
            .collect(),
    )
}

fn parse_broadcast(result: Option<Value>, error: Option<String>) -> BroadcastResult {
    if let Some(message) = error {
        return BroadcastResult::Rejected(message);
    }
    let hash = result
        .as_ref()
        .and_then(|r| r.get("hash"))
        .and_then(Value::as_str)
        .and_then(|h| parse_hash(h).ok());
    match hash {
        Some(hash) => BroadcastResult::Accepted(hash),
        None => BroadcastResult::Rejected("node did not return a transaction hash".to_string()),
    }
}

fn parse_hash(text: &str) -> Result<TxHash> {
    let bytes = hex::decode(text.trim_start_matches("0x"))
        .map_err(|e| ConsoleError::Engine(format!("Malformed hash '{}': {}", text, e)))?;
    bytes
        .try_into()
        .map_err(|_| ConsoleError::Engine(format!("Hash '{}' is not 32 bytes", text)))
}

fn integer_field(value: Option<&Value>) -> Option<i128> {
    match value? {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_i64().map(i128::from),
        _ => None,
    }
}

/// Decodes an `invokescript` result.
pub fn parse_report(result: &Value) -> Result<ExecutionReport> {
    let malformed = |what: &str| ConsoleError::Engine(format!("Malformed invokescript result: {}", what));

    let state = match result.get("state").and_then(Value::as_str) {
        Some(s) if s.contains("FAULT") => VmState::Fault,
        Some(s) if s.contains("HALT") => VmState::Halt,
        _ => return Err(malformed("missing state")),
    };
    let gas_consumed = integer_field(result.get("gasconsumed"))
        .and_then(|g| i64::try_from(g).ok())
        .ok_or_else(|| malformed("gasconsumed"))?;

    let stack = match result.get("stack") {
        Some(Value::Array(items)) => items.iter().map(parse_stack_item).collect::<Result<Vec<_>>>()?,
        // Nodes send an error string here when the stack cannot be serialized.
        Some(Value::String(_)) | None | Some(Value::Null) => Vec::new(),
        Some(_) => return Err(malformed("stack")),
    };

    let notifications = match result.get("notifications") {
        Some(Value::Array(items)) => items
            .iter()
            .map(parse_notification)
            .collect::<Result<Vec<_>>>()?,
        _ => Vec::new(),
    };

    let exception = result
        .get("exception")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(ExecutionReport {
        state,
        gas_consumed,
        stack,
        notifications,
        exception,
        script: Vec::new(),
    })
}

fn parse_notification(value: &Value) -> Result<Notification> {
    let contract: AccountId = value
        .get("contract")
        .and_then(Value::as_str)
        .ok_or_else(|| ConsoleError::Engine("Notification without contract".to_string()))?
        .parse::<AccountId>()
        .map_err(|e| ConsoleError::Engine(e.to_string()))?;
    let event_name = value
        .get("eventname")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let state = match value.get("state") {
        Some(state) => parse_stack_item(state)?,
        None => StackItem::Any,
    };
    Ok(Notification {
        contract,
        event_name,
        state,
    })
}

/// Decodes one `{"type": ..., "value": ...}` stack item.
pub fn parse_stack_item(value: &Value) -> Result<StackItem> {
    let ty = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| ConsoleError::Engine(format!("Stack item without type: {}", value)))?;
    let inner = value.get("value");
    let bad = || ConsoleError::Engine(format!("Malformed {} stack item: {}", ty, value));

    let bytes = |v: Option<&Value>| -> Result<Vec<u8>> {
        match v {
            Some(Value::String(s)) => BASE64.decode(s).map_err(|_| bad()),
            None | Some(Value::Null) => Ok(Vec::new()),
            _ => Err(bad()),
        }
    };
    let items = |v: Option<&Value>| -> Result<Vec<StackItem>> {
        match v {
            Some(Value::Array(items)) => items.iter().map(parse_stack_item).collect(),
            _ => Err(bad()),
        }
    };

    match ty {
        "Any" => Ok(StackItem::Any),
        "Boolean" => match inner {
            Some(Value::Bool(b)) => Ok(StackItem::Boolean(*b)),
            Some(Value::String(s)) => s.parse().map(StackItem::Boolean).map_err(|_| bad()),
            _ => Err(bad()),
        },
        "Integer" => integer_field(inner).map(StackItem::Integer).ok_or_else(bad),
        "ByteString" => bytes(inner).map(StackItem::ByteString),
        "Buffer" => bytes(inner).map(StackItem::Buffer),
        "Array" => items(inner).map(StackItem::Array),
        "Struct" => items(inner).map(StackItem::Struct),
        "Map" => match inner {
            Some(Value::Array(entries)) => entries
                .iter()
                .map(|entry| {
                    let key = entry.get("key").ok_or_else(bad)?;
                    let val = entry.get("value").ok_or_else(bad)?;
                    Ok((parse_stack_item(key)?, parse_stack_item(val)?))
                })
                .collect::<Result<Vec<_>>>()
                .map(StackItem::Map),
            _ => Err(bad()),
        },
        "Pointer" => integer_field(inner)
            .and_then(|p| u32::try_from(p).ok())
            .map(StackItem::Pointer)
            .ok_or_else(bad),
        "InteropInterface" => Ok(StackItem::InteropInterface),
        other => Err(ConsoleError::Engine(format!("Unknown stack item type '{}'", other))),
    }
}
