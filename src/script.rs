//! Script assembly: turns an ordered list of contract calls into one VM script.

pub mod builder;
pub mod parameter;

pub use builder::*;
pub use parameter::*;

use crate::crypto::AccountId;
use crate::error::{ConsoleError, Result};
use tracing::debug;

/// One contract method call within a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationStep {
    pub contract: AccountId,
    pub method: String,
    pub args: Vec<ContractParameter>,
}

impl InvocationStep {
    pub fn new(contract: AccountId, method: impl Into<String>, args: Vec<ContractParameter>) -> Self {
        InvocationStep {
            contract,
            method: method.into(),
            args,
        }
    }

    pub fn without_args(contract: AccountId, method: impl Into<String>) -> Self {
        Self::new(contract, method, Vec::new())
    }
}

/// Serializes `steps` in call order. Later steps run after earlier ones
/// complete, inside the same execution; a fault in any step faults the
/// whole script.
pub fn assemble(steps: &[InvocationStep]) -> Result<Vec<u8>> {
    if steps.is_empty() {
        return Err(ConsoleError::Encoding("Nothing to invoke".to_string()));
    }

    let mut sb = ScriptBuilder::new();
    for step in steps {
        sb.emit_dynamic_call(&step.contract, &step.method, &step.args)
            .map_err(|e| match e {
                ConsoleError::Encoding(msg) => {
                    ConsoleError::Encoding(format!("{}.{}: {}", step.contract, step.method, msg))
                }
                other => other,
            })?;
    }

    let script = sb.into_bytes();
    debug!(steps = steps.len(), bytes = script.len(), "assembled invocation script");
    Ok(script)
}
