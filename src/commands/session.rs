use super::catalog::{catalog, find, CommandKind, CommandSpec, Render, SENDER, SIGNERS};
use super::schema::bind;
use super::scope::CommandScope;
use super::tokenizer::tokenize;
use crate::crypto::AccountId;
use crate::engine::{ExecutionReport, LedgerEngine};
use crate::error::{ConsoleError, Result};
use crate::wallet::SharedWallet;
use crate::workflow::{InvocationRequest, InvocationWorkflow, Operator, WorkflowOutcome};
use std::collections::BTreeMap;
use tracing::debug;

/// What a console line produced, for the front end to present.
#[derive(Debug)]
pub enum Reply {
    Empty,
    Exit,
    Help(String),
    Workflow(WorkflowOutcome),
    Integer { label: &'static str, value: i128 },
    Accounts { label: &'static str, accounts: Vec<AccountId> },
    PublicKeys { label: &'static str, keys: Vec<String> },
    /// Raw result stack, also used when a read-only call faults.
    Stack(ExecutionReport),
}

/// Dispatches console lines. Holds no per-command state: every line gets a
/// fresh [`CommandScope`] and therefore a fresh snapshot.
pub struct Session<'a> {
    engine: &'a dyn LedgerEngine,
    wallet: Option<SharedWallet>,
    network_magic: u32,
}

impl<'a> Session<'a> {
    pub fn new(engine: &'a dyn LedgerEngine, wallet: Option<SharedWallet>, network_magic: u32) -> Self {
        Session {
            engine,
            wallet,
            network_magic,
        }
    }

    pub fn execute_line(&self, line: &str, operator: &mut dyn Operator) -> Result<Reply> {
        let tokens = tokenize(line)?;
        let Some(first) = tokens.first() else {
            return Ok(Reply::Empty);
        };

        match first.to_ascii_lowercase().as_str() {
            "exit" | "quit" => return Ok(Reply::Exit),
            "help" => return help(&tokens[1..]).map(Reply::Help),
            _ => {}
        }

        let (spec, consumed) =
            find(&tokens).ok_or_else(|| ConsoleError::UnknownCommand(tokens.join(" ")))?;
        self.execute(spec, &tokens[consumed..], operator)
    }

    pub fn execute(
        &self,
        spec: &CommandSpec,
        raw_args: &[String],
        operator: &mut dyn Operator,
    ) -> Result<Reply> {
        let args = bind(&spec.all_params(), raw_args).map_err(|e| match e {
            ConsoleError::InvalidInput(msg) => {
                ConsoleError::InvalidInput(format!("{} (usage: {})", msg, spec.usage()))
            }
            other => other,
        })?;
        debug!(command = spec.name, "dispatching");

        let workflow = InvocationWorkflow::new(self.engine, self.wallet.clone(), self.network_magic);
        if let CommandKind::StateChanging {
            needs_wallet: true, ..
        } = spec.kind
        {
            if !workflow.wallet_open() {
                return Err(ConsoleError::InvalidOperation(format!(
                    "'{}' needs an open wallet",
                    spec.name
                )));
            }
        }

        let sender = args.opt_account(SENDER);
        let mut scope = CommandScope::new(self.engine, self.wallet.clone(), sender);
        let steps = (spec.plan)(&args, &mut scope)?;

        match spec.kind {
            CommandKind::StateChanging { fault_policy, .. } => {
                let request = InvocationRequest::new(steps)
                    .with_sender(sender)
                    .with_accounts(args.accounts(SIGNERS))
                    .with_fault_policy(fault_policy);
                let outcome = workflow.execute_at(request, scope.snapshot()?, operator)?;
                Ok(Reply::Workflow(outcome))
            }
            CommandKind::ReadOnly(render) => {
                let report = workflow.preview(&steps, scope.snapshot()?)?;
                render_result(render, report)
            }
        }
    }
}

fn render_result(render: Render, report: ExecutionReport) -> Result<Reply> {
    if report.is_fault() {
        return Ok(Reply::Stack(report));
    }
    let unexpected = |what: &str| ConsoleError::Engine(format!("Expected {} on the result stack", what));

    match render {
        Render::Stack => Ok(Reply::Stack(report)),
        Render::Integer(label) => {
            let value = report
                .result()
                .and_then(|item| item.as_integer())
                .ok_or_else(|| unexpected("an integer"))?;
            Ok(Reply::Integer { label, value })
        }
        Render::Accounts(label) => {
            let items = report
                .result()
                .and_then(|item| item.as_array())
                .ok_or_else(|| unexpected("an array"))?;
            let accounts = items
                .iter()
                .map(|item| item.as_account().ok_or_else(|| unexpected("account hashes")))
                .collect::<Result<Vec<_>>>()?;
            Ok(Reply::Accounts { label, accounts })
        }
        Render::PublicKeys(label) => {
            let items = report
                .result()
                .and_then(|item| item.as_array())
                .ok_or_else(|| unexpected("an array"))?;
            let keys = items
                .iter()
                .map(|item| item.as_bytes().map(hex::encode).ok_or_else(|| unexpected("public keys")))
                .collect::<Result<Vec<_>>>()?;
            Ok(Reply::PublicKeys { label, keys })
        }
    }
}

/// `help` lists the catalog by category; `help <command>` shows one usage line.
pub fn help(words: &[String]) -> Result<String> {
    if words.is_empty() {
        let mut by_category: BTreeMap<&str, Vec<&CommandSpec>> = BTreeMap::new();
        for spec in catalog() {
            by_category.entry(spec.category).or_default().push(spec);
        }
        let mut text = String::new();
        for (category, specs) in by_category {
            text.push_str(&format!("{}:\n", category));
            for spec in specs {
                text.push_str(&format!("  {}\n", spec.usage()));
            }
        }
        text.push_str("Base Commands:\n  help [command]\n  exit\n");
        return Ok(text);
    }

    match find(words) {
        Some((spec, consumed)) if consumed == words.len() => {
            Ok(format!("{}\n  {}", spec.usage(), spec.help))
        }
        _ => Err(ConsoleError::UnknownCommand(words.join(" "))),
    }
}
