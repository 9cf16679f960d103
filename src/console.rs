//! Terminal front end: prints scripts, dry-run reports and replies, and asks
//! the relay question on stdin.

use crate::commands::{catalog, Reply, Session};
use crate::engine::ExecutionReport;
use crate::error::ConsoleError;
use crate::transaction::Transaction;
use crate::workflow::{is_affirmative, Operator, WorkflowEvent, WorkflowOutcome};
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color as TableColor, ContentArrangement, Table};
use ::console::Term;
use std::io::{self, BufRead};
use tracing::warn;

pub const SHELL_PROMPT: &str = "trinity> ";

pub struct TerminalOperator {
    term: Term,
}

impl TerminalOperator {
    pub fn new() -> Self {
        TerminalOperator {
            term: Term::stdout(),
        }
    }

    /// Prints `prompt` and reads one line; `None` at end of input.
    pub fn next_line(&self, prompt: &str) -> Option<String> {
        if let Err(e) = self.term.write_str(prompt) {
            warn!("cannot write prompt: {}", e);
        }
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line),
            Err(e) => {
                warn!("cannot read input: {}", e);
                None
            }
        }
    }

    /// Like [`next_line`](Self::next_line), but end of input reads as empty.
    pub fn read_input(&self, prompt: &str) -> String {
        self.next_line(prompt).unwrap_or_default()
    }
}

impl Default for TerminalOperator {
    fn default() -> Self {
        Self::new()
    }
}

impl Operator for TerminalOperator {
    fn notify(&mut self, event: WorkflowEvent<'_>) {
        match event {
            WorkflowEvent::ScriptAssembled(script) => {
                println!("Invoking script with: '{}'", hex::encode(script).bright_white());
            }
            WorkflowEvent::DryRun(report) => print_report(report),
            WorkflowEvent::Finalized(tx) => print_transaction(tx),
            WorkflowEvent::Relayed(hash) => println!(
                "{} 0x{}",
                "Signed and relayed transaction with hash:".bright_green(),
                hex::encode(hash)
            ),
            WorkflowEvent::RelayFailed(reason) => {
                println!("{} {}", "Relay failed:".red().bold(), reason)
            }
            WorkflowEvent::Aborted => println!("{}", "Transaction not relayed.".yellow()),
        }
    }

    fn confirm(&mut self, question: &str) -> bool {
        is_affirmative(&self.read_input(&format!("{}: ", question)))
    }
}

pub fn print_report(report: &ExecutionReport) {
    let state = if report.is_fault() {
        report.state.to_string().red().bold()
    } else {
        report.state.to_string().bright_green().bold()
    };
    println!("VM State: {}", state);
    println!("Gas Consumed: {}", report.gas_consumed);
    if let Some(exception) = &report.exception {
        println!("Exception: {}", exception.red());
    }
    if !report.stack.is_empty() {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("#").fg(TableColor::Cyan).add_attribute(Attribute::Bold),
                Cell::new("Type").fg(TableColor::Cyan).add_attribute(Attribute::Bold),
                Cell::new("Value").fg(TableColor::Cyan).add_attribute(Attribute::Bold),
            ]);
        for (i, item) in report.stack.iter().enumerate() {
            table.add_row(vec![
                Cell::new(i),
                Cell::new(item.type_name()),
                Cell::new(item.to_string()),
            ]);
        }
        println!("Result Stack:\n{}", table);
    }
    for notification in &report.notifications {
        println!(
            "{} {} {}",
            "Notification:".bright_cyan(),
            notification.event_name.bright_white(),
            format!("from {} {}", notification.contract, notification.state).dimmed()
        );
    }
}

fn print_transaction(tx: &Transaction) {
    println!(
        "Tx {} | system fee {} | network fee {} | valid until block {}",
        tx.hash_str().bright_white(),
        tx.system_fee,
        tx.network_fee,
        tx.valid_until_block
    );
}

pub fn print_error(error: &ConsoleError) {
    eprintln!("{} {}", "Error:".red().bold(), error);
}

pub fn print_reply(reply: &Reply) {
    match reply {
        Reply::Empty | Reply::Exit => {}
        Reply::Help(text) => print!("{}", text),
        Reply::Workflow(outcome) => {
            if let WorkflowOutcome::Refused(_) = outcome {
                println!("{}", "Dry-run faulted; not signing.".yellow());
            } else if let WorkflowOutcome::Simulated(_) = outcome {
                println!("{}", "No wallet open; dry-run only.".dimmed());
            }
        }
        Reply::Integer { label, value } => println!("{}: {}", label, value.to_string().bright_white()),
        Reply::Accounts { label, accounts } => {
            if !accounts.is_empty() {
                println!("{}:", label);
                for account in accounts {
                    println!("  {}", account);
                }
            }
        }
        Reply::PublicKeys { label, keys } => {
            println!("{}:", label);
            for key in keys {
                println!("  {}", key);
            }
        }
        Reply::Stack(report) => print_report(report),
    }
}

pub fn print_catalog() {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Category").fg(TableColor::Cyan).add_attribute(Attribute::Bold),
            Cell::new("Usage").fg(TableColor::Cyan).add_attribute(Attribute::Bold),
            Cell::new("Description").fg(TableColor::Cyan).add_attribute(Attribute::Bold),
        ]);
    for spec in catalog() {
        let usage = if spec.is_state_changing() {
            Cell::new(spec.usage()).fg(TableColor::Yellow)
        } else {
            Cell::new(spec.usage()).fg(TableColor::Green)
        };
        table.add_row(vec![Cell::new(spec.category), usage, Cell::new(spec.help)]);
    }
    println!("{}", table);
}

/// Runs one line and prints whatever it produced. Returns `false` on exit.
pub fn run_line(session: &Session<'_>, operator: &mut TerminalOperator, line: &str) -> bool {
    match session.execute_line(line, operator) {
        Ok(Reply::Exit) => false,
        Ok(reply) => {
            print_reply(&reply);
            true
        }
        Err(e) => {
            print_error(&e);
            true
        }
    }
}

/// Interactive loop until `exit`, `quit` or end of input. No error ends it.
pub fn run_shell(session: &Session<'_>, operator: &mut TerminalOperator) {
    println!("{}", "Trinity operator console. Type 'help' for commands.".bright_cyan());
    loop {
        let Some(line) = operator.next_line(&SHELL_PROMPT.bright_magenta().to_string()) else {
            break;
        };
        if !run_line(session, operator, line.trim()) {
            break;
        }
    }
}
