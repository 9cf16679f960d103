#![forbid(unsafe_code)]
//! Operator console for a TrinityChain node

use clap::{ArgAction, Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use trinity_console::commands::Session;
use trinity_console::config::{load_config, Config};
use trinity_console::console::{print_catalog, run_line, run_shell, TerminalOperator};
use trinity_console::rpc::RpcLedger;
use trinity_console::wallet::{shared, KeyStoreWallet, SharedWallet, Wallet, WalletSettings};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Node JSON-RPC endpoint, overrides the configuration
    #[arg(long, global = true)]
    rpc: Option<String>,
    /// Wallet file to open, overrides the configuration
    #[arg(long, global = true)]
    wallet: Option<PathBuf>,
    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive console (the default)
    Shell,
    /// Runs a single console line, e.g. `exec "get byte fee"`
    Exec {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        line: Vec<String>,
    },
    /// Lists every console command
    Commands,
    /// Creates a key-store wallet with one fresh account
    NewWallet {
        path: PathBuf,
        /// Wallet name
        #[arg(long)]
        label: Option<String>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn log_level(verbose: u8, configured: &str) -> Level {
    match verbose {
        0 => configured.parse().unwrap_or(Level::WARN),
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn open_wallet(cli: &Cli, config: &Config) -> Result<Option<SharedWallet>, Box<dyn std::error::Error>> {
    let settings = WalletSettings::from(config);
    if let Some(path) = &cli.wallet {
        return Ok(Some(shared(KeyStoreWallet::load(path, settings)?)));
    }
    match config.wallet.resolved_path() {
        Some(path) if path.exists() => Ok(Some(shared(KeyStoreWallet::load(&path, settings)?))),
        _ => {
            info!("no wallet file found, running without a wallet");
            Ok(None)
        }
    }
}

fn new_wallet(
    path: &Path,
    label: Option<String>,
    force: bool,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() && !force {
        return Err(format!("{} already exists (use --force to overwrite)", path.display()).into());
    }
    let wallet = KeyStoreWallet::create(label, WalletSettings::from(config))?;
    wallet.save(path)?;

    println!("{}", "Wallet created".bright_green().bold());
    println!("File:    {}", path.display().to_string().bright_white());
    if let Some(account) = wallet.default_account() {
        println!("Account: {}", account.to_string().bright_yellow());
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(url) = &cli.rpc {
        config.rpc.url = url.clone();
    }

    tracing_subscriber::fmt()
        .with_max_level(log_level(cli.verbose, &config.console.log_level))
        .with_writer(std::io::stderr)
        .init();
    if !config.console.color {
        colored::control::set_override(false);
    }

    match &cli.command {
        Some(Commands::Commands) => {
            print_catalog();
            return Ok(());
        }
        Some(Commands::NewWallet { path, label, force }) => {
            return new_wallet(path, label.clone(), *force, &config);
        }
        _ => {}
    }

    let engine = RpcLedger::from_config(&config.rpc);
    let wallet = open_wallet(&cli, &config)?;
    info!(rpc = engine.url(), wallet = wallet.is_some(), "console starting");

    let session = Session::new(&engine, wallet, config.network.magic);
    let mut operator = TerminalOperator::new();

    match &cli.command {
        Some(Commands::Exec { line }) => {
            run_line(&session, &mut operator, &line.join(" "));
        }
        _ => run_shell(&session, &mut operator),
    }
    Ok(())
}
