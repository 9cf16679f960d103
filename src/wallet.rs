//! Wallet collaborator: the key-store that finalizes and signs transactions.
//!
//! The console only needs four things from a wallet (is it open, which
//! account is the default, which accounts it holds, and "turn this script into
//! a signed transaction"), captured by the [`Wallet`] trait. [`KeyStoreWallet`]
//! is the JSON file implementation the binary opens at startup.

use crate::config::Config;
use crate::crypto::{signature_invocation_script, AccountId, KeyPair};
use crate::engine::{call_read_only, simulate, LedgerEngine, Snapshot};
use crate::error::{ConsoleError, Result};
use crate::native::{policy, token, GAS_TOKEN, POLICY_CONTRACT};
use crate::signer::Signer;
use crate::transaction::validation::{validate_size, validate_unique_signers};
use crate::transaction::{Transaction, Witness};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const WALLET_FORMAT_VERSION: &str = "1.0";

/// Everything the wallet needs to turn a script into a network-ready transaction.
pub struct TransactionRequest<'a> {
    pub script: &'a [u8],
    /// Fee payer; the wallet's default account when `None`.
    pub sender: Option<AccountId>,
    /// Normalized signers. Empty means "just the sender".
    pub signers: &'a [Signer],
    pub engine: &'a dyn LedgerEngine,
    pub snapshot: &'a Snapshot,
    /// The operator has seen this script fault and still wants it signed.
    pub fault_acknowledged: bool,
}

pub trait Wallet {
    fn is_open(&self) -> bool;

    fn default_account(&self) -> Option<AccountId>;

    fn accounts(&self) -> Vec<AccountId>;

    /// Computes fees and validity window, then signs once per signer.
    /// Expected business failures (no funds, no sender, too large) are
    /// `ConsoleError::InvalidOperation`.
    fn make_transaction(&mut self, request: &TransactionRequest<'_>) -> Result<Transaction>;
}

/// The single wallet a session works with. Locked only while a transaction
/// is being finalized.
pub type SharedWallet = Arc<Mutex<dyn Wallet + Send>>;

pub fn shared<W: Wallet + Send + 'static>(wallet: W) -> SharedWallet {
    Arc::new(Mutex::new(wallet))
}

/// Network parameters the key-store needs for fees and signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSettings {
    pub network_magic: u32,
    pub max_valid_until_block_increment: u32,
    pub default_fee_per_byte: i64,
    pub signature_fee: i64,
}

impl From<&Config> for WalletSettings {
    fn from(config: &Config) -> Self {
        WalletSettings {
            network_magic: config.network.magic,
            max_valid_until_block_increment: config.network.max_valid_until_block_increment,
            default_fee_per_byte: config.fees.default_fee_per_byte,
            signature_fee: config.fees.signature_fee,
        }
    }
}

impl Default for WalletSettings {
    fn default() -> Self {
        WalletSettings::from(&Config::default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WalletAccount {
    pub label: Option<String>,
    pub address: String,
    pub secret_key_hex: String,
    #[serde(default)]
    pub is_default: bool,
    pub created: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct WalletFile {
    name: Option<String>,
    version: String,
    accounts: Vec<WalletAccount>,
}

pub struct KeyStoreWallet {
    pub name: Option<String>,
    accounts: Vec<WalletAccount>,
    keys: HashMap<AccountId, KeyPair>,
    settings: WalletSettings,
    open: bool,
}

impl KeyStoreWallet {
    /// New wallet holding one freshly generated default account.
    pub fn create(name: Option<String>, settings: WalletSettings) -> Result<Self> {
        let mut wallet = KeyStoreWallet {
            name,
            accounts: Vec::new(),
            keys: HashMap::new(),
            settings,
            open: true,
        };
        wallet.add_account(Some("default".to_string()))?;
        Ok(wallet)
    }

    pub fn load(path: &Path, settings: WalletSettings) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|e| {
            ConsoleError::WalletError(format!("Cannot read wallet {}: {}", path.display(), e))
        })?;
        let file: WalletFile = serde_json::from_str(&data)
            .map_err(|e| ConsoleError::WalletError(format!("Malformed wallet {}: {}", path.display(), e)))?;

        let mut keys = HashMap::with_capacity(file.accounts.len());
        for account in &file.accounts {
            let keypair = KeyPair::from_secret_hex(&account.secret_key_hex)?;
            let id = keypair.account_id();
            if id.to_string() != account.address {
                return Err(ConsoleError::WalletError(format!(
                    "Account {} does not match its key ({})",
                    account.address, id
                )));
            }
            keys.insert(id, keypair);
        }
        if file.accounts.iter().filter(|a| a.is_default).count() > 1 {
            return Err(ConsoleError::WalletError("More than one default account".to_string()));
        }

        debug!(path = %path.display(), accounts = keys.len(), "wallet opened");
        Ok(KeyStoreWallet {
            name: file.name,
            accounts: file.accounts,
            keys,
            settings,
            open: true,
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = WalletFile {
            name: self.name.clone(),
            version: WALLET_FORMAT_VERSION.to_string(),
            accounts: self.accounts.clone(),
        };
        let tmp: PathBuf = path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_string_pretty(&file)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Generates a key and adds it. The first account becomes the default.
    pub fn add_account(&mut self, label: Option<String>) -> Result<AccountId> {
        let keypair = KeyPair::generate()?;
        Ok(self.import_key(keypair, label))
    }

    pub fn import_key(&mut self, keypair: KeyPair, label: Option<String>) -> AccountId {
        let id = keypair.account_id();
        if self.keys.contains_key(&id) {
            return id;
        }
        self.accounts.push(WalletAccount {
            label,
            address: id.to_string(),
            secret_key_hex: keypair.secret_hex(),
            is_default: self.accounts.is_empty(),
            created: chrono::Utc::now().to_rfc3339(),
        });
        self.keys.insert(id, keypair);
        id
    }

    pub fn set_default(&mut self, account: AccountId) -> Result<()> {
        if !self.keys.contains_key(&account) {
            return Err(ConsoleError::WalletError(format!("{} is not in the wallet", account)));
        }
        let address = account.to_string();
        for entry in &mut self.accounts {
            entry.is_default = entry.address == address;
        }
        Ok(())
    }

    pub fn entries(&self) -> &[WalletAccount] {
        &self.accounts
    }

    pub fn keypair(&self, account: &AccountId) -> Option<&KeyPair> {
        self.keys.get(account)
    }

    /// Drops every key from memory; the wallet reports itself closed afterwards.
    pub fn close(&mut self) {
        self.keys.clear();
        self.open = false;
    }

    fn fee_per_byte(&self, engine: &dyn LedgerEngine, snapshot: &Snapshot) -> i64 {
        match call_read_only(engine, snapshot, POLICY_CONTRACT, policy::GET_FEE_PER_BYTE, vec![]) {
            Ok(item) => match item.as_integer().and_then(|v| i64::try_from(v).ok()) {
                Some(fee) if fee >= 0 => fee,
                _ => {
                    warn!("policy returned an unusable fee per byte, using default");
                    self.settings.default_fee_per_byte
                }
            },
            Err(e) => {
                warn!("cannot read fee per byte ({}), using default", e);
                self.settings.default_fee_per_byte
            }
        }
    }

    /// Sender first, keeping each signer's own scope.
    fn order_signers(sender: AccountId, signers: &[Signer]) -> Vec<Signer> {
        let mut ordered: Vec<Signer> = Vec::with_capacity(signers.len() + 1);
        match signers.iter().find(|s| s.account == sender) {
            Some(existing) => ordered.push(*existing),
            None => ordered.push(Signer::called_by_entry(sender)),
        }
        ordered.extend(signers.iter().filter(|s| s.account != sender).copied());
        ordered
    }
}

impl Wallet for KeyStoreWallet {
    fn is_open(&self) -> bool {
        self.open
    }

    fn default_account(&self) -> Option<AccountId> {
        if !self.open {
            return None;
        }
        self.accounts
            .iter()
            .find(|a| a.is_default)
            .or_else(|| self.accounts.first())
            .and_then(|a| a.address.parse().ok())
    }

    fn accounts(&self) -> Vec<AccountId> {
        self.accounts
            .iter()
            .filter_map(|a| a.address.parse().ok())
            .filter(|id| self.keys.contains_key(id))
            .collect()
    }

    fn make_transaction(&mut self, request: &TransactionRequest<'_>) -> Result<Transaction> {
        if !self.is_open() {
            return Err(ConsoleError::InvalidOperation("Wallet is not open".to_string()));
        }

        let sender = request
            .sender
            .or_else(|| self.default_account())
            .ok_or_else(|| {
                ConsoleError::InvalidOperation(
                    "No sender specified and the wallet has no default account".to_string(),
                )
            })?;

        let signers = Self::order_signers(sender, request.signers);
        validate_unique_signers(&signers)?;
        for signer in &signers {
            if !self.keys.contains_key(&signer.account) {
                return Err(ConsoleError::InvalidOperation(format!(
                    "Signer {} is not in the wallet",
                    signer.account
                )));
            }
        }

        let mut tx = Transaction::draft(request.script.to_vec(), signers);
        tx.nonce = rand::random();
        tx.valid_until_block = request
            .snapshot
            .height
            .saturating_add(self.settings.max_valid_until_block_increment);

        let report = simulate(request.engine, request.script, request.snapshot, Some(&tx))?;
        if report.is_fault() {
            let exception = report.exception.as_deref().unwrap_or("unknown fault");
            if !request.fault_acknowledged {
                return Err(ConsoleError::InvalidOperation(format!(
                    "Execution reverted: {}",
                    exception
                )));
            }
            warn!(exception, "signing a faulting script at the operator's request");
        }
        tx.system_fee = report.gas_consumed;

        tx.witnesses = tx
            .signers
            .iter()
            .filter_map(|s| self.keys.get(&s.account))
            .map(|kp| Witness::placeholder(kp.verification_script()))
            .collect();
        validate_size(&tx)?;
        let size = tx.size()? as i64;
        let fee_per_byte = self.fee_per_byte(request.engine, request.snapshot);
        tx.network_fee = size
            .saturating_mul(fee_per_byte)
            .saturating_add(self.settings.signature_fee.saturating_mul(tx.signers.len() as i64));
        tx.witnesses.clear();

        let balance = call_read_only(
            request.engine,
            request.snapshot,
            GAS_TOKEN,
            token::BALANCE_OF,
            vec![sender.into()],
        )?
        .as_integer()
        .unwrap_or(0);
        if balance < tx.total_fee() as i128 {
            return Err(ConsoleError::InvalidOperation(format!(
                "Insufficient GAS: {} needs {} but holds {}",
                sender,
                tx.total_fee(),
                balance
            )));
        }

        let message = tx.signing_data(self.settings.network_magic);
        let mut witnesses = Vec::with_capacity(tx.signers.len());
        for signer in &tx.signers {
            let keypair = self.keys.get(&signer.account).ok_or_else(|| {
                ConsoleError::InvalidOperation(format!("Signer {} is not in the wallet", signer.account))
            })?;
            witnesses.push(Witness {
                invocation_script: signature_invocation_script(&keypair.sign(&message)?),
                verification_script: keypair.verification_script(),
            });
        }
        tx.witnesses = witnesses;

        info!(
            hash = %tx.hash_str(),
            system_fee = tx.system_fee,
            network_fee = tx.network_fee,
            "transaction signed"
        );
        Ok(tx)
    }
}
