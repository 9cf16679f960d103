//! Typed argument schemas and the binder that validates console input
//! against them before any script is built.

use crate::crypto::{public_key_from_hex, AccountId, PUBLIC_KEY_SIZE};
use crate::error::{ConsoleError, Result};
use crate::native::{self, Role};
use crate::script::{parse_integer, parse_parameter_list, ContractParameter, MAX_ITEM_SIZE};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// `0x`-prefixed or bare 40 hex digits, or a native contract name.
    Account,
    /// JSON array or comma-separated accounts.
    Accounts,
    U32,
    I64,
    /// Decimal literal; its precision is only known to the command.
    Amount,
    Text,
    /// JSON array of contract parameters.
    Parameters,
    /// Path to a file that must fit in one VM item.
    File,
    Role,
    /// JSON array or comma-separated compressed public keys in hex.
    PublicKeys,
}

impl ParamKind {
    pub fn describe(&self) -> &'static str {
        match self {
            ParamKind::Account => "account",
            ParamKind::Accounts => "account list",
            ParamKind::U32 => "unsigned 32-bit integer",
            ParamKind::I64 => "64-bit integer",
            ParamKind::Amount => "amount",
            ParamKind::Text => "text",
            ParamKind::Parameters => "JSON parameter array",
            ParamKind::File => "file path",
            ParamKind::Role => "role name or number",
            ParamKind::PublicKeys => "public key list",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub optional: bool,
}

impl ParamSpec {
    pub const fn required(name: &'static str, kind: ParamKind) -> Self {
        ParamSpec {
            name,
            kind,
            optional: false,
        }
    }

    pub const fn optional(name: &'static str, kind: ParamKind) -> Self {
        ParamSpec {
            name,
            kind,
            optional: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Account(AccountId),
    Accounts(Vec<AccountId>),
    Integer(i128),
    Literal(String),
    Parameters(Vec<ContractParameter>),
    File { path: PathBuf, bytes: Vec<u8> },
    Role(Role),
    PublicKeys(Vec<[u8; PUBLIC_KEY_SIZE]>),
}

/// Arguments of one command after validation, looked up by parameter name.
#[derive(Debug, Clone, Default)]
pub struct BoundArgs {
    values: HashMap<&'static str, ArgValue>,
}

impl BoundArgs {
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    fn missing(name: &str) -> ConsoleError {
        ConsoleError::InvalidInput(format!("Missing argument <{}>", name))
    }

    pub fn opt_account(&self, name: &str) -> Option<AccountId> {
        match self.get(name) {
            Some(ArgValue::Account(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn account(&self, name: &str) -> Result<AccountId> {
        self.opt_account(name).ok_or_else(|| Self::missing(name))
    }

    pub fn accounts(&self, name: &str) -> Option<Vec<AccountId>> {
        match self.get(name) {
            Some(ArgValue::Accounts(ids)) => Some(ids.clone()),
            _ => None,
        }
    }

    pub fn opt_integer(&self, name: &str) -> Option<i128> {
        match self.get(name) {
            Some(ArgValue::Integer(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn integer(&self, name: &str) -> Result<i128> {
        self.opt_integer(name).ok_or_else(|| Self::missing(name))
    }

    pub fn opt_literal(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(ArgValue::Literal(s)) => Some(s),
            _ => None,
        }
    }

    pub fn literal(&self, name: &str) -> Result<&str> {
        self.opt_literal(name).ok_or_else(|| Self::missing(name))
    }

    /// Empty when the optional parameter list was not given.
    pub fn parameters(&self, name: &str) -> Vec<ContractParameter> {
        match self.get(name) {
            Some(ArgValue::Parameters(params)) => params.clone(),
            _ => Vec::new(),
        }
    }

    pub fn opt_file(&self, name: &str) -> Option<(&Path, &[u8])> {
        match self.get(name) {
            Some(ArgValue::File { path, bytes }) => Some((path.as_path(), bytes.as_slice())),
            _ => None,
        }
    }

    pub fn file(&self, name: &str) -> Result<(&Path, &[u8])> {
        self.opt_file(name).ok_or_else(|| Self::missing(name))
    }

    pub fn role(&self, name: &str) -> Result<Role> {
        match self.get(name) {
            Some(ArgValue::Role(role)) => Ok(*role),
            _ => Err(Self::missing(name)),
        }
    }

    pub fn public_keys(&self, name: &str) -> Result<Vec<[u8; PUBLIC_KEY_SIZE]>> {
        match self.get(name) {
            Some(ArgValue::PublicKeys(keys)) => Ok(keys.clone()),
            _ => Err(Self::missing(name)),
        }
    }
}

/// Binds positional `args` to `params`. Every value is parsed and checked
/// here; nothing downstream sees raw operator text except amounts.
pub fn bind(params: &[ParamSpec], args: &[String]) -> Result<BoundArgs> {
    if args.len() > params.len() {
        return Err(ConsoleError::InvalidInput(format!(
            "Too many arguments: expected at most {}, got {}",
            params.len(),
            args.len()
        )));
    }

    let mut bound = BoundArgs::default();
    for (i, spec) in params.iter().enumerate() {
        match args.get(i) {
            Some(raw) => {
                let value = parse_value(spec.kind, raw).map_err(|e| match e {
                    ConsoleError::InvalidInput(msg) => {
                        ConsoleError::InvalidInput(format!("<{}>: {}", spec.name, msg))
                    }
                    other => other,
                })?;
                bound.values.insert(spec.name, value);
            }
            None if spec.optional => {}
            None => return Err(BoundArgs::missing(spec.name)),
        }
    }
    Ok(bound)
}

fn parse_value(kind: ParamKind, raw: &str) -> Result<ArgValue> {
    match kind {
        ParamKind::Account => parse_account(raw).map(ArgValue::Account),
        ParamKind::Accounts => parse_accounts(raw).map(ArgValue::Accounts),
        ParamKind::U32 => parse_bounded(raw, 0, u32::MAX as i128).map(ArgValue::Integer),
        ParamKind::I64 => {
            parse_bounded(raw, i64::MIN as i128, i64::MAX as i128).map(ArgValue::Integer)
        }
        ParamKind::Amount | ParamKind::Text => Ok(ArgValue::Literal(raw.to_string())),
        ParamKind::Parameters => parse_parameter_list(raw).map(ArgValue::Parameters),
        ParamKind::File => {
            let path = PathBuf::from(raw);
            let bytes = read_item_file(&path)?;
            Ok(ArgValue::File { path, bytes })
        }
        ParamKind::Role => raw.parse::<Role>().map(ArgValue::Role),
        ParamKind::PublicKeys => parse_public_keys(raw).map(ArgValue::PublicKeys),
    }
}

pub fn parse_account(raw: &str) -> Result<AccountId> {
    match native::by_name(raw) {
        Some(id) => Ok(id),
        None => raw.parse(),
    }
}

fn split_list(raw: &str) -> Result<Vec<String>> {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') {
        serde_json::from_str::<Vec<String>>(trimmed)
            .map_err(|e| ConsoleError::InvalidInput(format!("Malformed list '{}': {}", raw, e)))
    } else {
        Ok(trimmed
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect())
    }
}

pub fn parse_accounts(raw: &str) -> Result<Vec<AccountId>> {
    split_list(raw)?.iter().map(|s| parse_account(s)).collect()
}

pub fn parse_public_keys(raw: &str) -> Result<Vec<[u8; PUBLIC_KEY_SIZE]>> {
    let keys = split_list(raw)?
        .iter()
        .map(|s| public_key_from_hex(s))
        .collect::<Result<Vec<_>>>()?;
    if keys.is_empty() {
        return Err(ConsoleError::InvalidInput("At least one public key is required".to_string()));
    }
    Ok(keys)
}

fn parse_bounded(raw: &str, min: i128, max: i128) -> Result<i128> {
    let value = parse_integer(raw).map_err(|e| ConsoleError::InvalidInput(e.to_string()))?;
    if value < min || value > max {
        return Err(ConsoleError::InvalidInput(format!(
            "{} is out of range [{}, {}]",
            value, min, max
        )));
    }
    Ok(value)
}

/// Reads a contract file, refusing anything larger than one VM item.
pub fn read_item_file(path: &Path) -> Result<Vec<u8>> {
    let metadata = fs::metadata(path).map_err(|e| {
        ConsoleError::InvalidInput(format!("Cannot read file {}: {}", path.display(), e))
    })?;
    if metadata.len() > MAX_ITEM_SIZE as u64 {
        return Err(ConsoleError::InvalidInput(format!(
            "File {} is {} bytes, more than the maximum item size of {}",
            path.display(),
            metadata.len(),
            MAX_ITEM_SIZE
        )));
    }
    Ok(fs::read(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::GAS_TOKEN;
    use std::io::Write;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    const PARAMS: &[ParamSpec] = &[
        ParamSpec::required("to", ParamKind::Account),
        ParamSpec::required("value", ParamKind::U32),
        ParamSpec::optional("signers", ParamKind::Accounts),
    ];

    #[test]
    fn test_bind_required_and_optional() {
        let to = "0x".to_string() + &"11".repeat(20);
        let args = bind(PARAMS, &strings(&[&to, "42"])).unwrap();
        assert_eq!(args.account("to").unwrap(), AccountId([0x11; 20]));
        assert_eq!(args.integer("value").unwrap(), 42);
        assert!(args.accounts("signers").is_none());
    }

    #[test]
    fn test_bind_errors() {
        assert!(matches!(bind(PARAMS, &strings(&["gas"])), Err(ConsoleError::InvalidInput(_))));
        assert!(matches!(
            bind(PARAMS, &strings(&["gas", "1", "gas", "extra"])),
            Err(ConsoleError::InvalidInput(_))
        ));
        let err = bind(PARAMS, &strings(&["gas", "-1"])).unwrap_err();
        assert!(err.to_string().contains("<value>"));
    }

    #[test]
    fn test_account_lists() {
        let a = "11".repeat(20);
        let b = "0x".to_string() + &"22".repeat(20);
        let comma = parse_accounts(&format!("{}, {}", a, b)).unwrap();
        let json = parse_accounts(&format!(r#"["{}", "{}"]"#, a, b)).unwrap();
        assert_eq!(comma, json);
        assert_eq!(comma, vec![AccountId([0x11; 20]), AccountId([0x22; 20])]);
        assert_eq!(parse_account("GAS").unwrap(), GAS_TOKEN);
        assert!(parse_account("0x1234").is_err());
    }

    #[test]
    fn test_public_keys() {
        let key = crate::crypto::KeyPair::generate().unwrap();
        let hex_key = hex::encode(key.public_key_bytes());
        let keys = parse_public_keys(&format!("[\"{}\"]", hex_key)).unwrap();
        assert_eq!(keys, vec![key.public_key_bytes()]);
        assert!(parse_public_keys("[]").is_err());
        assert!(parse_public_keys(&"05".repeat(33)).is_err());
    }

    #[test]
    fn test_oversized_file_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&vec![0u8; MAX_ITEM_SIZE + 1]).unwrap();
        let err = read_item_file(file.path()).unwrap_err();
        assert!(matches!(err, ConsoleError::InvalidInput(_)));

        let mut small = tempfile::NamedTempFile::new().unwrap();
        small.write_all(b"NEF3").unwrap();
        assert_eq!(read_item_file(small.path()).unwrap(), b"NEF3");
    }
}
