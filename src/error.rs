//! Error types for the TrinityChain operator console

use std::fmt;

/// Every failure a command can hit between parsing and relay.
///
/// Simulation faults are deliberately absent: a faulting dry-run is a normal
/// [`ExecutionReport`](crate::engine::ExecutionReport), not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    /// Malformed amount, account, file or other operator argument.
    InvalidInput(String),
    /// An argument could not be represented in the VM value model.
    Encoding(String),
    /// Transaction finalization failed (no wallet, no funds, too large...).
    InvalidOperation(String),
    /// The node refused the signed transaction.
    Relay(String),
    /// The ledger engine could not be reached or answered garbage.
    Engine(String),
    WalletError(String),
    CryptoError(String),
    ConfigError(String),
    UnknownCommand(String),
    IoError(String),
    BincodeError(String),
    JsonError(String),
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConsoleError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            ConsoleError::Encoding(msg) => write!(f, "Argument encoding error: {}", msg),
            ConsoleError::InvalidOperation(msg) => write!(f, "Invalid operation: {}", msg),
            ConsoleError::Relay(msg) => write!(f, "Relay failed: {}", msg),
            ConsoleError::Engine(msg) => write!(f, "Ledger engine error: {}", msg),
            ConsoleError::WalletError(msg) => write!(f, "Wallet error: {}", msg),
            ConsoleError::CryptoError(msg) => write!(f, "Cryptographic error: {}", msg),
            ConsoleError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            ConsoleError::UnknownCommand(msg) => write!(f, "Unknown command: {}", msg),
            ConsoleError::IoError(msg) => write!(f, "IO error: {}", msg),
            ConsoleError::BincodeError(msg) => write!(f, "Bincode error: {}", msg),
            ConsoleError::JsonError(msg) => write!(f, "JSON error: {}", msg),
        }
    }
}

impl std::error::Error for ConsoleError {}

impl From<std::io::Error> for ConsoleError {
    fn from(err: std::io::Error) -> Self {
        ConsoleError::IoError(err.to_string())
    }
}

impl From<Box<bincode::ErrorKind>> for ConsoleError {
    fn from(err: Box<bincode::ErrorKind>) -> Self {
        ConsoleError::BincodeError(err.to_string())
    }
}

impl From<serde_json::Error> for ConsoleError {
    fn from(err: serde_json::Error) -> Self {
        ConsoleError::JsonError(err.to_string())
    }
}

impl From<toml::de::Error> for ConsoleError {
    fn from(err: toml::de::Error) -> Self {
        ConsoleError::ConfigError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ConsoleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        assert_eq!(
            ConsoleError::InvalidOperation("Insufficient GAS".into()).to_string(),
            "Invalid operation: Insufficient GAS"
        );
        assert_eq!(
            ConsoleError::Relay("AlreadyExists".into()).to_string(),
            "Relay failed: AlreadyExists"
        );
    }

    #[test]
    fn test_io_conversion() {
        let err: ConsoleError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, ConsoleError::IoError(ref m) if m == "gone"));
    }
}
