//! Cryptographic primitives: account identifiers, key pairs and
//! single-signature witness scripts.

use crate::error::ConsoleError;
use crate::script::{interop_hash, OpCode};
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use secp256k1::{
    constants::{COMPACT_SIGNATURE_SIZE, SECRET_KEY_SIZE},
    ecdsa::Signature,
    All, Message, PublicKey, Secp256k1, SecretKey,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// A thread-safe, lazily initialized Secp256k1 context.
static SECP256K1_CONTEXT: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

pub use secp256k1::constants::PUBLIC_KEY_SIZE;

pub const CHECK_SIG_SYSCALL: &str = "System.Crypto.CheckSig";

/// Fixed-length hash addressing a wallet account or a deployed contract.
///
/// Wallet accounts hash their verification script; contracts are addressed
/// by whatever hash the ledger assigned at deployment.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct AccountId(pub [u8; 20]);

impl AccountId {
    pub const LEN: usize = 20;

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ConsoleError> {
        let arr: [u8; Self::LEN] = bytes.try_into().map_err(|_| {
            ConsoleError::InvalidInput(format!(
                "Account must be {} bytes, got {}",
                Self::LEN,
                bytes.len()
            ))
        })?;
        Ok(AccountId(arr))
    }

    /// Account of a verification script: the leading 20 bytes of its SHA-256.
    pub fn from_script(script: &[u8]) -> Self {
        let digest = Sha256::digest(script);
        let mut arr = [0u8; Self::LEN];
        arr.copy_from_slice(&digest[..Self::LEN]);
        AccountId(arr)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self)
    }
}

impl FromStr for AccountId {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let bytes = hex::decode(digits)
            .map_err(|e| ConsoleError::InvalidInput(format!("Invalid account '{}': {}", s, e)))?;
        Self::from_slice(&bytes)
    }
}

#[derive(Debug, Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generates a new random KeyPair using the OS random number generator.
    pub fn generate() -> Result<Self, ConsoleError> {
        let secret_key = SecretKey::new(&mut OsRng);
        Ok(Self::from_secret_key(secret_key))
    }

    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let public_key = PublicKey::from_secret_key(&SECP256K1_CONTEXT, &secret_key);
        KeyPair {
            secret_key,
            public_key,
        }
    }

    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, ConsoleError> {
        let secret_key = SecretKey::from_slice(bytes).map_err(|e| {
            if bytes.len() != SECRET_KEY_SIZE {
                ConsoleError::CryptoError(format!(
                    "Secret key must be {} bytes, got {}",
                    SECRET_KEY_SIZE,
                    bytes.len()
                ))
            } else {
                ConsoleError::CryptoError(format!("Invalid secret key bytes: {}", e))
            }
        })?;

        Ok(Self::from_secret_key(secret_key))
    }

    pub fn from_secret_hex(secret_hex: &str) -> Result<Self, ConsoleError> {
        let bytes = hex::decode(secret_hex.trim())
            .map_err(|e| ConsoleError::CryptoError(format!("Invalid secret key hex: {}", e)))?;
        Self::from_secret_bytes(&bytes)
    }

    pub fn secret_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Returns the KeyPair's public key as a compressed byte array.
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.public_key.serialize()
    }

    pub fn verification_script(&self) -> Vec<u8> {
        verification_script(&self.public_key_bytes())
    }

    pub fn account_id(&self) -> AccountId {
        AccountId::from_script(&self.verification_script())
    }

    /// Signs a message (which is first hashed using SHA-256) and returns the compact signature bytes.
    pub fn sign(&self, message: &[u8]) -> Result<[u8; COMPACT_SIGNATURE_SIZE], ConsoleError> {
        let digest = Sha256::digest(message);
        let message = Message::from_digest_slice(&digest)
            .map_err(|e| ConsoleError::CryptoError(format!("Failed to create message: {}", e)))?;
        let signature = SECP256K1_CONTEXT.sign_ecdsa(&message, &self.secret_key);
        Ok(signature.serialize_compact())
    }
}

/// Parses and validates a compressed public key given as hex.
pub fn public_key_from_hex(hex_str: &str) -> Result<[u8; PUBLIC_KEY_SIZE], ConsoleError> {
    let bytes = hex::decode(hex_str.trim())
        .map_err(|e| ConsoleError::InvalidInput(format!("Invalid public key '{}': {}", hex_str, e)))?;
    let key = PublicKey::from_slice(&bytes)
        .map_err(|e| ConsoleError::InvalidInput(format!("Invalid public key '{}': {}", hex_str, e)))?;
    Ok(key.serialize())
}

/// `PUSHDATA1 <pubkey> SYSCALL CheckSig`
pub fn verification_script(public_key: &[u8; PUBLIC_KEY_SIZE]) -> Vec<u8> {
    let mut script = Vec::with_capacity(2 + PUBLIC_KEY_SIZE + 5);
    script.push(OpCode::PushData1 as u8);
    script.push(PUBLIC_KEY_SIZE as u8);
    script.extend_from_slice(public_key);
    script.push(OpCode::Syscall as u8);
    script.extend_from_slice(&interop_hash(CHECK_SIG_SYSCALL));
    script
}

/// `PUSHDATA1 <signature>`
pub fn signature_invocation_script(signature: &[u8]) -> Vec<u8> {
    let mut script = Vec::with_capacity(2 + signature.len());
    script.push(OpCode::PushData1 as u8);
    script.push(signature.len() as u8);
    script.extend_from_slice(signature);
    script
}

/// Extracts the public key from a single-signature verification script.
pub fn parse_verification_script(script: &[u8]) -> Option<[u8; PUBLIC_KEY_SIZE]> {
    if script.len() != 2 + PUBLIC_KEY_SIZE + 5
        || script[0] != OpCode::PushData1 as u8
        || script[1] as usize != PUBLIC_KEY_SIZE
        || script[2 + PUBLIC_KEY_SIZE] != OpCode::Syscall as u8
        || script[3 + PUBLIC_KEY_SIZE..] != interop_hash(CHECK_SIG_SYSCALL)
    {
        return None;
    }
    script[2..2 + PUBLIC_KEY_SIZE].try_into().ok()
}

/// Extracts the signature from a single-signature invocation script.
pub fn parse_invocation_script(script: &[u8]) -> Option<&[u8]> {
    match script {
        [op, len, rest @ ..] if *op == OpCode::PushData1 as u8 && *len as usize == rest.len() => {
            Some(rest)
        }
        _ => None,
    }
}

/// Verifies an ECDSA signature given the raw public key bytes, message, and signature bytes.
pub fn verify_signature(
    public_key_bytes: &[u8],
    message: &[u8],
    signature_bytes: &[u8],
) -> Result<(), ConsoleError> {
    if public_key_bytes.len() != PUBLIC_KEY_SIZE {
        return Err(ConsoleError::CryptoError(format!(
            "Public key must be exactly {} bytes (compressed), got {}",
            PUBLIC_KEY_SIZE,
            public_key_bytes.len()
        )));
    }
    if signature_bytes.len() != COMPACT_SIGNATURE_SIZE {
        return Err(ConsoleError::CryptoError(format!(
            "Signature must be exactly {} bytes (compact), got {}",
            COMPACT_SIGNATURE_SIZE,
            signature_bytes.len()
        )));
    }

    let public_key = PublicKey::from_slice(public_key_bytes)
        .map_err(|e| ConsoleError::CryptoError(format!("Invalid public key: {}", e)))?;
    let digest = Sha256::digest(message);
    let message = Message::from_digest_slice(&digest)
        .map_err(|e| ConsoleError::CryptoError(format!("Failed to create message: {}", e)))?;
    let signature = Signature::from_compact(signature_bytes)
        .map_err(|e| ConsoleError::CryptoError(format!("Invalid signature: {}", e)))?;

    SECP256K1_CONTEXT
        .verify_ecdsa(&message, &signature, &public_key)
        .map_err(|_| ConsoleError::CryptoError("Signature verification failed".to_string()))
}
