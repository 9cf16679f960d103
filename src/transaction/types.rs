/// Transaction types for the operator console
use crate::crypto::{signature_invocation_script, AccountId};
use crate::error::ConsoleError;
use crate::signer::{Signer, WitnessScope};
use secp256k1::constants::COMPACT_SIGNATURE_SIZE;
use sha2::{Digest, Sha256};

/// Maximum serialized transaction size in bytes accepted by the node.
pub const MAX_TRANSACTION_SIZE: usize = 102_400;

pub const MAX_TRANSACTION_ATTRIBUTES: usize = 16;

pub const TRANSACTION_VERSION: u8 = 0;

pub type TxHash = [u8; 32];

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TransactionAttribute {
    HighPriority,
    NotValidBefore { height: u32 },
    Conflicts { hash: TxHash },
}

/// Proof attached per signer: an invocation script pushing the signature and
/// the verification script the signer's account hashes to.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Witness {
    pub invocation_script: Vec<u8>,
    pub verification_script: Vec<u8>,
}

impl Witness {
    /// Same size as the final witness, with a zeroed signature. Used for fee
    /// estimation before anything is signed.
    pub fn placeholder(verification_script: Vec<u8>) -> Self {
        Witness {
            invocation_script: signature_invocation_script(&[0u8; COMPACT_SIGNATURE_SIZE]),
            verification_script,
        }
    }

    pub fn account(&self) -> AccountId {
        AccountId::from_script(&self.verification_script)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Transaction {
    pub version: u8,
    pub nonce: u32,
    pub system_fee: i64,
    pub network_fee: i64,
    pub valid_until_block: u32,
    pub signers: Vec<Signer>,
    pub attributes: Vec<TransactionAttribute>,
    pub script: Vec<u8>,
    pub witnesses: Vec<Witness>,
}

impl Transaction {
    /// Unsigned container used for dry-runs: no fees, no attributes, no witnesses.
    pub fn draft(script: Vec<u8>, signers: Vec<Signer>) -> Self {
        Transaction {
            version: TRANSACTION_VERSION,
            nonce: 0,
            system_fee: 0,
            network_fee: 0,
            valid_until_block: 0,
            signers,
            attributes: Vec::new(),
            script,
            witnesses: Vec::new(),
        }
    }

    /// The fee-paying account.
    pub fn sender(&self) -> Option<AccountId> {
        self.signers.first().map(|s| s.account)
    }

    pub fn is_signed(&self) -> bool {
        !self.witnesses.is_empty() && self.witnesses.len() == self.signers.len()
    }

    pub fn total_fee(&self) -> i64 {
        self.system_fee.saturating_add(self.network_fee)
    }

    /// Hash over every field except the witnesses.
    pub fn hash(&self) -> TxHash {
        let mut hasher = Sha256::new();
        hasher.update([self.version]);
        hasher.update(self.nonce.to_le_bytes());
        hasher.update(self.system_fee.to_le_bytes());
        hasher.update(self.network_fee.to_le_bytes());
        hasher.update(self.valid_until_block.to_le_bytes());
        hasher.update((self.signers.len() as u32).to_le_bytes());
        for signer in &self.signers {
            hasher.update(signer.account.as_bytes());
            hasher.update([scope_byte(signer.scope)]);
        }
        hasher.update((self.attributes.len() as u32).to_le_bytes());
        for attribute in &self.attributes {
            match attribute {
                TransactionAttribute::HighPriority => hasher.update([0x01]),
                TransactionAttribute::NotValidBefore { height } => {
                    hasher.update([0x20]);
                    hasher.update(height.to_le_bytes());
                }
                TransactionAttribute::Conflicts { hash } => {
                    hasher.update([0x21]);
                    hasher.update(hash);
                }
            }
        }
        hasher.update((self.script.len() as u32).to_le_bytes());
        hasher.update(&self.script);
        hasher.finalize().into()
    }

    pub fn hash_str(&self) -> String {
        format!("0x{}", hex::encode(self.hash()))
    }

    /// Bytes each signer signs: network magic followed by the hash, so a
    /// signature cannot be replayed on another network.
    pub fn signing_data(&self, network_magic: u32) -> Vec<u8> {
        let mut data = Vec::with_capacity(4 + 32);
        data.extend_from_slice(&network_magic.to_le_bytes());
        data.extend_from_slice(&self.hash());
        data
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ConsoleError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConsoleError> {
        Ok(bincode::deserialize(bytes)?)
    }

    pub fn size(&self) -> Result<usize, ConsoleError> {
        Ok(bincode::serialized_size(self)? as usize)
    }
}

fn scope_byte(scope: WitnessScope) -> u8 {
    match scope {
        WitnessScope::None => 0x00,
        WitnessScope::CalledByEntry => 0x01,
        WitnessScope::Global => 0x80,
    }
}
