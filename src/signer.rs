//! Transaction signers and the sender-first normalization every command shares.

use crate::crypto::AccountId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// How far a signer's witness reaches into the calls a script makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WitnessScope {
    /// Only the transaction's own verification.
    None,
    /// Valid for the entry script and the contract it calls directly.
    #[default]
    CalledByEntry,
    /// Valid everywhere in the execution.
    Global,
}

impl WitnessScope {
    /// Name used on the node's JSON-RPC interface.
    pub fn as_str(&self) -> &'static str {
        match self {
            WitnessScope::None => "None",
            WitnessScope::CalledByEntry => "CalledByEntry",
            WitnessScope::Global => "Global",
        }
    }
}

impl fmt::Display for WitnessScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signer {
    pub account: AccountId,
    pub scope: WitnessScope,
}

impl Signer {
    pub fn new(account: AccountId, scope: WitnessScope) -> Self {
        Signer { account, scope }
    }

    pub fn called_by_entry(account: AccountId) -> Self {
        Self::new(account, WitnessScope::CalledByEntry)
    }
}

/// Orders `accounts` so that `sender` (when given) comes first, drops
/// repeated accounts after their first occurrence, and assigns `scope`.
///
/// Without an account list, or without a wallet to sign with, the result is
/// empty and the wallet derives signers itself at finalization.
pub fn normalize(
    sender: Option<AccountId>,
    accounts: Option<&[AccountId]>,
    wallet_open: bool,
    scope: WitnessScope,
) -> Vec<Signer> {
    let accounts = match accounts {
        Some(accounts) if wallet_open => accounts,
        _ => return Vec::new(),
    };

    let mut seen = HashSet::with_capacity(accounts.len() + 1);
    let mut ordered = Vec::with_capacity(accounts.len() + 1);
    if let Some(sender) = sender {
        seen.insert(sender);
        ordered.push(sender);
    }
    for account in accounts {
        if seen.insert(*account) {
            ordered.push(*account);
        }
    }

    ordered
        .into_iter()
        .map(|account| Signer::new(account, scope))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(byte: u8) -> AccountId {
        AccountId([byte; 20])
    }

    fn accounts_of(signers: &[Signer]) -> Vec<AccountId> {
        signers.iter().map(|s| s.account).collect()
    }

    const A: u8 = 0xA;
    const B: u8 = 0xB;
    const C: u8 = 0xC;

    #[test]
    fn test_sender_moved_to_front() {
        let signers = normalize(Some(id(A)), Some(&[id(B), id(A), id(C)]), true, WitnessScope::CalledByEntry);
        assert_eq!(accounts_of(&signers), vec![id(A), id(B), id(C)]);
    }

    #[test]
    fn test_missing_sender_prepended() {
        let accounts = [id(B), id(C)];
        let signers = normalize(Some(id(A)), Some(&accounts), true, WitnessScope::CalledByEntry);
        assert_eq!(accounts_of(&signers), vec![id(A), id(B), id(C)]);
        assert_eq!(signers.len(), accounts.len() + 1);
    }

    #[test]
    fn test_sender_already_first_is_unchanged() {
        let accounts = [id(A), id(B), id(C)];
        let signers = normalize(Some(id(A)), Some(&accounts), true, WitnessScope::CalledByEntry);
        assert_eq!(accounts_of(&signers), accounts.to_vec());
    }

    #[test]
    fn test_duplicates_keep_first_occurrence() {
        let signers = normalize(
            Some(id(A)),
            Some(&[id(C), id(B), id(A), id(C), id(B), id(A)]),
            true,
            WitnessScope::CalledByEntry,
        );
        assert_eq!(accounts_of(&signers), vec![id(A), id(C), id(B)]);
    }

    #[test]
    fn test_without_sender_order_is_kept() {
        let signers = normalize(None, Some(&[id(C), id(B), id(C)]), true, WitnessScope::CalledByEntry);
        assert_eq!(accounts_of(&signers), vec![id(C), id(B)]);
    }

    #[test]
    fn test_absent_accounts_or_wallet_yield_nothing() {
        assert!(normalize(Some(id(A)), None, true, WitnessScope::CalledByEntry).is_empty());
        assert!(normalize(Some(id(A)), Some(&[id(B)]), false, WitnessScope::CalledByEntry).is_empty());
    }

    #[test]
    fn test_scope_applied_to_every_signer() {
        let signers = normalize(Some(id(A)), Some(&[id(B)]), true, WitnessScope::Global);
        assert!(signers.iter().all(|s| s.scope == WitnessScope::Global));
        let signers = normalize(Some(id(A)), Some(&[id(B)]), true, WitnessScope::default());
        assert!(signers.iter().all(|s| s.scope == WitnessScope::CalledByEntry));
    }

    #[test]
    fn test_sender_first_property_over_all_positions() {
        let pool: Vec<AccountId> = (1..=6).map(id).collect();
        for len in 1..=pool.len() {
            let accounts = &pool[..len];
            for pos in 0..len {
                let sender = accounts[pos];
                let signers = normalize(Some(sender), Some(accounts), true, WitnessScope::CalledByEntry);
                let got = accounts_of(&signers);

                assert_eq!(got[0], sender);
                let rest: Vec<_> = accounts.iter().copied().filter(|a| *a != sender).collect();
                assert_eq!(&got[1..], rest.as_slice());
                let unique: HashSet<_> = got.iter().collect();
                assert_eq!(unique.len(), got.len());
            }
        }
    }
}
