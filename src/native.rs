//! Native contract catalog: fixed hashes and method names of the contracts
//! every node ships with. Configuration data only; their behavior lives in
//! the node.

use crate::crypto::AccountId;
use crate::error::ConsoleError;
use std::fmt;
use std::str::FromStr;

pub const NEO_TOKEN: AccountId = AccountId([
    0xef, 0x40, 0x73, 0xa0, 0xf2, 0xb3, 0x05, 0xa3, 0x8e, 0xc4, 0x05, 0x0e, 0x4d, 0x3d, 0x28, 0xbc,
    0x40, 0xea, 0x63, 0xf5,
]);

pub const GAS_TOKEN: AccountId = AccountId([
    0xd2, 0xa4, 0xcf, 0xf3, 0x19, 0x13, 0x01, 0x61, 0x55, 0xe3, 0x8e, 0x47, 0x4a, 0x2c, 0x06, 0xd0,
    0x8b, 0xe2, 0x76, 0xcf,
]);

pub const POLICY_CONTRACT: AccountId = AccountId([
    0xcc, 0x5e, 0x4e, 0xdd, 0x9f, 0x5f, 0x8d, 0xba, 0x8b, 0xb6, 0x57, 0x34, 0x54, 0x1d, 0xf7, 0xa1,
    0xc0, 0x81, 0xc6, 0x7b,
]);

pub const ROLE_MANAGEMENT: AccountId = AccountId([
    0x49, 0xcf, 0x4e, 0x53, 0x78, 0xff, 0xcd, 0x4d, 0xec, 0x03, 0x4f, 0xd9, 0x8a, 0x17, 0x4c, 0x54,
    0x91, 0xe3, 0x95, 0xe2,
]);

pub const CONTRACT_MANAGEMENT: AccountId = AccountId([
    0xff, 0xfd, 0xc9, 0x37, 0x64, 0xdb, 0xad, 0xdd, 0x97, 0xc4, 0x8f, 0x25, 0x2a, 0x53, 0xea, 0x46,
    0x43, 0xfa, 0xa3, 0xfd,
]);

pub mod policy {
    pub const GET_FEE_PER_BYTE: &str = "getFeePerByte";
    pub const SET_FEE_PER_BYTE: &str = "setFeePerByte";
    pub const GET_MAX_BLOCK_SIZE: &str = "getMaxBlockSize";
    pub const SET_MAX_BLOCK_SIZE: &str = "setMaxBlockSize";
    pub const GET_MAX_TRANSACTIONS_PER_BLOCK: &str = "getMaxTransactionsPerBlock";
    pub const SET_MAX_TRANSACTIONS_PER_BLOCK: &str = "setMaxTransactionsPerBlock";
    pub const GET_BLOCKED_ACCOUNTS: &str = "getBlockedAccounts";
    pub const BLOCK_ACCOUNT: &str = "blockAccount";
    pub const UNBLOCK_ACCOUNT: &str = "unblockAccount";
}

pub mod role_management {
    pub const DESIGNATE_AS_ROLE: &str = "designateAsRole";
    pub const GET_DESIGNATED_BY_ROLE: &str = "getDesignatedByRole";
}

pub mod contract_management {
    pub const DEPLOY: &str = "deploy";
    pub const UPDATE: &str = "update";
}

/// Methods every fungible token exposes.
pub mod token {
    pub const TRANSFER: &str = "transfer";
    pub const BALANCE_OF: &str = "balanceOf";
    pub const DECIMALS: &str = "decimals";
    pub const SYMBOL: &str = "symbol";
    pub const MINT: &str = "mint";
}

/// Looks a native contract up by (case-insensitive) name.
pub fn by_name(name: &str) -> Option<AccountId> {
    match name.to_ascii_lowercase().as_str() {
        "neo" | "neotoken" => Some(NEO_TOKEN),
        "gas" | "gastoken" => Some(GAS_TOKEN),
        "policy" | "policycontract" => Some(POLICY_CONTRACT),
        "rolemanagement" => Some(ROLE_MANAGEMENT),
        "contractmanagement" => Some(CONTRACT_MANAGEMENT),
        _ => None,
    }
}

/// Node roles assignable through RoleManagement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Role {
    StateValidator = 4,
    Oracle = 8,
    NeoFsAlphabetNode = 16,
    P2PNotary = 32,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::StateValidator,
        Role::Oracle,
        Role::NeoFsAlphabetNode,
        Role::P2PNotary,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Role::StateValidator => "StateValidator",
            Role::Oracle => "Oracle",
            Role::NeoFsAlphabetNode => "NeoFSAlphabetNode",
            Role::P2PNotary => "P2PNotary",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Role {
    type Err = ConsoleError;

    /// Accepts a role name (any case) or its numeric value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Role::ALL
            .iter()
            .copied()
            .find(|role| role.name().eq_ignore_ascii_case(s) || s.parse::<u8>() == Ok(*role as u8))
            .ok_or_else(|| {
                let names: Vec<_> = Role::ALL.iter().map(|r| r.name()).collect();
                ConsoleError::InvalidInput(format!("Unknown role '{}' (expected one of {})", s, names.join(", ")))
            })
    }
}
