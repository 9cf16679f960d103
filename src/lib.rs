//! Trinity Console - operator command layer for a TrinityChain node
//!
//! # Architecture
//!
//! Every state-changing command runs the same workflow: signer normalization,
//! script assembly, a dry-run the operator can inspect, finalization through
//! the wallet and an explicit confirm-and-relay gate. The ledger and the
//! wallet are collaborators reached through traits.
//!
//! ## Invocation Core
//! - [`signer`] - Signers and sender-first normalization
//! - [`script`] - Contract parameters, script builder and assembler
//! - [`engine`] - Ledger engine interface and the dry-run executor
//! - [`workflow`] - Finalizer, relay gate and the workflow runner
//!
//! ## Ledger Types
//! - [`transaction`] - Transactions, witnesses and validation
//! - [`crypto`] - Account identifiers, keys and witness scripts
//! - [`amount`] - Token amounts with declared precision
//! - [`asset`] - Token metadata read from the chain
//! - [`native`] - Native contract catalog
//!
//! ## Collaborators
//! - [`rpc`] - JSON-RPC ledger engine for a running node
//! - [`wallet`] - Wallet interface and the JSON key store
//!
//! ## Console
//! - [`commands`] - Command catalog, argument binding and dispatch
//! - [`console`] - Terminal output and prompts
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Invocation Core
// ============================================================================
pub mod engine;
pub mod script;
pub mod signer;
pub mod workflow;

// ============================================================================
// Ledger Types
// ============================================================================
pub mod amount;
pub mod asset;
pub mod crypto;
pub mod native;
pub mod transaction;

// ============================================================================
// Collaborators
// ============================================================================
pub mod rpc;
pub mod wallet;

// ============================================================================
// Console
// ============================================================================
pub mod commands;
pub mod console;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;

pub use error::{ConsoleError, Result};
