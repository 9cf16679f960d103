//! Transactions: wire types, hashing and pre-relay validation

pub mod types;
pub mod validation;

pub use types::*;
pub use validation::validate_signed;
