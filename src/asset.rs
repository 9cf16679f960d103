//! Token metadata read from the chain.

use crate::amount::TokenAmount;
use crate::crypto::AccountId;
use crate::engine::{call_read_only, LedgerEngine, Snapshot};
use crate::error::{ConsoleError, Result};
use crate::native::token;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDescriptor {
    pub asset: AccountId,
    pub symbol: String,
    pub decimals: u8,
}

impl AssetDescriptor {
    /// Reads `decimals` and `symbol` from the token contract.
    pub fn query(engine: &dyn LedgerEngine, snapshot: &Snapshot, asset: AccountId) -> Result<Self> {
        let not_a_token = |e: ConsoleError| {
            ConsoleError::InvalidInput(format!("{} is not a readable token: {}", asset, e))
        };

        let decimals = call_read_only(engine, snapshot, asset, token::DECIMALS, vec![])
            .map_err(not_a_token)?
            .as_integer()
            .and_then(|d| u8::try_from(d).ok())
            .filter(|d| *d <= TokenAmount::MAX_DECIMALS)
            .ok_or_else(|| ConsoleError::InvalidInput(format!("{} reports invalid decimals", asset)))?;

        let symbol = call_read_only(engine, snapshot, asset, token::SYMBOL, vec![])
            .map_err(not_a_token)?
            .as_string()
            .unwrap_or_else(|| asset.to_string());

        Ok(AssetDescriptor {
            asset,
            symbol,
            decimals,
        })
    }

    /// Parses an operator amount in whole tokens into base units.
    pub fn parse_amount(&self, literal: &str) -> Result<TokenAmount> {
        TokenAmount::parse_positive(literal, self.decimals)
    }
}
