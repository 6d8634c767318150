use noah_core::{AmountError, CoinSymbol, FormulaError, SnapshotError};
use num_bigint::BigUint;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Which side of the conversion a symbol was given for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoinSide {
    Sell,
    Buy,
}

impl fmt::Display for CoinSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoinSide::Sell => f.write_str("sell"),
            CoinSide::Buy => f.write_str("buy"),
        }
    }
}

/// Coarse failure class reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidRequest,
    CoinNotFound,
    InsufficientFunds,
    SnapshotUnavailable,
}

/// Every way a single estimate can fail. None of them carry a partial result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EstimateError {
    #[error("\"From\" coin equals to \"to\" coin ({0})")]
    IdenticalCoins(CoinSymbol),
    #[error("Coin to {side} not exists: {symbol}")]
    CoinNotFound { side: CoinSide, symbol: CoinSymbol },
    #[error("Not enough coins to pay commission: have {available}, commission is {commission}")]
    InsufficientFunds {
        available: BigUint,
        commission: BigUint,
    },
    #[error(transparent)]
    SnapshotUnavailable(#[from] SnapshotError),
    #[error(transparent)]
    Formula(#[from] FormulaError),
    #[error(transparent)]
    InvalidAmount(#[from] AmountError),
}

impl EstimateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EstimateError::IdenticalCoins(_)
            | EstimateError::Formula(_)
            | EstimateError::InvalidAmount(_) => ErrorKind::InvalidRequest,
            EstimateError::CoinNotFound { .. } => ErrorKind::CoinNotFound,
            EstimateError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            EstimateError::SnapshotUnavailable(_) => ErrorKind::SnapshotUnavailable,
        }
    }

    /// HTTP-style status an RPC layer reports for this error
    pub fn code(&self) -> u16 {
        match self.kind() {
            ErrorKind::InvalidRequest | ErrorKind::InsufficientFunds => 400,
            ErrorKind::CoinNotFound | ErrorKind::SnapshotUnavailable => 404,
        }
    }
}
