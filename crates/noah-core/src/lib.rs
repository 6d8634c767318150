// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// NOAH - CORE MODULE
//
// Ledger primitives shared by every read-only query: coin symbols, coin
// reserve state, protocol commission constants, decimal amounts, the
// bonding-curve formulas and the height-addressed snapshot interface.
// All financial arithmetic uses arbitrary-precision PIP units (no floats).
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub mod amount;
pub mod config;
pub mod formula;
pub mod snapshot;

pub use amount::{format_amount, parse_amount, AmountError};
pub use config::{ConfigError, EstimatorConfig};
pub use formula::FormulaError;
pub use snapshot::{CoinLookup, CoinTable, MemorySnapshots, SnapshotError, SnapshotSource};

/// 1 NOAH = 10^18 PIP (smallest indivisible unit)
pub const PIP_PER_NOAH: u128 = 1_000_000_000_000_000_000;

/// Symbol of the reserve coin every other coin is backed by
pub const BASE_COIN_SYMBOL: &str = "NOAH";

/// Commission units charged for a convert (sell / sell-all / buy) transaction
pub const CONVERT_TX_COMMISSION: u64 = 100;

/// Scales commission units into PIP (10^15 PIP = 0.001 NOAH per unit)
pub const COMMISSION_MULTIPLIER: u64 = 1_000_000_000_000_000;

/// Lower bound of the constant reserve ratio, in percent
pub const MIN_CRR: u32 = 1;

/// Upper bound of the constant reserve ratio, in percent
pub const MAX_CRR: u32 = 100;

/// Coin symbols are stored in a fixed 10-byte array
pub const COIN_SYMBOL_LEN: usize = 10;

/// Block height a snapshot is addressed by
pub type Height = u64;

/// Height 0 always resolves to the latest committed state
pub const LATEST_HEIGHT: Height = 0;

// ─────────────────────────────────────────────────────────────────
// COIN SYMBOL
// ─────────────────────────────────────────────────────────────────

/// Fixed-width, normalized coin identifier.
///
/// Raw text is trimmed, ASCII letters are upper-cased and at most
/// [`COIN_SYMBOL_LEN`] bytes are kept (the rest is zero padding), so
/// `"noah"`, `" NOAH "` and `"NOAH"` are the same symbol.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CoinSymbol([u8; COIN_SYMBOL_LEN]);

impl CoinSymbol {
    pub fn new(raw: &str) -> Self {
        let mut bytes = [0u8; COIN_SYMBOL_LEN];
        let normalized = raw.trim().to_ascii_uppercase();
        let src = normalized.as_bytes();
        let len = src.len().min(COIN_SYMBOL_LEN);
        bytes[..len].copy_from_slice(&src[..len]);
        CoinSymbol(bytes)
    }

    /// The protocol reserve coin under the default configuration
    pub fn base() -> Self {
        Self::new(BASE_COIN_SYMBOL)
    }

    pub fn as_bytes(&self) -> &[u8; COIN_SYMBOL_LEN] {
        &self.0
    }

    /// True for the all-zero symbol produced by empty input
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl fmt::Display for CoinSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = self
            .0
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(COIN_SYMBOL_LEN);
        f.write_str(&String::from_utf8_lossy(&self.0[..end]))
    }
}

impl fmt::Debug for CoinSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CoinSymbol({})", self)
    }
}

impl FromStr for CoinSymbol {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(CoinSymbol::new(s))
    }
}

impl From<&str> for CoinSymbol {
    fn from(s: &str) -> Self {
        CoinSymbol::new(s)
    }
}

impl Serialize for CoinSymbol {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for CoinSymbol {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        Ok(CoinSymbol::new(&raw))
    }
}

// ─────────────────────────────────────────────────────────────────
// COIN STATE
// ─────────────────────────────────────────────────────────────────

/// Reserve state of a non-base coin as of one snapshot.
///
/// `volume` is the minted supply and `reserve_balance` the base coin backing
/// it, both in PIP. `crr` is the constant reserve ratio in percent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CoinStateRecord")]
pub struct CoinState {
    pub symbol: CoinSymbol,
    #[serde(with = "amount::serde_amount")]
    pub volume: BigUint,
    #[serde(with = "amount::serde_amount")]
    pub reserve_balance: BigUint,
    pub crr: u32,
}

/// Unvalidated wire form of [`CoinState`]
#[derive(Deserialize)]
struct CoinStateRecord {
    symbol: CoinSymbol,
    #[serde(with = "amount::serde_amount")]
    volume: BigUint,
    #[serde(with = "amount::serde_amount")]
    reserve_balance: BigUint,
    crr: u32,
}

impl TryFrom<CoinStateRecord> for CoinState {
    type Error = FormulaError;

    fn try_from(r: CoinStateRecord) -> Result<Self, Self::Error> {
        CoinState::new(r.symbol, r.volume, r.reserve_balance, r.crr)
    }
}

impl CoinState {
    /// Build a coin state, rejecting empty supply, empty reserve or a CRR
    /// outside `[MIN_CRR, MAX_CRR]`.
    pub fn new(
        symbol: CoinSymbol,
        volume: BigUint,
        reserve_balance: BigUint,
        crr: u32,
    ) -> Result<Self, FormulaError> {
        formula::check_coin(&volume, &reserve_balance, crr)?;
        Ok(CoinState {
            symbol,
            volume,
            reserve_balance,
            crr,
        })
    }

    /// Convenience constructor for fixtures and tests working in u128
    pub fn from_u128(
        symbol: &str,
        volume: u128,
        reserve_balance: u128,
        crr: u32,
    ) -> Result<Self, FormulaError> {
        Self::new(
            CoinSymbol::new(symbol),
            BigUint::from(volume),
            BigUint::from(reserve_balance),
            crr,
        )
    }

    pub fn is_valid(&self) -> bool {
        !self.volume.is_zero()
            && !self.reserve_balance.is_zero()
            && (MIN_CRR..=MAX_CRR).contains(&self.crr)
    }
}
