//! # Ledger Snapshots
//!
//! Read-only, height-addressed views of coin reserve state. Query code only
//! sees the [`SnapshotSource`] / [`CoinLookup`] pair, so it does not care
//! whether history lives in a copy-on-write tree, an append-only log or, as
//! with [`MemorySnapshots`], a map of frozen tables.

use crate::{CoinState, CoinSymbol, Height, LATEST_HEIGHT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("no state snapshot for height {height} (latest is {latest:?})")]
    Unavailable { height: Height, latest: Option<Height> },
    #[error("cannot commit height {height}: latest committed height is {latest}")]
    NonIncreasingHeight { height: Height, latest: Height },
    #[error("duplicate coin {0} in snapshot")]
    DuplicateCoin(CoinSymbol),
    #[error("invalid snapshot document: {0}")]
    Parse(String),
}

/// Coin lookups against one fixed height.
pub trait CoinLookup {
    fn coin_exists(&self, symbol: &CoinSymbol) -> bool;

    /// Defined only when `coin_exists` is true
    fn coin_state(&self, symbol: &CoinSymbol) -> Option<CoinState>;
}

/// Resolves a height into a stable snapshot. Height 0 means latest.
pub trait SnapshotSource {
    type Snapshot: CoinLookup;

    fn snapshot_at(&self, height: Height) -> Result<Self::Snapshot, SnapshotError>;
}

impl<T: CoinLookup + ?Sized> CoinLookup for Arc<T> {
    fn coin_exists(&self, symbol: &CoinSymbol) -> bool {
        (**self).coin_exists(symbol)
    }

    fn coin_state(&self, symbol: &CoinSymbol) -> Option<CoinState> {
        (**self).coin_state(symbol)
    }
}

impl<T: CoinLookup + ?Sized> CoinLookup for &T {
    fn coin_exists(&self, symbol: &CoinSymbol) -> bool {
        (**self).coin_exists(symbol)
    }

    fn coin_state(&self, symbol: &CoinSymbol) -> Option<CoinState> {
        (**self).coin_state(symbol)
    }
}

// ─────────────────────────────────────────────────────────────────
// COIN TABLE
// ─────────────────────────────────────────────────────────────────

/// Immutable set of coin states at one height.
/// BTreeMap keeps iteration and serialization order deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CoinState>", into = "Vec<CoinState>")]
pub struct CoinTable {
    coins: BTreeMap<CoinSymbol, CoinState>,
}

impl CoinTable {
    pub fn from_coins<I>(coins: I) -> Result<Self, SnapshotError>
    where
        I: IntoIterator<Item = CoinState>,
    {
        let mut map = BTreeMap::new();
        for coin in coins {
            let symbol = coin.symbol;
            if map.insert(symbol, coin).is_some() {
                return Err(SnapshotError::DuplicateCoin(symbol));
            }
        }
        Ok(Self { coins: map })
    }

    /// Parse a JSON array of coin states
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(json).map_err(|e| SnapshotError::Parse(e.to_string()))
    }

    /// Parse a TOML document listing coins as `[[coins]]` tables
    pub fn from_toml(content: &str) -> Result<Self, SnapshotError> {
        let doc: CoinTableDoc =
            toml::from_str(content).map_err(|e| SnapshotError::Parse(e.to_string()))?;
        Self::from_coins(doc.coins)
    }

    pub fn len(&self) -> usize {
        self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CoinState> {
        self.coins.values()
    }
}

/// TOML has no top-level arrays, so coin tables are wrapped in a `coins` key
#[derive(Deserialize)]
struct CoinTableDoc {
    coins: Vec<CoinState>,
}

impl TryFrom<Vec<CoinState>> for CoinTable {
    type Error = SnapshotError;

    fn try_from(coins: Vec<CoinState>) -> Result<Self, Self::Error> {
        Self::from_coins(coins)
    }
}

impl From<CoinTable> for Vec<CoinState> {
    fn from(table: CoinTable) -> Self {
        table.coins.into_values().collect()
    }
}

impl CoinLookup for CoinTable {
    fn coin_exists(&self, symbol: &CoinSymbol) -> bool {
        self.coins.contains_key(symbol)
    }

    fn coin_state(&self, symbol: &CoinSymbol) -> Option<CoinState> {
        self.coins.get(symbol).cloned()
    }
}

// ─────────────────────────────────────────────────────────────────
// IN-MEMORY HISTORY
// ─────────────────────────────────────────────────────────────────

/// Height → frozen table. Readers receive `Arc` clones, so a snapshot handed
/// out stays valid and unchanged while later heights are committed.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshots {
    heights: BTreeMap<Height, Arc<CoinTable>>,
}

impl MemorySnapshots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single snapshot at height 1
    pub fn with_latest(table: CoinTable) -> Self {
        let mut heights = BTreeMap::new();
        heights.insert(1, Arc::new(table));
        Self { heights }
    }

    /// Commit the table for a new block. Heights must strictly increase and
    /// start above 0, which is reserved for "latest".
    pub fn commit(&mut self, height: Height, table: CoinTable) -> Result<(), SnapshotError> {
        let latest = self.latest_height().unwrap_or(LATEST_HEIGHT);
        if height <= latest {
            return Err(SnapshotError::NonIncreasingHeight { height, latest });
        }
        self.heights.insert(height, Arc::new(table));
        tracing::debug!(height, "committed coin snapshot");
        Ok(())
    }

    pub fn latest_height(&self) -> Option<Height> {
        self.heights.keys().next_back().copied()
    }
}

impl SnapshotSource for MemorySnapshots {
    type Snapshot = Arc<CoinTable>;

    fn snapshot_at(&self, height: Height) -> Result<Arc<CoinTable>, SnapshotError> {
        let found = if height == LATEST_HEIGHT {
            self.heights.values().next_back()
        } else {
            self.heights.get(&height)
        };
        found.cloned().ok_or(SnapshotError::Unavailable {
            height,
            latest: self.latest_height(),
        })
    }
}

impl<S: SnapshotSource + ?Sized> SnapshotSource for &S {
    type Snapshot = S::Snapshot;

    fn snapshot_at(&self, height: Height) -> Result<Self::Snapshot, SnapshotError> {
        (**self).snapshot_at(height)
    }
}
