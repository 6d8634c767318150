//! Shared fixtures for the cross-crate scenario tests in `tests/`.

use noah_core::{CoinState, CoinTable, EstimatorConfig};
use num_bigint::BigUint;
use std::error::Error;

pub fn n(v: u128) -> BigUint {
    BigUint::from(v)
}

/// Commission of `commission` PIP per convert, no gas-price scaling
pub fn flat_config(commission: u128) -> EstimatorConfig {
    EstimatorConfig {
        convert_commission: n(commission),
        commission_multiplier: n(1),
        ..Default::default()
    }
}

/// Table of `(symbol, volume, reserve, crr)` rows
pub fn coin_table(rows: &[(&str, u128, u128, u32)]) -> Result<CoinTable, Box<dyn Error>> {
    let coins = rows
        .iter()
        .map(|&(symbol, volume, reserve, crr)| CoinState::from_u128(symbol, volume, reserve, crr))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CoinTable::from_coins(coins)?)
}

/// AAA (500, 500, crr 50) and BBB (1000, 2000, crr 100)
pub fn two_coin_table() -> Result<CoinTable, Box<dyn Error>> {
    coin_table(&[("AAA", 500, 500, 50), ("BBB", 1_000, 2_000, 100)])
}
