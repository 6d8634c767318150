//! # Bonding-Curve Formulas
//!
//! Every non-base coin is minted against, and burned for, the base coin along
//! a constant-reserve-ratio curve parameterized by `(volume, reserve, crr)`.
//!
//! | Function                     | Real-valued relation                               |
//! |------------------------------|----------------------------------------------------|
//! | `calculate_purchase_return`  | `V * ((1 + d/R)^(crr/100) - 1)`                    |
//! | `calculate_sale_return`      | `R * (1 - (1 - a/V)^(100/crr))`                    |
//! | `calculate_purchase_amount`  | `R * ((1 + w/V)^(100/crr) - 1)`                    |
//! | `calculate_sale_amount`      | `V * (1 - (1 - w/R)^(crr/100))`                    |
//!
//! Results are the exact value of the relation floored toward zero. The
//! exponent is reduced to `p/q` and each fractional power is folded into a
//! single big-integer quotient whose integer `q`-th root is the answer, so the
//! output depends on nothing but integer arithmetic and is bit-identical on
//! every platform. No floating point anywhere.

use crate::{CoinState, MAX_CRR, MIN_CRR};
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::Zero;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    #[error("invalid coin state: volume and reserve must be positive, crr must be within [1, 100] (got crr {crr})")]
    InvalidCoinState { crr: u32 },
    #[error("cannot sell {amount} out of a total volume of {volume}")]
    SellExceedsSupply { amount: BigUint, volume: BigUint },
    #[error("reserve balance {reserve} is not sufficient to release {amount}")]
    InsufficientReserve { amount: BigUint, reserve: BigUint },
}

pub(crate) fn check_coin(volume: &BigUint, reserve: &BigUint, crr: u32) -> Result<(), FormulaError> {
    if volume.is_zero() || reserve.is_zero() || !(MIN_CRR..=MAX_CRR).contains(&crr) {
        return Err(FormulaError::InvalidCoinState { crr });
    }
    Ok(())
}

/// `crr / 100` in lowest terms
fn crr_exponent(crr: u32) -> (u32, u32) {
    let g = crr.gcd(&MAX_CRR);
    (crr / g, MAX_CRR / g)
}

/// floor(x^(1/n))
fn floor_root(x: &BigUint, n: u32) -> BigUint {
    if n == 1 {
        x.clone()
    } else {
        x.nth_root(n)
    }
}

/// ceil((num / den)^(1/n))
fn ceil_root_of_ratio(num: &BigUint, den: &BigUint, n: u32) -> BigUint {
    let k = floor_root(&(num / den), n);
    if &(k.pow(n) * den) == num {
        k
    } else {
        k + 1u32
    }
}

// ─────────────────────────────────────────────────────────────────
// FORWARD DIRECTION (amount in → amount out)
// ─────────────────────────────────────────────────────────────────

/// Coins minted when `deposit` base coin is added to the reserve.
pub fn calculate_purchase_return(
    volume: &BigUint,
    reserve: &BigUint,
    crr: u32,
    deposit: &BigUint,
) -> Result<BigUint, FormulaError> {
    check_coin(volume, reserve, crr)?;
    if deposit.is_zero() {
        return Ok(BigUint::zero());
    }
    if crr == MAX_CRR {
        return Ok(volume * deposit / reserve);
    }

    // V * ((R + d) / R)^(p/q) = (V^q * (R + d)^p / R^p)^(1/q)
    let (p, q) = crr_exponent(crr);
    let grown = volume.pow(q) * (reserve + deposit).pow(p) / reserve.pow(p);
    Ok(floor_root(&grown, q) - volume)
}

/// Base coin released from the reserve when `sell_amount` coins are burned.
/// Burning the whole volume (or more) is rejected.
pub fn calculate_sale_return(
    volume: &BigUint,
    reserve: &BigUint,
    crr: u32,
    sell_amount: &BigUint,
) -> Result<BigUint, FormulaError> {
    check_coin(volume, reserve, crr)?;
    if sell_amount.is_zero() {
        return Ok(BigUint::zero());
    }
    if sell_amount >= volume {
        return Err(FormulaError::SellExceedsSupply {
            amount: sell_amount.clone(),
            volume: volume.clone(),
        });
    }
    if crr == MAX_CRR {
        return Ok(reserve * sell_amount / volume);
    }

    // R * ((V - a) / V)^(q/p) = (R^p * (V - a)^q / V^q)^(1/p), rounded up so
    // the released amount rounds down.
    let (p, q) = crr_exponent(crr);
    let left = ceil_root_of_ratio(
        &(reserve.pow(p) * (volume - sell_amount).pow(q)),
        &volume.pow(q),
        p,
    );
    Ok(reserve - left)
}

// ─────────────────────────────────────────────────────────────────
// INVERSE DIRECTION (amount wanted → amount required)
// ─────────────────────────────────────────────────────────────────

/// Base coin to deposit in order to mint `want_receive` coins.
pub fn calculate_purchase_amount(
    volume: &BigUint,
    reserve: &BigUint,
    crr: u32,
    want_receive: &BigUint,
) -> Result<BigUint, FormulaError> {
    check_coin(volume, reserve, crr)?;
    if want_receive.is_zero() {
        return Ok(BigUint::zero());
    }
    if crr == MAX_CRR {
        return Ok(want_receive * reserve / volume);
    }

    // R * ((V + w) / V)^(q/p) = (R^p * (V + w)^q / V^q)^(1/p)
    let (p, q) = crr_exponent(crr);
    let grown = reserve.pow(p) * (volume + want_receive).pow(q) / volume.pow(q);
    Ok(floor_root(&grown, p) - reserve)
}

/// Coins to burn in order to release `want_receive` base coin. Draining the
/// whole reserve (or more) is rejected.
pub fn calculate_sale_amount(
    volume: &BigUint,
    reserve: &BigUint,
    crr: u32,
    want_receive: &BigUint,
) -> Result<BigUint, FormulaError> {
    check_coin(volume, reserve, crr)?;
    if want_receive.is_zero() {
        return Ok(BigUint::zero());
    }
    if want_receive >= reserve {
        return Err(FormulaError::InsufficientReserve {
            amount: want_receive.clone(),
            reserve: reserve.clone(),
        });
    }
    if crr == MAX_CRR {
        return Ok(want_receive * volume / reserve);
    }

    // V * ((R - w) / R)^(p/q) = (V^q * (R - w)^p / R^p)^(1/q)
    let (p, q) = crr_exponent(crr);
    let left = ceil_root_of_ratio(
        &(volume.pow(q) * (reserve - want_receive).pow(p)),
        &reserve.pow(p),
        q,
    );
    Ok(volume - left)
}

impl CoinState {
    pub fn purchase_return(&self, deposit: &BigUint) -> Result<BigUint, FormulaError> {
        calculate_purchase_return(&self.volume, &self.reserve_balance, self.crr, deposit)
    }

    pub fn sale_return(&self, sell_amount: &BigUint) -> Result<BigUint, FormulaError> {
        calculate_sale_return(&self.volume, &self.reserve_balance, self.crr, sell_amount)
    }

    pub fn purchase_amount(&self, want_receive: &BigUint) -> Result<BigUint, FormulaError> {
        calculate_purchase_amount(&self.volume, &self.reserve_balance, self.crr, want_receive)
    }

    pub fn sale_amount(&self, want_receive: &BigUint) -> Result<BigUint, FormulaError> {
        calculate_sale_amount(&self.volume, &self.reserve_balance, self.crr, want_receive)
    }
}
