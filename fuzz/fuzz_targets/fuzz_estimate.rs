//! Fuzz target: Estimator robustness
//!
//! Builds a small snapshot from random coins and runs every estimate kind
//! over random symbols, amounts and heights.
//! Verifies the estimator never panics and always answers the same way.
//!
//! Run: cargo +nightly fuzz run fuzz_estimate

#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use noah_api::Estimator;
use noah_core::{CoinState, CoinTable, EstimatorConfig, MemorySnapshots};
use num_bigint::BigUint;

const SYMBOLS: [&str; 4] = ["NOAH", "AAA", "BBB", "CCC"];

#[derive(Arbitrary, Debug)]
struct FuzzEstimateInput {
    // (volume, reserve, crr) for AAA and BBB; CCC never exists
    coins: [(u64, u64, u8); 2],
    sell_idx: u8,
    buy_idx: u8,
    amount: u128,
    gas_price: u64,
    height: u8,
    commission: u32,
    scale_by_gas_price: bool,
}

fuzz_target!(|input: FuzzEstimateInput| {
    let coins = input
        .coins
        .iter()
        .zip(["AAA", "BBB"])
        .filter_map(|(&(volume, reserve, crr), symbol)| {
            CoinState::from_u128(symbol, volume.into(), reserve.into(), u32::from(crr)).ok()
        });
    let Ok(table) = CoinTable::from_coins(coins) else {
        return;
    };

    let config = EstimatorConfig {
        convert_commission: BigUint::from(input.commission.max(1)),
        commission_multiplier: BigUint::from(1u32),
        scale_commission_by_gas_price: input.scale_by_gas_price,
        ..Default::default()
    };
    let estimator = Estimator::new(config, MemorySnapshots::with_latest(table));

    let sell = SYMBOLS[usize::from(input.sell_idx) % SYMBOLS.len()];
    let buy = SYMBOLS[usize::from(input.buy_idx) % SYMBOLS.len()];
    let amount = BigUint::from(input.amount);
    let height = u64::from(input.height % 3);

    let first = estimator.estimate_sell_all(sell, buy, &amount, input.gas_price, height);
    let second = estimator.estimate_sell_all(sell, buy, &amount, input.gas_price, height);
    assert_eq!(first, second);

    let first = estimator.estimate_sell(sell, buy, &amount, height);
    let second = estimator.estimate_sell(sell, buy, &amount, height);
    assert_eq!(first, second);

    let first = estimator.estimate_buy(sell, buy, &amount, height);
    let second = estimator.estimate_buy(sell, buy, &amount, height);
    assert_eq!(first, second);

    if let Err(err) = first {
        assert!(matches!(err.code(), 400 | 404));
    }
});
