//! Fuzz target: bonding-curve formula robustness
//!
//! Feeds random coin states and amounts to all four formulas.
//! Verifies they never panic, are deterministic, stay within the supply
//! and reserve bounds, and that inverse quotes never overshoot.
//!
//! Run: cargo +nightly fuzz run fuzz_formula

#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use noah_core::CoinState;
use num_bigint::BigUint;

#[derive(Arbitrary, Debug)]
struct FuzzFormulaInput {
    volume: u128,
    reserve: u128,
    crr: u8,
    amount: u128,
}

fuzz_target!(|input: FuzzFormulaInput| {
    let coin = match CoinState::from_u128(
        "FUZZ",
        input.volume,
        input.reserve,
        u32::from(input.crr),
    ) {
        Ok(coin) => coin,
        // Zero supply, zero reserve or crr outside 1..=100 must be refused
        Err(_) => {
            assert!(input.volume == 0 || input.reserve == 0 || input.crr == 0 || input.crr > 100);
            return;
        }
    };
    let amount = BigUint::from(input.amount);

    let minted = coin.purchase_return(&amount).expect("purchase_return on a valid coin");
    assert_eq!(Some(&minted), coin.purchase_return(&amount).ok().as_ref());

    match coin.sale_return(&amount) {
        Ok(released) => {
            assert!(amount < coin.volume);
            assert!(released < coin.reserve_balance);
        }
        Err(_) => assert!(amount >= coin.volume),
    }

    let deposit = coin.purchase_amount(&amount).expect("purchase_amount on a valid coin");
    let back = coin.purchase_return(&deposit).expect("purchase_return on a valid coin");
    assert!(back <= amount, "purchase_amount quote overshoots");

    match coin.sale_amount(&amount) {
        Ok(burn) => {
            assert!(burn < coin.volume);
            let released = coin.sale_return(&burn).expect("burn below volume");
            assert!(released <= amount, "sale_amount quote overshoots");
        }
        Err(_) => assert!(amount >= coin.reserve_balance),
    }
});
