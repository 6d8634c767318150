//! Fuzz target: snapshot document parsing
//!
//! Feeds arbitrary bytes to CoinTable::from_json().
//! Verifies parsing never panics and every accepted coin is valid.
//!
//! Run: cargo +nightly fuzz run fuzz_snapshot_json

#![no_main]
use libfuzzer_sys::fuzz_target;
use noah_core::CoinTable;

fuzz_target!(|data: &[u8]| {
    let Ok(json) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(table) = CoinTable::from_json(json) {
        assert!(table.iter().all(|coin| coin.is_valid()));
        let encoded = serde_json::to_string(&table).expect("valid table encodes");
        assert_eq!(CoinTable::from_json(&encoded).ok(), Some(table));
    }
});
