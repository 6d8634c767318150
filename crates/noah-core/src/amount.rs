//! Decimal-string amounts.
//!
//! Amounts cross every boundary as plain base-10 strings so that no caller
//! loses precision to a machine word. TOML and JSON numbers are accepted on
//! input when they fit in a u64.

use num_bigint::BigUint;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,
    #[error("amount {0:?} is not a non-negative decimal integer")]
    NotDecimal(String),
}

/// Parse a non-negative decimal integer. Only ASCII digits are accepted:
/// no sign, no separators, no exponent.
pub fn parse_amount(s: &str) -> Result<BigUint, AmountError> {
    if s.is_empty() {
        return Err(AmountError::Empty);
    }
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AmountError::NotDecimal(s.to_string()));
    }
    BigUint::parse_bytes(s.as_bytes(), 10).ok_or_else(|| AmountError::NotDecimal(s.to_string()))
}

pub fn format_amount(amount: &BigUint) -> String {
    amount.to_str_radix(10)
}

/// Serde adapter for BigUint ↔ decimal string.
pub mod serde_amount {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(val: &BigUint, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format_amount(val))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BigUint, D::Error> {
        use serde::de::{self, Visitor};
        struct AmountVisitor;

        impl<'de> Visitor<'de> for AmountVisitor {
            type Value = BigUint;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a non-negative integer as a decimal string or integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<BigUint, E> {
                parse_amount(v).map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<BigUint, E> {
                Ok(BigUint::from(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<BigUint, E> {
                u64::try_from(v)
                    .map(BigUint::from)
                    .map_err(|_| E::custom("negative amount"))
            }
        }

        d.deserialize_any(AmountVisitor)
    }
}
