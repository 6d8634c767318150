// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// NOAH - CONVERSION ESTIMATES
//
// Read-only quotes for sell, sell-all and buy conversions between any two
// coins of a ledger snapshot. Routes through the base coin when neither side
// is the base coin and charges the convert commission once, in base coin.
// Transport, routing and encoding of results are left to the caller.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub mod error;
pub mod estimate;

pub use error::{CoinSide, ErrorKind, EstimateError};
pub use estimate::{
    ConversionPath, ConversionRequest, EstimateBuyResponse, EstimateSellAllResponse,
    EstimateSellResponse, Estimator, ResolvedCoin,
};
