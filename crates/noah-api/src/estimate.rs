//! Conversion estimates: how much of one coin a trade would yield (or cost)
//! against a snapshot, net of the convert commission, without touching state.
//!
//! Commission is always charged in base coin, exactly once, at the point
//! where the path first holds base coin:
//!
//! | Path        | Sell direction                                   | Buy direction                                   |
//! |-------------|--------------------------------------------------|-------------------------------------------------|
//! | Direct buy  | `purchase_return(amount - c)`                    | `purchase_amount(want) + c`                     |
//! | Direct sell | `sale_return(amount) - c`                        | `sale_amount(want + c)`                         |
//! | Two-hop     | `purchase_return(sale_return(amount) - c)`       | `sale_amount(purchase_amount(want) + c)`        |

use crate::error::{CoinSide, EstimateError};
use noah_core::amount::serde_amount;
use noah_core::{
    parse_amount, CoinLookup, CoinState, CoinSymbol, EstimatorConfig, Height, SnapshotSource,
    LATEST_HEIGHT,
};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

// ─────────────────────────────────────────────────────────────────
// REQUEST / RESPONSE TYPES
// ─────────────────────────────────────────────────────────────────

/// One estimate query. Amounts are in the smallest unit of the sell coin
/// (sell direction) or the buy coin (buy direction).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub sell_symbol: CoinSymbol,
    pub buy_symbol: CoinSymbol,
    #[serde(with = "serde_amount")]
    pub amount: BigUint,
    #[serde(default)]
    pub gas_price: Option<u64>,
    #[serde(default)]
    pub height: Height,
}

impl ConversionRequest {
    /// Request against the latest snapshot with the minimum gas price
    pub fn new(sell: &str, buy: &str, amount: BigUint) -> Self {
        Self {
            sell_symbol: CoinSymbol::new(sell),
            buy_symbol: CoinSymbol::new(buy),
            amount,
            gas_price: None,
            height: LATEST_HEIGHT,
        }
    }

    /// Same as [`ConversionRequest::new`] with the amount as a decimal string
    pub fn parse(sell: &str, buy: &str, amount: &str) -> Result<Self, EstimateError> {
        Ok(Self::new(sell, buy, parse_amount(amount)?))
    }

    pub fn at_height(mut self, height: Height) -> Self {
        self.height = height;
        self
    }

    pub fn with_gas_price(mut self, gas_price: u64) -> Self {
        self.gas_price = Some(gas_price);
        self
    }

    /// Missing or zero gas price counts as 1
    pub fn effective_gas_price(&self) -> u64 {
        self.gas_price.unwrap_or(1).max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateSellAllResponse {
    #[serde(with = "serde_amount")]
    pub will_get: BigUint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateSellResponse {
    #[serde(with = "serde_amount")]
    pub will_get: BigUint,
    /// Base-coin commission already deducted from `will_get`
    #[serde(with = "serde_amount")]
    pub commission: BigUint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateBuyResponse {
    #[serde(with = "serde_amount")]
    pub will_pay: BigUint,
    /// Base-coin commission already included in `will_pay`
    #[serde(with = "serde_amount")]
    pub commission: BigUint,
}

// ─────────────────────────────────────────────────────────────────
// PATH CLASSIFICATION
// ─────────────────────────────────────────────────────────────────

/// A resolved side of the conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedCoin {
    Base,
    Coin(CoinState),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionPath {
    /// Spend base coin to mint `buy`
    DirectBuy { buy: CoinState },
    /// Burn `sell` to release base coin
    DirectSell { sell: CoinState },
    /// Burn `sell` into base coin, then mint `buy` with it
    TwoHop { sell: CoinState, buy: CoinState },
}

impl ConversionPath {
    /// `None` when both sides are the base coin
    pub fn classify(sell: ResolvedCoin, buy: ResolvedCoin) -> Option<Self> {
        match (sell, buy) {
            (ResolvedCoin::Base, ResolvedCoin::Coin(buy)) => Some(ConversionPath::DirectBuy { buy }),
            (ResolvedCoin::Coin(sell), ResolvedCoin::Base) => Some(ConversionPath::DirectSell { sell }),
            (ResolvedCoin::Coin(sell), ResolvedCoin::Coin(buy)) => {
                Some(ConversionPath::TwoHop { sell, buy })
            }
            (ResolvedCoin::Base, ResolvedCoin::Base) => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ConversionPath::DirectBuy { .. } => "direct_buy",
            ConversionPath::DirectSell { .. } => "direct_sell",
            ConversionPath::TwoHop { .. } => "two_hop",
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// ESTIMATOR
// ─────────────────────────────────────────────────────────────────

/// Stateless estimator over a snapshot source.
///
/// Holds only immutable configuration, so any number of estimates may run
/// concurrently against the same source. The source is responsible for
/// handing out snapshots that stay stable for the duration of a call.
#[derive(Debug, Clone)]
pub struct Estimator<S> {
    config: EstimatorConfig,
    source: S,
}

impl<S: SnapshotSource> Estimator<S> {
    pub fn new(config: EstimatorConfig, source: S) -> Self {
        Self { config, source }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Receive amount for selling `amount_to_sell`, commission scaled by
    /// `gas_price` only when the configuration says so.
    pub fn estimate_sell_all(
        &self,
        sell: &str,
        buy: &str,
        amount_to_sell: &BigUint,
        gas_price: u64,
        height: Height,
    ) -> Result<EstimateSellAllResponse, EstimateError> {
        let request = ConversionRequest::new(sell, buy, amount_to_sell.clone())
            .with_gas_price(gas_price)
            .at_height(height);
        self.sell_all(&request)
    }

    /// Receive amount for selling `amount_to_sell` at the minimum gas price
    pub fn estimate_sell(
        &self,
        sell: &str,
        buy: &str,
        amount_to_sell: &BigUint,
        height: Height,
    ) -> Result<EstimateSellResponse, EstimateError> {
        let request = ConversionRequest::new(sell, buy, amount_to_sell.clone()).at_height(height);
        self.sell(&request)
    }

    /// Sell-coin amount needed to receive `amount_to_buy`, commission included
    pub fn estimate_buy(
        &self,
        sell: &str,
        buy: &str,
        amount_to_buy: &BigUint,
        height: Height,
    ) -> Result<EstimateBuyResponse, EstimateError> {
        let request = ConversionRequest::new(sell, buy, amount_to_buy.clone()).at_height(height);
        self.buy(&request)
    }

    pub fn sell_all(
        &self,
        request: &ConversionRequest,
    ) -> Result<EstimateSellAllResponse, EstimateError> {
        let commission = self
            .config
            .commission_in_base_coin(request.effective_gas_price());
        let will_get = self.sell_for(request, &commission)?;
        Ok(EstimateSellAllResponse { will_get })
    }

    /// Ignores `request.gas_price`
    pub fn sell(&self, request: &ConversionRequest) -> Result<EstimateSellResponse, EstimateError> {
        let commission = self.config.commission_in_base_coin(1);
        let will_get = self.sell_for(request, &commission)?;
        Ok(EstimateSellResponse {
            will_get,
            commission,
        })
    }

    /// Ignores `request.gas_price`
    pub fn buy(&self, request: &ConversionRequest) -> Result<EstimateBuyResponse, EstimateError> {
        let commission = self.config.commission_in_base_coin(1);
        let path = self.resolve(request)?;
        let amount = &request.amount;

        let will_pay = match &path {
            ConversionPath::DirectBuy { buy } => buy.purchase_amount(amount)? + &commission,
            ConversionPath::DirectSell { sell } => sell.sale_amount(&(amount + &commission))?,
            ConversionPath::TwoHop { sell, buy } => {
                let base_needed = buy.purchase_amount(amount)? + &commission;
                trace!(%base_needed, "two-hop base coin needed");
                sell.sale_amount(&base_needed)?
            }
        };

        debug!(
            path = path.name(),
            sell = %request.sell_symbol,
            buy = %request.buy_symbol,
            %amount,
            %will_pay,
            "estimated buy"
        );
        Ok(EstimateBuyResponse {
            will_pay,
            commission,
        })
    }

    fn sell_for(
        &self,
        request: &ConversionRequest,
        commission: &BigUint,
    ) -> Result<BigUint, EstimateError> {
        let path = self.resolve(request)?;
        let amount = &request.amount;

        let will_get = match &path {
            ConversionPath::DirectBuy { buy } => {
                let deposit = deduct_commission(amount, commission)?;
                buy.purchase_return(&deposit)?
            }
            ConversionPath::DirectSell { sell } => {
                let released = sell.sale_return(amount)?;
                deduct_commission(&released, commission)?
            }
            ConversionPath::TwoHop { sell, buy } => {
                let released = sell.sale_return(amount)?;
                trace!(%released, "two-hop intermediate base coin");
                let deposit = deduct_commission(&released, commission)?;
                buy.purchase_return(&deposit)?
            }
        };

        debug!(
            path = path.name(),
            sell = %request.sell_symbol,
            buy = %request.buy_symbol,
            %amount,
            %will_get,
            "estimated sell"
        );
        Ok(will_get)
    }

    /// Validate both symbols against the snapshot at the requested height and
    /// pick the conversion path.
    pub fn resolve(&self, request: &ConversionRequest) -> Result<ConversionPath, EstimateError> {
        if request.sell_symbol == request.buy_symbol {
            return Err(EstimateError::IdenticalCoins(request.sell_symbol));
        }

        let snapshot = self.source.snapshot_at(request.height)?;
        let sell = self.lookup(&snapshot, &request.sell_symbol, CoinSide::Sell)?;
        let buy = self.lookup(&snapshot, &request.buy_symbol, CoinSide::Buy)?;

        let path = ConversionPath::classify(sell, buy)
            .ok_or(EstimateError::IdenticalCoins(request.sell_symbol))?;
        debug!(
            path = path.name(),
            sell = %request.sell_symbol,
            buy = %request.buy_symbol,
            height = request.height,
            "classified conversion path"
        );
        Ok(path)
    }

    fn lookup(
        &self,
        snapshot: &S::Snapshot,
        symbol: &CoinSymbol,
        side: CoinSide,
    ) -> Result<ResolvedCoin, EstimateError> {
        if self.config.is_base_coin(symbol) {
            return Ok(ResolvedCoin::Base);
        }
        let not_found = || EstimateError::CoinNotFound {
            side,
            symbol: *symbol,
        };
        if !snapshot.coin_exists(symbol) {
            return Err(not_found());
        }
        snapshot
            .coin_state(symbol)
            .map(ResolvedCoin::Coin)
            .ok_or_else(not_found)
    }
}

/// What is left of `available` after paying `commission`; must stay positive.
fn deduct_commission(available: &BigUint, commission: &BigUint) -> Result<BigUint, EstimateError> {
    if available <= commission {
        warn!(%available, %commission, "not enough coins to pay commission");
        return Err(EstimateError::InsufficientFunds {
            available: available.clone(),
            commission: commission.clone(),
        });
    }
    Ok(available - commission)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use noah_core::{CoinTable, MemorySnapshots, SnapshotError};

    fn n(v: u128) -> BigUint {
        BigUint::from(v)
    }

    fn config(commission: u128) -> EstimatorConfig {
        EstimatorConfig {
            convert_commission: n(commission),
            commission_multiplier: n(1),
            ..Default::default()
        }
    }

    fn snapshots() -> MemorySnapshots {
        MemorySnapshots::with_latest(
            CoinTable::from_coins(vec![
                CoinState::from_u128("AAA", 500, 500, 50).unwrap(),
                CoinState::from_u128("BBB", 1_000, 2_000, 100).unwrap(),
                CoinState::from_u128("LIN", 1_000, 1_000, 100).unwrap(),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn test_classify_paths() {
        let a = CoinState::from_u128("AAA", 1, 1, 1).unwrap();
        let path = ConversionPath::classify(ResolvedCoin::Base, ResolvedCoin::Coin(a.clone()));
        assert_eq!(path.unwrap().name(), "direct_buy");
        let path = ConversionPath::classify(ResolvedCoin::Coin(a.clone()), ResolvedCoin::Base);
        assert_eq!(path.unwrap().name(), "direct_sell");
        let path =
            ConversionPath::classify(ResolvedCoin::Coin(a.clone()), ResolvedCoin::Coin(a));
        assert_eq!(path.unwrap().name(), "two_hop");
        assert!(ConversionPath::classify(ResolvedCoin::Base, ResolvedCoin::Base).is_none());
    }

    #[test]
    fn test_resolve_picks_path_from_snapshot() {
        let estimator = Estimator::new(config(5), snapshots());
        let path = estimator
            .resolve(&ConversionRequest::new("aaa", "BBB", n(1)))
            .unwrap();
        assert_eq!(path.name(), "two_hop");
        let path = estimator
            .resolve(&ConversionRequest::new("NOAH", "LIN", n(1)))
            .unwrap();
        assert!(matches!(path, ConversionPath::DirectBuy { ref buy } if buy.crr == 100));
    }

    #[test]
    fn test_direct_buy_deducts_commission_first() {
        let estimator = Estimator::new(config(10), snapshots());
        let out = estimator.estimate_sell_all("NOAH", "LIN", &n(110), 1, 0).unwrap();
        assert_eq!(out.will_get, n(100));
    }

    #[test]
    fn test_direct_sell_deducts_commission_after() {
        let estimator = Estimator::new(config(5), snapshots());
        // 500 * (1 - 0.9^2) = 95 base coin, minus 5
        let out = estimator.estimate_sell("AAA", "noah", &n(50), 0).unwrap();
        assert_eq!(out.will_get, n(90));
        assert_eq!(out.commission, n(5));
    }

    #[test]
    fn test_two_hop_deducts_commission_once() {
        let estimator = Estimator::new(config(5), snapshots());
        // 95 base coin released, 90 after commission, 1000 * 90 / 2000 = 45
        let out = estimator.estimate_sell_all("AAA", "BBB", &n(50), 1, 0).unwrap();
        assert_eq!(out.will_get, n(45));
    }

    #[test]
    fn test_commission_not_covered() {
        let estimator = Estimator::new(config(10), snapshots());
        for amount in [0u128, 5, 10] {
            let err = estimator
                .estimate_sell_all("NOAH", "LIN", &n(amount), 1, 0)
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        }
        // 10 LIN releases exactly 10 base coin: nothing left after commission
        let err = estimator.estimate_sell("LIN", "NOAH", &n(10), 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
    }

    #[test]
    fn test_identical_coins_rejected_before_snapshot() {
        let estimator = Estimator::new(config(1), MemorySnapshots::new());
        let err = estimator.estimate_sell("aaa", "AAA", &n(1), 42).unwrap_err();
        assert_eq!(err, EstimateError::IdenticalCoins(CoinSymbol::new("AAA")));
        let err = estimator.estimate_buy("NOAH", "noah", &n(1), 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[test]
    fn test_missing_coin_sides() {
        let estimator = Estimator::new(config(1), snapshots());
        assert_eq!(
            estimator.estimate_sell("ZZZ", "AAA", &n(10), 0).unwrap_err(),
            EstimateError::CoinNotFound {
                side: CoinSide::Sell,
                symbol: CoinSymbol::new("ZZZ"),
            }
        );
        assert_eq!(
            estimator.estimate_sell("AAA", "ZZZ", &n(10), 0).unwrap_err(),
            EstimateError::CoinNotFound {
                side: CoinSide::Buy,
                symbol: CoinSymbol::new("ZZZ"),
            }
        );
    }

    #[test]
    fn test_unknown_height() {
        let estimator = Estimator::new(config(1), snapshots());
        let err = estimator.estimate_sell("AAA", "NOAH", &n(10), 7).unwrap_err();
        assert_eq!(
            err,
            EstimateError::SnapshotUnavailable(SnapshotError::Unavailable {
                height: 7,
                latest: Some(1),
            })
        );
    }

    #[test]
    fn test_sell_of_whole_volume_is_invalid_request() {
        let estimator = Estimator::new(config(1), snapshots());
        let err = estimator.estimate_sell("AAA", "NOAH", &n(500), 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[test]
    fn test_buy_mirrors_commission_placement() {
        let estimator = Estimator::new(config(5), snapshots());

        // direct buy: LIN is linear 1:1, plus commission
        let out = estimator.estimate_buy("NOAH", "LIN", &n(100), 0).unwrap();
        assert_eq!(out.will_pay, n(105));
        assert_eq!(out.commission, n(5));

        // direct sell: burn enough AAA to release 90 + 5 = 95 base coin
        let out = estimator.estimate_buy("AAA", "NOAH", &n(90), 0).unwrap();
        assert_eq!(out.will_pay, n(50));

        // two-hop: 45 BBB needs 90 base coin, plus 5 commission, from AAA
        let out = estimator.estimate_buy("AAA", "BBB", &n(45), 0).unwrap();
        assert_eq!(out.will_pay, n(50));
    }

    #[test]
    fn test_buy_beyond_reserve_rejected() {
        let estimator = Estimator::new(config(5), snapshots());
        let err = estimator.estimate_buy("AAA", "NOAH", &n(495), 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[test]
    fn test_gas_price_only_scales_when_configured() {
        let flat = Estimator::new(config(10), snapshots());
        let a = flat.estimate_sell_all("NOAH", "LIN", &n(200), 1, 0).unwrap();
        let b = flat.estimate_sell_all("NOAH", "LIN", &n(200), 9, 0).unwrap();
        assert_eq!(a, b);

        let scaled_config = EstimatorConfig {
            scale_commission_by_gas_price: true,
            ..config(10)
        };
        let scaled = Estimator::new(scaled_config, snapshots());
        let c = scaled.estimate_sell_all("NOAH", "LIN", &n(200), 0, 0).unwrap();
        assert_eq!(c.will_get, n(190));
        let d = scaled.estimate_sell_all("NOAH", "LIN", &n(200), 3, 0).unwrap();
        assert_eq!(d.will_get, n(170));
    }

    #[test]
    fn test_request_json_shape() {
        let request: ConversionRequest = serde_json::from_str(
            r#"{"sell_symbol":"noah","buy_symbol":"aaa","amount":"1000000000000000000000"}"#,
        )
        .unwrap();
        assert_eq!(request.height, LATEST_HEIGHT);
        assert_eq!(request.effective_gas_price(), 1);
        assert_eq!(request.buy_symbol, CoinSymbol::new("AAA"));

        let response = EstimateSellAllResponse { will_get: n(12345) };
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"will_get":"12345"}"#
        );
    }

    #[test]
    fn test_parse_request_amount() {
        let request = ConversionRequest::parse("AAA", "NOAH", "50").unwrap();
        assert_eq!(request.amount, n(50));
        let err = ConversionRequest::parse("AAA", "NOAH", "5e1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert_eq!(err.code(), 400);
    }

    #[test]
    fn test_custom_base_coin() {
        let cfg = EstimatorConfig {
            base_coin: CoinSymbol::new("AAA"),
            ..config(1)
        };
        let estimator = Estimator::new(cfg, snapshots());
        assert!(estimator.config().is_base_coin(&CoinSymbol::new("aaa")));
        // AAA is now the reserve coin; NOAH is an unknown coin
        let err = estimator.estimate_sell("AAA", "NOAH", &n(10), 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CoinNotFound);
        let out = estimator.estimate_sell_all("AAA", "LIN", &n(11), 1, 0).unwrap();
        assert_eq!(out.will_get, n(10));
    }
}
