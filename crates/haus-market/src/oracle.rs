//! Mento oracle rates and the market data resolver.

use crate::abi::{self, AbiArg};
use crate::assets::{MarketAddresses, StableAsset, NATIVE_SYMBOL};
use crate::rpc::ChainReader;
use crate::units;
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use haus_core::{HausError, HausResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Rate used for symbols that have no fallback table entry.
const UNKNOWN_SYMBOL_RATE: f64 = 1.0;
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Where a rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    /// Read from SortedOracles.
    OnChain,
    /// Static table, used when the oracle cannot be read.
    Fallback,
}

/// CELO priced in a stable asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleRate {
    /// e.g. `CELO/cUSD`
    pub pair: String,
    /// Stable units per CELO.
    pub rate: f64,
    /// CELO per stable unit; 0 when `rate` is 0.
    pub inverse: f64,
    /// Live oracle reports behind the median.
    pub num_reporters: u64,
    /// Timestamp of the median report.
    pub last_update: DateTime<Utc>,
    /// The oldest report has expired.
    pub is_expired: bool,
    /// Where the rate came from.
    pub source: RateSource,
}

/// Read-side market resolver. Holds an injected chain reader and the contract
/// addresses; computes every value fresh on each call.
#[derive(Clone)]
pub struct MarketData {
    pub(crate) reader: Arc<dyn ChainReader>,
    pub(crate) addresses: MarketAddresses,
    pub(crate) read_timeout: Duration,
}

impl MarketData {
    /// Resolver over `reader` with the default read timeout.
    pub fn new(reader: Arc<dyn ChainReader>, addresses: MarketAddresses) -> Self {
        Self {
            reader,
            addresses,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Bounds every on-chain attempt; a timed-out read takes the fallback path.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Contract addresses in use.
    pub fn addresses(&self) -> &MarketAddresses {
        &self.addresses
    }

    /// The injected chain reader.
    pub fn reader(&self) -> &Arc<dyn ChainReader> {
        &self.reader
    }

    /// Median CELO rate for a stable symbol. Never fails: any read error or an
    /// unknown symbol resolves to the static fallback table.
    pub async fn oracle_rate(&self, symbol: &str) -> OracleRate {
        let Some(asset) = self.addresses.stable(symbol) else {
            return fallback_rate(&self.addresses.canonical_symbol(symbol), None);
        };

        match tokio::time::timeout(self.read_timeout, self.read_on_chain(asset)).await {
            Ok(Ok(rate)) => rate,
            Ok(Err(e)) => {
                warn!(symbol = %asset.symbol, error = %e, "SortedOracles read failed, using fallback");
                fallback_rate(asset.symbol, Some(asset))
            }
            Err(_) => {
                warn!(symbol = %asset.symbol, "SortedOracles read timed out, using fallback");
                fallback_rate(asset.symbol, Some(asset))
            }
        }
    }

    /// Rates for every known stable, fetched concurrently. Each symbol resolves
    /// through its own fallback, so one failing read never affects another.
    pub async fn all_rates(&self) -> Vec<OracleRate> {
        join_all(
            self.addresses
                .stables
                .iter()
                .map(|asset| self.oracle_rate(asset.symbol)),
        )
        .await
    }

    async fn read_on_chain(&self, asset: &StableAsset) -> HausResult<OracleRate> {
        let oracles = self.addresses.sorted_oracles;
        let key = [AbiArg::Address(asset.token)];

        let (median, num_rates, timestamp, expired) = tokio::try_join!(
            self.reader
                .call(oracles, abi::encode_call(abi::MEDIAN_RATE, &key)),
            self.reader.call(oracles, abi::encode_call(abi::NUM_RATES, &key)),
            self.reader
                .call(oracles, abi::encode_call(abi::MEDIAN_TIMESTAMP, &key)),
            self.reader
                .call(oracles, abi::encode_call(abi::IS_OLDEST_REPORT_EXPIRED, &key)),
        )?;

        let numerator = abi::decode_uint(&median, 0)?;
        let denominator = abi::decode_uint(&median, 1)?;
        let rate = if denominator.is_zero() {
            0.0
        } else {
            units::to_f64(numerator) / units::to_f64(denominator)
        };

        let ts = abi::decode_uint(&timestamp, 0)?;
        let ts = i64::try_from(ts)
            .map_err(|_| HausError::Rpc(format!("median timestamp {ts} out of range")))?;
        let last_update = DateTime::<Utc>::from_timestamp(ts, 0)
            .ok_or_else(|| HausError::Rpc(format!("median timestamp {ts} out of range")))?;

        Ok(OracleRate {
            pair: pair_label(asset.symbol),
            rate,
            inverse: inverse_of(rate),
            num_reporters: u64::try_from(abi::decode_uint(&num_rates, 0)?).unwrap_or(u64::MAX),
            last_update,
            is_expired: abi::decode_bool(&expired, 0)?,
            source: RateSource::OnChain,
        })
    }
}

/// Terminal entry of the rate fallback chain.
pub fn fallback_rate(symbol: &str, asset: Option<&StableAsset>) -> OracleRate {
    let rate = asset.map_or(UNKNOWN_SYMBOL_RATE, |a| a.fallback_rate);
    OracleRate {
        pair: pair_label(symbol),
        rate,
        inverse: inverse_of(rate),
        num_reporters: 0,
        last_update: Utc::now(),
        is_expired: true,
        source: RateSource::Fallback,
    }
}

fn pair_label(symbol: &str) -> String {
    format!("{NATIVE_SYMBOL}/{symbol}")
}

fn inverse_of(rate: f64) -> f64 {
    if rate > 0.0 {
        1.0 / rate
    } else {
        0.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::assets::MarketAddresses;

    #[test]
    fn test_fallback_known_symbol() {
        let addrs = MarketAddresses::celo_mainnet();
        let rate = fallback_rate("cUSD", addrs.stable("cUSD"));
        assert_eq!(rate.pair, "CELO/cUSD");
        assert_eq!(rate.rate, 0.55);
        assert!((rate.inverse - 1.0 / 0.55).abs() < 1e-12);
        assert!(rate.is_expired);
        assert_eq!(rate.source, RateSource::Fallback);
    }

    #[test]
    fn test_fallback_unknown_symbol() {
        let rate = fallback_rate("XYZ", None);
        assert_eq!(rate.rate, 1.0);
        assert_eq!(rate.inverse, 1.0);
    }

    #[test]
    fn test_inverse_guard() {
        assert_eq!(inverse_of(0.0), 0.0);
        assert_eq!(inverse_of(4.0), 0.25);
    }
}
