//! Swap quotes.

use crate::abi::{self, AbiArg};
use crate::assets::{MarketAddresses, NATIVE_SYMBOL};
use crate::oracle::MarketData;
use crate::units::{self, TOKEN_DECIMALS};
use alloy_primitives::Address;
use haus_core::{HausError, HausResult};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Mento exchange spread.
pub const DIRECT_SLIPPAGE: f64 = 0.3;
/// Oracle-derived estimate for a CELO pair.
pub const ESTIMATE_SLIPPAGE: f64 = 0.5;
/// Two-hop estimate between stables.
pub const CROSS_STABLE_SLIPPAGE: f64 = 0.8;

/// How a quote was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteSource {
    /// Mento exchange `getBuyTokenAmount`.
    DirectExchange,
    /// Derived from oracle rates.
    Estimated,
}

/// Expected proceeds of a swap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapQuote {
    /// Canonical symbol sold.
    pub sell_currency: String,
    /// Canonical symbol bought.
    pub buy_currency: String,
    /// Amount sold, as given.
    pub sell_amount: String,
    /// Expected amount bought, formatted.
    pub buy_amount: String,
    /// Buy units per sell unit.
    pub rate: f64,
    /// Percent.
    pub slippage: f64,
    /// How the quote was produced.
    pub source: QuoteSource,
}

impl SwapQuote {
    /// `buy_amount` as a number; 0 if it does not parse.
    pub fn buy_amount_f64(&self) -> f64 {
        self.buy_amount.parse().unwrap_or(0.0)
    }

    /// Buy amount less the quoted slippage.
    pub fn min_buy_amount(&self) -> f64 {
        self.buy_amount_f64() * (1.0 - self.slippage / 100.0)
    }
}

/// How a pair is routed.
enum Route {
    Direct {
        exchange: Address,
        sell_gold: bool,
    },
    Estimate,
    CrossStable,
}

impl MarketData {
    /// Quotes selling `amount` of `sell` for `buy`.
    ///
    /// CELO against a stable with a Mento exchange reads the exchange directly
    /// and falls back to an oracle estimate. Stable against stable is a
    /// two-hop estimate through CELO that ignores the compounding of the two
    /// spreads.
    pub async fn quote(&self, sell: &str, buy: &str, amount: &str) -> HausResult<SwapQuote> {
        let sell = self.addresses.canonical_symbol(sell);
        let buy = self.addresses.canonical_symbol(buy);
        if sell == buy {
            return Err(HausError::Validation(format!("cannot swap {sell} for itself")));
        }
        let amount_f = units::parse_amount(amount)?;
        let amount = amount.trim().to_string();

        match self.route(&sell, &buy) {
            Route::Direct {
                exchange,
                sell_gold,
            } => match tokio::time::timeout(
                self.read_timeout,
                self.direct_quote(&sell, &buy, &amount, amount_f, exchange, sell_gold),
            )
            .await
            {
                Ok(Ok(quote)) => Ok(quote),
                Ok(Err(e)) => {
                    warn!(sell = %sell, buy = %buy, error = %e, "Mento exchange quote failed, using oracle estimate");
                    Ok(self.estimated_quote(sell, buy, amount, amount_f).await)
                }
                Err(_) => {
                    warn!(sell = %sell, buy = %buy, "Mento exchange quote timed out, using oracle estimate");
                    Ok(self.estimated_quote(sell, buy, amount, amount_f).await)
                }
            },
            Route::Estimate => Ok(self.estimated_quote(sell, buy, amount, amount_f).await),
            Route::CrossStable => Ok(self.cross_stable_quote(sell, buy, amount, amount_f).await),
        }
    }

    fn route(&self, sell: &str, buy: &str) -> Route {
        let sell_native = MarketAddresses::is_native(sell);
        let buy_native = MarketAddresses::is_native(buy);
        if !sell_native && !buy_native {
            return Route::CrossStable;
        }
        let stable = if sell_native { buy } else { sell };
        match self.addresses.stable(stable).and_then(|s| s.exchange) {
            Some(exchange) => Route::Direct {
                exchange,
                sell_gold: sell_native,
            },
            None => Route::Estimate,
        }
    }

    async fn direct_quote(
        &self,
        sell: &str,
        buy: &str,
        amount: &str,
        amount_f: f64,
        exchange: Address,
        sell_gold: bool,
    ) -> HausResult<SwapQuote> {
        let sell_wei = units::parse_units(amount, TOKEN_DECIMALS)?;
        let data = abi::encode_call(
            abi::GET_BUY_TOKEN_AMOUNT,
            &[AbiArg::Uint(sell_wei), AbiArg::Bool(sell_gold)],
        );
        let raw = self.reader.call(exchange, data).await?;
        let buy_wei = abi::decode_uint(&raw, 0)?;
        let buy_amount = units::format_units(buy_wei, TOKEN_DECIMALS);
        let rate = units::to_f64(buy_wei) / 1e18 / amount_f;

        Ok(SwapQuote {
            sell_currency: sell.to_string(),
            buy_currency: buy.to_string(),
            sell_amount: amount.to_string(),
            buy_amount,
            rate,
            slippage: DIRECT_SLIPPAGE,
            source: QuoteSource::DirectExchange,
        })
    }

    async fn estimated_quote(
        &self,
        sell: String,
        buy: String,
        amount: String,
        amount_f: f64,
    ) -> SwapQuote {
        let selling_native = sell == NATIVE_SYMBOL;
        let stable = if selling_native { &buy } else { &sell };
        let rate = self.oracle_rate(stable).await;
        let buy_amount = if selling_native {
            amount_f * rate.rate
        } else {
            amount_f * rate.inverse
        };
        finish(sell, buy, amount, amount_f, buy_amount, ESTIMATE_SLIPPAGE)
    }

    async fn cross_stable_quote(
        &self,
        sell: String,
        buy: String,
        amount: String,
        amount_f: f64,
    ) -> SwapQuote {
        let (sell_rate, buy_rate) = tokio::join!(self.oracle_rate(&sell), self.oracle_rate(&buy));
        let celo = amount_f * sell_rate.inverse;
        let buy_amount = celo * buy_rate.rate;
        finish(sell, buy, amount, amount_f, buy_amount, CROSS_STABLE_SLIPPAGE)
    }
}

fn finish(
    sell: String,
    buy: String,
    amount: String,
    amount_f: f64,
    buy_amount: f64,
    slippage: f64,
) -> SwapQuote {
    SwapQuote {
        sell_currency: sell,
        buy_currency: buy,
        sell_amount: amount,
        buy_amount: format!("{buy_amount:.6}"),
        rate: buy_amount / amount_f,
        slippage,
        source: QuoteSource::Estimated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_buy_amount() {
        let quote = SwapQuote {
            sell_currency: "CELO".into(),
            buy_currency: "cUSD".into(),
            sell_amount: "10".into(),
            buy_amount: "100.000000".into(),
            rate: 10.0,
            slippage: 0.5,
            source: QuoteSource::Estimated,
        };
        assert!((quote.min_buy_amount() - 99.5).abs() < 1e-9);
    }
}
