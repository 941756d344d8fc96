//! Stable assets and contract addresses.

use alloy_primitives::{address, Address};

/// Symbol of the chain's native asset.
pub const NATIVE_SYMBOL: &str = "CELO";

/// Celo mainnet SortedOracles.
pub const SORTED_ORACLES: Address = address!("efB84935239dAcdecF7c5bA76d8dE40b077B7b33");

/// A Mento stable asset and the contracts used to price it.
#[derive(Debug, Clone, PartialEq)]
pub struct StableAsset {
    /// Canonical symbol, e.g. `cUSD`.
    pub symbol: &'static str,
    /// Token contract, also the SortedOracles rate key.
    pub token: Address,
    /// Legacy Mento exchange for CELO <-> this asset, when one exists.
    pub exchange: Option<Address>,
    /// Approximate CELO price in this asset, used when the oracle is unreachable.
    pub fallback_rate: f64,
}

/// Contract addresses the market reads go to.
#[derive(Debug, Clone)]
pub struct MarketAddresses {
    /// SortedOracles contract.
    pub sorted_oracles: Address,
    /// Supported stable assets, in display order.
    pub stables: Vec<StableAsset>,
}

impl MarketAddresses {
    /// Celo mainnet contracts for cUSD, cEUR, cREAL and cKES.
    pub fn celo_mainnet() -> Self {
        Self {
            sorted_oracles: SORTED_ORACLES,
            stables: vec![
                StableAsset {
                    symbol: "cUSD",
                    token: address!("765DE816845861e75A25fCA122bb6898B8B1282a"),
                    exchange: Some(address!("67316300f17f063085Ca8bCa4bd3f7a5a3C66275")),
                    fallback_rate: 0.55,
                },
                StableAsset {
                    symbol: "cEUR",
                    token: address!("D8763CBa276a3738E6DE85b4b3bF5FDed6D6cA73"),
                    exchange: Some(address!("E383394B913d7F22ceC5C811fa6822E6eF445F4A")),
                    fallback_rate: 0.50,
                },
                StableAsset {
                    symbol: "cREAL",
                    token: address!("e8537a3d056DA446677B9E9d6c5dB704EaAb4787"),
                    exchange: Some(address!("8f2cf9855C919AFAC8a4aC0A21A186bE5a1270ca")),
                    fallback_rate: 2.80,
                },
                StableAsset {
                    symbol: "cKES",
                    token: address!("456a3D042C0DbD3db53D5489e98dFb038553B0d0"),
                    exchange: None,
                    fallback_rate: 70.0,
                },
            ],
        }
    }

    /// Looks up a stable asset by symbol, ignoring case.
    pub fn stable(&self, symbol: &str) -> Option<&StableAsset> {
        let symbol = symbol.trim();
        self.stables
            .iter()
            .find(|s| s.symbol.eq_ignore_ascii_case(symbol))
    }

    /// Whether `symbol` names CELO, ignoring case.
    pub fn is_native(symbol: &str) -> bool {
        symbol.trim().eq_ignore_ascii_case(NATIVE_SYMBOL)
    }

    /// Canonical spelling: `CELO`, a known stable's symbol, or the input uppercased.
    pub fn canonical_symbol(&self, symbol: &str) -> String {
        if Self::is_native(symbol) {
            return NATIVE_SYMBOL.to_string();
        }
        match self.stable(symbol) {
            Some(asset) => asset.symbol.to_string(),
            None => symbol.trim().to_uppercase(),
        }
    }
}

impl Default for MarketAddresses {
    fn default() -> Self {
        Self::celo_mainnet()
    }
}
